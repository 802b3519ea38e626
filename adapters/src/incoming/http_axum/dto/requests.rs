use serde::{Deserialize, Serialize};
#[cfg(feature = "docs")]
use utoipa::ToSchema;
use validator::Validate;

#[cfg_attr(feature = "docs", derive(ToSchema))]
#[cfg_attr(feature = "docs", schema(
    description = "Completed purchase of download credits, reported by the payment flow. The batch is consumed after the free allowance and after every older batch.",
    example = json!({
        "quantity": 10
    })
))]
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecordPurchaseRequest {
    #[cfg_attr(feature = "docs", schema(example = 10, minimum = 1))]
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
}
