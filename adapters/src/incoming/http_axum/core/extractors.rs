use axum::extract::Path;
use uuid::Uuid;

use domain::user::UserId;

pub type UserPath = Path<Uuid>;

pub fn extract_user_id(Path(user_id): UserPath) -> UserId {
    UserId::from_uuid(user_id)
}
