use crate::model::{id::UserId, role::Role};
pub mod event;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub address: String,
    pub pincode: String,
    pub role: Role,
}
