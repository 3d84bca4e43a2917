use crate::model::{id::UserId, pincode::Pincode};
use derive_new::new;

#[derive(new)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub address: String,
    pub pincode: Pincode,
}

#[derive(new)]
pub struct UpdateProfile {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub address: String,
    pub pincode: Pincode,
}

#[derive(new)]
pub struct EnsureAdmin {
    pub email: String,
    pub password: String,
}
