use kernel::model::{id::UserId, role::Role, user::User};
use shared::error::AppError;
use std::str::FromStr;

#[derive(sqlx::FromRow)]
pub struct UserRow {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub address: String,
    pub pincode: String,
    pub role: String,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(value: UserRow) -> Result<Self, Self::Error> {
        let UserRow {
            user_id,
            name,
            email,
            address,
            pincode,
            role,
        } = value;
        Ok(User {
            user_id,
            name,
            email,
            address,
            pincode,
            role: Role::from_str(&role)
                .map_err(|e| AppError::ConversionEntityError(e.to_string()))?,
        })
    }
}

#[derive(sqlx::FromRow)]
pub struct UserCredentialRow {
    pub user_id: UserId,
    pub password_hash: String,
}
