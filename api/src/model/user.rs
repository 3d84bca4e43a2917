use derive_new::new;
use garde::Validate;
use kernel::model::{
    id::UserId,
    pincode::Pincode,
    role::Role,
    user::{
        event::{CreateUser, UpdateProfile},
        User,
    },
};
use serde::{Deserialize, Serialize};
use shared::error::AppError;
use strum::VariantNames;

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, VariantNames)]
#[strum(serialize_all = "kebab-case")]
pub enum RoleName {
    Admin,
    User,
}

impl From<Role> for RoleName {
    fn from(value: Role) -> Self {
        match value {
            Role::Admin => Self::Admin,
            Role::User => Self::User,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsersResponse {
    pub items: Vec<UserResponse>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub address: String,
    pub pincode: String,
    pub role: RoleName,
}

impl From<User> for UserResponse {
    fn from(value: User) -> Self {
        let User {
            user_id,
            name,
            email,
            address,
            pincode,
            role,
        } = value;
        Self {
            user_id,
            name,
            email,
            address,
            pincode,
            role: RoleName::from(role),
        }
    }
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[garde(length(min = 1, max = 100))]
    name: String,
    #[garde(email)]
    email: String,
    #[garde(length(min = 1))]
    password: String,
    #[garde(length(min = 1))]
    address: String,
    #[garde(ascii, length(min = 6, max = 6))]
    pincode: String,
}

impl TryFrom<CreateUserRequest> for CreateUser {
    type Error = AppError;

    fn try_from(value: CreateUserRequest) -> Result<Self, Self::Error> {
        let CreateUserRequest {
            name,
            email,
            password,
            address,
            pincode,
        } = value;
        Ok(Self {
            name,
            email,
            password,
            address,
            pincode: Pincode::parse(&pincode)?,
        })
    }
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[garde(length(min = 1, max = 100))]
    name: String,
    #[garde(email)]
    email: String,
    #[garde(length(min = 1))]
    address: String,
    #[garde(ascii, length(min = 6, max = 6))]
    pincode: String,
}

#[derive(new)]
pub struct UpdateProfileRequestWithUserId(UserId, UpdateProfileRequest);

impl TryFrom<UpdateProfileRequestWithUserId> for UpdateProfile {
    type Error = AppError;

    fn try_from(value: UpdateProfileRequestWithUserId) -> Result<Self, Self::Error> {
        let UpdateProfileRequestWithUserId(
            user_id,
            UpdateProfileRequest {
                name,
                email,
                address,
                pincode,
            },
        ) = value;
        Ok(Self {
            user_id,
            name,
            email,
            address,
            pincode: Pincode::parse(&pincode)?,
        })
    }
}
