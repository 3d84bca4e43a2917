use crate::model::{
    id::UserId,
    user::{
        event::{CreateUser, EnsureAdmin, UpdateProfile},
        User,
    },
};
use async_trait::async_trait;
use shared::error::AppResult;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_current_user(&self, user_id: UserId) -> AppResult<Option<User>>;
    // 管理者以外のユーザー一覧
    async fn find_all_customers(&self) -> AppResult<Vec<User>>;
    async fn create(&self, event: CreateUser) -> AppResult<User>;
    async fn update_profile(&self, event: UpdateProfile) -> AppResult<()>;
    // 起動時に管理者アカウントが存在することを保証する
    async fn ensure_admin(&self, event: EnsureAdmin) -> AppResult<()>;
}
