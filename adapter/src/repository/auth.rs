use crate::{
    database::{
        model::{
            auth::{from, AuthorizationKey},
            user::UserCredentialRow,
        },
        ConnectionPool,
    },
    redis::RedisClient,
};
use argon2::{Argon2, PasswordHash, PasswordVerifier};
use async_trait::async_trait;
use derive_new::new;
use kernel::{
    model::{
        auth::{event::CreateToken, AccessToken},
        id::UserId,
    },
    repository::auth::AuthRepository,
};
use shared::error::{AppError, AppResult};
use std::sync::Arc;

#[derive(new)]
pub struct AuthRepositoryImpl {
    db: ConnectionPool,
    kv: Arc<RedisClient>,
    ttl: u64,
}

#[async_trait]
impl AuthRepository for AuthRepositoryImpl {
    async fn fetch_user_id_from_token(
        &self,
        access_token: &AccessToken,
    ) -> AppResult<Option<UserId>> {
        let key: AuthorizationKey = access_token.into();
        self.kv
            .get(&key)
            .await
            .map(|x| x.map(|user_id| user_id.into_inner()))
    }

    async fn verify_user(&self, email: &str, password: &str) -> AppResult<UserId> {
        let user_item = sqlx::query_as::<_, UserCredentialRow>(
            r#"
                SELECT user_id, password_hash FROM users
                WHERE email = $1;
            "#,
        )
        .bind(email.trim())
        .fetch_optional(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?
        .ok_or(AppError::UnauthenticatedError)?;

        verify_password(password, &user_item.password_hash)?;

        Ok(user_item.user_id)
    }

    async fn create_token(&self, event: CreateToken) -> AppResult<AccessToken> {
        let (key, value) = from(event);
        self.kv.set_ex(&key, &value, self.ttl).await?;
        Ok(key.into())
    }

    async fn delete_token(&self, access_token: AccessToken) -> AppResult<()> {
        let key: AuthorizationKey = (&access_token).into();
        self.kv.delete(&key).await
    }
}

fn verify_password(password: &str, hash: &str) -> AppResult<()> {
    let parsed = PasswordHash::new(hash).map_err(|e| AppError::PasswordHashError(e.to_string()))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AppError::UnauthenticatedError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::user::hash_password;

    #[test]
    fn verifies_only_the_original_password() {
        let hash = hash_password("s3cret-pass").unwrap();
        assert!(verify_password("s3cret-pass", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong", &hash),
            Err(AppError::UnauthenticatedError)
        ));
    }
}
