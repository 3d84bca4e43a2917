use crate::database::{map_commit_error, map_write_error, model::user::UserRow, ConnectionPool};
use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHasher,
};
use async_trait::async_trait;
use derive_new::new;
use kernel::{
    model::{
        id::UserId,
        role::Role,
        user::{
            event::{CreateUser, EnsureAdmin, UpdateProfile},
            User,
        },
    },
    repository::user::UserRepository,
};
use shared::error::{AppError, AppResult};

#[derive(new)]
pub struct UserRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl UserRepository for UserRepositoryImpl {
    async fn find_current_user(&self, current_user_id: UserId) -> AppResult<Option<User>> {
        sqlx::query_as::<_, UserRow>(
            r#"
                SELECT user_id, name, email, address, pincode, role
                FROM users
                WHERE user_id = $1
            "#,
        )
        .bind(current_user_id)
        .fetch_optional(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?
        .map(User::try_from)
        .transpose()
    }

    async fn find_all_customers(&self) -> AppResult<Vec<User>> {
        sqlx::query_as::<_, UserRow>(
            r#"
                SELECT user_id, name, email, address, pincode, role
                FROM users
                WHERE role <> 'Admin'
                ORDER BY created_at DESC
            "#,
        )
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?
        .into_iter()
        .map(User::try_from)
        .collect()
    }

    async fn create(&self, event: CreateUser) -> AppResult<User> {
        let CreateUser {
            name,
            email,
            password,
            address,
            pincode,
        } = event;
        let user_id = UserId::new();
        let hashed_password = hash_password(&password)?;
        let email = email.trim().to_string();
        let conflict = format!("email {email} is already registered");

        let res = sqlx::query(
            r#"
                INSERT INTO users (user_id, name, email, address, pincode, password_hash, role)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (email) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(name.trim())
        .bind(&email)
        .bind(address.trim())
        .bind(pincode.as_str())
        .bind(&hashed_password)
        .bind(Role::User.as_ref())
        .execute(self.db.inner_ref())
        .await
        .map_err(|e| map_write_error(e, &conflict))?;

        if res.rows_affected() < 1 {
            return Err(AppError::Conflict(conflict));
        }

        Ok(User {
            user_id,
            name: name.trim().to_string(),
            email,
            address: address.trim().to_string(),
            pincode: pincode.into(),
            role: Role::User,
        })
    }

    async fn update_profile(&self, event: UpdateProfile) -> AppResult<()> {
        let UpdateProfile {
            user_id,
            name,
            email,
            address,
            pincode,
        } = event;
        let email = email.trim().to_string();
        let conflict = format!("email {email} is already in use");

        let mut tx = self.db.begin().await?;

        // メールアドレスが他のユーザーに使われていないか確認する
        let taken = sqlx::query_scalar::<_, UserId>(
            r#"
                SELECT user_id FROM users
                WHERE email = $1 AND user_id <> $2
            "#,
        )
        .bind(&email)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;
        if taken.is_some() {
            return Err(AppError::Conflict(conflict));
        }

        let res = sqlx::query(
            r#"
                UPDATE users
                SET name = $1, email = $2, address = $3, pincode = $4,
                    updated_at = CURRENT_TIMESTAMP(3)
                WHERE user_id = $5
            "#,
        )
        .bind(name.trim())
        .bind(&email)
        .bind(address.trim())
        .bind(pincode.as_str())
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, &conflict))?;

        if res.rows_affected() < 1 {
            return Err(AppError::EntityNotFound("specified user not found".into()));
        }

        tx.commit().await.map_err(|e| map_commit_error(e, &conflict))?;

        Ok(())
    }

    async fn ensure_admin(&self, event: EnsureAdmin) -> AppResult<()> {
        let hashed_password = hash_password(&event.password)?;
        let res = sqlx::query(
            r#"
                INSERT INTO users (user_id, name, email, address, pincode, password_hash, role)
                VALUES ($1, 'admin', $2, '', '', $3, $4)
                ON CONFLICT (email) DO NOTHING
            "#,
        )
        .bind(UserId::new())
        .bind(event.email.trim())
        .bind(&hashed_password)
        .bind(Role::Admin.as_ref())
        .execute(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() > 0 {
            tracing::info!(email = %event.email.trim(), "created administrator account");
        }
        Ok(())
    }
}

pub(crate) fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::PasswordHashError(e.to_string()))
}
