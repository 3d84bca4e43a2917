use shared::{
    config::DatabaseConfig,
    error::{AppError, AppResult},
};
use sqlx::{postgres::PgConnectOptions, PgPool, Postgres, Transaction};

pub mod model;

// SERIALIZABLE 下での競合（40001）と部分ユニークインデックス違反（23505）
const SERIALIZATION_FAILURE: &str = "40001";
const UNIQUE_VIOLATION: &str = "23505";

pub const CONCURRENT_CHANGE: &str = "the record was changed concurrently, try again";

fn make_pg_connect_options(cfg: &DatabaseConfig) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&cfg.host)
        .port(cfg.port)
        .username(&cfg.username)
        .password(&cfg.password)
        .database(&cfg.database)
}

#[derive(Clone)]
pub struct ConnectionPool(PgPool);

impl ConnectionPool {
    pub fn new(pool: PgPool) -> Self {
        Self(pool)
    }

    pub fn inner_ref(&self) -> &PgPool {
        &self.0
    }

    pub async fn begin(&self) -> AppResult<Transaction<'_, Postgres>> {
        self.0.begin().await.map_err(AppError::TransactionError)
    }

    /// Opens a transaction at SERIALIZABLE isolation.
    pub async fn begin_serializable(&self) -> AppResult<Transaction<'_, Postgres>> {
        let mut tx = self.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await
            .map_err(AppError::SpecificOperationError)?;
        Ok(tx)
    }
}

pub fn connect_database_with(cfg: &DatabaseConfig) -> ConnectionPool {
    ConnectionPool(PgPool::connect_lazy_with(make_pg_connect_options(cfg)))
}

pub async fn migrate(pool: &ConnectionPool) -> AppResult<()> {
    sqlx::migrate!("./migrations")
        .run(pool.inner_ref())
        .await
        .map_err(|e| AppError::SpecificOperationError(e.into()))
}

/// Maps a failed write to `Conflict` when the database rejected it because a
/// concurrent transaction won the race.
pub fn map_write_error(err: sqlx::Error, conflict_message: &str) -> AppError {
    if is_write_conflict(&err) {
        return AppError::Conflict(conflict_message.to_string());
    }
    AppError::SpecificOperationError(err)
}

pub fn map_commit_error(err: sqlx::Error, conflict_message: &str) -> AppError {
    if is_write_conflict(&err) {
        return AppError::Conflict(conflict_message.to_string());
    }
    AppError::TransactionError(err)
}

/// True when a unique index rejected the write.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|e| e.code())
        .is_some_and(|code| code == UNIQUE_VIOLATION)
}

fn is_write_conflict(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|e| e.code())
        .is_some_and(|code| code == SERIALIZATION_FAILURE || code == UNIQUE_VIOLATION)
}

/// `ILIKE` pattern matching `needle` anywhere, with wildcards in the input escaped.
pub fn contains_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("MG Road"), "%MG Road%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern(r"a\b"), r"%a\\b%");
    }

    #[test]
    fn non_database_errors_are_not_conflicts() {
        assert!(matches!(
            map_write_error(sqlx::Error::RowNotFound, "taken"),
            AppError::SpecificOperationError(_)
        ));
        assert!(matches!(
            map_commit_error(sqlx::Error::PoolTimedOut, "taken"),
            AppError::TransactionError(_)
        ));
    }

    #[sqlx::test]
    #[ignore = "requires PostgreSQL via DATABASE_URL"]
    async fn duplicate_spot_number_is_a_unique_violation(
        pool: sqlx::PgPool,
    ) -> anyhow::Result<()> {
        let lot_id = uuid::Uuid::new_v4();
        sqlx::query(
            r#"
                INSERT INTO parking_lots (lot_id, name, hourly_rate, address, pincode, max_spots)
                VALUES ($1, 'Depot', 10, 'Ring Road', '110001', 2)
            "#,
        )
        .bind(lot_id)
        .execute(&pool)
        .await?;

        let insert_spot = || {
            sqlx::query(
                "INSERT INTO parking_spots (spot_id, lot_id, spot_no, status) VALUES ($1, $2, 1, 'A')",
            )
            .bind(uuid::Uuid::new_v4())
            .bind(lot_id)
            .execute(&pool)
        };
        insert_spot().await?;
        let err = insert_spot().await.unwrap_err();

        assert!(is_unique_violation(&err));
        assert!(matches!(
            map_write_error(err, CONCURRENT_CHANGE),
            AppError::Conflict(_)
        ));
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
        Ok(())
    }
}
