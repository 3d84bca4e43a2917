use crate::database::{
    contains_pattern, is_unique_violation, map_commit_error, map_write_error, CONCURRENT_CHANGE,
    model::{
        lot::{LotRow, LotUsageRow},
        spot::SpotRow,
    },
    ConnectionPool,
};
use async_trait::async_trait;
use derive_new::new;
use kernel::{
    model::{
        id::{LotId, SpotId},
        lot::{
            capacity::{initial_spot_numbers, plan_resize, ResizePlan},
            ensure_no_occupied_spots,
            event::{CreateLot, DeactivateLot, UpdateLot},
            LotDetail, LotSearch, ParkingLot,
        },
        spot::ParkingSpot,
        summary::LotUsage,
    },
    repository::lot::LotRepository,
};
use shared::error::{AppError, AppResult};
use sqlx::{Postgres, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

// 有効なスポットのみで空き・使用中を数える
const LOT_SELECT: &str = r#"
    SELECT
        l.lot_id,
        l.name,
        l.hourly_rate,
        l.address,
        l.pincode,
        l.max_spots,
        l.is_active,
        COUNT(s.spot_id) FILTER (WHERE s.status = 'A') AS available_spots,
        COUNT(s.spot_id) FILTER (WHERE s.status = 'O') AS occupied_spots
    FROM parking_lots AS l
    LEFT JOIN parking_spots AS s ON s.lot_id = l.lot_id AND s.is_active
"#;

const LOT_GROUP_ORDER: &str = "GROUP BY l.lot_id ORDER BY l.name, l.lot_id";

#[derive(new)]
pub struct LotRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl LotRepository for LotRepositoryImpl {
    async fn create(&self, event: CreateLot) -> AppResult<LotId> {
        let CreateLot {
            name,
            hourly_rate,
            address,
            pincode,
            max_spots,
        } = event;
        let address = address.trim().to_string();
        let conflict = format!("a parking lot at `{address}` already exists");

        let mut tx = self.db.begin_serializable().await?;

        self.ensure_address_free(&mut tx, &address, None, &conflict)
            .await?;

        let lot_id = LotId::new();
        let res = sqlx::query(
            r#"
                INSERT INTO parking_lots (lot_id, name, hourly_rate, address, pincode, max_spots)
                VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(lot_id)
        .bind(name.trim())
        .bind(hourly_rate.round_dp(2))
        .bind(&address)
        .bind(pincode.as_str())
        .bind(max_spots)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, &conflict))?;

        if res.rows_affected() < 1 {
            return Err(AppError::NoRowsAffectedError(
                "No parking lot record has been created".into(),
            ));
        }

        insert_spots(&mut tx, lot_id, &initial_spot_numbers(max_spots)?).await?;

        tx.commit()
            .await
            .map_err(|e| map_commit_error(e, &conflict))?;

        tracing::info!(%lot_id, max_spots, "parking lot created");
        Ok(lot_id)
    }

    async fn update(&self, event: UpdateLot) -> AppResult<()> {
        let UpdateLot {
            lot_id,
            name,
            hourly_rate,
            address,
            pincode,
            max_spots,
        } = event;
        let address = address.trim().to_string();
        let conflict = format!("parking lot ({lot_id}) was changed concurrently, try again");

        let mut tx = self.db.begin_serializable().await?;

        // ① 駐車場の存在確認（論理削除済みは対象外）
        let exists = sqlx::query_scalar::<_, LotId>(
            r#"
                SELECT lot_id FROM parking_lots
                WHERE lot_id = $1 AND is_active
                FOR UPDATE
            "#,
        )
        .bind(lot_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, &conflict))?;
        if exists.is_none() {
            return Err(lot_not_found(lot_id));
        }

        // ② 住所の重複確認
        let duplicate = format!("a parking lot at `{address}` already exists");
        self.ensure_address_free(&mut tx, &address, Some(lot_id), &duplicate)
            .await?;

        // ③ スポット数の増減計画を立てる（使用中のスポットは減らさない）
        let spots = lock_spots(&mut tx, lot_id).await?;
        let plan = plan_resize(&spots, max_spots)?;

        sqlx::query(
            r#"
                UPDATE parking_lots
                SET name = $1, hourly_rate = $2, address = $3, pincode = $4,
                    max_spots = $5, updated_at = CURRENT_TIMESTAMP(3)
                WHERE lot_id = $6
            "#,
        )
        .bind(name.trim())
        .bind(hourly_rate.round_dp(2))
        .bind(&address)
        .bind(pincode.as_str())
        .bind(max_spots)
        .bind(lot_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(duplicate.clone())
            } else {
                map_write_error(e, &conflict)
            }
        })?;

        apply_resize_plan(&mut tx, lot_id, &plan).await?;

        tx.commit()
            .await
            .map_err(|e| map_commit_error(e, &conflict))?;

        tracing::info!(
            %lot_id,
            max_spots,
            resized = !plan.is_empty(),
            deactivated = plan.deactivate.len(),
            reactivated = plan.reactivate.len(),
            created = plan.create.len(),
            "parking lot updated"
        );
        Ok(())
    }

    async fn deactivate(&self, event: DeactivateLot) -> AppResult<()> {
        let lot_id = event.lot_id;
        let conflict = format!("parking lot ({lot_id}) was changed concurrently, try again");

        let mut tx = self.db.begin_serializable().await?;

        let exists = sqlx::query_scalar::<_, LotId>(
            r#"
                SELECT lot_id FROM parking_lots
                WHERE lot_id = $1 AND is_active
                FOR UPDATE
            "#,
        )
        .bind(lot_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, &conflict))?;
        if exists.is_none() {
            return Err(lot_not_found(lot_id));
        }

        // 使用中のスポットがある駐車場は削除できない
        let spots = lock_spots(&mut tx, lot_id).await?;
        let occupied = spots
            .iter()
            .filter(|s| s.is_active && s.is_occupied())
            .count() as i64;
        ensure_no_occupied_spots(occupied)?;

        sqlx::query("UPDATE parking_spots SET is_active = FALSE WHERE lot_id = $1")
            .bind(lot_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_write_error(e, &conflict))?;

        sqlx::query(
            r#"
                UPDATE parking_lots
                SET is_active = FALSE, updated_at = CURRENT_TIMESTAMP(3)
                WHERE lot_id = $1
            "#,
        )
        .bind(lot_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, &conflict))?;

        tx.commit()
            .await
            .map_err(|e| map_commit_error(e, &conflict))?;

        tracing::info!(%lot_id, "parking lot deactivated");
        Ok(())
    }

    async fn find_by_id(&self, lot_id: LotId) -> AppResult<Option<ParkingLot>> {
        let sql = format!("{LOT_SELECT} WHERE l.lot_id = $1 AND l.is_active {LOT_GROUP_ORDER}");
        sqlx::query_as::<_, LotRow>(&sql)
            .bind(lot_id)
            .fetch_optional(self.db.inner_ref())
            .await
            .map(|row| row.map(ParkingLot::from))
            .map_err(AppError::SpecificOperationError)
    }

    async fn find_active_with_spots(&self) -> AppResult<Vec<LotDetail>> {
        let lots = self.search(LotSearch::All).await?;

        let spots = sqlx::query_as::<_, SpotRow>(
            r#"
                SELECT s.spot_id, s.lot_id, s.spot_no, s.status, s.is_active
                FROM parking_spots AS s
                INNER JOIN parking_lots AS l ON s.lot_id = l.lot_id
                WHERE s.is_active AND l.is_active
                ORDER BY s.spot_no
            "#,
        )
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?
        .into_iter()
        .map(ParkingSpot::try_from)
        .collect::<AppResult<Vec<_>>>()?;

        let mut by_lot: HashMap<LotId, Vec<ParkingSpot>> = HashMap::new();
        for spot in spots {
            by_lot.entry(spot.lot_id).or_default().push(spot);
        }

        Ok(lots
            .into_iter()
            .map(|lot| {
                let spots = by_lot.remove(&lot.lot_id).unwrap_or_default();
                LotDetail { lot, spots }
            })
            .collect())
    }

    async fn search(&self, search: LotSearch) -> AppResult<Vec<ParkingLot>> {
        let query = match &search {
            LotSearch::All => {
                let sql = format!("{LOT_SELECT} WHERE l.is_active {LOT_GROUP_ORDER}");
                return self.fetch_lots(sqlx::query_as::<_, LotRow>(&sql)).await;
            }
            LotSearch::PincodeContains(pincode) => (
                "WHERE l.is_active AND l.pincode ILIKE $1",
                contains_pattern(pincode),
            ),
            LotSearch::AddressContains(address) => (
                "WHERE l.is_active AND l.address ILIKE $1",
                contains_pattern(address),
            ),
            LotSearch::PincodeEquals(pincode) => (
                "WHERE l.is_active AND l.pincode = $1",
                pincode.trim().to_string(),
            ),
            LotSearch::UsedBy(user_id) => {
                // 利用履歴は論理削除済みの駐車場も含めて返す
                let sql = format!(
                    r#"{LOT_SELECT}
                    WHERE EXISTS (
                        SELECT 1 FROM reservations AS r
                        INNER JOIN parking_spots AS ps ON r.spot_id = ps.spot_id
                        WHERE ps.lot_id = l.lot_id AND r.user_id = $1
                    )
                    {LOT_GROUP_ORDER}"#
                );
                return self
                    .fetch_lots(sqlx::query_as::<_, LotRow>(&sql).bind(*user_id))
                    .await;
            }
        };

        let (filter, param) = query;
        let sql = format!("{LOT_SELECT} {filter} {LOT_GROUP_ORDER}");
        self.fetch_lots(sqlx::query_as::<_, LotRow>(&sql).bind(param))
            .await
    }

    async fn usage_summary(&self) -> AppResult<Vec<LotUsage>> {
        sqlx::query_as::<_, LotUsageRow>(
            r#"
                SELECT
                    l.lot_id,
                    l.name,
                    COALESCE((
                        SELECT SUM(r.total_cost)
                        FROM reservations AS r
                        INNER JOIN parking_spots AS ps ON r.spot_id = ps.spot_id
                        WHERE ps.lot_id = l.lot_id
                    ), 0) AS revenue,
                    (
                        SELECT COUNT(*) FROM parking_spots AS ps
                        WHERE ps.lot_id = l.lot_id AND ps.is_active AND ps.status = 'A'
                    ) AS available_spots,
                    (
                        SELECT COUNT(*) FROM parking_spots AS ps
                        WHERE ps.lot_id = l.lot_id AND ps.is_active AND ps.status = 'O'
                    ) AS occupied_spots
                FROM parking_lots AS l
                WHERE l.is_active
                ORDER BY l.name, l.lot_id
            "#,
        )
        .fetch_all(self.db.inner_ref())
        .await
        .map(|rows| rows.into_iter().map(LotUsage::from).collect())
        .map_err(AppError::SpecificOperationError)
    }
}

impl LotRepositoryImpl {
    async fn fetch_lots<'q>(
        &self,
        query: sqlx::query::QueryAs<'q, Postgres, LotRow, sqlx::postgres::PgArguments>,
    ) -> AppResult<Vec<ParkingLot>> {
        query
            .fetch_all(self.db.inner_ref())
            .await
            .map(|rows| rows.into_iter().map(ParkingLot::from).collect())
            .map_err(AppError::SpecificOperationError)
    }

    // 有効な駐車場のうち、同じ住所のものが他に無いことを確認する
    async fn ensure_address_free(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        address: &str,
        except: Option<LotId>,
        conflict: &str,
    ) -> AppResult<()> {
        let existing = sqlx::query_scalar::<_, LotId>(
            r#"
                SELECT lot_id FROM parking_lots
                WHERE address = $1 AND is_active
                  AND ($2::uuid IS NULL OR lot_id <> $2)
            "#,
        )
        .bind(address)
        .bind(except.map(LotId::raw))
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_write_error(e, CONCURRENT_CHANGE))?;

        if existing.is_some() {
            return Err(AppError::Conflict(conflict.to_string()));
        }
        Ok(())
    }
}

fn lot_not_found(lot_id: LotId) -> AppError {
    AppError::EntityNotFound(format!("parking lot ({lot_id}) was not found"))
}

// 論理削除済みも含めて、駐車場のスポットをすべてロックして取得する
async fn lock_spots(
    tx: &mut Transaction<'_, Postgres>,
    lot_id: LotId,
) -> AppResult<Vec<ParkingSpot>> {
    sqlx::query_as::<_, SpotRow>(
        r#"
            SELECT spot_id, lot_id, spot_no, status, is_active
            FROM parking_spots
            WHERE lot_id = $1
            ORDER BY spot_no
            FOR UPDATE
        "#,
    )
    .bind(lot_id)
    .fetch_all(&mut **tx)
    .await
    .map_err(|e| map_write_error(e, CONCURRENT_CHANGE))?
    .into_iter()
    .map(ParkingSpot::try_from)
    .collect()
}

async fn insert_spots(
    tx: &mut Transaction<'_, Postgres>,
    lot_id: LotId,
    spot_numbers: &[i32],
) -> AppResult<()> {
    if spot_numbers.is_empty() {
        return Ok(());
    }
    let spot_ids: Vec<Uuid> = spot_numbers.iter().map(|_| SpotId::new().raw()).collect();

    let res = sqlx::query(
        r#"
            INSERT INTO parking_spots (spot_id, lot_id, spot_no, status, is_active)
            SELECT t.spot_id, $1, t.spot_no, 'A', TRUE
            FROM UNNEST($2::uuid[], $3::int4[]) AS t (spot_id, spot_no)
        "#,
    )
    .bind(lot_id)
    .bind(&spot_ids[..])
    .bind(spot_numbers)
    .execute(&mut **tx)
    .await
    .map_err(|e| map_write_error(e, CONCURRENT_CHANGE))?;

    if res.rows_affected() != spot_numbers.len() as u64 {
        return Err(AppError::NoRowsAffectedError(
            "Not every parking spot record has been created".into(),
        ));
    }
    Ok(())
}

async fn set_spots_active(
    tx: &mut Transaction<'_, Postgres>,
    spot_ids: &[SpotId],
    is_active: bool,
) -> AppResult<()> {
    if spot_ids.is_empty() {
        return Ok(());
    }
    let ids: Vec<Uuid> = spot_ids.iter().map(|id| id.raw()).collect();
    sqlx::query("UPDATE parking_spots SET is_active = $1 WHERE spot_id = ANY($2)")
        .bind(is_active)
        .bind(&ids[..])
        .execute(&mut **tx)
        .await
        .map_err(|e| map_write_error(e, CONCURRENT_CHANGE))?;
    Ok(())
}

async fn apply_resize_plan(
    tx: &mut Transaction<'_, Postgres>,
    lot_id: LotId,
    plan: &ResizePlan,
) -> AppResult<()> {
    set_spots_active(tx, &plan.deactivate, false).await?;
    set_spots_active(tx, &plan.reactivate, true).await?;
    insert_spots(tx, lot_id, &plan.create).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::spot::SpotRepositoryImpl;
    use kernel::{
        model::{pincode::Pincode, spot::SpotStatus},
        repository::spot::SpotRepository,
    };
    use rust_decimal::Decimal;

    fn create_event(address: &str, max_spots: i32) -> CreateLot {
        CreateLot::new(
            "City Centre".into(),
            Decimal::new(2000, 2),
            address.into(),
            Pincode::parse("400001").unwrap(),
            max_spots,
        )
    }

    async fn occupy(pool: &sqlx::PgPool, lot_id: LotId, numbers: &[i32]) {
        sqlx::query("UPDATE parking_spots SET status = 'O' WHERE lot_id = $1 AND spot_no = ANY($2)")
            .bind(lot_id)
            .bind(numbers)
            .execute(pool)
            .await
            .unwrap();
    }

    #[sqlx::test]
    #[ignore = "requires PostgreSQL via DATABASE_URL"]
    async fn create_lot_allocates_numbered_spots(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let repo = LotRepositoryImpl::new(ConnectionPool::new(pool.clone()));
        let lot_id = repo.create(create_event("MG Road", 4)).await?;

        let lot = repo.find_by_id(lot_id).await?.unwrap();
        assert_eq!(lot.max_spots, 4);
        assert_eq!(lot.available_spots, 4);
        assert_eq!(lot.occupied_spots, 0);

        let duplicate = repo.create(create_event("MG Road", 2)).await;
        assert!(matches!(duplicate, Err(AppError::Conflict(_))));
        Ok(())
    }

    #[sqlx::test]
    #[ignore = "requires PostgreSQL via DATABASE_URL"]
    async fn shrinking_keeps_occupied_spots(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let db = ConnectionPool::new(pool.clone());
        let repo = LotRepositoryImpl::new(db.clone());
        let spots_repo = SpotRepositoryImpl::new(db);

        let lot_id = repo.create(create_event("FC Road", 5)).await?;
        occupy(&pool, lot_id, &[1, 2]).await;

        repo.update(UpdateLot::new(
            lot_id,
            "City Centre".into(),
            Decimal::new(2000, 2),
            "FC Road".into(),
            Pincode::parse("400001")?,
            3,
        ))
        .await?;

        let spots = spots_repo.find_by_lot_id(lot_id).await?;
        let active: Vec<(i32, SpotStatus)> = spots
            .iter()
            .filter(|s| s.is_active)
            .map(|s| (s.spot_no, s.status))
            .collect();
        assert_eq!(
            active,
            vec![
                (1, SpotStatus::Occupied),
                (2, SpotStatus::Occupied),
                (3, SpotStatus::Available)
            ]
        );

        let below_occupied = repo
            .update(UpdateLot::new(
                lot_id,
                "City Centre".into(),
                Decimal::new(2000, 2),
                "FC Road".into(),
                Pincode::parse("400001")?,
                1,
            ))
            .await;
        assert!(matches!(below_occupied, Err(AppError::Conflict(_))));

        // 再度増やすと 5, 4 が再利用され、新しい番号は 6 から
        repo.update(UpdateLot::new(
            lot_id,
            "City Centre".into(),
            Decimal::new(2000, 2),
            "FC Road".into(),
            Pincode::parse("400001")?,
            6,
        ))
        .await?;
        let numbers: Vec<i32> = spots_repo
            .find_by_lot_id(lot_id)
            .await?
            .iter()
            .filter(|s| s.is_active)
            .map(|s| s.spot_no)
            .collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);
        Ok(())
    }

    #[sqlx::test]
    #[ignore = "requires PostgreSQL via DATABASE_URL"]
    async fn lot_with_occupied_spot_cannot_be_deactivated(
        pool: sqlx::PgPool,
    ) -> anyhow::Result<()> {
        let repo = LotRepositoryImpl::new(ConnectionPool::new(pool.clone()));
        let lot_id = repo.create(create_event("Linking Road", 2)).await?;
        occupy(&pool, lot_id, &[2]).await;

        let res = repo.deactivate(DeactivateLot::new(lot_id)).await;
        assert!(matches!(res, Err(AppError::Conflict(_))));

        sqlx::query("UPDATE parking_spots SET status = 'A' WHERE lot_id = $1")
            .bind(lot_id)
            .execute(&pool)
            .await?;
        repo.deactivate(DeactivateLot::new(lot_id)).await?;
        assert!(repo.find_by_id(lot_id).await?.is_none());
        assert!(repo.search(LotSearch::All).await?.is_empty());
        Ok(())
    }

    #[sqlx::test]
    #[ignore = "requires PostgreSQL via DATABASE_URL"]
    async fn search_by_pincode_and_address(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let repo = LotRepositoryImpl::new(ConnectionPool::new(pool));
        repo.create(create_event("12 Hill Road, Bandra", 3)).await?;
        repo.create(CreateLot::new(
            "Airport".into(),
            Decimal::new(5000, 2),
            "Terminal 2, Sahar".into(),
            Pincode::parse("400099")?,
            10,
        ))
        .await?;

        let by_pin = repo.search(LotSearch::from_keyword("4000")).await?;
        assert_eq!(by_pin.len(), 2);
        let by_address = repo.search(LotSearch::from_keyword("hill road")).await?;
        assert_eq!(by_address.len(), 1);
        assert_eq!(by_address[0].available_spots, 3);
        let exact = repo
            .search(LotSearch::PincodeEquals("400099".into()))
            .await?;
        assert_eq!(exact.len(), 1);
        Ok(())
    }
}
