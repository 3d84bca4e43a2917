use crate::{
    database::{
        map_commit_error, map_write_error,
        model::{
            reservation::ReservationRow,
            spot::{SpotRow, SpotWithLotRow},
        },
        ConnectionPool,
    },
    repository::reservation::RESERVATION_SELECT,
};
use async_trait::async_trait;
use derive_new::new;
use kernel::{
    model::{
        id::{LotId, SpotId},
        reservation::Reservation,
        spot::{ParkingSpot, SpotDetail},
    },
    repository::spot::SpotRepository,
};
use shared::error::{AppError, AppResult};

#[derive(new)]
pub struct SpotRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl SpotRepository for SpotRepositoryImpl {
    async fn find_by_lot_id(&self, lot_id: LotId) -> AppResult<Vec<ParkingSpot>> {
        sqlx::query_as::<_, SpotRow>(
            r#"
                SELECT spot_id, lot_id, spot_no, status, is_active
                FROM parking_spots
                WHERE lot_id = $1
                ORDER BY spot_no
            "#,
        )
        .bind(lot_id)
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?
        .into_iter()
        .map(ParkingSpot::try_from)
        .collect()
    }

    async fn find_detail(&self, spot_id: SpotId) -> AppResult<Option<SpotDetail>> {
        let row = sqlx::query_as::<_, SpotWithLotRow>(
            r#"
                SELECT s.spot_id, s.lot_id, s.spot_no, s.status, s.is_active,
                       l.name AS lot_name
                FROM parking_spots AS s
                INNER JOIN parking_lots AS l ON s.lot_id = l.lot_id
                WHERE s.spot_id = $1 AND s.is_active
            "#,
        )
        .bind(spot_id)
        .fetch_optional(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        let Some(SpotWithLotRow { spot, lot_name }) = row else {
            return Ok(None);
        };
        let spot = ParkingSpot::try_from(spot)?;

        let sql = format!("{RESERVATION_SELECT} WHERE r.spot_id = $1 AND r.leaving_time IS NULL");
        let current_reservation = sqlx::query_as::<_, ReservationRow>(&sql)
            .bind(spot_id)
            .fetch_optional(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?
            .map(Reservation::from);

        Ok(Some(SpotDetail {
            spot,
            lot_name,
            current_reservation,
        }))
    }

    async fn remove(&self, spot_id: SpotId) -> AppResult<()> {
        let conflict = format!("parking spot ({spot_id}) was changed concurrently, try again");
        let mut tx = self.db.begin_serializable().await?;

        // スポットの存在確認と、空きであることの確認
        let spot = sqlx::query_as::<_, SpotRow>(
            r#"
                SELECT spot_id, lot_id, spot_no, status, is_active
                FROM parking_spots
                WHERE spot_id = $1
                FOR UPDATE
            "#,
        )
        .bind(spot_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, &conflict))?
        .map(ParkingSpot::try_from)
        .transpose()?
        .ok_or_else(|| {
            AppError::EntityNotFound(format!("parking spot ({spot_id}) was not found"))
        })?;
        spot.ensure_removable()?;

        sqlx::query("UPDATE parking_spots SET is_active = FALSE WHERE spot_id = $1")
            .bind(spot_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_write_error(e, &conflict))?;

        // スポットを減らした分だけ駐車場の上限も減らす
        sqlx::query(
            r#"
                UPDATE parking_lots
                SET max_spots = max_spots - 1, updated_at = CURRENT_TIMESTAMP(3)
                WHERE lot_id = $1 AND max_spots > 0
            "#,
        )
        .bind(spot.lot_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, &conflict))?;

        tx.commit()
            .await
            .map_err(|e| map_commit_error(e, &conflict))?;

        tracing::info!(%spot_id, lot_id = %spot.lot_id, spot_no = spot.spot_no, "parking spot removed");
        Ok(())
    }
}
