use crate::database::{
    map_commit_error, map_write_error, CONCURRENT_CHANGE,
    model::{
        lot::LotSnapshotRow,
        reservation::{ReservationRow, UserLotUsageRow},
        spot::SpotRow,
    },
    ConnectionPool,
};
use async_trait::async_trait;
use chrono::SubsecRound;
use derive_new::new;
use kernel::{
    model::{
        id::{LotId, ReservationId, UserId},
        reservation::{
            event::{BookingTarget, CreateReservation, ReleaseReservation},
            Reservation, ReservationSpot,
        },
        spot::{ParkingSpot, SpotStatus},
        summary::UserLotUsage,
    },
    repository::reservation::ReservationRepository,
};
use shared::error::{AppError, AppResult};
use sqlx::{Postgres, Transaction};

pub(crate) const RESERVATION_SELECT: &str = r#"
    SELECT
        r.reservation_id,
        r.spot_id,
        s.spot_no,
        s.lot_id,
        r.user_id,
        r.lot_name_at_booking,
        r.address_at_booking,
        r.rate_at_booking,
        r.vehicle_number,
        r.parking_time,
        r.leaving_time,
        r.total_cost
    FROM reservations AS r
    INNER JOIN parking_spots AS s ON r.spot_id = s.spot_id
"#;

#[derive(new)]
pub struct ReservationRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl ReservationRepository for ReservationRepositoryImpl {
    // 予約（入庫）操作を行う
    async fn create(&self, event: CreateReservation) -> AppResult<Reservation> {
        let CreateReservation {
            target,
            user_id,
            vehicle_number,
            parking_time,
        } = event;
        let conflict = "the spot or vehicle was booked concurrently, try again";

        let mut tx = self.db.begin_serializable().await?;

        // 事前のチェックとして、以下を調べる。
        // - 指定のスポット（または駐車場の空きスポット）が存在し、有効であるか
        // - そのスポットが空いているか
        // - 同じ車両が他のスポットに駐車中でないか
        let (spot, lot) = match target {
            BookingTarget::Spot(spot_id) => {
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
                .map_err(|e| map_write_error(e, conflict))?
                .map(ParkingSpot::try_from)
                .transpose()?
                .ok_or_else(|| {
                    AppError::EntityNotFound(format!("parking spot ({spot_id}) was not found"))
                })?;
                spot.ensure_bookable()?;
                let lot = find_active_lot(&mut tx, spot.lot_id).await?;
                (spot, lot)
            }
            BookingTarget::Lot(lot_id) => {
                let lot = find_active_lot(&mut tx, lot_id).await?;
                // 番号の若い空きスポットから割り当てる
                let spot = sqlx::query_as::<_, SpotRow>(
                    r#"
                        SELECT spot_id, lot_id, spot_no, status, is_active
                        FROM parking_spots
                        WHERE lot_id = $1 AND is_active AND status = 'A'
                        ORDER BY spot_no
                        LIMIT 1
                        FOR UPDATE
                    "#,
                )
                .bind(lot_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| map_write_error(e, conflict))?
                .map(ParkingSpot::try_from)
                .transpose()?
                .ok_or_else(|| {
                    AppError::Conflict(format!(
                        "no available spots in parking lot {}, choose another lot",
                        lot.name
                    ))
                })?;
                (spot, lot)
            }
        };

        let parked_elsewhere = sqlx::query_scalar::<_, ReservationId>(
            r#"
                SELECT reservation_id FROM reservations
                WHERE UPPER(vehicle_number) = $1 AND leaving_time IS NULL
                LIMIT 1
            "#,
        )
        .bind(vehicle_number.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, conflict))?;
        if parked_elsewhere.is_some() {
            return Err(AppError::Conflict(format!(
                "vehicle {vehicle_number} is already parked"
            )));
        }

        // スポットを使用中にする（空きでなければ他の予約に先を越されている）
        let res = sqlx::query(
            r#"
                UPDATE parking_spots SET status = $1
                WHERE spot_id = $2 AND status = $3
            "#,
        )
        .bind(SpotStatus::Occupied.code())
        .bind(spot.spot_id)
        .bind(SpotStatus::Available.code())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, conflict))?;
        if res.rows_affected() < 1 {
            return Err(AppError::Conflict(format!(
                "parking spot {} is already occupied",
                spot.spot_no
            )));
        }

        // 予約レコードを追加する。駐車場の名前・住所・料金はこの時点の値を保存する
        let reservation_id = ReservationId::new();
        let parking_time = parking_time.trunc_subsecs(3);
        let res = sqlx::query(
            r#"
                INSERT INTO reservations
                (reservation_id, spot_id, user_id, lot_name_at_booking, address_at_booking,
                 rate_at_booking, vehicle_number, parking_time)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(reservation_id)
        .bind(spot.spot_id)
        .bind(user_id)
        .bind(&lot.name)
        .bind(&lot.address)
        .bind(lot.hourly_rate)
        .bind(vehicle_number.as_str())
        .bind(parking_time)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, conflict))?;

        if res.rows_affected() < 1 {
            return Err(AppError::NoRowsAffectedError(
                "No reservation record has been created".into(),
            ));
        }

        tx.commit()
            .await
            .map_err(|e| map_commit_error(e, conflict))?;

        tracing::info!(
            %reservation_id,
            spot_id = %spot.spot_id,
            spot_no = spot.spot_no,
            vehicle = %vehicle_number,
            "spot booked"
        );

        Ok(Reservation {
            reservation_id,
            user_id,
            spot: ReservationSpot {
                spot_id: spot.spot_id,
                spot_no: spot.spot_no,
                lot_id: lot.lot_id,
            },
            lot_name: lot.name,
            address: lot.address,
            hourly_rate: lot.hourly_rate,
            vehicle_number: vehicle_number.into(),
            parking_time,
            leaving_time: None,
            total_cost: None,
        })
    }

    // 出庫操作を行う
    async fn release(&self, event: ReleaseReservation) -> AppResult<Reservation> {
        let ReleaseReservation {
            reservation_id,
            requested_by,
            requester_role,
            released_at,
        } = event;
        let conflict = "the reservation was changed concurrently, try again";

        let mut tx = self.db.begin_serializable().await?;

        let sql = format!("{RESERVATION_SELECT} WHERE r.reservation_id = $1 FOR UPDATE OF r");
        let mut reservation: Reservation = sqlx::query_as::<_, ReservationRow>(&sql)
            .bind(reservation_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_write_error(e, conflict))?
            .map(Reservation::from)
            .ok_or_else(|| {
                AppError::EntityNotFound(format!("reservation ({reservation_id}) was not found"))
            })?;

        reservation.ensure_releasable_by(requested_by, requester_role)?;

        // 料金はコミットする出庫時刻で確定させる
        let (leaving_time, total_cost) = reservation.close_at(released_at.trunc_subsecs(3))?;

        let res = sqlx::query(
            r#"
                UPDATE reservations
                SET leaving_time = $1, total_cost = $2
                WHERE reservation_id = $3 AND leaving_time IS NULL
            "#,
        )
        .bind(leaving_time)
        .bind(total_cost)
        .bind(reservation_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, conflict))?;
        if res.rows_affected() < 1 {
            return Err(AppError::EntityNotFound(format!(
                "reservation ({reservation_id}) is already released"
            )));
        }

        let res = sqlx::query("UPDATE parking_spots SET status = $1 WHERE spot_id = $2")
            .bind(SpotStatus::Available.code())
            .bind(reservation.spot.spot_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_write_error(e, conflict))?;
        if res.rows_affected() < 1 {
            return Err(AppError::NoRowsAffectedError(
                "No parking spot record has been released".into(),
            ));
        }

        tx.commit()
            .await
            .map_err(|e| map_commit_error(e, conflict))?;

        tracing::info!(%reservation_id, %total_cost, "spot released");

        reservation.leaving_time = Some(leaving_time);
        reservation.total_cost = Some(total_cost);
        Ok(reservation)
    }

    async fn find_by_id(&self, reservation_id: ReservationId) -> AppResult<Option<Reservation>> {
        let sql = format!("{RESERVATION_SELECT} WHERE r.reservation_id = $1");
        sqlx::query_as::<_, ReservationRow>(&sql)
            .bind(reservation_id)
            .fetch_optional(self.db.inner_ref())
            .await
            .map(|row| row.map(Reservation::from))
            .map_err(AppError::SpecificOperationError)
    }

    async fn find_by_user_id(&self, user_id: UserId) -> AppResult<Vec<Reservation>> {
        let sql = format!(
            r#"{RESERVATION_SELECT}
            WHERE r.user_id = $1
            ORDER BY (r.leaving_time IS NULL) DESC, r.parking_time DESC"#
        );
        sqlx::query_as::<_, ReservationRow>(&sql)
            .bind(user_id)
            .fetch_all(self.db.inner_ref())
            .await
            .map(|rows| rows.into_iter().map(Reservation::from).collect())
            .map_err(AppError::SpecificOperationError)
    }

    async fn usage_by_user_id(&self, user_id: UserId) -> AppResult<Vec<UserLotUsage>> {
        sqlx::query_as::<_, UserLotUsageRow>(
            r#"
                SELECT lot_name_at_booking AS lot_name, COUNT(*) AS reservations
                FROM reservations
                WHERE user_id = $1
                GROUP BY lot_name_at_booking
                ORDER BY reservations DESC, lot_name
            "#,
        )
        .bind(user_id)
        .fetch_all(self.db.inner_ref())
        .await
        .map(|rows| rows.into_iter().map(UserLotUsage::from).collect())
        .map_err(AppError::SpecificOperationError)
    }
}

// 予約時にスナップショットする駐車場情報を取得する
async fn find_active_lot(
    tx: &mut Transaction<'_, Postgres>,
    lot_id: LotId,
) -> AppResult<LotSnapshotRow> {
    let lot = sqlx::query_as::<_, LotSnapshotRow>(
        r#"
            SELECT lot_id, name, address, hourly_rate, is_active
            FROM parking_lots
            WHERE lot_id = $1
            FOR SHARE
        "#,
    )
    .bind(lot_id)
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| map_write_error(e, CONCURRENT_CHANGE))?;

    match lot {
        Some(lot) if lot.is_active => Ok(lot),
        _ => Err(AppError::EntityNotFound(format!(
            "parking lot ({lot_id}) was not found"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{lot::LotRepositoryImpl, spot::SpotRepositoryImpl, user::UserRepositoryImpl};
    use chrono::{Duration, Utc};
    use kernel::{
        model::{
            lot::event::CreateLot, pincode::Pincode, role::Role, user::event::CreateUser,
            vehicle::VehicleNumber,
        },
        repository::{lot::LotRepository, spot::SpotRepository, user::UserRepository},
    };
    use rust_decimal::Decimal;

    struct Setup {
        repo: ReservationRepositoryImpl,
        spots: SpotRepositoryImpl,
        lot_id: LotId,
        other_lot_id: LotId,
        user_id: UserId,
    }

    async fn setup(pool: sqlx::PgPool) -> anyhow::Result<Setup> {
        let db = ConnectionPool::new(pool);
        let lots = LotRepositoryImpl::new(db.clone());
        let users = UserRepositoryImpl::new(db.clone());

        let lot_id = lots
            .create(CreateLot::new(
                "Phoenix Mall".into(),
                Decimal::new(2000, 2),
                "LBS Marg, Kurla".into(),
                Pincode::parse("400070")?,
                2,
            ))
            .await?;
        let other_lot_id = lots
            .create(CreateLot::new(
                "BKC".into(),
                Decimal::new(4000, 2),
                "G Block, BKC".into(),
                Pincode::parse("400051")?,
                1,
            ))
            .await?;
        let user = users
            .create(CreateUser::new(
                "Ravi".into(),
                "ravi@example.com".into(),
                "password".into(),
                "Kurla".into(),
                Pincode::parse("400070")?,
            ))
            .await?;

        Ok(Setup {
            repo: ReservationRepositoryImpl::new(db.clone()),
            spots: SpotRepositoryImpl::new(db),
            lot_id,
            other_lot_id,
            user_id: user.user_id,
        })
    }

    #[sqlx::test]
    #[ignore = "requires PostgreSQL via DATABASE_URL"]
    async fn vehicle_cannot_park_twice(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let s = setup(pool).await?;
        let vehicle = VehicleNumber::parse("MH12AA7842")?;

        let first = s
            .repo
            .create(CreateReservation::new(
                BookingTarget::Lot(s.lot_id),
                s.user_id,
                vehicle.clone(),
                Utc::now(),
            ))
            .await?;
        assert_eq!(first.spot.spot_no, 1);
        assert_eq!(first.vehicle_number, "MH12AA7842");

        let spots = s.spots.find_by_lot_id(s.lot_id).await?;
        assert_eq!(spots[0].status, SpotStatus::Occupied);

        let again = s
            .repo
            .create(CreateReservation::new(
                BookingTarget::Lot(s.other_lot_id),
                s.user_id,
                VehicleNumber::parse("mh12aa7842")?,
                Utc::now(),
            ))
            .await;
        assert!(matches!(again, Err(AppError::Conflict(_))));

        let occupied_spot = s
            .repo
            .create(CreateReservation::new(
                BookingTarget::Spot(spots[0].spot_id),
                s.user_id,
                VehicleNumber::parse("KA01AB1234")?,
                Utc::now(),
            ))
            .await;
        assert!(matches!(occupied_spot, Err(AppError::Conflict(_))));
        Ok(())
    }

    fn single_winner(results: [AppResult<Reservation>; 2]) -> Reservation {
        assert!(
            results
                .iter()
                .any(|r| matches!(r, Err(AppError::Conflict(_)))),
            "the losing booking must be a conflict"
        );
        let mut winners: Vec<Reservation> = results.into_iter().filter_map(Result::ok).collect();
        assert_eq!(winners.len(), 1);
        winners.remove(0)
    }

    #[sqlx::test]
    #[ignore = "requires PostgreSQL via DATABASE_URL"]
    async fn concurrent_bookings_of_one_spot_have_one_winner(
        pool: sqlx::PgPool,
    ) -> anyhow::Result<()> {
        let s = setup(pool).await?;
        let spot_id = s.spots.find_by_lot_id(s.lot_id).await?[0].spot_id;
        let first = VehicleNumber::parse("MH12AA7842")?;
        let second = VehicleNumber::parse("KA01AB1234")?;

        let (a, b) = tokio::join!(
            s.repo.create(CreateReservation::new(
                BookingTarget::Spot(spot_id),
                s.user_id,
                first,
                Utc::now(),
            )),
            s.repo.create(CreateReservation::new(
                BookingTarget::Spot(spot_id),
                s.user_id,
                second,
                Utc::now(),
            )),
        );
        let winner = single_winner([a, b]);
        assert_eq!(winner.spot.spot_id, spot_id);

        let open: Vec<Reservation> = s
            .repo
            .find_by_user_id(s.user_id)
            .await?
            .into_iter()
            .filter(Reservation::is_open)
            .collect();
        assert_eq!(open.len(), 1);
        let spot = &s.spots.find_by_lot_id(s.lot_id).await?[0];
        assert_eq!(spot.status, SpotStatus::Occupied);
        Ok(())
    }

    #[sqlx::test]
    #[ignore = "requires PostgreSQL via DATABASE_URL"]
    async fn concurrent_bookings_of_one_vehicle_have_one_winner(
        pool: sqlx::PgPool,
    ) -> anyhow::Result<()> {
        let s = setup(pool).await?;
        let vehicle = VehicleNumber::parse("22BH1489AA")?;

        let (a, b) = tokio::join!(
            s.repo.create(CreateReservation::new(
                BookingTarget::Lot(s.lot_id),
                s.user_id,
                vehicle.clone(),
                Utc::now(),
            )),
            s.repo.create(CreateReservation::new(
                BookingTarget::Lot(s.other_lot_id),
                s.user_id,
                vehicle,
                Utc::now(),
            )),
        );
        let winner = single_winner([a, b]);
        assert_eq!(winner.vehicle_number, "22BH1489AA");

        // 負けた側のスポットは空きのまま
        let loser_lot = if winner.spot.lot_id == s.lot_id {
            s.other_lot_id
        } else {
            s.lot_id
        };
        let spots = s.spots.find_by_lot_id(loser_lot).await?;
        assert!(spots.iter().all(|spot| spot.status == SpotStatus::Available));
        Ok(())
    }

    #[sqlx::test]
    #[ignore = "requires PostgreSQL via DATABASE_URL"]
    async fn release_bills_elapsed_time_and_frees_spot(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let s = setup(pool).await?;
        let parked_at = Utc::now() - Duration::hours(3);

        let reservation = s
            .repo
            .create(CreateReservation::new(
                BookingTarget::Lot(s.lot_id),
                s.user_id,
                VehicleNumber::parse("22BH1489AA")?,
                parked_at,
            ))
            .await?;

        let stranger = s
            .repo
            .release(ReleaseReservation::new(
                reservation.reservation_id,
                UserId::new(),
                Role::User,
                Utc::now(),
            ))
            .await;
        assert!(matches!(stranger, Err(AppError::ForbiddenOperation)));

        let released = s
            .repo
            .release(ReleaseReservation::new(
                reservation.reservation_id,
                s.user_id,
                Role::User,
                reservation.parking_time + Duration::hours(2),
            ))
            .await?;
        assert_eq!(released.total_cost, Some(Decimal::new(4000, 2)));
        assert!(released.leaving_time.unwrap() >= released.parking_time);

        let spot = &s.spots.find_by_lot_id(s.lot_id).await?[0];
        assert_eq!(spot.status, SpotStatus::Available);

        let twice = s
            .repo
            .release(ReleaseReservation::new(
                reservation.reservation_id,
                s.user_id,
                Role::User,
                Utc::now(),
            ))
            .await;
        assert!(matches!(twice, Err(AppError::EntityNotFound(_))));

        let history = s.repo.find_by_user_id(s.user_id).await?;
        assert_eq!(history.len(), 1);
        assert!(!history[0].is_open());

        let usage = s.repo.usage_by_user_id(s.user_id).await?;
        assert_eq!(usage[0].lot_name, "Phoenix Mall");
        assert_eq!(usage[0].reservations, 1);
        Ok(())
    }
}
