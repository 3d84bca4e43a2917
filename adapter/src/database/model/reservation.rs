use chrono::{DateTime, Utc};
use kernel::model::{
    id::{LotId, ReservationId, SpotId, UserId},
    reservation::{Reservation, ReservationSpot},
    summary::UserLotUsage,
};
use rust_decimal::Decimal;

// 予約テーブルとスポットを結合した行
// leaving_time が None のものが駐車中の予約
#[derive(sqlx::FromRow)]
pub struct ReservationRow {
    pub reservation_id: ReservationId,
    pub spot_id: SpotId,
    pub spot_no: i32,
    pub lot_id: LotId,
    pub user_id: UserId,
    pub lot_name_at_booking: String,
    pub address_at_booking: String,
    pub rate_at_booking: Decimal,
    pub vehicle_number: String,
    pub parking_time: DateTime<Utc>,
    pub leaving_time: Option<DateTime<Utc>>,
    pub total_cost: Option<Decimal>,
}

impl From<ReservationRow> for Reservation {
    fn from(value: ReservationRow) -> Self {
        let ReservationRow {
            reservation_id,
            spot_id,
            spot_no,
            lot_id,
            user_id,
            lot_name_at_booking,
            address_at_booking,
            rate_at_booking,
            vehicle_number,
            parking_time,
            leaving_time,
            total_cost,
        } = value;
        Reservation {
            reservation_id,
            user_id,
            spot: ReservationSpot {
                spot_id,
                spot_no,
                lot_id,
            },
            lot_name: lot_name_at_booking,
            address: address_at_booking,
            hourly_rate: rate_at_booking,
            vehicle_number,
            parking_time,
            leaving_time,
            total_cost,
        }
    }
}

#[derive(sqlx::FromRow)]
pub struct UserLotUsageRow {
    pub lot_name: String,
    pub reservations: i64,
}

impl From<UserLotUsageRow> for UserLotUsage {
    fn from(value: UserLotUsageRow) -> Self {
        let UserLotUsageRow {
            lot_name,
            reservations,
        } = value;
        UserLotUsage {
            lot_name,
            reservations,
        }
    }
}
