use crate::model::lot::LotAvailabilityResponse;
use chrono::{DateTime, Utc};
use derive_new::new;
use garde::Validate;
use kernel::model::{
    billing::display_amount,
    id::{LotId, ReservationId, SpotId, UserId},
    lot::ParkingLot,
    reservation::{
        event::{BookingTarget, CreateReservation},
        Reservation, ReservationSpot,
    },
    vehicle::VehicleNumber,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResult};

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BookRequest {
    #[garde(length(min = 1, max = 20))]
    pub vehicle_number: String,
}

#[derive(new)]
pub struct BookRequestWithTarget(BookingTarget, UserId, DateTime<Utc>, BookRequest);

impl TryFrom<BookRequestWithTarget> for CreateReservation {
    type Error = AppError;

    fn try_from(value: BookRequestWithTarget) -> Result<Self, Self::Error> {
        let BookRequestWithTarget(target, user_id, parking_time, BookRequest { vehicle_number }) =
            value;
        Ok(Self {
            target,
            user_id,
            vehicle_number: VehicleNumber::parse(&vehicle_number)?,
            parking_time,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationResponse {
    pub id: ReservationId,
    pub spot_id: SpotId,
    pub spot_no: i32,
    pub lot_id: LotId,
    pub lot_name: String,
    pub address: String,
    pub price: Decimal,
    pub vehicle_number: String,
    pub parking_time: DateTime<Utc>,
    pub leaving_time: Option<DateTime<Utc>>,
    pub total_cost: Option<Decimal>,
    pub is_open: bool,
}

impl From<Reservation> for ReservationResponse {
    fn from(value: Reservation) -> Self {
        let is_open = value.is_open();
        let Reservation {
            reservation_id,
            spot:
                ReservationSpot {
                    spot_id,
                    spot_no,
                    lot_id,
                },
            lot_name,
            address,
            hourly_rate,
            vehicle_number,
            parking_time,
            leaving_time,
            total_cost,
            ..
        } = value;
        Self {
            id: reservation_id,
            spot_id,
            spot_no,
            lot_id,
            lot_name,
            address,
            price: hourly_rate,
            vehicle_number,
            parking_time,
            leaving_time,
            total_cost: total_cost.map(display_amount),
            is_open,
        }
    }
}

// 出庫前の確認用。この時刻に出庫した場合の料金
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleasePreviewResponse {
    pub reservation: ReservationResponse,
    pub leaving_time: DateTime<Utc>,
    pub estimated_cost: Decimal,
}

impl ReleasePreviewResponse {
    pub fn at(reservation: Reservation, now: DateTime<Utc>) -> AppResult<Self> {
        let (leaving_time, cost) = reservation.close_at(now)?;
        Ok(Self {
            reservation: reservation.into(),
            leaving_time,
            estimated_cost: display_amount(cost),
        })
    }
}

// ユーザーダッシュボード：駐車場の空き状況と自分の予約
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub lots: Vec<LotAvailabilityResponse>,
    pub reservations: Vec<ReservationResponse>,
}

impl From<(Vec<ParkingLot>, Vec<Reservation>)> for DashboardResponse {
    fn from((lots, reservations): (Vec<ParkingLot>, Vec<Reservation>)) -> Self {
        Self {
            lots: lots.into_iter().map(LotAvailabilityResponse::from).collect(),
            reservations: reservations
                .into_iter()
                .map(ReservationResponse::from)
                .collect(),
        }
    }
}
