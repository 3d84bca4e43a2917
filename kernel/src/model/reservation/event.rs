use crate::model::{
    id::{LotId, ReservationId, SpotId, UserId},
    role::Role,
    vehicle::VehicleNumber,
};
use chrono::{DateTime, Utc};
use derive_new::new;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingTarget {
    Spot(SpotId),
    /// The lowest-numbered available spot of the lot.
    Lot(LotId),
}

#[derive(new)]
pub struct CreateReservation {
    pub target: BookingTarget,
    pub user_id: UserId,
    pub vehicle_number: VehicleNumber,
    pub parking_time: DateTime<Utc>,
}

#[derive(new)]
pub struct ReleaseReservation {
    pub reservation_id: ReservationId,
    pub requested_by: UserId,
    pub requester_role: Role,
    pub released_at: DateTime<Utc>,
}
