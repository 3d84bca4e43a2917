use crate::model::{
    billing,
    id::{LotId, ReservationId, SpotId, UserId},
    role::Role,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::error::{AppError, AppResult};

pub mod event;

#[derive(Debug, Clone)]
pub struct Reservation {
    pub reservation_id: ReservationId,
    pub user_id: UserId,
    pub spot: ReservationSpot,
    // 予約時点の駐車場情報のスナップショット
    pub lot_name: String,
    pub address: String,
    pub hourly_rate: Decimal,
    pub vehicle_number: String,
    pub parking_time: DateTime<Utc>,
    pub leaving_time: Option<DateTime<Utc>>,
    pub total_cost: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct ReservationSpot {
    pub spot_id: SpotId,
    pub spot_no: i32,
    pub lot_id: LotId,
}

impl Reservation {
    pub fn is_open(&self) -> bool {
        self.leaving_time.is_none()
    }

    /// Leaving time and fee if the vehicle leaves at `at`. A clock reading
    /// earlier than the parking time is clamped so the interval never runs
    /// backwards.
    pub fn close_at(&self, at: DateTime<Utc>) -> AppResult<(DateTime<Utc>, Decimal)> {
        let leaving_time = at.max(self.parking_time);
        let cost = billing::parking_fee(self.parking_time, leaving_time, self.hourly_rate)?;
        Ok((leaving_time, cost))
    }

    pub fn ensure_releasable_by(&self, user_id: UserId, role: Role) -> AppResult<()> {
        if !self.is_open() {
            return Err(AppError::EntityNotFound(format!(
                "reservation ({}) is already released",
                self.reservation_id
            )));
        }
        if role != Role::Admin && self.user_id != user_id {
            return Err(AppError::ForbiddenOperation);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::str::FromStr;

    fn open_reservation(user_id: UserId) -> Reservation {
        Reservation {
            reservation_id: ReservationId::new(),
            user_id,
            spot: ReservationSpot {
                spot_id: SpotId::new(),
                spot_no: 1,
                lot_id: LotId::new(),
            },
            lot_name: "Phoenix Mall".into(),
            address: "LBS Marg, Kurla".into(),
            hourly_rate: Decimal::from_str("20.00").unwrap(),
            vehicle_number: "MH12AA7842".into(),
            parking_time: Utc.with_ymd_and_hms(2025, 1, 10, 8, 0, 0).unwrap(),
            leaving_time: None,
            total_cost: None,
        }
    }

    #[test]
    fn closing_after_two_hours_costs_forty() {
        let r = open_reservation(UserId::new());
        let (leaving, cost) = r.close_at(r.parking_time + Duration::hours(2)).unwrap();
        assert_eq!(leaving, r.parking_time + Duration::hours(2));
        assert_eq!(cost, Decimal::from_str("40.00").unwrap());
    }

    #[test]
    fn closing_never_precedes_parking_time() {
        let r = open_reservation(UserId::new());
        let (leaving, cost) = r.close_at(r.parking_time - Duration::minutes(5)).unwrap();
        assert!(leaving >= r.parking_time);
        assert!(cost >= Decimal::ZERO);
    }

    #[test]
    fn only_owner_or_admin_may_release() {
        let owner = UserId::new();
        let r = open_reservation(owner);
        assert!(r.ensure_releasable_by(owner, Role::User).is_ok());
        assert!(r.ensure_releasable_by(UserId::new(), Role::Admin).is_ok());
        assert!(matches!(
            r.ensure_releasable_by(UserId::new(), Role::User),
            Err(AppError::ForbiddenOperation)
        ));
    }

    #[test]
    fn released_reservation_cannot_be_released_again() {
        let owner = UserId::new();
        let mut r = open_reservation(owner);
        r.leaving_time = Some(r.parking_time + Duration::hours(1));
        assert!(matches!(
            r.ensure_releasable_by(owner, Role::User),
            Err(AppError::EntityNotFound(_))
        ));
    }
}
