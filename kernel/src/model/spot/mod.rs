use crate::model::{
    id::{LotId, SpotId},
    reservation::Reservation,
};
use shared::error::{AppError, AppResult};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpotStatus {
    Available,
    Occupied,
}

impl SpotStatus {
    /// Single-letter code stored in `parking_spots.status`.
    pub fn code(self) -> &'static str {
        match self {
            SpotStatus::Available => "A",
            SpotStatus::Occupied => "O",
        }
    }
}

impl FromStr for SpotStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" => Ok(SpotStatus::Available),
            "O" => Ok(SpotStatus::Occupied),
            other => Err(AppError::ConversionEntityError(format!(
                "unknown spot status `{other}`"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParkingSpot {
    pub spot_id: SpotId,
    pub lot_id: LotId,
    pub spot_no: i32,
    pub status: SpotStatus,
    pub is_active: bool,
}

impl ParkingSpot {
    pub fn is_occupied(&self) -> bool {
        self.status == SpotStatus::Occupied
    }

    pub fn ensure_bookable(&self) -> AppResult<()> {
        if !self.is_active {
            return Err(AppError::EntityNotFound(format!(
                "parking spot ({}) was not found",
                self.spot_id
            )));
        }
        if self.is_occupied() {
            return Err(AppError::Conflict(format!(
                "parking spot {} is already occupied",
                self.spot_no
            )));
        }
        Ok(())
    }

    pub fn ensure_removable(&self) -> AppResult<()> {
        if !self.is_active {
            return Err(AppError::EntityNotFound(format!(
                "parking spot ({}) was not found",
                self.spot_id
            )));
        }
        if self.is_occupied() {
            return Err(AppError::Conflict(format!(
                "cannot delete occupied parking spot {}",
                self.spot_no
            )));
        }
        Ok(())
    }
}

/// An active spot together with the reservation currently parked on it.
#[derive(Debug)]
pub struct SpotDetail {
    pub spot: ParkingSpot,
    pub lot_name: String,
    pub current_reservation: Option<Reservation>,
}
