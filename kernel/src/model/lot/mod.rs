pub mod capacity;
pub mod event;

use crate::model::{
    id::{LotId, UserId},
    spot::ParkingSpot,
};
use rust_decimal::Decimal;
use shared::error::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct ParkingLot {
    pub lot_id: LotId,
    pub name: String,
    pub hourly_rate: Decimal,
    pub address: String,
    pub pincode: String,
    pub max_spots: i32,
    pub is_active: bool,
    // 有効なスポットのみを数える
    pub available_spots: i64,
    pub occupied_spots: i64,
}

#[derive(Debug)]
pub struct LotDetail {
    pub lot: ParkingLot,
    pub spots: Vec<ParkingSpot>,
}

/// Filters understood by the lot search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LotSearch {
    All,
    PincodeContains(String),
    AddressContains(String),
    PincodeEquals(String),
    UsedBy(UserId),
}

impl LotSearch {
    /// Free-text search: digits match pincodes, anything else matches addresses.
    pub fn from_keyword(keyword: &str) -> Self {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            LotSearch::All
        } else if keyword.chars().all(|c| c.is_ascii_digit()) {
            LotSearch::PincodeContains(keyword.to_string())
        } else {
            LotSearch::AddressContains(keyword.to_string())
        }
    }
}

pub fn ensure_no_occupied_spots(occupied_spots: i64) -> AppResult<()> {
    if occupied_spots > 0 {
        return Err(AppError::Conflict(format!(
            "cannot delete lot with occupied spots ({occupied_spots} occupied)"
        )));
    }
    Ok(())
}
