use crate::model::id::LotId;
use rust_decimal::Decimal;

#[derive(Debug)]
pub struct LotUsage {
    pub lot_id: LotId,
    pub lot_name: String,
    pub revenue: Decimal,
    pub available_spots: i64,
    pub occupied_spots: i64,
}

/// How often a user parked at a lot, keyed by the name captured at booking.
#[derive(Debug)]
pub struct UserLotUsage {
    pub lot_name: String,
    pub reservations: i64,
}
