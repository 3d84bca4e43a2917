use crate::model::{id::LotId, pincode::Pincode};
use derive_new::new;
use rust_decimal::Decimal;

#[derive(new)]
pub struct CreateLot {
    pub name: String,
    pub hourly_rate: Decimal,
    pub address: String,
    pub pincode: Pincode,
    pub max_spots: i32,
}

#[derive(new)]
pub struct UpdateLot {
    pub lot_id: LotId,
    pub name: String,
    pub hourly_rate: Decimal,
    pub address: String,
    pub pincode: Pincode,
    pub max_spots: i32,
}

#[derive(new)]
pub struct DeactivateLot {
    pub lot_id: LotId,
}
