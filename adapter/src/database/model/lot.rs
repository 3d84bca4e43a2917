use kernel::model::{id::LotId, lot::ParkingLot, summary::LotUsage};
use rust_decimal::Decimal;

#[derive(sqlx::FromRow)]
pub struct LotRow {
    pub lot_id: LotId,
    pub name: String,
    pub hourly_rate: Decimal,
    pub address: String,
    pub pincode: String,
    pub max_spots: i32,
    pub is_active: bool,
    pub available_spots: i64,
    pub occupied_spots: i64,
}

impl From<LotRow> for ParkingLot {
    fn from(value: LotRow) -> Self {
        let LotRow {
            lot_id,
            name,
            hourly_rate,
            address,
            pincode,
            max_spots,
            is_active,
            available_spots,
            occupied_spots,
        } = value;
        ParkingLot {
            lot_id,
            name,
            hourly_rate,
            address,
            pincode,
            max_spots,
            is_active,
            available_spots,
            occupied_spots,
        }
    }
}

// 予約処理で駐車場情報をスナップショットするための型
#[derive(sqlx::FromRow)]
pub struct LotSnapshotRow {
    pub lot_id: LotId,
    pub name: String,
    pub address: String,
    pub hourly_rate: Decimal,
    pub is_active: bool,
}

#[derive(sqlx::FromRow)]
pub struct LotUsageRow {
    pub lot_id: LotId,
    pub name: String,
    pub revenue: Decimal,
    pub available_spots: i64,
    pub occupied_spots: i64,
}

impl From<LotUsageRow> for LotUsage {
    fn from(value: LotUsageRow) -> Self {
        let LotUsageRow {
            lot_id,
            name,
            revenue,
            available_spots,
            occupied_spots,
        } = value;
        LotUsage {
            lot_id,
            lot_name: name,
            revenue,
            available_spots,
            occupied_spots,
        }
    }
}
