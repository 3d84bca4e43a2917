use kernel::model::{
    id::{LotId, SpotId},
    spot::ParkingSpot,
};
use shared::error::AppError;

#[derive(sqlx::FromRow)]
pub struct SpotRow {
    pub spot_id: SpotId,
    pub lot_id: LotId,
    pub spot_no: i32,
    pub status: String,
    pub is_active: bool,
}

impl TryFrom<SpotRow> for ParkingSpot {
    type Error = AppError;

    fn try_from(value: SpotRow) -> Result<Self, Self::Error> {
        let SpotRow {
            spot_id,
            lot_id,
            spot_no,
            status,
            is_active,
        } = value;
        Ok(ParkingSpot {
            spot_id,
            lot_id,
            spot_no,
            status: status.parse()?,
            is_active,
        })
    }
}

// スポット詳細の取得に使う、駐車場名つきの型
#[derive(sqlx::FromRow)]
pub struct SpotWithLotRow {
    #[sqlx(flatten)]
    pub spot: SpotRow,
    pub lot_name: String,
}
