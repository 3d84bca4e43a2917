use crate::model::{
    id::{LotId, SpotId},
    spot::{ParkingSpot, SpotDetail},
};
use async_trait::async_trait;
use shared::error::AppResult;

#[async_trait]
pub trait SpotRepository: Send + Sync {
    async fn find_by_lot_id(&self, lot_id: LotId) -> AppResult<Vec<ParkingSpot>>;
    // 有効なスポットと、駐車中であればその予約を取得する
    async fn find_detail(&self, spot_id: SpotId) -> AppResult<Option<SpotDetail>>;
    // 空きスポットを論理削除し、駐車場の max_spots を 1 減らす
    async fn remove(&self, spot_id: SpotId) -> AppResult<()>;
}
