use crate::model::{
    id::LotId,
    lot::{
        event::{CreateLot, DeactivateLot, UpdateLot},
        LotDetail, LotSearch, ParkingLot,
    },
    summary::LotUsage,
};
use async_trait::async_trait;
use shared::error::AppResult;

#[async_trait]
pub trait LotRepository: Send + Sync {
    // 駐車場と 1..=max_spots のスポットを作成する
    async fn create(&self, event: CreateLot) -> AppResult<LotId>;
    // 駐車場情報を更新し、スポット数の増減を同じトランザクションで行う
    async fn update(&self, event: UpdateLot) -> AppResult<()>;
    // 駐車場と配下のスポットを論理削除する
    async fn deactivate(&self, event: DeactivateLot) -> AppResult<()>;
    async fn find_by_id(&self, lot_id: LotId) -> AppResult<Option<ParkingLot>>;
    // 有効な駐車場をスポット一覧付きで取得する
    async fn find_active_with_spots(&self) -> AppResult<Vec<LotDetail>>;
    async fn search(&self, search: LotSearch) -> AppResult<Vec<ParkingLot>>;
    async fn usage_summary(&self) -> AppResult<Vec<LotUsage>>;
}
