use crate::model::{
    id::{ReservationId, UserId},
    reservation::{
        event::{CreateReservation, ReleaseReservation},
        Reservation,
    },
    summary::UserLotUsage,
};
use async_trait::async_trait;
use shared::error::AppResult;

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    // スポットを予約し、Occupied にする
    async fn create(&self, event: CreateReservation) -> AppResult<Reservation>;
    // 出庫処理：料金を確定し、スポットを Available に戻す
    async fn release(&self, event: ReleaseReservation) -> AppResult<Reservation>;
    async fn find_by_id(&self, reservation_id: ReservationId) -> AppResult<Option<Reservation>>;
    // ユーザーの予約一覧（駐車中が先、その後は新しい順）
    async fn find_by_user_id(&self, user_id: UserId) -> AppResult<Vec<Reservation>>;
    async fn usage_by_user_id(&self, user_id: UserId) -> AppResult<Vec<UserLotUsage>>;
}
