use crate::{
    extractor::AuthorizedUser,
    model::reservation::{DashboardResponse, ReleasePreviewResponse, ReservationResponse},
};
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use kernel::model::{
    id::ReservationId, lot::LotSearch, reservation::event::ReleaseReservation,
};
use registry::AppRegistry;
use shared::error::{AppError, AppResult};

pub async fn show_dashboard(
    user: AuthorizedUser,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<DashboardResponse>> {
    let lots = registry.lot_repository().search(LotSearch::All).await?;
    let reservations = registry
        .reservation_repository()
        .find_by_user_id(user.id())
        .await?;
    Ok(Json(DashboardResponse::from((lots, reservations))))
}

pub async fn preview_release(
    user: AuthorizedUser,
    Path(reservation_id): Path<ReservationId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<ReleasePreviewResponse>> {
    let reservation = registry
        .reservation_repository()
        .find_by_id(reservation_id)
        .await?
        .ok_or_else(|| {
            AppError::EntityNotFound(format!("reservation ({reservation_id}) was not found"))
        })?;
    reservation.ensure_releasable_by(user.id(), user.role())?;

    ReleasePreviewResponse::at(reservation, Utc::now()).map(Json)
}

pub async fn release(
    user: AuthorizedUser,
    Path(reservation_id): Path<ReservationId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<ReservationResponse>> {
    let event = ReleaseReservation::new(reservation_id, user.id(), user.role(), Utc::now());
    registry
        .reservation_repository()
        .release(event)
        .await
        .map(ReservationResponse::from)
        .map(Json)
}
