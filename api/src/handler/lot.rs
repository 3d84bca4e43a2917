use crate::{
    extractor::AuthorizedUser,
    model::{
        lot::{
            AdminSearchRequest, CreateLotRequest, LotDashboardResponse, LotDetailResponse,
            LotsResponse, SearchLotsRequest, SearchLotsResponse, UpdateLotRequest,
            UpdateLotRequestWithId,
        },
        reservation::{BookRequest, BookRequestWithTarget, ReservationResponse},
    },
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use garde::Validate;
use kernel::model::{
    id::LotId,
    lot::{
        event::{CreateLot, DeactivateLot, UpdateLot},
        LotDetail, LotSearch,
    },
    reservation::event::{BookingTarget, CreateReservation},
};
use registry::AppRegistry;
use serde_json::{json, Value};
use shared::error::{AppError, AppResult};

pub async fn show_lot_dashboard(
    user: AuthorizedUser,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<LotDashboardResponse>> {
    user.ensure_admin()?;

    registry
        .lot_repository()
        .find_active_with_spots()
        .await
        .map(LotDashboardResponse::from)
        .map(Json)
}

pub async fn register_lot(
    user: AuthorizedUser,
    State(registry): State<AppRegistry>,
    Json(req): Json<CreateLotRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    user.ensure_admin()?;
    req.validate(&())?;

    let lot_id = registry
        .lot_repository()
        .create(CreateLot::try_from(req)?)
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": lot_id }))))
}

pub async fn show_lot(
    _user: AuthorizedUser,
    Path(lot_id): Path<LotId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<LotDetailResponse>> {
    let lot = registry
        .lot_repository()
        .find_by_id(lot_id)
        .await?
        .ok_or_else(|| AppError::EntityNotFound(format!("parking lot ({lot_id}) was not found")))?;
    let spots = registry.spot_repository().find_by_lot_id(lot_id).await?;

    Ok(Json(LotDetail { lot, spots }.into()))
}

pub async fn update_lot(
    user: AuthorizedUser,
    Path(lot_id): Path<LotId>,
    State(registry): State<AppRegistry>,
    Json(req): Json<UpdateLotRequest>,
) -> AppResult<StatusCode> {
    user.ensure_admin()?;
    req.validate(&())?;

    let event = UpdateLot::try_from(UpdateLotRequestWithId::new(lot_id, req))?;
    registry
        .lot_repository()
        .update(event)
        .await
        .map(|_| StatusCode::OK)
}

pub async fn delete_lot(
    user: AuthorizedUser,
    Path(lot_id): Path<LotId>,
    State(registry): State<AppRegistry>,
) -> AppResult<StatusCode> {
    user.ensure_admin()?;

    registry
        .lot_repository()
        .deactivate(DeactivateLot::new(lot_id))
        .await
        .map(|_| StatusCode::OK)
}

pub async fn search_lots(
    _user: AuthorizedUser,
    State(registry): State<AppRegistry>,
    Json(req): Json<SearchLotsRequest>,
) -> AppResult<Json<SearchLotsResponse>> {
    req.validate(&())?;

    registry
        .lot_repository()
        .search(LotSearch::from(req))
        .await
        .map(SearchLotsResponse::from)
        .map(Json)
}

pub async fn admin_search_lots(
    user: AuthorizedUser,
    State(registry): State<AppRegistry>,
    Json(req): Json<AdminSearchRequest>,
) -> AppResult<Json<LotsResponse>> {
    user.ensure_admin()?;
    req.validate(&())?;

    registry
        .lot_repository()
        .search(LotSearch::try_from(req)?)
        .await
        .map(LotsResponse::from)
        .map(Json)
}

// 駐車場を指定した予約。空いている番号の若いスポットが割り当てられる
pub async fn book_in_lot(
    user: AuthorizedUser,
    Path(lot_id): Path<LotId>,
    State(registry): State<AppRegistry>,
    Json(req): Json<BookRequest>,
) -> AppResult<(StatusCode, Json<ReservationResponse>)> {
    req.validate(&())?;

    let event = CreateReservation::try_from(BookRequestWithTarget::new(
        BookingTarget::Lot(lot_id),
        user.id(),
        Utc::now(),
        req,
    ))?;
    let reservation = registry.reservation_repository().create(event).await?;
    Ok((StatusCode::CREATED, Json(reservation.into())))
}
