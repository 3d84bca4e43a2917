use crate::{
    extractor::AuthorizedUser,
    model::{
        reservation::{BookRequest, BookRequestWithTarget, ReservationResponse},
        spot::SpotDetailResponse,
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
    id::SpotId,
    reservation::event::{BookingTarget, CreateReservation},
};
use registry::AppRegistry;
use shared::error::{AppError, AppResult};

pub async fn show_spot(
    user: AuthorizedUser,
    Path(spot_id): Path<SpotId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<SpotDetailResponse>> {
    user.ensure_admin()?;

    let detail = registry
        .spot_repository()
        .find_detail(spot_id)
        .await?
        .ok_or_else(|| {
            AppError::EntityNotFound(format!("parking spot ({spot_id}) was not found"))
        })?;
    SpotDetailResponse::at(detail, Utc::now()).map(Json)
}

pub async fn delete_spot(
    user: AuthorizedUser,
    Path(spot_id): Path<SpotId>,
    State(registry): State<AppRegistry>,
) -> AppResult<StatusCode> {
    user.ensure_admin()?;

    registry
        .spot_repository()
        .remove(spot_id)
        .await
        .map(|_| StatusCode::OK)
}

pub async fn book_spot(
    user: AuthorizedUser,
    Path(spot_id): Path<SpotId>,
    State(registry): State<AppRegistry>,
    Json(req): Json<BookRequest>,
) -> AppResult<(StatusCode, Json<ReservationResponse>)> {
    req.validate(&())?;

    let event = CreateReservation::try_from(BookRequestWithTarget::new(
        BookingTarget::Spot(spot_id),
        user.id(),
        Utc::now(),
        req,
    ))?;
    let reservation = registry.reservation_repository().create(event).await?;
    Ok((StatusCode::CREATED, Json(reservation.into())))
}
