use crate::{extractor::AuthorizedUser, model::summary::SummaryResponse};
use axum::{extract::State, Json};
use registry::AppRegistry;
use shared::error::AppResult;

pub async fn show_summary(
    user: AuthorizedUser,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<SummaryResponse>> {
    let summary: SummaryResponse = if user.is_admin() {
        registry.lot_repository().usage_summary().await?.into()
    } else {
        registry
            .reservation_repository()
            .usage_by_user_id(user.id())
            .await?
            .into()
    };
    Ok(Json(summary))
}
