use crate::{
    extractor::AuthorizedUser,
    model::user::{
        UpdateProfileRequest, UpdateProfileRequestWithUserId, UserResponse, UsersResponse,
    },
};
use axum::{extract::State, http::StatusCode, Json};
use garde::Validate;
use kernel::model::user::event::UpdateProfile;
use registry::AppRegistry;
use shared::error::AppResult;

pub async fn get_current_user(user: AuthorizedUser) -> Json<UserResponse> {
    Json(UserResponse::from(user.user))
}

pub async fn update_current_user(
    user: AuthorizedUser,
    State(registry): State<AppRegistry>,
    Json(req): Json<UpdateProfileRequest>,
) -> AppResult<StatusCode> {
    req.validate(&())?;

    let event = UpdateProfile::try_from(UpdateProfileRequestWithUserId::new(user.id(), req))?;
    registry
        .user_repository()
        .update_profile(event)
        .await
        .map(|_| StatusCode::OK)
}

pub async fn list_users(
    user: AuthorizedUser,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<UsersResponse>> {
    user.ensure_admin()?;

    let items = registry
        .user_repository()
        .find_all_customers()
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();
    Ok(Json(UsersResponse { items }))
}
