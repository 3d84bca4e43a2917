use axum::{
    routing::{get, put},
    Router,
};
use registry::AppRegistry;

use crate::handler::user::{get_current_user, list_users, update_current_user};

pub fn build_user_routers() -> Router<AppRegistry> {
    let user_routers = Router::new()
        .route("/", get(list_users))
        .route("/me", get(get_current_user))
        .route("/me", put(update_current_user));

    Router::new().nest("/users", user_routers)
}
