use axum::{
    routing::{get, post},
    Router,
};
use registry::AppRegistry;

use crate::handler::reservation::{preview_release, release, show_dashboard};

pub fn build_reservation_routers() -> Router<AppRegistry> {
    let reservations_routers = Router::new()
        .route("/", get(show_dashboard))
        .route("/:reservation_id/release-preview", get(preview_release))
        .route("/:reservation_id/release", post(release));

    Router::new().nest("/reservations", reservations_routers)
}
