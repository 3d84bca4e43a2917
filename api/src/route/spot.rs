use axum::{
    routing::{delete, get, post},
    Router,
};
use registry::AppRegistry;

use crate::handler::spot::{book_spot, delete_spot, show_spot};

pub fn build_spot_routers() -> Router<AppRegistry> {
    let spots_routers = Router::new()
        .route("/:spot_id", get(show_spot))
        .route("/:spot_id", delete(delete_spot))
        .route("/:spot_id/book", post(book_spot));

    Router::new().nest("/spots", spots_routers)
}
