use axum::{
    routing::{delete, get, post, put},
    Router,
};
use registry::AppRegistry;

use crate::handler::lot::{
    admin_search_lots, book_in_lot, delete_lot, register_lot, search_lots, show_lot,
    show_lot_dashboard, update_lot,
};

pub fn build_lot_routers() -> Router<AppRegistry> {
    let lots_routers = Router::new()
        .route("/", get(show_lot_dashboard))
        .route("/", post(register_lot))
        .route("/search", post(search_lots))
        .route("/admin-search", post(admin_search_lots))
        .route("/:lot_id", get(show_lot))
        .route("/:lot_id", put(update_lot))
        .route("/:lot_id", delete(delete_lot))
        .route("/:lot_id/book", post(book_in_lot));

    Router::new().nest("/lots", lots_routers)
}
