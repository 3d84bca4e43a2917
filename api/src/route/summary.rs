use axum::{routing::get, Router};
use registry::AppRegistry;

use crate::handler::summary::show_summary;

pub fn build_summary_routers() -> Router<AppRegistry> {
    Router::new().route("/summary", get(show_summary))
}
