pub mod bookings;
pub mod error;
pub mod events;

use crate::{AppState, openapi};
use axum::Router;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(events::router(state.clone()))
        .merge(bookings::router(state))
        .merge(openapi::router());

    Router::new().nest("/api", api)
}
