//! http.rs — Per-station HTTP query surface
//!
//! One router per station, each bound to its own port. Handlers only ever
//! copy the station's cached state under a short read lock — they never run
//! the pipeline themselves, so readers cannot block a tick for more than
//! the copy and a tick cannot starve readers.

use std::sync::Arc;

use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use df_types::StationStatus;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};

use crate::sim::SimState;

pub type SharedSim = Arc<RwLock<SimState>>;

/// Build the three-route router for the station at `index`.
pub fn station_router(sim: SharedSim, index: usize) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/DOA_value.html", get(doa_value))
        .route("/status.json", get(status))
        .with_state((sim, index))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
}

/// Human-readable diagnostic naming the real endpoints.
async fn root(State((sim, index)): State<(SharedSim, usize)>) -> String {
    let s = sim.read().await;
    format!("{}: /DOA_value.html  /status.json", s.stations[index].id)
}

/// The station's latest rendered record. Served as text/html for parity
/// with the receiver-app contract the consumers were written against.
async fn doa_value(State((sim, index)): State<(SharedSim, usize)>) -> Html<String> {
    let s = sim.read().await;
    Html(s.stations[index].last_record.clone())
}

async fn status(State((sim, index)): State<(SharedSim, usize)>) -> Json<StationStatus> {
    let s = sim.read().await;
    Json(s.stations[index].status())
}
