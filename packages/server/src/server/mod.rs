pub mod app;
pub mod gate;
pub mod middleware;
pub mod routes;

pub use app::{build_app, AppState};
