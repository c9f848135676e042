pub mod app;
pub mod auth;
pub mod backend;
pub mod config;
pub mod errors;
pub mod grid;
pub mod handlers;
pub mod models;
pub mod state;
pub mod stats;
pub mod ui;

pub use app::router;
pub use backend::BackendClient;
pub use config::Settings;
pub use errors::HabitError;
pub use grid::{CAPACITY, GridSlot, HabitGridController, HabitStore, is_pending};
pub use state::{AppState, Session};
