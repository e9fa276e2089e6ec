pub mod access;
pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod location;
pub mod models;
pub mod state;
pub mod store;
pub mod token;
pub mod ws;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;
