// Library crate for the sneaker marketplace backend
// This file exposes the public API for the binary and integration tests

pub mod account;
pub mod ad;
pub mod app;
pub mod config;
pub mod image;
pub mod notification;
pub mod purchase;
pub mod session;
pub mod shared;

// Re-export commonly used types for easier access in tests
pub use app::build_router;
pub use config::AppConfig;
pub use image::{ImageUpload, ImageUploader};
pub use session::SessionTokenStore;
pub use shared::{AppError, AppState};
