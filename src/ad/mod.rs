// Public API - what other modules can use
pub use handlers::{create_ad, delete_ad, get_ad, list_ads, list_own_ads, update_ad};

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod types;
