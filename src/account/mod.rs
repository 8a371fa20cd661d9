// Public API - what other modules can use
pub use handlers::{login, logout, me, register};

// Internal modules
mod handlers;
pub mod models;
mod password;
pub mod repository;
pub mod service;
pub mod types;
