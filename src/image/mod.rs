// Public API - what other modules can use
pub use gateway::AdImageGateway;
pub use handlers::{delete_ad_image, upload_ad_image};
pub use uploader::{uploader_from_config, ImageUpload, ImageUploader};

pub mod extension;
pub mod gateway;
mod handlers;
pub mod uploader;
