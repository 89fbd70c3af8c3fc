pub mod config;
pub mod detection;
pub mod error;
pub mod orchestrator;
pub mod routes;
pub mod upload;

pub use config::Config;
pub use error::UploadError;
pub use orchestrator::UploadOrchestrator;
pub use routes::configure_routes;
