pub mod settings;

pub use settings::{DatabaseConfig, GeminiConfig, ServerConfig, Settings};
