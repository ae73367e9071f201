//! Configuration module

use std::env;
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Directory holding model.json and model_columns.json
    pub model_dir: PathBuf,

    /// Raw `IMAGE_TEXT_POLICY` setting; `None` means "use the trained one".
    /// Parsed when the model is loaded so a bad value degrades the server
    /// the same way a mismatched one does.
    pub image_text_policy: Option<String>,

    /// Environment (development, production)
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8000,
            model_dir: PathBuf::from("saved_model"),
            image_text_policy: None,
            environment: "development".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),

            model_dir: env::var("MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_dir),

            image_text_policy: env::var("IMAGE_TEXT_POLICY")
                .ok()
                .filter(|p| !p.trim().is_empty()),

            environment: env::var("ENVIRONMENT")
                .unwrap_or(defaults.environment),
        }
    }
}
