use std::path::PathBuf;

use storyloom_core::naming::DocumentNaming;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `900`). Must outlast the
    /// image stage bound.
    pub request_timeout_secs: u64,
    /// Root directory for generated artifacts (default: `./artifacts`).
    /// Images land in `images/`, documents in `documents/`.
    pub artifact_dir: PathBuf,
    /// How document filenames are derived (default: `title`).
    pub document_naming: DocumentNaming,
    /// JWT token configuration.
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `900`                      |
    /// | `ARTIFACT_DIR`         | `./artifacts`              |
    /// | `DOCUMENT_NAMING`      | `title`                    |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "900".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let artifact_dir = PathBuf::from(
            std::env::var("ARTIFACT_DIR").unwrap_or_else(|_| "./artifacts".into()),
        );

        let document_naming = DocumentNaming::from_name(
            &std::env::var("DOCUMENT_NAMING").unwrap_or_else(|_| "title".into()),
        )
        .expect("DOCUMENT_NAMING must be 'title' or 'content_hash'");

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            artifact_dir,
            document_naming,
            jwt,
        }
    }

    /// Where generated images are written.
    pub fn image_dir(&self) -> PathBuf {
        self.artifact_dir.join("images")
    }

    /// Where composed documents are written.
    pub fn document_dir(&self) -> PathBuf {
        self.artifact_dir.join("documents")
    }
}
