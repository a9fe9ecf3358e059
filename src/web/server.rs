//! Web server for filenest.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use crate::auth::{CredentialStore, SqliteCredentialStore};
use crate::config::{Config, WebConfig};
use crate::storage::NamespaceResolver;
use crate::{FilenestError, Result};

use super::handlers::AppState;
use super::router::create_router;

/// HTTP server for the API.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// Web configuration.
    web_config: WebConfig,
    /// Request body limit in bytes.
    max_upload_bytes: usize,
}

impl WebServer {
    /// Create a new web server around an existing credential store.
    pub fn new(config: &Config, credentials: Arc<dyn CredentialStore>) -> Result<Self> {
        let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| FilenestError::Config(format!("invalid server address: {}", e)))?;

        let resolver = NamespaceResolver::new(
            &config.storage.uploads_path,
            &config.storage.backups_path,
        )?;
        tracing::info!(
            "Storage roots: uploads at {}, backups at {}",
            config.storage.uploads_path,
            config.storage.backups_path
        );

        let app_state = AppState::new(
            credentials,
            resolver,
            &config.web.jwt_secret,
            config.web.jwt_access_token_expiry_secs,
        );

        let max_upload_bytes =
            usize::try_from(config.storage.max_upload_size_mb.saturating_mul(1024 * 1024))
                .unwrap_or(usize::MAX);

        Ok(Self {
            addr,
            app_state: Arc::new(app_state),
            web_config: config.web.clone(),
            max_upload_bytes,
        })
    }

    /// Create a web server backed by the configured SQLite database.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let store = SqliteCredentialStore::open(&config.database.path).await?;
        Self::new(config, Arc::new(store))
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Build the router without binding a socket.
    pub fn router(&self) -> Router {
        create_router(
            self.app_state.clone(),
            &self.web_config,
            self.max_upload_bytes,
        )
    }

    /// Run the web server until it fails.
    pub async fn run(self) -> Result<()> {
        let router = self.router();

        let listener = TcpListener::bind(self.addr).await?;
        tracing::info!("Web server listening on http://{}", listener.local_addr()?);

        axum::serve(listener, router).await?;
        Ok(())
    }

    /// Run the server in the background and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> Result<SocketAddr> {
        let router = self.router();

        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryCredentialStore;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn create_test_config(temp_dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 0;
        config.storage.uploads_path = temp_dir.path().join("uploads").display().to_string();
        config.storage.backups_path = temp_dir.path().join("backups").display().to_string();
        config.database.path = temp_dir.path().join("filenest.db").display().to_string();
        config.web.jwt_secret = "test-secret-key".to_string();
        config
    }

    #[test]
    fn test_web_server_new() {
        let temp_dir = TempDir::new().unwrap();
        let config = create_test_config(&temp_dir);

        let server = WebServer::new(&config, Arc::new(MemoryCredentialStore::new())).unwrap();

        assert_eq!(server.addr().ip().to_string(), "127.0.0.1");
        assert_eq!(server.max_upload_bytes, 100 * 1024 * 1024);
        assert!(temp_dir.path().join("uploads").is_dir());
        assert!(temp_dir.path().join("backups").is_dir());
    }

    #[test]
    fn test_web_server_invalid_address() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = create_test_config(&temp_dir);
        config.server.host = "not an address".to_string();

        let result = WebServer::new(&config, Arc::new(MemoryCredentialStore::new()));

        assert!(matches!(result, Err(FilenestError::Config(_))));
    }

    #[tokio::test]
    async fn test_web_server_run() {
        let temp_dir = TempDir::new().unwrap();
        let config = create_test_config(&temp_dir);

        let server = WebServer::from_config(&config).await.unwrap();
        let addr = server.run_with_addr().await.unwrap();

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.ends_with("OK"));
        assert!(temp_dir.path().join("filenest.db").exists());
    }
}
