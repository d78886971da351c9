//! renderq HTTP Client
//!
//! A typed HTTP client for the renderq job queue API, used by render workers,
//! producers and the CLI.
//!
//! # Example
//!
//! ```no_run
//! use renderq_client::QueueClient;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = QueueClient::new("http://localhost:8080").with_secret("s3cret");
//!
//!     let job = client
//!         .create_job(&json!({ "template": { "src": "file:///project.aep", "composition": "main" } }))
//!         .await?;
//!     println!("Queued job: {}", job.uid());
//!
//!     if let Some(job) = client.pickup().await? {
//!         println!("Picked up job: {}", job.uid());
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
mod jobs;

// Re-export commonly used types
pub use error::{ClientError, Result};

use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;

/// Header carrying the shared secret
pub const SECRET_HEADER: &str = "nexrender-secret";

/// Header selecting the tenant
pub const TENANT_HEADER: &str = "nexrender-tenant";

/// HTTP client for the renderq API
///
/// Credentials and tenant are attached to every request:
/// - `with_secret` sends the tenant's shared secret
/// - `with_bearer` sends a signed bearer token
/// - `with_tenant` selects a tenant other than the default one
#[derive(Debug, Clone)]
pub struct QueueClient {
    /// Base URL of the server (e.g., "http://localhost:8080")
    base_url: String,
    /// HTTP client instance
    client: Client,
    secret: Option<String>,
    bearer: Option<String>,
    tenant: Option<String>,
}

impl QueueClient {
    /// Create a new client
    ///
    /// # Example
    /// ```
    /// use renderq_client::QueueClient;
    ///
    /// let client = QueueClient::new("http://localhost:8080");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            secret: None,
            bearer: None,
            tenant: None,
        }
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }

    /// Get the base URL of the server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tenant(&self) -> Option<&str> {
        self.tenant.as_deref()
    }

    /// Build `/api/v1/{segments...}` under the base URL
    ///
    /// Each segment is percent-encoded, so a uid holding `/`, `?` or `#`
    /// stays a single path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(["api", "v1"])
            .extend(segments);
        Ok(url)
    }

    /// Start a request to the API with credentials attached
    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let url = self.endpoint(segments)?;
        tracing::debug!("{} {}", method, url);

        let mut builder = self.client.request(method, url);
        if let Some(secret) = &self.secret {
            builder = builder.header(SECRET_HEADER, secret);
        }
        if let Some(token) = &self.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(tenant) = &self.tenant {
            builder = builder.header(TENANT_HEADER, tenant);
        }
        Ok(builder)
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// This method checks the status code and returns an appropriate error if
    /// the request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}
