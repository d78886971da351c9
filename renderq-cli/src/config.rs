//! Configuration module
//!
//! Connection settings shared by every command.

use renderq_client::QueueClient;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the renderq server
    pub server_url: String,
    /// Shared secret of the tenant
    pub secret: Option<String>,
    /// Tenant to talk to, the server's default tenant when absent
    pub tenant: Option<String>,
}

impl Config {
    /// Build an API client carrying this configuration's credentials
    pub fn client(&self) -> QueueClient {
        let mut client = QueueClient::new(&self.server_url);
        if let Some(secret) = &self.secret {
            client = client.with_secret(secret);
        }
        if let Some(tenant) = &self.tenant {
            client = client.with_tenant(tenant);
        }
        client
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_from_config() {
        let config = Config {
            server_url: "http://localhost:8080/".to_string(),
            secret: Some("s3cret".to_string()),
            tenant: Some("studio-a".to_string()),
        };

        let client = config.client();
        assert_eq!(client.base_url(), "http://localhost:8080");
        assert_eq!(client.tenant(), Some("studio-a"));
    }
}
