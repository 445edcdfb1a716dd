//! Valkey client for pushing to and popping from the processor channels.

use anyhow::{Context, Result, bail};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use redis::AsyncCommands as _;

/// Valkey connection configuration.
#[derive(Debug, Clone)]
pub struct ValkeyConfig {
    /// Base URL, `redis://host:port` or `rediss://host:port`
    pub url: String,
    /// Optional ACL username
    pub user: Option<String>,
    /// Optional password for authentication
    pub password: Option<String>,
}

impl Default for ValkeyConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            user: None,
            password: None,
        }
    }
}

impl ValkeyConfig {
    /// Build the connection URL with credentials inserted.
    ///
    /// Credentials are percent-encoded so `@`, `:`, `/` and `#` in a
    /// password cannot change the host or truncate the password.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL scheme is not `redis://` or `rediss://`,
    /// or if it already carries credentials.
    pub fn connection_url(&self) -> Result<String> {
        let (scheme, host_part) = if let Some(rest) = self.url.strip_prefix("rediss://") {
            ("rediss", rest)
        } else if let Some(rest) = self.url.strip_prefix("redis://") {
            ("redis", rest)
        } else {
            bail!("Valkey URL must start with redis:// or rediss://, got: {}", self.url);
        };
        if host_part.contains('@') {
            bail!("Valkey URL must not embed credentials; use TASKLAUNCH_VALKEY_USER/PASS");
        }

        let user = self
            .user
            .as_deref()
            .map(|u| utf8_percent_encode(u, NON_ALPHANUMERIC).to_string());
        let password = self
            .password
            .as_deref()
            .map(|p| utf8_percent_encode(p, NON_ALPHANUMERIC).to_string());

        Ok(match (user, password) {
            (Some(user), Some(pass)) => format!("{scheme}://{user}:{pass}@{host_part}"),
            (None, Some(pass)) => format!("{scheme}://:{pass}@{host_part}"),
            (Some(user), None) => format!("{scheme}://{user}@{host_part}"),
            (None, None) => format!("{scheme}://{host_part}"),
        })
    }
}

/// Valkey client for CLI operations.
pub struct ValkeyClient {
    client: redis::Client,
}

impl ValkeyClient {
    /// Create a new Valkey client. Connects lazily.
    ///
    /// # Errors
    /// Returns error if the connection URL is invalid.
    pub fn new(config: &ValkeyConfig) -> Result<Self> {
        let url = config.connection_url()?;
        let client = redis::Client::open(url).context("failed to create Valkey client")?;
        Ok(Self { client })
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .context("failed to connect to Valkey")
    }

    /// Append `value` to the list at `key`, returning the new length.
    ///
    /// # Errors
    /// Returns error if the connection or command fails.
    pub async fn push(&self, key: &str, value: &str) -> Result<usize> {
        let mut conn = self.connection().await?;
        let depth: usize = conn
            .rpush(key, value)
            .await
            .with_context(|| format!("failed to RPUSH to {key}"))?;
        Ok(depth)
    }

    /// Pop the head of the list at `key`, waiting up to `timeout_secs`
    /// (0 waits forever).
    ///
    /// # Errors
    /// Returns error if the connection or command fails.
    pub async fn pop(&self, key: &str, timeout_secs: f64) -> Result<Option<String>> {
        let mut conn = self.connection().await?;
        let popped: Option<(String, String)> = conn
            .blpop(key, timeout_secs)
            .await
            .with_context(|| format!("failed to BLPOP from {key}"))?;
        Ok(popped.map(|(_key, value)| value))
    }
}
