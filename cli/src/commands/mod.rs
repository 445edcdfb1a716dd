//! Command implementations

pub mod properties;
pub mod receive;
pub mod send;
pub mod transform;
pub mod version;

use clap::Args;

use crate::valkey::ValkeyConfig;

/// Valkey connection flags shared by `send` and `receive`.
#[derive(Args, Debug, Clone)]
pub struct ValkeyArgs {
    /// Valkey URL (rediss:// enables TLS)
    #[arg(long, env = "TASKLAUNCH_VALKEY_URL", default_value = "redis://127.0.0.1:6379")]
    pub valkey_url: String,

    /// Valkey ACL username
    #[arg(long, env = "TASKLAUNCH_VALKEY_USER")]
    pub valkey_user: Option<String>,
}

impl ValkeyArgs {
    /// Connection settings; the password is read from
    /// `TASKLAUNCH_VALKEY_PASS` only, never from a flag.
    #[must_use]
    pub fn to_config(&self) -> ValkeyConfig {
        ValkeyConfig {
            url: self.valkey_url.clone(),
            user: self.valkey_user.clone(),
            password: std::env::var("TASKLAUNCH_VALKEY_PASS").ok(),
        }
    }
}
