/// Default Valkey list keys used as message channels.
pub mod keys {
    /// Inbound messages, claimed with BLMOVE into [`PROCESSING`].
    /// Value: JSON `IncomingMessage` envelope or a bare payload string.
    pub const INPUT: &str = "tasklaunch:input";

    /// Messages claimed by a processor but not yet emitted or rejected.
    /// Moved back onto [`INPUT`] when the processor starts.
    /// Value: raw entry exactly as read from [`INPUT`].
    pub const PROCESSING: &str = "tasklaunch:processing";

    /// Emitted launch requests.
    /// Value: JSON `OutgoingMessage` envelope whose payload is a
    /// JSON-serialized `LaunchRequest`.
    pub const OUTPUT: &str = "tasklaunch:output";

    /// Rejected inbound messages (dead letters).
    /// Value: JSON `IncomingMessage` envelope with `x-exception-*` headers.
    pub const ERRORS: &str = "tasklaunch:errors";
}

/// Validate a channel key supplied by configuration or the CLI.
///
/// Keys must be non-empty, at most 256 bytes, and free of whitespace and
/// control characters.
pub fn validate_channel_key(key: &str) -> Result<(), &'static str> {
    if key.is_empty() {
        return Err("channel key must not be empty");
    }
    if key.len() > 256 {
        return Err("channel key must be at most 256 bytes");
    }
    if key.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err("channel key must not contain whitespace or control characters");
    }
    Ok(())
}
