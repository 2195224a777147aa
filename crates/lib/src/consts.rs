/// Name used in user-facing messages and the CLI binary.
pub const APP_NAME: &str = "pie";

/// Environment variable prefix for runtime configuration.
pub const ENV_PREFIX: &str = "PIE_";
