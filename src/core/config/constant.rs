// default app settings
pub const RESILIENCE_VERSION: &str = "v1";
pub const DEFAULT_APP_NAME: &str = "unknown_service";
pub const APP_NAME_ENV_KEY: &str = "RESILIENCE_APP_NAME";
pub const CONF_FILE_PATH_ENV_KEY: &str = "RESILIENCE_CONFIG_FILE_PATH";
pub const CONFIG_FILENAME: &str = "USE_DEFAULT_CONFIGURATION";

// default circuit breaker settings
pub const DEFAULT_FAILURE_RATIO: f64 = 0.05;
pub const DEFAULT_WINDOW_MS: u64 = 5000;
// one bucket per second, so the window bounds the size of the ring
pub const MAX_WINDOW_MS: u64 = 3_600_000;
pub const DEFAULT_COOLDOWN_MS: u64 = 1000;
pub const DEFAULT_MIN_OBSERVATIONS: u64 = 10;

// default retry settings
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
pub const DEFAULT_RETRY_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_OVER_STATUS: u16 = 300;
pub const DEFAULT_RETRY_ON_EOF: bool = true;
pub const DEFAULT_DELAY_MS: u64 = 100;

// default log settings
pub const DEFAULT_LOG_LEVEL: &str = "warn";
pub const LOG_CONFIG_FILE: &str = "testdata/config/log4rs.yaml";
