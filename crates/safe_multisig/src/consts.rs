use std::time::Duration;

pub mod urls {
    pub const DEFAULT_TRANSACTION_SERVICE_ROOT: &str = "https://api.safe.global/tx-service";

    pub const SAFE_APP_URL: &str = "https://app.safe.global";
}

/// Number of queued transactions requested per page.
pub const PAGE_SIZE: u64 = 20;

pub const RATE_LIMITED_STATUS: u16 = 429;

/// Fixed wait between retries of a rate limited read.
pub const RATE_LIMIT_RETRY_DELAY: Duration = Duration::from_millis(3000);

/// Width of a deletion authorization window, in seconds.
pub const TOTP_PERIOD_SECS: u64 = 3600;

pub const DELETE_REQUEST_DOMAIN_NAME: &str = "Safe Transaction Service";
pub const DELETE_REQUEST_DOMAIN_VERSION: &str = "1.0";

/// Storage keys for the local preference stores.
pub const FAVORITES_STORAGE_KEY: &str = "safe-deleter:favorites";
pub const LABELS_STORAGE_KEY: &str = "safe-deleter:labels";
