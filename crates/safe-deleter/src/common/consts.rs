/// Names for the default directories and files.
pub const DEFAULT_ROOT_DIR: &str = ".safe-deleter";
pub const FAVORITES_FILE: &str = "favorites.json";
pub const LABELS_FILE: &str = "labels.json";

pub const API_ROOT_ENV: &str = "SAFE_API_ROOT";
pub const PRIVATE_KEY_ENV: &str = "SAFE_DELETER_PRIVATE_KEY";
