//! Constants shared across the Docket workspace

/// First page number; pages are 1-based
pub const DEFAULT_PAGE: i64 = 1;

/// Default page size when `limit` is not supplied
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Upper bound applied to `limit`
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Default SQLite database filename
pub const DEFAULT_DATABASE_FILENAME: &str = "docket.sqlite";

/// Default HTTP port for `docket serve`
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// Default per-read store timeout in seconds
pub const DEFAULT_STORE_TIMEOUT_SECS: u64 = 30;

/// Header carrying the requesting user's numeric id
pub const USER_ID_HEADER: &str = "x-user-id";

/// Accepted date-only formats (interpreted as midnight UTC)
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d"];

/// Accepted naive datetime formats (interpreted as UTC)
pub const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];
