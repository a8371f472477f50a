//! API constants

/// Versioned prefix of every record route
pub const API_PREFIX: &str = "/api/v1";

/// Route serving disk-backend files; matches the default `LOCAL_STORAGE_BASE_URL`
pub const FILES_ROUTE: &str = "/files";

pub const DEFAULT_PAGE_LIMIT: i64 = 20;
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Identity headers set by the upstream gateway
pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";
