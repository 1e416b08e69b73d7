pub const MIN_PASSWORD_LENGTH: usize = 5;
pub const MAX_FIELD_LENGTH: usize = 255;

/// Random bytes behind every access token; hex-encoded this gives 40 characters.
pub const ACCESS_TOKEN_BYTES: usize = 20;

pub const PRICE_MAX_DIGITS: usize = 5;
pub const PRICE_DECIMAL_PLACES: usize = 2;

pub const TOKEN_SCHEMES: &[&str] = &["token", "bearer"];

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8000";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Largest JSON body accepted by any endpoint.
pub const MAX_BODY_BYTES: u64 = 64 * 1024;
