//! Shared constants and invariants

pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 5000;

pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_METADATA_HOST: &str = "http://metadata.google.internal";
pub const DEFAULT_IAM_CREDENTIALS_BASE: &str = "https://iamcredentials.googleapis.com";

/// Fixed cache-key sentinel for the ambient metadata identity. Must never
/// collide with a real account email or descriptor hash.
pub const METADATA_CACHE_KEY: &str = "compute-metadata";

pub const CACHE_DIR_NAME: &str = "token-broker-tokens";
pub const CREDENTIALS_FILE_NAME: &str = "application_default_credentials.json";

// Environment overrides
pub const ENV_IMPERSONATE_SERVICE_ACCOUNT: &str = "GOOGLE_IMPERSONATE_SERVICE_ACCOUNT";
pub const ENV_APPLICATION_CREDENTIALS: &str = "GOOGLE_APPLICATION_CREDENTIALS";
pub const ENV_CONFIG_DIR: &str = "CLOUDSDK_CONFIG";
pub const ENV_METADATA_HOST: &str = "GCE_METADATA_HOST";

// Credential descriptor discriminants
pub const TYPE_AUTHORIZED_USER: &str = "authorized_user";
pub const TYPE_SERVICE_ACCOUNT: &str = "service_account";
