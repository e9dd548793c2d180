// Authentication module
// Token decoding, credential storage and refresh

mod jwt;
mod refresh;
mod store;
mod types;

pub use jwt::{decode_claims, decode_payload};
pub use refresh::{refresh_access_token, DEFAULT_REFRESH_PATH};
pub use store::{
    clear_credentials, save_credentials, MemoryStore, TokenStore, ACCESS_TOKEN_KEY,
    REFRESH_TOKEN_KEY,
};
pub use types::{RefreshOutcome, SessionClaims};

pub(crate) use store::credential;
