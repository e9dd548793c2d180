// bearer-fetch - Library root

pub mod auth;
pub mod config;
pub mod error;
pub mod http_client;

pub use auth::{decode_claims, decode_payload, MemoryStore, SessionClaims, TokenStore};
pub use error::FetchError;
pub use http_client::{AuthFetchClient, RequestOptions};
