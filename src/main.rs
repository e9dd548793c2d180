use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;

use bearer_fetch::auth::{self, MemoryStore, SessionClaims, TokenStore, ACCESS_TOKEN_KEY};
use bearer_fetch::config::{self, Command, Config};
use bearer_fetch::http_client::{AuthFetchClient, RequestOptions};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;

    // Initialize logging with a configured level
    let log_level = config.log_level.to_lowercase();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    match config.command.clone() {
        Command::Decode { token } => decode_token(&token),
        Command::Request {
            address,
            method,
            data,
            headers,
            no_retry,
        } => {
            let mut options = RequestOptions::new(config::parse_method(&method)?);
            for line in &headers {
                let (name, value) = config::parse_header_line(line)?;
                options = options.with_header(&name, &value)?;
            }
            if let Some(data) = data {
                options = options.with_body(data);
            }
            send_request(&config, &address, options, !no_retry).await
        }
    }
}

/// Print the decoded payload and report its expiry
fn decode_token(token: &str) -> Result<()> {
    let payload = auth::decode_payload(token).context("Token payload could not be decoded")?;
    println!("{}", serde_json::to_string_pretty(&payload)?);

    if let Some(claims) = auth::decode_claims::<SessionClaims>(token) {
        if let Some(expires_at) = claims.expires_at() {
            if claims.is_expired_at(Utc::now()) {
                tracing::warn!("Token expired at {}", expires_at.to_rfc3339());
            } else {
                tracing::info!("Token expires at {}", expires_at.to_rfc3339());
            }
        }
    }

    Ok(())
}

async fn send_request(
    config: &Config,
    address: &str,
    mut options: RequestOptions,
    should_retry: bool,
) -> Result<()> {
    let store: Arc<dyn TokenStore> = Arc::new(MemoryStore::with_credentials(
        config.access_token.as_deref(),
        config.refresh_token.as_deref(),
    ));

    let client = AuthFetchClient::new(
        store,
        config.base_url.clone(),
        config.http_connect_timeout,
        config.http_request_timeout,
    )?
    .with_refresh_path(&config.refresh_path)?;

    tracing::debug!(
        base_url = %client.base_url(),
        refresh_url = %client.refresh_url(),
        "Client configured"
    );

    let response = match client.request(address, &mut options, should_retry).await {
        Ok(response) => response,
        Err(e) if e.is_session_expired() => {
            // No page to reload here: report and let the caller log in again
            tracing::error!("{}", e);
            anyhow::bail!("Session expired, stored credentials were cleared; log in again");
        }
        Err(e) => return Err(e).context("Request failed"),
    };

    let renewed = client.store().get(ACCESS_TOKEN_KEY);
    if renewed.is_some() && renewed != config.access_token {
        tracing::info!("Access token was renewed during the request");
    }

    let status = response.status();
    tracing::info!("{} {}", status.as_u16(), status.canonical_reason().unwrap_or(""));

    let body = response
        .text()
        .await
        .context("Failed to read response body")?;
    println!("{}", body);

    if !status.is_success() {
        anyhow::bail!("Request failed with status {}", status);
    }

    Ok(())
}
