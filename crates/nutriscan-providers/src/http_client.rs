// ABOUTME: Shared pooled HTTP client and a cancellable JSON GET helper for provider adapters
// ABOUTME: Singleton client with connect timeout; per-call timeout and cancellation applied per request
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

use crate::errors::{AdapterError, AdapterResult};
use nutriscan_core::ProviderId;
use reqwest::{Client, ClientBuilder, RequestBuilder};
use serde::de::DeserializeOwned;
use std::sync::OnceLock;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Default connection timeout in seconds
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Default idle connections kept per provider host
const DEFAULT_POOL_IDLE_PER_HOST: usize = 4;

/// User agent sent to every provider (Open Food Facts asks clients to identify themselves)
const USER_AGENT: &str = concat!("nutriscan/", env!("CARGO_PKG_VERSION"));

static CONNECT_TIMEOUT_SECS: OnceLock<u64> = OnceLock::new();

static SHARED_CLIENT: OnceLock<Client> = OnceLock::new();

/// Set the connect timeout before the first adapter is built
///
/// Later calls are ignored. Without a call the default of 5 s applies.
pub fn initialize_shared_client(connect_timeout_secs: u64) {
    let _ = CONNECT_TIMEOUT_SECS.set(connect_timeout_secs);
}

/// Process-wide pooled client used by every HTTP adapter
///
/// No overall request timeout is set here; each call carries its own.
pub fn shared_client() -> &'static Client {
    SHARED_CLIENT.get_or_init(|| {
        let connect_timeout = CONNECT_TIMEOUT_SECS
            .get()
            .copied()
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS);

        ClientBuilder::new()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(connect_timeout))
            .pool_max_idle_per_host(DEFAULT_POOL_IDLE_PER_HOST)
            .build()
            .unwrap_or_else(|_| Client::new())
    })
}

/// Send `request` and decode a JSON body
///
/// Non-success statuses map through [`AdapterError::from_status`]. When
/// `cancel` fires first the request future is dropped, which closes or
/// returns its connection to the pool.
///
/// # Errors
///
/// Returns `Timeout`, `NotFound`, `Malformed`, `NetworkError` or `Cancelled`
/// adapter errors.
pub async fn get_json<T: DeserializeOwned>(
    provider: &ProviderId,
    request: RequestBuilder,
    timeout: Duration,
    cancel: &CancellationToken,
) -> AdapterResult<T> {
    let exchange = async {
        let response = request
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| AdapterError::from_reqwest(provider.clone(), &e))?;

        let status = response.status();
        trace!(provider = %provider, status = status.as_u16(), "Provider responded");
        if !status.is_success() {
            return Err(AdapterError::from_status(provider.clone(), status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AdapterError::from_reqwest(provider.clone(), &e))?;
        serde_json::from_slice::<T>(&body).map_err(|e| {
            AdapterError::malformed(provider.clone(), format!("JSON parse error: {e}"))
        })
    };

    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(AdapterError::cancelled(provider.clone())),
        result = exchange => result,
    }
}
