// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Delivery of telemetry batches to the remote collector.

use std::time::Duration;

use reqwest::Client;
use tracing::debug;
use vigil_core::TelemetryBatch;

use crate::error::{MonitorError, Result};

/// Path of the collector endpoint relative to the base URL.
pub const COLLECTOR_PATH: &str = "/api/monitoring/errors";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const BEACON_TIMEOUT: Duration = Duration::from_secs(5);

/// Delivers batches to a collector.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
	/// Sends one batch. An error means nothing in the batch was accepted.
	async fn send(&self, batch: &TelemetryBatch) -> Result<()>;

	/// Sends a batch synchronously on teardown, outside the normal flush path.
	///
	/// Returns `false` when the primitive is unavailable or delivery failed.
	fn send_beacon(&self, _batch: &TelemetryBatch) -> bool {
		false
	}
}

/// Returns the SDK user agent, `vigil/{version}`.
pub fn user_agent() -> String {
	format!("vigil/{}", env!("CARGO_PKG_VERSION"))
}

/// Posts batches as JSON to `{base_url}/api/monitoring/errors`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
	endpoint: String,
	client: Client,
}

impl HttpTransport {
	pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
		let base_url = base_url.as_ref().trim().trim_end_matches('/');
		if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
			return Err(MonitorError::InvalidEndpoint(base_url.to_string()));
		}

		let client = Client::builder()
			.user_agent(user_agent())
			.timeout(REQUEST_TIMEOUT)
			.build()?;

		Ok(Self {
			endpoint: format!("{base_url}{COLLECTOR_PATH}"),
			client,
		})
	}

	pub fn endpoint(&self) -> &str {
		&self.endpoint
	}
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
	async fn send(&self, batch: &TelemetryBatch) -> Result<()> {
		debug!(
			endpoint = %self.endpoint,
			errors = batch.errors.len(),
			analytics = batch.analytics.len(),
			"Sending telemetry batch"
		);

		let response = self.client.post(&self.endpoint).json(batch).send().await?;

		if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
			let retry_after = response
				.headers()
				.get("Retry-After")
				.and_then(|v| v.to_str().ok())
				.and_then(|s| s.parse().ok());
			return Err(MonitorError::RateLimited {
				retry_after_secs: retry_after,
			});
		}

		if !response.status().is_success() {
			let status = response.status().as_u16();
			let message = response.text().await.unwrap_or_default();
			return Err(MonitorError::ServerError { status, message });
		}

		Ok(())
	}

	fn send_beacon(&self, batch: &TelemetryBatch) -> bool {
		let body = match serde_json::to_vec(batch) {
			Ok(body) => body,
			Err(e) => {
				debug!(error = %e, "Failed to encode beacon payload");
				return false;
			}
		};
		let endpoint = self.endpoint.clone();

		// The blocking client must not run on an async runtime thread.
		let handle = std::thread::Builder::new()
			.name("vigil-beacon".to_string())
			.spawn(move || {
				let client = match reqwest::blocking::Client::builder()
					.user_agent(user_agent())
					.timeout(BEACON_TIMEOUT)
					.build()
				{
					Ok(client) => client,
					Err(_) => return false,
				};
				client
					.post(&endpoint)
					.header(reqwest::header::CONTENT_TYPE, "application/json")
					.body(body)
					.send()
					.map(|response| response.status().is_success())
					.unwrap_or(false)
			});

		match handle {
			Ok(handle) => handle.join().unwrap_or(false),
			Err(e) => {
				debug!(error = %e, "Failed to start beacon thread");
				false
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use wiremock::matchers::{body_partial_json, method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	fn batch() -> TelemetryBatch {
		TelemetryBatch::default()
	}

	#[test]
	fn endpoint_is_normalized() {
		let transport = HttpTransport::new("https://collector.example.com/").unwrap();
		assert_eq!(
			transport.endpoint(),
			"https://collector.example.com/api/monitoring/errors"
		);
	}

	#[test]
	fn rejects_non_http_endpoint() {
		let result = HttpTransport::new("collector.example.com");
		assert!(matches!(result, Err(MonitorError::InvalidEndpoint(_))));
	}

	#[test]
	fn user_agent_has_sdk_prefix() {
		assert!(user_agent().starts_with("vigil/"));
	}

	#[tokio::test]
	async fn send_posts_json_batch() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path(COLLECTOR_PATH))
			.and(body_partial_json(serde_json::json!({"errors": [], "analytics": []})))
			.respond_with(ResponseTemplate::new(200))
			.expect(1)
			.mount(&server)
			.await;

		let transport = HttpTransport::new(server.uri()).unwrap();
		transport.send(&batch()).await.unwrap();
	}

	#[tokio::test]
	async fn server_error_is_reported() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(500).set_body_string("boom"))
			.mount(&server)
			.await;

		let transport = HttpTransport::new(server.uri()).unwrap();
		let result = transport.send(&batch()).await;
		assert!(matches!(
			result,
			Err(MonitorError::ServerError { status: 500, ref message }) if message == "boom"
		));
	}

	#[tokio::test]
	async fn rate_limit_reads_retry_after() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "12"))
			.mount(&server)
			.await;

		let transport = HttpTransport::new(server.uri()).unwrap();
		let result = transport.send(&batch()).await;
		assert!(matches!(
			result,
			Err(MonitorError::RateLimited {
				retry_after_secs: Some(12)
			})
		));
	}

	#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
	async fn beacon_delivers_synchronously() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path(COLLECTOR_PATH))
			.respond_with(ResponseTemplate::new(204))
			.expect(1)
			.mount(&server)
			.await;

		let transport = HttpTransport::new(server.uri()).unwrap();
		let delivered = tokio::task::spawn_blocking(move || transport.send_beacon(&batch()))
			.await
			.unwrap();
		assert!(delivered);
	}

	#[tokio::test]
	async fn beacon_reports_unreachable_collector() {
		let transport = HttpTransport::new("http://127.0.0.1:9").unwrap();
		let delivered = tokio::task::spawn_blocking(move || transport.send_beacon(&batch()))
			.await
			.unwrap();
		assert!(!delivered);
	}
}
