// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the monitoring SDK.
//!
//! None of these reach the host through the capture APIs; they surface from
//! construction, configuration loading and explicit flushes only.

use thiserror::Error;

/// Result type alias for monitor operations.
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Errors that can occur in the monitoring SDK.
#[derive(Debug, Error)]
pub enum MonitorError {
	/// Neither a transport nor an endpoint was configured.
	#[error("a transport or endpoint is required")]
	MissingTransport,

	/// Invalid collector base URL.
	#[error("invalid endpoint URL: {0}")]
	InvalidEndpoint(String),

	/// HTTP request failed.
	#[error("HTTP request failed: {0}")]
	RequestFailed(#[from] reqwest::Error),

	/// Collector returned an error.
	#[error("server error (status {status}): {message}")]
	ServerError {
		/// HTTP status code.
		status: u16,
		/// Error message from the collector.
		message: String,
	},

	/// Rate limited by the collector.
	#[error("rate limited, retry after {retry_after_secs:?} seconds")]
	RateLimited {
		/// Optional retry-after header value.
		retry_after_secs: Option<u64>,
	},

	/// Failed to serialize a batch.
	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	/// Failed to parse a configuration file.
	#[error("invalid configuration: {0}")]
	InvalidConfig(#[from] toml::de::Error),

	/// Failed to read a configuration file or persisted scope.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// Unknown navigation kind.
	#[error("invalid navigation kind: {0}")]
	InvalidNavigationKind(String),

	/// A capture hook could not be installed in this environment.
	#[error("hook '{hook}' unavailable: {reason}")]
	HookUnavailable {
		hook: &'static str,
		reason: String,
	},
}

impl MonitorError {
	pub(crate) fn hook_unavailable(hook: &'static str, reason: impl Into<String>) -> Self {
		Self::HookUnavailable {
			hook,
			reason: reason.into(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn server_error_message_includes_status() {
		let err = MonitorError::ServerError {
			status: 503,
			message: "unavailable".to_string(),
		};
		assert_eq!(err.to_string(), "server error (status 503): unavailable");
	}

	#[test]
	fn hook_unavailable_names_hook() {
		let err = MonitorError::hook_unavailable("memory", "probe unsupported");
		assert_eq!(err.to_string(), "hook 'memory' unavailable: probe unsupported");
	}
}
