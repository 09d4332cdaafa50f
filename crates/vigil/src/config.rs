// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Monitor configuration.
//!
//! Plain options can be loaded from TOML; callbacks are set in code:
//!
//! ```toml
//! max_breadcrumbs = 50
//! max_buffer_size = 200
//! flush_interval_ms = 10000
//! environment = "staging"
//! enable_dom_capture = true
//! ```

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use vigil_core::{Environment, ErrorReport};

use crate::error::Result;

/// Process variable holding the build version, read at report-build time.
pub const BUILD_VERSION_ENV: &str = "VIGIL_BUILD_VERSION";
/// Process variable holding the environment label, read at report-build time.
pub const ENVIRONMENT_ENV: &str = "VIGIL_ENVIRONMENT";

/// Default maximum number of breadcrumbs to keep.
pub const DEFAULT_MAX_BREADCRUMBS: usize = 100;
/// Default maximum number of queued reports (and, separately, events).
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 100;

const MIN_INTERVAL: Duration = Duration::from_millis(10);

/// Transforms a report before it is queued. Returning `None` discards it.
pub type BeforeSend = Arc<dyn Fn(ErrorReport) -> Option<ErrorReport> + Send + Sync>;
/// Called with every queued report.
pub type OnError = Arc<dyn Fn(&ErrorReport) + Send + Sync>;
/// Produces an attachment (e.g. an encoded screenshot or state dump).
pub type Screenshot = Arc<dyn Fn() -> Option<String> + Send + Sync>;

/// Options supplied once to [`Monitor::initialize`](crate::Monitor::initialize).
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
	pub max_breadcrumbs: usize,
	pub max_buffer_size: usize,
	#[serde(rename = "flush_interval_ms", with = "duration_ms")]
	pub flush_interval: Duration,
	pub enable_performance_monitoring: bool,
	pub enable_user_tracking: bool,
	pub enable_console_capture: bool,
	pub enable_network_capture: bool,
	pub enable_dom_capture: bool,
	pub enable_screenshot: bool,
	/// Tasks running longer than this are recorded as long tasks.
	#[serde(rename = "long_task_threshold_ms", with = "duration_ms")]
	pub long_task_threshold: Duration,
	#[serde(rename = "memory_poll_interval_ms", with = "duration_ms")]
	pub memory_poll_interval: Duration,
	/// Used/limit heap ratio above which a memory warning is recorded.
	pub memory_warning_ratio: f64,
	/// Number of recent resource timings attached to a report.
	pub resource_timing_limit: usize,
	pub build_version: Option<String>,
	pub environment: Option<Environment>,
	#[serde(skip)]
	pub before_send: Option<BeforeSend>,
	#[serde(skip)]
	pub on_error: Option<OnError>,
	#[serde(skip)]
	pub screenshot: Option<Screenshot>,
}

impl Default for MonitorConfig {
	fn default() -> Self {
		Self {
			max_breadcrumbs: DEFAULT_MAX_BREADCRUMBS,
			max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
			flush_interval: Duration::from_secs(30),
			enable_performance_monitoring: true,
			enable_user_tracking: true,
			enable_console_capture: true,
			enable_network_capture: true,
			enable_dom_capture: false,
			enable_screenshot: false,
			long_task_threshold: Duration::from_millis(50),
			memory_poll_interval: Duration::from_secs(30),
			memory_warning_ratio: 0.9,
			resource_timing_limit: 10,
			build_version: None,
			environment: None,
			before_send: None,
			on_error: None,
			screenshot: None,
		}
	}
}

impl MonitorConfig {
	/// Parses options from a TOML document.
	pub fn from_toml_str(source: &str) -> Result<Self> {
		Ok(toml::from_str(source)?)
	}

	/// Loads options from a TOML file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let source = std::fs::read_to_string(path)?;
		Self::from_toml_str(&source)
	}

	pub fn before_send<F>(mut self, f: F) -> Self
	where
		F: Fn(ErrorReport) -> Option<ErrorReport> + Send + Sync + 'static,
	{
		self.before_send = Some(Arc::new(f));
		self
	}

	pub fn on_error<F>(mut self, f: F) -> Self
	where
		F: Fn(&ErrorReport) + Send + Sync + 'static,
	{
		self.on_error = Some(Arc::new(f));
		self
	}

	pub fn screenshot<F>(mut self, f: F) -> Self
	where
		F: Fn() -> Option<String> + Send + Sync + 'static,
	{
		self.screenshot = Some(Arc::new(f));
		self
	}

	/// Build version: explicit option, else the process variable.
	pub fn resolved_build_version(&self) -> Option<String> {
		self
			.build_version
			.clone()
			.or_else(|| std::env::var(BUILD_VERSION_ENV).ok())
			.filter(|v| !v.trim().is_empty())
	}

	/// Environment: explicit option, else the process variable, else development.
	pub fn resolved_environment(&self) -> Environment {
		self
			.environment
			.or_else(|| {
				std::env::var(ENVIRONMENT_ENV)
					.ok()
					.and_then(|v| v.parse().ok())
			})
			.unwrap_or_default()
	}

	/// Clamps values that would make the buffers or timers degenerate.
	pub(crate) fn normalized(mut self) -> Self {
		self.max_buffer_size = self.max_buffer_size.max(1);
		self.flush_interval = self.flush_interval.max(MIN_INTERVAL);
		self.memory_poll_interval = self.memory_poll_interval.max(MIN_INTERVAL);
		self.memory_warning_ratio = self.memory_warning_ratio.clamp(0.0, 1.0);
		self
	}
}

impl fmt::Debug for MonitorConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MonitorConfig")
			.field("max_breadcrumbs", &self.max_breadcrumbs)
			.field("max_buffer_size", &self.max_buffer_size)
			.field("flush_interval", &self.flush_interval)
			.field(
				"enable_performance_monitoring",
				&self.enable_performance_monitoring,
			)
			.field("enable_user_tracking", &self.enable_user_tracking)
			.field("enable_console_capture", &self.enable_console_capture)
			.field("enable_network_capture", &self.enable_network_capture)
			.field("enable_dom_capture", &self.enable_dom_capture)
			.field("enable_screenshot", &self.enable_screenshot)
			.field("long_task_threshold", &self.long_task_threshold)
			.field("memory_poll_interval", &self.memory_poll_interval)
			.field("memory_warning_ratio", &self.memory_warning_ratio)
			.field("resource_timing_limit", &self.resource_timing_limit)
			.field("build_version", &self.build_version)
			.field("environment", &self.environment)
			.field("before_send", &self.before_send.is_some())
			.field("on_error", &self.on_error.is_some())
			.field("screenshot", &self.screenshot.is_some())
			.finish()
	}
}

mod duration_ms {
	use std::time::Duration;

	use serde::{Deserialize, Deserializer};

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
	where
		D: Deserializer<'de>,
	{
		u64::deserialize(deserializer).map(Duration::from_millis)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_match_documented_values() {
		let config = MonitorConfig::default();
		assert_eq!(config.max_breadcrumbs, 100);
		assert_eq!(config.flush_interval, Duration::from_secs(30));
		assert_eq!(config.memory_poll_interval, Duration::from_secs(30));
		assert_eq!(config.long_task_threshold, Duration::from_millis(50));
		assert!(config.enable_console_capture);
		assert!(!config.enable_screenshot);
		assert!(config.before_send.is_none());
	}

	#[test]
	fn parses_toml_with_partial_options() {
		let config = MonitorConfig::from_toml_str(
			r#"
			max_breadcrumbs = 3
			flush_interval_ms = 5000
			environment = "staging"
			enable_network_capture = false
			"#,
		)
		.unwrap();

		assert_eq!(config.max_breadcrumbs, 3);
		assert_eq!(config.flush_interval, Duration::from_secs(5));
		assert_eq!(config.environment, Some(Environment::Staging));
		assert!(!config.enable_network_capture);
		assert_eq!(config.max_buffer_size, DEFAULT_MAX_BUFFER_SIZE);
	}

	#[test]
	fn rejects_malformed_toml() {
		let result = MonitorConfig::from_toml_str("max_breadcrumbs = \"many\"");
		assert!(matches!(
			result,
			Err(crate::error::MonitorError::InvalidConfig(_))
		));
	}

	#[test]
	fn load_reads_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("vigil.toml");
		std::fs::write(&path, "max_buffer_size = 7\n").unwrap();

		let config = MonitorConfig::load(&path).unwrap();
		assert_eq!(config.max_buffer_size, 7);
	}

	#[test]
	fn explicit_options_win_over_process_variables() {
		let config = MonitorConfig {
			build_version: Some("1.2.3".to_string()),
			environment: Some(Environment::Production),
			..Default::default()
		};
		assert_eq!(config.resolved_build_version().as_deref(), Some("1.2.3"));
		assert_eq!(config.resolved_environment(), Environment::Production);
	}

	#[test]
	fn normalized_clamps_degenerate_values() {
		let config = MonitorConfig {
			max_buffer_size: 0,
			flush_interval: Duration::ZERO,
			memory_warning_ratio: 4.0,
			..Default::default()
		}
		.normalized();
		assert_eq!(config.max_buffer_size, 1);
		assert_eq!(config.flush_interval, MIN_INTERVAL);
		assert_eq!(config.memory_warning_ratio, 1.0);
	}

	#[test]
	fn debug_hides_callbacks() {
		let config = MonitorConfig::default().before_send(Some);
		let debug = format!("{config:?}");
		assert!(debug.contains("before_send: true"));
	}
}
