// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Assembly of error reports from captured errors and monitor state.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::collections::BTreeMap;

use chrono::Utc;
use serde_json::Value;
use tracing::warn;
use vigil_core::{
	format_tag, is_valid_tag_key, new_id, ErrorContext, ErrorDetails, ErrorMetadata, ErrorReport, PerformanceSnapshot, Severity,
	SessionTiming,
};

use crate::config::MonitorConfig;
use crate::hooks::guarded;
use crate::monitor::MonitorInner;

/// SDK name for identification.
pub const SDK_NAME: &str = "vigil-rust";
/// SDK version for identification.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Which path a report was captured through; recorded as the `type` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureKind {
	Manual,
	UncaughtException,
	UnhandledRejection,
	ConsoleError,
}

impl CaptureKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			CaptureKind::Manual => "manual",
			CaptureKind::UncaughtException => "uncaught_exception",
			CaptureKind::UnhandledRejection => "unhandled_rejection",
			CaptureKind::ConsoleError => "console_error",
		}
	}
}

/// Caller-supplied context for one capture.
#[derive(Debug, Clone, Default)]
pub struct CaptureContext {
	/// Overrides the default `high` severity.
	pub severity: Option<Severity>,
	pub context: ErrorContext,
	/// Tags for this report only, merged over the scope tags.
	pub tags: BTreeMap<String, String>,
}

impl CaptureContext {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn severity(mut self, severity: Severity) -> Self {
		self.severity = Some(severity);
		self
	}

	pub fn component(mut self, component: impl Into<String>) -> Self {
		self.context.component = Some(component.into());
		self
	}

	pub fn props(mut self, props: Value) -> Self {
		self.context.props = Some(props);
		self
	}

	pub fn state(mut self, state: Value) -> Self {
		self.context.state = Some(state);
		self
	}

	pub fn route(mut self, route: impl Into<String>) -> Self {
		self.context.route = Some(route.into());
		self
	}

	pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.context.extra.insert(key.into(), value.into());
		self
	}

	pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.tags.insert(key.into(), value.into());
		self
	}
}

impl From<ErrorContext> for CaptureContext {
	fn from(context: ErrorContext) -> Self {
		Self {
			context,
			..Default::default()
		}
	}
}

impl From<Severity> for CaptureContext {
	fn from(severity: Severity) -> Self {
		Self::new().severity(severity)
	}
}

/// Builds reports against the current monitor state and configuration.
pub(crate) struct ReportBuilder<'a> {
	inner: &'a MonitorInner,
	config: &'a MonitorConfig,
}

impl<'a> ReportBuilder<'a> {
	pub(crate) fn new(inner: &'a MonitorInner, config: &'a MonitorConfig) -> Self {
		Self { inner, config }
	}

	pub(crate) fn build(
		&self,
		mut error: ErrorDetails,
		capture: CaptureContext,
		kind: CaptureKind,
	) -> ErrorReport {
		if error.stack.is_none() {
			error.stack = capture_stack();
		}

		let user = self.inner.scope.user().unwrap_or_default();
		let route = self.inner.navigation.current();

		let mut tags = self.inner.scope.tags();
		tags.extend(capture.tags);
		tags.retain(|key, _| {
			let valid = is_valid_tag_key(key);
			if !valid {
				warn!(tag = %key, "Dropping tag with invalid key");
			}
			valid
		});
		tags.insert("sdk.name".to_string(), SDK_NAME.to_string());
		tags.insert("sdk.version".to_string(), SDK_VERSION.to_string());
		tags.insert("type".to_string(), kind.as_str().to_string());

		let metadata = ErrorMetadata {
			timestamp: Utc::now(),
			user_agent: self.inner.attributes.user_agent.clone(),
			url: route.clone(),
			user_id: user.id.clone(),
			session_id: self.inner.session_id.clone(),
			build_version: self.config.resolved_build_version(),
			environment: self.config.resolved_environment(),
			severity: capture.severity.unwrap_or(Severity::High),
			tags: tags
				.iter()
				.map(|(k, v)| format_tag(k, v))
				.collect(),
			fingerprint: self.inner.fingerprint.fingerprint(&self.inner.attributes),
			breadcrumbs: self.inner.breadcrumbs.snapshot(),
		};

		ErrorReport {
			id: new_id(),
			error,
			metadata,
			context: self.context(capture.context, route),
			performance: self.performance(),
			user,
		}
	}

	fn context(&self, mut context: ErrorContext, route: Option<String>) -> ErrorContext {
		if context.route.is_none() {
			context.route = route;
		}

		let mut extra = self.inner.scope.context();
		extra.append(&mut context.extra);
		context.extra = extra;

		if self.config.enable_screenshot {
			let screenshot = self
				.config
				.screenshot
				.as_ref()
				.and_then(|f| guarded("screenshot", || f()).flatten());
			if let Some(screenshot) = screenshot {
				context
					.extra
					.insert("screenshot".to_string(), Value::String(screenshot));
			}
		}

		context
	}

	fn performance(&self) -> PerformanceSnapshot {
		if !self.config.enable_performance_monitoring {
			return PerformanceSnapshot::default();
		}

		let resources = self.inner.resources.snapshot();
		PerformanceSnapshot {
			memory: self.inner.probe.memory(),
			timing: Some(SessionTiming {
				session_started_at: self.inner.started_at,
				uptime_ms: self.inner.started.elapsed().as_millis() as u64,
				last_navigation_at: self.inner.navigation.last_navigation_at(),
			}),
			resources: (!resources.is_empty()).then_some(resources),
		}
	}
}

fn capture_stack() -> Option<String> {
	let backtrace = Backtrace::capture();
	match backtrace.status() {
		BacktraceStatus::Captured => Some(backtrace.to_string()),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn capture_kind_tags() {
		assert_eq!(CaptureKind::UncaughtException.as_str(), "uncaught_exception");
		assert_eq!(CaptureKind::UnhandledRejection.as_str(), "unhandled_rejection");
		assert_eq!(CaptureKind::ConsoleError.as_str(), "console_error");
	}

	#[test]
	fn capture_context_builder() {
		let capture = CaptureContext::new()
			.severity(Severity::Critical)
			.component("Checkout")
			.extra("attempt", 2)
			.tag("flow", "booking");

		assert_eq!(capture.severity, Some(Severity::Critical));
		assert_eq!(capture.context.component.as_deref(), Some("Checkout"));
		assert_eq!(capture.context.extra["attempt"], 2);
		assert_eq!(capture.tags["flow"], "booking");
	}

	#[test]
	fn severity_converts_into_capture_context() {
		let capture: CaptureContext = Severity::Low.into();
		assert_eq!(capture.severity, Some(Severity::Low));
	}
}
