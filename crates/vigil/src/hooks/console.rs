// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tracing layer that turns log events into breadcrumbs and reports.

use std::fmt;

use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;
use vigil_core::{Breadcrumb, BreadcrumbCategory, BreadcrumbLevel, ErrorDetails, Severity};

use super::{is_internal_target, CaptureGuard};
use crate::monitor::Monitor;
use crate::report::{CaptureContext, CaptureKind};

/// Name given to reports built from `ERROR` events.
pub const CONSOLE_ERROR_NAME: &str = "ConsoleError";

/// A tracing layer feeding the monitor.
///
/// Compose it next to the host's own layers; they keep receiving every event:
///
/// ```ignore
/// tracing_subscriber::registry()
/// 	.with(tracing_subscriber::fmt::layer())
/// 	.with(monitor.layer())
/// 	.init();
/// ```
///
/// `ERROR` events become reports tagged `type:console_error`; other levels
/// become `debug` breadcrumbs. Events from this SDK are ignored.
#[derive(Clone)]
pub struct MonitorLayer {
	monitor: Monitor,
}

impl MonitorLayer {
	pub fn new(monitor: Monitor) -> Self {
		Self { monitor }
	}
}

impl<S> Layer<S> for MonitorLayer
where
	S: Subscriber + for<'a> LookupSpan<'a>,
{
	fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
		let metadata = event.metadata();
		if CaptureGuard::is_active() || is_internal_target(metadata.target()) {
			return;
		}
		if !self.monitor.is_initialized() || !self.monitor.config().enable_console_capture {
			return;
		}

		let mut visitor = FieldVisitor::default();
		event.record(&mut visitor);
		let message = visitor.message.take().unwrap_or_default();
		let target = metadata.target().to_string();

		if *metadata.level() == Level::ERROR {
			let error = visitor
				.error
				.take()
				.map(|mut details| {
					if !message.is_empty() {
						details.message = format!("{message}: {}", details.message);
					}
					details
				})
				.unwrap_or_else(|| ErrorDetails::new(CONSOLE_ERROR_NAME, message));

			let mut capture = CaptureContext::new()
				.severity(Severity::Medium)
				.extra("logger", target);
			if !visitor.fields.is_empty() {
				capture = capture.extra("fields", Value::Object(visitor.fields));
			}
			self.monitor.capture_with(error, capture, CaptureKind::ConsoleError);
			return;
		}

		let mut data = Map::new();
		data.insert("logger".to_string(), Value::String(target));
		data.append(&mut visitor.fields);
		self.monitor.add_breadcrumb(
			Breadcrumb::new(BreadcrumbCategory::Debug, message)
				.with_level(breadcrumb_level(metadata.level()))
				.with_data(Value::Object(data)),
		);
	}
}

fn breadcrumb_level(level: &Level) -> BreadcrumbLevel {
	match *level {
		Level::ERROR => BreadcrumbLevel::Error,
		Level::WARN => BreadcrumbLevel::Warning,
		Level::INFO => BreadcrumbLevel::Info,
		_ => BreadcrumbLevel::Debug,
	}
}

/// Collects the message and fields of one event.
#[derive(Default)]
struct FieldVisitor {
	message: Option<String>,
	error: Option<ErrorDetails>,
	fields: Map<String, Value>,
}

impl FieldVisitor {
	fn insert(&mut self, field: &Field, value: Value) {
		self.fields.insert(field.name().to_string(), value);
	}
}

impl Visit for FieldVisitor {
	fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
		let value = format!("{value:?}");
		if field.name() == "message" {
			self.message = Some(value);
		} else {
			self.insert(field, Value::String(value));
		}
	}

	fn record_str(&mut self, field: &Field, value: &str) {
		if field.name() == "message" {
			self.message = Some(value.to_string());
		} else {
			self.insert(field, Value::String(value.to_string()));
		}
	}

	fn record_i64(&mut self, field: &Field, value: i64) {
		self.insert(field, Value::from(value));
	}

	fn record_u64(&mut self, field: &Field, value: u64) {
		self.insert(field, Value::from(value));
	}

	fn record_bool(&mut self, field: &Field, value: bool) {
		self.insert(field, Value::Bool(value));
	}

	fn record_f64(&mut self, field: &Field, value: f64) {
		self.insert(field, Value::from(value));
	}

	fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
		if self.error.is_none() {
			self.error = Some(ErrorDetails::from_dyn(value));
		}
		self.insert(field, Value::String(value.to_string()));
	}
}
