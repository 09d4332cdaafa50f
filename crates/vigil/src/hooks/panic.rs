// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Panic hook integration for uncaught panics.

use std::backtrace::Backtrace;
use std::panic::PanicHookInfo;
use std::sync::Arc;

use serde_json::json;
use vigil_core::{ErrorDetails, Severity};

use super::Hook;
use crate::error::Result;
use crate::monitor::Monitor;
use crate::report::{CaptureContext, CaptureKind};

/// Name given to reports built from panics.
pub const PANIC_ERROR_NAME: &str = "Panic";

/// Chains a reporting hook in front of whatever panic hook is installed.
pub(crate) struct PanicHook;

impl Hook for PanicHook {
	fn name(&self) -> &'static str {
		"panic"
	}

	fn install(&self, monitor: &Monitor) -> Result<()> {
		let monitor = Arc::downgrade(&monitor.inner);
		let previous = std::panic::take_hook();

		std::panic::set_hook(Box::new(move |info| {
			// The host's hook runs first so its output is never delayed by reporting.
			previous(info);

			if let Some(inner) = monitor.upgrade() {
				report_panic(&Monitor::from_inner(inner), info);
			}
		}));

		Ok(())
	}
}

fn report_panic(monitor: &Monitor, info: &PanicHookInfo<'_>) {
	if !monitor.is_initialized() {
		return;
	}

	let backtrace = Backtrace::force_capture();
	let error = ErrorDetails::new(PANIC_ERROR_NAME, extract_panic_message(info))
		.with_stack(backtrace.to_string());

	let mut capture = CaptureContext::new().severity(Severity::High);
	if let Some(location) = info.location() {
		capture = capture
			.extra("file", location.file())
			.extra("line", json!(location.line()))
			.extra("column", json!(location.column()));
	}
	if let Some(thread) = std::thread::current().name() {
		capture = capture.extra("thread", thread);
	}

	monitor.capture_with(error, capture, CaptureKind::UncaughtException);
}

/// Extracts the panic message from the payload.
pub(crate) fn extract_panic_message(info: &PanicHookInfo<'_>) -> String {
	if let Some(s) = info.payload().downcast_ref::<&str>() {
		s.to_string()
	} else if let Some(s) = info.payload().downcast_ref::<String>() {
		s.clone()
	} else {
		"Box<dyn Any>".to_string()
	}
}
