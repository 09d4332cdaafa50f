// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Errors escaping spawned tasks.

use std::fmt;
use std::future::Future;

use tokio::task::JoinHandle;
use vigil_core::{ErrorDetails, Severity};

use crate::monitor::Monitor;
use crate::report::{CaptureContext, CaptureKind};

impl Monitor {
	/// Spawns a fallible task on the current tokio runtime.
	///
	/// Every `Err` the task resolves to is reported (tagged
	/// `type:unhandled_rejection`), even when the caller awaits the handle
	/// and handles the error itself. The handle yields the original result
	/// either way.
	///
	/// # Panics
	///
	/// Panics when called outside a tokio runtime, like [`tokio::spawn`].
	pub fn spawn<F, T, E>(&self, future: F) -> JoinHandle<Result<T, E>>
	where
		F: Future<Output = Result<T, E>> + Send + 'static,
		T: Send + 'static,
		E: std::error::Error + Send + 'static,
	{
		let monitor = self.clone();
		tokio::spawn(async move {
			let result = future.await;
			if let Err(e) = &result {
				monitor.report_unhandled(ErrorDetails::from_error(e));
			}
			result
		})
	}

	/// Reports a rejection reason that is not an error type.
	pub fn report_rejection(&self, reason: &dyn fmt::Debug) -> Option<String> {
		self.report_unhandled(ErrorDetails::non_error(reason))
	}

	fn report_unhandled(&self, error: ErrorDetails) -> Option<String> {
		if !self.is_initialized() {
			return None;
		}
		self.capture_with(
			error,
			CaptureContext::new().severity(Severity::High),
			CaptureKind::UnhandledRejection,
		)
	}
}
