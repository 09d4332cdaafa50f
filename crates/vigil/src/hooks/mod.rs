// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Capture hooks: adapters that turn runtime signals into breadcrumbs or
//! reports.
//!
//! Process-wide hooks (panic hook, memory poller) implement [`Hook`] and are
//! installed one by one by [`Monitor::initialize`](crate::Monitor::initialize);
//! a hook that cannot be installed is skipped without affecting the others.
//! The remaining adapters (tracing layer, request observer, navigation,
//! task timing, monitored spawn) are always reachable but stay inert until
//! the monitor is initialized and the matching option is enabled.

pub mod console;
pub mod navigation;
pub mod network;
pub mod panic;
pub mod performance;
pub mod rejection;

use std::cell::Cell;
use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::warn;

use crate::config::MonitorConfig;
use crate::error::Result;
use crate::monitor::Monitor;

/// A process-wide hook installed once at initialization.
pub(crate) trait Hook: Send + Sync {
	fn name(&self) -> &'static str;

	fn enabled(&self, _config: &MonitorConfig) -> bool {
		true
	}

	fn install(&self, monitor: &Monitor) -> Result<()>;
}

pub(crate) fn default_hooks() -> Vec<Box<dyn Hook>> {
	vec![
		Box::new(panic::PanicHook),
		Box::new(performance::MemoryWatchHook),
	]
}

thread_local! {
	static CAPTURING: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current thread as inside a capture.
///
/// Anything the capture path triggers on the same thread (a panicking or
/// logging user callback) is ignored instead of being captured recursively.
pub(crate) struct CaptureGuard {
	_private: (),
}

impl CaptureGuard {
	pub(crate) fn enter() -> Option<Self> {
		CAPTURING.with(|capturing| {
			if capturing.get() {
				None
			} else {
				capturing.set(true);
				Some(Self { _private: () })
			}
		})
	}

	pub(crate) fn is_active() -> bool {
		CAPTURING.with(Cell::get)
	}
}

impl Drop for CaptureGuard {
	fn drop(&mut self) {
		CAPTURING.with(|capturing| capturing.set(false));
	}
}

/// Runs a user-supplied callback, containing any panic it raises.
pub(crate) fn guarded<T>(name: &'static str, f: impl FnOnce() -> T) -> Option<T> {
	match catch_unwind(AssertUnwindSafe(f)) {
		Ok(value) => Some(value),
		Err(_) => {
			warn!(callback = name, "Monitor callback panicked");
			None
		}
	}
}

/// True for events emitted by this SDK, which must never be captured.
pub(crate) fn is_internal_target(target: &str) -> bool {
	target == "vigil"
		|| target.starts_with("vigil::")
		|| target == "vigil_core"
		|| target.starts_with("vigil_core::")
}
