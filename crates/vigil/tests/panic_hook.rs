// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The panic hook is process-wide, so it gets a test binary of its own.

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use vigil::{MonitorConfig, Severity};

#[test]
fn panics_are_reported_and_previous_hook_still_runs() {
	let previous_ran = Arc::new(AtomicBool::new(false));
	let flag = Arc::clone(&previous_ran);
	std::panic::set_hook(Box::new(move |_| flag.store(true, Ordering::SeqCst)));

	let (monitor, _) = common::monitor(MonitorConfig::default());

	let result = std::thread::Builder::new()
		.name("booking-worker".to_string())
		.spawn(|| panic!("worker exploded"))
		.unwrap()
		.join();
	assert!(result.is_err());
	assert!(previous_ran.load(Ordering::SeqCst));

	let reports = monitor.queued_errors();
	assert_eq!(reports.len(), 1);
	let report = &reports[0];
	assert_eq!(report.error.name, "Panic");
	assert_eq!(report.error.message, "worker exploded");
	assert!(report.error.stack.is_some());
	assert_eq!(report.metadata.severity, Severity::High);
	assert_eq!(report.metadata.tag("type"), Some("uncaught_exception"));
	assert!(report.context.extra["file"]
		.as_str()
		.unwrap()
		.ends_with("panic_hook.rs"));
	assert!(report.context.extra["line"].is_u64());
	assert_eq!(report.context.extra["thread"], "booking-worker");

	// Panics inside a capture callback are contained and not re-captured.
	drop(monitor);
	let (monitor, _) = common::monitor(MonitorConfig::default().before_send(|_| panic!("filter bug")));
	assert!(monitor.capture_error(&std::io::Error::other("boom")).is_some());
	assert_eq!(monitor.queued_errors().len(), 1);
}
