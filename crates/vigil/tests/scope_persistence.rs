// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! A persistence adapter that panics runs through the process-wide panic
//! hook, so this gets a test binary of its own.

mod common;

use std::io;
use std::panic::AssertUnwindSafe;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use common::RecordingTransport;
use vigil::{Monitor, MonitorConfig, ScopePersistence};

struct PanickingStore;

impl ScopePersistence for PanickingStore {
	fn load(&self, _key: &str) -> io::Result<Option<String>> {
		Ok(None)
	}

	fn store(&self, _key: &str, _value: &str) -> io::Result<()> {
		panic!("disk on fire");
	}
}

#[test]
fn panicking_adapter_unwinds_to_caller_and_is_reported() {
	let monitor = Monitor::builder()
		.transport(Arc::new(RecordingTransport::default()))
		.persistence(Arc::new(PanickingStore))
		.build()
		.unwrap();
	monitor.initialize(MonitorConfig::default());

	let (tx, rx) = mpsc::channel();
	let worker = monitor.clone();
	std::thread::spawn(move || {
		let tag = std::panic::catch_unwind(AssertUnwindSafe(|| worker.set_tag("region", "eu")));
		let context = std::panic::catch_unwind(AssertUnwindSafe(|| {
			worker.set_context("plan", "pro")
		}));
		let _ = tx.send((tag.is_err(), context.is_err()));
	});

	let (tag_panicked, context_panicked) = rx
		.recv_timeout(Duration::from_secs(5))
		.expect("scope update did not return");
	assert!(tag_panicked);
	assert!(context_panicked);

	let reports = monitor.queued_errors();
	assert_eq!(reports.len(), 2);
	assert!(reports.iter().all(|r| r.error.message == "disk on fire"));
	assert_eq!(reports[0].metadata.tag("region"), Some("eu"));
	assert_eq!(reports[1].context.extra["plan"], "pro");

	// No scope lock is left held.
	assert_eq!(monitor.queued_errors()[1].metadata.tag("region"), Some("eu"));
	monitor.remove_tag("missing");
	assert!(monitor.capture_error(&io::Error::other("after")).is_some());
}
