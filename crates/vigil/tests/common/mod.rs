// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use vigil::{Monitor, MonitorConfig, MonitorError, TelemetryBatch, Transport};

/// Records batches; the first `fail_next` sends fail.
#[derive(Default)]
pub struct RecordingTransport {
	sent: Mutex<Vec<TelemetryBatch>>,
	attempts: AtomicUsize,
	fail_next: AtomicUsize,
}

impl RecordingTransport {
	pub fn sent(&self) -> Vec<TelemetryBatch> {
		self.sent.lock().unwrap().clone()
	}

	pub fn attempts(&self) -> usize {
		self.attempts.load(Ordering::SeqCst)
	}

	pub fn fail_next(&self, count: usize) {
		self.fail_next.store(count, Ordering::SeqCst);
	}
}

#[async_trait::async_trait]
impl Transport for RecordingTransport {
	async fn send(&self, batch: &TelemetryBatch) -> vigil::Result<()> {
		self.attempts.fetch_add(1, Ordering::SeqCst);
		let remaining = self.fail_next.load(Ordering::SeqCst);
		if remaining > 0 {
			self.fail_next.store(remaining - 1, Ordering::SeqCst);
			return Err(MonitorError::ServerError {
				status: 502,
				message: "bad gateway".to_string(),
			});
		}
		self.sent.lock().unwrap().push(batch.clone());
		Ok(())
	}
}

pub fn monitor(config: MonitorConfig) -> (Monitor, Arc<RecordingTransport>) {
	let transport = Arc::new(RecordingTransport::default());
	let monitor = Monitor::builder()
		.transport(transport.clone())
		.initial_route("/")
		.build()
		.unwrap();
	monitor.initialize(config);
	(monitor, transport)
}
