// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use vigil_core::TelemetryBatch;

use crate::error::{MonitorError, Result};
use crate::transport::Transport;

/// Transport that records batches instead of sending them.
#[derive(Default)]
pub(crate) struct RecordingTransport {
	sent: Mutex<Vec<TelemetryBatch>>,
	beacons: Mutex<Vec<TelemetryBatch>>,
	beacon_available: bool,
	should_fail: AtomicBool,
}

impl RecordingTransport {
	pub(crate) fn with_beacon() -> Self {
		Self {
			beacon_available: true,
			..Default::default()
		}
	}

	pub(crate) fn sent(&self) -> Vec<TelemetryBatch> {
		self.sent.lock().unwrap().clone()
	}

	pub(crate) fn beacons(&self) -> Vec<TelemetryBatch> {
		self.beacons.lock().unwrap().clone()
	}

	pub(crate) fn set_should_fail(&self, fail: bool) {
		self.should_fail.store(fail, Ordering::SeqCst);
	}
}

#[async_trait::async_trait]
impl Transport for RecordingTransport {
	async fn send(&self, batch: &TelemetryBatch) -> Result<()> {
		if self.should_fail.load(Ordering::SeqCst) {
			return Err(MonitorError::ServerError {
				status: 503,
				message: "collector unavailable".to_string(),
			});
		}
		self.sent.lock().unwrap().push(batch.clone());
		Ok(())
	}

	fn send_beacon(&self, batch: &TelemetryBatch) -> bool {
		if !self.beacon_available {
			return false;
		}
		self.beacons.lock().unwrap().push(batch.clone());
		true
	}
}
