// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory queues for reports and events, with periodic batched flush.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use vigil_core::{AnalyticsEvent, ErrorReport, TelemetryBatch};

use crate::error::Result;
use crate::transport::Transport;

/// Two independent bounded queues drained together into one batch.
pub(crate) struct TelemetryBuffer {
	transport: Arc<dyn Transport>,
	errors: Mutex<Vec<ErrorReport>>,
	analytics: Mutex<Vec<AnalyticsEvent>>,
	max_buffer_size: AtomicUsize,
	flush_notify: Arc<Notify>,
	flush_loop_running: AtomicBool,
}

impl TelemetryBuffer {
	pub(crate) fn new(transport: Arc<dyn Transport>, max_buffer_size: usize) -> Self {
		Self {
			transport,
			errors: Mutex::new(Vec::new()),
			analytics: Mutex::new(Vec::new()),
			max_buffer_size: AtomicUsize::new(max_buffer_size.max(1)),
			flush_notify: Arc::new(Notify::new()),
			flush_loop_running: AtomicBool::new(false),
		}
	}

	pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
		&self.transport
	}

	pub(crate) fn set_max_buffer_size(&self, max: usize) {
		let max = max.max(1);
		self.max_buffer_size.store(max, Ordering::Relaxed);
		trim_oldest(&mut lock(&self.errors), max);
		trim_oldest(&mut lock(&self.analytics), max);
	}

	pub(crate) fn push_error(&self, report: ErrorReport) {
		let max = self.max_buffer_size.load(Ordering::Relaxed);
		let mut queue = lock(&self.errors);
		while queue.len() >= max {
			let dropped = queue.remove(0);
			warn!(report_id = %dropped.id, "Dropped error report due to queue overflow");
		}
		queue.push(report);
	}

	pub(crate) fn push_event(&self, event: AnalyticsEvent) {
		let max = self.max_buffer_size.load(Ordering::Relaxed);
		let mut queue = lock(&self.analytics);
		while queue.len() >= max {
			let dropped = queue.remove(0);
			warn!(event_name = %dropped.name, "Dropped analytics event due to queue overflow");
		}
		queue.push(event);
	}

	pub(crate) fn errors(&self) -> Vec<ErrorReport> {
		lock(&self.errors).clone()
	}

	pub(crate) fn events(&self) -> Vec<AnalyticsEvent> {
		lock(&self.analytics).clone()
	}

	/// Copy of everything queued, leaving the queues untouched.
	pub(crate) fn snapshot(&self) -> TelemetryBatch {
		TelemetryBatch {
			errors: self.errors(),
			analytics: self.events(),
		}
	}

	/// Wakes the flush loop for an immediate flush.
	///
	/// The request is remembered if no loop is waiting yet.
	pub(crate) fn request_flush(&self) {
		self.flush_notify.notify_one();
	}

	/// Flushes as soon as possible.
	///
	/// Wakes the flush loop when one is running. Otherwise a one-off flush is
	/// spawned on the current runtime, if there is one.
	pub(crate) fn flush_now(self: &Arc<Self>) {
		if self.flush_loop_running.load(Ordering::Acquire) {
			self.request_flush();
			return;
		}

		match Handle::try_current() {
			Ok(handle) => {
				let buffer = Arc::clone(self);
				handle.spawn(async move {
					if let Err(e) = buffer.flush().await {
						warn!(error = %e, "Immediate flush failed; items kept for next flush");
					}
				});
			}
			Err(_) => {
				debug!("No flush loop or runtime; items wait for the next explicit flush");
				self.request_flush();
			}
		}
	}

	/// Sends everything queued in one batch.
	///
	/// The queues are swapped for empty ones before the request starts, so
	/// items captured while it is in flight wait for the next flush. On
	/// failure the batch is put back in front of them and each queue is
	/// trimmed to `max_buffer_size`, dropping the oldest.
	pub(crate) async fn flush(&self) -> Result<()> {
		let batch = TelemetryBatch {
			errors: std::mem::take(&mut *lock(&self.errors)),
			analytics: std::mem::take(&mut *lock(&self.analytics)),
		};

		if batch.is_empty() {
			return Ok(());
		}

		debug!(
			errors = batch.errors.len(),
			analytics = batch.analytics.len(),
			"Flushing telemetry batch"
		);

		match self.transport.send(&batch).await {
			Ok(()) => Ok(()),
			Err(e) => {
				self.requeue(batch);
				Err(e)
			}
		}
	}

	fn requeue(&self, batch: TelemetryBatch) {
		let max = self.max_buffer_size.load(Ordering::Relaxed);
		let dropped_errors = prepend(&mut lock(&self.errors), batch.errors, max);
		let dropped_events = prepend(&mut lock(&self.analytics), batch.analytics, max);
		if dropped_errors + dropped_events > 0 {
			warn!(
				dropped_errors,
				dropped_events, "Dropped oldest telemetry after failed flush"
			);
		}
	}

	/// Starts the periodic flush task.
	///
	/// The task holds only a weak reference and stops once the buffer is gone.
	pub(crate) fn spawn_flush_loop(self: &Arc<Self>, handle: &Handle, interval: Duration) -> JoinHandle<()> {
		let buffer = Arc::downgrade(self);
		let notify = Arc::clone(&self.flush_notify);
		self.flush_loop_running.store(true, Ordering::Release);
		let running = FlushLoopRunning(Arc::downgrade(self));

		handle.spawn(async move {
			let _running = running;
			info!(
				flush_interval_ms = interval.as_millis() as u64,
				"Starting telemetry flush loop"
			);

			loop {
				tokio::select! {
					_ = tokio::time::sleep(interval) => {}
					_ = notify.notified() => {}
				}

				let Some(buffer) = buffer.upgrade() else {
					break;
				};

				if let Err(e) = buffer.flush().await {
					warn!(error = %e, "Failed to flush telemetry; items kept for next flush");
				}
			}

			debug!("Telemetry flush loop stopped");
		})
	}
}

/// Clears the running flag when the flush loop ends or its runtime goes away.
struct FlushLoopRunning(Weak<TelemetryBuffer>);

impl Drop for FlushLoopRunning {
	fn drop(&mut self) {
		if let Some(buffer) = self.0.upgrade() {
			buffer.flush_loop_running.store(false, Ordering::Release);
		}
	}
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn trim_oldest<T>(queue: &mut Vec<T>, max: usize) -> usize {
	let overflow = queue.len().saturating_sub(max);
	queue.drain(..overflow);
	overflow
}

/// Puts `failed` in front of `queue`, keeping the newest `max` items.
fn prepend<T>(queue: &mut Vec<T>, mut failed: Vec<T>, max: usize) -> usize {
	failed.append(queue);
	*queue = failed;
	trim_oldest(queue, max)
}
