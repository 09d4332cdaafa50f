// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Long-task timing and memory pressure polling.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::json;
use tokio::runtime::Handle;
use tracing::debug;
use vigil_core::{Breadcrumb, BreadcrumbCategory, BreadcrumbLevel, MemoryStats};

use super::Hook;
use crate::config::MonitorConfig;
use crate::error::{MonitorError, Result};
use crate::monitor::Monitor;

/// Source of runtime performance figures.
///
/// The SDK has no portable way to read heap usage, so hosts that can (an
/// allocator with statistics, a cgroup reader) plug in a probe. A probe that
/// returns `None` disables memory polling.
pub trait PerformanceProbe: Send + Sync {
	fn memory(&self) -> Option<MemoryStats> {
		None
	}
}

/// Probe that reports nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProbe;

impl PerformanceProbe for NoopProbe {}

/// Polls the probe and records a warning when heap usage is high.
pub(crate) struct MemoryWatchHook;

impl Hook for MemoryWatchHook {
	fn name(&self) -> &'static str {
		"memory"
	}

	fn enabled(&self, config: &MonitorConfig) -> bool {
		config.enable_performance_monitoring
	}

	fn install(&self, monitor: &Monitor) -> Result<()> {
		if monitor.inner.probe.memory().is_none() {
			return Err(MonitorError::hook_unavailable(
				self.name(),
				"performance probe reports no memory statistics",
			));
		}
		let handle = Handle::try_current()
			.map_err(|_| MonitorError::hook_unavailable(self.name(), "no tokio runtime"))?;

		let interval = monitor.config().memory_poll_interval;
		let monitor = Arc::downgrade(&monitor.inner);

		handle.spawn(async move {
			let mut ticker = tokio::time::interval(interval);
			// The first tick completes immediately.
			ticker.tick().await;

			loop {
				ticker.tick().await;
				let Some(inner) = monitor.upgrade() else {
					break;
				};
				Monitor::from_inner(inner).check_memory();
			}

			debug!("Memory poller stopped");
		});

		Ok(())
	}
}

/// Times a unit of work; records it as a long task on drop if it ran past
/// the configured threshold.
#[must_use = "the task is timed until the timer is dropped"]
pub struct TaskTimer {
	monitor: Monitor,
	name: String,
	started: Instant,
	finished: bool,
}

impl TaskTimer {
	pub fn elapsed(&self) -> Duration {
		self.started.elapsed()
	}

	/// Stops the timer and returns the measured duration.
	pub fn finish(mut self) -> Duration {
		self.finished = true;
		let duration = self.started.elapsed();
		self.monitor.record_long_task(&self.name, self.started, duration);
		duration
	}
}

impl Drop for TaskTimer {
	fn drop(&mut self) {
		if !self.finished {
			self
				.monitor
				.record_long_task(&self.name, self.started, self.started.elapsed());
		}
	}
}

impl Monitor {
	/// Starts timing a unit of work.
	pub fn track_task(&self, name: impl Into<String>) -> TaskTimer {
		TaskTimer {
			monitor: self.clone(),
			name: name.into(),
			started: Instant::now(),
			finished: false,
		}
	}

	/// Records an externally measured task that just finished.
	pub fn record_task(&self, name: &str, duration: Duration) {
		let now = Instant::now();
		let started = now.checked_sub(duration).unwrap_or(now);
		self.record_long_task(name, started, duration);
	}

	fn record_long_task(&self, name: &str, started: Instant, duration: Duration) {
		if !self.is_initialized() {
			return;
		}
		let config = self.config();
		if !config.enable_performance_monitoring || duration <= config.long_task_threshold {
			return;
		}

		let duration_ms = duration.as_millis() as u64;
		let start_offset_ms = started.saturating_duration_since(self.inner.started).as_millis() as u64;
		self.add_breadcrumb(
			Breadcrumb::new(
				BreadcrumbCategory::Ui,
				format!("Long task detected: {name} took {duration_ms}ms"),
			)
			.with_level(BreadcrumbLevel::Warning)
			.with_data(json!({
				"name": name,
				"duration_ms": duration_ms,
				"start_offset_ms": start_offset_ms,
			})),
		);
	}

	/// Reads the probe once, recording a warning above the configured ratio.
	pub(crate) fn check_memory(&self) {
		let config = self.config();
		if !config.enable_performance_monitoring {
			return;
		}
		let Some(stats) = self.inner.probe.memory() else {
			return;
		};
		let Some(ratio) = stats.usage_ratio() else {
			return;
		};
		if ratio <= config.memory_warning_ratio {
			return;
		}

		self.add_breadcrumb(
			Breadcrumb::new(
				BreadcrumbCategory::Ui,
				format!("High memory usage: {:.1}%", ratio * 100.0),
			)
			.with_level(BreadcrumbLevel::Warning)
			.with_data(json!({
				"used_heap_bytes": stats.used_heap_bytes,
				"total_heap_bytes": stats.total_heap_bytes,
				"heap_limit_bytes": stats.heap_limit_bytes,
				"usage_ratio": ratio,
			})),
		);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::RecordingTransport;

	struct FixedProbe(MemoryStats);

	impl PerformanceProbe for FixedProbe {
		fn memory(&self) -> Option<MemoryStats> {
			Some(self.0)
		}
	}

	fn stats(used: u64, limit: u64) -> MemoryStats {
		MemoryStats {
			used_heap_bytes: used,
			total_heap_bytes: used,
			heap_limit_bytes: limit,
		}
	}

	fn monitor_with_probe(probe: impl PerformanceProbe + 'static, config: MonitorConfig) -> Monitor {
		let monitor = Monitor::builder()
			.transport(Arc::new(RecordingTransport::default()))
			.probe(Arc::new(probe))
			.build()
			.unwrap();
		monitor.initialize(config);
		monitor
	}

	#[test]
	fn long_tasks_above_threshold_are_recorded() {
		let monitor = monitor_with_probe(NoopProbe, MonitorConfig::default());

		monitor.record_task("render", Duration::from_millis(20));
		monitor.record_task("render", Duration::from_millis(50));
		monitor.record_task("layout", Duration::from_millis(120));

		let crumbs = monitor.breadcrumbs();
		assert_eq!(crumbs.len(), 1);
		assert_eq!(crumbs[0].category, BreadcrumbCategory::Ui);
		assert_eq!(crumbs[0].level, BreadcrumbLevel::Warning);
		let data = crumbs[0].data.as_ref().unwrap();
		assert_eq!(data["name"], "layout");
		assert_eq!(data["duration_ms"], 120);
		assert!(data["start_offset_ms"].is_u64());
	}

	#[test]
	fn task_timer_records_on_drop() {
		let monitor = monitor_with_probe(
			NoopProbe,
			MonitorConfig {
				long_task_threshold: Duration::ZERO,
				..Default::default()
			},
		);

		{
			let _timer = monitor.track_task("import");
			std::thread::sleep(Duration::from_millis(2));
		}
		let duration = {
			let timer = monitor.track_task("export");
			std::thread::sleep(Duration::from_millis(2));
			timer.finish()
		};

		assert!(duration >= Duration::from_millis(2));
		let names: Vec<_> = monitor
			.breadcrumbs()
			.into_iter()
			.map(|b| b.data.unwrap()["name"].clone())
			.collect();
		assert_eq!(names, ["import", "export"]);
	}

	#[test]
	fn long_tasks_ignored_when_performance_disabled() {
		let monitor = monitor_with_probe(
			NoopProbe,
			MonitorConfig {
				enable_performance_monitoring: false,
				..Default::default()
			},
		);
		monitor.record_task("layout", Duration::from_secs(1));
		assert!(monitor.breadcrumbs().is_empty());
	}

	#[test]
	fn memory_warning_only_above_ratio() {
		let high = monitor_with_probe(FixedProbe(stats(95, 100)), MonitorConfig::default());
		high.check_memory();
		let crumbs = high.breadcrumbs();
		assert_eq!(crumbs.len(), 1);
		assert_eq!(crumbs[0].message, "High memory usage: 95.0%");

		let normal = monitor_with_probe(FixedProbe(stats(50, 100)), MonitorConfig::default());
		normal.check_memory();
		assert!(normal.breadcrumbs().is_empty());

		let unknown_limit = monitor_with_probe(FixedProbe(stats(50, 0)), MonitorConfig::default());
		unknown_limit.check_memory();
		assert!(unknown_limit.breadcrumbs().is_empty());
	}

	#[test]
	fn memory_hook_unavailable_without_stats() {
		let monitor = Monitor::builder()
			.transport(Arc::new(RecordingTransport::default()))
			.build()
			.unwrap();
		let result = MemoryWatchHook.install(&monitor);
		assert!(matches!(
			result,
			Err(MonitorError::HookUnavailable { hook: "memory", .. })
		));
	}

	#[tokio::test(start_paused = true)]
	async fn memory_poller_runs_on_interval() {
		let monitor = monitor_with_probe(
			FixedProbe(stats(99, 100)),
			MonitorConfig {
				memory_poll_interval: Duration::from_secs(1),
				..Default::default()
			},
		);

		tokio::time::sleep(Duration::from_millis(500)).await;
		assert!(monitor.breadcrumbs().is_empty());

		tokio::time::sleep(Duration::from_millis(1_600)).await;
		assert_eq!(monitor.breadcrumbs().len(), 2);
	}
}
