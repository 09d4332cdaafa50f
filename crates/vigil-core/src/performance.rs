// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Best-effort performance snapshot attached to error reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Heap usage as reported by a performance probe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryStats {
	pub used_heap_bytes: u64,
	pub total_heap_bytes: u64,
	pub heap_limit_bytes: u64,
}

impl MemoryStats {
	/// Fraction of the heap limit in use, or `None` when the limit is unknown.
	pub fn usage_ratio(&self) -> Option<f64> {
		if self.heap_limit_bytes == 0 {
			return None;
		}
		Some(self.used_heap_bytes as f64 / self.heap_limit_bytes as f64)
	}
}

/// Session-level timing information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTiming {
	pub session_started_at: DateTime<Utc>,
	pub uptime_ms: u64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub last_navigation_at: Option<DateTime<Utc>>,
}

/// Timing of one completed outbound request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTiming {
	pub name: String,
	pub method: String,
	pub start_time: DateTime<Utc>,
	pub duration_ms: u64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub status: Option<u16>,
}

/// Snapshot taken when a report is built.
///
/// Every field is optional; an unavailable snapshot serializes as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub memory: Option<MemoryStats>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub timing: Option<SessionTiming>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub resources: Option<Vec<ResourceTiming>>,
}

impl PerformanceSnapshot {
	pub fn is_empty(&self) -> bool {
		self.memory.is_none() && self.timing.is_none() && self.resources.is_none()
	}
}
