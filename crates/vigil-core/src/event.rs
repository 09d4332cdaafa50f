// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Analytics events and the batch payload sent to the collector.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::report::ErrorReport;

/// Broad grouping of analytics events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
	#[default]
	User,
	System,
	Business,
	Performance,
}

impl fmt::Display for EventCategory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::User => write!(f, "user"),
			Self::System => write!(f, "system"),
			Self::Business => write!(f, "business"),
			Self::Performance => write!(f, "performance"),
		}
	}
}

impl FromStr for EventCategory {
	type Err = CoreError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"user" => Ok(Self::User),
			"system" => Ok(Self::System),
			"business" => Ok(Self::Business),
			"performance" => Ok(Self::Performance),
			_ => Err(CoreError::InvalidEventCategory(s.to_string())),
		}
	}
}

/// A product analytics event. Queued separately from error reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
	pub id: String,
	pub name: String,
	pub timestamp: DateTime<Utc>,
	#[serde(default)]
	pub properties: Map<String, Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub user_id: Option<String>,
	pub session_id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub page: Option<String>,
	#[serde(default)]
	pub category: EventCategory,
}

/// Body of one delivery to the telemetry endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetryBatch {
	#[serde(default)]
	pub errors: Vec<ErrorReport>,
	#[serde(default)]
	pub analytics: Vec<AnalyticsEvent>,
}

impl TelemetryBatch {
	pub fn is_empty(&self) -> bool {
		self.errors.is_empty() && self.analytics.is_empty()
	}

	pub fn len(&self) -> usize {
		self.errors.len() + self.analytics.len()
	}
}
