// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Breadcrumb types (diagnostic events leading up to an error).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// A single timestamped diagnostic event retained for context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breadcrumb {
	pub timestamp: DateTime<Utc>,
	pub message: String,
	pub category: BreadcrumbCategory,
	pub level: BreadcrumbLevel,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<serde_json::Value>,
}

impl Breadcrumb {
	/// Creates an `info` breadcrumb stamped with the current time.
	pub fn new(category: BreadcrumbCategory, message: impl Into<String>) -> Self {
		Self {
			timestamp: Utc::now(),
			message: message.into(),
			category,
			level: BreadcrumbLevel::Info,
			data: None,
		}
	}

	pub fn with_level(mut self, level: BreadcrumbLevel) -> Self {
		self.level = level;
		self
	}

	pub fn with_data(mut self, data: serde_json::Value) -> Self {
		self.data = Some(data);
		self
	}
}

impl Default for Breadcrumb {
	fn default() -> Self {
		Self::new(BreadcrumbCategory::Debug, String::new())
	}
}

/// What kind of activity a breadcrumb records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreadcrumbCategory {
	Navigation,
	Http,
	User,
	Ui,
	Error,
	Debug,
}

impl fmt::Display for BreadcrumbCategory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Navigation => write!(f, "navigation"),
			Self::Http => write!(f, "http"),
			Self::User => write!(f, "user"),
			Self::Ui => write!(f, "ui"),
			Self::Error => write!(f, "error"),
			Self::Debug => write!(f, "debug"),
		}
	}
}

impl FromStr for BreadcrumbCategory {
	type Err = CoreError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"navigation" => Ok(Self::Navigation),
			"http" => Ok(Self::Http),
			"user" => Ok(Self::User),
			"ui" => Ok(Self::Ui),
			"error" => Ok(Self::Error),
			"debug" => Ok(Self::Debug),
			_ => Err(CoreError::InvalidBreadcrumbCategory(s.to_string())),
		}
	}
}

/// Severity level of a breadcrumb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreadcrumbLevel {
	Debug,
	Info,
	Warning,
	Error,
}

impl fmt::Display for BreadcrumbLevel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Debug => write!(f, "debug"),
			Self::Info => write!(f, "info"),
			Self::Warning => write!(f, "warning"),
			Self::Error => write!(f, "error"),
		}
	}
}

impl FromStr for BreadcrumbLevel {
	type Err = CoreError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"debug" => Ok(Self::Debug),
			"info" => Ok(Self::Info),
			"warning" | "warn" => Ok(Self::Warning),
			"error" => Ok(Self::Error),
			_ => Err(CoreError::InvalidBreadcrumbLevel(s.to_string())),
		}
	}
}
