// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error report types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::breadcrumb::Breadcrumb;
use crate::context::{ErrorContext, UserContext};
use crate::environment::Environment;
use crate::error::CoreError;
use crate::performance::PerformanceSnapshot;

/// Separates key from value in a wire tag. Keys may not contain it.
pub const TAG_SEPARATOR: char = ':';

/// Whether `key` can be used as a tag key.
pub fn is_valid_tag_key(key: &str) -> bool {
	!key.is_empty() && !key.contains(TAG_SEPARATOR)
}

/// Formats one wire tag.
pub fn format_tag(key: &str, value: &str) -> String {
	format!("{key}{TAG_SEPARATOR}{value}")
}

/// Name given to thrown values that were not errors.
pub const NON_ERROR_EXCEPTION: &str = "NonErrorException";

/// Coarse priority of a report. `Critical` forces an immediate flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
	Low,
	Medium,
	High,
	Critical,
}

impl fmt::Display for Severity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Low => write!(f, "low"),
			Self::Medium => write!(f, "medium"),
			Self::High => write!(f, "high"),
			Self::Critical => write!(f, "critical"),
		}
	}
}

impl FromStr for Severity {
	type Err = CoreError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"low" => Ok(Self::Low),
			"medium" => Ok(Self::Medium),
			"high" => Ok(Self::High),
			"critical" => Ok(Self::Critical),
			_ => Err(CoreError::InvalidSeverity(s.to_string())),
		}
	}
}

/// Identity of a captured error, with its cause chain unwrapped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetails {
	pub name: String,
	pub message: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub stack: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub cause: Option<Box<ErrorDetails>>,
}

impl ErrorDetails {
	pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			message: message.into(),
			stack: None,
			cause: None,
		}
	}

	/// Builds details from a concrete error type, naming it after the type.
	pub fn from_error<E>(error: &E) -> Self
	where
		E: std::error::Error + 'static,
	{
		Self {
			name: short_type_name(std::any::type_name::<E>()).to_string(),
			message: error.to_string(),
			stack: None,
			cause: error.source().map(|source| Box::new(Self::from_dyn(source))),
		}
	}

	/// Builds details from a type-erased error.
	///
	/// The concrete type is not recoverable here, so the name is taken from the
	/// leading identifier of the `Debug` output (`Os { .. }` → `Os`).
	pub fn from_dyn(error: &(dyn std::error::Error + 'static)) -> Self {
		Self {
			name: debug_name(error),
			message: error.to_string(),
			stack: None,
			cause: error.source().map(|source| Box::new(Self::from_dyn(source))),
		}
	}

	/// Wraps a thrown value that is not an error.
	pub fn non_error(value: &dyn fmt::Debug) -> Self {
		Self::new(
			NON_ERROR_EXCEPTION,
			format!("Non-Error exception captured: {value:?}"),
		)
	}

	pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
		self.stack = Some(stack.into());
		self
	}

	/// Number of causes below this error.
	pub fn cause_depth(&self) -> usize {
		let mut depth = 0;
		let mut current = self.cause.as_deref();
		while let Some(cause) = current {
			depth += 1;
			current = cause.cause.as_deref();
		}
		depth
	}
}

fn short_type_name(full: &str) -> &str {
	let base = full.split('<').next().unwrap_or(full);
	base.rsplit("::").next().unwrap_or(base)
}

fn debug_name(error: &dyn std::error::Error) -> String {
	let debug = format!("{error:?}");
	let name: String = debug
		.chars()
		.take_while(|c| c.is_alphanumeric() || *c == '_')
		.collect();
	if name.is_empty() {
		"Error".to_string()
	} else {
		name
	}
}

/// Metadata stamped onto every report at capture time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorMetadata {
	pub timestamp: DateTime<Utc>,
	pub user_agent: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub url: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub user_id: Option<String>,
	pub session_id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub build_version: Option<String>,
	pub environment: Environment,
	pub severity: Severity,
	/// `key:value` pairs, sorted by key. Keys never contain `:`; values may.
	#[serde(default)]
	pub tags: Vec<String>,
	pub fingerprint: String,
	/// Copy of the breadcrumb trail at capture time.
	#[serde(default)]
	pub breadcrumbs: Vec<Breadcrumb>,
}

impl ErrorMetadata {
	/// Looks up a `key:value` tag by key.
	pub fn tag(&self, key: &str) -> Option<&str> {
		self.tags.iter().find_map(|tag| {
			let (k, v) = tag.split_once(TAG_SEPARATOR)?;
			(k == key).then_some(v)
		})
	}
}

/// A complete, self-contained report for one captured error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
	pub id: String,
	pub error: ErrorDetails,
	pub metadata: ErrorMetadata,
	#[serde(default)]
	pub context: ErrorContext,
	#[serde(default)]
	pub performance: PerformanceSnapshot,
	#[serde(default)]
	pub user: UserContext,
}

/// Generates a new report or event id.
pub fn new_id() -> String {
	Uuid::now_v7().to_string()
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use std::io;

	#[derive(Debug)]
	struct Wrapped {
		inner: io::Error,
	}

	impl fmt::Display for Wrapped {
		fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
			write!(f, "booking sync failed")
		}
	}

	impl std::error::Error for Wrapped {
		fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
			Some(&self.inner)
		}
	}

	#[test]
	fn from_error_uses_short_type_name_and_unwraps_cause() {
		let err = Wrapped {
			inner: io::Error::new(io::ErrorKind::TimedOut, "socket timed out"),
		};
		let details = ErrorDetails::from_error(&err);

		assert_eq!(details.name, "Wrapped");
		assert_eq!(details.message, "booking sync failed");
		let cause = details.cause.as_deref().unwrap();
		assert_eq!(cause.message, "socket timed out");
		assert_eq!(cause.name, "Custom");
		assert_eq!(details.cause_depth(), 1);
	}

	#[test]
	fn short_type_name_strips_path_and_generics() {
		assert_eq!(short_type_name("std::io::error::Error"), "Error");
		assert_eq!(short_type_name("my_app::Failure<u8>"), "Failure");
		assert_eq!(short_type_name("Plain"), "Plain");
	}

	#[test]
	fn non_error_is_normalized() {
		let details = ErrorDetails::non_error(&42);
		assert_eq!(details.name, NON_ERROR_EXCEPTION);
		assert_eq!(details.message, "Non-Error exception captured: 42");
	}

	#[test]
	fn metadata_tag_lookup() {
		let metadata = ErrorMetadata {
			timestamp: Utc::now(),
			user_agent: "vigil/test".to_string(),
			url: None,
			user_id: None,
			session_id: "s".to_string(),
			build_version: None,
			environment: Environment::Development,
			severity: Severity::High,
			tags: vec!["type:console_error".to_string(), "url:http://x".to_string()],
			fingerprint: String::new(),
			breadcrumbs: Vec::new(),
		};
		assert_eq!(metadata.tag("type"), Some("console_error"));
		assert_eq!(metadata.tag("url"), Some("http://x"));
		assert_eq!(metadata.tag("missing"), None);
		assert_eq!(metadata.tag("url:http"), None);

		let json = serde_json::to_value(&metadata).unwrap();
		assert!(json.get("userAgent").is_some());
		assert!(json.get("sessionId").is_some());
	}

	#[test]
	fn tag_keys_may_not_contain_separator() {
		assert!(is_valid_tag_key("sdk.name"));
		assert!(!is_valid_tag_key(""));
		assert!(!is_valid_tag_key("region:eu"));
		assert_eq!(format_tag("url", "http://x"), "url:http://x");
	}

	proptest! {
		#[test]
		fn severity_roundtrip(severity in prop_oneof![
			Just(Severity::Low),
			Just(Severity::Medium),
			Just(Severity::High),
			Just(Severity::Critical),
		]) {
			let parsed: Severity = severity.to_string().parse().unwrap();
			prop_assert_eq!(severity, parsed);
		}
	}
}
