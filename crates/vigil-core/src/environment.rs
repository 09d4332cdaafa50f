// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Runtime environment label and stable environment attributes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Deployment environment a report was produced in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
	#[default]
	Development,
	Staging,
	Production,
}

impl fmt::Display for Environment {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Development => write!(f, "development"),
			Self::Staging => write!(f, "staging"),
			Self::Production => write!(f, "production"),
		}
	}
}

impl FromStr for Environment {
	type Err = CoreError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"development" | "dev" => Ok(Self::Development),
			"staging" => Ok(Self::Staging),
			"production" | "prod" => Ok(Self::Production),
			_ => Err(CoreError::InvalidEnvironment(s.to_string())),
		}
	}
}

/// Stable, low-entropy attributes of the environment the SDK runs in.
///
/// These feed the default fingerprint strategy and the `userAgent` metadata
/// field. None of them identify a person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentAttributes {
	pub user_agent: String,
	pub locale: Option<String>,
	pub timezone: Option<String>,
	/// Display dimensions as `(width, height)` when the host knows them.
	pub screen: Option<(u32, u32)>,
	pub platform: String,
}

impl EnvironmentAttributes {
	/// Detects attributes from the current process.
	pub fn detect() -> Self {
		let platform = format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH);
		Self {
			user_agent: format!("vigil/{} ({platform})", env!("CARGO_PKG_VERSION")),
			locale: first_env(&["LC_ALL", "LC_MESSAGES", "LANG"]),
			timezone: first_env(&["TZ"]),
			screen: None,
			platform,
		}
	}

	pub fn with_screen(mut self, width: u32, height: u32) -> Self {
		self.screen = Some((width, height));
		self
	}
}

impl Default for EnvironmentAttributes {
	fn default() -> Self {
		Self::detect()
	}
}

fn first_env(keys: &[&str]) -> Option<String> {
	keys
		.iter()
		.filter_map(|key| std::env::var(key).ok())
		.find(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn environment_parses_aliases() {
		assert_eq!("prod".parse::<Environment>().unwrap(), Environment::Production);
		assert_eq!(" Staging ".parse::<Environment>().unwrap(), Environment::Staging);
		assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Development);
		assert!("qa".parse::<Environment>().is_err());
	}

	#[test]
	fn environment_defaults_to_development() {
		assert_eq!(Environment::default(), Environment::Development);
	}

	#[test]
	fn detected_attributes_carry_platform() {
		let attrs = EnvironmentAttributes::detect();
		assert!(attrs.platform.contains('-'));
		assert!(attrs.user_agent.starts_with("vigil/"));
		assert!(attrs.screen.is_none());
	}
}
