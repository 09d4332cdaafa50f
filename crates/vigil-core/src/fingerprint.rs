// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Fingerprinting of the runtime environment for grouping reports.
//!
//! A fingerprint groups reports coming from the same kind of environment. It
//! is deterministic and low-entropy; it is not an identity or a credential.

use sha2::{Digest, Sha256};

use crate::environment::EnvironmentAttributes;

/// Strategy for deriving a fingerprint from environment attributes.
pub trait FingerprintStrategy: Send + Sync {
	fn fingerprint(&self, attributes: &EnvironmentAttributes) -> String;
}

/// SHA256 over user agent, locale, timezone, screen size and platform.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttributeFingerprint;

impl FingerprintStrategy for AttributeFingerprint {
	fn fingerprint(&self, attributes: &EnvironmentAttributes) -> String {
		compute_fingerprint(attributes)
	}
}

/// Compute the default fingerprint for a set of attributes.
pub fn compute_fingerprint(attributes: &EnvironmentAttributes) -> String {
	let mut hasher = Sha256::new();

	hasher.update(attributes.user_agent.as_bytes());
	hasher.update(b"|");
	hasher.update(attributes.locale.as_deref().unwrap_or_default().as_bytes());
	hasher.update(b"|");
	hasher.update(attributes.timezone.as_deref().unwrap_or_default().as_bytes());
	hasher.update(b"|");
	if let Some((width, height)) = attributes.screen {
		hasher.update(format!("{width}x{height}").as_bytes());
	}
	hasher.update(b"|");
	hasher.update(attributes.platform.as_bytes());

	hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn attributes() -> EnvironmentAttributes {
		EnvironmentAttributes {
			user_agent: "vigil/0.1.0 (linux-x86_64)".to_string(),
			locale: Some("en_US.UTF-8".to_string()),
			timezone: Some("Europe/Berlin".to_string()),
			screen: Some((1920, 1080)),
			platform: "linux-x86_64".to_string(),
		}
	}

	#[test]
	fn fingerprint_is_hex_sha256() {
		let fingerprint = compute_fingerprint(&attributes());
		assert_eq!(fingerprint.len(), 64);
		assert!(fingerprint.chars().all(|c| c.is_ascii_hexdigit()));
	}

	#[test]
	fn same_attributes_same_fingerprint() {
		assert_eq!(
			AttributeFingerprint.fingerprint(&attributes()),
			AttributeFingerprint.fingerprint(&attributes())
		);
	}

	#[test]
	fn screen_change_changes_fingerprint() {
		let other = attributes().with_screen(1280, 720);
		assert_ne!(compute_fingerprint(&attributes()), compute_fingerprint(&other));
	}

	#[test]
	fn missing_locale_differs_from_present_locale() {
		let mut other = attributes();
		other.locale = None;
		assert_ne!(compute_fingerprint(&attributes()), compute_fingerprint(&other));
	}
}
