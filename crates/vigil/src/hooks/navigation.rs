// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Route tracking for hosts with a notion of "current page".

use std::fmt;
use std::str::FromStr;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use vigil_core::{Breadcrumb, BreadcrumbCategory};

use crate::error::MonitorError;
use crate::monitor::Monitor;

/// How a route change happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationKind {
	/// A new entry was pushed.
	Push,
	/// The current entry was replaced.
	Replace,
	/// Back/forward movement through existing entries.
	Pop,
}

impl fmt::Display for NavigationKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			NavigationKind::Push => write!(f, "push"),
			NavigationKind::Replace => write!(f, "replace"),
			NavigationKind::Pop => write!(f, "pop"),
		}
	}
}

impl FromStr for NavigationKind {
	type Err = MonitorError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"push" => Ok(NavigationKind::Push),
			"replace" => Ok(NavigationKind::Replace),
			"pop" => Ok(NavigationKind::Pop),
			_ => Err(MonitorError::InvalidNavigationKind(s.to_string())),
		}
	}
}

#[derive(Debug, Default)]
struct NavigationState {
	current: Option<String>,
	last_navigation_at: Option<DateTime<Utc>>,
}

/// A route change that should be recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Transition {
	pub(crate) from: Option<String>,
	pub(crate) to: String,
}

/// Holds the current route; consecutive identical routes are collapsed.
#[derive(Debug)]
pub(crate) struct NavigationTracker {
	state: RwLock<NavigationState>,
	referrer: Option<String>,
}

impl NavigationTracker {
	pub(crate) fn new(initial_route: Option<String>, referrer: Option<String>) -> Self {
		Self {
			state: RwLock::new(NavigationState {
				current: initial_route,
				last_navigation_at: None,
			}),
			referrer,
		}
	}

	/// Moves to `to`, returning the transition unless it is a repeat of the
	/// current route.
	pub(crate) fn transition(&self, to: &str) -> Option<Transition> {
		let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
		if state.current.as_deref() == Some(to) {
			return None;
		}

		let from = state.current.replace(to.to_string());
		state.last_navigation_at = Some(Utc::now());
		Some(Transition {
			from,
			to: to.to_string(),
		})
	}

	pub(crate) fn current(&self) -> Option<String> {
		self
			.state
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.current
			.clone()
	}

	pub(crate) fn last_navigation_at(&self) -> Option<DateTime<Utc>> {
		self
			.state
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.last_navigation_at
	}

	pub(crate) fn referrer(&self) -> Option<&str> {
		self.referrer.as_deref()
	}
}

impl Monitor {
	/// Records a route change.
	///
	/// The current route is always updated (it feeds `metadata.url` and the
	/// default `context.route`); a `navigation` breadcrumb is added only once
	/// the monitor is initialized. Navigating to the current route is ignored.
	pub fn navigate(&self, to: impl AsRef<str>, kind: NavigationKind) {
		let Some(transition) = self.inner.navigation.transition(to.as_ref()) else {
			return;
		};
		if !self.is_initialized() {
			return;
		}

		let data = json!({
			"from": transition.from,
			"to": transition.to,
			"referrer": self.inner.navigation.referrer(),
			"kind": kind,
		});
		let message = match &transition.from {
			Some(from) => format!("Navigated from {from} to {}", transition.to),
			None => format!("Navigated to {}", transition.to),
		};
		self.add_breadcrumb(Breadcrumb::new(BreadcrumbCategory::Navigation, message).with_data(data));
	}

	/// The route most recently passed to [`Monitor::navigate`], or the initial route.
	pub fn current_route(&self) -> Option<String> {
		self.inner.navigation.current()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn identical_consecutive_routes_are_collapsed() {
		let tracker = NavigationTracker::new(Some("/".to_string()), None);

		assert!(tracker.transition("/").is_none());
		let transition = tracker.transition("/bookings").unwrap();
		assert_eq!(transition.from.as_deref(), Some("/"));
		assert_eq!(transition.to, "/bookings");
		assert!(tracker.transition("/bookings").is_none());
		assert!(tracker.transition("/").is_some());
	}

	#[test]
	fn first_transition_without_initial_route() {
		let tracker = NavigationTracker::new(None, Some("https://search.example".to_string()));
		assert!(tracker.last_navigation_at().is_none());

		let transition = tracker.transition("/home").unwrap();
		assert!(transition.from.is_none());
		assert_eq!(tracker.current().as_deref(), Some("/home"));
		assert!(tracker.last_navigation_at().is_some());
		assert_eq!(tracker.referrer(), Some("https://search.example"));
	}

	#[test]
	fn navigation_kind_parses() {
		assert_eq!("PUSH".parse::<NavigationKind>().unwrap(), NavigationKind::Push);
		assert_eq!(NavigationKind::Pop.to_string(), "pop");
		assert!("jump".parse::<NavigationKind>().is_err());
	}
}
