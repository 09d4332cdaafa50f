// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Context types attached to error reports (user identity, component state).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identity of the user active when a report was captured.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub role: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub permissions: Option<Vec<String>>,
}

impl UserContext {
	/// Creates a user context carrying only an id.
	pub fn with_id(id: impl Into<String>) -> Self {
		Self {
			id: Some(id.into()),
			..Default::default()
		}
	}
}

/// Where in the host application an error happened.
///
/// `extra` holds the persisted scope context merged with anything the caller
/// or the capturing hook attached (e.g. source location for panics).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorContext {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub component: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub props: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub state: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub route: Option<String>,
	#[serde(default, skip_serializing_if = "Map::is_empty")]
	pub extra: Map<String, Value>,
}

impl ErrorContext {
	pub fn component(mut self, component: impl Into<String>) -> Self {
		self.component = Some(component.into());
		self
	}

	pub fn props(mut self, props: Value) -> Self {
		self.props = Some(props);
		self
	}

	pub fn state(mut self, state: Value) -> Self {
		self.state = Some(state);
		self
	}

	pub fn route(mut self, route: impl Into<String>) -> Self {
		self.route = Some(route.into());
		self
	}

	pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.extra.insert(key.into(), value.into());
		self
	}
}
