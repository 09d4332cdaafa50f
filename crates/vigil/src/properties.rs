// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Analytics event properties.

use serde_json::{Map, Value};

/// Key/value properties attached to an analytics event.
///
/// ```
/// use vigil::Properties;
///
/// let props = Properties::new()
///     .insert("plan", "pro")
///     .insert("seats", 5)
///     .insert("trial", false);
/// assert_eq!(props.len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
	inner: Map<String, Value>,
}

impl Properties {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert<K, V>(mut self, key: K, value: V) -> Self
	where
		K: Into<String>,
		V: Into<Value>,
	{
		self.inner.insert(key.into(), value.into());
		self
	}

	/// Inserts `value` only when it is present.
	pub fn insert_opt<K, V>(self, key: K, value: Option<V>) -> Self
	where
		K: Into<String>,
		V: Into<Value>,
	{
		match value {
			Some(value) => self.insert(key, value),
			None => self,
		}
	}

	/// Adds every entry of `other`, overwriting existing keys.
	pub fn merge(mut self, other: Properties) -> Self {
		self.inner.extend(other.inner);
		self
	}

	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}

	pub fn len(&self) -> usize {
		self.inner.len()
	}

	pub fn get(&self, key: &str) -> Option<&Value> {
		self.inner.get(key)
	}

	pub fn into_map(self) -> Map<String, Value> {
		self.inner
	}
}

impl From<Map<String, Value>> for Properties {
	fn from(inner: Map<String, Value>) -> Self {
		Self { inner }
	}
}

/// Non-object values carry no properties.
impl From<Value> for Properties {
	fn from(value: Value) -> Self {
		match value {
			Value::Object(inner) => Self { inner },
			_ => Self::new(),
		}
	}
}

impl From<Properties> for Map<String, Value> {
	fn from(props: Properties) -> Self {
		props.inner
	}
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Properties {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self {
			inner: iter
				.into_iter()
				.map(|(k, v)| (k.into(), v.into()))
				.collect(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn insert_opt_skips_missing_values() {
		let props = Properties::new()
			.insert_opt("target", Some("#signup"))
			.insert_opt::<_, String>("referrer", None);
		assert_eq!(props.len(), 1);
		assert_eq!(props.get("target"), Some(&json!("#signup")));
	}

	#[test]
	fn merge_prefers_other() {
		let props = Properties::new()
			.insert("plan", "free")
			.insert("seats", 1)
			.merge(Properties::new().insert("plan", "pro"));
		assert_eq!(props.get("plan"), Some(&json!("pro")));
		assert_eq!(props.get("seats"), Some(&json!(1)));
	}

	#[test]
	fn from_value_accepts_only_objects() {
		assert_eq!(Properties::from(json!({"a": 1})).len(), 1);
		assert!(Properties::from(json!([1, 2])).is_empty());
		assert!(Properties::from(Value::Null).is_empty());
	}

	#[test]
	fn collects_from_pairs() {
		let props: Properties = [("a", 1), ("b", 2)].into_iter().collect();
		assert_eq!(props.into_map()["b"], 2);
	}
}
