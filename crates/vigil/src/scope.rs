// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tags, context and user identity merged into every report.
//!
//! Tags and context live in memory and are mirrored to an optional
//! [`ScopePersistence`] adapter so they can survive a restart of the host.

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use serde_json::{Map, Value};
use tracing::warn;
use vigil_core::UserContext;

/// Persistence key for the tag map (`{string: string}` JSON).
pub const TAGS_KEY: &str = "error-monitor-tags";
/// Persistence key for the context map (`{string: any}` JSON).
pub const CONTEXT_KEY: &str = "error-monitor-context";

/// Storage for persisted scope values.
pub trait ScopePersistence: Send + Sync {
	fn load(&self, key: &str) -> io::Result<Option<String>>;
	fn store(&self, key: &str, value: &str) -> io::Result<()>;
}

/// Keeps persisted values in memory. Useful for tests and short-lived hosts.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
	entries: Mutex<HashMap<String, String>>,
}

impl MemoryPersistence {
	pub fn new() -> Self {
		Self::default()
	}
}

impl ScopePersistence for MemoryPersistence {
	fn load(&self, key: &str) -> io::Result<Option<String>> {
		Ok(
			self
				.entries
				.lock()
				.unwrap_or_else(PoisonError::into_inner)
				.get(key)
				.cloned(),
		)
	}

	fn store(&self, key: &str, value: &str) -> io::Result<()> {
		self
			.entries
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.insert(key.to_string(), value.to_string());
		Ok(())
	}
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FilePersistence {
	dir: PathBuf,
}

impl FilePersistence {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self { dir: dir.into() }
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}

	fn path_for(&self, key: &str) -> PathBuf {
		self.dir.join(format!("{key}.json"))
	}
}

impl ScopePersistence for FilePersistence {
	fn load(&self, key: &str) -> io::Result<Option<String>> {
		match std::fs::read_to_string(self.path_for(key)) {
			Ok(contents) => Ok(Some(contents)),
			Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
			Err(e) => Err(e),
		}
	}

	fn store(&self, key: &str, value: &str) -> io::Result<()> {
		std::fs::create_dir_all(&self.dir)?;
		std::fs::write(self.path_for(key), value)
	}
}

pub(crate) struct Scope {
	tags: RwLock<BTreeMap<String, String>>,
	context: RwLock<Map<String, Value>>,
	user: RwLock<Option<UserContext>>,
	persistence: Option<Arc<dyn ScopePersistence>>,
	// Held across snapshot and store so writes reach the adapter in order.
	// The maps themselves are never locked while the adapter runs.
	persist_lock: Mutex<()>,
}

impl Scope {
	pub(crate) fn new(persistence: Option<Arc<dyn ScopePersistence>>) -> Self {
		let tags = persistence
			.as_deref()
			.and_then(|p| restore(p, TAGS_KEY))
			.unwrap_or_default();
		let context = persistence
			.as_deref()
			.and_then(|p| restore(p, CONTEXT_KEY))
			.unwrap_or_default();

		Self {
			tags: RwLock::new(tags),
			context: RwLock::new(context),
			user: RwLock::new(None),
			persistence,
			persist_lock: Mutex::new(()),
		}
	}

	pub(crate) fn set_tag(&self, key: String, value: String) {
		let _persist = self.persist_lock();
		let snapshot = {
			let mut tags = self.tags.write().unwrap_or_else(PoisonError::into_inner);
			tags.insert(key, value);
			self.snapshot(&*tags)
		};
		self.store(TAGS_KEY, snapshot);
	}

	pub(crate) fn remove_tag(&self, key: &str) {
		let _persist = self.persist_lock();
		let snapshot = {
			let mut tags = self.tags.write().unwrap_or_else(PoisonError::into_inner);
			if tags.remove(key).is_none() {
				return;
			}
			self.snapshot(&*tags)
		};
		self.store(TAGS_KEY, snapshot);
	}

	pub(crate) fn tags(&self) -> BTreeMap<String, String> {
		self
			.tags
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.clone()
	}

	pub(crate) fn set_context(&self, key: String, value: Value) {
		let _persist = self.persist_lock();
		let snapshot = {
			let mut context = self.context.write().unwrap_or_else(PoisonError::into_inner);
			context.insert(key, value);
			self.snapshot(&*context)
		};
		self.store(CONTEXT_KEY, snapshot);
	}

	pub(crate) fn clear_context(&self) {
		let _persist = self.persist_lock();
		let snapshot = {
			let mut context = self.context.write().unwrap_or_else(PoisonError::into_inner);
			context.clear();
			self.snapshot(&*context)
		};
		self.store(CONTEXT_KEY, snapshot);
	}

	pub(crate) fn context(&self) -> Map<String, Value> {
		self
			.context
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.clone()
	}

	pub(crate) fn set_user(&self, user: Option<UserContext>) {
		*self.user.write().unwrap_or_else(PoisonError::into_inner) = user;
	}

	pub(crate) fn user(&self) -> Option<UserContext> {
		self
			.user
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.clone()
	}

	fn persist_lock(&self) -> MutexGuard<'_, ()> {
		self.persist_lock.lock().unwrap_or_else(PoisonError::into_inner)
	}

	/// Serializes `value` for the adapter, or `None` without one.
	fn snapshot<T: serde::Serialize>(&self, value: &T) -> Option<io::Result<String>> {
		self.persistence.as_ref()?;
		Some(serde_json::to_string(value).map_err(io::Error::other))
	}

	/// Hands a snapshot to the adapter. Must be called with no map lock held:
	/// an adapter that panics reaches the panic hook, which reads the maps.
	fn store(&self, key: &str, snapshot: Option<io::Result<String>>) {
		let (Some(persistence), Some(snapshot)) = (&self.persistence, snapshot) else {
			return;
		};
		if let Err(e) = snapshot.and_then(|json| persistence.store(key, &json)) {
			warn!(key, error = %e, "Failed to persist monitor scope");
		}
	}
}

fn restore<T: serde::de::DeserializeOwned>(
	persistence: &dyn ScopePersistence,
	key: &str,
) -> Option<T> {
	match persistence.load(key) {
		Ok(Some(json)) => match serde_json::from_str(&json) {
			Ok(value) => Some(value),
			Err(e) => {
				warn!(key, error = %e, "Ignoring unreadable persisted scope");
				None
			}
		},
		Ok(None) => None,
		Err(e) => {
			warn!(key, error = %e, "Failed to load persisted scope");
			None
		}
	}
}
