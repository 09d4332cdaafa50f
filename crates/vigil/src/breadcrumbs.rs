// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bounded breadcrumb trail.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use vigil_core::Breadcrumb;

/// Append-only ring of recent breadcrumbs; the oldest entry is evicted first.
#[derive(Debug)]
pub(crate) struct BreadcrumbRecorder {
	entries: Mutex<VecDeque<Breadcrumb>>,
	max: AtomicUsize,
}

impl BreadcrumbRecorder {
	pub(crate) fn new(max: usize) -> Self {
		Self {
			entries: Mutex::new(VecDeque::with_capacity(max.min(1024))),
			max: AtomicUsize::new(max),
		}
	}

	pub(crate) fn add(&self, breadcrumb: Breadcrumb) {
		let max = self.max.load(Ordering::Relaxed);
		let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
		entries.push_back(breadcrumb);
		while entries.len() > max {
			entries.pop_front();
		}
	}

	/// Copy of the trail in insertion order.
	pub(crate) fn snapshot(&self) -> Vec<Breadcrumb> {
		self
			.entries
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.iter()
			.cloned()
			.collect()
	}

	pub(crate) fn clear(&self) {
		self
			.entries
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.clear();
	}

	/// Changes the bound, trimming the oldest entries if needed.
	pub(crate) fn set_max(&self, max: usize) {
		self.max.store(max, Ordering::Relaxed);
		let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
		while entries.len() > max {
			entries.pop_front();
		}
	}

	#[cfg(test)]
	pub(crate) fn len(&self) -> usize {
		self
			.entries
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.len()
	}
}
