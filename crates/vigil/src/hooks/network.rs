// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Outbound request observation.
//!
//! Requests are observed, never altered: the caller gets back exactly the
//! response or error the underlying client produced.

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use reqwest::{Client, IntoUrl, Method, Request, RequestBuilder, Response};
use serde_json::json;
use vigil_core::{Breadcrumb, BreadcrumbCategory, BreadcrumbLevel, ResourceTiming};

use crate::monitor::Monitor;

/// Extracts an HTTP status from a successful request outcome.
pub trait HttpStatus {
	fn http_status(&self) -> Option<u16>;
}

impl HttpStatus for Response {
	fn http_status(&self) -> Option<u16> {
		Some(self.status().as_u16())
	}
}

impl HttpStatus for reqwest::blocking::Response {
	fn http_status(&self) -> Option<u16> {
		Some(self.status().as_u16())
	}
}

impl HttpStatus for reqwest::StatusCode {
	fn http_status(&self) -> Option<u16> {
		Some(self.as_u16())
	}
}

impl HttpStatus for u16 {
	fn http_status(&self) -> Option<u16> {
		Some(*self)
	}
}

/// Most recent resource timings, oldest evicted first.
#[derive(Debug)]
pub(crate) struct ResourceLog {
	entries: Mutex<VecDeque<ResourceTiming>>,
	capacity: AtomicUsize,
}

impl ResourceLog {
	pub(crate) fn new(capacity: usize) -> Self {
		Self {
			entries: Mutex::new(VecDeque::new()),
			capacity: AtomicUsize::new(capacity),
		}
	}

	pub(crate) fn set_capacity(&self, capacity: usize) {
		self.capacity.store(capacity, Ordering::Relaxed);
		let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
		while entries.len() > capacity {
			entries.pop_front();
		}
	}

	pub(crate) fn push(&self, timing: ResourceTiming) {
		let capacity = self.capacity.load(Ordering::Relaxed);
		let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
		entries.push_back(timing);
		while entries.len() > capacity {
			entries.pop_front();
		}
	}

	pub(crate) fn snapshot(&self) -> Vec<ResourceTiming> {
		self
			.entries
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.iter()
			.cloned()
			.collect()
	}
}

enum Outcome {
	Status(Option<u16>),
	Failed(String),
}

impl Monitor {
	/// Awaits `request`, recording an `http` breadcrumb and a resource timing
	/// for it, and returns its result unchanged.
	pub async fn observe_request<F, T, E>(&self, method: &str, url: &str, request: F) -> Result<T, E>
	where
		F: Future<Output = Result<T, E>>,
		T: HttpStatus,
		E: fmt::Display,
	{
		let started_at = Utc::now();
		let started = Instant::now();
		let result = request.await;

		let outcome = match &result {
			Ok(response) => Outcome::Status(response.http_status()),
			Err(e) => Outcome::Failed(e.to_string()),
		};
		self.record_request(method, url, started_at, started.elapsed(), outcome);

		result
	}

	/// Wraps a `reqwest` client so that every request it sends is observed.
	pub fn http_client(&self, client: Client) -> MonitoredClient {
		MonitoredClient {
			client,
			monitor: self.clone(),
		}
	}

	fn record_request(
		&self,
		method: &str,
		url: &str,
		started_at: DateTime<Utc>,
		duration: Duration,
		outcome: Outcome,
	) {
		if !self.is_initialized() || !self.config().enable_network_capture {
			return;
		}

		let duration_ms = duration.as_millis() as u64;
		let (breadcrumb, status) = match outcome {
			Outcome::Status(status) => {
				let level = match status {
					Some(code) if code >= 400 => BreadcrumbLevel::Warning,
					_ => BreadcrumbLevel::Info,
				};
				let message = match status {
					Some(code) => format!("{method} {url} [{code}]"),
					None => format!("{method} {url}"),
				};
				let data = json!({
					"method": method,
					"url": url,
					"status": status,
					"duration_ms": duration_ms,
				});
				(
					Breadcrumb::new(BreadcrumbCategory::Http, message)
						.with_level(level)
						.with_data(data),
					status,
				)
			}
			Outcome::Failed(error) => {
				let data = json!({
					"method": method,
					"url": url,
					"error": error,
					"duration_ms": duration_ms,
				});
				(
					Breadcrumb::new(BreadcrumbCategory::Http, format!("{method} {url} failed"))
						.with_level(BreadcrumbLevel::Error)
						.with_data(data),
					None,
				)
			}
		};

		self.add_breadcrumb(breadcrumb);
		self.inner.resources.push(ResourceTiming {
			name: url.to_string(),
			method: method.to_string(),
			start_time: started_at,
			duration_ms,
			status,
		});
	}
}

/// A `reqwest::Client` whose requests are recorded by the monitor.
#[derive(Clone)]
pub struct MonitoredClient {
	client: Client,
	monitor: Monitor,
}

impl MonitoredClient {
	/// The wrapped client, for requests that should not be observed.
	pub fn inner(&self) -> &Client {
		&self.client
	}

	pub fn request<U: IntoUrl>(&self, method: Method, url: U) -> RequestBuilder {
		self.client.request(method, url)
	}

	pub fn get<U: IntoUrl>(&self, url: U) -> RequestBuilder {
		self.client.get(url)
	}

	pub fn post<U: IntoUrl>(&self, url: U) -> RequestBuilder {
		self.client.post(url)
	}

	/// Builds and sends `builder`. Build failures are returned without being
	/// recorded, since no request was made.
	pub async fn send(&self, builder: RequestBuilder) -> reqwest::Result<Response> {
		let request = builder.build()?;
		self.execute(request).await
	}

	pub async fn execute(&self, request: Request) -> reqwest::Result<Response> {
		let method = request.method().to_string();
		let url = request.url().to_string();
		self
			.monitor
			.observe_request(&method, &url, self.client.execute(request))
			.await
	}
}
