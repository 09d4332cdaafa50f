// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The monitor facade: one instance per process, passed to call sites.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};
use vigil_core::{
	is_valid_tag_key, new_id, AnalyticsEvent, AttributeFingerprint, Breadcrumb, BreadcrumbCategory,
	BreadcrumbLevel, EnvironmentAttributes, ErrorDetails, ErrorReport, EventCategory,
	FingerprintStrategy, Severity, UserContext,
};

use crate::breadcrumbs::BreadcrumbRecorder;
use crate::buffer::TelemetryBuffer;
use crate::config::{MonitorConfig, DEFAULT_MAX_BREADCRUMBS, DEFAULT_MAX_BUFFER_SIZE};
use crate::error::{MonitorError, Result};
use crate::hooks::console::MonitorLayer;
use crate::hooks::navigation::NavigationTracker;
use crate::hooks::network::ResourceLog;
use crate::hooks::performance::{NoopProbe, PerformanceProbe};
use crate::hooks::{default_hooks, guarded, CaptureGuard};
use crate::properties::Properties;
use crate::report::{CaptureContext, CaptureKind, ReportBuilder};
use crate::scope::{Scope, ScopePersistence};
use crate::transport::{HttpTransport, Transport};

/// Event name used by [`Monitor::track_page_view`].
pub const PAGE_VIEW_EVENT: &str = "page_view";
/// Event name used by [`Monitor::track_user_action`].
pub const USER_ACTION_EVENT: &str = "user_action";

/// Builder for constructing a [`Monitor`].
#[derive(Default)]
pub struct MonitorBuilder {
	transport: Option<Arc<dyn Transport>>,
	endpoint: Option<String>,
	persistence: Option<Arc<dyn ScopePersistence>>,
	probe: Option<Arc<dyn PerformanceProbe>>,
	fingerprint: Option<Arc<dyn FingerprintStrategy>>,
	attributes: Option<EnvironmentAttributes>,
	initial_route: Option<String>,
	referrer: Option<String>,
}

impl MonitorBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the transport used for flushing. Takes precedence over [`endpoint`](Self::endpoint).
	pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
		self.transport = Some(transport);
		self
	}

	/// Sets the collector base URL for the built-in HTTP transport.
	///
	/// Example: `https://collector.example.com`
	pub fn endpoint(mut self, base_url: impl Into<String>) -> Self {
		self.endpoint = Some(base_url.into());
		self
	}

	/// Persists tags and context so they survive a restart.
	pub fn persistence(mut self, persistence: Arc<dyn ScopePersistence>) -> Self {
		self.persistence = Some(persistence);
		self
	}

	pub fn probe(mut self, probe: Arc<dyn PerformanceProbe>) -> Self {
		self.probe = Some(probe);
		self
	}

	pub fn fingerprint_strategy(mut self, strategy: Arc<dyn FingerprintStrategy>) -> Self {
		self.fingerprint = Some(strategy);
		self
	}

	/// Overrides the detected environment attributes.
	pub fn attributes(mut self, attributes: EnvironmentAttributes) -> Self {
		self.attributes = Some(attributes);
		self
	}

	/// Route the host starts on; reported as `metadata.url` until the first navigation.
	pub fn initial_route(mut self, route: impl Into<String>) -> Self {
		self.initial_route = Some(route.into());
		self
	}

	pub fn referrer(mut self, referrer: impl Into<String>) -> Self {
		self.referrer = Some(referrer.into());
		self
	}

	/// Builds an uninitialized monitor.
	pub fn build(self) -> Result<Monitor> {
		let transport: Arc<dyn Transport> = match (self.transport, self.endpoint) {
			(Some(transport), _) => transport,
			(None, Some(endpoint)) => Arc::new(HttpTransport::new(endpoint)?),
			(None, None) => return Err(MonitorError::MissingTransport),
		};

		let config = MonitorConfig::default();
		let inner = Arc::new(MonitorInner {
			session_id: new_id(),
			initialized: AtomicBool::new(false),
			init_lock: Mutex::new(()),
			breadcrumbs: BreadcrumbRecorder::new(DEFAULT_MAX_BREADCRUMBS),
			buffer: Arc::new(TelemetryBuffer::new(transport, DEFAULT_MAX_BUFFER_SIZE)),
			scope: Scope::new(self.persistence),
			navigation: NavigationTracker::new(self.initial_route, self.referrer),
			resources: ResourceLog::new(config.resource_timing_limit),
			probe: self.probe.unwrap_or_else(|| Arc::new(NoopProbe)),
			fingerprint: self
				.fingerprint
				.unwrap_or_else(|| Arc::new(AttributeFingerprint)),
			attributes: self.attributes.unwrap_or_else(EnvironmentAttributes::detect),
			config: RwLock::new(config),
			started_at: Utc::now(),
			started: Instant::now(),
		});

		debug!(session_id = %inner.session_id, "Monitor created");

		Ok(Monitor { inner })
	}
}

/// Shared monitor state.
pub(crate) struct MonitorInner {
	pub(crate) session_id: String,
	initialized: AtomicBool,
	init_lock: Mutex<()>,
	pub(crate) config: RwLock<MonitorConfig>,
	pub(crate) breadcrumbs: BreadcrumbRecorder,
	pub(crate) buffer: Arc<TelemetryBuffer>,
	pub(crate) scope: Scope,
	pub(crate) navigation: NavigationTracker,
	pub(crate) resources: ResourceLog,
	pub(crate) probe: Arc<dyn PerformanceProbe>,
	pub(crate) fingerprint: Arc<dyn FingerprintStrategy>,
	pub(crate) attributes: EnvironmentAttributes,
	pub(crate) started_at: DateTime<Utc>,
	pub(crate) started: Instant,
}

/// Client-side error and analytics monitor.
///
/// A monitor is created uninitialized: captures and analytics are buffered
/// but no hooks are installed and nothing is flushed. [`initialize`](Self::initialize)
/// applies the configuration, installs hooks and starts the periodic flush.
/// There is no way back to the uninitialized state; background tasks end
/// once every handle has been dropped.
///
/// # Example
///
/// ```ignore
/// use vigil::{Monitor, MonitorConfig};
///
/// let monitor = Monitor::builder()
///     .endpoint("https://collector.example.com")
///     .initial_route("/")
///     .build()?;
/// monitor.initialize(MonitorConfig::default());
///
/// // Route log events through the monitor
/// tracing_subscriber::registry()
///     .with(tracing_subscriber::fmt::layer())
///     .with(monitor.layer())
///     .init();
///
/// monitor.set_user(UserContext::with_id(user.id.to_string()));
///
/// if let Err(e) = checkout(&cart).await {
///     monitor.capture_error(&e);
/// }
///
/// monitor.track_event("signup_clicked", Properties::new().insert("plan", "pro"), None);
/// ```
#[derive(Clone)]
pub struct Monitor {
	pub(crate) inner: Arc<MonitorInner>,
}

impl Monitor {
	pub fn builder() -> MonitorBuilder {
		MonitorBuilder::new()
	}

	pub(crate) fn from_inner(inner: Arc<MonitorInner>) -> Self {
		Self { inner }
	}

	/// Applies `config`, installs capture hooks and starts the periodic flush.
	///
	/// Only the first call has any effect; later calls return `false`.
	/// Without a tokio runtime the periodic flush is not started and
	/// [`flush`](Self::flush) has to be called explicitly.
	pub fn initialize(&self, config: MonitorConfig) -> bool {
		let _init = self
			.inner
			.init_lock
			.lock()
			.unwrap_or_else(PoisonError::into_inner);
		if self.is_initialized() {
			debug!("Monitor already initialized; ignoring configuration");
			return false;
		}

		let config = config.normalized();
		self.inner.breadcrumbs.set_max(config.max_breadcrumbs);
		self
			.inner
			.buffer
			.set_max_buffer_size(config.max_buffer_size);
		self
			.inner
			.resources
			.set_capacity(config.resource_timing_limit);
		let flush_interval = config.flush_interval;
		let environment = config.resolved_environment();
		*self
			.inner
			.config
			.write()
			.unwrap_or_else(PoisonError::into_inner) = config;
		self.inner.initialized.store(true, Ordering::Release);

		self.install_hooks();

		match Handle::try_current() {
			Ok(handle) => {
				self.inner.buffer.spawn_flush_loop(&handle, flush_interval);
			}
			Err(_) => {
				warn!("No tokio runtime available; periodic flush disabled, call flush() explicitly");
			}
		}

		info!(
			session_id = %self.inner.session_id,
			environment = %environment,
			"Monitor initialized"
		);
		true
	}

	fn install_hooks(&self) {
		let config = self.config();
		for hook in default_hooks() {
			let name = hook.name();
			if !hook.enabled(&config) {
				debug!(hook = name, "Hook disabled by configuration");
				continue;
			}
			match hook.install(self) {
				Ok(()) => debug!(hook = name, "Hook installed"),
				Err(e @ MonitorError::HookUnavailable { .. }) => {
					debug!(hook = name, reason = %e, "Hook not available; skipping");
				}
				Err(e) => warn!(hook = name, error = %e, "Failed to install hook; skipping"),
			}
		}
	}

	pub fn is_initialized(&self) -> bool {
		self.inner.initialized.load(Ordering::Acquire)
	}

	/// Identifier generated once per monitor, attached to every report and event.
	pub fn session_id(&self) -> &str {
		&self.inner.session_id
	}

	/// Current configuration (defaults until initialized).
	pub fn config(&self) -> MonitorConfig {
		self
			.inner
			.config
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.clone()
	}

	/// Returns a tracing layer that routes log events into this monitor.
	pub fn layer(&self) -> MonitorLayer {
		MonitorLayer::new(self.clone())
	}

	// Breadcrumbs

	pub fn add_breadcrumb(&self, breadcrumb: Breadcrumb) {
		self.inner.breadcrumbs.add(breadcrumb);
	}

	/// Copy of the breadcrumb trail, oldest first.
	pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
		self.inner.breadcrumbs.snapshot()
	}

	pub fn clear_breadcrumbs(&self) {
		self.inner.breadcrumbs.clear();
	}

	/// Records a message as a breadcrumb. No report is produced.
	pub fn capture_message(&self, message: impl Into<String>, level: BreadcrumbLevel) {
		self.add_breadcrumb(Breadcrumb::new(BreadcrumbCategory::Debug, message).with_level(level));
	}

	// Error capture

	/// Captures an error. Returns the report id, or `None` if the report was
	/// discarded.
	pub fn capture_error<E>(&self, error: &E) -> Option<String>
	where
		E: std::error::Error + 'static,
	{
		self.capture_error_with(error, CaptureContext::default())
	}

	pub fn capture_error_with<E>(&self, error: &E, capture: impl Into<CaptureContext>) -> Option<String>
	where
		E: std::error::Error + 'static,
	{
		self.capture_details(ErrorDetails::from_error(error), capture)
	}

	/// Captures a type-erased error such as a `Box<dyn Error>` or `anyhow` root.
	pub fn capture_dyn(
		&self,
		error: &(dyn std::error::Error + 'static),
		capture: impl Into<CaptureContext>,
	) -> Option<String> {
		self.capture_details(ErrorDetails::from_dyn(error), capture)
	}

	/// Captures a value that is not an error type, wrapped as a
	/// `NonErrorException`.
	pub fn capture_exception(&self, value: &dyn fmt::Debug) -> Option<String> {
		self.capture_exception_with(value, CaptureContext::default())
	}

	pub fn capture_exception_with(
		&self,
		value: &dyn fmt::Debug,
		capture: impl Into<CaptureContext>,
	) -> Option<String> {
		self.capture_details(ErrorDetails::non_error(value), capture)
	}

	/// Captures pre-built error details.
	pub fn capture_details(
		&self,
		error: ErrorDetails,
		capture: impl Into<CaptureContext>,
	) -> Option<String> {
		self.capture_with(error, capture.into(), CaptureKind::Manual)
	}

	/// Builds, filters and queues one report.
	///
	/// Returns `None` when re-entered from inside a capture on the same
	/// thread or when `before_send` discards the report.
	pub(crate) fn capture_with(
		&self,
		error: ErrorDetails,
		capture: CaptureContext,
		kind: CaptureKind,
	) -> Option<String> {
		let _guard = CaptureGuard::enter()?;
		let config = self.config();

		let report = ReportBuilder::new(&self.inner, &config).build(error, capture, kind);

		let report = match &config.before_send {
			Some(before_send) => {
				let fallback = report.clone();
				match guarded("before_send", || before_send(report)) {
					Some(Some(report)) => report,
					Some(None) => {
						debug!(report_id = %fallback.id, "Report discarded by before_send");
						return None;
					}
					None => fallback,
				}
			}
			None => report,
		};

		let id = report.id.clone();
		let severity = report.metadata.severity;
		debug!(report_id = %id, severity = %severity, kind = kind.as_str(), "Captured error");
		match &config.on_error {
			Some(on_error) => {
				self.inner.buffer.push_error(report.clone());
				guarded("on_error", || on_error(&report));
			}
			None => self.inner.buffer.push_error(report),
		}

		if severity == Severity::Critical {
			// Uninitialized monitors only buffer; the request waits for the flush loop.
			if self.is_initialized() {
				self.inner.buffer.flush_now();
			} else {
				self.inner.buffer.request_flush();
			}
		}

		Some(id)
	}

	// Scope

	/// Sets the user identity for subsequent reports and events.
	pub fn set_user(&self, user: UserContext) {
		let data = json!({ "id": user.id, "role": user.role });
		self.inner.scope.set_user(Some(user));
		self.add_breadcrumb(
			Breadcrumb::new(BreadcrumbCategory::User, "User context updated").with_data(data),
		);
	}

	pub fn clear_user(&self) {
		self.inner.scope.set_user(None);
	}

	pub fn user(&self) -> Option<UserContext> {
		self.inner.scope.user()
	}

	/// Sets a tag merged into every later report.
	///
	/// Keys are sent as `key:value`, so a key that is empty or contains `:`
	/// is ignored.
	pub fn set_tag(&self, key: impl Into<String>, value: impl Into<String>) {
		let key = key.into();
		if !is_valid_tag_key(&key) {
			warn!(tag = %key, "Ignoring tag with invalid key");
			return;
		}
		self.inner.scope.set_tag(key, value.into());
	}

	pub fn remove_tag(&self, key: &str) {
		self.inner.scope.remove_tag(key);
	}

	pub fn set_context(&self, key: impl Into<String>, value: impl Into<Value>) {
		self.inner.scope.set_context(key.into(), value.into());
	}

	pub fn clear_context(&self) {
		self.inner.scope.clear_context();
	}

	// Analytics

	/// Queues an analytics event and records an `Event: {name}` breadcrumb.
	///
	/// `user_id` defaults to the current user.
	pub fn track_event(
		&self,
		name: impl Into<String>,
		properties: impl Into<Properties>,
		user_id: Option<String>,
	) {
		self.enqueue_event(name.into(), properties.into(), user_id, EventCategory::User);
	}

	/// Queues a `page_view` event for `page`, or the current route.
	pub fn track_page_view(&self, page: Option<&str>) {
		let page = page.map(str::to_string).or_else(|| self.current_route());
		let properties = Properties::new()
			.insert_opt("page", page)
			.insert_opt("referrer", self.inner.navigation.referrer());
		self.enqueue_event(PAGE_VIEW_EVENT.to_string(), properties, None, EventCategory::User);
	}

	/// Queues a `user_action` event describing an interaction.
	pub fn track_user_action(
		&self,
		action: &str,
		target: Option<&str>,
		properties: impl Into<Properties>,
	) {
		let properties = Properties::new()
			.insert("action", action)
			.insert_opt("target", target)
			.merge(properties.into());
		self.enqueue_event(USER_ACTION_EVENT.to_string(), properties, None, EventCategory::User);
	}

	fn enqueue_event(
		&self,
		name: String,
		properties: Properties,
		user_id: Option<String>,
		category: EventCategory,
	) {
		if !self.config().enable_user_tracking {
			return;
		}

		let event = AnalyticsEvent {
			id: new_id(),
			name,
			timestamp: Utc::now(),
			properties: properties.into_map(),
			user_id: user_id.or_else(|| self.user().and_then(|u| u.id)),
			session_id: self.inner.session_id.clone(),
			page: self.current_route(),
			category,
		};

		self.add_breadcrumb(Breadcrumb::new(
			BreadcrumbCategory::User,
			format!("Event: {}", event.name),
		));
		self.inner.buffer.push_event(event);
	}

	/// Records a user interaction as a `user` breadcrumb.
	///
	/// Ignored unless DOM capture is enabled.
	pub fn record_interaction(&self, action: &str, target: &str) {
		if !self.is_initialized() || !self.config().enable_dom_capture {
			return;
		}
		self.add_breadcrumb(
			Breadcrumb::new(BreadcrumbCategory::User, format!("{action} on {target}"))
				.with_data(json!({ "action": action, "target": target })),
		);
	}

	// Delivery

	/// Sends everything queued now, independent of the periodic flush.
	///
	/// On failure the items stay queued for the next attempt.
	pub async fn flush(&self) -> Result<()> {
		self.inner.buffer.flush().await
	}

	/// Hands a copy of everything queued to the transport's beacon primitive.
	///
	/// The queues are left as they are, so a flush already in flight may
	/// deliver the same items again. Returns `true` if the beacon was accepted.
	pub fn unload(&self) -> bool {
		let batch = self.inner.buffer.snapshot();
		if batch.is_empty() {
			return false;
		}

		let delivered = self.inner.buffer.transport().send_beacon(&batch);
		if delivered {
			debug!(items = batch.len(), "Delivered pending telemetry by beacon");
		} else {
			debug!(items = batch.len(), "Beacon delivery unavailable; items remain queued");
		}
		delivered
	}

	/// Returns a guard that calls [`unload`](Self::unload) when dropped.
	///
	/// Hold it in `main` so pending telemetry is sent on the way out, including
	/// when unwinding from a panic.
	pub fn unload_guard(&self) -> UnloadGuard {
		UnloadGuard {
			monitor: self.clone(),
		}
	}

	/// Copy of the queued error reports.
	pub fn queued_errors(&self) -> Vec<ErrorReport> {
		self.inner.buffer.errors()
	}

	/// Copy of the queued analytics events.
	pub fn queued_events(&self) -> Vec<AnalyticsEvent> {
		self.inner.buffer.events()
	}
}

impl fmt::Debug for Monitor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Monitor")
			.field("session_id", &self.inner.session_id)
			.field("initialized", &self.is_initialized())
			.finish()
	}
}

/// Sends pending telemetry by beacon when dropped.
#[must_use = "pending telemetry is sent when the guard is dropped"]
pub struct UnloadGuard {
	monitor: Monitor,
}

impl Drop for UnloadGuard {
	fn drop(&mut self) {
		self.monitor.unload();
	}
}
