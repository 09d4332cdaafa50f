// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client-side error and analytics monitoring SDK.
//!
//! A [`Monitor`] records breadcrumbs, captures errors into reports enriched
//! with user, scope and performance context, queues analytics events, and
//! flushes both to a collector in batches. It never surfaces its own failures
//! to the host: captures return an optional report id and delivery problems
//! are only logged.
//!
//! # Quick start
//!
//! ```ignore
//! use vigil::{Monitor, MonitorConfig, Properties, Severity, CaptureContext};
//!
//! let monitor = Monitor::builder()
//!     .endpoint("https://collector.example.com")
//!     .build()?;
//! monitor.initialize(MonitorConfig::default());
//! let _unload = monitor.unload_guard();
//!
//! tracing_subscriber::registry()
//!     .with(tracing_subscriber::fmt::layer())
//!     .with(monitor.layer())
//!     .init();
//!
//! monitor.capture_error_with(&err, CaptureContext::new().severity(Severity::Critical));
//! monitor.track_event("signup_clicked", Properties::new().insert("plan", "pro"), None);
//! ```
//!
//! # Capture hooks
//!
//! | Signal | Entry point |
//! |--------|-------------|
//! | Uncaught panic | panic hook installed by [`Monitor::initialize`] |
//! | Failed spawned task | [`Monitor::spawn`], [`Monitor::report_rejection`] |
//! | Log events | [`Monitor::layer`] |
//! | Route changes | [`Monitor::navigate`] |
//! | Long tasks | [`Monitor::track_task`], [`Monitor::record_task`] |
//! | Memory pressure | [`PerformanceProbe`] polled in the background |
//! | Outbound requests | [`Monitor::observe_request`], [`Monitor::http_client`] |
//! | User interactions | [`Monitor::record_interaction`] |
//! | Shutdown | [`Monitor::unload`], [`UnloadGuard`] |

mod breadcrumbs;
mod buffer;
pub mod config;
pub mod error;
pub mod hooks;
mod monitor;
mod properties;
mod report;
pub mod scope;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use config::MonitorConfig;
pub use error::{MonitorError, Result};
pub use hooks::console::MonitorLayer;
pub use hooks::navigation::NavigationKind;
pub use hooks::network::{HttpStatus, MonitoredClient};
pub use hooks::performance::{NoopProbe, PerformanceProbe, TaskTimer};
pub use monitor::{Monitor, MonitorBuilder, UnloadGuard, PAGE_VIEW_EVENT, USER_ACTION_EVENT};
pub use properties::Properties;
pub use report::{CaptureContext, CaptureKind, SDK_NAME, SDK_VERSION};
pub use scope::{FilePersistence, MemoryPersistence, ScopePersistence};
pub use transport::{HttpTransport, Transport};

pub use vigil_core::{
	AnalyticsEvent, Breadcrumb, BreadcrumbCategory, BreadcrumbLevel, Environment,
	EnvironmentAttributes, ErrorContext, ErrorDetails, ErrorMetadata, ErrorReport, EventCategory,
	FingerprintStrategy, MemoryStats, PerformanceSnapshot, ResourceTiming, Severity, TelemetryBatch,
	UserContext,
};
