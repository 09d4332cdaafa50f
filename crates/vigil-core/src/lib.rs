// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the vigil client telemetry SDK.
//!
//! This crate holds the data model shared by the SDK (`vigil`) and anything
//! that consumes its wire format: breadcrumbs, error reports, analytics
//! events, the batch payload and environment fingerprinting. It performs no
//! I/O.
//!
//! # Overview
//!
//! - [`Breadcrumb`]: a timestamped diagnostic event kept for context
//! - [`ErrorReport`]: one captured error with metadata, context, performance
//!   snapshot and user identity
//! - [`AnalyticsEvent`]: a product analytics event
//! - [`TelemetryBatch`]: the `{errors, analytics}` body posted to the collector
//! - [`FingerprintStrategy`]: pluggable grouping fingerprint

pub mod breadcrumb;
pub mod context;
pub mod environment;
pub mod error;
pub mod event;
pub mod fingerprint;
pub mod performance;
pub mod report;

pub use breadcrumb::{Breadcrumb, BreadcrumbCategory, BreadcrumbLevel};
pub use context::{ErrorContext, UserContext};
pub use environment::{Environment, EnvironmentAttributes};
pub use error::{CoreError, Result};
pub use event::{AnalyticsEvent, EventCategory, TelemetryBatch};
pub use fingerprint::{compute_fingerprint, AttributeFingerprint, FingerprintStrategy};
pub use performance::{MemoryStats, PerformanceSnapshot, ResourceTiming, SessionTiming};
pub use report::{
	format_tag, is_valid_tag_key, new_id, ErrorDetails, ErrorMetadata, ErrorReport, Severity,
	NON_ERROR_EXCEPTION, TAG_SEPARATOR,
};
