// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for telemetry core types.

use thiserror::Error;

/// Errors that can occur when parsing or encoding telemetry types.
#[derive(Debug, Error)]
pub enum CoreError {
	#[error("invalid breadcrumb level: {0}")]
	InvalidBreadcrumbLevel(String),

	#[error("invalid breadcrumb category: {0}")]
	InvalidBreadcrumbCategory(String),

	#[error("invalid severity: {0}")]
	InvalidSeverity(String),

	#[error("invalid event category: {0}")]
	InvalidEventCategory(String),

	#[error("invalid environment: {0}")]
	InvalidEnvironment(String),

	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
