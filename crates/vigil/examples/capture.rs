// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Example: capture errors and analytics with the vigil SDK.
//!
//! Run with:
//!   VIGIL_ENDPOINT=http://localhost:8080 cargo run --example capture -p vigil

use std::time::Duration;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use vigil::{
	Breadcrumb, BreadcrumbCategory, BreadcrumbLevel, CaptureContext, Monitor, MonitorConfig,
	NavigationKind, Properties, Severity, UserContext,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let endpoint =
		std::env::var("VIGIL_ENDPOINT").unwrap_or_else(|_| "http://localhost:8080".to_string());

	println!("Initializing monitor...");
	println!("  Endpoint: {}", endpoint);

	let monitor = Monitor::builder()
		.endpoint(&endpoint)
		.initial_route("/")
		.build()?;
	monitor.initialize(MonitorConfig {
		build_version: Some("0.1.0-example".to_string()),
		flush_interval: Duration::from_secs(5),
		..Default::default()
	});

	// Whatever is still queued is sent by beacon when main returns
	let _unload = monitor.unload_guard();

	tracing_subscriber::registry()
		.with(tracing_subscriber::fmt::layer())
		.with(monitor.layer())
		.init();

	monitor.set_user(UserContext {
		id: Some("user_example_123".to_string()),
		email: Some("example@example.com".to_string()),
		role: Some("customer".to_string()),
		permissions: None,
	});
	monitor.set_tag("example", "true");

	monitor.add_breadcrumb(Breadcrumb::new(BreadcrumbCategory::Ui, "Application started"));
	monitor.navigate("/providers/plumbing", NavigationKind::Push);
	monitor.capture_message("Search returned no providers", BreadcrumbLevel::Warning);
	tracing::warn!(target: "example::search", radius_km = 5, "widening search radius");

	monitor.track_event(
		"signup_clicked",
		Properties::new().insert("plan", "pro"),
		None,
	);

	{
		let _timer = monitor.track_task("render_results");
		std::thread::sleep(Duration::from_millis(80));
	}

	let failure = std::io::Error::new(std::io::ErrorKind::TimedOut, "booking service timed out");
	let id = monitor.capture_error_with(
		&failure,
		CaptureContext::new()
			.severity(Severity::Critical)
			.component("BookingForm"),
	);
	println!("\nCaptured report: {:?}", id);

	tracing::error!(target: "example::booking", "slot no longer available");

	match monitor.flush().await {
		Ok(()) => println!("Flush complete."),
		Err(e) => println!("Flush failed, items kept for retry: {}", e),
	}

	println!(
		"Queued after flush: {} errors, {} events",
		monitor.queued_errors().len(),
		monitor.queued_events().len()
	);

	Ok(())
}
