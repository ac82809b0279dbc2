// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use axum::{Json, Router};
use axum::routing::get;
use miette::IntoDiagnostic;
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

#[derive(Debug, Serialize)]
struct HealthResponse {
	status: &'static str,
}

/// Gets the router answering uptime checks from external monitoring
pub fn uptime_router() -> Router {
	Router::new()
		.route("/", get(root))
		.route("/health", get(health))
		.layer(TraceLayer::new_for_http())
}

async fn root() -> &'static str {
	"Ticket bot is running!"
}

async fn health() -> Json<HealthResponse> {
	Json(HealthResponse { status: "ok" })
}

/// Serves the uptime endpoint until the process exits. Failures are logged; they don't stop the bot.
pub async fn run_server_task(port: u16) {
	let task_result = run_server(port).await;
	if let Err(error) = task_result {
		tracing::error!(source = ?error, "Web server failed to run");
	}
}

async fn run_server(port: u16) -> miette::Result<()> {
	let app = uptime_router();

	let listener = TcpListener::bind(("0.0.0.0", port)).await.into_diagnostic()?;
	tracing::info!(address = ?listener.local_addr().into_diagnostic()?, "Uptime endpoint listening");
	axum::serve(listener, app.into_make_service()).await.into_diagnostic()?;

	Ok(())
}
