// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use ticket_warden::config::{load_dotenv, parse_config};
use ticket_warden::discord::{run_bot, set_up_client};
use ticket_warden::web::run_server_task;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> miette::Result<()> {
	load_dotenv()?;
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.init();

	let config = parse_config().await?;
	let http_client = set_up_client(&config);

	tokio::spawn(run_server_task(config.listen_port));
	run_bot(config, http_client).await
}
