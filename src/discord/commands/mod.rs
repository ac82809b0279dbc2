// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::Desk;
use miette::bail;
use std::sync::Arc;
use twilight_http::client::Client;
use twilight_model::application::command::Command;
use twilight_model::application::interaction::application_command::CommandData;
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::id::Id;
use twilight_model::id::marker::ApplicationMarker;

mod close;
mod panel;

pub fn command_definitions() -> Vec<Command> {
	vec![close::command_definition(), panel::command_definition()]
}

pub async fn route_command(
	interaction: &InteractionCreate,
	command_data: &CommandData,
	http_client: &Client,
	application_id: Id<ApplicationMarker>,
	desk: &Arc<Desk>,
) -> miette::Result<()> {
	match command_data.name.as_str() {
		"close" => close::handle_command(interaction, command_data, http_client, application_id, desk).await,
		"panel" => panel::handle_command(interaction, http_client, application_id, desk).await,
		_ => bail!("Unknown command encountered: {}\n{:?}", command_data.name, command_data),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn registers_panel_and_close() {
		let names: Vec<String> = command_definitions()
			.into_iter()
			.map(|command| command.name)
			.collect();
		assert_eq!(names, ["close", "panel"]);
	}
}
