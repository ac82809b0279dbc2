// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::Desk;
use crate::discord::interactions::manage_ticket::close_ticket;
use miette::bail;
use std::sync::Arc;
use twilight_http::client::Client;
use twilight_model::application::command::{Command, CommandType};
use twilight_model::application::interaction::InteractionContextType;
use twilight_model::application::interaction::application_command::{CommandData, CommandOptionValue};
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::id::Id;
use twilight_model::id::marker::ApplicationMarker;
use twilight_util::builder::command::{CommandBuilder, StringBuilder};

pub fn command_definition() -> Command {
	let reason = StringBuilder::new("reason", "Why the ticket is being closed")
		.required(false)
		.max_length(1000)
		.build();
	CommandBuilder::new("close", "Close the current ticket", CommandType::ChatInput)
		.contexts([InteractionContextType::Guild])
		.option(reason)
		.build()
}

pub async fn handle_command(
	interaction: &InteractionCreate,
	command_data: &CommandData,
	http_client: &Client,
	application_id: Id<ApplicationMarker>,
	desk: &Arc<Desk>,
) -> miette::Result<()> {
	let mut reason: Option<&str> = None;
	for option in command_data.options.iter() {
		match (option.name.as_str(), &option.value) {
			("reason", CommandOptionValue::String(value)) => reason = Some(value.as_str()),
			_ => bail!("Unexpected option for close command: {:?}", option),
		}
	}

	close_ticket(interaction, http_client, application_id, desk, reason).await
}
