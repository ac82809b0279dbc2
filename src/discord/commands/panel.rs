// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::Desk;
use crate::discord::utils::components::{category_select, panel_embed};
use miette::IntoDiagnostic;
use twilight_http::client::Client;
use twilight_model::application::command::{Command, CommandType};
use twilight_model::application::interaction::InteractionContextType;
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::guild::Permissions;
use twilight_model::http::interaction::{InteractionResponse, InteractionResponseType};
use twilight_model::id::Id;
use twilight_model::id::marker::ApplicationMarker;
use twilight_util::builder::InteractionResponseDataBuilder;
use twilight_util::builder::command::CommandBuilder;

pub fn command_definition() -> Command {
	CommandBuilder::new("panel", "Send the ticket panel", CommandType::ChatInput)
		.contexts([InteractionContextType::Guild])
		.default_member_permissions(Permissions::MANAGE_CHANNELS)
		.build()
}

pub async fn handle_command(
	interaction: &InteractionCreate,
	http_client: &Client,
	application_id: Id<ApplicationMarker>,
	desk: &Desk,
) -> miette::Result<()> {
	let embed = panel_embed().into_diagnostic()?;
	let response = InteractionResponseDataBuilder::new()
		.embeds([embed])
		.components([category_select(desk.categories())])
		.build();
	let response = InteractionResponse {
		kind: InteractionResponseType::ChannelMessageWithSource,
		data: Some(response),
	};
	http_client
		.interaction(application_id)
		.create_response(interaction.id, &interaction.token, &response)
		.await
		.into_diagnostic()?;

	tracing::info!(channel = ?interaction.channel.as_ref().map(|channel| channel.id), "Ticket panel posted");
	Ok(())
}
