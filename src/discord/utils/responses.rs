// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use miette::IntoDiagnostic;
use twilight_http::client::Client;
use twilight_model::channel::message::MessageFlags;
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::http::interaction::{InteractionResponse, InteractionResponseType};
use twilight_model::id::Id;
use twilight_model::id::marker::ApplicationMarker;
use twilight_util::builder::InteractionResponseDataBuilder;

pub const GENERIC_FAILURE: &str = "❌ Something went wrong handling that. Please try again later.";
pub const NOT_A_TICKET_CHANNEL: &str = "❌ This is not a ticket channel.";
pub const NO_CLAIM_PERMISSION: &str = "❌ You do not have permission to claim tickets.";
pub const NO_CLOSE_PERMISSION: &str = "❌ You do not have permission to close tickets.";
pub const ALREADY_CLOSING: &str = "This ticket is already being closed.";
pub const TICKET_CREATION_EXPIRED: &str = "Ticket creation expired. Please choose a category from the panel again.";

/// Builds an interaction response with a message only the user who triggered the interaction can see.
pub fn ephemeral_message(content: &str) -> InteractionResponse {
	let response = InteractionResponseDataBuilder::new()
		.content(content)
		.flags(MessageFlags::EPHEMERAL)
		.build();
	InteractionResponse {
		kind: InteractionResponseType::ChannelMessageWithSource,
		data: Some(response),
	}
}

/// Builds a response acknowledging the interaction, to be followed by an edit of the (ephemeral) original response.
pub fn deferred_ephemeral() -> InteractionResponse {
	let response = InteractionResponseDataBuilder::new()
		.flags(MessageFlags::EPHEMERAL)
		.build();
	InteractionResponse {
		kind: InteractionResponseType::DeferredChannelMessageWithSource,
		data: Some(response),
	}
}

pub async fn respond_ephemeral(
	interaction: &InteractionCreate,
	http_client: &Client,
	application_id: Id<ApplicationMarker>,
	content: &str,
) -> miette::Result<()> {
	let response = ephemeral_message(content);
	http_client
		.interaction(application_id)
		.create_response(interaction.id, &interaction.token, &response)
		.await
		.into_diagnostic()?;
	Ok(())
}

/// Acknowledges the interaction with an ephemeral "thinking" state, for handlers that take a while.
pub async fn defer_ephemeral(
	interaction: &InteractionCreate,
	http_client: &Client,
	application_id: Id<ApplicationMarker>,
) -> miette::Result<()> {
	http_client
		.interaction(application_id)
		.create_response(interaction.id, &interaction.token, &deferred_ephemeral())
		.await
		.into_diagnostic()?;
	Ok(())
}

/// Replaces the deferred response's content.
pub async fn update_deferred(
	interaction: &InteractionCreate,
	http_client: &Client,
	application_id: Id<ApplicationMarker>,
	content: &str,
) -> miette::Result<()> {
	http_client
		.interaction(application_id)
		.update_response(&interaction.token)
		.content(Some(content))
		.await
		.into_diagnostic()?;
	Ok(())
}

/// Lets the user know their interaction failed. Used when handling the interaction returned an error, so the state
/// of the interaction (whether it was already responded to) isn't known.
pub async fn report_failure(interaction: &InteractionCreate, http_client: &Client, application_id: Id<ApplicationMarker>) {
	let interaction_client = http_client.interaction(application_id);
	let response = ephemeral_message(GENERIC_FAILURE);
	let initial_response = interaction_client
		.create_response(interaction.id, &interaction.token, &response)
		.await;
	if initial_response.is_ok() {
		return;
	}

	let followup = interaction_client
		.create_followup(&interaction.token)
		.content(GENERIC_FAILURE)
		.flags(MessageFlags::EPHEMERAL)
		.await;
	if let Err(error) = followup {
		tracing::warn!(source = ?error, "Couldn't report an interaction failure to the user");
	}
}
