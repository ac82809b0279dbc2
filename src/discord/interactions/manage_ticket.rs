// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::Desk;
use crate::discord::utils::channels::interaction_channel;
use crate::discord::utils::components::{REASON_FIELD_ID, REASON_MODAL_ID, close_reason_components};
use crate::discord::utils::responses::{
	ALREADY_CLOSING, NO_CLAIM_PERMISSION, NO_CLOSE_PERMISSION, NOT_A_TICKET_CHANNEL, defer_ephemeral,
	respond_ephemeral, update_deferred,
};
use crate::discord::utils::tickets::{claimed_summary_embeds, summary_claimant, summary_controls};
use crate::discord::utils::users::interaction_actor;
use crate::tickets::lifecycle::{CLOSE_DELAY, ClaimOutcome, CloseOutcome, TicketError};
use miette::{IntoDiagnostic, bail};
use std::collections::HashMap;
use std::sync::Arc;
use twilight_http::client::Client;
use twilight_mention::fmt::Mention;
use twilight_model::channel::message::AllowedMentions;
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::http::interaction::{InteractionResponse, InteractionResponseType};
use twilight_model::id::Id;
use twilight_model::id::marker::ApplicationMarker;
use twilight_util::builder::InteractionResponseDataBuilder;

const TRANSCRIPT_FAILED: &str =
	"❌ The transcript couldn't be saved, so the ticket has been left open. Please try closing it again.";

pub async fn claim_ticket(
	interaction: &InteractionCreate,
	http_client: &Client,
	application_id: Id<ApplicationMarker>,
	desk: &Desk,
) -> miette::Result<()> {
	let actor = interaction_actor(interaction)?;
	let channel = interaction_channel(interaction, desk.platform())?;

	let Some(summary) = &interaction.message else {
		bail!("Claim button interaction didn't include its message");
	};
	// Tickets from before a restart only record their claim on the summary message.
	if let Some(claimant) = summary_claimant(&summary.embeds) {
		let message = format!("This ticket has already been claimed by {}.", claimant);
		return respond_ephemeral(interaction, http_client, application_id, &message).await;
	}

	let response = InteractionResponseDataBuilder::new()
		.embeds(claimed_summary_embeds(&summary.embeds, actor.id))
		.components(summary_controls(false))
		.allowed_mentions(AllowedMentions::default())
		.build();
	let response = InteractionResponse {
		kind: InteractionResponseType::UpdateMessage,
		data: Some(response),
	};
	let response = &response;
	let update_summary = move || async move {
		http_client
			.interaction(application_id)
			.create_response(interaction.id, &interaction.token, response)
			.await
			.into_diagnostic()
			.map(|_| ())
	};

	let rejection = match desk.claim(&channel, &actor, update_summary).await? {
		ClaimOutcome::Claimed => return Ok(()),
		ClaimOutcome::NotPermitted => String::from(NO_CLAIM_PERMISSION),
		ClaimOutcome::NotATicket => String::from(NOT_A_TICKET_CHANNEL),
		ClaimOutcome::AlreadyClaimed(claimant) => {
			format!("This ticket has already been claimed by {}.", claimant.mention())
		}
		ClaimOutcome::Closing => String::from(ALREADY_CLOSING),
	};
	respond_ephemeral(interaction, http_client, application_id, &rejection).await
}

/// Closes the ticket the interaction was used in, archiving its transcript
pub async fn close_ticket(
	interaction: &InteractionCreate,
	http_client: &Client,
	application_id: Id<ApplicationMarker>,
	desk: &Arc<Desk>,
	reason: Option<&str>,
) -> miette::Result<()> {
	let actor = interaction_actor(interaction)?;
	let channel = interaction_channel(interaction, desk.platform())?;

	defer_ephemeral(interaction, http_client, application_id).await?;

	let message = match desk.close(&channel, &actor, reason).await {
		Ok(CloseOutcome::Closing) => format!(
			"✅ Ticket will be closed in {} seconds...",
			CLOSE_DELAY.as_secs()
		),
		Ok(CloseOutcome::NotPermitted) => String::from(NO_CLOSE_PERMISSION),
		Ok(CloseOutcome::NotATicket) => String::from(NOT_A_TICKET_CHANNEL),
		Ok(CloseOutcome::AlreadyClosing) => String::from(ALREADY_CLOSING),
		Err(error @ (TicketError::Transcript(_) | TicketError::Archive(_))) => {
			tracing::warn!(source = ?error, channel = %channel.id, "Ticket left open after its transcript failed");
			String::from(TRANSCRIPT_FAILED)
		}
		Err(error) => return Err(error.into()),
	};
	update_deferred(interaction, http_client, application_id, &message).await
}

/// Asks staff for the reason they're closing the ticket
pub async fn ask_close_reason(
	interaction: &InteractionCreate,
	http_client: &Client,
	application_id: Id<ApplicationMarker>,
	desk: &Desk,
) -> miette::Result<()> {
	let actor = interaction_actor(interaction)?;
	let channel = interaction_channel(interaction, desk.platform())?;

	if !actor.has_role(desk.staff_role()) {
		return respond_ephemeral(interaction, http_client, application_id, NO_CLOSE_PERMISSION).await;
	}
	if desk.categories().category_for_channel(&channel.name).is_none() {
		return respond_ephemeral(interaction, http_client, application_id, NOT_A_TICKET_CHANNEL).await;
	}

	let response = InteractionResponseDataBuilder::new()
		.custom_id(REASON_MODAL_ID)
		.title("Close Ticket")
		.components(close_reason_components())
		.build();
	let response = InteractionResponse {
		kind: InteractionResponseType::Modal,
		data: Some(response),
	};
	http_client
		.interaction(application_id)
		.create_response(interaction.id, &interaction.token, &response)
		.await
		.into_diagnostic()?;

	Ok(())
}

pub async fn close_with_reason(
	interaction: &InteractionCreate,
	values: &HashMap<String, String>,
	http_client: &Client,
	application_id: Id<ApplicationMarker>,
	desk: &Arc<Desk>,
) -> miette::Result<()> {
	let reason = values.get(REASON_FIELD_ID).map(String::as_str);
	close_ticket(interaction, http_client, application_id, desk, reason).await
}
