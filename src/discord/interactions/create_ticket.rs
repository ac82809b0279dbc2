// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::Desk;
use crate::discord::utils::components::{modal_title, questionnaire_components};
use crate::discord::utils::responses::{
	TICKET_CREATION_EXPIRED, defer_ephemeral, respond_ephemeral, update_deferred,
};
use crate::discord::utils::users::interaction_actor;
use crate::tickets::lifecycle::{OpenOutcome, TicketError};
use miette::{IntoDiagnostic, bail};
use std::collections::HashMap;
use twilight_http::client::Client;
use twilight_mention::fmt::Mention;
use twilight_model::application::interaction::message_component::MessageComponentInteractionData;
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::http::interaction::{InteractionResponse, InteractionResponseType};
use twilight_model::id::Id;
use twilight_model::id::marker::ApplicationMarker;
use twilight_util::builder::InteractionResponseDataBuilder;

const CATEGORY_UNAVAILABLE: &str = "❌ That ticket category is no longer available.";
const ANSWERS_INCOMPLETE: &str = "❌ Please answer every required question.";

/// Shows the questionnaire for the category picked on the panel
pub async fn select_category(
	interaction: &InteractionCreate,
	interaction_data: &MessageComponentInteractionData,
	http_client: &Client,
	application_id: Id<ApplicationMarker>,
	desk: &Desk,
) -> miette::Result<()> {
	if interaction.guild_id.is_none() {
		bail!("Ticket category selected outside of a guild");
	}
	let Some(category_id) = interaction_data.values.first() else {
		bail!("Ticket category select submitted without a value");
	};
	let actor = interaction_actor(interaction)?;

	let form = match desk.begin(actor.id, &actor.name, category_id).await {
		Ok(form) => form,
		Err(TicketError::UnknownCategory(category_id)) => {
			tracing::warn!(category = %category_id, "Ticket category selected that isn't registered");
			return respond_ephemeral(interaction, http_client, application_id, CATEGORY_UNAVAILABLE).await;
		}
		Err(error) => return Err(error.into()),
	};

	let response = InteractionResponseDataBuilder::new()
		.custom_id(format!("ticket/answers/{}", form.form_id))
		.title(modal_title(&form.category_label))
		.components(questionnaire_components(&form.fields))
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

/// Opens the ticket for a submitted questionnaire
pub async fn submit_answers(
	interaction: &InteractionCreate,
	form_id: &str,
	answers: &HashMap<String, String>,
	http_client: &Client,
	application_id: Id<ApplicationMarker>,
	desk: &Desk,
) -> miette::Result<()> {
	let Some(guild_id) = interaction.guild_id else {
		bail!("Ticket questionnaire submitted outside of a guild");
	};
	let actor = interaction_actor(interaction)?;

	defer_ephemeral(interaction, http_client, application_id).await?;

	let outcome = desk.submit_answers(form_id, actor.id, guild_id, answers).await?;
	let message = match outcome {
		OpenOutcome::Opened(channel) => format!("✅ Your ticket has been created: {}", channel.mention()),
		OpenOutcome::Expired => String::from(TICKET_CREATION_EXPIRED),
		OpenOutcome::Incomplete => String::from(ANSWERS_INCOMPLETE),
		OpenOutcome::QuotaExceeded(open_tickets) => format!(
			"❌ You already have {} open tickets. Please wait for one of them to be closed before opening another.",
			open_tickets
		),
	};
	update_deferred(interaction, http_client, application_id, &message).await
}
