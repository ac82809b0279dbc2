// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::Desk;
use miette::bail;
use std::collections::HashMap;
use std::sync::Arc;
use twilight_http::client::Client;
use twilight_model::application::interaction::message_component::MessageComponentInteractionData;
use twilight_model::application::interaction::modal::ModalInteractionData;
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::id::Id;
use twilight_model::id::marker::ApplicationMarker;

mod create_ticket;
pub mod manage_ticket;

pub async fn route_interaction(
	interaction: &InteractionCreate,
	interaction_data: &MessageComponentInteractionData,
	http_client: &Client,
	application_id: Id<ApplicationMarker>,
	desk: &Arc<Desk>,
) -> miette::Result<()> {
	let custom_id_path: Vec<&str> = interaction_data.custom_id.split('/').collect();

	match custom_id_path.as_slice() {
		["ticket", "select"] => {
			create_ticket::select_category(interaction, interaction_data, http_client, application_id, desk).await
		}
		["ticket", "claim"] => manage_ticket::claim_ticket(interaction, http_client, application_id, desk).await,
		["ticket", "close"] => {
			manage_ticket::close_ticket(interaction, http_client, application_id, desk, None).await
		}
		["ticket", "close_reason"] => {
			manage_ticket::ask_close_reason(interaction, http_client, application_id, desk).await
		}
		_ => bail!("Unknown component interaction: {}", interaction_data.custom_id),
	}
}

pub async fn route_modal_submit(
	interaction: &InteractionCreate,
	modal_data: &ModalInteractionData,
	http_client: &Client,
	application_id: Id<ApplicationMarker>,
	desk: &Arc<Desk>,
) -> miette::Result<()> {
	let custom_id_path: Vec<&str> = modal_data.custom_id.split('/').collect();
	let values = modal_values(modal_data);

	match custom_id_path.as_slice() {
		["ticket", "answers", form_id] => {
			create_ticket::submit_answers(interaction, form_id, &values, http_client, application_id, desk).await
		}
		["ticket", "reason"] => {
			manage_ticket::close_with_reason(interaction, &values, http_client, application_id, desk).await
		}
		_ => bail!("Unknown modal submission: {}", modal_data.custom_id),
	}
}

/// Collects the submitted text input values, keyed by input custom ID. Inputs left empty are omitted.
fn modal_values(modal_data: &ModalInteractionData) -> HashMap<String, String> {
	let mut values: HashMap<String, String> = HashMap::new();
	for row in modal_data.components.iter() {
		for component in row.components.iter() {
			if let Some(value) = &component.value {
				values.insert(component.custom_id.clone(), value.clone());
			}
		}
	}
	values
}
