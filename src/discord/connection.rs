// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::Desk;
use super::commands::{command_definitions, route_command};
use super::interactions::{route_interaction, route_modal_submit};
use super::platform::DiscordPlatform;
use super::utils::responses::report_failure;
use crate::config::ConfigData;
use crate::tickets::lifecycle::TicketDesk;
use miette::IntoDiagnostic;
use std::sync::Arc;
use tokio::sync::RwLock;
use twilight_cache_inmemory::{DefaultInMemoryCache, ResourceType};
use twilight_gateway::{EventTypeFlags, Intents, Shard, ShardId, StreamExt};
use twilight_http::client::Client;
use twilight_model::application::interaction::InteractionData;
use twilight_model::gateway::event::Event;
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::id::Id;
use twilight_model::id::marker::ApplicationMarker;
use type_map::concurrent::TypeMap;

pub fn set_up_client(config: &ConfigData) -> Arc<Client> {
	Arc::new(Client::new(config.discord_token.clone()))
}

pub async fn run_bot(config: ConfigData, http_client: Arc<Client>) -> miette::Result<()> {
	let intents = Intents::GUILDS | Intents::GUILD_MESSAGES | Intents::MESSAGE_CONTENT;

	let mut shard = Shard::new(ShardId::ONE, config.discord_token.clone(), intents);

	let cache = Arc::new(
		DefaultInMemoryCache::builder()
			.resource_types(ResourceType::GUILD | ResourceType::CHANNEL)
			.build(),
	);

	let application_id = {
		let application_response = http_client.current_user_application().await.into_diagnostic()?;
		application_response.model().await.into_diagnostic()?.id
	};

	{
		let interaction_client = http_client.interaction(application_id);
		let commands = command_definitions();
		interaction_client
			.set_global_commands(&commands)
			.await
			.into_diagnostic()?;
	}

	let bot_user = {
		let user_response = http_client.current_user().await.into_diagnostic()?;
		user_response.model().await.into_diagnostic()?.id
	};

	let bot_state = Arc::new(RwLock::new(TypeMap::new()));
	let platform = DiscordPlatform::new(Arc::clone(&http_client), Arc::clone(&cache), bot_user);
	let desk = Arc::new(TicketDesk::new(
		platform,
		config.categories,
		config.staff_role,
		config.transcript_channel,
		bot_state,
	));
	tracing::info!(categories = desk.categories().iter().count(), "Ticket desk ready");

	while let Some(event) = shard.next_event(EventTypeFlags::all()).await {
		let event = match event {
			Ok(event) => event,
			Err(error) => {
				tracing::warn!(source = ?error, "error receiving event");
				continue;
			}
		};
		cache.update(&event);

		tokio::spawn(handle_event(event, Arc::clone(&http_client), application_id, Arc::clone(&desk)));
	}

	Ok(())
}

async fn handle_event(event: Event, http_client: Arc<Client>, application_id: Id<ApplicationMarker>, desk: Arc<Desk>) {
	tracing::trace!(kind = ?event.kind(), "Incoming gateway event");
	match event {
		Event::InteractionCreate(interaction) => {
			let interaction_result = handle_interaction(&interaction, &http_client, application_id, &desk).await;
			if let Err(error) = interaction_result {
				tracing::error!(source = ?error, "An error occurred handling an interaction");
				report_failure(&interaction, &http_client, application_id).await;
			}
		}
		Event::ChannelDelete(channel) => {
			desk.forget_channel(channel.id).await;
		}
		Event::Ready(_) => {
			tracing::info!("Discord gateway is ready");
		}
		_ => (),
	}
}

async fn handle_interaction(
	interaction: &InteractionCreate,
	http_client: &Client,
	application_id: Id<ApplicationMarker>,
	desk: &Arc<Desk>,
) -> miette::Result<()> {
	match &interaction.data {
		Some(InteractionData::ApplicationCommand(command_data)) => {
			route_command(interaction, command_data, http_client, application_id, desk).await
		}
		Some(InteractionData::MessageComponent(interaction_data)) => {
			route_interaction(interaction, interaction_data, http_client, application_id, desk).await
		}
		Some(InteractionData::ModalSubmit(modal_data)) => {
			route_modal_submit(interaction, modal_data, http_client, application_id, desk).await
		}
		_ => Ok(()),
	}
}
