// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::utils::tickets::{summary_message, welcome_message};
use super::utils::timestamp::{datetime_from_id, datetime_from_timestamp};
use crate::categories::Category;
use crate::tickets::Ticket;
use crate::tickets::platform::{NewTicketChannel, PlatformError, TicketPlatform};
use crate::tickets::transcript::{Transcript, TranscriptEntry};
use async_trait::async_trait;
use std::sync::Arc;
use twilight_cache_inmemory::DefaultInMemoryCache;
use twilight_http::client::Client;
use twilight_http::request::AuditLogReason;
use twilight_http::response::DeserializeBodyError;
use twilight_model::channel::ChannelType;
use twilight_model::channel::permission_overwrite::{PermissionOverwrite, PermissionOverwriteType};
use twilight_model::channel::message::AllowedMentions;
use twilight_model::guild::Permissions;
use twilight_model::http::attachment::Attachment;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, GuildMarker, UserMarker};
use twilight_validate::embed::EmbedValidationError;

impl From<twilight_http::Error> for PlatformError {
	fn from(error: twilight_http::Error) -> Self {
		Self(Box::new(error))
	}
}

impl From<DeserializeBodyError> for PlatformError {
	fn from(error: DeserializeBodyError) -> Self {
		Self(Box::new(error))
	}
}

impl From<EmbedValidationError> for PlatformError {
	fn from(error: EmbedValidationError) -> Self {
		Self(Box::new(error))
	}
}

/// What ticket members may do in their ticket channel
fn ticket_member_permissions() -> Permissions {
	Permissions::VIEW_CHANNEL
		| Permissions::SEND_MESSAGES
		| Permissions::READ_MESSAGE_HISTORY
		| Permissions::ATTACH_FILES
		| Permissions::EMBED_LINKS
}

/// Gets the permission overwrites hiding a ticket channel from everyone but its owner, staff, and the bot
fn ticket_channel_overwrites(channel: &NewTicketChannel<'_>, bot_user: Id<UserMarker>) -> Vec<PermissionOverwrite> {
	vec![
		PermissionOverwrite {
			allow: Permissions::empty(),
			deny: Permissions::VIEW_CHANNEL,
			id: channel.guild.cast(),
			kind: PermissionOverwriteType::Role,
		},
		PermissionOverwrite {
			allow: ticket_member_permissions(),
			deny: Permissions::empty(),
			id: channel.owner.cast(),
			kind: PermissionOverwriteType::Member,
		},
		PermissionOverwrite {
			allow: ticket_member_permissions(),
			deny: Permissions::empty(),
			id: channel.staff_role.cast(),
			kind: PermissionOverwriteType::Role,
		},
		PermissionOverwrite {
			allow: ticket_member_permissions() | Permissions::MANAGE_CHANNELS,
			deny: Permissions::empty(),
			id: bot_user.cast(),
			kind: PermissionOverwriteType::Member,
		},
	]
}

/// Ticket lifecycle operations against Discord
pub struct DiscordPlatform {
	http_client: Arc<Client>,
	cache: Arc<DefaultInMemoryCache>,
	bot_user: Id<UserMarker>,
}

impl DiscordPlatform {
	pub fn new(http_client: Arc<Client>, cache: Arc<DefaultInMemoryCache>, bot_user: Id<UserMarker>) -> Self {
		Self {
			http_client,
			cache,
			bot_user,
		}
	}

	pub fn cached_channel_name(&self, channel: Id<ChannelMarker>) -> Option<String> {
		self.cache.channel(channel).and_then(|channel| channel.name.clone())
	}

	fn cached_guild_channel_names(&self, guild: Id<GuildMarker>) -> Option<Vec<String>> {
		let channel_ids = self.cache.guild_channels(guild)?;
		let names = channel_ids
			.iter()
			.filter_map(|channel_id| self.cached_channel_name(*channel_id))
			.collect();
		Some(names)
	}
}

#[async_trait]
impl TicketPlatform for DiscordPlatform {
	async fn guild_channel_names(&self, guild: Id<GuildMarker>) -> Result<Vec<String>, PlatformError> {
		if let Some(names) = self.cached_guild_channel_names(guild) {
			return Ok(names);
		}

		tracing::debug!(%guild, "Guild channels not cached; fetching them");
		let channels = self.http_client.guild_channels(guild).await?.models().await?;
		Ok(channels.into_iter().filter_map(|channel| channel.name).collect())
	}

	async fn create_ticket_channel(&self, channel: &NewTicketChannel<'_>) -> Result<Id<ChannelMarker>, PlatformError> {
		let permission_overwrites = ticket_channel_overwrites(channel, self.bot_user);
		let reason = format!("Support ticket created by {}", channel.owner_name);

		let new_channel = self
			.http_client
			.create_guild_channel(channel.guild, channel.name)
			.kind(ChannelType::GuildText)
			.parent_id(channel.parent)
			.permission_overwrites(&permission_overwrites)
			.reason(&reason)
			.await?
			.model()
			.await?;
		Ok(new_channel.id)
	}

	async fn send_welcome(&self, ticket: &Ticket, category: &Category) -> Result<(), PlatformError> {
		let welcome = welcome_message(ticket, category);
		let create_message = self.http_client.create_message(ticket.channel);
		welcome.set_create_message_data(create_message).await?;
		Ok(())
	}

	async fn send_summary(&self, ticket: &Ticket, category: &Category) -> Result<(), PlatformError> {
		let summary = summary_message(ticket, category)?;
		let create_message = self.http_client.create_message(ticket.channel);
		summary.set_create_message_data(create_message).await?;
		Ok(())
	}

	async fn recent_messages(
		&self,
		channel: Id<ChannelMarker>,
		limit: u16,
	) -> Result<Vec<TranscriptEntry>, PlatformError> {
		let messages = self
			.http_client
			.channel_messages(channel)
			.limit(limit)
			.await?
			.models()
			.await?;
		let entries = messages
			.into_iter()
			.map(|message| TranscriptEntry {
				timestamp: datetime_from_timestamp(&message.timestamp)
					.or_else(|| datetime_from_id(message.id))
					.unwrap_or_default(),
				message_id: message.id.get(),
				author: message.author.name,
				content: message.content,
				attachments: message
					.attachments
					.into_iter()
					.map(|attachment| attachment.filename)
					.collect(),
			})
			.collect();
		Ok(entries)
	}

	async fn send_transcript(
		&self,
		channel: Id<ChannelMarker>,
		content: &str,
		transcript: &Transcript,
	) -> Result<(), PlatformError> {
		let attachment = Attachment::from_bytes(transcript.file_name.clone(), transcript.body.clone().into_bytes(), 0);
		let allowed_mentions = AllowedMentions::default();
		self.http_client
			.create_message(channel)
			.content(content)
			.attachments(&[attachment])
			.allowed_mentions(Some(&allowed_mentions))
			.await?;
		Ok(())
	}

	async fn delete_channel(&self, channel: Id<ChannelMarker>) -> Result<(), PlatformError> {
		self.http_client
			.delete_channel(channel)
			.reason("Ticket closed")
			.await?;
		Ok(())
	}
}
