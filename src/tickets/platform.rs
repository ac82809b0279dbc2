// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::Ticket;
use super::transcript::{Transcript, TranscriptEntry};
use crate::categories::Category;
use async_trait::async_trait;
use miette::Diagnostic;
use std::error::Error;
use std::fmt;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, GuildMarker, RoleMarker, UserMarker};

/// A failed operation against the chat platform.
// The platform client has several error types; they're boxed so the ticket logic needn't know about them.
#[derive(Debug, Diagnostic)]
pub struct PlatformError(pub Box<dyn Error + Send + Sync>);

impl fmt::Display for PlatformError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(&self.0, f)
	}
}

impl Error for PlatformError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		Some(self.0.as_ref())
	}
}

/// Everything needed to provision a ticket's private channel.
#[derive(Clone, Debug)]
pub struct NewTicketChannel<'a> {
	pub guild: Id<GuildMarker>,
	pub name: &'a str,
	pub parent: Id<ChannelMarker>,
	pub owner: Id<UserMarker>,
	pub owner_name: &'a str,
	pub staff_role: Id<RoleMarker>,
}

/// The chat platform operations the ticket lifecycle relies on.
#[async_trait]
pub trait TicketPlatform: Send + Sync + 'static {
	/// Names of all channels in the guild.
	async fn guild_channel_names(&self, guild: Id<GuildMarker>) -> Result<Vec<String>, PlatformError>;

	/// Creates a channel visible only to the ticket owner and the staff role.
	async fn create_ticket_channel(&self, channel: &NewTicketChannel<'_>) -> Result<Id<ChannelMarker>, PlatformError>;

	async fn send_welcome(&self, ticket: &Ticket, category: &Category) -> Result<(), PlatformError>;

	/// Posts the answer summary along with the staff controls.
	async fn send_summary(&self, ticket: &Ticket, category: &Category) -> Result<(), PlatformError>;

	/// Up to `limit` of the most recent messages in the channel, in any order.
	async fn recent_messages(
		&self,
		channel: Id<ChannelMarker>,
		limit: u16,
	) -> Result<Vec<TranscriptEntry>, PlatformError>;

	async fn send_transcript(
		&self,
		channel: Id<ChannelMarker>,
		content: &str,
		transcript: &Transcript,
	) -> Result<(), PlatformError>;

	async fn delete_channel(&self, channel: Id<ChannelMarker>) -> Result<(), PlatformError>;
}
