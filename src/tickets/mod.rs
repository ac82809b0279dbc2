// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::{HashMap, HashSet};
use tokio::time::Instant;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, RoleMarker, UserMarker};

pub mod lifecycle;
pub mod naming;
pub mod platform;
pub mod transcript;

/// Where a ticket is in its lifecycle. A ticket with no record at all hasn't been started.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TicketState {
	AwaitingAnswers,
	Open,
	Claimed,
	Closing,
	Closed,
}

/// A ticket whose questionnaire has been shown but not yet submitted.
#[derive(Clone, Debug)]
pub struct PendingTicket {
	pub owner: Id<UserMarker>,
	pub owner_name: String,
	pub category: String,
	pub started_at: Instant,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Answer {
	pub question: String,
	pub answer: String,
}

/// An open support request and its channel.
#[derive(Clone, Debug)]
pub struct Ticket {
	pub owner: Id<UserMarker>,
	pub owner_name: String,
	pub category: String,
	pub channel: Id<ChannelMarker>,
	pub channel_name: String,
	pub answers: Vec<Answer>,
	pub state: TicketState,
	pub claimant: Option<Id<UserMarker>>,
}

/// Tickets known to this process, stored in the bot state.
///
/// The ticket channels themselves remain the source of truth for whether a ticket exists; tickets opened before the
/// bot last started aren't in here.
#[derive(Debug, Default)]
pub struct TicketIndex {
	pub pending: HashMap<String, PendingTicket>,
	pub open: HashMap<Id<ChannelMarker>, Ticket>,
	/// Channels with a close in progress, whether or not their ticket is in `open`.
	pub closing: HashSet<Id<ChannelMarker>>,
}

/// The user acting on a ticket.
#[derive(Clone, Debug)]
pub struct Actor {
	pub id: Id<UserMarker>,
	pub name: String,
	pub roles: Vec<Id<RoleMarker>>,
}

impl Actor {
	pub fn has_role(&self, role: Id<RoleMarker>) -> bool {
		self.roles.contains(&role)
	}
}

/// The channel an action was taken in.
#[derive(Clone, Debug)]
pub struct ChannelRef {
	pub id: Id<ChannelMarker>,
	pub name: String,
}
