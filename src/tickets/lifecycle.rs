// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::naming::{MAX_OPEN_TICKETS, count_open_tickets, ticket_channel_name};
use super::platform::{NewTicketChannel, PlatformError, TicketPlatform};
use super::transcript::{TRANSCRIPT_LIMIT, Transcript};
use super::{Actor, Answer, ChannelRef, PendingTicket, Ticket, TicketIndex, TicketState};
use crate::categories::{CategoryRegistry, Question};
use miette::Diagnostic;
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{Duration, Instant, sleep};
use twilight_mention::fmt::Mention;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, GuildMarker, RoleMarker, UserMarker};
use type_map::concurrent::TypeMap;

/// How long a user has to submit the questionnaire after picking a category.
pub const ANSWER_WINDOW: Duration = Duration::from_secs(5 * 60);
/// How long a closed ticket's channel stays around before it's deleted.
pub const CLOSE_DELAY: Duration = Duration::from_secs(5);

pub const CLOSING_NOTICE: &str = "📁 Transcript saved. Ticket will be closed shortly.";

#[derive(Debug, Diagnostic)]
pub enum TicketError {
	UnknownCategory(String),
	/// The channel history couldn't be read. The channel is left in place.
	Transcript(PlatformError),
	/// The transcript couldn't be delivered. The channel is left in place.
	Archive(PlatformError),
	Platform(PlatformError),
}

impl From<PlatformError> for TicketError {
	fn from(error: PlatformError) -> Self {
		Self::Platform(error)
	}
}

impl Error for TicketError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		match self {
			Self::UnknownCategory(_) => None,
			Self::Transcript(error) => Some(error),
			Self::Archive(error) => Some(error),
			Self::Platform(error) => Some(error),
		}
	}
}

impl fmt::Display for TicketError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::UnknownCategory(id) => write!(f, "unknown ticket category: {}", id),
			Self::Transcript(error) => write!(f, "couldn't read ticket history: {}", error),
			Self::Archive(error) => write!(f, "couldn't deliver ticket transcript: {}", error),
			Self::Platform(error) => write!(f, "platform error: {}", error),
		}
	}
}

/// The questionnaire to present to a user who picked a category.
#[derive(Clone, Debug)]
pub struct TicketForm {
	pub form_id: String,
	pub category_label: String,
	pub fields: Vec<Question>,
}

#[derive(Debug, Eq, PartialEq)]
pub enum OpenOutcome {
	Opened(Id<ChannelMarker>),
	/// The questionnaire is no longer accepted; nothing was created.
	Expired,
	/// A required answer was empty.
	Incomplete,
	/// The user already has this many tickets open.
	QuotaExceeded(usize),
}

#[derive(Debug, Eq, PartialEq)]
pub enum ClaimOutcome {
	Claimed,
	NotPermitted,
	NotATicket,
	AlreadyClaimed(Id<UserMarker>),
	Closing,
}

#[derive(Debug, Eq, PartialEq)]
pub enum CloseOutcome {
	Closing,
	NotPermitted,
	NotATicket,
	AlreadyClosing,
}

/// Runs ticket lifecycles against a chat platform.
pub struct TicketDesk<P> {
	platform: P,
	categories: CategoryRegistry,
	staff_role: Id<RoleMarker>,
	transcript_channel: Id<ChannelMarker>,
	bot_state: Arc<RwLock<TypeMap>>,
}

impl<P: TicketPlatform> TicketDesk<P> {
	pub fn new(
		platform: P,
		categories: CategoryRegistry,
		staff_role: Id<RoleMarker>,
		transcript_channel: Id<ChannelMarker>,
		bot_state: Arc<RwLock<TypeMap>>,
	) -> Self {
		Self {
			platform,
			categories,
			staff_role,
			transcript_channel,
			bot_state,
		}
	}

	pub fn platform(&self) -> &P {
		&self.platform
	}

	pub fn categories(&self) -> &CategoryRegistry {
		&self.categories
	}

	pub fn staff_role(&self) -> Id<RoleMarker> {
		self.staff_role
	}

	/// Gets the state of the ticket in a channel, if this process knows about it.
	#[cfg(test)]
	pub async fn ticket_state(&self, channel: Id<ChannelMarker>) -> Option<TicketState> {
		let state = self.bot_state.read().await;
		let index = state.get::<TicketIndex>()?;
		index.open.get(&channel).map(|ticket| ticket.state)
	}

	/// Starts a ticket for the user in the given category, returning the questionnaire to show them.
	///
	/// If the questionnaire isn't submitted within [ANSWER_WINDOW], the ticket is dropped.
	pub async fn begin(
		&self,
		owner: Id<UserMarker>,
		owner_name: &str,
		category_id: &str,
	) -> Result<TicketForm, TicketError> {
		let Some(category) = self.categories.get(category_id) else {
			return Err(TicketError::UnknownCategory(category_id.to_string()));
		};

		let form_id = cuid2::create_id();
		{
			let mut state = self.bot_state.write().await;
			let index = state.entry::<TicketIndex>().or_insert_with(TicketIndex::default);
			let pending = PendingTicket {
				owner,
				owner_name: owner_name.to_string(),
				category: category.id.clone(),
				started_at: Instant::now(),
			};
			index.pending.insert(form_id.clone(), pending);
		}
		tokio::spawn(expire_pending(Arc::clone(&self.bot_state), form_id.clone()));

		tracing::debug!(user = %owner, category = %category.id, form = %form_id, "Ticket questionnaire presented");
		Ok(TicketForm {
			form_id,
			category_label: category.label.clone(),
			fields: category.form_fields().to_vec(),
		})
	}

	/// Opens the ticket for a submitted questionnaire.
	///
	/// Answers are keyed by question field ID.
	pub async fn submit_answers(
		&self,
		form_id: &str,
		submitter: Id<UserMarker>,
		guild: Id<GuildMarker>,
		answers: &HashMap<String, String>,
	) -> Result<OpenOutcome, TicketError> {
		let pending = {
			let mut state = self.bot_state.write().await;
			let Some(index) = state.get_mut::<TicketIndex>() else {
				return Ok(OpenOutcome::Expired);
			};
			let submitted_by_owner = index
				.pending
				.get(form_id)
				.is_some_and(|pending| pending.owner == submitter);
			if submitted_by_owner {
				index.pending.remove(form_id)
			} else {
				None
			}
		};
		let Some(pending) = pending else {
			return Ok(OpenOutcome::Expired);
		};
		tracing::debug!(form = %form_id, elapsed = ?pending.started_at.elapsed(), "Ticket questionnaire submitted");

		let Some(category) = self.categories.get(&pending.category) else {
			return Err(TicketError::UnknownCategory(pending.category));
		};

		let mut recorded_answers: Vec<Answer> = Vec::new();
		for question in category.form_fields() {
			let answer = answers
				.get(&question.field_id)
				.map(|answer| answer.trim().to_string())
				.unwrap_or_default();
			if question.required && answer.is_empty() {
				return Ok(OpenOutcome::Incomplete);
			}
			recorded_answers.push(Answer {
				question: question.label.clone(),
				answer,
			});
		}

		let channel_names = self.platform.guild_channel_names(guild).await?;
		let open_tickets = count_open_tickets(
			channel_names.iter().map(String::as_str),
			&self.categories,
			&pending.owner_name,
		);
		if open_tickets >= MAX_OPEN_TICKETS {
			tracing::info!(user = %pending.owner, open_tickets, "Rejected ticket over the open ticket limit");
			return Ok(OpenOutcome::QuotaExceeded(open_tickets));
		}

		let channel_name = ticket_channel_name(category, &pending.owner_name, pending.owner);
		let new_channel = NewTicketChannel {
			guild,
			name: &channel_name,
			parent: category.destination,
			owner: pending.owner,
			owner_name: &pending.owner_name,
			staff_role: self.staff_role,
		};
		let channel = self.platform.create_ticket_channel(&new_channel).await?;

		let ticket = Ticket {
			owner: pending.owner,
			owner_name: pending.owner_name,
			category: category.id.clone(),
			channel,
			channel_name,
			answers: recorded_answers,
			state: TicketState::Open,
			claimant: None,
		};

		let summary_result = match self.platform.send_welcome(&ticket, category).await {
			Ok(()) => self.platform.send_summary(&ticket, category).await,
			Err(error) => Err(error),
		};
		if let Err(error) = summary_result {
			// Without the summary there are no staff controls, so the channel would be stuck open.
			if let Err(delete_error) = self.platform.delete_channel(channel).await {
				tracing::warn!(source = ?delete_error, %channel, "Failed to remove a half-created ticket channel");
			}
			return Err(error.into());
		}

		tracing::info!(
			user = %ticket.owner,
			category = %ticket.category,
			%channel,
			channel_name = %ticket.channel_name,
			"Ticket opened"
		);
		{
			let mut state = self.bot_state.write().await;
			let index = state.entry::<TicketIndex>().or_insert_with(TicketIndex::default);
			index.open.insert(channel, ticket);
		}

		Ok(OpenOutcome::Opened(channel))
	}

	/// Marks the ticket in the channel as claimed by the actor.
	///
	/// `announce` shows the claim to everyone in the channel. It only runs once the claim is reserved, and if it fails
	/// the claim is undone so the ticket can be claimed again.
	pub async fn claim<F, Fut, E>(&self, channel: &ChannelRef, actor: &Actor, announce: F) -> Result<ClaimOutcome, E>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<(), E>>,
	{
		if !actor.has_role(self.staff_role) {
			return Ok(ClaimOutcome::NotPermitted);
		}
		if self.categories.category_for_channel(&channel.name).is_none() {
			return Ok(ClaimOutcome::NotATicket);
		}

		let reserved_from = {
			let mut state = self.bot_state.write().await;
			let index = state.entry::<TicketIndex>().or_insert_with(TicketIndex::default);
			if index.closing.contains(&channel.id) {
				return Ok(ClaimOutcome::Closing);
			}
			match index.open.get_mut(&channel.id) {
				Some(ticket) => match (ticket.state, ticket.claimant) {
					(TicketState::Claimed, Some(claimant)) => return Ok(ClaimOutcome::AlreadyClaimed(claimant)),
					(TicketState::Closing | TicketState::Closed, _) => return Ok(ClaimOutcome::Closing),
					(previous_state, _) => {
						ticket.state = TicketState::Claimed;
						ticket.claimant = Some(actor.id);
						Some(previous_state)
					}
				},
				// Opened before the bot last started; the summary message is the only record of its claim status.
				None => None,
			}
		};

		if let Err(error) = announce().await {
			if let Some(previous_state) = reserved_from {
				let mut state = self.bot_state.write().await;
				if let Some(ticket) = state
					.get_mut::<TicketIndex>()
					.and_then(|index| index.open.get_mut(&channel.id))
					.filter(|ticket| ticket.claimant == Some(actor.id) && ticket.state == TicketState::Claimed)
				{
					ticket.state = previous_state;
					ticket.claimant = None;
				}
			}
			tracing::warn!(channel = %channel.id, staff = %actor.id, "Ticket claim couldn't be shown and was undone");
			return Err(error);
		}

		if reserved_from.is_some() {
			tracing::info!(channel = %channel.id, staff = %actor.id, "Ticket claimed");
		} else {
			tracing::info!(channel = %channel.id, staff = %actor.id, "Untracked ticket claimed");
		}
		Ok(ClaimOutcome::Claimed)
	}

	/// Drops what's known about a ticket whose channel no longer exists.
	pub async fn forget_channel(&self, channel: Id<ChannelMarker>) {
		let mut state = self.bot_state.write().await;
		let Some(index) = state.get_mut::<TicketIndex>() else {
			return;
		};
		index.closing.remove(&channel);
		if let Some(ticket) = index.open.remove(&channel) {
			tracing::info!(%channel, channel_name = %ticket.channel_name, user = %ticket.owner, "Ticket channel deleted");
		}
	}

	/// Closes the ticket in the channel.
	///
	/// The transcript is archived and posted in the ticket channel before the channel is scheduled for deletion after
	/// [CLOSE_DELAY]. If the transcript can't be produced or delivered, the channel is kept.
	pub async fn close(
		self: &Arc<Self>,
		channel: &ChannelRef,
		actor: &Actor,
		reason: Option<&str>,
	) -> Result<CloseOutcome, TicketError> {
		if !actor.has_role(self.staff_role) {
			return Ok(CloseOutcome::NotPermitted);
		}
		if self.categories.category_for_channel(&channel.name).is_none() {
			return Ok(CloseOutcome::NotATicket);
		}
		let reason = reason.map(str::trim).filter(|reason| !reason.is_empty());

		let previous_state = {
			let mut state = self.bot_state.write().await;
			let index = state.entry::<TicketIndex>().or_insert_with(TicketIndex::default);
			if !index.closing.insert(channel.id) {
				return Ok(CloseOutcome::AlreadyClosing);
			}
			index.open.get_mut(&channel.id).map(|ticket| {
				let previous_state = ticket.state;
				ticket.state = TicketState::Closing;
				previous_state
			})
		};

		if let Err(error) = self.deliver_transcript(channel, actor, reason).await {
			let mut state = self.bot_state.write().await;
			if let Some(index) = state.get_mut::<TicketIndex>() {
				index.closing.remove(&channel.id);
				if let (Some(ticket), Some(previous_state)) = (index.open.get_mut(&channel.id), previous_state) {
					ticket.state = previous_state;
				}
			}
			return Err(error);
		}

		tracing::info!(channel = %channel.id, staff = %actor.id, reason = ?reason, "Ticket closing");
		tokio::spawn(Arc::clone(self).delete_after_delay(channel.id));
		Ok(CloseOutcome::Closing)
	}

	async fn deliver_transcript(
		&self,
		channel: &ChannelRef,
		actor: &Actor,
		reason: Option<&str>,
	) -> Result<(), TicketError> {
		let entries = self
			.platform
			.recent_messages(channel.id, TRANSCRIPT_LIMIT as u16)
			.await
			.map_err(TicketError::Transcript)?;
		let transcript = Transcript::render(channel.id, entries);
		tracing::debug!(channel = %channel.id, lines = transcript.line_count(), "Ticket transcript rendered");

		let archive_notice = archive_notice(&channel.name, actor, reason);
		self.platform
			.send_transcript(self.transcript_channel, &archive_notice, &transcript)
			.await
			.map_err(TicketError::Archive)?;
		self.platform
			.send_transcript(channel.id, CLOSING_NOTICE, &transcript)
			.await
			.map_err(TicketError::Archive)?;
		Ok(())
	}

	async fn delete_after_delay(self: Arc<Self>, channel: Id<ChannelMarker>) {
		sleep(CLOSE_DELAY).await;
		if let Err(error) = self.platform.delete_channel(channel).await {
			tracing::warn!(source = ?error, %channel, "Failed to delete a closed ticket channel");
		}

		let mut state = self.bot_state.write().await;
		if let Some(index) = state.get_mut::<TicketIndex>() {
			index.closing.remove(&channel);
			if let Some(mut ticket) = index.open.remove(&channel) {
				ticket.state = TicketState::Closed;
				tracing::info!(
					%channel,
					channel_name = %ticket.channel_name,
					user = %ticket.owner,
					state = ?ticket.state,
					"Ticket closed"
				);
			}
		}
	}
}

async fn expire_pending(bot_state: Arc<RwLock<TypeMap>>, form_id: String) {
	sleep(ANSWER_WINDOW).await;
	let mut state = bot_state.write().await;
	if let Some(index) = state.get_mut::<TicketIndex>() {
		if index.pending.remove(&form_id).is_some() {
			tracing::debug!(form = %form_id, "Ticket questionnaire expired");
		}
	}
}

fn archive_notice(channel_name: &str, actor: &Actor, reason: Option<&str>) -> String {
	let mut notice = format!(
		"📩 Ticket Transcript - {}\nClosed by: {} ({})",
		channel_name,
		actor.name,
		actor.id.mention()
	);
	if let Some(reason) = reason {
		notice = format!("{}\nReason: {}", notice, reason);
	}
	notice
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::categories::{Category, parse_categories};
	use crate::tickets::transcript::TranscriptEntry;
	use async_trait::async_trait;
	use chrono::{TimeZone, Utc};
	use std::io;
	use std::sync::Mutex;
	use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

	const STAFF_ROLE: u64 = 900;
	const TRANSCRIPT_CHANNEL: u64 = 901;
	const GUILD: u64 = 1;

	#[derive(Default)]
	struct FakePlatform {
		channel_names: Mutex<Vec<String>>,
		next_channel: AtomicU64,
		created: Mutex<Vec<(String, Id<ChannelMarker>)>>,
		welcomes: Mutex<Vec<Id<ChannelMarker>>>,
		summaries: Mutex<Vec<Ticket>>,
		history: Mutex<Vec<TranscriptEntry>>,
		fail_history: AtomicBool,
		transcripts: Mutex<Vec<(Id<ChannelMarker>, String, Transcript)>>,
		deleted: Mutex<Vec<Id<ChannelMarker>>>,
	}

	fn platform_error(message: &str) -> PlatformError {
		PlatformError(Box::new(io::Error::other(message.to_string())))
	}

	#[async_trait]
	impl TicketPlatform for FakePlatform {
		async fn guild_channel_names(&self, _guild: Id<GuildMarker>) -> Result<Vec<String>, PlatformError> {
			Ok(self.channel_names.lock().unwrap().clone())
		}

		async fn create_ticket_channel(
			&self,
			channel: &NewTicketChannel<'_>,
		) -> Result<Id<ChannelMarker>, PlatformError> {
			let id = Id::new(500 + self.next_channel.fetch_add(1, Ordering::SeqCst));
			self.channel_names.lock().unwrap().push(channel.name.to_string());
			self.created.lock().unwrap().push((channel.name.to_string(), channel.parent));
			Ok(id)
		}

		async fn send_welcome(&self, ticket: &Ticket, _category: &Category) -> Result<(), PlatformError> {
			self.welcomes.lock().unwrap().push(ticket.channel);
			Ok(())
		}

		async fn send_summary(&self, ticket: &Ticket, _category: &Category) -> Result<(), PlatformError> {
			self.summaries.lock().unwrap().push(ticket.clone());
			Ok(())
		}

		async fn recent_messages(
			&self,
			_channel: Id<ChannelMarker>,
			limit: u16,
		) -> Result<Vec<TranscriptEntry>, PlatformError> {
			if self.fail_history.load(Ordering::SeqCst) {
				return Err(platform_error("history unavailable"));
			}
			let history = self.history.lock().unwrap();
			Ok(history.iter().take(limit.into()).cloned().collect())
		}

		async fn send_transcript(
			&self,
			channel: Id<ChannelMarker>,
			content: &str,
			transcript: &Transcript,
		) -> Result<(), PlatformError> {
			self.transcripts
				.lock()
				.unwrap()
				.push((channel, content.to_string(), transcript.clone()));
			Ok(())
		}

		async fn delete_channel(&self, channel: Id<ChannelMarker>) -> Result<(), PlatformError> {
			self.deleted.lock().unwrap().push(channel);
			Ok(())
		}
	}

	fn desk() -> Arc<TicketDesk<FakePlatform>> {
		let contents = r#"
category "buy" label="BUY" {
	question "username" label="Minecraft Username"
	question "item" label="What would you like to buy?"
	question "payment" label="Payment Method"
}
category "issues" label="ISSUES" {
	question "issue" label="Issue faced"
	question "platform" label="Platform" {
		optional
	}
}
"#;
		let categories: Vec<Category> = parse_categories("test.kdl", contents)
			.unwrap()
			.into_iter()
			.map(|definition| definition.into_category(Id::new(800)))
			.collect();
		Arc::new(TicketDesk::new(
			FakePlatform::default(),
			CategoryRegistry::new(categories),
			Id::new(STAFF_ROLE),
			Id::new(TRANSCRIPT_CHANNEL),
			Arc::new(RwLock::new(TypeMap::new())),
		))
	}

	fn staff() -> Actor {
		Actor {
			id: Id::new(20),
			name: String::from("helper"),
			roles: vec![Id::new(STAFF_ROLE)],
		}
	}

	fn other_staff() -> Actor {
		Actor {
			id: Id::new(21),
			name: String::from("other_helper"),
			roles: vec![Id::new(STAFF_ROLE)],
		}
	}

	fn member() -> Actor {
		Actor {
			id: Id::new(30),
			name: String::from("steve"),
			roles: vec![Id::new(1234)],
		}
	}

	fn buy_answers() -> HashMap<String, String> {
		HashMap::from([
			(String::from("username"), String::from("Steve")),
			(String::from("item"), String::from("Rank upgrade")),
			(String::from("payment"), String::from("PayPal")),
		])
	}

	async fn claim(desk: &TicketDesk<FakePlatform>, channel: &ChannelRef, actor: &Actor) -> ClaimOutcome {
		desk.claim(channel, actor, || async { Ok::<(), io::Error>(()) })
			.await
			.unwrap()
	}

	async fn open_buy_ticket(desk: &Arc<TicketDesk<FakePlatform>>) -> ChannelRef {
		let form = desk.begin(Id::new(30), "steve", "buy").await.unwrap();
		let outcome = desk
			.submit_answers(&form.form_id, Id::new(30), Id::new(GUILD), &buy_answers())
			.await
			.unwrap();
		let OpenOutcome::Opened(channel) = outcome else {
			panic!("ticket wasn't opened: {:?}", outcome);
		};
		ChannelRef {
			id: channel,
			name: String::from("buy-steve"),
		}
	}

	#[tokio::test]
	async fn begin_presents_category_questions() {
		let desk = desk();
		let form = desk.begin(Id::new(30), "steve", "buy").await.unwrap();
		assert_eq!(form.category_label, "BUY");
		let field_ids: Vec<&str> = form.fields.iter().map(|field| field.field_id.as_str()).collect();
		assert_eq!(field_ids, ["username", "item", "payment"]);

		let state = desk.bot_state.read().await;
		let pending = &state.get::<TicketIndex>().unwrap().pending[&form.form_id];
		assert_eq!(pending.owner, Id::new(30));
		assert_eq!(pending.category, "buy");
	}

	#[tokio::test]
	async fn begin_rejects_unknown_category() {
		let desk = desk();
		let result = desk.begin(Id::new(30), "steve", "refunds").await;
		assert!(matches!(result, Err(TicketError::UnknownCategory(id)) if id == "refunds"));
	}

	#[tokio::test]
	async fn submitting_answers_opens_a_ticket() {
		let desk = desk();
		let channel = open_buy_ticket(&desk).await;

		let created = desk.platform().created.lock().unwrap().clone();
		assert_eq!(created, [(String::from("buy-steve"), Id::new(800))]);
		assert_eq!(*desk.platform().welcomes.lock().unwrap(), [channel.id]);

		let summaries = desk.platform().summaries.lock().unwrap();
		assert_eq!(summaries.len(), 1);
		let answers: Vec<(&str, &str)> = summaries[0]
			.answers
			.iter()
			.map(|answer| (answer.question.as_str(), answer.answer.as_str()))
			.collect();
		assert_eq!(
			answers,
			[
				("Minecraft Username", "Steve"),
				("What would you like to buy?", "Rank upgrade"),
				("Payment Method", "PayPal"),
			]
		);
		drop(summaries);

		assert_eq!(desk.ticket_state(channel.id).await, Some(TicketState::Open));
	}

	#[tokio::test]
	async fn missing_required_answer_is_incomplete() {
		let desk = desk();
		let form = desk.begin(Id::new(30), "steve", "buy").await.unwrap();
		let mut answers = buy_answers();
		answers.insert(String::from("item"), String::from("   "));
		let outcome = desk
			.submit_answers(&form.form_id, Id::new(30), Id::new(GUILD), &answers)
			.await
			.unwrap();
		assert_eq!(outcome, OpenOutcome::Incomplete);
		assert!(desk.platform().created.lock().unwrap().is_empty());
	}

	#[tokio::test]
	async fn optional_answers_may_be_blank() {
		let desk = desk();
		let form = desk.begin(Id::new(30), "steve", "issues").await.unwrap();
		let answers = HashMap::from([(String::from("issue"), String::from("Can't join"))]);
		let outcome = desk
			.submit_answers(&form.form_id, Id::new(30), Id::new(GUILD), &answers)
			.await
			.unwrap();
		assert!(matches!(outcome, OpenOutcome::Opened(_)));
		let summaries = desk.platform().summaries.lock().unwrap();
		assert_eq!(summaries[0].answers.len(), 2);
		assert_eq!(summaries[0].answers[1].answer, "");
	}

	#[tokio::test]
	async fn third_ticket_is_rejected() {
		let desk = desk();
		desk.platform()
			.channel_names
			.lock()
			.unwrap()
			.extend([String::from("buy-steve"), String::from("issues-steve")]);

		let form = desk.begin(Id::new(30), "Steve", "buy").await.unwrap();
		let outcome = desk
			.submit_answers(&form.form_id, Id::new(30), Id::new(GUILD), &buy_answers())
			.await
			.unwrap();
		assert_eq!(outcome, OpenOutcome::QuotaExceeded(2));
		assert!(desk.platform().created.lock().unwrap().is_empty());
	}

	#[tokio::test]
	async fn second_ticket_is_allowed() {
		let desk = desk();
		desk.platform()
			.channel_names
			.lock()
			.unwrap()
			.push(String::from("issues-steve"));

		let form = desk.begin(Id::new(30), "steve", "buy").await.unwrap();
		let outcome = desk
			.submit_answers(&form.form_id, Id::new(30), Id::new(GUILD), &buy_answers())
			.await
			.unwrap();
		assert!(matches!(outcome, OpenOutcome::Opened(_)));
	}

	#[tokio::test(start_paused = true)]
	async fn unanswered_questionnaire_expires() {
		let desk = desk();
		let form = desk.begin(Id::new(30), "steve", "buy").await.unwrap();
		sleep(ANSWER_WINDOW + Duration::from_secs(1)).await;

		let outcome = desk
			.submit_answers(&form.form_id, Id::new(30), Id::new(GUILD), &buy_answers())
			.await
			.unwrap();
		assert_eq!(outcome, OpenOutcome::Expired);
		assert!(desk.platform().created.lock().unwrap().is_empty());
	}

	#[tokio::test]
	async fn questionnaire_only_accepts_its_owner() {
		let desk = desk();
		let form = desk.begin(Id::new(30), "steve", "buy").await.unwrap();
		let outcome = desk
			.submit_answers(&form.form_id, Id::new(31), Id::new(GUILD), &buy_answers())
			.await
			.unwrap();
		assert_eq!(outcome, OpenOutcome::Expired);

		// The owner can still submit it.
		let outcome = desk
			.submit_answers(&form.form_id, Id::new(30), Id::new(GUILD), &buy_answers())
			.await
			.unwrap();
		assert!(matches!(outcome, OpenOutcome::Opened(_)));
	}

	#[tokio::test]
	async fn questionnaire_is_submitted_once() {
		let desk = desk();
		let form = desk.begin(Id::new(30), "steve", "buy").await.unwrap();
		let first = desk
			.submit_answers(&form.form_id, Id::new(30), Id::new(GUILD), &buy_answers())
			.await
			.unwrap();
		assert!(matches!(first, OpenOutcome::Opened(_)));
		let second = desk
			.submit_answers(&form.form_id, Id::new(30), Id::new(GUILD), &buy_answers())
			.await
			.unwrap();
		assert_eq!(second, OpenOutcome::Expired);
		assert_eq!(desk.platform().created.lock().unwrap().len(), 1);
	}

	#[tokio::test]
	async fn claim_requires_staff_role() {
		let desk = desk();
		let channel = open_buy_ticket(&desk).await;
		assert_eq!(claim(&desk, &channel, &member()).await, ClaimOutcome::NotPermitted);
		assert_eq!(desk.ticket_state(channel.id).await, Some(TicketState::Open));
	}

	#[tokio::test]
	async fn claim_happens_once() {
		let desk = desk();
		let channel = open_buy_ticket(&desk).await;
		assert_eq!(claim(&desk, &channel, &staff()).await, ClaimOutcome::Claimed);
		assert_eq!(desk.ticket_state(channel.id).await, Some(TicketState::Claimed));
		assert_eq!(
			claim(&desk, &channel, &other_staff()).await,
			ClaimOutcome::AlreadyClaimed(staff().id)
		);
	}

	#[tokio::test]
	async fn failed_claim_announcement_is_undone() {
		let desk = desk();
		let channel = open_buy_ticket(&desk).await;
		let result = desk
			.claim(&channel, &staff(), || async { Err(io::Error::other("message edit failed")) })
			.await;
		assert!(result.is_err());
		assert_eq!(desk.ticket_state(channel.id).await, Some(TicketState::Open));

		assert_eq!(claim(&desk, &channel, &other_staff()).await, ClaimOutcome::Claimed);
		assert_eq!(
			claim(&desk, &channel, &staff()).await,
			ClaimOutcome::AlreadyClaimed(other_staff().id)
		);
	}

	#[tokio::test]
	async fn rejected_claim_is_not_announced() {
		let desk = desk();
		let channel = open_buy_ticket(&desk).await;
		let announced = AtomicBool::new(false);
		let announced_flag = &announced;
		let outcome = desk
			.claim(&channel, &member(), move || async move {
				announced_flag.store(true, Ordering::SeqCst);
				Ok::<(), io::Error>(())
			})
			.await
			.unwrap();
		assert_eq!(outcome, ClaimOutcome::NotPermitted);
		assert!(!announced.load(Ordering::SeqCst));
	}

	#[tokio::test]
	async fn deleted_channel_is_forgotten() {
		let desk = desk();
		let channel = open_buy_ticket(&desk).await;
		assert_eq!(desk.ticket_state(channel.id).await, Some(TicketState::Open));

		desk.forget_channel(channel.id).await;
		assert_eq!(desk.ticket_state(channel.id).await, None);
		let state = desk.bot_state.read().await;
		let index = state.get::<TicketIndex>().unwrap();
		assert!(index.open.is_empty());
		assert!(index.closing.is_empty());
	}

	#[tokio::test(start_paused = true)]
	async fn channel_deleted_mid_close_is_forgotten() {
		let desk = desk();
		let channel = open_buy_ticket(&desk).await;
		assert_eq!(desk.close(&channel, &staff(), None).await.unwrap(), CloseOutcome::Closing);
		desk.forget_channel(channel.id).await;
		{
			let state = desk.bot_state.read().await;
			assert!(state.get::<TicketIndex>().unwrap().closing.is_empty());
		}

		sleep(CLOSE_DELAY + Duration::from_secs(1)).await;
		assert_eq!(desk.ticket_state(channel.id).await, None);
	}

	#[tokio::test]
	async fn claim_outside_ticket_channel_is_rejected() {
		let desk = desk();
		let channel = ChannelRef {
			id: Id::new(42),
			name: String::from("general"),
		};
		assert_eq!(claim(&desk, &channel, &staff()).await, ClaimOutcome::NotATicket);
	}

	#[tokio::test(start_paused = true)]
	async fn closing_archives_then_deletes() {
		let desk = desk();
		let channel = open_buy_ticket(&desk).await;
		claim(&desk, &channel, &staff()).await;
		desk.platform().history.lock().unwrap().extend([
			TranscriptEntry {
				timestamp: Utc.timestamp_opt(1_700_000_060, 0).unwrap(),
				message_id: 2,
				author: String::from("helper"),
				content: String::from("On it."),
				attachments: Vec::new(),
			},
			TranscriptEntry {
				timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
				message_id: 1,
				author: String::from("steve"),
				content: String::from("Hello"),
				attachments: Vec::new(),
			},
		]);

		let outcome = desk.close(&channel, &staff(), Some("Resolved")).await.unwrap();
		assert_eq!(outcome, CloseOutcome::Closing);
		assert_eq!(desk.ticket_state(channel.id).await, Some(TicketState::Closing));

		{
			let transcripts = desk.platform().transcripts.lock().unwrap();
			assert_eq!(transcripts.len(), 2);
			let (archive_channel, archive_notice, archive_transcript) = &transcripts[0];
			assert_eq!(*archive_channel, Id::new(TRANSCRIPT_CHANNEL));
			assert!(archive_notice.contains("buy-steve"));
			assert!(archive_notice.contains("Closed by: helper"));
			assert!(archive_notice.contains("Reason: Resolved"));
			assert_eq!(archive_transcript.file_name, format!("transcript-{}.txt", channel.id));
			assert!(archive_transcript.body.starts_with("[2023-11-14T22:13:20.000Z] steve: Hello"));
			let (ticket_channel, ticket_notice, ticket_transcript) = &transcripts[1];
			assert_eq!(*ticket_channel, channel.id);
			assert_eq!(ticket_notice, CLOSING_NOTICE);
			assert_eq!(ticket_transcript, archive_transcript);
		}
		assert!(desk.platform().deleted.lock().unwrap().is_empty());

		sleep(CLOSE_DELAY + Duration::from_secs(1)).await;
		assert_eq!(*desk.platform().deleted.lock().unwrap(), [channel.id]);
		assert_eq!(desk.ticket_state(channel.id).await, None);
	}

	#[tokio::test(start_paused = true)]
	async fn close_without_staff_role_keeps_channel() {
		let desk = desk();
		let channel = open_buy_ticket(&desk).await;
		let outcome = desk.close(&channel, &member(), None).await.unwrap();
		assert_eq!(outcome, CloseOutcome::NotPermitted);

		sleep(CLOSE_DELAY + Duration::from_secs(1)).await;
		assert!(desk.platform().deleted.lock().unwrap().is_empty());
		assert!(desk.platform().transcripts.lock().unwrap().is_empty());
		assert_eq!(desk.ticket_state(channel.id).await, Some(TicketState::Open));
	}

	#[tokio::test]
	async fn close_outside_ticket_channel_is_rejected() {
		let desk = desk();
		let channel = ChannelRef {
			id: Id::new(42),
			name: String::from("general"),
		};
		let outcome = desk.close(&channel, &staff(), None).await.unwrap();
		assert_eq!(outcome, CloseOutcome::NotATicket);
		assert!(desk.platform().transcripts.lock().unwrap().is_empty());
	}

	#[tokio::test(start_paused = true)]
	async fn transcript_failure_keeps_channel() {
		let desk = desk();
		let channel = open_buy_ticket(&desk).await;
		desk.platform().fail_history.store(true, Ordering::SeqCst);

		let result = desk.close(&channel, &staff(), None).await;
		assert!(matches!(result, Err(TicketError::Transcript(_))));

		sleep(CLOSE_DELAY + Duration::from_secs(1)).await;
		assert!(desk.platform().deleted.lock().unwrap().is_empty());
		assert!(desk.platform().transcripts.lock().unwrap().is_empty());
		assert_eq!(desk.ticket_state(channel.id).await, Some(TicketState::Open));

		// Once history is readable again, the ticket can be closed.
		desk.platform().fail_history.store(false, Ordering::SeqCst);
		let outcome = desk.close(&channel, &staff(), None).await.unwrap();
		assert_eq!(outcome, CloseOutcome::Closing);
	}

	#[tokio::test(start_paused = true)]
	async fn closing_twice_is_rejected() {
		let desk = desk();
		let channel = open_buy_ticket(&desk).await;
		assert_eq!(desk.close(&channel, &staff(), None).await.unwrap(), CloseOutcome::Closing);
		assert_eq!(
			desk.close(&channel, &other_staff(), None).await.unwrap(),
			CloseOutcome::AlreadyClosing
		);
		assert_eq!(claim(&desk, &channel, &staff()).await, ClaimOutcome::Closing);

		sleep(CLOSE_DELAY + Duration::from_secs(1)).await;
		assert_eq!(desk.platform().deleted.lock().unwrap().len(), 1);
		assert_eq!(desk.platform().transcripts.lock().unwrap().len(), 2);
	}

	#[tokio::test(start_paused = true)]
	async fn untracked_ticket_channel_can_be_closed() {
		let desk = desk();
		let channel = ChannelRef {
			id: Id::new(77),
			name: String::from("issues-alex"),
		};
		assert_eq!(claim(&desk, &channel, &staff()).await, ClaimOutcome::Claimed);
		assert_eq!(desk.close(&channel, &staff(), None).await.unwrap(), CloseOutcome::Closing);
		sleep(CLOSE_DELAY + Duration::from_secs(1)).await;
		assert_eq!(*desk.platform().deleted.lock().unwrap(), [Id::new(77)]);
	}
}
