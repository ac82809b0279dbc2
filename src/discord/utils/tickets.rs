// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::categories::Category;
use crate::tickets::Ticket;
use twilight_http::request::channel::message::create_message::CreateMessage;
use twilight_mention::fmt::Mention;
use twilight_model::channel::message::AllowedMentions;
use twilight_model::channel::message::component::{ActionRow, Button, ButtonStyle, Component};
use twilight_model::channel::message::embed::{Embed, EmbedField};
use twilight_model::id::Id;
use twilight_model::id::marker::UserMarker;
use twilight_util::builder::embed::{EmbedBuilder, EmbedFieldBuilder, EmbedFooterBuilder};
use twilight_validate::embed::EmbedValidationError;

pub const SUMMARY_COLOR: u32 = 0x3498db;
pub const CLAIMED_BY_FIELD: &str = "Claimed by";

pub const CLAIM_BUTTON_ID: &str = "ticket/claim";
pub const CLOSE_BUTTON_ID: &str = "ticket/close";
pub const CLOSE_REASON_BUTTON_ID: &str = "ticket/close_reason";

/// Contains data necessary to post a message in a ticket channel
pub struct TicketMessageData {
	pub content: Option<String>,
	pub embeds: Vec<Embed>,
	pub components: Vec<Component>,
	pub allowed_mentions: AllowedMentions,
}

impl TicketMessageData {
	/// Adds all of the ticket message data to a [CreateMessage] builder
	pub fn set_create_message_data<'a>(&'a self, mut create_message: CreateMessage<'a>) -> CreateMessage<'a> {
		if let Some(content) = &self.content {
			create_message = create_message.content(content);
		}
		create_message
			.embeds(&self.embeds)
			.components(&self.components)
			.allowed_mentions(Some(&self.allowed_mentions))
	}
}

/// Generates the message greeting the ticket owner in their new ticket channel
pub fn welcome_message(ticket: &Ticket, category: &Category) -> TicketMessageData {
	let content = format!(
		"Welcome {}! Thanks for opening a **{}** ticket. A member of staff will be with you shortly.\nStaff, please claim or close the ticket using the buttons below.",
		ticket.owner.mention(),
		category.label
	);
	let mut allowed_mentions = AllowedMentions::default();
	allowed_mentions.users.push(ticket.owner);
	TicketMessageData {
		content: Some(content),
		embeds: Vec::new(),
		components: Vec::new(),
		allowed_mentions,
	}
}

/// Generates the answer summary posted in a new ticket channel, along with the staff controls
pub fn summary_message(ticket: &Ticket, category: &Category) -> Result<TicketMessageData, EmbedValidationError> {
	let mut embed = EmbedBuilder::new()
		.title(format!("{} - Ticket Summary", category.label))
		.color(SUMMARY_COLOR)
		.description(format!(
			"Category: {}\nOpened by: {}",
			category.label,
			ticket.owner.mention()
		))
		.footer(EmbedFooterBuilder::new(format!("Ticket owner ID: {}", ticket.owner)).build());
	for answer in ticket.answers.iter() {
		let value = if answer.answer.is_empty() {
			String::from("*No answer*")
		} else {
			answer.answer.clone()
		};
		embed = embed.field(EmbedFieldBuilder::new(answer.question.clone(), value).build());
	}
	let embed = embed.validate()?.build();

	Ok(TicketMessageData {
		content: None,
		embeds: vec![embed],
		components: summary_controls(true),
		allowed_mentions: AllowedMentions::default(),
	})
}

/// Gets the staff controls shown under a ticket summary. Once a ticket is claimed, the Claim button is dropped.
pub fn summary_controls(claimable: bool) -> Vec<Component> {
	let mut buttons: Vec<Component> = Vec::new();
	if claimable {
		buttons.push(control_button(CLAIM_BUTTON_ID, "Claim", ButtonStyle::Success));
	}
	buttons.push(control_button(CLOSE_BUTTON_ID, "Close", ButtonStyle::Danger));
	buttons.push(control_button(
		CLOSE_REASON_BUTTON_ID,
		"Close with Reason",
		ButtonStyle::Secondary,
	));
	vec![Component::ActionRow(ActionRow { components: buttons })]
}

fn control_button(custom_id: &str, label: &str, style: ButtonStyle) -> Component {
	Component::Button(Button {
		custom_id: Some(custom_id.to_string()),
		disabled: false,
		emoji: None,
		label: Some(label.to_string()),
		style,
		url: None,
		sku_id: None,
	})
}

/// Gets who the summary shows as having claimed the ticket, if anyone.
pub fn summary_claimant(embeds: &[Embed]) -> Option<&str> {
	embeds
		.first()?
		.fields
		.iter()
		.find(|field| field.name == CLAIMED_BY_FIELD)
		.map(|field| field.value.as_str())
}

/// Gets the summary embeds with the claimant recorded. Applying this more than once leaves a single claim field.
pub fn claimed_summary_embeds(embeds: &[Embed], claimant: Id<UserMarker>) -> Vec<Embed> {
	let mut embeds = embeds.to_vec();
	if let Some(summary) = embeds.first_mut() {
		summary.fields.retain(|field| field.name != CLAIMED_BY_FIELD);
		summary.fields.push(EmbedField {
			inline: false,
			name: String::from(CLAIMED_BY_FIELD),
			value: claimant.mention().to_string(),
		});
	}
	embeds
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::categories::{Question, QuestionStyle};
	use crate::tickets::{Answer, TicketState};

	fn category() -> Category {
		Category {
			id: String::from("buy"),
			label: String::from("BUY"),
			description: None,
			emoji: None,
			destination: Id::new(800),
			questions: vec![Question {
				field_id: String::from("item"),
				label: String::from("What would you like to buy?"),
				placeholder: None,
				required: true,
				style: QuestionStyle::Short,
			}],
		}
	}

	fn ticket() -> Ticket {
		Ticket {
			owner: Id::new(30),
			owner_name: String::from("steve"),
			category: String::from("buy"),
			channel: Id::new(500),
			channel_name: String::from("buy-steve"),
			answers: vec![
				Answer {
					question: String::from("What would you like to buy?"),
					answer: String::from("Rank upgrade"),
				},
				Answer {
					question: String::from("Anything else?"),
					answer: String::new(),
				},
			],
			state: TicketState::Open,
			claimant: None,
		}
	}

	fn button_ids(components: &[Component]) -> Vec<String> {
		let Some(Component::ActionRow(row)) = components.first() else {
			panic!("controls aren't in an action row");
		};
		row.components
			.iter()
			.filter_map(|component| match component {
				Component::Button(button) => button.custom_id.clone(),
				_ => None,
			})
			.collect()
	}

	#[test]
	fn summary_lists_every_answer() {
		let summary = summary_message(&ticket(), &category()).unwrap();
		let embed = &summary.embeds[0];
		assert_eq!(embed.title.as_deref(), Some("BUY - Ticket Summary"));
		assert_eq!(embed.color, Some(SUMMARY_COLOR));
		assert_eq!(embed.fields.len(), 2);
		assert_eq!(embed.fields[0].name, "What would you like to buy?");
		assert_eq!(embed.fields[0].value, "Rank upgrade");
		assert_eq!(embed.fields[1].value, "*No answer*");
		assert_eq!(
			button_ids(&summary.components),
			[CLAIM_BUTTON_ID, CLOSE_BUTTON_ID, CLOSE_REASON_BUTTON_ID]
		);
	}

	#[test]
	fn claimed_controls_drop_claim() {
		assert_eq!(
			button_ids(&summary_controls(false)),
			[CLOSE_BUTTON_ID, CLOSE_REASON_BUTTON_ID]
		);
	}

	#[test]
	fn claiming_twice_keeps_one_field() {
		let summary = summary_message(&ticket(), &category()).unwrap();
		assert_eq!(summary_claimant(&summary.embeds), None);

		let claimed = claimed_summary_embeds(&summary.embeds, Id::new(20));
		let claimed = claimed_summary_embeds(&claimed, Id::new(20));
		let claim_fields = claimed[0]
			.fields
			.iter()
			.filter(|field| field.name == CLAIMED_BY_FIELD)
			.count();
		assert_eq!(claim_fields, 1);
		assert_eq!(summary_claimant(&claimed), Some("<@20>"));
	}

	#[test]
	fn welcome_pings_only_the_owner() {
		let welcome = welcome_message(&ticket(), &category());
		assert!(welcome.content.unwrap().starts_with("Welcome <@30>!"));
		assert_eq!(welcome.allowed_mentions.users, [Id::new(30)]);
		assert!(welcome.allowed_mentions.roles.is_empty());
	}
}
