// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::categories::{CategoryRegistry, Question, QuestionStyle};
use twilight_model::channel::message::EmojiReactionType;
use twilight_model::channel::message::component::{
	ActionRow, Component, SelectMenu, SelectMenuOption, SelectMenuType, TextInput, TextInputStyle,
};
use twilight_model::channel::message::embed::Embed;
use twilight_model::id::Id;
use twilight_util::builder::embed::EmbedBuilder;
use twilight_validate::embed::EmbedValidationError;

pub const CATEGORY_SELECT_ID: &str = "ticket/select";
pub const REASON_MODAL_ID: &str = "ticket/reason";
pub const REASON_FIELD_ID: &str = "reason";

/// Discord's limit on modal titles and text input labels
pub const MAX_MODAL_TEXT_LENGTH: usize = 45;
const MAX_PLACEHOLDER_LENGTH: usize = 100;
const MAX_SELECT_DESCRIPTION_LENGTH: usize = 100;
const MAX_ANSWER_LENGTH: u16 = 1024;
const MAX_REASON_LENGTH: u16 = 1000;

const PANEL_COLOR: u32 = 0xffff00;

/// Cuts text down to at most `max_chars` characters.
pub fn truncate(text: &str, max_chars: usize) -> String {
	text.chars().take(max_chars).collect()
}

pub fn panel_embed() -> Result<Embed, EmbedValidationError> {
	let embed = EmbedBuilder::new()
		.title("Support Tickets")
		.description("Tickets are used to provide support to members of the server!\nPlease don't waste time with tickets and try to respond quickly. Only open a ticket if necessary.")
		.color(PANEL_COLOR)
		.validate()?
		.build();
	Ok(embed)
}

/// Gets the panel's category select menu, with one option per category in definition order
pub fn category_select(categories: &CategoryRegistry) -> Component {
	let options: Vec<SelectMenuOption> = categories
		.iter()
		.map(|category| SelectMenuOption {
			default: false,
			description: category
				.description
				.as_deref()
				.map(|description| truncate(description, MAX_SELECT_DESCRIPTION_LENGTH)),
			emoji: category.emoji.as_deref().and_then(parse_emoji),
			label: category.label.clone(),
			value: category.id.clone(),
		})
		.collect();
	let select_menu = SelectMenu {
		channel_types: None,
		custom_id: String::from(CATEGORY_SELECT_ID),
		default_values: None,
		disabled: false,
		kind: SelectMenuType::Text,
		max_values: Some(1),
		min_values: Some(1),
		options: Some(options),
		placeholder: Some(String::from("Choose a ticket category")),
	};
	Component::ActionRow(ActionRow {
		components: vec![Component::SelectMenu(select_menu)],
	})
}

/// Parses an emoji as written in a message, either a custom emoji (`<:name:id>`, `<a:name:id>`) or a unicode one.
pub fn parse_emoji(emoji: &str) -> Option<EmojiReactionType> {
	let emoji = emoji.trim();
	if emoji.is_empty() {
		return None;
	}
	let Some(custom) = emoji.strip_prefix('<').and_then(|emoji| emoji.strip_suffix('>')) else {
		return Some(EmojiReactionType::Unicode {
			name: emoji.to_string(),
		});
	};

	let (animated, custom) = match custom.strip_prefix("a:") {
		Some(custom) => (true, custom),
		None => (false, custom.strip_prefix(':')?),
	};
	let (name, id) = custom.split_once(':')?;
	let id = Id::new_checked(id.parse().ok()?)?;
	let name = if name.is_empty() { None } else { Some(name.to_string()) };
	Some(EmojiReactionType::Custom { animated, id, name })
}

pub fn modal_title(category_label: &str) -> String {
	truncate(&format!("{} Ticket", category_label), MAX_MODAL_TEXT_LENGTH)
}

/// Gets one text input row per questionnaire field
pub fn questionnaire_components(fields: &[Question]) -> Vec<Component> {
	fields
		.iter()
		.map(|field| {
			let style = match field.style {
				QuestionStyle::Short => TextInputStyle::Short,
				QuestionStyle::Paragraph => TextInputStyle::Paragraph,
			};
			let input = TextInput {
				custom_id: field.field_id.clone(),
				label: truncate(&field.label, MAX_MODAL_TEXT_LENGTH),
				max_length: Some(MAX_ANSWER_LENGTH),
				min_length: None,
				placeholder: field
					.placeholder
					.as_deref()
					.map(|placeholder| truncate(placeholder, MAX_PLACEHOLDER_LENGTH)),
				required: Some(field.required),
				style,
				value: None,
			};
			Component::ActionRow(ActionRow {
				components: vec![Component::TextInput(input)],
			})
		})
		.collect()
}

pub fn close_reason_components() -> Vec<Component> {
	let reason_input = TextInput {
		custom_id: String::from(REASON_FIELD_ID),
		label: String::from("Reason for closing"),
		max_length: Some(MAX_REASON_LENGTH),
		min_length: None,
		placeholder: Some(String::from("Why is this ticket being closed?")),
		required: Some(true),
		style: TextInputStyle::Paragraph,
		value: None,
	};
	vec![Component::ActionRow(ActionRow {
		components: vec![Component::TextInput(reason_input)],
	})]
}
