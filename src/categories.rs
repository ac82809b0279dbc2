// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use kdl::{KdlDocument, KdlNode, KdlValue};
use miette::{bail, ensure};
use std::collections::HashSet;
use twilight_model::id::Id;
use twilight_model::id::marker::ChannelMarker;

/// Discord allows at most five text inputs in a single modal.
pub const MAX_FORM_FIELDS: usize = 5;

/// Category labels and descriptions are shown as select menu options.
const MAX_CATEGORY_LABEL_LENGTH: usize = 100;
const MAX_CATEGORY_DESCRIPTION_LENGTH: usize = 100;

/// Question labels are text input labels in the questionnaire modal.
const MAX_QUESTION_LABEL_LENGTH: usize = 45;
const MAX_PLACEHOLDER_LENGTH: usize = 100;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum QuestionStyle {
	Short,
	Paragraph,
}

/// A single questionnaire prompt shown to a user opening a ticket.
#[derive(Clone, Debug)]
pub struct Question {
	/// The form field ID; answers are keyed by this.
	pub field_id: String,
	pub label: String,
	pub placeholder: Option<String>,
	pub required: bool,
	pub style: QuestionStyle,
}

/// A category as written in the category definition file, before its destination folder is known.
#[derive(Clone, Debug)]
pub struct CategoryDefinition {
	pub id: String,
	pub label: String,
	pub description: Option<String>,
	pub emoji: Option<String>,
	pub questions: Vec<Question>,
}

impl CategoryDefinition {
	/// The environment variable holding the destination folder for this category.
	pub fn destination_key(&self) -> String {
		format!("CATEGORY_{}", self.id.to_ascii_uppercase())
	}

	pub fn into_category(self, destination: Id<ChannelMarker>) -> Category {
		Category {
			id: self.id,
			label: self.label,
			description: self.description,
			emoji: self.emoji,
			destination,
			questions: self.questions,
		}
	}
}

#[derive(Clone, Debug)]
pub struct Category {
	pub id: String,
	pub label: String,
	pub description: Option<String>,
	pub emoji: Option<String>,
	/// The channel category (folder) under which this category's ticket channels are created.
	pub destination: Id<ChannelMarker>,
	pub questions: Vec<Question>,
}

impl Category {
	/// Gets the questions that are presented in the questionnaire form.
	///
	/// Categories defining more questions than fit in a form only have the first [MAX_FORM_FIELDS] presented.
	pub fn form_fields(&self) -> &[Question] {
		let shown = self.questions.len().min(MAX_FORM_FIELDS);
		&self.questions[..shown]
	}

	/// The prefix every ticket channel of this category has.
	pub fn channel_prefix(&self) -> String {
		format!("{}-", self.id)
	}
}

/// The immutable set of ticket categories, in panel order.
#[derive(Clone, Debug)]
pub struct CategoryRegistry {
	categories: Vec<Category>,
}

impl CategoryRegistry {
	pub fn new(categories: Vec<Category>) -> Self {
		Self { categories }
	}

	pub fn get(&self, id: &str) -> Option<&Category> {
		self.categories.iter().find(|category| category.id == id)
	}

	pub fn iter(&self) -> impl Iterator<Item = &Category> {
		self.categories.iter()
	}

	/// Gets the category whose ticket channel naming matches the channel name, if any.
	///
	/// Ticket channels have no separate record once the bot restarts, so this is the check for whether a channel is a
	/// ticket channel.
	pub fn category_for_channel(&self, channel_name: &str) -> Option<&Category> {
		self.categories
			.iter()
			.filter(|category| channel_name.starts_with(&category.channel_prefix()))
			.max_by_key(|category| category.id.len())
	}
}

/// Parses and validates the category definition document.
pub fn parse_categories(source_name: &str, contents: &str) -> miette::Result<Vec<CategoryDefinition>> {
	let document: KdlDocument = contents.parse()?;

	let mut definitions: Vec<CategoryDefinition> = Vec::new();
	let mut seen_ids: HashSet<String> = HashSet::new();
	for node in document.nodes() {
		if node.name().value() != "category" {
			bail!(
				"Unexpected node `{}` in {}; only `category` nodes are allowed at the top level",
				node.name().value(),
				source_name
			);
		}
		let definition = parse_category(node)?;
		ensure!(
			seen_ids.insert(definition.id.clone()),
			"Category `{}` is defined more than once in {}",
			definition.id,
			source_name
		);
		if definition.questions.len() > MAX_FORM_FIELDS {
			tracing::warn!(
				category = %definition.id,
				questions = definition.questions.len(),
				"Category has more questions than fit in a form; only the first {} will be asked",
				MAX_FORM_FIELDS
			);
		}
		definitions.push(definition);
	}

	ensure!(!definitions.is_empty(), "No ticket categories are defined in {}", source_name);
	Ok(definitions)
}

fn parse_category(node: &KdlNode) -> miette::Result<CategoryDefinition> {
	let Some(id) = first_argument(node) else {
		bail!("A category is missing its ID argument");
	};
	ensure!(
		is_valid_category_id(&id),
		"Category ID `{}` must be non-empty lowercase letters, digits, and underscores",
		id
	);
	let Some(label) = string_property(node, "label") else {
		bail!("Category `{}` is missing a label", id);
	};
	ensure!(
		(1..=MAX_CATEGORY_LABEL_LENGTH).contains(&label.chars().count()),
		"Category `{}` has a label longer than {} characters or an empty one",
		id,
		MAX_CATEGORY_LABEL_LENGTH
	);
	let description = string_property(node, "description");
	if let Some(description) = description.as_ref() {
		ensure!(
			description.chars().count() <= MAX_CATEGORY_DESCRIPTION_LENGTH,
			"Category `{}` has a description longer than {} characters",
			id,
			MAX_CATEGORY_DESCRIPTION_LENGTH
		);
	}
	let emoji = string_property(node, "emoji");

	let mut questions: Vec<Question> = Vec::new();
	let mut seen_fields: HashSet<String> = HashSet::new();
	if let Some(children) = node.children() {
		for child in children.nodes() {
			if child.name().value() != "question" {
				bail!("Unexpected node `{}` in category `{}`", child.name().value(), id);
			}
			let question = parse_question(&id, child)?;
			ensure!(
				seen_fields.insert(question.field_id.clone()),
				"Question `{}` appears more than once in category `{}`",
				question.field_id,
				id
			);
			questions.push(question);
		}
	}
	ensure!(!questions.is_empty(), "Category `{}` has no questions", id);

	Ok(CategoryDefinition {
		id,
		label,
		description,
		emoji,
		questions,
	})
}

fn parse_question(category_id: &str, node: &KdlNode) -> miette::Result<Question> {
	let Some(field_id) = first_argument(node) else {
		bail!("A question in category `{}` is missing its field ID", category_id);
	};
	let Some(label) = string_property(node, "label") else {
		bail!("Question `{}` in category `{}` is missing a label", field_id, category_id);
	};
	ensure!(
		(1..=MAX_QUESTION_LABEL_LENGTH).contains(&label.chars().count()),
		"Question `{}` in category `{}` needs a label of 1 to {} characters",
		field_id,
		category_id,
		MAX_QUESTION_LABEL_LENGTH
	);
	let placeholder = string_property(node, "placeholder").filter(|placeholder| !placeholder.is_empty());
	if let Some(placeholder) = placeholder.as_ref() {
		ensure!(
			placeholder.chars().count() <= MAX_PLACEHOLDER_LENGTH,
			"Question `{}` in category `{}` has a placeholder longer than {} characters",
			field_id,
			category_id,
			MAX_PLACEHOLDER_LENGTH
		);
	}
	let style = match string_property(node, "style").as_deref() {
		None | Some("short") => QuestionStyle::Short,
		Some("paragraph") => QuestionStyle::Paragraph,
		Some(other) => bail!(
			"Question `{}` in category `{}` has unknown style `{}`",
			field_id,
			category_id,
			other
		),
	};
	let optional = node
		.children()
		.map(|children| children.nodes().iter().any(|child| child.name().value() == "optional"))
		.unwrap_or(false);

	Ok(Question {
		field_id,
		label,
		placeholder,
		required: !optional,
		style,
	})
}

fn first_argument(node: &KdlNode) -> Option<String> {
	node.entries()
		.iter()
		.find(|entry| entry.name().is_none())
		.and_then(|entry| value_string(entry.value()))
}

fn string_property(node: &KdlNode, key: &str) -> Option<String> {
	node.entries()
		.iter()
		.find(|entry| entry.name().map(|name| name.value()) == Some(key))
		.and_then(|entry| value_string(entry.value()))
}

fn value_string(value: &KdlValue) -> Option<String> {
	value.as_string().map(|value| value.to_string())
}

fn is_valid_category_id(id: &str) -> bool {
	!id.is_empty()
		&& id
			.chars()
			.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
