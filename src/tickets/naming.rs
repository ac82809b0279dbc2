// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::categories::{Category, CategoryRegistry};
use twilight_model::id::Id;
use twilight_model::id::marker::UserMarker;

/// The number of tickets a user may have open at once.
pub const MAX_OPEN_TICKETS: usize = 2;

/// Gets the channel name for a new ticket: `<category-id>-<username>`.
///
/// The username is reduced to lowercase ASCII letters and digits; if nothing is left, the user ID stands in.
pub fn ticket_channel_name(category: &Category, username: &str, user_id: Id<UserMarker>) -> String {
	let sanitized: String = username
		.chars()
		.filter(|c| c.is_ascii_alphanumeric())
		.map(|c| c.to_ascii_lowercase())
		.collect();
	if sanitized.is_empty() {
		format!("{}{}", category.channel_prefix(), user_id.get())
	} else {
		format!("{}{}", category.channel_prefix(), sanitized)
	}
}

/// Counts the ticket channels that look like they belong to the user.
///
/// This matches the username as a case-insensitive substring of ticket channel names, so users with similar names
/// may be counted against each other, and names with characters stripped by [ticket_channel_name] may be missed.
pub fn count_open_tickets<'a>(
	channel_names: impl IntoIterator<Item = &'a str>,
	registry: &CategoryRegistry,
	username: &str,
) -> usize {
	let username = username.to_lowercase();
	channel_names
		.into_iter()
		.filter(|name| registry.category_for_channel(name).is_some())
		.filter(|name| name.to_lowercase().contains(&username))
		.count()
}
