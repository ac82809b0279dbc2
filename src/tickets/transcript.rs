// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, SecondsFormat, Utc};
use twilight_model::id::Id;
use twilight_model::id::marker::ChannelMarker;

/// The most messages a transcript covers. Older history isn't included.
pub const TRANSCRIPT_LIMIT: usize = 100;

/// A single message as it appears in a transcript.
#[derive(Clone, Debug)]
pub struct TranscriptEntry {
	pub timestamp: DateTime<Utc>,
	/// Orders messages sent within the same millisecond.
	pub message_id: u64,
	pub author: String,
	pub content: String,
	pub attachments: Vec<String>,
}

impl TranscriptEntry {
	fn render(&self) -> String {
		let timestamp = self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true);
		let mut line = format!("[{}] {}: {}", timestamp, self.author, self.content);
		if !self.attachments.is_empty() {
			if !self.content.is_empty() {
				line.push(' ');
			}
			line.push_str(&format!("[attachments: {}]", self.attachments.join(", ")));
		}
		line
	}
}

/// A downloadable text rendering of a ticket channel's recent history.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Transcript {
	pub file_name: String,
	pub body: String,
}

impl Transcript {
	/// Renders the messages oldest first, keeping only the newest [TRANSCRIPT_LIMIT] of them.
	pub fn render(channel: Id<ChannelMarker>, mut entries: Vec<TranscriptEntry>) -> Self {
		entries.sort_by_key(|entry| (entry.timestamp, entry.message_id));
		let skip = entries.len().saturating_sub(TRANSCRIPT_LIMIT);
		let body = entries[skip..]
			.iter()
			.map(TranscriptEntry::render)
			.collect::<Vec<String>>()
			.join("\n");
		Self {
			file_name: format!("transcript-{}.txt", channel.get()),
			body,
		}
	}

	pub fn line_count(&self) -> usize {
		if self.body.is_empty() { 0 } else { self.body.lines().count() }
	}
}
