// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::platform::DiscordPlatform;
use crate::tickets::ChannelRef;
use miette::bail;
use twilight_model::gateway::payload::incoming::InteractionCreate;

/// Gets the channel the interaction happened in. The name comes from the interaction, or the cache if the interaction
/// didn't include it.
pub fn interaction_channel(interaction: &InteractionCreate, platform: &DiscordPlatform) -> miette::Result<ChannelRef> {
	let Some(channel) = &interaction.channel else {
		bail!("Interaction has no channel");
	};
	let name = match &channel.name {
		Some(name) => name.clone(),
		None => match platform.cached_channel_name(channel.id) {
			Some(name) => name,
			None => bail!("Couldn't get the name of channel {}", channel.id),
		},
	};
	Ok(ChannelRef { id: channel.id, name })
}
