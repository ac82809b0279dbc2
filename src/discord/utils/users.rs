// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::tickets::Actor;
use miette::bail;
use twilight_model::gateway::payload::incoming::InteractionCreate;

/// Gets the user who triggered the interaction, along with their roles in the guild.
///
/// The actor's name is their account username, which is also what ticket channels are named after.
pub fn interaction_actor(interaction: &InteractionCreate) -> miette::Result<Actor> {
	let Some(user) = interaction.author() else {
		bail!("Interaction isn't from a user");
	};
	let roles = match &interaction.member {
		Some(member) => member.roles.clone(),
		None => Vec::new(),
	};
	Ok(Actor {
		id: user.id,
		name: user.name.clone(),
		roles,
	})
}
