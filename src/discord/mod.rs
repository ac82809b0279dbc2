// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::tickets::lifecycle::TicketDesk;
use platform::DiscordPlatform;

mod commands;
mod connection;
mod interactions;
mod platform;
mod utils;

pub use connection::{run_bot, set_up_client};

/// The ticket desk as run against Discord
pub type Desk = TicketDesk<DiscordPlatform>;
