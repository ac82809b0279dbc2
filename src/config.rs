// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::categories::{CategoryDefinition, CategoryRegistry, parse_categories};
use miette::{Diagnostic, IntoDiagnostic};
use std::error::Error;
use std::fmt;
use tokio::fs::read_to_string;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, RoleMarker};

pub const DEFAULT_CATEGORIES_FILE: &str = "categories.kdl";
pub const DEFAULT_LISTEN_PORT: u16 = 3000;

pub struct ConfigData {
	pub discord_token: String,
	/// Members with this role may claim and close tickets.
	pub staff_role: Id<RoleMarker>,
	/// The channel to which closed ticket transcripts are archived.
	pub transcript_channel: Id<ChannelMarker>,
	/// The port for the uptime endpoint.
	pub listen_port: u16,
	pub categories: CategoryRegistry,
}

/// Reports every configuration value that is required but missing or unusable.
#[derive(Debug, Default, Diagnostic)]
#[diagnostic(
	code(ticket_warden::config),
	help("set these in the environment or in a .env file in the working directory")
)]
pub struct ConfigError {
	pub missing: Vec<String>,
	pub malformed: Vec<String>,
}

impl ConfigError {
	fn is_empty(&self) -> bool {
		self.missing.is_empty() && self.malformed.is_empty()
	}
}

impl fmt::Display for ConfigError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut parts: Vec<String> = Vec::new();
		if !self.missing.is_empty() {
			parts.push(format!("missing required configuration: {}", self.missing.join(", ")));
		}
		if !self.malformed.is_empty() {
			parts.push(format!("invalid configuration values: {}", self.malformed.join(", ")));
		}
		write!(f, "{}", parts.join("; "))
	}
}

impl Error for ConfigError {}

/// Seeds the process environment from a `.env` file in the working directory, if there is one.
///
/// Variables already set in the environment take precedence over the file.
pub fn load_dotenv() -> miette::Result<()> {
	if let Err(error) = dotenvy::dotenv() {
		if !error.not_found() {
			return Err(error).into_diagnostic();
		}
	}
	Ok(())
}

/// Loads the process configuration from the environment.
pub async fn parse_config() -> miette::Result<ConfigData> {
	let categories_path = env_value("CATEGORIES_FILE").unwrap_or_else(|| String::from(DEFAULT_CATEGORIES_FILE));
	let categories_file_contents = read_to_string(&categories_path).await.into_diagnostic()?;
	let definitions = parse_categories(&categories_path, &categories_file_contents)?;

	let config = load_config(definitions, env_value)?;
	Ok(config)
}

fn env_value(key: &str) -> Option<String> {
	std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Builds the configuration from the category definitions and a source of configuration values.
pub fn load_config(
	definitions: Vec<CategoryDefinition>,
	lookup: impl Fn(&str) -> Option<String>,
) -> Result<ConfigData, ConfigError> {
	let mut error = ConfigError::default();

	let discord_token = lookup("DISCORD_TOKEN");
	if discord_token.is_none() {
		error.missing.push(String::from("DISCORD_TOKEN"));
	}
	let staff_role = snowflake_value(&lookup, "STAFF_ROLE_ID", &mut error);
	let transcript_channel = snowflake_value(&lookup, "TRANSCRIPT_CHANNEL_ID", &mut error);
	let listen_port = match lookup("PORT") {
		Some(port) => match port.trim().parse::<u16>() {
			Ok(port) => Some(port),
			Err(_) => {
				error.malformed.push(String::from("PORT"));
				None
			}
		},
		None => Some(DEFAULT_LISTEN_PORT),
	};

	let mut categories = Vec::with_capacity(definitions.len());
	for definition in definitions {
		let key = definition.destination_key();
		if let Some(destination) = snowflake_value(&lookup, &key, &mut error) {
			categories.push(definition.into_category(destination));
		}
	}

	match (discord_token, staff_role, transcript_channel, listen_port) {
		(Some(discord_token), Some(staff_role), Some(transcript_channel), Some(listen_port)) if error.is_empty() => {
			Ok(ConfigData {
				discord_token,
				staff_role,
				transcript_channel,
				listen_port,
				categories: CategoryRegistry::new(categories),
			})
		}
		_ => Err(error),
	}
}

fn snowflake_value<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, error: &mut ConfigError) -> Option<Id<T>> {
	let Some(value) = lookup(key) else {
		error.missing.push(key.to_string());
		return None;
	};
	let id = value.trim().parse::<u64>().ok().and_then(Id::new_checked);
	if id.is_none() {
		error.malformed.push(key.to_string());
	}
	id
}
