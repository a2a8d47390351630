// File: ticketbot-core/src/config.rs
//
// Bot configuration: a JSON file (same keys as the deployed bot's
// `config.json`) with a handful of environment overrides on top.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use serde::Deserialize;
use tracing::{debug, info};

use ticketbot_common::models::TicketCategory;

use crate::Error;

/// Discord allows at most 25 options in one select menu.
pub const MAX_CATEGORIES: usize = 25;
/// Length limit for select option labels and descriptions.
pub const MAX_OPTION_TEXT: usize = 100;
/// Upper bound for `closeDelaySecs` (one day).
pub const MAX_CLOSE_DELAY_SECS: u64 = 86_400;

/// Who receives a DM when a ticket is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AdminAudience {
    /// Members of `adminRoleId`.
    #[default]
    Role,
    /// Members of any role carrying the Administrator permission.
    Permission,
}

/// What happens when a user who already has a ticket channel picks a category again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DuplicatePolicy {
    #[default]
    Allow,
    Reject,
}

/// User-visible strings. `{user}` and `{channel}` are replaced where noted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TicketTexts {
    pub embed_title: String,
    pub embed_description: String,
    pub dropdown_placeholder: String,
    pub setup_done: String,
    pub setup_forbidden: String,
    pub setup_failed: String,
    pub invalid_channel: String,
    pub invalid_category: String,
    /// `{channel}`: the existing ticket.
    pub duplicate_ticket: String,
    pub create_failed: String,
    /// `{user}`: mention of the ticket opener.
    pub welcome: String,
    pub close_button_label: String,
    pub ticket_created: String,
    pub no_permission: String,
    pub closing: String,
    pub close_failed: String,
    pub not_a_ticket: String,
    pub unknown_command: String,
}

impl Default for TicketTexts {
    fn default() -> Self {
        Self {
            embed_title: "Support Tickets".to_string(),
            embed_description: "**Open a ticket!**\n\n\
                **How to create a ticket?**\n\
                Please choose the right category when opening a ticket. If you don't know what it falls under, please open a general support ticket.\n\n\
                ```Once you open a ticket, you'll have to answer the questions. Please fill them out so we can help you quickly and understand your issue better!```"
                .to_string(),
            dropdown_placeholder: "Select a ticket category".to_string(),
            setup_done: "Ticket system set up!".to_string(),
            setup_forbidden: "Only administrators can set up the ticket system.".to_string(),
            setup_failed: "Could not post the ticket menu in that channel.".to_string(),
            invalid_channel: "Please select a text channel!".to_string(),
            invalid_category: "Invalid category ID in the config file.".to_string(),
            duplicate_ticket: "You already have an open ticket: {channel}".to_string(),
            create_failed: "Could not create your ticket channel. Please contact a staff member."
                .to_string(),
            welcome: "Hey there {user}! Thanks for opening a ticket!\n\
                An available staff member will assist you shortly. Please be patient!"
                .to_string(),
            close_button_label: "Close Ticket".to_string(),
            ticket_created: "Ticket created successfully!".to_string(),
            no_permission: "You do not have permission to close this ticket!".to_string(),
            closing: "Ticket will be closed shortly...".to_string(),
            close_failed: "Could not schedule this ticket for closing. Please try again."
                .to_string(),
            not_a_ticket: "This channel is not a ticket.".to_string(),
            unknown_command: "Unrecognized command".to_string(),
        }
    }
}

fn default_timezone() -> String {
    "Asia/Kolkata".to_string()
}

fn default_close_delay_secs() -> u64 {
    3
}

fn default_notify_concurrency() -> usize {
    8
}

fn default_pending_deletions_path() -> PathBuf {
    PathBuf::from("pending_deletions.json")
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotConfig {
    #[serde(default)]
    pub token: String,
    /// Application id.
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub guild_id: String,
    #[serde(default)]
    pub admin_role_id: String,
    pub categories: Vec<TicketCategory>,
    #[serde(default)]
    pub texts: TicketTexts,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_close_delay_secs")]
    pub close_delay_secs: u64,
    #[serde(default)]
    pub admin_audience: AdminAudience,
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
    #[serde(default = "default_notify_concurrency")]
    pub notify_concurrency: usize,
    #[serde(default = "default_pending_deletions_path")]
    pub pending_deletions_path: PathBuf,
}

impl BotConfig {
    /// Reads the file, applies environment overrides, then validates.
    pub fn load(path: &Path) -> Result<Self, Error> {
        info!("Loading configuration from {}", path.display());
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        let mut config = Self::from_json_str(&raw)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse without validating. Errors name the offending JSON path.
    pub fn from_json_str(raw: &str) -> Result<Self, Error> {
        let de = &mut serde_json::Deserializer::from_str(raw);
        serde_path_to_error::deserialize(de).map_err(|e| {
            Error::Config(format!("invalid config at `{}`: {}", e.path(), e.inner()))
        })
    }

    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let overrides: [(&str, &mut String); 4] = [
            ("DISCORD_TOKEN", &mut self.token),
            ("DISCORD_CLIENT_ID", &mut self.client_id),
            ("DISCORD_GUILD_ID", &mut self.guild_id),
            ("TICKET_ADMIN_ROLE_ID", &mut self.admin_role_id),
        ];
        for (key, slot) in overrides {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                debug!("Config override from environment: {key}");
                *slot = value.trim().to_string();
            }
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.token.trim().is_empty() {
            return Err(Error::Config(
                "bot token is missing (set `token` or DISCORD_TOKEN)".into(),
            ));
        }
        require_snowflake("clientId", &self.client_id)?;
        require_snowflake("guildId", &self.guild_id)?;
        // The role also authorizes closes, so validate it whenever it is set.
        if self.admin_audience == AdminAudience::Role || !self.admin_role_id.is_empty() {
            require_snowflake("adminRoleId", &self.admin_role_id)?;
        }

        if self.categories.is_empty() {
            return Err(Error::Config("at least one ticket category is required".into()));
        }
        if self.categories.len() > MAX_CATEGORIES {
            return Err(Error::Config(format!(
                "{} categories configured, at most {MAX_CATEGORIES} fit in one menu",
                self.categories.len()
            )));
        }
        for (idx, category) in self.categories.iter().enumerate() {
            require_snowflake(&format!("categories[{idx}].categoryId"), &category.category_id)?;
            let label_len = category.label.chars().count();
            if category.label.trim().is_empty() || label_len > MAX_OPTION_TEXT {
                return Err(Error::Config(format!(
                    "categories[{idx}].label must be 1-{MAX_OPTION_TEXT} characters"
                )));
            }
            if category.description.chars().count() > MAX_OPTION_TEXT {
                return Err(Error::Config(format!(
                    "categories[{idx}].description exceeds {MAX_OPTION_TEXT} characters"
                )));
            }
            if self.categories[..idx]
                .iter()
                .any(|other| other.category_id == category.category_id)
            {
                return Err(Error::Config(format!(
                    "duplicate category id {}",
                    category.category_id
                )));
            }
        }

        self.tz()?;
        if !(1..=MAX_CLOSE_DELAY_SECS).contains(&self.close_delay_secs) {
            return Err(Error::Config(format!(
                "closeDelaySecs must be between 1 and {MAX_CLOSE_DELAY_SECS}, got {}",
                self.close_delay_secs
            )));
        }
        if self.notify_concurrency == 0 {
            return Err(Error::Config("notifyConcurrency must be at least 1".into()));
        }
        Ok(())
    }

    pub fn tz(&self) -> Result<Tz, Error> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| Error::Config(format!("invalid timezone '{}': {e}", self.timezone)))
    }

    pub fn close_delay(&self) -> Duration {
        Duration::from_secs(self.close_delay_secs)
    }

    pub fn category(&self, category_id: &str) -> Option<&TicketCategory> {
        self.categories.iter().find(|c| c.category_id == category_id)
    }
}

fn require_snowflake(field: &str, value: &str) -> Result<(), Error> {
    match value.parse::<u64>() {
        Ok(id) if id > 0 => Ok(()),
        _ => Err(Error::Config(format!("`{field}` must be a numeric id, got '{value}'"))),
    }
}
