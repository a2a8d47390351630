// File: ticketbot-core/src/services/ticket/handler.rs

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use ticketbot_common::models::{
    ChannelInfo, ChannelKind, CreateChannelRequest, InteractionRef, MessageHandle,
    OverwriteTarget, PendingDeletion, Permission, PermissionOverwrite,
};

use crate::Error;
use crate::config::{AdminAudience, BotConfig, DuplicatePolicy};
use crate::services::session::PlatformSession;
use crate::services::ticket::commands::{SETUP_CHANNEL_OPTION, SETUP_COMMAND};
use crate::services::ticket::events::{
    Actor, ButtonPressed, CommandInvoked, CommandOptionValue, SelectionMade, TicketEvent,
};
use crate::services::ticket::messages::{self, CLOSE_BUTTON_ID, TICKET_MENU_ID};
use crate::services::ticket::naming::ticket_channel_name;
use crate::services::ticket::notify::{self, NotificationReport};
use crate::tasks::DeletionScheduler;
use crate::utils::time::format_in_timezone;

/// What a handled event amounted to.
#[derive(Debug)]
pub enum TicketOutcome {
    MenuPosted(MessageHandle),
    TicketOpened {
        channel: ChannelInfo,
        notifications: NotificationReport,
    },
    CloseScheduled(PendingDeletion),
    /// The actor got a private explanation; nothing else happened.
    Rejected(Error),
    Ignored,
}

/// The ticket lifecycle: setup prompt, ticket creation, close.
pub struct TicketHandler {
    session: Arc<PlatformSession>,
    config: Arc<BotConfig>,
    scheduler: Arc<DeletionScheduler>,
}

impl TicketHandler {
    pub fn new(
        session: Arc<PlatformSession>,
        config: Arc<BotConfig>,
        scheduler: Arc<DeletionScheduler>,
    ) -> Self {
        Self {
            session,
            config,
            scheduler,
        }
    }

    /// Entry point for the event loop: dispatch and log the result.
    pub async fn handle(&self, event: TicketEvent) {
        let event_type = event.event_type();
        let user_id = event.actor().user_id.clone();
        match self.dispatch(event).await {
            Ok(TicketOutcome::Ignored) => {}
            Ok(TicketOutcome::Rejected(reason)) => {
                info!("Rejected {event_type} from user {user_id}: {reason}");
            }
            Ok(outcome) => debug!("Handled {event_type} from user {user_id}: {outcome:?}"),
            Err(e) => error!("Failed to handle {event_type} from user {user_id}: {e}"),
        }
    }

    pub async fn dispatch(&self, event: TicketEvent) -> Result<TicketOutcome, Error> {
        match event {
            TicketEvent::CommandInvoked(cmd) => self.on_command(cmd).await,
            TicketEvent::SelectionMade(selection) => self.on_selection(selection).await,
            TicketEvent::ButtonPressed(button) => self.on_button(button).await,
        }
    }

    async fn on_command(&self, cmd: CommandInvoked) -> Result<TicketOutcome, Error> {
        if cmd.command_name == SETUP_COMMAND {
            return self.setup(cmd).await;
        }
        debug!("Unrecognized command '{}'", cmd.command_name);
        let text = format!("{}: {}", self.config.texts.unknown_command, cmd.command_name);
        self.reply(&cmd.interaction, &text).await;
        Ok(TicketOutcome::Ignored)
    }

    async fn on_selection(&self, selection: SelectionMade) -> Result<TicketOutcome, Error> {
        if selection.menu_id != TICKET_MENU_ID {
            debug!("Ignoring selection from unknown menu '{}'", selection.menu_id);
            return Ok(TicketOutcome::Ignored);
        }
        self.open_ticket(selection).await
    }

    async fn on_button(&self, button: ButtonPressed) -> Result<TicketOutcome, Error> {
        if button.button_id != CLOSE_BUTTON_ID {
            debug!("Ignoring unknown button '{}'", button.button_id);
            return Ok(TicketOutcome::Ignored);
        }
        self.close_ticket(button).await
    }

    /// `Idle -> AwaitingCategorySelection`: post the category menu.
    async fn setup(&self, cmd: CommandInvoked) -> Result<TicketOutcome, Error> {
        let texts = &self.config.texts;

        if !self.is_administrator(&cmd.actor).await {
            let err = Error::Permission(format!(
                "user {} may not run {SETUP_COMMAND}",
                cmd.actor.user_id
            ));
            return Ok(self.reject(&cmd.interaction, &texts.setup_forbidden, err).await);
        }

        let Some(CommandOptionValue::Channel { channel_id, kind }) =
            cmd.option(SETUP_CHANNEL_OPTION)
        else {
            let err = Error::Validation("missing channel option".into());
            return Ok(self.reject(&cmd.interaction, &texts.invalid_channel, err).await);
        };

        let kind = match kind {
            Some(kind) => Some(*kind),
            None => match self.session.platform().fetch_channel(channel_id).await {
                Ok(channel) => channel.map(|c| c.kind),
                Err(e) => {
                    error!("Could not look up setup channel {channel_id}: {e}");
                    self.reply(&cmd.interaction, &texts.setup_failed).await;
                    return Err(e);
                }
            },
        };
        if !kind.is_some_and(|k| k.is_text_capable()) {
            let err = Error::Validation(format!("channel {channel_id} is not a text channel"));
            return Ok(self.reject(&cmd.interaction, &texts.invalid_channel, err).await);
        }

        let menu = messages::category_menu(texts, &self.config.categories);
        let posted = match self.session.platform().send_message(channel_id, &menu).await {
            Ok(posted) => posted,
            Err(e) => {
                error!("Could not post ticket menu in channel {channel_id}: {e}");
                self.reply(&cmd.interaction, &texts.setup_failed).await;
                return Err(e);
            }
        };
        info!(
            "Ticket menu posted in channel {channel_id} by {} ({} categories)",
            cmd.actor.username,
            self.config.categories.len()
        );

        self.reply(&cmd.interaction, &texts.setup_done).await;
        Ok(TicketOutcome::MenuPosted(posted))
    }

    /// `AwaitingCategorySelection -> ChannelOpen`.
    async fn open_ticket(&self, selection: SelectionMade) -> Result<TicketOutcome, Error> {
        let texts = &self.config.texts;
        let platform = self.session.platform();
        let actor = &selection.actor;

        // 1. resolve the category, failing closed
        let Some(category_id) = selection.values.first() else {
            let err = Error::Validation("selection carried no value".into());
            return Ok(self.reject(&selection.interaction, &texts.invalid_category, err).await);
        };
        let category = match self.resolve_category(category_id).await {
            Ok(category) => category,
            Err(err) => {
                return Ok(self.reject(&selection.interaction, &texts.invalid_category, err).await);
            }
        };

        // 2. duplicate policy
        let name = ticket_channel_name(&actor.username, &actor.user_id);
        if self.config.duplicate_policy == DuplicatePolicy::Reject {
            let existing = match self.find_existing_ticket(&name).await {
                Ok(existing) => existing,
                Err(e) => {
                    error!("Could not check for an existing ticket '{name}': {e}");
                    self.reply(&selection.interaction, &texts.create_failed).await;
                    return Err(e);
                }
            };
            if let Some(existing) = existing {
                let text = texts
                    .duplicate_ticket
                    .replace("{channel}", &messages::channel_mention(&existing.channel_id));
                let err = Error::Validation(format!(
                    "user {} already has ticket channel {}",
                    actor.user_id, existing.channel_id
                ));
                return Ok(self.reject(&selection.interaction, &text, err).await);
            }
        }

        // 3. create the channel; failure aborts the whole transition
        let request = ticket_channel_request(&name, &category.channel_id, &actor.user_id);
        let channel = match platform.create_channel(&request).await {
            Ok(channel) => channel,
            Err(e) => {
                error!(
                    "Could not create ticket channel '{name}' under {} for {}: {e}",
                    category.channel_id, actor.user_id
                );
                self.reply(&selection.interaction, &texts.create_failed).await;
                return Err(e);
            }
        };
        info!(
            "Opened ticket channel {} ('{}') in '{}' for {} ({})",
            channel.channel_id, channel.name, category.name, actor.username, actor.user_id
        );
        // the interaction must be answered within 3 s of the selection
        self.reply(&selection.interaction, &texts.ticket_created).await;

        // 4.-5. best effort, the channel stays regardless
        if let Err(e) = platform
            .send_message(&channel.channel_id, &messages::welcome(texts, &actor.user_id))
            .await
        {
            warn!("Could not post welcome message in {}: {e}", channel.channel_id);
        }
        if let Err(e) = platform
            .send_message(&channel.channel_id, &messages::close_controls(texts))
            .await
        {
            warn!("Could not post close button in {}: {e}", channel.channel_id);
        }

        // 6. staff notification, never fatal
        let notifications = self.notify_staff(actor, &category, &channel).await;

        Ok(TicketOutcome::TicketOpened {
            channel,
            notifications,
        })
    }

    /// `ChannelOpen -> ClosePending`; the scheduler takes it to `Closed`.
    async fn close_ticket(&self, button: ButtonPressed) -> Result<TicketOutcome, Error> {
        let texts = &self.config.texts;

        if !self.is_administrator(&button.actor).await {
            let err = Error::Permission(format!(
                "user {} may not close channel {}",
                button.actor.user_id, button.channel_id
            ));
            return Ok(self.reject(&button.interaction, &texts.no_permission, err).await);
        }

        if let Some(kind) = button.channel_kind.filter(|k| *k != ChannelKind::Text) {
            let err = Error::Validation(format!(
                "close pressed in channel {} of kind {kind:?}",
                button.channel_id
            ));
            return Ok(self.reject(&button.interaction, &texts.not_a_ticket, err).await);
        }

        let scheduled = self
            .scheduler
            .schedule(
                &button.channel_id,
                &button.actor.user_id,
                self.config.close_delay(),
            )
            .await;
        match scheduled {
            Ok(pending) => {
                self.reply(&button.interaction, &texts.closing).await;
                Ok(TicketOutcome::CloseScheduled(pending))
            }
            Err(e) => {
                self.reply(&button.interaction, &texts.close_failed).await;
                Err(e)
            }
        }
    }

    /// A category id is accepted only if it is configured and still points
    /// at a live category channel.
    async fn resolve_category(&self, category_id: &str) -> Result<ChannelInfo, Error> {
        if self.config.category(category_id).is_none() {
            return Err(Error::Validation(format!(
                "category {category_id} is not configured"
            )));
        }
        match self.session.platform().fetch_channel(category_id).await {
            Ok(Some(channel)) if channel.kind == ChannelKind::Category => Ok(channel),
            Ok(Some(channel)) => Err(Error::Validation(format!(
                "channel {category_id} is a {:?}, not a category",
                channel.kind
            ))),
            Ok(None) => Err(Error::Validation(format!(
                "category {category_id} does not exist"
            ))),
            Err(e) => Err(Error::Validation(format!(
                "category {category_id} could not be resolved: {e}"
            ))),
        }
    }

    async fn find_existing_ticket(&self, name: &str) -> Result<Option<ChannelInfo>, Error> {
        for category in &self.config.categories {
            let children = self
                .session
                .platform()
                .list_child_channels(&category.category_id)
                .await?;
            if let Some(found) = children.into_iter().find(|c| c.name == name) {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    async fn notify_staff(
        &self,
        opener: &Actor,
        category: &ChannelInfo,
        channel: &ChannelInfo,
    ) -> NotificationReport {
        let platform = self.session.platform();
        let recipients = notify::resolve_audience(
            platform.as_ref(),
            self.config.admin_audience,
            &self.config.admin_role_id,
        )
        .await;
        if recipients.is_empty() {
            return NotificationReport::default();
        }

        let opened_at = match self.config.tz() {
            Ok(tz) => format_in_timezone(Utc::now(), tz),
            Err(_) => format_in_timezone(Utc::now(), chrono_tz::UTC),
        };
        let message = messages::admin_notification(
            &opener.user_id,
            &opened_at,
            &category.name,
            &channel.channel_id,
        );
        notify::fan_out(
            platform.as_ref(),
            &recipients,
            &message,
            self.config.notify_concurrency,
        )
        .await
    }

    /// Administrator = the Administrator permission, or the configured admin role.
    async fn is_administrator(&self, actor: &Actor) -> bool {
        if actor.has_permission(Permission::Administrator) == Some(true) {
            return true;
        }
        if self.config.admin_audience == AdminAudience::Role
            && !self.config.admin_role_id.is_empty()
            && actor.role_ids.iter().any(|r| *r == self.config.admin_role_id)
        {
            return true;
        }
        if actor.permissions.is_some() {
            return false;
        }
        match self
            .session
            .platform()
            .member_has_permission(&actor.user_id, Permission::Administrator)
            .await
        {
            Ok(allowed) => allowed,
            Err(e) => {
                warn!("Permission lookup for {} failed, denying: {e}", actor.user_id);
                false
            }
        }
    }

    async fn reject(
        &self,
        interaction: &InteractionRef,
        text: &str,
        reason: Error,
    ) -> TicketOutcome {
        self.reply(interaction, text).await;
        TicketOutcome::Rejected(reason)
    }

    async fn reply(&self, interaction: &InteractionRef, text: &str) {
        if let Err(e) = self.session.platform().reply_private(interaction, text).await {
            warn!("Could not reply to interaction {}: {e}", interaction.id);
        }
    }
}

/// Everyone is denied view; the opener may view, write and read history.
pub fn ticket_channel_request(
    name: &str,
    category_id: &str,
    opener_id: &str,
) -> CreateChannelRequest {
    CreateChannelRequest {
        name: name.to_string(),
        parent_id: category_id.to_string(),
        permission_overwrites: vec![
            PermissionOverwrite {
                target: OverwriteTarget::EveryoneRole,
                allow: Vec::new(),
                deny: vec![Permission::ViewChannel],
            },
            PermissionOverwrite {
                target: OverwriteTarget::Member(opener_id.to_string()),
                allow: vec![
                    Permission::ViewChannel,
                    Permission::SendMessages,
                    Permission::ReadMessageHistory,
                ],
                deny: Vec::new(),
            },
        ],
    }
}
