//! Channel operations module
//!
//! Handles joining, leaving and listing channels, and fans chat text out to
//! channel members.

use roomchatd_core::{
    utils::string::count_noun, ChatError, Context, Departure, Event, Module, Result, SessionId,
    Topic,
};

/// Channel operations module
pub struct ChannelModule {
    name: String,
    description: String,
}

impl ChannelModule {
    pub fn new() -> Self {
        Self {
            name: "channel".to_string(),
            description: "Channel membership, listing and broadcast".to_string(),
        }
    }

    fn handle_message(&self, ctx: &mut Context<'_>, channel: &str, text: &str) -> Result<()> {
        let reached = ctx.state().broadcast(channel, text);
        tracing::trace!("Broadcast to {} reached {} sessions", channel, reached);
        Ok(())
    }

    fn handle_join(&self, ctx: &mut Context<'_>, session: &SessionId, channel: &str) -> Result<()> {
        let Some(current) = ctx.state().session(session) else {
            return Ok(());
        };
        if current.is_in_channel(channel) {
            ctx.reject(session, ChatError::AlreadyInChannel(channel.to_string()));
            return Ok(());
        }
        let name = current.display_name().to_string();

        if let Some(departure) = ctx.state_mut().leave_channel(session) {
            announce_departure(ctx, &name, departure)?;
        }

        ctx.state_mut().join_channel(session, channel)?;
        tracing::debug!("{} joined {}", name, channel);
        ctx.publish(Event::Message {
            channel: channel.to_string(),
            text: format!("{} has joined {}", name, channel),
        })?;

        ctx.publish(Event::Who {
            session: session.clone(),
            channel: channel.to_string(),
        })
    }

    fn handle_leave(&self, ctx: &mut Context<'_>, session: &SessionId) -> Result<()> {
        let Some(name) = ctx
            .state()
            .session(session)
            .map(|s| s.display_name().to_string())
        else {
            return Ok(());
        };

        let Some(departure) = ctx.state_mut().leave_channel(session) else {
            ctx.reject(session, ChatError::NotInChannel);
            return Ok(());
        };

        let channel = departure.channel.clone();
        announce_departure(ctx, &name, departure)?;
        ctx.reply(session, format!("You have left {}.", channel));
        Ok(())
    }

    fn handle_who(&self, ctx: &mut Context<'_>, session: &SessionId, channel: &str) -> Result<()> {
        let state = ctx.state();
        let Some(found) = state.channels().get(channel) else {
            ctx.reject(session, ChatError::ChannelNotFound(channel.to_string()));
            return Ok(());
        };

        let mut names: Vec<&str> = found
            .members()
            .filter_map(|id| state.session(id))
            .map(|s| s.display_name())
            .collect();
        names.sort_unstable();

        ctx.reply(session, format!("Users in {}: {}", channel, names.join(" ")));
        Ok(())
    }

    fn handle_rooms(&self, ctx: &mut Context<'_>, session: &SessionId) -> Result<()> {
        let rooms = ctx.state().channels().list_channels();
        if rooms.is_empty() {
            ctx.reply(
                session,
                "There are no channels. Create one with /join <channel>.",
            );
            return Ok(());
        }

        for room in rooms {
            ctx.reply(
                session,
                format!(
                    "{} ({})",
                    room.name,
                    count_noun(room.member_count, "user", "users")
                ),
            );
        }
        Ok(())
    }
}

impl Default for ChannelModule {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for ChannelModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn topics(&self) -> Vec<Topic> {
        vec![
            Topic::Message,
            Topic::Join,
            Topic::Leave,
            Topic::Who,
            Topic::Rooms,
        ]
    }

    fn handle(&self, ctx: &mut Context<'_>, event: &Event) -> Result<()> {
        match event {
            Event::Message { channel, text } => self.handle_message(ctx, channel, text),
            Event::Join { session, channel } => self.handle_join(ctx, session, channel),
            Event::Leave { session } => self.handle_leave(ctx, session),
            Event::Who { session, channel } => self.handle_who(ctx, session, channel),
            Event::Rooms { session } => self.handle_rooms(ctx, session),
            _ => Ok(()),
        }
    }
}

/// Tell the remaining members someone left, unless nobody is left
pub(crate) fn announce_departure(
    ctx: &mut Context<'_>,
    name: &str,
    departure: Departure,
) -> Result<()> {
    if departure.channel_deleted {
        return Ok(());
    }
    let text = format!("{} has left {}", name, departure.channel);
    ctx.publish(Event::Message {
        channel: departure.channel,
        text,
    })
}
