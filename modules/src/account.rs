//! Account module
//!
//! Display names, user lookups and session teardown.

use crate::channel::announce_departure;
use roomchatd_core::{
    utils::{
        string::count_noun,
        time::{idle_minutes, pretty_time},
    },
    ChatError, Context, Event, Module, Result, SessionId, Topic,
};

pub struct AccountModule {
    name: String,
    description: String,
}

impl AccountModule {
    pub fn new() -> Self {
        Self {
            name: "account".to_string(),
            description: "Login, whois, quit and disconnect handling".to_string(),
        }
    }

    fn handle_login(&self, ctx: &mut Context<'_>, session: &SessionId, name: &str) -> Result<()> {
        let old_name = match ctx.state_mut().sessions_mut().rename(session, name) {
            Ok(old_name) => old_name,
            Err(ChatError::NameTaken(taken)) => {
                ctx.reject(session, ChatError::NameTaken(taken));
                return Ok(());
            }
            // Session vanished underneath us; nothing to report to
            Err(_) => return Ok(()),
        };

        if old_name != name {
            tracing::info!("{} is now known as {}", old_name, name);
            let channel = ctx
                .state()
                .session(session)
                .and_then(|s| s.channel())
                .map(str::to_string);
            if let Some(channel) = channel {
                ctx.publish(Event::Message {
                    channel,
                    text: format!("{} is now known as {}", old_name, name),
                })?;
            }
        }

        ctx.reply(session, format!("You are now known as {}.", name));
        Ok(())
    }

    fn handle_whois(&self, ctx: &mut Context<'_>, session: &SessionId, name: &str) -> Result<()> {
        let Some(target) = ctx.state().sessions().find_by_name(name) else {
            ctx.reject(session, ChatError::UserNotFound(name.to_string()));
            return Ok(());
        };

        let idle = idle_minutes(target.last_active, ctx.now());
        let line = format!(
            "User {} (login {}) idle for {}",
            target.display_name(),
            pretty_time(target.login_time),
            count_noun(idle as usize, "minute", "minutes")
        );
        ctx.reply(session, line);
        Ok(())
    }

    fn handle_quit(&self, ctx: &mut Context<'_>, session: &SessionId) -> Result<()> {
        let Some(current) = ctx.state().session(session) else {
            return Ok(());
        };

        if current.channel().is_some() {
            ctx.publish(Event::Leave {
                session: session.clone(),
            })?;
        }

        if let Some((removed, _)) = ctx.state_mut().disconnect(session) {
            removed.send("Goodbye!");
            removed.close();
            tracing::info!("{} ({}) quit", removed.display_name(), removed.id);
        }
        Ok(())
    }

    fn handle_disconnect(&self, ctx: &mut Context<'_>, session: &SessionId) -> Result<()> {
        let Some(name) = ctx
            .state()
            .session(session)
            .map(|s| s.display_name().to_string())
        else {
            return Ok(());
        };

        if let Some(departure) = ctx.state_mut().leave_channel(session) {
            announce_departure(ctx, &name, departure)?;
        }
        ctx.state_mut().disconnect(session);
        tracing::debug!("{} ({}) disconnected", name, session);
        Ok(())
    }
}

impl Default for AccountModule {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for AccountModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn topics(&self) -> Vec<Topic> {
        vec![Topic::Login, Topic::Whois, Topic::Quit, Topic::Disconnect]
    }

    fn handle(&self, ctx: &mut Context<'_>, event: &Event) -> Result<()> {
        match event {
            Event::Login { session, name } => self.handle_login(ctx, session, name),
            Event::Whois { session, name } => self.handle_whois(ctx, session, name),
            Event::Quit { session } => self.handle_quit(ctx, session),
            Event::Disconnect { session } => self.handle_disconnect(ctx, session),
            _ => Ok(()),
        }
    }
}
