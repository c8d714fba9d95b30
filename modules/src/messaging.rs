//! Private messaging module
//!
//! `/msg <name> <text>` delivers one line to exactly two parties: the
//! recipient and, as confirmation, the sender.

use roomchatd_core::{ChatError, Context, Event, Module, Result, SessionId, Topic};

pub struct MessagingModule {
    name: String,
    description: String,
}

impl MessagingModule {
    pub fn new() -> Self {
        Self {
            name: "messaging".to_string(),
            description: "Direct messages between users".to_string(),
        }
    }

    fn handle_msg(
        &self,
        ctx: &mut Context<'_>,
        session: &SessionId,
        target: &str,
        text: &str,
    ) -> Result<()> {
        let state = ctx.state();
        let Some(sender) = state.session(session) else {
            return Ok(());
        };
        let Some(recipient) = state.sessions().find_by_name(target) else {
            ctx.reject(session, ChatError::UserNotFound(target.to_string()));
            return Ok(());
        };

        let line = format_private(sender.display_name(), recipient.display_name(), text);
        recipient.send(line.as_str());
        if recipient.id != sender.id {
            sender.send(line);
        }
        tracing::trace!("Private message from {} to {}", sender.id, recipient.id);
        Ok(())
    }
}

impl Default for MessagingModule {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for MessagingModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn topics(&self) -> Vec<Topic> {
        vec![Topic::Msg]
    }

    fn handle(&self, ctx: &mut Context<'_>, event: &Event) -> Result<()> {
        match event {
            Event::Msg {
                session,
                target,
                text,
            } => self.handle_msg(ctx, session, target, text),
            _ => Ok(()),
        }
    }
}

fn format_private(from: &str, to: &str, text: &str) -> String {
    format!("[{} -> {}] {}", from, to, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_private() {
        assert_eq!(
            format_private("alice", "bob", "hi there"),
            "[alice -> bob] hi there"
        );
    }
}
