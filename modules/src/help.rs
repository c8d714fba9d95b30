//! Help Module
//!
//! Sends the command reference on `/help` and the message of the day when a
//! session connects.

use roomchatd_core::{Context, Event, Module, MotdManager, Result, SessionId, Topic};

/// One line of the command reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpTopic {
    pub syntax: &'static str,
    pub description: &'static str,
}

const HELP_TOPICS: &[HelpTopic] = &[
    HelpTopic {
        syntax: "/help",
        description: "Show this command reference",
    },
    HelpTopic {
        syntax: "/join <channel>",
        description: "Join a channel, leaving the current one",
    },
    HelpTopic {
        syntax: "/leave",
        description: "Leave the current channel",
    },
    HelpTopic {
        syntax: "/login <username>",
        description: "Change your display name",
    },
    HelpTopic {
        syntax: "/msg <username> <message>",
        description: "Send a private message",
    },
    HelpTopic {
        syntax: "/quit",
        description: "Disconnect from the server",
    },
    HelpTopic {
        syntax: "/rooms",
        description: "List channels and their user counts",
    },
    HelpTopic {
        syntax: "/who <channel>",
        description: "List the users in a channel",
    },
    HelpTopic {
        syntax: "/whois <username>",
        description: "Show when a user logged in and how long they have been idle",
    },
];

/// Help and MOTD module
pub struct HelpModule {
    name: String,
    description: String,
    motd: MotdManager,
}

impl HelpModule {
    pub fn new(motd: MotdManager) -> Self {
        Self {
            name: "help".to_string(),
            description: "Command reference and message of the day".to_string(),
            motd,
        }
    }

    /// The static command reference
    pub fn topics_reference() -> &'static [HelpTopic] {
        HELP_TOPICS
    }

    fn handle_help(&self, ctx: &Context<'_>, session: &SessionId) {
        ctx.reply(session, "Available commands:");
        for topic in HELP_TOPICS {
            ctx.reply(
                session,
                format!("  {:<28}{}", topic.syntax, topic.description),
            );
        }
        ctx.reply(session, "Anything not starting with / is said to your channel.");
    }

    fn handle_motd(&self, ctx: &Context<'_>, session: &SessionId) {
        for line in self.motd.lines() {
            ctx.reply(session, line.as_str());
        }
    }
}

impl Module for HelpModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn topics(&self) -> Vec<Topic> {
        vec![Topic::Help, Topic::Motd]
    }

    fn handle(&self, ctx: &mut Context<'_>, event: &Event) -> Result<()> {
        match event {
            Event::Help { session } => self.handle_help(ctx, session),
            Event::Motd { session } => self.handle_motd(ctx, session),
            _ => {}
        }
        Ok(())
    }
}
