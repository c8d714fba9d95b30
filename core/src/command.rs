//! Client input parsing and dispatch
//!
//! A line that does not start with `/` is chat text for the sender's
//! channel. Otherwise the leading `/` is dropped, the first space-separated
//! token names the command and the rest are its arguments. For `msg` only
//! the target is structural; everything after it is the message body.

use crate::router::{Context, Event};
use crate::session::SessionId;
use crate::{ChatError, Result};

/// A parsed line of client input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Chat text for the current channel
    Say(String),
    Help,
    Leave,
    Quit,
    Rooms,
    Join(String),
    Login(String),
    Who(String),
    Whois(String),
    Msg { target: String, text: String },
}

impl Command {
    /// Parse one line with its terminator already stripped
    pub fn parse(line: &str) -> std::result::Result<Self, ChatError> {
        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Command::Say(line.to_string()));
        };

        // The command name starts right after the slash: `/ join` has an empty name
        let (name, args) = rest.split_once(' ').unwrap_or((rest, ""));
        match name {
            "help" => no_args(args, Command::Help),
            "leave" => no_args(args, Command::Leave),
            "quit" => no_args(args, Command::Quit),
            "rooms" => no_args(args, Command::Rooms),
            "join" => one_arg(args).map(Command::Join),
            "login" => one_arg(args).map(Command::Login),
            "who" => one_arg(args).map(Command::Who),
            "whois" => one_arg(args).map(Command::Whois),
            "msg" => {
                let (target, body) = next_token(args).ok_or(ChatError::UnrecognizedCommand)?;
                let text = body.trim_start_matches(' ');
                if text.is_empty() {
                    return Err(ChatError::UnrecognizedCommand);
                }
                Ok(Command::Msg {
                    target: target.to_string(),
                    text: text.to_string(),
                })
            }
            _ => Err(ChatError::UnrecognizedCommand),
        }
    }

    /// Name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::Say(_) => "say",
            Command::Help => "help",
            Command::Leave => "leave",
            Command::Quit => "quit",
            Command::Rooms => "rooms",
            Command::Join(_) => "join",
            Command::Login(_) => "login",
            Command::Who(_) => "who",
            Command::Whois(_) => "whois",
            Command::Msg { .. } => "msg",
        }
    }
}

/// Split off the first space-delimited token, skipping leading spaces
fn next_token(input: &str) -> Option<(&str, &str)> {
    let input = input.trim_start_matches(' ');
    if input.is_empty() {
        return None;
    }
    Some(match input.find(' ') {
        Some(end) => (&input[..end], &input[end..]),
        None => (input, ""),
    })
}

fn no_args(args: &str, command: Command) -> std::result::Result<Command, ChatError> {
    if args.trim_matches(' ').is_empty() {
        Ok(command)
    } else {
        Err(ChatError::UnrecognizedCommand)
    }
}

fn one_arg(args: &str) -> std::result::Result<String, ChatError> {
    match next_token(args) {
        Some((arg, rest)) if rest.trim_matches(' ').is_empty() => Ok(arg.to_string()),
        _ => Err(ChatError::UnrecognizedCommand),
    }
}

/// Parse one line from `session` and publish the resulting event.
///
/// Unrecognized input and chat text with no channel to go to are answered
/// here; everything else is up to the subscribed handlers.
pub fn dispatch(ctx: &mut Context<'_>, session: &SessionId, line: &str) -> Result<()> {
    let command = match Command::parse(line) {
        Ok(command) => command,
        Err(error) => {
            ctx.reject(session, error);
            return Ok(());
        }
    };
    tracing::debug!("Session {} issued {}", session, command.name());

    let session = session.clone();
    let event = match command {
        Command::Say(text) => {
            let Some(current) = ctx.state().session(&session) else {
                return Ok(());
            };
            let Some(channel) = current.channel() else {
                ctx.reject(&session, ChatError::NotInChannel);
                return Ok(());
            };
            Event::Message {
                channel: channel.to_string(),
                text: format!("{}: {}", current.display_name(), text),
            }
        }
        Command::Help => Event::Help { session },
        Command::Leave => Event::Leave { session },
        Command::Quit => Event::Quit { session },
        Command::Rooms => Event::Rooms { session },
        Command::Join(channel) => Event::Join { session, channel },
        Command::Login(name) => Event::Login { session, name },
        Command::Who(channel) => Event::Who { session, channel },
        Command::Whois(name) => Event::Whois { session, name },
        Command::Msg { target, text } => Event::Msg { session, target, text },
    };

    ctx.publish(event)
}
