//! Outbound line format
//!
//! Every server-originated line goes out prefixed `<= `; an echo of the
//! client's own input goes out prefixed `=> `.

use crate::utils::string::escape_message;
use std::fmt;

/// One line written to a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Server-originated text
    Server(String),
    /// Echo of raw client input
    Echo(String),
}

impl Reply {
    /// Wire prefix for this kind of line
    pub fn prefix(&self) -> &'static str {
        match self {
            Reply::Server(_) => "<= ",
            Reply::Echo(_) => "=> ",
        }
    }

    /// Line text without prefix
    pub fn text(&self) -> &str {
        match self {
            Reply::Server(text) | Reply::Echo(text) => text,
        }
    }

    /// Serialize to the wire, terminator included. Embedded line breaks
    /// are dropped so one reply is always exactly one line.
    pub fn to_wire(&self) -> String {
        format!("{}{}\n", self.prefix(), escape_message(self.text()))
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix(), self.text())
    }
}

/// Item queued on a session's outbound stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Write one line
    Line(Reply),
    /// Flush what is queued and close the connection
    Close,
}
