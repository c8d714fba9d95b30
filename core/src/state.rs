//! Shared chat state: both registries under one owner
//!
//! The server keeps a single `ChatState` behind one mutex, so every
//! multi-step sequence a handler runs is atomic to all other sessions.

use crate::channel::{ChannelRegistry, Departure};
use crate::config::SessionConfig;
use crate::message::Outbound;
use crate::session::{Session, SessionId, SessionRegistry};
use crate::{Error, Result};
use tokio::sync::mpsc;

#[derive(Debug)]
pub struct ChatState {
    sessions: SessionRegistry,
    channels: ChannelRegistry,
}

impl ChatState {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            sessions: SessionRegistry::new(config),
            channels: ChannelRegistry::new(),
        }
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn sessions_mut(&mut self) -> &mut SessionRegistry {
        &mut self.sessions
    }

    pub fn channels(&self) -> &ChannelRegistry {
        &self.channels
    }

    pub fn session(&self, id: &SessionId) -> Option<&Session> {
        self.sessions.get(id)
    }

    /// Register a freshly accepted connection
    pub fn connect(
        &mut self,
        remote_addr: String,
        sender: mpsc::UnboundedSender<Outbound>,
    ) -> SessionId {
        self.sessions.create(remote_addr, sender).id.clone()
    }

    /// Put a session into a channel, leaving its current one silently
    pub fn join_channel(&mut self, id: &SessionId, channel: &str) -> Result<()> {
        let session = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| Error::Session(format!("Unknown session {}", id)))?;
        self.channels.add_member(channel, session);
        Ok(())
    }

    /// Remove a session from whatever channel it is in
    pub fn leave_channel(&mut self, id: &SessionId) -> Option<Departure> {
        let session = self.sessions.get_mut(id)?;
        let channel = session.channel()?.to_string();
        self.channels.remove_member(&channel, session)
    }

    /// Drop a session entirely, channel membership first.
    ///
    /// Returns the removed session, or `None` if it was already gone.
    pub fn disconnect(&mut self, id: &SessionId) -> Option<(Session, Option<Departure>)> {
        let departure = self.leave_channel(id);
        let session = self.sessions.remove(id)?;
        Some((session, departure))
    }

    /// Write a line to one session
    pub fn reply(&self, id: &SessionId, text: impl Into<String>) {
        if let Some(session) = self.sessions.get(id) {
            session.send(text);
        }
    }

    /// Write a line to every current member of a channel.
    ///
    /// Returns how many sessions it was queued for.
    pub fn broadcast(&self, channel: &str, text: &str) -> usize {
        let Some(channel) = self.channels.get(channel) else {
            return 0;
        };

        let mut reached = 0;
        for member in channel.members() {
            if let Some(session) = self.sessions.get(member) {
                session.send(text);
                reached += 1;
            }
        }
        reached
    }

    /// List every broken invariant between the two registries
    pub fn consistency_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();

        for session in self.sessions.iter() {
            if let Some(name) = session.channel() {
                match self.channels.get(name) {
                    Some(channel) if channel.has_member(&session.id) => {}
                    _ => violations.push(format!(
                        "session {} points at {} but is not a member",
                        session.id, name
                    )),
                }
            }

            match self.sessions.find_by_name(session.display_name()) {
                Some(found) if found.id == session.id => {}
                _ => violations.push(format!(
                    "display name {} does not resolve to session {}",
                    session.display_name(),
                    session.id
                )),
            }
        }

        for channel in self.channels.iter() {
            if channel.member_count() == 0 {
                violations.push(format!("channel {} is empty", channel.name()));
            }
            for member in channel.members() {
                match self.sessions.get(member) {
                    Some(session) if session.is_in_channel(channel.name()) => {}
                    _ => violations.push(format!(
                        "channel {} lists {} which does not point back",
                        channel.name(),
                        member
                    )),
                }
            }
        }

        violations
    }
}
