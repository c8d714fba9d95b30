//! Channel registry
//!
//! A channel exists only while it has members: it is created on first join
//! and deleted in the same call that removes its last member.

use crate::session::{Session, SessionId};
use std::collections::{BTreeMap, HashSet};

/// A named group of sessions receiving each other's broadcasts
#[derive(Debug, Clone)]
pub struct Channel {
    name: String,
    members: HashSet<SessionId>,
}

impl Channel {
    fn new(name: String) -> Self {
        Self {
            name,
            members: HashSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> impl Iterator<Item = &SessionId> {
        self.members.iter()
    }

    pub fn has_member(&self, id: &SessionId) -> bool {
        self.members.contains(id)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}

/// Snapshot row of the channel list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSummary {
    pub name: String,
    pub member_count: usize,
}

/// Result of removing a member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    /// Channel that was left
    pub channel: String,
    /// The channel had no members left and is gone
    pub channel_deleted: bool,
}

/// Owns every live channel, keyed by case-sensitive name
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    channels: BTreeMap<String, Channel>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the named channel, creating an empty one if needed.
    ///
    /// Only `add_member` calls this so an empty channel never outlives the call.
    fn ensure(&mut self, name: &str) -> &mut Channel {
        self.channels
            .entry(name.to_string())
            .or_insert_with(|| {
                tracing::debug!("Creating channel {}", name);
                Channel::new(name.to_string())
            })
    }

    pub fn get(&self, name: &str) -> Option<&Channel> {
        self.channels.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.channels.contains_key(name)
    }

    /// Put a session into a channel, updating both sides.
    ///
    /// A session sits in at most one channel, so any previous membership is
    /// dropped first.
    pub fn add_member(&mut self, name: &str, session: &mut Session) {
        if session.is_in_channel(name) {
            return;
        }
        if let Some(previous) = session.channel().map(str::to_string) {
            self.remove_member(&previous, session);
        }

        self.ensure(name).members.insert(session.id.clone());
        session.set_channel(Some(name.to_string()));
    }

    /// Take a session out of a channel, updating both sides and deleting the
    /// channel if it is now empty.
    ///
    /// Returns `None` when the session was not a member.
    pub fn remove_member(&mut self, name: &str, session: &mut Session) -> Option<Departure> {
        if !session.is_in_channel(name) {
            return None;
        }
        session.set_channel(None);

        let channel = self.channels.get_mut(name)?;
        channel.members.remove(&session.id);
        let channel_deleted = channel.members.is_empty();
        if channel_deleted {
            self.channels.remove(name);
            tracing::debug!("Removed empty channel {}", name);
        }

        Some(Departure {
            channel: name.to_string(),
            channel_deleted,
        })
    }

    /// Channel names with member counts, sorted by name
    pub fn list_channels(&self) -> Vec<ChannelSummary> {
        self.channels
            .values()
            .map(|channel| ChannelSummary {
                name: channel.name.clone(),
                member_count: channel.member_count(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Channel> {
        self.channels.values()
    }
}
