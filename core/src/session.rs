//! Session management and tracking

use crate::config::SessionConfig;
use crate::message::{Outbound, Reply};
use crate::ChatError;
use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::collections::HashMap;
use std::fmt;
use tokio::sync::mpsc;

/// Opaque per-connection identifier, stable for the connection's lifetime
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a random alphanumeric identifier
    pub fn generate(length: usize) -> Self {
        let id = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(length)
            .map(char::from)
            .collect();
        Self(id)
    }

}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Server-side state for one connected client
#[derive(Debug)]
pub struct Session {
    /// Unique session ID
    pub id: SessionId,
    /// Remote address of the connection
    pub remote_addr: String,
    /// Time the connection was accepted
    pub login_time: DateTime<Utc>,
    /// Time of the last inbound line
    pub last_active: DateTime<Utc>,
    display_name: String,
    channel: Option<String>,
    sender: mpsc::UnboundedSender<Outbound>,
}

impl Session {
    /// Create a new session
    pub fn new(
        id: SessionId,
        display_name: String,
        remote_addr: String,
        sender: mpsc::UnboundedSender<Outbound>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            remote_addr,
            login_time: now,
            last_active: now,
            display_name,
            channel: None,
            sender,
        }
    }

    /// Current display name
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Channel the session is in, if any
    pub fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    /// Check if the session is in the named channel
    pub fn is_in_channel(&self, channel: &str) -> bool {
        self.channel.as_deref() == Some(channel)
    }

    pub(crate) fn set_channel(&mut self, channel: Option<String>) {
        self.channel = channel;
    }

    /// Queue a server line. Fire-and-forget: a closed connection drops it.
    pub fn send(&self, text: impl Into<String>) {
        self.push(Outbound::Line(Reply::Server(text.into())));
    }

    /// Queue an echo of the client's own input
    pub fn echo(&self, line: &str) {
        self.push(Outbound::Line(Reply::Echo(line.to_string())));
    }

    /// Ask the transport to flush and close the connection
    pub fn close(&self) {
        self.push(Outbound::Close);
    }

    fn push(&self, item: Outbound) {
        if self.sender.send(item).is_err() {
            tracing::debug!("Dropping output for closed session {}", self.id);
        }
    }

    /// Update last activity time
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_active = now;
    }
}

/// Owns every active session and keeps display names unique
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: HashMap<SessionId, Session>,
    /// Display name to session ID
    names: HashMap<String, SessionId>,
    guest_prefix: String,
    guest_number_range: u32,
    id_length: usize,
}

impl SessionRegistry {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            sessions: HashMap::new(),
            names: HashMap::new(),
            guest_prefix: config.guest_prefix.clone(),
            guest_number_range: config.guest_number_range.max(1),
            id_length: config.client_id_length,
        }
    }

    /// Register a new connection under a fresh ID and guest name
    pub fn create(
        &mut self,
        remote_addr: String,
        sender: mpsc::UnboundedSender<Outbound>,
    ) -> &Session {
        let mut id = SessionId::generate(self.id_length);
        while self.sessions.contains_key(&id) {
            id = SessionId::generate(self.id_length);
        }

        let name = self.generate_guest_name();
        self.names.insert(name.clone(), id.clone());
        self.sessions
            .entry(id.clone())
            .or_insert_with(|| Session::new(id, name, remote_addr, sender))
    }

    /// Pick `<prefix><N>` with N random in range and currently unused.
    ///
    /// Once random draws keep colliding the range is scanned upward from
    /// zero, which always terminates even when every number in range is taken.
    fn generate_guest_name(&self) -> String {
        let mut rng = rand::thread_rng();
        let attempts = self.guest_number_range.saturating_mul(4);
        for _ in 0..attempts {
            let name = format!(
                "{}{}",
                self.guest_prefix,
                rng.gen_range(0..self.guest_number_range)
            );
            if !self.names.contains_key(&name) {
                return name;
            }
        }

        (0u64..)
            .map(|n| format!("{}{}", self.guest_prefix, n))
            .find(|name| !self.names.contains_key(name))
            .unwrap_or_else(|| self.guest_prefix.clone())
    }

    pub fn get(&self, id: &SessionId) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn get_mut(&mut self, id: &SessionId) -> Option<&mut Session> {
        self.sessions.get_mut(id)
    }

    /// Look up a session by display name (case-sensitive)
    pub fn find_by_name(&self, name: &str) -> Option<&Session> {
        self.names.get(name).and_then(|id| self.sessions.get(id))
    }

    /// Rename a session, returning its previous name.
    ///
    /// Fails without touching anything when another session holds `new_name`.
    pub fn rename(&mut self, id: &SessionId, new_name: &str) -> Result<String, ChatError> {
        if let Some(holder) = self.names.get(new_name) {
            if holder != id {
                return Err(ChatError::NameTaken(new_name.to_string()));
            }
        }

        let session = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| ChatError::UserNotFound(id.to_string()))?;

        let old_name = std::mem::replace(&mut session.display_name, new_name.to_string());
        self.names.remove(&old_name);
        self.names.insert(new_name.to_string(), id.clone());
        Ok(old_name)
    }

    /// Delete a session. Channel cleanup is the caller's job and must come first.
    pub fn remove(&mut self, id: &SessionId) -> Option<Session> {
        let session = self.sessions.remove(id)?;
        self.names.remove(&session.display_name);
        Some(session)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SessionRegistry {
        SessionRegistry::new(&SessionConfig::default())
    }

    fn connect(registry: &mut SessionRegistry) -> SessionId {
        let (tx, _rx) = mpsc::unbounded_channel();
        registry.create("127.0.0.1:4000".to_string(), tx).id.clone()
    }

    #[test]
    fn test_create_assigns_guest_name_and_id() {
        let mut registry = registry();
        let id = connect(&mut registry);
        let session = registry.get(&id).unwrap();

        assert_eq!(id.to_string().len(), 12);
        assert!(id.to_string().chars().all(|c| c.is_ascii_alphanumeric()));
        assert!(session.display_name().starts_with("Guest"));
        let number: u32 = session.display_name()["Guest".len()..].parse().unwrap();
        assert!(number < 5000);
        assert_eq!(session.login_time, session.last_active);
        assert!(session.channel().is_none());
    }

    #[test]
    fn test_guest_names_stay_unique_in_tiny_range() {
        let config = SessionConfig {
            guest_number_range: 2,
            ..SessionConfig::default()
        };
        let mut registry = SessionRegistry::new(&config);
        let ids: Vec<_> = (0..5).map(|_| connect(&mut registry)).collect();

        let mut names: Vec<_> = ids
            .iter()
            .map(|id| registry.get(id).unwrap().display_name().to_string())
            .collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 5);
    }

    #[test]
    fn test_rename_and_lookup() {
        let mut registry = registry();
        let id = connect(&mut registry);
        let guest = registry.get(&id).unwrap().display_name().to_string();

        let old = registry.rename(&id, "alice").unwrap();
        assert_eq!(old, guest);
        assert_eq!(registry.find_by_name("alice").unwrap().id, id);
        assert!(registry.find_by_name(&guest).is_none());
        assert!(registry.find_by_name("Alice").is_none());
    }

    #[test]
    fn test_rename_to_taken_name_changes_nothing() {
        let mut registry = registry();
        let a = connect(&mut registry);
        let b = connect(&mut registry);
        registry.rename(&a, "alice").unwrap();
        let b_name = registry.get(&b).unwrap().display_name().to_string();

        let err = registry.rename(&b, "alice").unwrap_err();
        assert_eq!(err, ChatError::NameTaken("alice".to_string()));
        assert_eq!(registry.get(&b).unwrap().display_name(), b_name);
        assert_eq!(registry.find_by_name("alice").unwrap().id, a);
        assert_eq!(registry.find_by_name(&b_name).unwrap().id, b);
    }

    #[test]
    fn test_rename_to_own_name_is_allowed() {
        let mut registry = registry();
        let a = connect(&mut registry);
        registry.rename(&a, "alice").unwrap();
        assert_eq!(registry.rename(&a, "alice").unwrap(), "alice");
        assert_eq!(registry.find_by_name("alice").unwrap().id, a);
    }

    #[test]
    fn test_remove_frees_name() {
        let mut registry = registry();
        let a = connect(&mut registry);
        registry.rename(&a, "alice").unwrap();

        assert!(registry.remove(&a).is_some());
        assert!(registry.is_empty());
        assert!(registry.find_by_name("alice").is_none());

        let b = connect(&mut registry);
        assert!(registry.rename(&b, "alice").is_ok());
    }

    #[test]
    fn test_send_after_disconnect_is_silent() {
        let mut registry = registry();
        let (tx, rx) = mpsc::unbounded_channel();
        let id = registry.create("peer".to_string(), tx).id.clone();
        drop(rx);
        registry.get(&id).unwrap().send("nobody is listening");
    }
}
