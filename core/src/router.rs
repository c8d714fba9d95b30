//! Command router
//!
//! A topic-keyed table of ordered handler lists. Parsed commands and
//! internal actions are published as typed events; every module subscribed
//! to the event's topic runs synchronously, in subscription order, on the
//! publisher's call stack. The first handler error stops the publish and is
//! returned to the publisher.

use crate::session::SessionId;
use crate::state::ChatState;
use crate::{ChatError, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Event topics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Motd,
    Message,
    Help,
    Join,
    Leave,
    Login,
    Msg,
    Quit,
    Rooms,
    Who,
    Whois,
    Disconnect,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Motd => "/action/motd",
            Topic::Message => "/action/message",
            Topic::Help => "/command/help",
            Topic::Join => "/command/join",
            Topic::Leave => "/command/leave",
            Topic::Login => "/command/login",
            Topic::Msg => "/command/msg",
            Topic::Quit => "/command/quit",
            Topic::Rooms => "/command/rooms",
            Topic::Who => "/command/who",
            Topic::Whois => "/command/whois",
            Topic::Disconnect => "/action/disconnect",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event with its typed payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Greet a newly connected session
    Motd { session: SessionId },
    /// Write `text` to every member of `channel`
    Message { channel: String, text: String },
    Help { session: SessionId },
    Join { session: SessionId, channel: String },
    Leave { session: SessionId },
    Login { session: SessionId, name: String },
    Msg { session: SessionId, target: String, text: String },
    Quit { session: SessionId },
    Rooms { session: SessionId },
    Who { session: SessionId, channel: String },
    Whois { session: SessionId, name: String },
    /// The transport lost the connection
    Disconnect { session: SessionId },
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Motd { .. } => Topic::Motd,
            Event::Message { .. } => Topic::Message,
            Event::Help { .. } => Topic::Help,
            Event::Join { .. } => Topic::Join,
            Event::Leave { .. } => Topic::Leave,
            Event::Login { .. } => Topic::Login,
            Event::Msg { .. } => Topic::Msg,
            Event::Quit { .. } => Topic::Quit,
            Event::Rooms { .. } => Topic::Rooms,
            Event::Who { .. } => Topic::Who,
            Event::Whois { .. } => Topic::Whois,
            Event::Disconnect { .. } => Topic::Disconnect,
        }
    }
}

/// A handler that can be subscribed to topics
pub trait Module: Send + Sync {
    /// Module name
    fn name(&self) -> &str;

    /// Module description
    fn description(&self) -> &str;

    /// Topics subscribed by `Router::register`
    fn topics(&self) -> Vec<Topic>;

    /// Handle one event
    fn handle(&self, ctx: &mut Context<'_>, event: &Event) -> Result<()>;
}

/// What a handler gets to work with while an event is being published
pub struct Context<'a> {
    state: &'a mut ChatState,
    router: &'a Router,
    now: DateTime<Utc>,
}

impl<'a> Context<'a> {
    pub fn new(state: &'a mut ChatState, router: &'a Router) -> Self {
        Self::at(state, router, Utc::now())
    }

    /// Context with a fixed clock
    pub fn at(state: &'a mut ChatState, router: &'a Router, now: DateTime<Utc>) -> Self {
        Self { state, router, now }
    }

    pub fn state(&self) -> &ChatState {
        &*self.state
    }

    pub fn state_mut(&mut self) -> &mut ChatState {
        &mut *self.state
    }

    /// Time the current input is being handled at
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Publish a follow-up event before returning
    pub fn publish(&mut self, event: Event) -> Result<()> {
        let router = self.router;
        router.publish(self, event)
    }

    /// Write a line to one session
    pub fn reply(&self, session: &SessionId, text: impl Into<String>) {
        self.state.reply(session, text);
    }

    /// Report a rejected command to the session that issued it
    pub fn reject(&self, session: &SessionId, error: ChatError) {
        tracing::debug!("Rejected command from {}: {}", session, error);
        self.state.reply(session, error.to_string());
    }
}

/// Identifies one subscription for `Router::unsubscribe`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionHandle {
    topic: Topic,
    id: u64,
}

impl SubscriptionHandle {
    pub fn topic(&self) -> Topic {
        self.topic
    }
}

struct Subscription {
    id: u64,
    module: Arc<dyn Module>,
}

/// Topic-keyed handler table
#[derive(Default)]
pub struct Router {
    topics: HashMap<Topic, Vec<Subscription>>,
    next_id: u64,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler to a topic's list
    pub fn subscribe(&mut self, topic: Topic, module: Arc<dyn Module>) -> SubscriptionHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.topics
            .entry(topic)
            .or_default()
            .push(Subscription { id, module });
        SubscriptionHandle { topic, id }
    }

    /// Subscribe a module to every topic it declares
    pub fn register(&mut self, module: Arc<dyn Module>) -> Vec<SubscriptionHandle> {
        tracing::info!("Loaded {} module: {}", module.name(), module.description());
        module
            .topics()
            .into_iter()
            .map(|topic| self.subscribe(topic, module.clone()))
            .collect()
    }

    /// Remove exactly one subscription. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, handle: &SubscriptionHandle) -> bool {
        let Some(subscriptions) = self.topics.get_mut(&handle.topic) else {
            return false;
        };
        let before = subscriptions.len();
        subscriptions.retain(|s| s.id != handle.id);
        let removed = subscriptions.len() != before;
        if subscriptions.is_empty() {
            self.topics.remove(&handle.topic);
        }
        removed
    }

    /// Run every handler subscribed to the event's topic, in order
    pub fn publish(&self, ctx: &mut Context<'_>, event: Event) -> Result<()> {
        let topic = event.topic();
        let Some(subscriptions) = self.topics.get(&topic) else {
            tracing::warn!("No handler subscribed to {}", topic);
            return Ok(());
        };

        for subscription in subscriptions {
            subscription.module.handle(ctx, &event)?;
        }
        Ok(())
    }

}
