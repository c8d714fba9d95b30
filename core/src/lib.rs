//! Room chat daemon core
//!
//! This crate provides the session and channel registries, the command
//! parser and router, and the connection plumbing for a multi-room,
//! line-oriented chat server. Command handlers live in separate modules
//! subscribed to the router at startup.

pub mod channel;
pub mod codec;
pub mod command;
pub mod config;
pub mod connection;
pub mod error;
pub mod message;
pub mod motd;
pub mod router;
pub mod server;
pub mod session;
pub mod state;
pub mod utils;

pub use channel::{Channel, ChannelRegistry, ChannelSummary, Departure};
pub use codec::ChatLineCodec;
pub use command::{dispatch, Command};
pub use config::{Config, Environment};
pub use connection::ConnectionHandler;
pub use error::{ChatError, Error, Result};
pub use message::{Outbound, Reply};
pub use motd::MotdManager;
pub use router::{Context, Event, Module, Router, SubscriptionHandle, Topic};
pub use server::Server;
pub use session::{Session, SessionId, SessionRegistry};
pub use state::ChatState;

/// Re-exports for convenience
pub use tracing::{debug, error, info, warn};
