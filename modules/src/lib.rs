//! Room chat daemon modules
//!
//! Command handlers for the chat daemon, each packaged as a router module.

pub mod account;
pub mod channel;
pub mod help;
pub mod messaging;

pub use account::AccountModule;
pub use channel::ChannelModule;
pub use help::{HelpModule, HelpTopic};
pub use messaging::MessagingModule;

use roomchatd_core::{MotdManager, Router};
use std::sync::Arc;

/// Subscribe the standard command handlers to a router
pub fn register_default_modules(router: &mut Router, motd: MotdManager) {
    router.register(Arc::new(ChannelModule::new()));
    router.register(Arc::new(AccountModule::new()));
    router.register(Arc::new(MessagingModule::new()));
    router.register(Arc::new(HelpModule::new(motd)));
}
