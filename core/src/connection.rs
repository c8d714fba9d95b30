//! Connection handling
//!
//! Each accepted stream gets a session, a reader loop that feeds complete
//! lines to the command dispatcher, and a writer task that drains the
//! session's outbound queue onto the socket.

use crate::codec::ChatLineCodec;
use crate::command::dispatch;
use crate::message::Outbound;
use crate::router::{Context, Event, Router};
use crate::session::SessionId;
use crate::state::ChatState;
use crate::utils::time::pretty_time;
use crate::{Config, Result};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite};

/// Everything a connection task needs, cheap to clone
#[derive(Clone)]
pub struct ConnectionHandler {
    config: Arc<Config>,
    state: Arc<Mutex<ChatState>>,
    router: Arc<Router>,
}

impl ConnectionHandler {
    pub fn new(config: Arc<Config>, state: Arc<Mutex<ChatState>>, router: Arc<Router>) -> Self {
        Self {
            config,
            state,
            router,
        }
    }

    /// Serve one client until it quits or the stream ends
    pub async fn handle_connection<S>(&self, stream: S, remote_addr: String) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (sender, receiver) = mpsc::unbounded_channel();
        let session_id = self.open_session(&remote_addr, sender);

        let (read_half, write_half) = tokio::io::split(stream);
        let max_len = self.config.connection.max_line_length;
        let writer = tokio::spawn(write_loop(
            session_id.clone(),
            FramedWrite::new(write_half, ChatLineCodec::new(max_len)),
            receiver,
        ));

        let mut lines = FramedRead::new(read_half, ChatLineCodec::new(max_len));
        loop {
            let line = match lines.next().await {
                Some(Ok(line)) => line,
                Some(Err(e)) => {
                    tracing::warn!("Read error on connection {}: {}", session_id, e);
                    break;
                }
                None => break,
            };

            if !self.process_line(&session_id, &line) {
                break;
            }
        }

        self.close_session(&session_id);
        tracing::info!("Connection ({}) from ({}) closed", session_id, remote_addr);
        drop(lines);

        if let Err(e) = writer.await {
            tracing::error!("Writer task for {} failed: {}", session_id, e);
        }
        Ok(())
    }

    /// Register the session and greet it
    fn open_session(&self, remote_addr: &str, sender: mpsc::UnboundedSender<Outbound>) -> SessionId {
        let mut state = self.state.lock();
        let session_id = state.connect(remote_addr.to_string(), sender);
        if let Some(session) = state.session(&session_id) {
            tracing::info!(
                "Inbound connection ({}) from ({}) at ({})",
                session_id,
                remote_addr,
                pretty_time(session.login_time)
            );
        }

        let mut ctx = Context::new(&mut state, &self.router);
        if let Err(e) = ctx.publish(Event::Motd { session: session_id.clone() }) {
            tracing::error!("Error greeting {}: {}", session_id, e);
        }
        session_id
    }

    /// Handle one inbound line. Returns false once the session is gone.
    pub fn process_line(&self, session_id: &SessionId, line: &str) -> bool {
        let mut state = self.state.lock();
        let Some(session) = state.session(session_id) else {
            return false;
        };
        if self.config.session.echo_input {
            session.echo(line);
        }

        let now = Utc::now();
        let mut ctx = Context::at(&mut state, &self.router, now);
        if let Err(e) = dispatch(&mut ctx, session_id, line) {
            tracing::error!("Error handling input from {}: {}", session_id, e);
        }

        match state.sessions_mut().get_mut(session_id) {
            Some(session) => {
                session.touch(now);
                true
            }
            None => false,
        }
    }

    /// Run disconnect cleanup for a session that is still registered
    pub fn close_session(&self, session_id: &SessionId) {
        let mut state = self.state.lock();
        if state.session(session_id).is_none() {
            return;
        }

        let mut ctx = Context::new(&mut state, &self.router);
        if let Err(e) = ctx.publish(Event::Disconnect { session: session_id.clone() }) {
            tracing::error!("Error during disconnect of {}: {}", session_id, e);
        }

        // Whatever the handlers did, the session must not outlive its connection
        if state.disconnect(session_id).is_some() {
            tracing::debug!("Removed session {} after disconnect", session_id);
        }
    }
}

/// Drain a session's outbound queue onto the socket.
///
/// Ends on `Outbound::Close`, on a write error, or when the session is
/// dropped from the registry.
async fn write_loop<W>(
    session_id: SessionId,
    mut sink: FramedWrite<W, ChatLineCodec>,
    mut receiver: mpsc::UnboundedReceiver<Outbound>,
) where
    W: AsyncWrite + Unpin,
{
    while let Some(item) = receiver.recv().await {
        match item {
            Outbound::Line(reply) => {
                if let Err(e) = sink.send(reply).await {
                    tracing::debug!("Error writing to client {}: {}", session_id, e);
                    return;
                }
            }
            Outbound::Close => break,
        }
    }

    if let Err(e) = sink.close().await {
        tracing::debug!("Error closing connection {}: {}", session_id, e);
    }
}
