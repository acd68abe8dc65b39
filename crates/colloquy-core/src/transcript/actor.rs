use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::history::{Transcript, TranscriptEntry, UserText};
use super::{TranscriptError, TranscriptUpdate};
use crate::client::{ClientError, ConnectionState, EventSubscription, SessionClient};
use crate::config::{SessionConfig, Settings};
use crate::live::{ClientEvent, Part, ServerContent};

const UPDATE_BROADCAST_CAPACITY: usize = 256;
const COMMAND_CHANNEL_CAPACITY: usize = 32;

enum TranscriptCmd {
    Submit {
        text: String,
        reply: oneshot::Sender<Result<usize, TranscriptError>>,
    },
    OpenPanel {
        reply: oneshot::Sender<ConnectionState>,
    },
    Snapshot {
        reply: oneshot::Sender<Vec<TranscriptEntry>>,
    },
    ConnectionState {
        reply: oneshot::Sender<ConnectionState>,
    },
}

/// Mount-time configuration of the transcript accumulator.
pub struct TranscriptAccumulator {
    client: Arc<dyn SessionClient>,
    chat_config: SessionConfig,
}

impl TranscriptAccumulator {
    pub fn new(client: Arc<dyn SessionClient>, settings: &Settings) -> Self {
        Self {
            client,
            chat_config: settings.chat_session(),
        }
    }

    /// Subscribes to client events and starts the accumulator task with an
    /// empty transcript.
    pub fn mount(self) -> TranscriptHandle {
        let subscription = self.client.subscribe();
        let cancel = CancellationToken::new();
        let (updates, _) = broadcast::channel(UPDATE_BROADCAST_CAPACITY);
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (connect_tx, connect_rx) = mpsc::unbounded_channel();

        let connection = if self.client.is_connected() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        };

        let actor = TranscriptActor {
            client: self.client,
            subscription,
            transcript: Transcript::new(),
            updates: updates.clone(),
            connection,
            chat_config: self.chat_config,
            connect_tx,
            connect_rx,
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(actor.run(cmd_rx));

        TranscriptHandle {
            cmd_tx,
            updates,
            cancel,
            task: Some(task),
        }
    }
}

/// Handle to a mounted accumulator. Dropping it tears the accumulator down.
pub struct TranscriptHandle {
    cmd_tx: mpsc::Sender<TranscriptCmd>,
    updates: broadcast::Sender<TranscriptUpdate>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl TranscriptHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> TranscriptCmd,
    ) -> Result<T, TranscriptError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(make(reply_tx))
            .await
            .map_err(|_| TranscriptError::ChannelClosed)?;
        reply_rx.await.map_err(|_| TranscriptError::ChannelClosed)
    }

    /// Records `text` as a user entry and sends it to the model. Blank input
    /// is rejected with [`TranscriptError::EmptyInput`]. Returns the entry's
    /// index.
    pub async fn submit_user_text(&self, text: impl Into<String>) -> Result<usize, TranscriptError> {
        let text = text.into();
        self.request(|reply| TranscriptCmd::Submit { text, reply })
            .await?
    }

    /// Opening the chat panel connects if the session is down.
    pub async fn open_panel(&self) -> Result<ConnectionState, TranscriptError> {
        self.request(|reply| TranscriptCmd::OpenPanel { reply }).await
    }

    pub async fn transcript(&self) -> Result<Vec<TranscriptEntry>, TranscriptError> {
        self.request(|reply| TranscriptCmd::Snapshot { reply }).await
    }

    pub async fn connection_state(&self) -> Result<ConnectionState, TranscriptError> {
        self.request(|reply| TranscriptCmd::ConnectionState { reply })
            .await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TranscriptUpdate> {
        self.updates.subscribe()
    }

    pub async fn unmount(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            tracing::debug!(error = %e, "Transcript task ended unexpectedly");
        }
    }
}

impl Drop for TranscriptHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct TranscriptActor {
    client: Arc<dyn SessionClient>,
    subscription: EventSubscription,
    transcript: Transcript,
    updates: broadcast::Sender<TranscriptUpdate>,
    connection: ConnectionState,
    chat_config: SessionConfig,
    connect_tx: mpsc::UnboundedSender<Result<(), ClientError>>,
    connect_rx: mpsc::UnboundedReceiver<Result<(), ClientError>>,
    cancel: CancellationToken,
}

impl TranscriptActor {
    async fn run(mut self, mut cmd_rx: mpsc::Receiver<TranscriptCmd>) {
        loop {
            tokio::select! {
                biased;

                () = self.cancel.cancelled() => break,

                Some(result) = self.connect_rx.recv() => self.on_connect_finished(result),

                event = self.subscription.recv() => match event {
                    Some(ClientEvent::Content(content)) => self.on_content_event(&content),
                    Some(ClientEvent::Open) => self.set_connection(ConnectionState::Connected),
                    Some(ClientEvent::Close { reason }) => {
                        tracing::debug!(reason = ?reason, "Session closed");
                        self.set_connection(ConnectionState::Disconnected);
                    }
                    Some(_) => {}
                    None => {
                        tracing::debug!("Client event stream closed");
                        break;
                    }
                },

                Some(cmd) = cmd_rx.recv() => self.handle_cmd(cmd),
            }
        }

        tracing::debug!(entries = self.transcript.len(), "Transcript accumulator stopped");
    }

    fn handle_cmd(&mut self, cmd: TranscriptCmd) {
        match cmd {
            TranscriptCmd::Submit { text, reply } => {
                let result = self.submit_user_text(text);
                let _ = reply.send(result);
            }
            TranscriptCmd::OpenPanel { reply } => {
                self.ensure_connected();
                let _ = reply.send(self.connection);
            }
            TranscriptCmd::Snapshot { reply } => {
                let _ = reply.send(self.transcript.entries().to_vec());
            }
            TranscriptCmd::ConnectionState { reply } => {
                let _ = reply.send(self.connection);
            }
        }
    }

    fn submit_user_text(&mut self, text: String) -> Result<usize, TranscriptError> {
        let Some(text) = UserText::new(text) else {
            tracing::debug!("Ignoring blank submission");
            return Err(TranscriptError::EmptyInput);
        };

        self.ensure_connected();

        let index = self.transcript.submit_user(&text);
        self.publish_append(index);

        if let Err(e) = self.client.send(vec![Part::text(text.into_inner())]) {
            tracing::warn!(index, error = %e, "Failed to send user text");
        }

        Ok(index)
    }

    fn on_content_event(&mut self, content: &ServerContent) {
        if let Some(index) = self.transcript.apply_content(content) {
            tracing::debug!(index, "Model turn appended");
            self.publish_append(index);
        }
    }

    fn publish_append(&self, index: usize) {
        if let Some(entry) = self.transcript.get(index) {
            let _ = self.updates.send(TranscriptUpdate::Appended {
                index,
                entry: entry.clone(),
            });
        }
    }

    /// Issues a connect with the chat configuration unless the session is up
    /// or a connect is already in flight. The outcome is not awaited here.
    fn ensure_connected(&mut self) {
        if self.client.is_connected() {
            self.set_connection(ConnectionState::Connected);
            return;
        }
        if self.connection == ConnectionState::Connecting {
            return;
        }

        self.set_connection(ConnectionState::Connecting);
        tracing::debug!(model = %self.chat_config.model, "Connecting chat session");

        let client = self.client.clone();
        let config = self.chat_config.clone();
        let connect_tx = self.connect_tx.clone();
        tokio::spawn(async move {
            let result = client.connect(config).await;
            let _ = connect_tx.send(result);
        });
    }

    fn on_connect_finished(&mut self, result: Result<(), ClientError>) {
        match result {
            Ok(()) => self.set_connection(ConnectionState::Connected),
            Err(e) => {
                tracing::warn!(error = %e, "Chat session failed to connect");
                self.set_connection(ConnectionState::Disconnected);
            }
        }
    }

    fn set_connection(&mut self, state: ConnectionState) {
        if self.connection == state {
            return;
        }
        tracing::debug!(from = %self.connection, to = %state, "Connection state changed");
        self.connection = state;
        let _ = self.updates.send(TranscriptUpdate::ConnectionChanged(state));
    }
}
