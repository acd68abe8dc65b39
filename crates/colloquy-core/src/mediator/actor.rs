use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::dispatch::{GraphPayload, ToolAction, plan_batch};
use super::render::{GraphSlot, RenderAnchor, RenderSink, run_renderer};
use super::{MediatorError, MediatorSignal};
use crate::client::{EventSubscription, SessionClient};
use crate::config::{SessionConfig, Settings};
use crate::live::{ClientEvent, ToolInvocationBatch, ToolResponseBatch};

const SIGNAL_BROADCAST_CAPACITY: usize = 64;
const COMMAND_CHANNEL_CAPACITY: usize = 32;

enum MediatorCmd {
    PendingAcknowledgments { reply: oneshot::Sender<usize> },
}

/// Mount-time configuration of the tool-call mediator.
pub struct ToolCallMediator {
    client: Arc<dyn SessionClient>,
    sink: Arc<dyn RenderSink>,
    anchor: RenderAnchor,
    ack_delay: Duration,
    session_config: SessionConfig,
}

impl ToolCallMediator {
    pub fn new(
        client: Arc<dyn SessionClient>,
        sink: Arc<dyn RenderSink>,
        settings: &Settings,
    ) -> Self {
        Self {
            client,
            sink,
            anchor: RenderAnchor::default(),
            ack_delay: settings.ack_delay(),
            session_config: settings.graph_session(),
        }
    }

    pub fn with_anchor(mut self, anchor: RenderAnchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn with_ack_delay(mut self, delay: Duration) -> Self {
        self.ack_delay = delay;
        self
    }

    /// Configures the client with the tool catalog, subscribes to its events
    /// and starts the mediator and renderer tasks. Must run inside a tokio
    /// runtime.
    pub fn mount(self) -> MediatorHandle {
        let tool_names: Vec<String> = self
            .session_config
            .function_declarations()
            .iter()
            .map(|d| d.name.clone())
            .collect();
        self.client.configure(self.session_config);
        tracing::debug!(tools = ?tool_names, "Tool catalog configured");

        let subscription = self.client.subscribe();
        let cancel = CancellationToken::new();
        let slot = GraphSlot::new();
        let graph = slot.watch();
        let (signals, _) = broadcast::channel(SIGNAL_BROADCAST_CAPACITY);
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (ack_due_tx, ack_due_rx) = mpsc::unbounded_channel();
        let (render_tx, render_rx) = mpsc::unbounded_channel();

        let renderer = tokio::spawn(run_renderer(
            render_rx,
            self.sink,
            self.anchor,
            signals.clone(),
            cancel.clone(),
        ));

        let actor = MediatorActor {
            client: self.client,
            subscription,
            slot,
            render_tx,
            signals: signals.clone(),
            ack_delay: self.ack_delay,
            pending: HashMap::new(),
            next_ack_id: 0,
            ack_due_tx,
            ack_due_rx,
            cancel: cancel.clone(),
        };
        let actor_task = tokio::spawn(actor.run(cmd_rx));

        MediatorHandle {
            cmd_tx,
            signals,
            graph,
            cancel,
            tasks: vec![actor_task, renderer],
        }
    }
}

/// Handle to a mounted mediator. Dropping it tears the mediator down without
/// waiting; [`MediatorHandle::unmount`] also waits for the tasks to finish.
pub struct MediatorHandle {
    cmd_tx: mpsc::Sender<MediatorCmd>,
    signals: broadcast::Sender<MediatorSignal>,
    graph: watch::Receiver<Option<GraphPayload>>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl MediatorHandle {
    pub fn current_graph(&self) -> Option<GraphPayload> {
        self.graph.borrow().clone()
    }

    pub fn watch_graph(&self) -> watch::Receiver<Option<GraphPayload>> {
        self.graph.clone()
    }

    pub fn subscribe_signals(&self) -> broadcast::Receiver<MediatorSignal> {
        self.signals.subscribe()
    }

    /// Number of tool responses still waiting for their delay to elapse.
    pub async fn pending_acknowledgments(&self) -> Result<usize, MediatorError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(MediatorCmd::PendingAcknowledgments { reply: reply_tx })
            .await
            .map_err(|_| MediatorError::ChannelClosed)?;
        reply_rx.await.map_err(|_| MediatorError::ChannelClosed)
    }

    /// Stops the mediator. Acknowledgments still waiting are never sent.
    pub async fn unmount(mut self) {
        self.cancel.cancel();
        for task in std::mem::take(&mut self.tasks) {
            if let Err(e) = task.await {
                tracing::debug!(error = %e, "Mediator task ended unexpectedly");
            }
        }
    }
}

impl Drop for MediatorHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct PendingAcknowledgment {
    batch: ToolResponseBatch,
    timer: CancellationToken,
}

struct MediatorActor {
    client: Arc<dyn SessionClient>,
    subscription: EventSubscription,
    slot: GraphSlot,
    render_tx: mpsc::UnboundedSender<GraphPayload>,
    signals: broadcast::Sender<MediatorSignal>,
    ack_delay: Duration,
    pending: HashMap<u64, PendingAcknowledgment>,
    next_ack_id: u64,
    ack_due_tx: mpsc::UnboundedSender<u64>,
    ack_due_rx: mpsc::UnboundedReceiver<u64>,
    cancel: CancellationToken,
}

impl MediatorActor {
    async fn run(mut self, mut cmd_rx: mpsc::Receiver<MediatorCmd>) {
        loop {
            tokio::select! {
                biased;

                () = self.cancel.cancelled() => break,

                Some(ack_id) = self.ack_due_rx.recv() => self.flush_acknowledgment(ack_id),

                // Events already delivered are handled before queued commands.
                event = self.subscription.recv() => match event {
                    Some(ClientEvent::ToolCall(batch)) => self.on_tool_invocation_batch(&batch),
                    Some(ClientEvent::ToolCallCancellation(cancellation)) => {
                        self.withdraw(&cancellation.ids);
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

        if !self.pending.is_empty() {
            tracing::debug!(
                pending = self.pending.len(),
                "Dropping unsent tool call acknowledgments"
            );
        }
        self.cancel.cancel();
        tracing::debug!("Tool call mediator stopped");
    }

    fn handle_cmd(&mut self, cmd: MediatorCmd) {
        match cmd {
            MediatorCmd::PendingAcknowledgments { reply } => {
                let count = self.pending.values().map(|p| p.batch.responses.len()).sum();
                let _ = reply.send(count);
            }
        }
    }

    fn on_tool_invocation_batch(&mut self, batch: &ToolInvocationBatch) {
        tracing::debug!(
            calls = batch.len(),
            ids = ?batch.ids().collect::<Vec<_>>(),
            "Received tool call batch"
        );

        let plan = plan_batch(batch);

        match plan.action {
            Some(ToolAction::RenderGraph { call_id, payload }) => {
                let changed = self.slot.replace(payload.clone());
                tracing::debug!(call_id = %call_id, changed, "Current graph updated");
                if changed && self.render_tx.send(payload).is_err() {
                    tracing::warn!(call_id = %call_id, "Renderer stopped, graph not queued");
                }
                let _ = self.signals.send(MediatorSignal::GraphUpdated { call_id });
            }
            Some(ToolAction::Rejected { call_id, error }) => {
                tracing::warn!(
                    call_id = %call_id,
                    tool = error.tool_name(),
                    error = %error,
                    "Tool call arguments rejected, acknowledging anyway"
                );
                let _ = self
                    .signals
                    .send(MediatorSignal::ExtractionFailed { call_id, error });
            }
            None => {
                tracing::debug!("No recognized tool in batch");
            }
        }

        if let Some(acknowledgment) = plan.acknowledgment {
            self.schedule_acknowledgment(acknowledgment);
        }
    }

    fn schedule_acknowledgment(&mut self, batch: ToolResponseBatch) {
        let ack_id = self.next_ack_id;
        self.next_ack_id += 1;

        let timer = self.cancel.child_token();
        let due_tx = self.ack_due_tx.clone();
        let delay = self.ack_delay;
        let task_timer = timer.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = task_timer.cancelled() => {}
                () = tokio::time::sleep(delay) => {
                    let _ = due_tx.send(ack_id);
                }
            }
        });

        self.pending
            .insert(ack_id, PendingAcknowledgment { batch, timer });
    }

    fn flush_acknowledgment(&mut self, ack_id: u64) {
        // Withdrawn after the timer fired.
        let Some(pending) = self.pending.remove(&ack_id) else {
            return;
        };

        let ids: Vec<String> = pending.batch.ids().map(String::from).collect();
        match self.client.send_tool_response(pending.batch) {
            Ok(()) => {
                tracing::debug!(ids = ?ids, "Tool calls acknowledged");
                let _ = self.signals.send(MediatorSignal::Acknowledged { ids });
            }
            Err(e) => {
                tracing::warn!(ids = ?ids, error = %e, "Failed to send tool response");
                let _ = self.signals.send(MediatorSignal::AcknowledgmentFailed {
                    ids,
                    error: e.to_string(),
                });
            }
        }
    }

    fn withdraw(&mut self, cancelled: &[String]) {
        let mut withdrawn = Vec::new();
        for pending in self.pending.values_mut() {
            withdrawn.extend(
                pending
                    .batch
                    .ids()
                    .filter(|id| cancelled.iter().any(|c| c == id))
                    .map(String::from),
            );
            pending.batch.withdraw(cancelled);
        }

        self.pending.retain(|_, pending| {
            if pending.batch.is_empty() {
                pending.timer.cancel();
                false
            } else {
                true
            }
        });

        if !withdrawn.is_empty() {
            tracing::debug!(ids = ?withdrawn, "Tool calls cancelled before acknowledgment");
            let _ = self
                .signals
                .send(MediatorSignal::AcknowledgmentWithdrawn { ids: withdrawn });
        }
    }
}
