use super::Command;
use crate::script::{ScriptStep, parse_script};
use crate::sink::TerminalSink;
use async_trait::async_trait;
use colloquy_core::client::LoopbackClient;
use colloquy_core::config::Settings;
use colloquy_core::live::ClientMessage;
use colloquy_core::mediator::{
    GraphPayload, MediatorHandle, MediatorSignal, RenderSink, ToolCallMediator,
};
use colloquy_core::transcript::{
    TranscriptAccumulator, TranscriptEntry, TranscriptError, TranscriptHandle,
};
use eyre::{Result, WrapErr};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

pub struct ReplayCommand {
    pub script: PathBuf,
    pub settings: Settings,
}

#[async_trait]
impl Command for ReplayCommand {
    async fn execute(&self) -> Result<()> {
        let contents = std::fs::read_to_string(&self.script)
            .wrap_err_with(|| format!("Failed to read script {}", self.script.display()))?;
        let steps = parse_script(&contents)?;
        info!(steps = steps.len(), script = %self.script.display(), "Replaying script");

        let sink = Arc::new(TerminalSink::new(std::io::stdout()));
        let report = run_script(&steps, &self.settings, sink).await?;

        let mut stdout = std::io::stdout().lock();
        report.write_to(&mut stdout)?;
        Ok(())
    }
}

/// State of the session once a script has finished and every pending
/// acknowledgment has been flushed.
#[derive(Debug)]
pub struct ReplayReport {
    pub transcript: Vec<TranscriptEntry>,
    pub outbound: Vec<ClientMessage>,
    pub graph: Option<GraphPayload>,
}

impl ReplayReport {
    pub fn write_to(&self, out: &mut impl Write) -> Result<()> {
        writeln!(out, "== transcript ==")?;
        for entry in &self.transcript {
            writeln!(out, "{}: {}", entry.speaker, entry.text)?;
        }

        writeln!(out, "== outbound ==")?;
        for message in &self.outbound {
            writeln!(out, "{}", message.to_json()?)?;
        }

        writeln!(out, "== graph ==")?;
        match &self.graph {
            Some(graph) => writeln!(out, "{graph}")?,
            None => writeln!(out, "(none)")?,
        }
        Ok(())
    }
}

/// Mounts a mediator and a transcript on a fresh loopback client and feeds
/// `steps` through them in order.
pub async fn run_script(
    steps: &[ScriptStep],
    settings: &Settings,
    sink: Arc<dyn RenderSink>,
) -> Result<ReplayReport> {
    let client = Arc::new(LoopbackClient::new());
    let mediator = ToolCallMediator::new(client.clone(), sink, settings).mount();
    let transcript = TranscriptAccumulator::new(client.clone(), settings).mount();
    let signal_log = tokio::spawn(log_signals(mediator.subscribe_signals()));

    for step in steps {
        match step {
            ScriptStep::User { user } => match transcript.submit_user_text(user.clone()).await {
                Ok(index) => debug!(index, "Submitted user text"),
                Err(TranscriptError::EmptyInput) => warn!("Skipping blank user step"),
                Err(e) => return Err(e.into()),
            },
            ScriptStep::OpenPanel { open_panel } => {
                if *open_panel {
                    let state = transcript.open_panel().await?;
                    debug!(state = %state, "Chat panel opened");
                }
            }
            ScriptStep::Wait { wait_ms } => {
                tokio::time::sleep(Duration::from_millis(*wait_ms)).await;
            }
            ScriptStep::Disconnect { disconnect } => {
                client.disconnect(Some(disconnect.clone()));
                settle(&mediator, &transcript).await?;
            }
            ScriptStep::Server(message) => {
                client.deliver(message.clone());
                settle(&mediator, &transcript).await?;
            }
        }
    }

    while mediator.pending_acknowledgments().await? > 0 {
        tokio::time::sleep(settings.ack_delay()).await;
    }

    let report = ReplayReport {
        transcript: transcript.transcript().await?,
        outbound: client.outbound(),
        graph: mediator.current_graph(),
    };

    transcript.unmount().await;
    mediator.unmount().await;
    if let Err(e) = signal_log.await {
        debug!(error = %e, "Signal log task ended unexpectedly");
    }

    Ok(report)
}

/// Round-trips both actors so events delivered so far have been applied.
async fn settle(mediator: &MediatorHandle, transcript: &TranscriptHandle) -> Result<()> {
    mediator.pending_acknowledgments().await?;
    transcript.connection_state().await?;
    Ok(())
}

async fn log_signals(mut signals: tokio::sync::broadcast::Receiver<MediatorSignal>) {
    loop {
        match signals.recv().await {
            Ok(MediatorSignal::RenderFailed { error }) => warn!(error = %error, "Graph not rendered"),
            Ok(MediatorSignal::ExtractionFailed { call_id, error }) => {
                warn!(call_id = %call_id, error = %error, "Tool call arguments rejected");
            }
            Ok(signal) => info!(signal = ?signal, "Mediator"),
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "Mediator signals dropped"),
            Err(RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colloquy_core::test_utils::RecordingSink;
    use colloquy_core::transcript::Speaker;
    use serde_json::json;

    const SCRIPT: &str = r#"
{"user": "Plot sales by region"}
{"serverContent": {"modelTurn": {"parts": [{"text": "Sure, "}]}}}
{"serverContent": {"modelTurn": {"parts": [{"text": "here it is."}]}}}
{"toolCall": {"functionCalls": [{"id": "c1", "name": "render_altair", "args": {"json_graph": "{\"mark\":\"bar\"}"}}]}}
{"serverContent": {"turnComplete": true}}
"#;

    #[tokio::test(start_paused = true)]
    async fn replays_a_graph_session() {
        let steps = parse_script(SCRIPT).unwrap();
        let sink = Arc::new(RecordingSink::new());

        let report = run_script(&steps, &Settings::default(), sink.clone())
            .await
            .unwrap();

        let speakers: Vec<Speaker> = report.transcript.iter().map(|e| e.speaker).collect();
        assert_eq!(speakers, vec![Speaker::User, Speaker::Model, Speaker::Model]);
        assert_eq!(report.transcript[1].text, "Sure, ");

        assert_eq!(
            report.graph,
            Some(GraphPayload::new(r#"{"mark":"bar"}"#))
        );
        assert_eq!(sink.embedded().len(), 1);
        assert_eq!(sink.embedded()[0].1, json!({ "mark": "bar" }));

        let responses: Vec<_> = report
            .outbound
            .iter()
            .filter_map(ClientMessage::tool_response)
            .collect();
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].ids().collect::<Vec<_>>(), vec!["c1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn unrecognized_server_content_is_ignored() {
        let steps = parse_script(
            r#"
{"serverContent": {"modelTurn": {"parts": [{"text": "Hi"}]}}}
{"serverContent": {"generationComplete": true}}
{"serverContent": {}}
"#,
        )
        .unwrap();

        let report = run_script(&steps, &Settings::default(), Arc::new(RecordingSink::new()))
            .await
            .unwrap();

        assert_eq!(report.transcript.len(), 1);
        assert_eq!(report.transcript[0].text, "Hi");
    }

    #[tokio::test(start_paused = true)]
    async fn report_lists_sections_in_order() {
        let steps = parse_script(r#"{"user": "hi"}"#).unwrap();
        let report = run_script(&steps, &Settings::default(), Arc::new(RecordingSink::new()))
            .await
            .unwrap();

        let mut out = Vec::new();
        report.write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("== transcript ==\nuser: hi\n== outbound ==\n"));
        assert!(text.contains(r#"{"clientContent":{"turns":[{"role":"user","parts":[{"text":"hi"}]}],"turnComplete":true}}"#));
        assert!(text.ends_with("== graph ==\n(none)\n"));
    }
}
