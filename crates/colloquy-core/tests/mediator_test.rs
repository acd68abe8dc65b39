use std::sync::Arc;
use std::time::Duration;

use colloquy_core::client::{LoopbackClient, SessionClient};
use colloquy_core::config::Settings;
use colloquy_core::live::{ClientMessage, ServerMessage};
use colloquy_core::mediator::{
    GraphPayload, MediatorHandle, MediatorSignal, RenderAnchor, RenderError, ToolCallMediator,
};
use colloquy_core::test_utils::RecordingSink;
use serde_json::json;
use tokio::sync::broadcast;
use tokio::time::{Instant, sleep, timeout};

fn mount(client: &Arc<LoopbackClient>, sink: &Arc<RecordingSink>) -> MediatorHandle {
    ToolCallMediator::new(client.clone(), sink.clone(), &Settings::default()).mount()
}

fn deliver(client: &LoopbackClient, frame: serde_json::Value) {
    let message = ServerMessage::from_json(&frame.to_string()).expect("valid server frame");
    client.deliver(message);
}

async fn wait_for(
    signals: &mut broadcast::Receiver<MediatorSignal>,
    matches: impl Fn(&MediatorSignal) -> bool,
) -> MediatorSignal {
    timeout(Duration::from_secs(5), async {
        loop {
            let signal = signals.recv().await.expect("signal channel open");
            if matches(&signal) {
                return signal;
            }
        }
    })
    .await
    .expect("signal not observed in time")
}

#[tokio::test(start_paused = true)]
async fn renders_graph_and_acknowledges_after_delay() {
    let client = Arc::new(LoopbackClient::new());
    let sink = Arc::new(RecordingSink::new());
    let handle = mount(&client, &sink);
    let mut signals = handle.subscribe_signals();

    let start = Instant::now();
    deliver(
        &client,
        json!({ "toolCall": { "functionCalls": [
            { "id": "c1", "name": "render_altair", "args": { "json_graph": "{\"mark\":\"bar\"}" } }
        ]}}),
    );

    wait_for(&mut signals, |s| matches!(s, MediatorSignal::GraphUpdated { .. })).await;
    assert_eq!(
        handle.current_graph(),
        Some(GraphPayload::new(r#"{"mark":"bar"}"#))
    );

    wait_for(&mut signals, |s| matches!(s, MediatorSignal::Rendered { .. })).await;
    assert_eq!(
        sink.embedded(),
        vec![(RenderAnchor::default(), json!({ "mark": "bar" }))]
    );

    sleep(Duration::from_millis(150)).await;
    assert!(client.tool_responses().is_empty(), "acknowledged too early");
    assert_eq!(handle.pending_acknowledgments().await.unwrap(), 1);

    let signal = wait_for(&mut signals, |s| matches!(s, MediatorSignal::Acknowledged { .. })).await;
    assert_eq!(
        signal,
        MediatorSignal::Acknowledged {
            ids: vec!["c1".to_string()]
        }
    );
    assert!(start.elapsed() >= Duration::from_millis(200));

    let frames: Vec<serde_json::Value> = client
        .outbound()
        .iter()
        .filter(|m| m.tool_response().is_some())
        .map(|m| serde_json::from_str(&m.to_json().unwrap()).unwrap())
        .collect();
    assert_eq!(
        frames,
        vec![json!({ "toolResponse": { "functionResponses": [
            { "id": "c1", "response": { "output": { "success": true } } }
        ]}})]
    );

    handle.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn unknown_tools_are_acknowledged_without_rendering() {
    let client = Arc::new(LoopbackClient::new());
    let sink = Arc::new(RecordingSink::new());
    let handle = mount(&client, &sink);
    let mut signals = handle.subscribe_signals();

    deliver(
        &client,
        json!({ "toolCall": { "functionCalls": [
            { "id": "x1", "name": "lookup_weather", "args": { "city": "Oslo" } }
        ]}}),
    );

    let signal = wait_for(&mut signals, |s| matches!(s, MediatorSignal::Acknowledged { .. })).await;
    assert_eq!(
        signal,
        MediatorSignal::Acknowledged {
            ids: vec!["x1".to_string()]
        }
    );
    assert_eq!(handle.current_graph(), None);
    assert!(sink.embedded().is_empty());

    handle.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn invalid_graph_json_is_reported_but_still_acknowledged() {
    let client = Arc::new(LoopbackClient::new());
    let sink = Arc::new(RecordingSink::new());
    let handle = mount(&client, &sink);
    let mut signals = handle.subscribe_signals();

    deliver(
        &client,
        json!({ "toolCall": { "functionCalls": [
            { "id": "c1", "name": "render_altair", "args": { "json_graph": "{\"mark\":" } }
        ]}}),
    );

    let signal = wait_for(&mut signals, |s| matches!(s, MediatorSignal::RenderFailed { .. })).await;
    assert!(matches!(
        signal,
        MediatorSignal::RenderFailed {
            error: RenderError::MalformedGraph { .. }
        }
    ));
    assert!(sink.embedded().is_empty());
    assert_eq!(sink.errors().len(), 1);

    wait_for(&mut signals, |s| matches!(s, MediatorSignal::Acknowledged { .. })).await;
    let responses = client.tool_responses();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].ids().collect::<Vec<_>>(), vec!["c1"]);

    handle.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn missing_argument_is_signalled_and_acknowledged() {
    let client = Arc::new(LoopbackClient::new());
    let sink = Arc::new(RecordingSink::new());
    let handle = mount(&client, &sink);
    let mut signals = handle.subscribe_signals();

    deliver(
        &client,
        json!({ "toolCall": { "functionCalls": [
            { "id": "c1", "name": "render_altair", "args": {} }
        ]}}),
    );

    let signal = wait_for(&mut signals, |s| {
        matches!(s, MediatorSignal::ExtractionFailed { .. })
    })
    .await;
    let MediatorSignal::ExtractionFailed { call_id, .. } = signal else {
        unreachable!();
    };
    assert_eq!(call_id, "c1");
    assert_eq!(handle.current_graph(), None);

    wait_for(&mut signals, |s| matches!(s, MediatorSignal::Acknowledged { .. })).await;
    assert_eq!(client.tool_responses().len(), 1);

    handle.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn later_batch_replaces_current_graph() {
    let client = Arc::new(LoopbackClient::new());
    let sink = Arc::new(RecordingSink::new());
    let handle = mount(&client, &sink);
    let mut signals = handle.subscribe_signals();

    for (id, graph) in [("c1", r#"{"mark":"bar"}"#), ("c2", r#"{"mark":"line"}"#)] {
        deliver(
            &client,
            json!({ "toolCall": { "functionCalls": [
                { "id": id, "name": "render_altair", "args": { "json_graph": graph } }
            ]}}),
        );
        wait_for(&mut signals, |s| matches!(s, MediatorSignal::Rendered { .. })).await;
    }

    assert_eq!(
        handle.current_graph(),
        Some(GraphPayload::new(r#"{"mark":"line"}"#))
    );
    assert_eq!(
        sink.embedded()
            .into_iter()
            .map(|(_, doc)| doc)
            .collect::<Vec<_>>(),
        vec![json!({ "mark": "bar" }), json!({ "mark": "line" })]
    );

    handle.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn back_to_back_batches_each_reach_the_sink() {
    let client = Arc::new(LoopbackClient::new());
    let sink = Arc::new(RecordingSink::new());
    let handle = mount(&client, &sink);

    for (id, graph) in [("c1", r#"{"mark":"bar"}"#), ("c2", r#"{"mark":"line"}"#)] {
        deliver(
            &client,
            json!({ "toolCall": { "functionCalls": [
                { "id": id, "name": "render_altair", "args": { "json_graph": graph } }
            ]}}),
        );
    }
    sleep(Duration::from_secs(1)).await;

    assert_eq!(
        sink.embedded()
            .into_iter()
            .map(|(_, doc)| doc)
            .collect::<Vec<_>>(),
        vec![json!({ "mark": "bar" }), json!({ "mark": "line" })]
    );
    assert_eq!(client.tool_responses().len(), 2);
    assert_eq!(
        handle.current_graph(),
        Some(GraphPayload::new(r#"{"mark":"line"}"#))
    );

    handle.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn repeated_graph_is_rendered_once() {
    let client = Arc::new(LoopbackClient::new());
    let sink = Arc::new(RecordingSink::new());
    let handle = mount(&client, &sink);

    for id in ["c1", "c2"] {
        deliver(
            &client,
            json!({ "toolCall": { "functionCalls": [
                { "id": id, "name": "render_altair", "args": { "json_graph": "{\"mark\":\"bar\"}" } }
            ]}}),
        );
    }
    sleep(Duration::from_secs(1)).await;

    assert_eq!(sink.embedded().len(), 1);
    assert_eq!(client.tool_responses().len(), 2);

    handle.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn unmount_before_delay_sends_nothing() {
    let client = Arc::new(LoopbackClient::new());
    let sink = Arc::new(RecordingSink::new());
    let handle = mount(&client, &sink);
    let mut signals = handle.subscribe_signals();

    deliver(
        &client,
        json!({ "toolCall": { "functionCalls": [
            { "id": "c1", "name": "render_altair", "args": { "json_graph": "{}" } }
        ]}}),
    );
    wait_for(&mut signals, |s| matches!(s, MediatorSignal::GraphUpdated { .. })).await;

    handle.unmount().await;
    sleep(Duration::from_secs(1)).await;

    assert!(client.tool_responses().is_empty());
    assert_eq!(client.subscriber_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn cancellation_withdraws_pending_acknowledgment() {
    let client = Arc::new(LoopbackClient::new());
    let sink = Arc::new(RecordingSink::new());
    let handle = mount(&client, &sink);
    let mut signals = handle.subscribe_signals();

    deliver(
        &client,
        json!({ "toolCall": { "functionCalls": [
            { "id": "c1", "name": "render_altair", "args": { "json_graph": "{}" } },
            { "id": "c2", "name": "lookup", "args": {} }
        ]}}),
    );
    wait_for(&mut signals, |s| matches!(s, MediatorSignal::GraphUpdated { .. })).await;

    deliver(&client, json!({ "toolCallCancellation": { "ids": ["c2"] } }));
    let signal = wait_for(&mut signals, |s| {
        matches!(s, MediatorSignal::AcknowledgmentWithdrawn { .. })
    })
    .await;
    assert_eq!(
        signal,
        MediatorSignal::AcknowledgmentWithdrawn {
            ids: vec!["c2".to_string()]
        }
    );
    assert_eq!(handle.pending_acknowledgments().await.unwrap(), 1);

    wait_for(&mut signals, |s| matches!(s, MediatorSignal::Acknowledged { .. })).await;
    let responses = client.tool_responses();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].ids().collect::<Vec<_>>(), vec!["c1"]);

    handle.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn cancelling_every_call_sends_nothing() {
    let client = Arc::new(LoopbackClient::new());
    let sink = Arc::new(RecordingSink::new());
    let handle = mount(&client, &sink);
    let mut signals = handle.subscribe_signals();

    deliver(
        &client,
        json!({ "toolCall": { "functionCalls": [
            { "id": "c1", "name": "lookup", "args": {} }
        ]}}),
    );
    deliver(&client, json!({ "toolCallCancellation": { "ids": ["c1"] } }));
    wait_for(&mut signals, |s| {
        matches!(s, MediatorSignal::AcknowledgmentWithdrawn { .. })
    })
    .await;

    sleep(Duration::from_secs(1)).await;
    assert!(client.tool_responses().is_empty());
    assert_eq!(handle.pending_acknowledgments().await.unwrap(), 0);

    handle.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn mount_declares_render_altair() {
    let client = Arc::new(LoopbackClient::new());
    let sink = Arc::new(RecordingSink::new());
    let handle = mount(&client, &sink);

    let config = client.configured().expect("client configured on mount");
    let names: Vec<&str> = config
        .function_declarations()
        .iter()
        .map(|d| d.name.as_str())
        .collect();
    assert_eq!(names, vec!["render_altair"]);

    let declaration = &config.function_declarations()[0];
    assert_eq!(declaration.description, "Displays an altair graph in json format.");
    assert_eq!(declaration.parameters.required, vec!["json_graph".to_string()]);

    handle.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn remount_holds_a_single_subscription() {
    let client = Arc::new(LoopbackClient::new());
    let sink = Arc::new(RecordingSink::new());

    let first = mount(&client, &sink);
    assert_eq!(client.subscriber_count(), 1);
    first.unmount().await;
    assert_eq!(client.subscriber_count(), 0);

    let second = mount(&client, &sink);
    assert_eq!(client.subscriber_count(), 1);
    assert!(!client.is_connected());
    second.unmount().await;
}
