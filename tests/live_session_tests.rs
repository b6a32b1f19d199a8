// End-to-end tests for the live session pipeline.
//
// Each test drives scripted recognition events through a real session and
// observes the suggestion requests that come out the other side. Time is
// paused, so silence deadlines elapse deterministically.

mod common;

use anyhow::Result;
use common::{EmptyClipboard, FakeClipboard, GatedClient, RecordingClient, ScriptedBackend};
use live_assist::vision::VisionError;
use live_assist::{
    ListenState, LiveSession, RecognitionEvent, SegmentationConfig, SessionConfig, SuggestMode,
    TriggerPolicy,
};
use std::sync::Arc;
use std::time::Duration;

fn session_config(policy: TriggerPolicy, stop_on_silence: bool) -> SessionConfig {
    SessionConfig {
        session_id: "assist-test".to_string(),
        segmentation: SegmentationConfig {
            policy,
            silence_delay: Duration::from_millis(2000),
            growth_threshold: 50,
            stop_on_silence,
        },
        ..SessionConfig::default()
    }
}

async fn settle() {
    // Let channel hops drain before asserting
    tokio::time::sleep(Duration::from_millis(10)).await;
}

#[tokio::test(start_paused = true)]
async fn test_silence_fires_exactly_one_request_with_full_transcript() -> Result<()> {
    let (backend, script) = ScriptedBackend::new();
    let client = Arc::new(RecordingClient::new("140"));
    let session = LiveSession::new(
        session_config(TriggerPolicy::SilenceDebounce, false),
        Box::new(backend),
        client.clone(),
        Arc::new(FakeClipboard),
    );
    session.start().await?;

    script
        .send(RecognitionEvent::Final(
            "I have five years of React experience".to_string(),
        ))
        .await?;

    tokio::time::sleep(Duration::from_millis(2100)).await;

    let requests = client.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 1, "silence should fire exactly once");
    assert_eq!(
        requests[0].transcript.as_deref(),
        Some("I have five years of React experience")
    );

    // The trigger itself must not mutate the transcript
    let view = session.transcript().await;
    assert_eq!(view.transcript, "I have five years of React experience");

    // No further growth, no further requests
    tokio::time::sleep(Duration::from_millis(5000)).await;
    assert_eq!(client.request_count(), 1);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_growth_restarts_the_silence_timer() -> Result<()> {
    let (backend, script) = ScriptedBackend::new();
    let client = Arc::new(RecordingClient::new("140"));
    let session = LiveSession::new(
        session_config(TriggerPolicy::SilenceDebounce, false),
        Box::new(backend),
        client.clone(),
        Arc::new(FakeClipboard),
    );
    session.start().await?;

    script.send(RecognitionEvent::Final("first part".to_string())).await?;
    tokio::time::sleep(Duration::from_millis(1000)).await;

    // Growth inside the quiet interval restarts the timer
    script.send(RecognitionEvent::Final("second part".to_string())).await?;
    tokio::time::sleep(Duration::from_millis(1500)).await;

    assert_eq!(
        client.request_count(),
        0,
        "timer must not fire before the last growth plus the delay"
    );

    tokio::time::sleep(Duration::from_millis(600)).await;

    let requests = client.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].transcript.as_deref(), Some("first part second part"));

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_growth_threshold_dispatches_without_waiting() -> Result<()> {
    let (backend, script) = ScriptedBackend::new();
    let client = Arc::new(RecordingClient::new("140"));
    let session = LiveSession::new(
        session_config(TriggerPolicy::GrowthThreshold, false),
        Box::new(backend),
        client.clone(),
        Arc::new(FakeClipboard),
    );
    session.start().await?;

    // 59 characters of growth within one hypothesis
    script
        .send(RecognitionEvent::Final(
            "I have spent six years building React applications at scale".to_string(),
        ))
        .await?;

    // Well under the 2-second silence delay
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(client.request_count(), 1, "fast path should dispatch immediately");

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_short_growth_does_not_trip_the_threshold() -> Result<()> {
    let (backend, script) = ScriptedBackend::new();
    let client = Arc::new(RecordingClient::new("140"));
    let session = LiveSession::new(
        session_config(TriggerPolicy::GrowthThreshold, false),
        Box::new(backend),
        client.clone(),
        Arc::new(FakeClipboard),
    );
    session.start().await?;

    script.send(RecognitionEvent::Final("short answer".to_string())).await?;
    tokio::time::sleep(Duration::from_millis(5000)).await;

    assert_eq!(client.request_count(), 0);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_interim_only_speech_never_dispatches() -> Result<()> {
    let (backend, script) = ScriptedBackend::new();
    let client = Arc::new(RecordingClient::new("140"));
    let session = LiveSession::new(
        session_config(TriggerPolicy::SilenceDebounce, false),
        Box::new(backend),
        client.clone(),
        Arc::new(FakeClipboard),
    );
    session.start().await?;

    script.send(RecognitionEvent::Interim("um well".to_string())).await?;
    tokio::time::sleep(Duration::from_millis(5000)).await;

    assert_eq!(
        client.request_count(),
        0,
        "interim hypotheses must not arm or fire the trigger"
    );

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_stop_listening_cancels_the_pending_timer() -> Result<()> {
    let (backend, script) = ScriptedBackend::new();
    let client = Arc::new(RecordingClient::new("140"));
    let session = LiveSession::new(
        session_config(TriggerPolicy::SilenceDebounce, false),
        Box::new(backend),
        client.clone(),
        Arc::new(FakeClipboard),
    );
    session.start().await?;

    script.send(RecognitionEvent::Final("about to stop".to_string())).await?;
    tokio::time::sleep(Duration::from_millis(500)).await;

    session.stop_listening().await;
    tokio::time::sleep(Duration::from_millis(5000)).await;

    assert_eq!(client.request_count(), 0, "no timer may fire after stop");
    assert_eq!(session.status().await.state, ListenState::Stopped);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_auto_turn_taking_stops_capture_after_silence() -> Result<()> {
    let (backend, script) = ScriptedBackend::new();
    let client = Arc::new(RecordingClient::new("140"));
    let session = LiveSession::new(
        session_config(TriggerPolicy::SilenceDebounce, true),
        Box::new(backend),
        client.clone(),
        Arc::new(FakeClipboard),
    );
    session.start().await?;

    script.send(RecognitionEvent::Final("my complete answer".to_string())).await?;
    tokio::time::sleep(Duration::from_millis(2100)).await;

    assert_eq!(client.request_count(), 1);
    assert_eq!(
        session.status().await.state,
        ListenState::Stopped,
        "auto variant stops the engine once silence fires"
    );

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_automatic_triggers_coalesce_while_in_flight() -> Result<()> {
    let (client, release) = GatedClient::new();
    let client = Arc::new(client);
    let (backend, script) = ScriptedBackend::new();
    let session = LiveSession::new(
        session_config(TriggerPolicy::GrowthThreshold, false),
        Box::new(backend),
        client.clone(),
        Arc::new(FakeClipboard),
    );
    session.start().await?;

    script
        .send(RecognitionEvent::Final(
            "this first stretch of speech is comfortably past the threshold".to_string(),
        ))
        .await?;
    settle().await;
    assert_eq!(client.request_count(), 1);

    // More growth while the first request is outstanding: dropped
    script
        .send(RecognitionEvent::Final(
            "and this second stretch would trip the threshold again too".to_string(),
        ))
        .await?;
    settle().await;
    assert_eq!(client.request_count(), 1, "second automatic trigger must coalesce");

    release.send(()).await?;
    settle().await;

    // With the request resolved, fresh growth may dispatch again
    script
        .send(RecognitionEvent::Final(
            "a third stretch of speech long enough to dispatch once more".to_string(),
        ))
        .await?;
    settle().await;
    assert_eq!(client.request_count(), 2);

    release.send(()).await?;

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_manual_triggers_queue_latest_wins() -> Result<()> {
    let (client, release) = GatedClient::new();
    let client = Arc::new(client);
    let (backend, script) = ScriptedBackend::new();
    let session = LiveSession::new(
        session_config(TriggerPolicy::GrowthThreshold, false),
        Box::new(backend),
        client.clone(),
        Arc::new(FakeClipboard),
    );
    session.start().await?;

    script
        .send(RecognitionEvent::Final(
            "opening speech that is long enough to trip the growth policy".to_string(),
        ))
        .await?;
    settle().await;
    assert_eq!(client.request_count(), 1);

    // Two pivots while busy: only the latest survives the queue
    assert!(session.pivot().await);
    script.send(RecognitionEvent::Final("extra".to_string())).await?;
    settle().await;
    assert!(session.pivot().await);

    release.send(()).await?;
    settle().await;
    release.send(()).await?;
    settle().await;

    let requests = client.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 2, "queued manual triggers coalesce to the latest");
    assert_eq!(requests[1].mode, SuggestMode::Pivot);
    assert_eq!(
        requests[1].transcript.as_deref(),
        Some("opening speech that is long enough to trip the growth policy extra"),
        "the queued pivot carries the transcript from the later trigger"
    );

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_vision_trigger_ships_clipboard_image() -> Result<()> {
    let (backend, _script) = ScriptedBackend::new();
    let client = Arc::new(RecordingClient::new("140"));
    let session = LiveSession::new(
        session_config(TriggerPolicy::SilenceDebounce, false),
        Box::new(backend),
        client.clone(),
        Arc::new(FakeClipboard),
    );
    session.start().await?;

    assert!(session.vision().await?);
    settle().await;

    let requests = client.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].mode, SuggestMode::Vision);
    assert!(requests[0].transcript.is_none());
    assert!(requests[0].image.as_deref().is_some_and(|i| !i.is_empty()));

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_vision_without_image_is_a_user_visible_error() -> Result<()> {
    let (backend, _script) = ScriptedBackend::new();
    let client = Arc::new(RecordingClient::new("140"));
    let session = LiveSession::new(
        session_config(TriggerPolicy::SilenceDebounce, false),
        Box::new(backend),
        client.clone(),
        Arc::new(EmptyClipboard),
    );
    session.start().await?;

    let result = session.vision().await;
    assert!(matches!(result, Err(VisionError::NoImage)));
    assert_eq!(client.request_count(), 0);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_end_of_session_stats() -> Result<()> {
    let (backend, script) = ScriptedBackend::new();
    let client = Arc::new(RecordingClient::with_paces(&["110", "140", "170"]));
    let session = LiveSession::new(
        session_config(TriggerPolicy::SilenceDebounce, false),
        Box::new(backend),
        client.clone(),
        Arc::new(FakeClipboard),
    );
    session.start().await?;

    for utterance in ["one two three", "four five", "six"] {
        script.send(RecognitionEvent::Final(utterance.to_string())).await?;
        tokio::time::sleep(Duration::from_millis(2200)).await;
    }
    settle().await;

    assert_eq!(client.request_count(), 3);

    let stats = session.end().await;
    assert_eq!(stats.transcript, "one two three four five six");
    assert_eq!(stats.word_count, 6);
    assert_eq!(stats.pace_history, vec![110, 140, 170]);
    assert_eq!(stats.average_pace, 140);
    assert!(stats.duration_seconds >= 6, "ticker ran for the whole session");

    // Ending is idempotent: the stored summary comes back unchanged
    let again = session.end().await;
    assert_eq!(again.pace_history, stats.pace_history);
    assert_eq!(again.duration_seconds, stats.duration_seconds);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_no_requests_after_session_end() -> Result<()> {
    let (backend, script) = ScriptedBackend::new();
    let client = Arc::new(RecordingClient::new("140"));
    let session = LiveSession::new(
        session_config(TriggerPolicy::SilenceDebounce, false),
        Box::new(backend),
        client.clone(),
        Arc::new(FakeClipboard),
    );
    session.start().await?;

    script.send(RecognitionEvent::Final("lingering speech".to_string())).await?;
    tokio::time::sleep(Duration::from_millis(500)).await;

    session.end().await;

    // The pending silence deadline died with the session
    tokio::time::sleep(Duration::from_millis(5000)).await;
    assert_eq!(client.request_count(), 0);

    Ok(())
}
