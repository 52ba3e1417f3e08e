// End-to-end tests: a real WebSocket client talking to a running relay server,
// with the test playing the role of the speech pipeline.

use std::time::Duration;

use anyhow::Result;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use voice_relay::pipeline::{self, CommandKind, Notification, PipelineEndpoint, SessionEvent};
use voice_relay::protocol::{AlexToClient, ClientToAlex, OutboundPayload};
use voice_relay::server::{RelayServer, Shutdown};
use voice_relay::session::SessionStatus;
use voice_relay::Config;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

struct TestServer {
    url: String,
    endpoint: PipelineEndpoint,
    status: watch::Receiver<SessionStatus>,
    shutdown: Shutdown,
    handle: JoinHandle<Result<()>>,
}

async fn start_server() -> Result<TestServer> {
    let mut config = Config::default();
    config.listen.addr = "127.0.0.1".to_string();
    config.listen.port = 0;
    config.router.enabled = false;
    config.http.enabled = false;
    config.relay.poll_timeout_ms = 50;

    let shutdown = Shutdown::new();
    let (endpoint, handle) = pipeline::channel(64);
    let server = RelayServer::bind(config, handle, shutdown.clone()).await?;
    let url = format!("ws://{}", server.local_addr()?);
    let status = server.status();
    let handle = tokio::spawn(server.run());

    Ok(TestServer {
        url,
        endpoint,
        status,
        shutdown,
        handle,
    })
}

async fn next_event(endpoint: &mut PipelineEndpoint) -> SessionEvent {
    tokio::time::timeout(WAIT, endpoint.recv())
        .await
        .expect("timed out waiting for pipeline event")
        .expect("event loop went away")
}

async fn next_message(ws: &mut WsStream) -> AlexToClient {
    loop {
        let msg = tokio::time::timeout(WAIT, ws.next())
            .await
            .expect("timed out waiting for client message")
            .expect("connection closed")
            .expect("websocket error");

        if let Message::Binary(data) = msg {
            return AlexToClient::decode(&data).expect("valid AlexToClient");
        }
    }
}

async fn connect_client(server: &mut TestServer) -> WsStream {
    let (ws, _) = connect_async(server.url.as_str()).await.expect("WS connect failed");

    match next_event(&mut server.endpoint).await {
        SessionEvent::Notification(Notification::IncomingCall { .. }) => {}
        other => panic!("expected incoming_call, got {:?}", other),
    }
    match next_event(&mut server.endpoint).await {
        SessionEvent::Notification(Notification::CallConfirmed { .. }) => {}
        other => panic!("expected call_confirmed, got {:?}", other),
    }

    ws
}

async fn send_client(ws: &mut WsStream, key: &str, speech: &'static [u8], playing: i32) {
    let msg = ClientToAlex {
        key: key.to_string(),
        speech: Bytes::from_static(speech),
        currently_playing_utterance: playing,
    };
    ws.send(Message::Binary(msg.encode().to_vec())).await.unwrap();
}

#[tokio::test]
async fn test_client_audio_reaches_pipeline_only_with_key() -> Result<()> {
    let mut server = start_server().await?;
    let key = server.status.borrow().key.clone();
    let mut ws = connect_client(&mut server).await;

    send_client(&mut ws, &key, b"abcd", 0).await;
    assert_eq!(
        next_event(&mut server.endpoint).await,
        SessionEvent::RecordedAudio(voice_relay::AudioFrame::new(&b"abcd"[..]))
    );
    assert_eq!(
        next_event(&mut server.endpoint).await,
        SessionEvent::Notification(Notification::CurrentlyPlaying { utterance_id: 0 })
    );

    // Wrong key: dropped; the next valid frame is the next thing the pipeline sees
    send_client(&mut ws, "WRONGKEY", b"zzzz", 5).await;
    send_client(&mut ws, &key, b"efgh", 0).await;
    assert_eq!(
        next_event(&mut server.endpoint).await,
        SessionEvent::RecordedAudio(voice_relay::AudioFrame::new(&b"efgh"[..]))
    );

    server.shutdown.trigger();
    server.handle.await??;
    Ok(())
}

#[tokio::test]
async fn test_utterance_audio_delivered_in_chunks() -> Result<()> {
    let mut server = start_server().await?;
    let mut ws = connect_client(&mut server).await;

    server.endpoint.utterance_start().await?;
    server.endpoint.play_audio(vec![7u8; 1000]).await?;

    let begin = next_message(&mut ws).await;
    assert_eq!(begin.seq, 1);
    assert_eq!(begin.payload, OutboundPayload::SpeechBegin { utterance_id: 0 });

    let speech = next_message(&mut ws).await;
    assert_eq!(speech.seq, 2);
    assert_eq!(speech.payload, OutboundPayload::Speech(Bytes::from(vec![7u8; 640])));

    assert_eq!(
        next_event(&mut server.endpoint).await,
        SessionEvent::Notification(Notification::UtteranceStarted { utterance_id: 0 })
    );

    server.endpoint.utterance_end().await?;
    let end = next_message(&mut ws).await;
    assert_eq!(end.seq, 3);
    assert_eq!(end.payload, OutboundPayload::SpeechEnd { utterance_id: 0 });

    server.shutdown.trigger();
    server.handle.await??;
    Ok(())
}

#[tokio::test]
async fn test_text_results_and_flush_out() -> Result<()> {
    let mut server = start_server().await?;
    let mut ws = connect_client(&mut server).await;

    server.endpoint.asr_result("Yes PLEASE").await?;
    server.endpoint.send_command(CommandKind::FlushOut).await?;

    let asr = next_message(&mut ws).await;
    assert_eq!(asr.payload, OutboundPayload::AsrResult("yes please".to_string()));

    let flush = next_message(&mut ws).await;
    assert_eq!(flush.payload, OutboundPayload::FlushOutAudio);
    assert!(flush.seq > asr.seq);

    server.shutdown.trigger();
    server.handle.await??;
    Ok(())
}

#[tokio::test]
async fn test_second_client_is_turned_away() -> Result<()> {
    let mut server = start_server().await?;
    let _first = connect_client(&mut server).await;

    let (mut second, _) = connect_async(server.url.as_str()).await?;
    let closed = tokio::time::timeout(WAIT, async {
        loop {
            match second.next().await {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return true,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await
    .expect("second client should be closed");
    assert!(closed);

    assert!(server.endpoint.try_recv().is_none());
    assert!(server.status.borrow().connected);

    server.shutdown.trigger();
    server.handle.await??;
    Ok(())
}

#[tokio::test]
async fn test_disconnect_rotates_key_and_resets_sequence() -> Result<()> {
    let mut server = start_server().await?;
    let first_key = server.status.borrow().key.clone();

    let mut ws = connect_client(&mut server).await;
    server.endpoint.system_prompt("hello").await?;
    assert_eq!(next_message(&mut ws).await.seq, 1);

    ws.close(None).await?;
    match next_event(&mut server.endpoint).await {
        SessionEvent::Notification(Notification::CallDisconnected { .. }) => {}
        other => panic!("expected call_disconnected, got {:?}", other),
    }

    let status = server
        .status
        .wait_for(|s| !s.connected)
        .await?
        .clone();
    assert_ne!(status.key, first_key);

    let mut ws = connect_client(&mut server).await;
    server.endpoint.system_prompt("again").await?;
    assert_eq!(next_message(&mut ws).await.seq, 1);

    // The first client's key no longer authenticates
    send_client(&mut ws, &first_key, b"old", 0).await;
    send_client(&mut ws, &status.key, b"new", 0).await;
    assert_eq!(
        next_event(&mut server.endpoint).await,
        SessionEvent::RecordedAudio(voice_relay::AudioFrame::new(&b"new"[..]))
    );

    server.shutdown.trigger();
    server.handle.await??;
    Ok(())
}

#[tokio::test]
async fn test_stop_command_ends_event_loop() -> Result<()> {
    let server = start_server().await?;

    server.endpoint.send_command(CommandKind::Stop).await?;

    let result = tokio::time::timeout(WAIT, server.handle)
        .await
        .expect("server should stop")?;
    assert!(result.is_ok());
    assert!(server.shutdown.is_triggered());
    Ok(())
}

#[tokio::test]
async fn test_pipeline_loss_fails_and_triggers_shutdown() -> Result<()> {
    let TestServer {
        endpoint,
        shutdown,
        handle,
        ..
    } = start_server().await?;

    drop(endpoint);

    let result = tokio::time::timeout(WAIT, handle)
        .await
        .expect("server should stop")?;
    let err = result.expect_err("losing the pipeline is fatal");
    assert!(err.to_string().contains("pipeline channel closed"));
    assert!(shutdown.is_triggered());
    Ok(())
}
