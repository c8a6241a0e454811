//! Integration tests against a hand-rolled mock robot: a TCP listener that
//! speaks just enough of the text protocol to exercise handshake, query,
//! and error-path behavior end to end.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream, UdpSocket};
use std::sync::mpsc;
use std::sync::Once;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::Result;

use robomaster_sdk::{
    hub::{Hub, HubState},
    wire::push,
    worker::{CancelToken, ControlFlow, Ctx, Worker, WorkerConfig},
    Commander, DropNewestQueue, Error, EventListener, PushListener,
};

static TRACING_INIT: Once = Once::new();

/// Install a subscriber once per test binary so `tracing::*` calls anywhere in
/// the crate surface on `cargo test -- --nocapture` instead of going nowhere.
fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().with_env_filter("debug").try_init();
    });
}

fn now_ms() -> f64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs_f64() * 1000.0
}

/// Spawn a mock robot that accepts exactly one connection, performs the
/// `command;` handshake, then answers according to `responder` for every
/// subsequent request line (without its trailing `;`). Every received line is
/// also forwarded on `seen` so tests can assert on traffic the client should
/// never have sent.
fn spawn_mock_robot<F>(responder: F) -> (String, u16, mpsc::Receiver<String>)
where
    F: Fn(&str) -> String + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        handle_connection(stream, responder, tx);
    });

    (addr.ip().to_string(), addr.port(), rx)
}

fn handle_connection<F>(stream: TcpStream, responder: F, tx: mpsc::Sender<String>)
where
    F: Fn(&str) -> String,
{
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut writer = stream;
    let mut line = Vec::new();

    loop {
        line.clear();
        match read_semicolon_line(&mut reader, &mut line) {
            Some(text) => {
                let _ = tx.send(text.clone());
                let reply = if text == "command" { "ok".to_string() } else { responder(&text) };
                let _ = writer.write_all(format!("{reply};").as_bytes());
            }
            None => return,
        }
    }
}

/// Accepts one connection, completes the handshake, then reads and discards
/// every further request line without ever replying — used to force a
/// Commander read timeout on the next command.
fn spawn_silent_after_handshake_robot() -> (String, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut writer = stream;
        let mut line = Vec::new();

        match read_semicolon_line(&mut reader, &mut line) {
            Some(text) if text == "command" => {
                let _ = writer.write_all(b"ok;");
            }
            _ => return,
        }

        loop {
            line.clear();
            if read_semicolon_line(&mut reader, &mut line).is_none() {
                return;
            }
            // Swallow the line; the client is waiting on a reply that never comes.
        }
    });

    (addr.ip().to_string(), addr.port())
}

fn read_semicolon_line(reader: &mut BufReader<TcpStream>, buf: &mut Vec<u8>) -> Option<String> {
    loop {
        let mut byte = [0u8; 1];
        match std::io::Read::read(reader, &mut byte) {
            Ok(0) => return None,
            Ok(_) => {
                if byte[0] == b';' {
                    return Some(String::from_utf8_lossy(buf).to_string());
                }
                buf.push(byte[0]);
            }
            Err(_) => return None,
        }
    }
}

// Kept for symmetry with the read loop; silences an unused-import warning on
// platforms where BufRead's default methods aren't otherwise exercised.
#[allow(dead_code)]
fn _use_bufread(r: &mut BufReader<TcpStream>) -> std::io::Result<usize> {
    let mut s = String::new();
    r.read_line(&mut s)
}

#[test]
fn s1_handshake_succeeds_against_a_well_behaved_robot() -> Result<()> {
    init_tracing();
    let (host, port, _rx) = spawn_mock_robot(|_| "ok".to_string());
    let commander = Commander::connect(Some(&host), port, Duration::from_secs(2))?;
    assert_eq!(commander.host(), host);
    Ok(())
}

#[test]
fn s2_version_query_returns_the_raw_body() -> Result<()> {
    init_tracing();
    let (host, port, _rx) = spawn_mock_robot(|cmd| {
        if cmd == "version" {
            "version 00.00.00.60".to_string()
        } else {
            "ok".to_string()
        }
    });
    let commander = Commander::connect(Some(&host), port, Duration::from_secs(2))?;
    assert_eq!(commander.version()?, "version 00.00.00.60");
    Ok(())
}

#[test]
fn s3_invalid_arg_never_touches_the_wire() -> Result<()> {
    init_tracing();
    let (host, port, rx) = spawn_mock_robot(|_| "ok".to_string());
    let commander = Commander::connect(Some(&host), port, Duration::from_secs(2))?;

    // Drain the handshake line the mock already observed.
    let _ = rx.recv_timeout(Duration::from_millis(500));

    let result = commander.armor_sensitivity(11);
    assert!(matches!(result, Err(Error::InvalidArg { .. })));

    // No further traffic should have reached the mock: the validator rejected
    // the call before `do_cmd` ever composed a line.
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    Ok(())
}

#[test]
fn s3_remote_error_is_reported_as_remote() -> Result<()> {
    init_tracing();
    let (host, port, _rx) = spawn_mock_robot(|cmd| {
        if cmd.starts_with("chassis_speed") {
            "error out of range".to_string()
        } else {
            "ok".to_string()
        }
    });
    let commander = Commander::connect(Some(&host), port, Duration::from_secs(2))?;
    let result = commander.chassis_speed(1.0, 0.0, 0.0);
    assert!(matches!(result, Err(Error::Remote(_))));
    Ok(())
}

/// Feeds the literal concatenated datagram through the real `PushListener`
/// worker path (UDP send, `tick`, queue drain) rather than calling
/// `push::parse` on pre-split strings, so the listener's own framing is what's
/// actually under test.
#[tokio::test]
async fn s4_push_parsing_preserves_arrival_order() -> Result<()> {
    init_tracing();
    let mut queue = DropNewestQueue::new(8);
    let sender = queue.handle();
    let socket = UdpSocket::bind("127.0.0.1:0")?;
    let port = socket.local_addr()?.port();
    drop(socket); // free the port for the listener to bind

    let mut listener = PushListener::new(port, Duration::from_millis(50), sender);
    let ctx = Ctx::new("push".to_string(), CancelToken::new());
    listener.setup(&ctx).await?;

    let client = UdpSocket::bind("127.0.0.1:0")?;
    client.send_to(
        b"chassis position 1.0 0.0 0.0;chassis attitude 0.0 0.0 5.0;",
        ("127.0.0.1", port),
    )?;

    // One recv_from/tick call must yield both records from the one datagram.
    listener.tick(&ctx).await?;

    let first = queue.recv().await.unwrap();
    let second = queue.recv().await.unwrap();
    assert!(matches!(first, push::PushRecord::ChassisPosition { .. }));
    assert!(matches!(second, push::PushRecord::ChassisAttitude { .. }));
    Ok(())
}

/// Testable Property 9: a read timeout poisons the session; the *next* call,
/// not the one that timed out, is the one that reports `Error::Closed`.
#[test]
fn testable_property_9_timeout_poisons_the_session_for_subsequent_calls() -> Result<()> {
    init_tracing();
    let (host, port) = spawn_silent_after_handshake_robot();
    let commander = Commander::connect(Some(&host), port, Duration::from_millis(150))?;

    let first = commander.version();
    assert!(matches!(first, Err(Error::Timeout)), "expected a timeout, got {first:?}");

    let second = commander.version();
    assert!(matches!(second, Err(Error::Closed)), "expected Closed after poisoning, got {second:?}");
    Ok(())
}

/// S5: an enriched event's timestamp reflects when the datagram arrived, not
/// when the (synchronous, potentially slow) enrichment query finished.
#[tokio::test]
async fn s5_event_enrichment_timestamp_is_within_10ms_of_receipt() -> Result<()> {
    init_tracing();
    let mut queue = DropNewestQueue::new(8);
    let sender = queue.handle();
    let socket = UdpSocket::bind("127.0.0.1:0")?;
    let port = socket.local_addr()?.port();
    drop(socket);

    let mut listener = EventListener::new(port, Duration::from_millis(50), sender);
    let ctx = Ctx::new("event".to_string(), CancelToken::new());
    listener.setup(&ctx).await?;

    let client = UdpSocket::bind("127.0.0.1:0")?;
    client.send_to(b"armor hit 3 1;", ("127.0.0.1", port))?;

    listener.tick(&ctx).await?;
    let enriched = queue.recv().await.unwrap();

    let observed_now = now_ms();
    let skew = (observed_now - enriched.received_at_ms).abs();
    assert!(skew < 10.0, "timestamp drifted {skew}ms from receipt (no enrichment commander was attached)");
    Ok(())
}

/// S7: an `on` then `off` toggle leaves no subsystem still subscribed —
/// every stream named in the `on` line is named again in the `off` line.
#[test]
fn s7_chassis_push_on_then_off_leaves_no_active_subscriptions() -> Result<()> {
    init_tracing();
    let (host, port, rx) = spawn_mock_robot(|_| "ok".to_string());
    let commander = Commander::connect(Some(&host), port, Duration::from_secs(2))?;
    let _ = rx.recv_timeout(Duration::from_millis(500)); // handshake line

    commander.chassis_push_on(5, 5, 5)?;
    let on_line = rx.recv_timeout(Duration::from_millis(500))?;

    commander.chassis_push_off()?;
    let off_line = rx.recv_timeout(Duration::from_millis(500))?;

    let on_count = on_line.matches("on").count();
    let off_count = off_line.matches("off").count();
    assert_eq!(on_count, 3, "expected pos/attitude/status all toggled on: {on_line}");
    assert_eq!(off_count, 3, "expected pos/attitude/status all toggled off: {off_line}");
    Ok(())
}

struct ForeverWorker;

#[async_trait::async_trait]
impl Worker for ForeverWorker {
    async fn tick(&mut self, _ctx: &Ctx) -> robomaster_sdk::Result<ControlFlow> {
        Ok(ControlFlow::Continue)
    }
}

#[tokio::test]
async fn s6_hub_shuts_down_within_the_graceful_deadline() -> Result<()> {
    init_tracing();
    let deadline = Duration::from_millis(300);
    let mut hub = Hub::new(deadline);
    hub.worker(
        "forever",
        ForeverWorker,
        WorkerConfig { loop_forever: true, interval: Duration::from_millis(1) },
    )?;

    assert_eq!(hub.state(), HubState::Idle);
    let control = hub.handle();

    let run_handle = tokio::spawn(hub.run());
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(control.state(), HubState::Running);

    let started = std::time::Instant::now();
    control.close();
    run_handle.await.unwrap().unwrap();
    let elapsed = started.elapsed();

    assert_eq!(control.state(), HubState::Stopped);
    assert!(elapsed < deadline + Duration::from_millis(200));
    Ok(())
}
