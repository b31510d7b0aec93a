//! End-to-end tests for the full vshomed stack.
//!
//! Each test builds the complete application from the bundled catalog (real
//! hub, real registry, real axum router). HTTP tests go through
//! `tower::ServiceExt::oneshot` without binding a port; viewer tests bind a
//! loopback listener and talk WebSocket with `tokio-tungstenite`.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use futures::{SinkExt, StreamExt};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tower::ServiceExt;
use vshome_adapter_http_axum::router;
use vshome_adapter_http_axum::state::{AppState, ViewerLimits};
use vshome_app::hub::Hub;
use vshome_domain::catalog::Catalog;
use vshome_domain::device::StateValue;
use vshome_domain::id::DeviceId;

type Viewer = WebSocketStream<MaybeTlsStream<TcpStream>>;

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../..")
}

fn hub() -> Arc<Hub> {
    hub_with_capacity(64)
}

fn hub_with_capacity(queue_capacity: usize) -> Arc<Hub> {
    let source = std::fs::read_to_string(workspace_root().join("devices.toml"))
        .expect("bundled catalog should be readable");
    let catalog: Catalog = toml::from_str(&source).expect("bundled catalog should parse");
    let devices = catalog.into_devices().expect("bundled catalog should be valid");
    Arc::new(Hub::new(devices, queue_capacity).expect("hub should build"))
}

fn app_with(state: AppState) -> axum::Router {
    let web = workspace_root().join("web");
    router::build(state, Some(web.as_path()))
}

fn app() -> axum::Router {
    app_with(AppState::from_arc(hub()))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn put_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn serve(state: AppState) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = app_with(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

async fn connect(addr: SocketAddr) -> Viewer {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("ws connect");
    ws
}

async fn recv(ws: &mut Viewer) -> Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for a message")
            .expect("connection ended")
            .expect("websocket error");
        match frame {
            Message::Text(text) => return serde_json::from_str(text.as_str()).unwrap(),
            Message::Ping(_) | Message::Pong(_) => {}
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

async fn send(ws: &mut Viewer, value: &Value) {
    ws.send(Message::Text(value.to_string().into())).await.unwrap();
}

async fn assert_quiet(ws: &mut Viewer) {
    let result = tokio::time::timeout(Duration::from_millis(150), ws.next()).await;
    assert!(result.is_err(), "unexpected frame: {result:?}");
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_return_ok_when_health_check_called() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn should_list_every_catalog_device() {
    let resp = app()
        .oneshot(Request::get("/api/devices").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    let devices = json.as_array().unwrap();
    assert_eq!(devices.len(), 9);
    assert_eq!(devices[0]["id"], "living-room-light");
}

#[tokio::test]
async fn should_return_normalized_merge_after_put() {
    let app = app();

    let resp = app
        .clone()
        .oneshot(put_json(
            "/api/devices/bedroom-blind",
            r#"{"state":{"position":42.6,"tilt":"half"}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .oneshot(
            Request::get("/api/devices/bedroom-blind")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(resp).await;
    assert_eq!(json["state"], json!({"position": 43, "tilt": "half"}));
}

#[tokio::test]
async fn should_reject_put_errors_with_json_bodies() {
    let app = app();

    let resp = app
        .clone()
        .oneshot(put_json("/api/devices/kitchen-toaster", "nope"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await, json!({"error": "invalid json"}));

    let resp = app
        .clone()
        .oneshot(put_json("/api/devices/kitchen-toaster", r#"{"state":{}}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await, json!({"error": "missing state"}));

    let resp = app
        .oneshot(put_json("/api/devices/fridge", r#"{"state":{"on":true}}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(resp).await,
        json!({"error": "device not found: fridge"})
    );
}

#[tokio::test]
async fn should_serve_front_end_from_static_dir() {
    let resp = app()
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    assert!(String::from_utf8_lossy(&bytes).contains("<title>vshome</title>"));
}

// ---------------------------------------------------------------------------
// Viewers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_open_viewer_with_state_snapshot() {
    let addr = serve(AppState::from_arc(hub())).await;
    let mut viewer = connect(addr).await;

    let state = recv(&mut viewer).await;
    assert_eq!(state["type"], "state");
    assert_eq!(state["devices"].as_array().unwrap().len(), 9);
    assert_eq!(state["devices"][5]["state"]["temperature"], 21.5);
}

#[tokio::test]
async fn should_sync_viewers_without_duplicates() {
    let addr = serve(AppState::from_arc(hub())).await;
    let mut first = connect(addr).await;
    let mut second = connect(addr).await;
    recv(&mut first).await;
    recv(&mut second).await;

    send(
        &mut first,
        &json!({"type": "set", "id": "living-room-light", "state": {"on": "On"}}),
    )
    .await;

    let a = recv(&mut first).await;
    let b = recv(&mut second).await;
    assert_eq!(a, b);
    assert_eq!(a["type"], "update");
    assert_eq!(a["device"]["state"]["on"], true);

    let mut late = connect(addr).await;
    let state = recv(&mut late).await;
    assert_eq!(state["devices"][0]["state"]["on"], true);
    assert_quiet(&mut late).await;

    send(
        &mut second,
        &json!({"type": "set", "id": "garage-doors", "state": {"open": 1}}),
    )
    .await;
    let update = recv(&mut late).await;
    assert_eq!(update["device"]["id"], "garage-doors");
    assert_eq!(update["device"]["state"]["open"], true);
}

#[tokio::test]
async fn should_reply_errors_only_to_sender() {
    let addr = serve(AppState::from_arc(hub())).await;
    let mut sender = connect(addr).await;
    let mut bystander = connect(addr).await;
    recv(&mut sender).await;
    recv(&mut bystander).await;

    send(
        &mut sender,
        &json!({"type": "set", "id": "fridge", "state": {"on": true}}),
    )
    .await;
    assert_eq!(
        recv(&mut sender).await,
        json!({"type": "error", "error": "device not found: fridge"})
    );

    send(&mut sender, &json!({"type": "get", "id": "fridge"})).await;
    assert_eq!(recv(&mut sender).await["error"], "unsupported message type");

    sender.send(Message::Text("{oops".into())).await.unwrap();
    assert_eq!(recv(&mut sender).await["error"], "invalid message");

    sender
        .send(Message::Binary(vec![1, 2, 3].into()))
        .await
        .unwrap();
    assert_eq!(recv(&mut sender).await["error"], "unsupported message type");

    send(
        &mut sender,
        &json!({"type": "set", "id": "kitchen-toaster", "state": {}}),
    )
    .await;
    assert_eq!(recv(&mut sender).await["error"], "missing state");

    assert_quiet(&mut bystander).await;
}

#[tokio::test]
async fn should_push_rest_writes_to_viewers() {
    let hub = hub();
    let addr = serve(AppState::from_arc(Arc::clone(&hub))).await;
    let mut viewer = connect(addr).await;
    recv(&mut viewer).await;

    let resp = app_with(AppState::from_arc(hub))
        .oneshot(put_json(
            "/api/devices/hall-thermostat",
            r#"{"state":{"temperature":35}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let update = recv(&mut viewer).await;
    assert_eq!(update["device"]["id"], "hall-thermostat");
    assert_eq!(update["device"]["state"]["temperature"], 30.0);
}

#[tokio::test]
async fn should_keep_serving_others_after_a_viewer_leaves() {
    let hub = hub();
    let addr = serve(AppState::from_arc(Arc::clone(&hub))).await;
    let mut leaving = connect(addr).await;
    let mut staying = connect(addr).await;
    recv(&mut leaving).await;
    recv(&mut staying).await;

    leaving.close(None).await.unwrap();
    drop(leaving);

    send(
        &mut staying,
        &json!({"type": "set", "id": "front-door-lock", "state": {"locked": "off"}}),
    )
    .await;
    let update = recv(&mut staying).await;
    assert_eq!(update["device"]["state"]["locked"], false);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(hub.viewer_count().await, 1);
}

#[tokio::test]
async fn should_disconnect_idle_viewer() {
    let limits = ViewerLimits {
        idle_timeout: Duration::from_millis(200),
        ping_interval: Duration::from_secs(60),
        ..ViewerLimits::default()
    };
    let hub = hub();
    let addr = serve(AppState::from_arc(Arc::clone(&hub)).with_limits(limits)).await;
    let mut viewer = connect(addr).await;
    recv(&mut viewer).await;

    let ended = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match viewer.next().await {
                Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                Some(Ok(_)) => {}
            }
        }
    })
    .await;

    assert!(ended.is_ok(), "idle viewer was not disconnected");
    assert_eq!(hub.viewer_count().await, 0);
}

#[tokio::test]
async fn should_close_viewers_when_hub_shuts_down() {
    let hub = hub();
    let addr = serve(AppState::from_arc(Arc::clone(&hub))).await;
    let mut viewer = connect(addr).await;
    recv(&mut viewer).await;

    assert_eq!(hub.disconnect_all().await, 1);

    let frame = tokio::time::timeout(Duration::from_secs(2), viewer.next())
        .await
        .expect("viewer should be closed");
    assert!(matches!(frame, Some(Ok(Message::Close(_)) | Err(_)) | None));
}

async fn wait_until_closed(ws: &mut Viewer) -> bool {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                Some(Ok(_)) => {}
            }
        }
    })
    .await
    .is_ok()
}

async fn wait_for_viewer_count(hub: &Hub, expected: usize) {
    for _ in 0..50 {
        if hub.viewer_count().await == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(hub.viewer_count().await, expected);
}

#[tokio::test]
async fn should_drop_viewer_sending_oversized_frame() {
    let limits = ViewerLimits {
        max_message_bytes: 128,
        ..ViewerLimits::default()
    };
    let hub = hub();
    let addr = serve(AppState::from_arc(Arc::clone(&hub)).with_limits(limits)).await;
    let mut oversized = connect(addr).await;
    let mut bystander = connect(addr).await;
    recv(&mut oversized).await;
    recv(&mut bystander).await;

    let frame = json!({
        "type": "set",
        "id": "living-room-light",
        "state": {"mode": "x".repeat(512)},
    });
    // The server may reset the connection before this write completes.
    let _ = oversized.send(Message::Text(frame.to_string().into())).await;

    assert!(wait_until_closed(&mut oversized).await, "oversized sender was not dropped");
    wait_for_viewer_count(&hub, 1).await;
    assert_eq!(
        hub.registry()
            .get(&DeviceId::from("living-room-light"))
            .await
            .unwrap()
            .state
            .get("mode"),
        None
    );

    send(
        &mut bystander,
        &json!({"type": "set", "id": "living-room-light", "state": {"on": true}}),
    )
    .await;
    assert_eq!(recv(&mut bystander).await["device"]["state"]["on"], true);
}

#[tokio::test]
async fn should_drop_viewer_that_lags_behind_the_feed() {
    let hub = hub_with_capacity(2);
    let addr = serve(AppState::from_arc(Arc::clone(&hub))).await;
    let mut lagging = connect(addr).await;
    recv(&mut lagging).await;
    wait_for_viewer_count(&hub, 1).await;

    // No await point yields to the connection task, so the burst overruns
    // the feed before it drains anything.
    let blind = DeviceId::from("bedroom-blind");
    for position in 0..10_i64 {
        hub.submit(
            &blind,
            [("position".to_string(), StateValue::Int(position))].into(),
        )
        .await
        .unwrap();
    }

    assert!(wait_until_closed(&mut lagging).await, "lagging viewer was not dropped");
    wait_for_viewer_count(&hub, 0).await;

    let mut fresh = connect(addr).await;
    let state = recv(&mut fresh).await;
    assert_eq!(state["devices"][3]["state"]["position"], 9);
    send(
        &mut fresh,
        &json!({"type": "set", "id": "bedroom-blind", "state": {"position": 55}}),
    )
    .await;
    assert_eq!(recv(&mut fresh).await["device"]["state"]["position"], 55);
}
