//! HTTP front end driven through the router without a socket.

mod common;

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tower::ServiceExt;

use common::{MockUpstream, SDP, ok_with_sdp};
use gateway::server::{AppState, router};
use gateway::{ChannelDirectory, ChannelRecord, GatewayConfig, Mode, NetworkInterface};

fn describe_state(records: Vec<ChannelRecord>) -> AppState {
    let directory = ChannelDirectory::load(records, Mode::Describe).unwrap();
    AppState::new(directory, &GatewayConfig::default())
}

fn relay_state(records: Vec<ChannelRecord>, interface: NetworkInterface) -> AppState {
    let config = GatewayConfig {
        mode: Mode::Relay,
        interface,
        ..Default::default()
    };
    let directory = ChannelDirectory::load(records, Mode::Relay).unwrap();
    AppState::new(directory, &config)
}

async fn get(state: AppState, uri: &str) -> (StatusCode, Option<String>, String) {
    send(state, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn send(state: AppState, request: Request<Body>) -> (StatusCode, Option<String>, String) {
    let response = router(state).oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, content_type, String::from_utf8_lossy(&bytes).to_string())
}

#[tokio::test]
async fn describe_returns_sdp_for_known_channel() {
    let upstream = MockUpstream::fixed(&ok_with_sdp()).await;
    let state = describe_state(vec![ChannelRecord::new("CCTV 1", &upstream.url("/ch1"))]);

    let (status, content_type, body) = get(state, "/rtsp/CCTV%201").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/sdp"));
    assert_eq!(body, SDP);
}

#[tokio::test]
async fn describe_lookup_ignores_whitespace() {
    let upstream = MockUpstream::fixed(&ok_with_sdp()).await;
    let state = describe_state(vec![ChannelRecord::new("CCTV 1", &upstream.url("/ch1"))]);

    let (status, _, _) = get(state, "/rtsp/CCTV1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(upstream.connections(), 1);
}

#[tokio::test]
async fn unknown_channel_is_400_without_upstream_traffic() {
    let upstream = MockUpstream::fixed(&ok_with_sdp()).await;
    let state = describe_state(vec![ChannelRecord::new("CCTV 1", &upstream.url("/ch1"))]);

    let (status, _, body) = get(state, "/rtsp/CCTV2").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("unknown channel"), "body: {body}");
    assert_eq!(upstream.connections(), 0);
}

#[tokio::test]
async fn missing_channel_name_is_400() {
    let state = describe_state(vec![ChannelRecord::new("A", "rtsp://127.0.0.1:1/a")]);
    let (status, _, body) = get(state.clone(), "/rtsp/").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("missing channel"));

    let (status, _, _) = get(state, "/rtsp/%20").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn non_get_method_is_405() {
    let state = describe_state(vec![ChannelRecord::new("A", "rtsp://127.0.0.1:1/a")]);
    let request = Request::post("/rtsp/A").body(Body::empty()).unwrap();
    let (status, _, _) = send(state, request).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn forbidden_upstream_is_500() {
    let upstream = MockUpstream::fixed("RTSP/1.0 403 Forbidden\r\nCSeq: 1\r\n\r\n").await;
    let state = describe_state(vec![ChannelRecord::new("A", &upstream.url("/a"))]);

    let (status, _, body) = get(state, "/rtsp/A").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("403"));
}

#[tokio::test]
async fn relay_route_absent_in_describe_mode() {
    let state = describe_state(vec![ChannelRecord::new("A", "rtsp://127.0.0.1:1/a")]);
    let (status, _, _) = get(state, "/rtp?id=A").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn relay_without_id_is_400() {
    let state = relay_state(
        vec![ChannelRecord::new("CCTV 1", "239.1.1.1:5004|10.0.0.5:6004")],
        NetworkInterface::Any,
    );
    let (status, _, body) = get(state, "/rtp").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("missing channel"));
}

#[tokio::test]
async fn relay_unknown_channel_is_400() {
    let state = relay_state(
        vec![ChannelRecord::new("CCTV 1", "239.1.1.1:5004|10.0.0.5:6004")],
        NetworkInterface::Any,
    );
    let (status, _, _) = get(state, "/rtp?id=CCTV2").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn relay_malformed_group_is_400() {
    let state = relay_state(
        vec![ChannelRecord::new("Broken", "not-an-addr|10.0.0.5:6004")],
        NetworkInterface::Any,
    );
    let (status, _, body) = get(state, "/rtp?id=Broken").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("invalid address"));
}

#[tokio::test]
async fn relay_on_missing_interface_is_500() {
    let state = relay_state(
        vec![ChannelRecord::new("CCTV 1", "239.1.1.1:5004|10.0.0.5:6004")],
        NetworkInterface::Named("no-such-if0".into()),
    );
    let (status, _, body) = get(state, "/rtp?id=CCTV1").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("239.1.1.1:5004"));
}

#[tokio::test]
async fn relay_rejects_post() {
    let state = relay_state(
        vec![ChannelRecord::new("A", "239.1.1.1:5004|")],
        NetworkInterface::Any,
    );
    let request = Request::post("/rtp?id=A").body(Body::empty()).unwrap();
    let (status, _, _) = send(state, request).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

/// Sends to multicast groups over loopback and hears its own traffic.
fn loopback_multicast_sender() -> UdpSocket {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP)).unwrap();
    socket.set_multicast_loop_v4(true).unwrap();
    socket.set_multicast_if_v4(&Ipv4Addr::LOCALHOST).unwrap();
    socket
        .bind(&SocketAddr::from((Ipv4Addr::LOCALHOST, 0)).into())
        .unwrap();
    socket.set_nonblocking(true).unwrap();
    UdpSocket::from_std(socket.into()).unwrap()
}

#[tokio::test]
async fn relay_streams_group_to_client_and_unicast_repeat() {
    const WAIT: Duration = Duration::from_secs(5);
    let group: SocketAddr = "239.255.42.7:45004".parse().unwrap();
    let repeat = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let locator = format!("{}|{}", group, repeat.local_addr().unwrap());
    let state = relay_state(
        vec![ChannelRecord::new("CCTV 1", &locator)],
        NetworkInterface::Address(Ipv4Addr::LOCALHOST),
    );

    let request = Request::get("/rtp?id=CCTV1").body(Body::empty()).unwrap();
    let response = router(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/octet-stream"
    );

    let mut body = response.into_body();
    let sender = loopback_multicast_sender();
    let mut repeated = [0u8; 64];
    for payload in [&b"one"[..], &b"two"[..]] {
        sender.send_to(payload, group).await.unwrap();

        let frame = timeout(WAIT, body.frame())
            .await
            .unwrap()
            .unwrap()
            .unwrap()
            .into_data()
            .unwrap();
        assert_eq!(&frame[..], payload);

        let n = timeout(WAIT, repeat.recv(&mut repeated))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&repeated[..n], payload);
    }
}
