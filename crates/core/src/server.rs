//! HTTP front end.
//!
//! Maps a request to a channel key, looks it up in the
//! [`ChannelDirectory`], and hands it to the engine for the directory's
//! [`Mode`]:
//!
//! | Mode | Route | Success body |
//! |------|-------|--------------|
//! | `Describe` | `GET /rtsp/{channel}` | SDP, `application/sdp` |
//! | `Relay` | `GET /rtp?id={channel}` | live datagrams, `application/octet-stream` |
//!
//! Failures answer with the status from [`GatewayError::http_status`] and
//! the error text as body.

use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Deserialize;
use tokio::io::{AsyncRead, DuplexStream, ReadBuf};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_util::io::ReaderStream;
use tokio_util::sync::{CancellationToken, DropGuard};
use tower_http::trace::TraceLayer;

use crate::config::{GatewayConfig, Mode};
use crate::directory::{ChannelDirectory, SourceLocator, channel_key};
use crate::error::{GatewayError, Result};
use crate::relay::{RelayOptions, RelaySession};
use crate::resolver::Resolver;

/// Buffer between a relay session and the HTTP response body.
const CLIENT_PIPE_CAPACITY: usize = 256 * 1024;

/// How long open streams may keep running after shutdown is requested.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Shared state handed to every request handler.
///
/// The directory is immutable, so handlers read it concurrently without
/// locking.
#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<ChannelDirectory>,
    pub resolver: Arc<Resolver>,
    pub relay: Arc<RelayOptions>,
}

impl AppState {
    pub fn new(directory: ChannelDirectory, config: &GatewayConfig) -> Self {
        if directory.mode() != config.mode {
            tracing::warn!(
                directory = ?directory.mode(),
                configured = ?config.mode,
                "directory was loaded for a different mode; serving the directory's mode"
            );
        }
        Self {
            directory: Arc::new(directory),
            resolver: Arc::new(Resolver::new(config)),
            relay: Arc::new(RelayOptions::new(config)),
        }
    }

    fn locate(&self, channel: &str) -> Result<&SourceLocator> {
        if channel_key(channel).is_empty() {
            return Err(GatewayError::MissingChannel);
        }
        self.directory
            .lookup(channel)
            .ok_or_else(|| GatewayError::Lookup(channel_key(channel)))
    }
}

/// Build the router for the directory's mode.
pub fn router(state: AppState) -> Router {
    let routes = match state.directory.mode() {
        Mode::Describe => Router::new()
            .route("/rtsp", get(missing_channel))
            .route("/rtsp/", get(missing_channel))
            .route("/rtsp/{*channel}", get(describe_channel)),
        Mode::Relay => Router::new().route("/rtp", get(relay_channel)),
    };

    routes.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Serve `state` on `listener` until `shutdown` resolves.
///
/// After the signal, in-flight requests get [`SHUTDOWN_GRACE`] to finish;
/// relay streams still open after that are dropped with their sockets.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!(
        %addr,
        mode = ?state.directory.mode(),
        channels = state.directory.len(),
        "HTTP gateway listening"
    );

    let (fired_tx, mut fired_rx) = watch::channel(false);
    let signal = async move {
        shutdown.await;
        tracing::info!("shutdown requested, draining connections");
        let _ = fired_tx.send(true);
    };
    let grace = async move {
        if fired_rx.wait_for(|fired| *fired).await.is_err() {
            std::future::pending::<()>().await;
        }
        tokio::time::sleep(SHUTDOWN_GRACE).await;
    };

    let server = axum::serve(listener, router(state))
        .with_graceful_shutdown(signal)
        .into_future();

    tokio::select! {
        result = server => result?,
        () = grace => tracing::warn!("shutdown grace period elapsed, closing open streams"),
    }

    tracing::info!("HTTP gateway stopped");
    Ok(())
}

/// GET /rtsp/{channel}
async fn describe_channel(
    State(state): State<AppState>,
    Path(channel): Path<String>,
) -> std::result::Result<Response, ApiError> {
    let url = state
        .locate(&channel)?
        .as_rtsp()
        .ok_or_else(|| GatewayError::Lookup(channel_key(&channel)))?;

    tracing::debug!(channel = %channel, upstream = %url, "resolving session description");
    let description = state.resolver.describe(url).await?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/sdp")],
        description.sdp,
    )
        .into_response())
}

async fn missing_channel() -> ApiError {
    ApiError::from(GatewayError::MissingChannel)
}

#[derive(Debug, Deserialize)]
pub struct RelayQuery {
    pub id: Option<String>,
}

/// GET /rtp?id={channel}
///
/// The 200 status is only committed once the group is joined; errors
/// after that end the stream and are logged.
async fn relay_channel(
    State(state): State<AppState>,
    Query(query): Query<RelayQuery>,
) -> std::result::Result<Response, ApiError> {
    let channel = query.id.unwrap_or_default();
    let pair = state
        .locate(&channel)?
        .as_multicast()
        .ok_or_else(|| GatewayError::Lookup(channel_key(&channel)))?;

    let session = RelaySession::open(pair, &state.relay).await?;
    let (sink, body) = tokio::io::duplex(CLIENT_PIPE_CAPACITY);
    let closed = CancellationToken::new();
    let body = ClientPipe::new(body, &closed);

    let key = channel_key(&channel);
    tokio::spawn(async move {
        if let Err(e) = session.run(sink, closed).await {
            tracing::warn!(channel = %key, error = %e, "relay session aborted");
        }
    });

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/octet-stream")],
        Body::from_stream(ReaderStream::new(body)),
    )
        .into_response())
}

/// Read half of a relay pipe. Dropping it, which axum does when the client
/// disconnects, cancels the session's close token.
struct ClientPipe {
    inner: DuplexStream,
    _close: DropGuard,
}

impl ClientPipe {
    fn new(inner: DuplexStream, closed: &CancellationToken) -> Self {
        Self {
            inner,
            _close: closed.clone().drop_guard(),
        }
    }
}

impl AsyncRead for ClientPipe {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

/// Wrapper so gateway errors can be returned straight from handlers.
pub struct ApiError(GatewayError);

impl From<GatewayError> for ApiError {
    fn from(e: GatewayError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self.0, "request failed");
        } else {
            tracing::debug!(status = %status, error = %self.0, "request rejected");
        }

        (status, self.0.to_string()).into_response()
    }
}
