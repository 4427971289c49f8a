//! HTTP routes and handlers

use axum::{
    body::Body,
    extract::State,
    http::{
        header::{HeaderName, HeaderValue},
        HeaderMap,
    },
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use streamgate_core::{
    delta_chunk, estimate_tokens, response_id, stop_chunk, usage_chunk, Usage,
};
use streamgate_delivery::{ChannelSink, EventSink, StreamChannel, EVENT_STREAM_HEADERS};

use crate::config::GatewayConfig;
use crate::realtime::realtime_handler;
use crate::source::ScriptedSource;

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<GatewayConfig>,

    /// Prometheus metrics handle for rendering
    pub metrics_handle: PrometheusHandle,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/v1/chat/completions", post(chat_completions))
        .route("/v1/realtime", get(realtime_handler))
        .fallback(fallback)
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn metrics(State(state): State<AppState>) -> String {
    state.metrics_handle.render()
}

async fn fallback() -> &'static str {
    "Not found"
}

/// OpenAI-compatible chat completions request
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    #[serde(default)]
    model: String,
    #[serde(default)]
    messages: Vec<Message>,
    #[serde(default)]
    stream: bool,
    #[serde(flatten)]
    other: serde_json::Value,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
struct Message {
    role: String,
    content: String,
}

/// OpenAI-compatible chat completions response (non-streaming)
#[derive(Debug, Serialize, Deserialize)]
struct ChatCompletionResponse {
    id: String,
    object: String,
    created: i64,
    model: String,
    choices: Vec<Choice>,
    usage: Usage,
}

#[derive(Debug, Serialize, Deserialize)]
struct Choice {
    index: u32,
    message: Message,
    finish_reason: String,
}

/// Main chat completions handler
async fn chat_completions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ChatCompletionRequest>,
) -> Response {
    metrics::counter!("streamgate_requests_total").increment(1);

    let trace_id = request_trace_id(&headers);
    let model = if req.model.is_empty() {
        state.config.model.clone()
    } else {
        req.model.clone()
    };
    info!(trace_id = %trace_id, model = %model, stream = req.stream, "chat completion request");

    let prompt: String = req.messages.iter().map(|m| m.content.as_str()).collect();
    let prompt_tokens = estimate_tokens(&prompt) as u32;

    if req.stream {
        stream_completion(state, model, trace_id, prompt_tokens)
    } else {
        complete(state, model, trace_id, prompt_tokens).into_response()
    }
}

/// Serve the whole completion as a single JSON body
fn complete(
    state: AppState,
    model: String,
    trace_id: String,
    prompt_tokens: u32,
) -> Json<ChatCompletionResponse> {
    let content = state.config.reply.clone();
    let completion_tokens = estimate_tokens(&content) as u32;

    Json(ChatCompletionResponse {
        id: response_id(&trace_id),
        object: "chat.completion".to_string(),
        created: unix_now(),
        model,
        choices: vec![Choice {
            index: 0,
            message: Message {
                role: "assistant".to_string(),
                content,
            },
            finish_reason: "stop".to_string(),
        }],
        usage: Usage::new(prompt_tokens, completion_tokens),
    })
}

/// Stream the completion over SSE through a delivery channel
fn stream_completion(
    state: AppState,
    model: String,
    trace_id: String,
    prompt_tokens: u32,
) -> Response {
    let (sink, rx) = ChannelSink::new();
    let source = ScriptedSource::from_reply(&state.config.reply);
    let id = response_id(&trace_id);
    let created = unix_now();
    let delta_interval = Duration::from_millis(state.config.delta_interval_ms);

    tokio::spawn(async move {
        let start = std::time::Instant::now();
        let mut channel = StreamChannel::new(sink);
        if let Err(e) = drive_stream(
            &mut channel,
            &source,
            &id,
            created,
            &model,
            prompt_tokens,
            delta_interval,
        )
        .await
        {
            error!(trace_id = %trace_id, "stream delivery failed: {e}");
        }
        metrics::histogram!("streamgate_stream_duration_ms")
            .record(start.elapsed().as_millis() as f64);
    });

    let body = Body::from_stream(futures_util::stream::unfold(rx, |mut rx| async move {
        rx.recv()
            .await
            .map(|bytes| (Ok::<_, std::convert::Infallible>(bytes), rx))
    }));

    // The body channel has no header surface; the same metadata the channel
    // initializes goes onto the HTTP response here.
    let mut response = Response::new(body);
    for (name, value) in EVENT_STREAM_HEADERS {
        response
            .headers_mut()
            .insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
    response
}

/// Deliver one scripted completion through the channel
///
/// Emits each delta as a data frame, then the stop chunk, then the usage
/// chunk with estimator-backed completion totals, then the sentinel.
pub(crate) async fn drive_stream<S: EventSink>(
    channel: &mut StreamChannel<S>,
    source: &ScriptedSource,
    id: &str,
    created: i64,
    model: &str,
    prompt_tokens: u32,
    delta_interval: Duration,
) -> streamgate_core::Result<()> {
    channel.ensure_headers()?;

    let mut completion = String::new();
    for delta in source.deltas() {
        completion.push_str(delta);
        channel.send_object(Some(&delta_chunk(id, created, model, delta)))?;
        metrics::counter!("streamgate_events_sent_total").increment(1);
        if !delta_interval.is_zero() {
            tokio::time::sleep(delta_interval).await;
        }
    }

    channel.send_object(Some(&stop_chunk(id, created, model, source.finish_reason())))?;

    let usage = Usage::new(prompt_tokens, estimate_tokens(&completion) as u32);
    channel.send_object(Some(&usage_chunk(id, created, model, usage)))?;

    channel.terminate()
}

/// Trace id from the ambient request context: `X-Request-Id` when the
/// caller supplies one, a fresh uuid otherwise
pub(crate) fn request_trace_id(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string())
}

fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use streamgate_delivery::BufferSink;

    #[tokio::test]
    async fn test_drive_stream_frame_sequence() {
        let mut channel = StreamChannel::new(BufferSink::new());
        let source = ScriptedSource::from_reply("a b c");

        drive_stream(
            &mut channel,
            &source,
            "chatcmpl-t1",
            1234567890,
            "test-model",
            7,
            Duration::ZERO,
        )
        .await
        .unwrap();

        let captured = channel_bytes(&channel);
        let frames: Vec<&str> = captured
            .split("\n\n")
            .filter(|f| !f.is_empty())
            .collect();

        // Three deltas, stop chunk, usage chunk, sentinel
        assert_eq!(frames.len(), 6);
        assert!(frames.iter().all(|f| f.starts_with("data: ")));
        assert!(frames[0].contains(r#""content":"a ""#));
        assert!(frames[2].contains(r#""content":"c""#));
        assert!(frames[3].contains(r#""finish_reason":"stop""#));
        assert!(frames[4].contains(r#""prompt_tokens":7"#));
        assert_eq!(frames[5], "data: [DONE]");
        assert!(channel.is_terminated());
    }

    #[tokio::test]
    async fn test_drive_stream_flushes_each_frame() {
        let mut channel = StreamChannel::new(BufferSink::new());
        let source = ScriptedSource::from_reply("only");

        drive_stream(
            &mut channel,
            &source,
            "chatcmpl-t2",
            1234567890,
            "test-model",
            0,
            Duration::ZERO,
        )
        .await
        .unwrap();

        // delta + stop + usage + [DONE]
        assert_eq!(flush_count(&channel), 4);
    }

    #[test]
    fn test_request_trace_id_prefers_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", "trace-77".parse().unwrap());
        assert_eq!(request_trace_id(&headers), "trace-77");

        let generated = request_trace_id(&HeaderMap::new());
        assert!(!generated.is_empty());
    }

    fn channel_bytes(channel: &StreamChannel<BufferSink>) -> String {
        channel.sink_ref().as_str().to_string()
    }

    fn flush_count(channel: &StreamChannel<BufferSink>) -> usize {
        channel.sink_ref().flush_count()
    }
}
