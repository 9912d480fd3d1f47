//! The `stream()` entry point.

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::fetch::{open_fetch, run_fetch_loop};
use super::handle::{handle_pair, ConnectionHandle, TransportKind};
use super::lifecycle::{Lifecycle, OnClose, OnError};
use super::native::{open_native, run_native_loop};
use crate::adapters::{EsEventSource, FileCredentialsProvider, ReqwestHttpClient, StaticCredentials};
use crate::auth::TokenBroker;
use crate::config::StreamClientConfig;
use crate::error::{StreamError, StreamResult};
use crate::traits::{ByteStream, CredentialsProvider, EventSourceConnector, HttpClient, NativeEventStream};

/// Per-call options for [`StreamClient::stream`].
#[derive(Default)]
pub struct StreamOptions {
    on_error: Option<OnError>,
    on_close: Option<OnClose>,
    skip_auth: bool,
}

impl StreamOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called for malformed frames and mid-stream transport failures.
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: FnMut(StreamError) + Send + 'static,
    {
        self.on_error = Some(Box::new(f));
        self
    }

    /// Called exactly once when the stream closes.
    pub fn on_close<F>(mut self, f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_close = Some(Box::new(f));
        self
    }

    /// Send no credential at all: no token exchange and no auth header.
    pub fn skip_auth(mut self, skip: bool) -> Self {
        self.skip_auth = skip;
        self
    }
}

impl std::fmt::Debug for StreamOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamOptions")
            .field("on_error", &self.on_error.is_some())
            .field("on_close", &self.on_close.is_some())
            .field("skip_auth", &self.skip_auth)
            .finish()
    }
}

/// An established transport, before its read loop starts.
enum Transport {
    Fetch(ByteStream),
    EventSource(NativeEventStream),
}

impl Transport {
    fn kind(&self) -> TransportKind {
        match self {
            Transport::Fetch(_) => TransportKind::Fetch,
            Transport::EventSource(_) => TransportKind::EventSource,
        }
    }
}

/// Streaming client.
///
/// Construct once and pass it to whatever needs to stream. Each
/// [`stream`](Self::stream) call is independent: it gets its own token,
/// decoder and task.
pub struct StreamClient<H = ReqwestHttpClient, E = EsEventSource>
where
    H: HttpClient,
    E: EventSourceConnector,
{
    config: StreamClientConfig,
    http: Arc<H>,
    event_source: Arc<E>,
    credentials: Arc<dyn CredentialsProvider>,
    broker: TokenBroker<H>,
}

impl StreamClient {
    /// Client wired to the production adapters.
    ///
    /// The credential comes from `CHATSTREAM_ACCESS_TOKEN` when set, else
    /// from the credentials file.
    pub fn from_config(config: StreamClientConfig) -> StreamResult<Self> {
        let env = StaticCredentials::from_env();
        let credentials: Arc<dyn CredentialsProvider> = if env.has_token() {
            Arc::new(env)
        } else {
            match FileCredentialsProvider::new() {
                Ok(provider) => Arc::new(provider),
                Err(e) => {
                    warn!(error = %e, "No credentials file location, streaming anonymously");
                    Arc::new(StaticCredentials::anonymous())
                }
            }
        };

        Self::new(
            config,
            Arc::new(ReqwestHttpClient::new()),
            Arc::new(EsEventSource::new()),
            credentials,
        )
    }
}

impl<H, E> StreamClient<H, E>
where
    H: HttpClient + 'static,
    E: EventSourceConnector + 'static,
{
    pub fn new(
        config: StreamClientConfig,
        http: Arc<H>,
        event_source: Arc<E>,
        credentials: Arc<dyn CredentialsProvider>,
    ) -> StreamResult<Self> {
        config.validate()?;
        let broker = TokenBroker::new(http.clone(), config.token_url());
        Ok(Self {
            config,
            http,
            event_source,
            credentials,
            broker,
        })
    }

    /// Start streaming from `endpoint`.
    ///
    /// With a payload the call is a POST whose body carries the payload;
    /// without one it is a native GET subscription. Returns once the
    /// transport is established; messages then arrive on `on_message` from
    /// a background task.
    ///
    /// # Errors
    ///
    /// Failures before the stream starts (credentials, connection, non-2xx
    /// status) are returned here and no callback fires.
    pub async fn stream<F>(
        &self,
        endpoint: &str,
        payload: Option<Value>,
        on_message: F,
        options: StreamOptions,
    ) -> StreamResult<ConnectionHandle>
    where
        F: FnMut(Value) + Send + 'static,
    {
        let url = self.config.resolve(endpoint);

        let (durable, token) = if options.skip_auth {
            debug!("Auth skipped for this stream");
            (None, None)
        } else {
            let durable = self
                .credentials
                .access_token()
                .await
                .map_err(|e| StreamError::Credentials {
                    message: e.to_string(),
                })?;
            let token = self.broker.exchange_token(durable.as_deref()).await;
            (durable, token)
        };

        let transport = match payload {
            Some(payload) => Transport::Fetch(
                open_fetch(
                    self.http.as_ref(),
                    &url,
                    payload,
                    durable.as_deref(),
                    token,
                    &self.config.token_field,
                )
                .await?,
            ),
            None => Transport::EventSource(open_native(
                self.event_source.as_ref(),
                &url,
                durable.as_deref(),
                token,
                &self.config.token_query_param,
            )?),
        };

        let id = Uuid::new_v4();
        let kind = transport.kind();
        let (handle, state, cancel) = handle_pair(id, kind);
        let StreamOptions {
            on_error, on_close, ..
        } = options;
        let mut lifecycle = Lifecycle::new(id, state, Box::new(on_message), on_error, on_close);

        info!(stream_id = %id, transport = kind.as_str(), endpoint = %endpoint, "Stream started");

        match transport {
            Transport::Fetch(body) => {
                lifecycle.open();
                tokio::spawn(run_fetch_loop(body, lifecycle, cancel));
            }
            Transport::EventSource(events) => {
                tokio::spawn(run_native_loop(events, lifecycle, cancel));
            }
        }

        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockEventSource, MockHttpClient, MockResponse};
    use crate::stream::ReadyState;
    use crate::traits::{HttpError, NativeEvent, NativeMessage};
    use bytes::Bytes;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    const BASE: &str = "http://test";
    const TOKEN_URL: &str = "http://test/auth/stream-token";
    const CHAT_URL: &str = "http://test/chat/stream";
    const EVENTS_URL: &str = "http://test/events";

    #[derive(Clone, Default)]
    struct Recorder {
        messages: Arc<Mutex<Vec<Value>>>,
        errors: Arc<Mutex<Vec<StreamError>>>,
        closes: Arc<AtomicUsize>,
    }

    impl Recorder {
        fn on_message(&self) -> impl FnMut(Value) + Send + 'static {
            let messages = self.messages.clone();
            move |v| messages.lock().unwrap().push(v)
        }

        fn options(&self) -> StreamOptions {
            let errors = self.errors.clone();
            let closes = self.closes.clone();
            StreamOptions::new()
                .on_error(move |e| errors.lock().unwrap().push(e))
                .on_close(move || {
                    closes.fetch_add(1, Ordering::SeqCst);
                })
        }

        fn messages(&self) -> Vec<Value> {
            self.messages.lock().unwrap().clone()
        }

        fn error_count(&self) -> usize {
            self.errors.lock().unwrap().len()
        }

        fn close_count(&self) -> usize {
            self.closes.load(Ordering::SeqCst)
        }
    }

    fn client(
        http: &MockHttpClient,
        es: &MockEventSource,
        token: Option<&str>,
    ) -> StreamClient<MockHttpClient, MockEventSource> {
        let credentials: Arc<dyn CredentialsProvider> = match token {
            Some(t) => Arc::new(StaticCredentials::new(t)),
            None => Arc::new(StaticCredentials::anonymous()),
        };
        StreamClient::new(
            StreamClientConfig::new().with_base_url(BASE),
            Arc::new(http.clone()),
            Arc::new(es.clone()),
            credentials,
        )
        .unwrap()
    }

    async fn wait_closed(handle: &ConnectionHandle) {
        tokio::time::timeout(Duration::from_secs(2), handle.closed())
            .await
            .expect("stream should close");
    }

    #[tokio::test]
    async fn test_end_to_end_example() {
        let http = MockHttpClient::new();
        let es = MockEventSource::new();
        http.set_response(TOKEN_URL, MockResponse::json(200, json!({"stream_token": "st-1"})));
        http.set_response(
            CHAT_URL,
            MockResponse::chunks([
                "data: {\"token\":\"H\"}\n\n",
                "data: {\"token\":\"i\"}\n\n",
                "data: [DONE]\n\n",
            ]),
        );
        let rec = Recorder::default();

        let handle = client(&http, &es, Some("durable"))
            .stream("/chat/stream", Some(json!({"message": "hi"})), rec.on_message(), rec.options())
            .await
            .unwrap();
        assert_eq!(handle.transport(), TransportKind::Fetch);
        wait_closed(&handle).await;

        assert_eq!(rec.messages(), vec![json!({"token": "H"}), json!({"token": "i"})]);
        assert_eq!(rec.close_count(), 1);
        assert_eq!(rec.error_count(), 0);

        let stream_request = &http.requests_to(CHAT_URL)[0];
        assert_eq!(
            stream_request.json_body().unwrap(),
            json!({"message": "hi", "stream_token": "st-1"})
        );
        assert_eq!(
            stream_request.headers.get("Authorization"),
            Some(&"Bearer durable".to_string())
        );
        assert!(!stream_request.url.contains("st-1"));
    }

    #[tokio::test]
    async fn test_chunk_split_mid_line() {
        let http = MockHttpClient::new();
        let es = MockEventSource::new();
        http.set_response(
            CHAT_URL,
            MockResponse::chunks(["data: {\"tok", "en\":\"H\"}\nda", "ta: {\"token\":\"i\"}\n"]),
        );
        let rec = Recorder::default();

        let handle = client(&http, &es, None)
            .stream(CHAT_URL, Some(json!({})), rec.on_message(), rec.options())
            .await
            .unwrap();
        wait_closed(&handle).await;

        assert_eq!(rec.messages(), vec![json!({"token": "H"}), json!({"token": "i"})]);
        assert_eq!(rec.close_count(), 1);
    }

    #[tokio::test]
    async fn test_malformed_frame_then_valid() {
        let http = MockHttpClient::new();
        let es = MockEventSource::new();
        http.set_response(
            CHAT_URL,
            MockResponse::chunks(["data: {not json\n", "data: {\"token\":\"ok\"}\n"]),
        );
        let order = Arc::new(Mutex::new(Vec::new()));
        let (o1, o2) = (order.clone(), order.clone());

        let handle = client(&http, &es, None)
            .stream(
                "/chat/stream",
                Some(json!({})),
                move |_| o1.lock().unwrap().push("message"),
                StreamOptions::new().on_error(move |e| {
                    assert!(matches!(e, StreamError::InvalidJson { .. }));
                    o2.lock().unwrap().push("error");
                }),
            )
            .await
            .unwrap();
        wait_closed(&handle).await;

        assert_eq!(*order.lock().unwrap(), vec!["error", "message"]);
    }

    #[tokio::test]
    async fn test_close_twice_fires_on_close_once() {
        let http = MockHttpClient::new();
        let es = MockEventSource::new();
        let tx = http.stream_channel(CHAT_URL);
        let rec = Recorder::default();

        let handle = client(&http, &es, None)
            .stream("/chat/stream", Some(json!({})), rec.on_message(), rec.options())
            .await
            .unwrap();
        assert_eq!(handle.ready_state(), ReadyState::Open);

        handle.close();
        handle.close();
        wait_closed(&handle).await;
        handle.close();

        assert_eq!(rec.close_count(), 1);
        assert_eq!(rec.error_count(), 0);
        assert!(tx.is_closed());
    }

    #[tokio::test]
    async fn test_no_delivery_after_close() {
        let http = MockHttpClient::new();
        let es = MockEventSource::new();
        let tx = http.stream_channel(CHAT_URL);
        let rec = Recorder::default();

        let handle = client(&http, &es, None)
            .stream("/chat/stream", Some(json!({})), rec.on_message(), rec.options())
            .await
            .unwrap();

        tx.unbounded_send(Ok(Bytes::from("data: {\"n\":1}\n"))).unwrap();
        tokio::time::timeout(Duration::from_secs(2), async {
            while rec.messages().is_empty() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("first message should arrive");

        handle.close();
        wait_closed(&handle).await;

        // The receiver is gone, so late chunks cannot reach the decoder.
        let _ = tx.unbounded_send(Ok(Bytes::from("data: {\"n\":2}\n")));
        let _ = tx.unbounded_send(Ok(Bytes::from("data: {broken\n")));
        tokio::task::yield_now().await;

        assert_eq!(rec.messages(), vec![json!({"n": 1})]);
        assert_eq!(rec.error_count(), 0);
        assert_eq!(rec.close_count(), 1);
    }

    #[tokio::test]
    async fn test_token_exchange_failure_falls_back_to_header() {
        let http = MockHttpClient::new();
        let es = MockEventSource::new();
        http.set_response(
            TOKEN_URL,
            MockResponse::Error(HttpError::ConnectionFailed("refused".to_string())),
        );
        http.set_response(CHAT_URL, MockResponse::chunks(["data: {\"token\":\"x\"}\n"]));
        let rec = Recorder::default();

        let handle = client(&http, &es, Some("durable"))
            .stream("/chat/stream", Some(json!({"message": "hi"})), rec.on_message(), rec.options())
            .await
            .unwrap();
        wait_closed(&handle).await;

        assert_eq!(rec.messages().len(), 1);
        let request = &http.requests_to(CHAT_URL)[0];
        assert_eq!(request.json_body().unwrap(), json!({"message": "hi"}));
        assert_eq!(
            request.headers.get("Authorization"),
            Some(&"Bearer durable".to_string())
        );
    }

    #[tokio::test]
    async fn test_error_status_is_initialization_error() {
        let http = MockHttpClient::new();
        let es = MockEventSource::new();
        http.set_response(CHAT_URL, MockResponse::json(401, json!({"detail": "expired"})));
        let rec = Recorder::default();

        let result = client(&http, &es, None)
            .stream("/chat/stream", Some(json!({})), rec.on_message(), rec.options())
            .await;

        match result {
            Err(StreamError::Initialization { status, message }) => {
                assert_eq!(status, 401);
                assert!(message.contains("expired"));
            }
            other => panic!("expected initialization error, got {:?}", other.map(|h| h.id())),
        }
        tokio::task::yield_now().await;
        assert_eq!(rec.close_count(), 0);
        assert_eq!(rec.error_count(), 0);
    }

    #[tokio::test]
    async fn test_skip_auth_sends_no_credential() {
        let http = MockHttpClient::new();
        let es = MockEventSource::new();
        http.set_response(CHAT_URL, MockResponse::chunks(["data: [DONE]\n"]));
        let rec = Recorder::default();

        let handle = client(&http, &es, Some("durable"))
            .stream(
                "/chat/stream",
                Some(json!({})),
                rec.on_message(),
                rec.options().skip_auth(true),
            )
            .await
            .unwrap();
        wait_closed(&handle).await;

        assert!(http.requests_to(TOKEN_URL).is_empty());
        assert!(!http.get_requests()[0].headers.contains_key("Authorization"));
        assert_eq!(rec.close_count(), 1);
    }

    #[tokio::test]
    async fn test_native_path_uses_query_token() {
        let http = MockHttpClient::new();
        let es = MockEventSource::new();
        http.set_response(TOKEN_URL, MockResponse::json(200, json!({"stream_token": "st 2"})));
        es.set_messages(EVENTS_URL, ["{\"token\":\"H\"}", "{\"token\":\"i\"}", "[DONE]"]);
        let rec = Recorder::default();

        let handle = client(&http, &es, Some("durable"))
            .stream("/events", None, rec.on_message(), rec.options())
            .await
            .unwrap();
        assert_eq!(handle.transport(), TransportKind::EventSource);
        wait_closed(&handle).await;

        assert_eq!(rec.messages(), vec![json!({"token": "H"}), json!({"token": "i"})]);
        assert_eq!(rec.close_count(), 1);

        let open = &es.opens()[0];
        assert_eq!(open.url, "http://test/events?stream_token=st%202");
        assert!(!open.headers.contains_key("Authorization"));
    }

    #[tokio::test]
    async fn test_native_path_ignores_events_after_sentinel() {
        let http = MockHttpClient::new();
        let es = MockEventSource::new();
        es.set_messages(
            EVENTS_URL,
            ["{\"token\":\"H\"}", "[DONE]", "{\"late\":1}", "{broken"],
        );
        let rec = Recorder::default();

        let handle = client(&http, &es, None)
            .stream("/events", None, rec.on_message(), rec.options())
            .await
            .unwrap();
        wait_closed(&handle).await;
        tokio::task::yield_now().await;

        assert_eq!(rec.messages(), vec![json!({"token": "H"})]);
        assert_eq!(rec.error_count(), 0);
        assert_eq!(rec.close_count(), 1);
    }

    #[tokio::test]
    async fn test_native_close_from_callback_stops_delivery() {
        let http = MockHttpClient::new();
        let es = MockEventSource::new();
        let tx = es.channel(EVENTS_URL);
        let rec = Recorder::default();
        let slot: Arc<Mutex<Option<ConnectionHandle>>> = Arc::new(Mutex::new(None));

        let messages = rec.messages.clone();
        let closer = slot.clone();
        let handle = client(&http, &es, None)
            .stream(
                "/events",
                None,
                move |v| {
                    messages.lock().unwrap().push(v);
                    if let Some(handle) = closer.lock().unwrap().as_ref() {
                        handle.close();
                    }
                },
                rec.options(),
            )
            .await
            .unwrap();
        *slot.lock().unwrap() = Some(handle.clone());

        for data in ["{\"n\":1}", "{\"n\":2}", "{bad"] {
            tx.unbounded_send(Ok(NativeEvent::Message(NativeMessage::data(data))))
                .unwrap();
        }
        wait_closed(&handle).await;

        assert_eq!(rec.messages(), vec![json!({"n": 1})]);
        assert_eq!(rec.error_count(), 0);
        assert_eq!(rec.close_count(), 1);
    }

    #[tokio::test]
    async fn test_native_path_header_fallback_and_errors() {
        let http = MockHttpClient::new();
        let es = MockEventSource::new();
        http.set_response(TOKEN_URL, MockResponse::json(500, json!({})));
        es.set_events(
            EVENTS_URL,
            vec![
                Ok(NativeEvent::Open),
                Ok(NativeEvent::Message(NativeMessage::data("oops"))),
                Ok(NativeEvent::Message(NativeMessage::data("{\"n\":1}"))),
                Err(HttpError::Io("connection reset".to_string())),
            ],
        );
        let rec = Recorder::default();

        let handle = client(&http, &es, Some("durable"))
            .stream(EVENTS_URL, None, rec.on_message(), rec.options())
            .await
            .unwrap();
        wait_closed(&handle).await;

        assert_eq!(rec.messages(), vec![json!({"n": 1})]);
        let errors = rec.errors.lock().unwrap().clone();
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], StreamError::InvalidJson { .. }));
        assert!(matches!(errors[1], StreamError::Transport { .. }));
        assert_eq!(rec.close_count(), 1);

        let open = &es.opens()[0];
        assert_eq!(open.url, EVENTS_URL);
        assert_eq!(
            open.headers.get("Authorization"),
            Some(&"Bearer durable".to_string())
        );
    }

    #[tokio::test]
    async fn test_native_handle_starts_connecting() {
        let http = MockHttpClient::new();
        let es = MockEventSource::new();
        let tx = es.channel(EVENTS_URL);
        let rec = Recorder::default();

        let handle = client(&http, &es, None)
            .stream("/events", None, rec.on_message(), rec.options())
            .await
            .unwrap();
        assert_eq!(handle.ready_state(), ReadyState::Connecting);

        tx.unbounded_send(Ok(NativeEvent::Open)).unwrap();
        tokio::time::timeout(Duration::from_secs(2), async {
            while handle.ready_state() != ReadyState::Open {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("handle should open");

        handle.clone().close();
        wait_closed(&handle).await;
        assert!(handle.is_closed());
        assert_eq!(rec.close_count(), 1);
        assert!(tx.is_closed());
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let result = StreamClient::new(
            StreamClientConfig::new().with_base_url("not-a-url"),
            Arc::new(MockHttpClient::new()),
            Arc::new(MockEventSource::new()),
            Arc::new(StaticCredentials::anonymous()),
        );
        assert!(matches!(result.err(), Some(StreamError::Config { .. })));
    }

    #[test]
    fn test_options_debug_hides_callbacks() {
        let options = StreamOptions::new().on_close(|| {}).skip_auth(true);
        let debug = format!("{:?}", options);
        assert!(debug.contains("skip_auth: true"));
        assert!(debug.contains("on_close: true"));
    }
}
