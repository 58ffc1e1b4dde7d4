use crate::delivery::{AsyncEmitter, CompletionCallback, DeliveryOutcome};
use crate::event::{SelfDescribingEnvelope, TrackerPayload, PAYLOAD_DATA_SCHEMA};
use reqwest::blocking::Client;
use reqwest::Url;
use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Collector endpoint path for bulk tracker payloads.
pub const COLLECTOR_PATH: &str = "com.snowplowanalytics.snowplow/tp2";

const HTTP_TIMEOUT: Duration = Duration::from_secs(5);

/// Transport trait representing one POST of a payload batch to the collector.
pub trait EventTransport {
    /// Posts the batch and returns the collector's HTTP status code.
    fn post(&mut self, payloads: &[TrackerPayload]) -> Result<u16, TransportError>;
}

/// Transport-level error returned when the POST fails outright.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Blocking HTTP transport that forwards payload batches to the collector's
/// bulk endpoint.
#[derive(Debug, Clone)]
pub struct CollectorTransport {
    client: Client,
    endpoint: Url,
}

impl CollectorTransport {
    /// Creates a transport targeting the provided collector base URL.
    pub fn new(endpoint: Url) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .connect_timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|err| TransportError::new(format!("http client build failed: {err}")))?;
        Ok(Self { client, endpoint })
    }

    fn collector_url(&self) -> String {
        format!(
            "{}/{}",
            self.endpoint.as_str().trim_end_matches('/'),
            COLLECTOR_PATH
        )
    }
}

impl EventTransport for CollectorTransport {
    fn post(&mut self, payloads: &[TrackerPayload]) -> Result<u16, TransportError> {
        let data = serde_json::to_value(payloads)
            .map_err(|err| TransportError::new(format!("payload encode failed: {err}")))?;
        let body = SelfDescribingEnvelope::new(PAYLOAD_DATA_SCHEMA, data);
        let response = self
            .client
            .post(self.collector_url())
            .json(&body)
            .send()
            .map_err(|err| TransportError::new(format!("collector post failed: {err}")))?;
        Ok(response.status().as_u16())
    }
}

/// Signals stored in the queue shared with the worker thread.
struct EmitterState {
    queue: VecDeque<TrackerPayload>,
    callback: Option<CompletionCallback>,
    shutdown: bool,
}

struct EmitterShared {
    buffer_size: usize,
    state: Mutex<EmitterState>,
    cv: Condvar,
}

/// Asynchronous emitter that drains enqueued payloads on a worker thread,
/// posting them in sub-batches of at most `buffer_size` and reporting each
/// resolved sub-batch through the registered completion callback.
///
/// A sub-batch counts as fully succeeded on a 2xx collector response and
/// fully failed otherwise; the transport is given exactly one POST per
/// sub-batch. Retry policy belongs to the caller.
pub struct BatchEmitter {
    shared: Arc<EmitterShared>,
    worker: Option<thread::JoinHandle<()>>,
}

impl BatchEmitter {
    pub fn new<T>(transport: T, buffer_size: usize) -> Self
    where
        T: EventTransport + Send + 'static,
    {
        let shared = Arc::new(EmitterShared {
            buffer_size: buffer_size.max(1),
            state: Mutex::new(EmitterState {
                queue: VecDeque::new(),
                callback: None,
                shutdown: false,
            }),
            cv: Condvar::new(),
        });
        let worker_shared = Arc::clone(&shared);
        let worker = thread::spawn(move || worker_loop(worker_shared, transport));
        Self {
            shared,
            worker: Some(worker),
        }
    }

    /// Signals the worker to drain the remaining queue and exit, then joins
    /// it. Idempotent.
    pub fn shutdown(&mut self) {
        {
            let mut state = self.shared.state.lock().unwrap();
            state.shutdown = true;
        }
        self.shared.cv.notify_all();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for BatchEmitter {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl AsyncEmitter for BatchEmitter {
    type Item = TrackerPayload;

    fn on_completion(&mut self, callback: CompletionCallback) {
        self.shared.state.lock().unwrap().callback = Some(callback);
    }

    fn enqueue(&mut self, items: Vec<TrackerPayload>) {
        {
            let mut state = self.shared.state.lock().unwrap();
            state.queue.extend(items);
        }
        self.shared.cv.notify_all();
    }
}

fn worker_loop<T: EventTransport>(shared: Arc<EmitterShared>, mut transport: T) {
    loop {
        let (chunk, callback) = {
            let mut state = shared.state.lock().unwrap();
            loop {
                if !state.queue.is_empty() {
                    break;
                }
                if state.shutdown {
                    return;
                }
                state = shared.cv.wait(state).unwrap();
            }
            let take = state.queue.len().min(shared.buffer_size);
            let chunk: Vec<TrackerPayload> = state.queue.drain(..take).collect();
            (chunk, state.callback.clone())
        };
        let attempted = chunk.len() as u64;
        let outcome = match transport.post(&chunk) {
            Ok(status) if (200..300).contains(&status) => DeliveryOutcome::new(attempted, 0),
            Ok(_) | Err(_) => DeliveryOutcome::new(0, attempted),
        };
        if let Some(callback) = callback {
            callback(outcome);
        }
    }
}
