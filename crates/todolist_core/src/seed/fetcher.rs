//! Seed fetcher contract and HTTP implementation.
//!
//! # Responsibility
//! - Perform one GET against the todos endpoint and decode the body.
//! - Classify failures as transport, status or decode errors.
//!
//! # Invariants
//! - No timeout beyond the transport default and no retry.
//! - Implementations are `Send + Sync` so the fetch can run off the owner thread.

use crate::seed::wire::TodoListResponse;
use log::{error, info};
use reqwest::blocking::Client;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Default public endpoint serving the seed list.
pub const DEFAULT_TODOS_ENDPOINT: &str = "https://dummyjson.com/todos";

pub type FetchResult<T> = Result<T, FetchError>;

/// Seed fetch failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Network unreachable, connection refused or body read failure.
    Transport(String),
    /// Server answered with a non-2xx status.
    HttpStatus(u16),
    /// Body is not valid JSON or does not match the expected schema.
    Decode(String),
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(message) => write!(f, "transport error: {message}"),
            Self::HttpStatus(code) => write!(f, "unexpected http status {code}"),
            Self::Decode(message) => write!(f, "failed to decode todo list: {message}"),
        }
    }
}

impl Error for FetchError {}

/// Source of the initial task list.
pub trait SeedFetcher: Send + Sync {
    fn fetch_todos(&self) -> FetchResult<TodoListResponse>;
}

/// Blocking HTTP fetcher for the remote todos endpoint.
pub struct HttpSeedFetcher {
    endpoint: String,
    client: Client,
}

impl HttpSeedFetcher {
    /// Builds a fetcher for `endpoint` with a default client.
    pub fn new(endpoint: impl Into<String>) -> FetchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|err| FetchError::Transport(err.to_string()))?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl SeedFetcher for HttpSeedFetcher {
    fn fetch_todos(&self) -> FetchResult<TodoListResponse> {
        let started_at = Instant::now();
        info!("event=seed_fetch module=seed status=start");

        let result = send_request(&self.client, &self.endpoint);
        match &result {
            Ok(response) => info!(
                "event=seed_fetch module=seed status=ok duration_ms={} items={}",
                started_at.elapsed().as_millis(),
                response.todos.len()
            ),
            Err(err) => error!(
                "event=seed_fetch module=seed status=error duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            ),
        }
        result
    }
}

fn send_request(client: &Client, endpoint: &str) -> FetchResult<TodoListResponse> {
    let resp = client
        .get(endpoint)
        .header("Accept", "application/json")
        .send()
        .map_err(|err| FetchError::Transport(err.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::HttpStatus(status.as_u16()));
    }

    let body = resp
        .bytes()
        .map_err(|err| FetchError::Transport(err.to_string()))?;
    decode_todo_list(&body)
}

/// Decodes a todo list body.
pub fn decode_todo_list(body: &[u8]) -> FetchResult<TodoListResponse> {
    serde_json::from_slice(body).map_err(|err| FetchError::Decode(err.to_string()))
}
