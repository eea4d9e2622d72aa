// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the Net library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Builder-style HTTP calls with bounded retries.
//!
//! Two independent retry paths share one attempt counter:
//!
//! * a transport failure (no response at all) is retried while the counter is below the
//!   configured retry limit;
//! * a GET answered with 500 is retried while the counter is below
//!   [SERVER_ERROR_RETRY_CEILING], whatever the configured limit. Call sites depend on this
//!   exact attempt count, including with a retry limit of zero.
//!
//! Every other response, whatever its status, is returned to the caller as is.

use crate::client::{SurfTransport, Transport};
use crate::config::{ExecutorConfig, DEFAULT_BACKOFF_MS, DEFAULT_RETRY_LIMIT};
use crate::error::{ApiError, RequestFailed};
use crate::types::{Body, HttpRequest, Method, Params, RawResponse};
use serde_json::Value;
use snafu::ResultExt;
use std::thread;
use std::time::Duration;
use tracing::{event, Level};

/// Retries granted to a GET answered with 500.
pub const SERVER_ERROR_RETRY_CEILING: u32 = 3;

const INTERNAL_SERVER_ERROR: u16 = 500;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutorState {
    /// Built, not executed yet.
    Idle,
    /// An exchange is in flight.
    Attempting,
    /// A response was obtained and returned.
    Completed,
    /// Gave up, either out of retries or on a failure that cannot be retried.
    Failed,
}

/// One logical API call. See the module documentation for the retry rules.
pub struct RequestExecutor<T = SurfTransport> {
    transport: T,
    url: String,
    method: Method,
    headers: Params,
    query: Params,
    retry_limit: u32,
    backoff: Duration,
    retries: u32,
    state: ExecutorState,
}

impl RequestExecutor<SurfTransport> {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_transport(SurfTransport::default(), url)
    }

    pub fn from_config(config: &ExecutorConfig, url: impl Into<String>) -> Self {
        Self::with_transport(SurfTransport::from_config(config), url).configure(config)
    }
}

impl<T: Transport> RequestExecutor<T> {
    pub fn with_transport(transport: T, url: impl Into<String>) -> Self {
        Self {
            transport,
            url: url.into(),
            method: Method::Get,
            headers: Params::new(),
            query: Params::new(),
            retry_limit: DEFAULT_RETRY_LIMIT,
            backoff: Duration::from_millis(DEFAULT_BACKOFF_MS),
            retries: 0,
            state: ExecutorState::Idle,
        }
    }

    /// Apply retry limit, backoff and default headers. Headers already set take precedence.
    pub fn configure(mut self, config: &ExecutorConfig) -> Self {
        let mut headers = config.headers.clone();
        headers.append(&mut self.headers);
        self.headers = headers;
        self.retry_limit = config.retry_limit;
        self.backoff = config.backoff();
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Replace the header set.
    pub fn headers(mut self, headers: Params) -> Self {
        self.headers = headers;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Replace the query parameters.
    pub fn query_params(mut self, query: Params) -> Self {
        self.query = query;
        self
    }

    pub fn query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn retry(mut self, limit: u32) -> Self {
        self.retry_limit = limit;
        self
    }

    /// Set the retry limit from untyped input. Anything but a non-negative integer that fits a
    /// `u32` is ignored and the current limit is kept.
    pub fn retry_from_value(mut self, limit: &Value) -> Self {
        if let Some(limit) = limit.as_u64().and_then(|limit| u32::try_from(limit).ok()) {
            self.retry_limit = limit;
        }
        self
    }

    pub fn backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn retry_limit(&self) -> u32 {
        self.retry_limit
    }

    /// Retries performed by the last [RequestExecutor::execute].
    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn state(&self) -> ExecutorState {
        self.state
    }

    /// Send `payload` as JSON, or without a body when there is none.
    pub fn execute_json(&mut self, payload: Option<Value>) -> Result<RawResponse, ApiError> {
        self.execute(Body::json(payload))
    }

    /// Send `payload` as is.
    pub fn execute_raw(&mut self, payload: impl Into<Vec<u8>>) -> Result<RawResponse, ApiError> {
        self.execute(Body::Raw(payload.into()))
    }

    /// Perform the call, retrying as described in the module documentation.
    ///
    /// Non-2xx responses are not errors at this level; only transport failures are.
    pub fn execute(&mut self, body: Body) -> Result<RawResponse, ApiError> {
        let request = HttpRequest {
            method: self.method,
            url: self.url.clone(),
            headers: self.headers.clone(),
            query: self.query.clone(),
            body,
        };
        self.retries = 0;

        loop {
            self.state = ExecutorState::Attempting;
            event!(
                Level::DEBUG,
                "{} {} (attempt {})",
                request.method,
                request.url,
                self.retries + 1
            );
            match self.transport.send(&request) {
                Ok(res) => {
                    if self.method == Method::Get
                        && res.status == INTERNAL_SERVER_ERROR
                        && self.retries < SERVER_ERROR_RETRY_CEILING
                    {
                        self.retries += 1;
                        event!(
                            Level::DEBUG,
                            "server error from {}, retry {} of {}",
                            request.url,
                            self.retries,
                            SERVER_ERROR_RETRY_CEILING
                        );
                        thread::sleep(self.backoff);
                        continue;
                    }
                    self.state = ExecutorState::Completed;
                    return Ok(res);
                }
                Err(err) => {
                    if err.is_retryable() && self.retries < self.retry_limit {
                        self.retries += 1;
                        event!(
                            Level::DEBUG,
                            "{} from {}, retry {} of {}",
                            err,
                            request.url,
                            self.retries,
                            self.retry_limit
                        );
                        thread::sleep(self.backoff);
                        continue;
                    }
                    self.state = ExecutorState::Failed;
                    return Err(err).context(RequestFailed { url: &self.url });
                }
            }
        }
    }
}
