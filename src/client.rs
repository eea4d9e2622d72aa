// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the Net library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

use crate::config::ExecutorConfig;
use crate::error::TransportError;
use crate::types::{Body, HttpRequest, Params, RawResponse};
use async_std::{future, task};
use std::str::FromStr;
use std::time::Duration;
use surf::http::headers::{HeaderName, HeaderValue};
use surf::{Client, Request, Url};
use tracing::{event, Level};

/// Performs a single HTTP exchange.
///
/// Implementations block the calling thread until a response is received or the exchange fails.
/// They never interpret the status code; a 500 is a successful exchange as far as the transport
/// is concerned. Timeouts belong here too, not in the retry loop above.
pub trait Transport {
    fn send(&self, request: &HttpRequest) -> Result<RawResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &HttpRequest) -> Result<RawResponse, TransportError> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, request: &HttpRequest) -> Result<RawResponse, TransportError> {
        (**self).send(request)
    }
}

/// [Transport] that hands every request to a closure. Mostly useful for tests and fakes.
pub struct FnTransport<F>(pub F);

impl<F> Transport for FnTransport<F>
where
    F: Fn(&HttpRequest) -> Result<RawResponse, TransportError>,
{
    fn send(&self, request: &HttpRequest) -> Result<RawResponse, TransportError> {
        (self.0)(request)
    }
}

/// [Transport] backed by a [surf::Client], driven to completion on the calling thread.
#[derive(Clone)]
pub struct SurfTransport {
    client: Client,
    timeout: Option<Duration>,
}

impl Default for SurfTransport {
    fn default() -> Self {
        Self::new(Client::new())
    }
}

impl SurfTransport {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            timeout: None,
        }
    }

    pub fn from_config(config: &ExecutorConfig) -> Self {
        Self::default().with_timeout(config.timeout())
    }

    /// Bound each exchange (connect, send and read of the body).
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn build(&self, request: &HttpRequest) -> Result<Request, TransportError> {
        let mut url = Url::parse(&request.url).map_err(|err| TransportError::InvalidUrl {
            url: request.url.clone(),
            message: err.to_string(),
        })?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }

        let mut req = Request::new(request.method, url);
        for (name, value) in &request.headers {
            let invalid = |err: surf::Error| TransportError::InvalidHeader {
                name: name.clone(),
                message: err.to_string(),
            };
            let header_name = HeaderName::from_str(name).map_err(invalid)?;
            let header_value = HeaderValue::from_str(value).map_err(invalid)?;
            req.insert_header(header_name, header_value);
        }
        match &request.body {
            Body::Empty => {}
            Body::Json(value) => {
                let body = surf::Body::from_json(value).map_err(|err| TransportError::Body {
                    message: err.to_string(),
                })?;
                req.set_body(body);
            }
            Body::Raw(bytes) => req.set_body(bytes.clone()),
        }
        Ok(req)
    }

    async fn exchange(&self, req: Request) -> Result<RawResponse, TransportError> {
        let mut res = self
            .client
            .send(req)
            .await
            .map_err(TransportError::connection)?;
        let bytes = res.body_bytes().await.map_err(|err| TransportError::Body {
            message: err.to_string(),
        })?;
        let headers: Params = res
            .iter()
            .map(|(name, values)| (name.as_str().to_string(), values.as_str().to_string()))
            .collect();
        Ok(RawResponse {
            headers,
            ..RawResponse::from_bytes(res.status().into(), bytes)
        })
    }
}

impl Transport for SurfTransport {
    fn send(&self, request: &HttpRequest) -> Result<RawResponse, TransportError> {
        let req = self.build(request)?;
        event!(
            Level::DEBUG,
            "--> {} {} (timeout: {:?})",
            request.method,
            request.url,
            self.timeout
        );
        let res = task::block_on(async {
            match self.timeout {
                Some(timeout) => future::timeout(timeout, self.exchange(req))
                    .await
                    .unwrap_or_else(|_| {
                        Err(TransportError::Timeout {
                            timeout_ms: timeout.as_millis() as u64,
                        })
                    }),
                None => self.exchange(req).await,
            }
        })?;
        event!(Level::DEBUG, "<-- {} {}", res.status, request.url);
        Ok(res)
    }
}
