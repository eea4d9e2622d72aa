// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the Net library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Turning raw responses into payloads or errors.
//!
//! Successful responses carry their payload in an envelope, `{"status": ..., "response":
//! {"data": ...}}`. Failed responses are mapped to an [ApiError] by status code, using
//! [STATUS_TABLE] plus any per-call overrides, with the message taken from the body's `error` or
//! `response.error` field.
//!
//! [unwrap_response] applies this to a response already at hand. [unwrapped] wraps a function
//! that returns a response so that it returns the payload instead, and [ResponseExt] does the
//! same for a single call result.

use crate::error::{ApiError, ErrorKind};
use crate::model::Convertible;
use crate::types::RawResponse;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;

/// Built-in status to error mapping. Other non-2xx statuses become [ErrorKind::Api].
pub const STATUS_TABLE: [(u16, ErrorKind); 6] = [
    (400, ErrorKind::BadRequest),
    (401, ErrorKind::Unauthorized),
    (403, ErrorKind::Forbidden),
    (404, ErrorKind::ResourceNotFound),
    (409, ErrorKind::Conflict),
    (500, ErrorKind::InternalServerError),
];

/// How to interpret one call's response.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UnwrapOptions {
    overrides: BTreeMap<u16, ErrorKind>,
    parse_full: bool,
    return_value: Option<Value>,
}

impl UnwrapOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the whole decoded body instead of `response.data`.
    pub fn parse_full(mut self) -> Self {
        self.parse_full = true;
        self
    }

    /// Return `value` on success without looking at the body.
    pub fn return_value(mut self, value: Value) -> Self {
        self.return_value = Some(value);
        self
    }

    /// Map `status` to `kind`, replacing the built-in entry if there is one.
    pub fn map_status(mut self, status: u16, kind: ErrorKind) -> Self {
        self.overrides.insert(status, kind);
        self
    }

    /// The error kind for a non-2xx `status`.
    pub fn error_kind(&self, status: u16) -> ErrorKind {
        self.overrides
            .get(&status)
            .copied()
            .or_else(|| {
                STATUS_TABLE
                    .iter()
                    .find(|(code, _)| *code == status)
                    .map(|(_, kind)| *kind)
            })
            .unwrap_or(ErrorKind::Api)
    }
}

/// The error message in an error response body, or an empty string if there is none.
pub fn error_message(body: &str) -> String {
    let body: Value = match serde_json::from_str(body) {
        Ok(body) => body,
        Err(_) => return String::new(),
    };
    let error = body
        .get("error")
        .filter(|error| !error.is_null())
        .or_else(|| body.get("response").and_then(|response| response.get("error")));
    match error {
        Some(Value::String(message)) => message.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// The payload of `res`, or the error it stands for.
pub fn unwrap_response(res: &RawResponse, options: &UnwrapOptions) -> Result<Value, ApiError> {
    if !res.is_success() {
        let message = error_message(&res.body);
        return Err(options.error_kind(res.status).into_error(res.status, message));
    }
    if let Some(value) = &options.return_value {
        return Ok(value.clone());
    }

    let body: Value = serde_json::from_str(&res.body).map_err(|err| ApiError::MalformedBody {
        message: format!("response is not JSON: {}", err),
    })?;
    if options.parse_full {
        return Ok(body);
    }
    match body.get("response").and_then(|response| response.get("data")) {
        Some(data) => Ok(data.clone()),
        None => Err(ApiError::MalformedBody {
            message: format!("response has no response.data field: {}", res.body),
        }),
    }
}

/// Wrap `call` so that it returns the unwrapped payload of its response.
pub fn unwrapped<A, F>(call: F, options: UnwrapOptions) -> impl Fn(A) -> Result<Value, ApiError>
where
    F: Fn(A) -> Result<RawResponse, ApiError>,
{
    move |args| call(args).and_then(|res| unwrap_response(&res, &options))
}

/// Unwrapping for call results.
pub trait ResponseExt: Sized {
    fn payload(self, options: &UnwrapOptions) -> Result<Value, ApiError>;

    /// The payload decoded into a serde type.
    fn payload_as<T: DeserializeOwned>(self, options: &UnwrapOptions) -> Result<T, ApiError> {
        let payload = self.payload(options)?;
        serde_json::from_value(payload).map_err(|err| ApiError::MalformedBody {
            message: format!("unexpected payload shape: {}", err),
        })
    }

    /// The payload deserialized into a model. The payload must be a JSON object.
    fn payload_model<M: Convertible>(self, options: &UnwrapOptions) -> Result<M, ApiError> {
        match self.payload(options)? {
            Value::Object(wire) => Ok(M::deserialize(&wire)),
            other => Err(ApiError::MalformedBody {
                message: format!("expected an object, got {}", other),
            }),
        }
    }

    /// The payload deserialized into a list of models. The payload must be an array of objects.
    fn payload_models<M: Convertible>(self, options: &UnwrapOptions) -> Result<Vec<M>, ApiError> {
        match self.payload(options)? {
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_object()
                        .map(M::deserialize)
                        .ok_or_else(|| ApiError::MalformedBody {
                            message: format!("expected an object, got {}", item),
                        })
                })
                .collect(),
            other => Err(ApiError::MalformedBody {
                message: format!("expected an array, got {}", other),
            }),
        }
    }
}

impl ResponseExt for RawResponse {
    fn payload(self, options: &UnwrapOptions) -> Result<Value, ApiError> {
        unwrap_response(&self, options)
    }
}

impl ResponseExt for Result<RawResponse, ApiError> {
    fn payload(self, options: &UnwrapOptions) -> Result<Value, ApiError> {
        self.and_then(|res| unwrap_response(&res, options))
    }
}
