// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the Net library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

use serde::{Deserialize, Serialize};
use snafu::{IntoError, Snafu};

/// Errors surfaced by API calls.
///
/// Server-reported failures are mapped onto one of the status-specific variants by the status
/// table in [crate::unwrap]. Statuses without an entry in the table become [ApiError::Api], which
/// is also the `catch_all` for everything that is not a server-reported failure.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ApiError {
    #[snafu(display("bad request: {}", message))]
    BadRequest { message: String },

    #[snafu(display("unauthorized: {}", message))]
    Unauthorized { message: String },

    #[snafu(display("forbidden: {}", message))]
    Forbidden { message: String },

    #[snafu(display("resource not found: {}", message))]
    ResourceNotFound { message: String },

    #[snafu(display("conflict: {}", message))]
    Conflict { message: String },

    #[snafu(display("internal server error: {}", message))]
    InternalServerError { message: String },

    #[snafu(display(
        "api error{}: {}",
        status.map(|status| format!(" (status {})", status)).unwrap_or_default(),
        message
    ))]
    Api { status: Option<u16>, message: String },

    #[snafu(display("request to {} failed: {}", url, source))]
    Transport { url: String, source: TransportError },

    #[snafu(display("malformed response body: {}", message))]
    MalformedBody { message: String },
}

impl ApiError {
    /// Generic error with no associated status.
    pub fn catch_all(msg: impl Into<String>) -> Self {
        Self::Api {
            status: None,
            message: msg.into(),
        }
    }

    /// The HTTP status this error stands for, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::BadRequest { .. } => Some(400),
            Self::Unauthorized { .. } => Some(401),
            Self::Forbidden { .. } => Some(403),
            Self::ResourceNotFound { .. } => Some(404),
            Self::Conflict { .. } => Some(409),
            Self::InternalServerError { .. } => Some(500),
            Self::Api { status, .. } => *status,
            Self::Transport { .. } | Self::MalformedBody { .. } => None,
        }
    }

    /// The server-provided (or locally generated) message.
    pub fn message(&self) -> String {
        match self {
            Self::BadRequest { message }
            | Self::Unauthorized { message }
            | Self::Forbidden { message }
            | Self::ResourceNotFound { message }
            | Self::Conflict { message }
            | Self::InternalServerError { message }
            | Self::Api { message, .. }
            | Self::MalformedBody { message } => message.clone(),
            Self::Transport { source, .. } => source.to_string(),
        }
    }
}

/// The kind of error a status code maps to.
///
/// Kinds are what status tables store; [ErrorKind::into_error] attaches the message extracted
/// from the response body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    ResourceNotFound,
    Conflict,
    InternalServerError,
    Api,
}

impl ErrorKind {
    /// Build the error for this kind. `status` is only kept by [ErrorKind::Api], the other kinds
    /// carry their status implicitly.
    pub fn into_error(self, status: u16, message: String) -> ApiError {
        match self {
            Self::BadRequest => ApiError::BadRequest { message },
            Self::Unauthorized => ApiError::Unauthorized { message },
            Self::Forbidden => ApiError::Forbidden { message },
            Self::ResourceNotFound => ApiError::ResourceNotFound { message },
            Self::Conflict => ApiError::Conflict { message },
            Self::InternalServerError => ApiError::InternalServerError { message },
            Self::Api => ApiError::Api {
                status: Some(status),
                message,
            },
        }
    }
}

/// Failures raised by a [crate::client::Transport] before any response was obtained.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TransportError {
    #[snafu(display("connection failed: {}", message))]
    Connection { message: String },

    #[snafu(display("timed out after {} ms", timeout_ms))]
    Timeout { timeout_ms: u64 },

    #[snafu(display("invalid url {}: {}", url, message))]
    InvalidUrl { url: String, message: String },

    #[snafu(display("invalid header {}: {}", name, message))]
    InvalidHeader { name: String, message: String },

    #[snafu(display("unable to encode or read body: {}", message))]
    Body { message: String },
}

impl TransportError {
    pub fn connection(msg: impl ToString) -> Self {
        Self::Connection {
            message: msg.to_string(),
        }
    }

    /// Whether trying the same request again could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Timeout { .. })
    }
}

/// Context for wrapping a [TransportError] into an [ApiError] that names the target URL.
///
/// This type implements the [IntoError] trait from SNAFU, so it can be used with
/// [snafu::ResultExt::context] just like automatically generated SNAFU contexts.
pub struct RequestFailed<'a> {
    pub url: &'a str,
}

impl IntoError<ApiError> for RequestFailed<'_> {
    type Source = TransportError;

    fn into_error(self, source: Self::Source) -> ApiError {
        ApiError::Transport {
            url: self.url.to_string(),
            source,
        }
    }
}

/// Contract violations raised by [crate::model::Convertible] deserialization.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ModelError {
    #[snafu(display("attribute filter must be a list of strings, got {}", found))]
    InvalidFilter { found: String },

    #[snafu(display("wire payload must be a JSON object, got {}", found))]
    NotAnObject { found: String },
}

/// Errors raised by [crate::attr_map::AttrMap].
#[derive(Debug, Snafu, PartialEq, Eq)]
#[snafu(visibility(pub(crate)))]
pub enum MapError {
    /// Read of a key that is neither an attribute nor an entry.
    #[snafu(display("no attribute or key named {}", key))]
    MissingKey { key: String },

    /// Delete of a key that is neither an attribute nor an entry.
    #[snafu(display("{} not found", key))]
    NotFound { key: String },

    #[snafu(display("operation not allowed on locked key {}", key))]
    OperationNotAllowed { key: String },
}
