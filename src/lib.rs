// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the Net library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

//! # Model serialization and resilient HTTP plumbing for cloud robotics web APIs.
//!
//! Every endpoint of the platform API follows the same path: a [RequestExecutor] performs the
//! HTTP exchange, retrying transport failures (and, for GETs, server errors); the raw response is
//! unwrapped by [unwrap_response] into the payload of the response envelope or into an
//! [ApiError] chosen by status code; and the payload is turned into a typed model through the
//! model's declared field maps ([Convertible]).
//!
//! Models are plain Rust structs. They declare which wire field each local field comes from and
//! goes to, and the rules in [adapters] take care of nested models, lists of models and enums.
//! Deserialization is deliberately permissive: missing fields, unknown enum values and extra wire
//! fields never fail, because the server may be newer than the client. The only errors are
//! contract violations by the caller, such as a malformed attribute filter.
//!
//! Schemaless payloads can be held in an [AttrMap], a dictionary whose keys double as named
//! fields, with an optional locked key set.
//!
//! The core is blocking. Each executor and each model instance is independent, so concurrent
//! calls need no coordination as long as they do not share an instance.

pub mod adapters;
pub mod attr_map;
pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod model;
pub mod types;
pub mod unwrap;

pub use adapters::Lenient;
pub use attr_map::{AttrMap, AttrValue};
pub use client::{SurfTransport, Transport};
pub use config::ExecutorConfig;
pub use error::*;
pub use executor::RequestExecutor;
pub use model::{AttributeFilter, Convertible, DeserializeField, SerializeField, ToWire, WireEnum};
pub use types::*;
pub use unwrap::{unwrap_response, unwrapped, ResponseExt, UnwrapOptions};
