// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the Net library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Deserialization rules for the fields of a [Convertible] model.
//!
//! None of these rules fail. Wire payloads are frequently partial and may come from a newer server
//! than the client was written against. Missing and `null` values become [Lenient::Absent], and
//! anything a rule cannot make sense of is carried along untouched as [Lenient::Raw], so it goes
//! back out exactly as it came in.

use crate::model::{Convertible, WireEnum};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::type_name;
use tracing::{event, Level};

/// A wire field name plus the transformation applied to its value.
///
/// The transformation sees `None` when the field is missing from the payload.
pub struct Rule<T> {
    wire: &'static str,
    transform: Box<dyn Fn(Option<&Value>) -> T>,
}

impl<T> Rule<T> {
    pub fn wire(&self) -> &'static str {
        self.wire
    }

    pub fn apply(&self, value: Option<&Value>) -> T {
        (self.transform)(value)
    }
}

/// A decoded value, or the wire value it could not be decoded from.
#[derive(Clone, Debug, PartialEq)]
pub enum Lenient<T> {
    /// The field was missing or `null`.
    Absent,
    Parsed(T),
    /// A value of unexpected shape, kept as received.
    Raw(Value),
}

impl<T> Lenient<T> {
    pub fn parsed(&self) -> Option<&T> {
        match self {
            Self::Parsed(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_parsed(self) -> Option<T> {
        match self {
            Self::Parsed(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// `Some` becomes [Lenient::Parsed], `None` becomes [Lenient::Absent].
    pub fn from_option(value: Option<T>) -> Self {
        value.map_or(Self::Absent, Self::Parsed)
    }
}

impl<T> Default for Lenient<T> {
    fn default() -> Self {
        Self::Absent
    }
}

impl<T> From<T> for Lenient<T> {
    fn from(value: T) -> Self {
        Self::Parsed(value)
    }
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|value| !value.is_null())
}

/// Any transformation.
pub fn custom<T, F>(wire: &'static str, transform: F) -> Rule<T>
where
    F: Fn(Option<&Value>) -> T + 'static,
{
    Rule {
        wire,
        transform: Box::new(transform),
    }
}

/// Copy the wire value into a plain serde type. Values of another shape are kept as received.
pub fn verbatim<T: DeserializeOwned + 'static>(wire: &'static str) -> Rule<Lenient<T>> {
    custom(wire, move |value: Option<&Value>| {
        let value = match present(value) {
            Some(value) => value,
            None => return Lenient::Absent,
        };
        match serde_json::from_value(value.clone()) {
            Ok(decoded) => Lenient::Parsed(decoded),
            Err(err) => {
                event!(
                    Level::DEBUG,
                    "keeping field {} as received: expected {}: {}",
                    wire,
                    type_name::<T>(),
                    err
                );
                Lenient::Raw(value.clone())
            }
        }
    })
}

/// Copy the wire value as untyped JSON.
pub fn raw(wire: &'static str) -> Rule<Option<Value>> {
    custom(wire, |value: Option<&Value>| present(value).cloned())
}

/// A nested model. A value that is not an object is passed through as [Lenient::Raw].
pub fn nested<M: Convertible>(wire: &'static str) -> Rule<Lenient<M>> {
    custom(wire, |value: Option<&Value>| match present(value) {
        None => Lenient::Absent,
        Some(Value::Object(object)) => Lenient::Parsed(M::deserialize(object)),
        Some(other) => Lenient::Raw(other.clone()),
    })
}

/// A list of nested models, in wire order.
///
/// A value that is not a list of objects is passed through as [Lenient::Raw].
pub fn list_of<M: Convertible>(wire: &'static str) -> Rule<Lenient<Vec<M>>> {
    custom(wire, |value: Option<&Value>| {
        let value = match present(value) {
            Some(value) => value,
            None => return Lenient::Absent,
        };
        let decoded = value.as_array().and_then(|items| {
            items
                .iter()
                .map(|item| item.as_object().map(M::deserialize))
                .collect::<Option<Vec<_>>>()
        });
        match decoded {
            Some(models) => Lenient::Parsed(models),
            None => Lenient::Raw(value.clone()),
        }
    })
}

/// An enum member. Values that match no member are passed through as [Lenient::Raw].
pub fn enumeration<E: WireEnum>(wire: &'static str) -> Rule<Lenient<E>> {
    custom(wire, |value: Option<&Value>| match present(value) {
        None => Lenient::Absent,
        Some(value) => match E::from_wire(value) {
            Some(member) => Lenient::Parsed(member),
            None => {
                event!(
                    Level::DEBUG,
                    "unrecognized {} value {}",
                    type_name::<E>(),
                    value
                );
                Lenient::Raw(value.clone())
            }
        },
    })
}
