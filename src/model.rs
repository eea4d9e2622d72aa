// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the Net library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Field-map driven conversion between API models and wire JSON.
//!
//! A model declares two field maps. The serialize map pairs every wire field with the local field
//! it is read from; the value is converted with [ToWire], which already knows how to handle nested
//! models, lists of models and enums. The deserialize map pairs every local field with a
//! [Rule](crate::adapters::Rule) that extracts and transforms the wire value. Rules are where
//! nested models, lists and enums are recognized, see [crate::adapters].
//!
//! ```
//! use robotics_net::adapters::{verbatim, Lenient, enumeration};
//! use robotics_net::model::{Convertible, DeserializeField, SerializeField};
//! use robotics_net::wire_enum;
//!
//! wire_enum! {
//!     pub enum Phase {
//!         Running = "Running",
//!         Stopped = "Stopped",
//!     }
//! }
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Deployment {
//!     name: Lenient<String>,
//!     phase: Lenient<Phase>,
//! }
//!
//! impl Convertible for Deployment {
//!     fn serialize_map(&self) -> Vec<SerializeField<Self>> {
//!         vec![
//!             SerializeField::new("name", "name", |d: &Self| &d.name),
//!             SerializeField::new("phase", "phase", |d: &Self| &d.phase),
//!         ]
//!     }
//!
//!     fn deserialize_map() -> Vec<DeserializeField<Self>> {
//!         vec![
//!             DeserializeField::new("name", verbatim("name"), |d: &mut Self, v| d.name = v),
//!             DeserializeField::new("phase", enumeration("phase"), |d: &mut Self, v| d.phase = v),
//!         ]
//!     }
//! }
//!
//! let wire = serde_json::json!({"name": "dep", "phase": "Running"});
//! let dep = Deployment::deserialize(wire.as_object().unwrap());
//! assert_eq!(dep.phase, Lenient::Parsed(Phase::Running));
//! assert_eq!(serde_json::Value::Object(dep.serialize()), wire);
//! ```

use crate::adapters::{Lenient, Rule};
use crate::attr_map::AttrMap;
use crate::error::ModelError;
use std::collections::BTreeSet;

pub use serde_json::{Map, Value};

/// Conversion of a local field value into its wire form.
///
/// `None` means the value is absent and the wire field must be omitted.
pub trait ToWire {
    fn to_wire(&self) -> Option<Value>;
}

impl ToWire for Value {
    fn to_wire(&self) -> Option<Value> {
        if self.is_null() {
            None
        } else {
            Some(self.clone())
        }
    }
}

impl ToWire for str {
    fn to_wire(&self) -> Option<Value> {
        Some(Value::from(self))
    }
}

impl ToWire for String {
    fn to_wire(&self) -> Option<Value> {
        Some(Value::from(self.as_str()))
    }
}

macro_rules! scalar_to_wire {
    ($($ty:ty),+) => {
        $(impl ToWire for $ty {
            fn to_wire(&self) -> Option<Value> {
                Some(Value::from(*self))
            }
        })+
    };
}

scalar_to_wire!(bool, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

impl<T: ToWire> ToWire for Option<T> {
    fn to_wire(&self) -> Option<Value> {
        self.as_ref().and_then(ToWire::to_wire)
    }
}

impl<T: ToWire> ToWire for Vec<T> {
    fn to_wire(&self) -> Option<Value> {
        Some(Value::Array(
            self.iter()
                .map(|item| item.to_wire().unwrap_or(Value::Null))
                .collect(),
        ))
    }
}

impl<T: ToWire> ToWire for Lenient<T> {
    fn to_wire(&self) -> Option<Value> {
        match self {
            Lenient::Absent => None,
            Lenient::Parsed(value) => value.to_wire(),
            Lenient::Raw(value) => value.to_wire(),
        }
    }
}

impl ToWire for AttrMap {
    fn to_wire(&self) -> Option<Value> {
        Some(Value::Object(self.to_plain_mapping()))
    }
}

/// Enumerations with a scalar wire value per member.
///
/// Use [wire_enum!](crate::wire_enum) to declare one.
pub trait WireEnum: Copy + 'static {
    const MEMBERS: &'static [Self];

    fn wire_value(&self) -> Value;

    /// The member whose wire value equals `value`, if any.
    fn from_wire(value: &Value) -> Option<Self> {
        Self::MEMBERS
            .iter()
            .copied()
            .find(|member| &member.wire_value() == value)
    }
}

/// Declare an enum that serializes to scalar wire values.
///
/// ```
/// robotics_net::wire_enum! {
///     pub enum Arch {
///         Amd64 = "amd64",
///         Arm64 = "arm64v8",
///     }
/// }
/// ```
#[macro_export]
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident = $value:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $crate::model::WireEnum for $name {
            const MEMBERS: &'static [Self] = &[$(Self::$variant),+];

            fn wire_value(&self) -> $crate::model::Value {
                match self {
                    $(Self::$variant => $crate::model::Value::from($value)),+
                }
            }
        }

        impl $crate::model::ToWire for $name {
            fn to_wire(&self) -> Option<$crate::model::Value> {
                Some($crate::model::WireEnum::wire_value(self))
            }
        }
    };
}

/// Let models be used as field values of other models (directly, in lists or in options).
#[macro_export]
macro_rules! wire_model {
    ($($ty:ty),+ $(,)?) => {
        $(impl $crate::model::ToWire for $ty {
            fn to_wire(&self) -> Option<$crate::model::Value> {
                Some($crate::model::Value::Object(
                    $crate::model::Convertible::serialize(self),
                ))
            }
        })+
    };
}

/// One entry of a serialize map: wire field, local field and how to read it.
pub struct SerializeField<M> {
    wire: &'static str,
    local: &'static str,
    read: Box<dyn Fn(&M) -> Option<Value>>,
}

impl<M: 'static> SerializeField<M> {
    pub fn new<T: ToWire + ?Sized + 'static>(
        wire: &'static str,
        local: &'static str,
        read: fn(&M) -> &T,
    ) -> Self {
        Self {
            wire,
            local,
            read: Box::new(move |model: &M| read(model).to_wire()),
        }
    }

    pub fn wire(&self) -> &'static str {
        self.wire
    }

    pub fn local(&self) -> &'static str {
        self.local
    }

    pub fn read(&self, model: &M) -> Option<Value> {
        (self.read)(model)
    }
}

/// One entry of a deserialize map: local field, the rule producing its value and how to store it.
pub struct DeserializeField<M> {
    local: &'static str,
    wire: &'static str,
    apply: Box<dyn Fn(&mut M, Option<&Value>)>,
}

impl<M: 'static> DeserializeField<M> {
    pub fn new<T: 'static>(local: &'static str, rule: Rule<T>, write: fn(&mut M, T)) -> Self {
        let wire = rule.wire();
        Self {
            local,
            wire,
            apply: Box::new(move |model: &mut M, value: Option<&Value>| {
                write(model, rule.apply(value))
            }),
        }
    }

    pub fn local(&self) -> &'static str {
        self.local
    }

    pub fn wire(&self) -> &'static str {
        self.wire
    }

    /// Run the rule against `wire` and store the result in `model`.
    pub fn apply(&self, model: &mut M, wire: &Map<String, Value>) {
        (self.apply)(model, wire.get(self.wire))
    }
}

/// The set of local fields a deserialization is restricted to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttributeFilter(BTreeSet<String>);

impl AttributeFilter {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    /// Build a filter from untyped input, which must be an array of strings.
    pub fn from_value(value: &Value) -> Result<Self, ModelError> {
        let invalid = || ModelError::InvalidFilter {
            found: value.to_string(),
        };
        let items = value.as_array().ok_or_else(invalid)?;
        items
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
            .collect::<Result<BTreeSet<_>, _>>()
            .map(Self)
    }

    pub fn allows(&self, local: &str) -> bool {
        self.0.contains(local)
    }
}

impl TryFrom<&Value> for AttributeFilter {
    type Error = ModelError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

/// Models which convert to and from wire JSON through declared field maps.
///
/// `Default` must produce a bare instance: deserialization starts from it instead of from any
/// validating constructor, since wire payloads are routinely partial.
pub trait Convertible: Default + Sized + 'static {
    /// Wire field to local field, for serialization. Rebuilt on every call.
    fn serialize_map(&self) -> Vec<SerializeField<Self>>;

    /// Local field to wire rule, for deserialization. Rebuilt on every call.
    fn deserialize_map() -> Vec<DeserializeField<Self>>;

    /// The wire form of this model. Absent fields are omitted, never emitted as `null`.
    fn serialize(&self) -> Map<String, Value> {
        self.serialize_map()
            .iter()
            .filter_map(|field| field.read(self).map(|value| (field.wire().to_string(), value)))
            .collect()
    }

    /// A fresh instance populated from `wire`.
    fn deserialize(wire: &Map<String, Value>) -> Self {
        let mut model = Self::default();
        model.populate(wire, None);
        model
    }

    /// Populate this instance from `wire`. With a filter, only the local fields it names are
    /// written and all others are left as they are.
    fn populate(&mut self, wire: &Map<String, Value>, only: Option<&AttributeFilter>) -> &mut Self {
        for field in Self::deserialize_map() {
            if only.map_or(true, |only| only.allows(field.local())) {
                field.apply(self, wire);
            }
        }
        self
    }

    /// [Convertible::populate] for untyped input. Both arguments are validated before the instance
    /// is touched.
    fn populate_from_value(
        &mut self,
        wire: &Value,
        only: Option<&Value>,
    ) -> Result<&mut Self, ModelError> {
        let only = only.map(AttributeFilter::from_value).transpose()?;
        let wire = wire.as_object().ok_or_else(|| ModelError::NotAnObject {
            found: wire.to_string(),
        })?;
        Ok(self.populate(wire, only.as_ref()))
    }
}
