// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the Net library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Dictionaries whose keys double as named fields.
//!
//! An [AttrMap] holds two kinds of slots: *attributes*, which are declared explicitly and live
//! outside the dictionary (connection host, auth token and similar private state), and *entries*,
//! which form the dictionary proper. Every read, write and delete consults attributes first, so an
//! attribute always shadows an entry with the same name. Only entries take part in conversion to
//! and from plain JSON.
//!
//! A locked map fixes its entry key set at construction. Existing keys may be overwritten, new
//! keys are rejected (except [RESERVED_KEY]) and nothing can be deleted.

use crate::error::MapError;
use crate::types::fmt_as_json;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display, Formatter};

/// The one key a locked map accepts even if it was not part of the initial key set.
pub const RESERVED_KEY: &str = "device_id";

/// A value stored in an [AttrMap].
///
/// Nested JSON objects become nested maps so they can be addressed the same way as the top level.
#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
    /// Any non-container JSON value.
    Scalar(Value),
    List(Vec<AttrValue>),
    Map(AttrMap),
}

impl AttrValue {
    /// Wrap a plain JSON value, turning every object (including those inside arrays) into an
    /// [AttrMap].
    pub fn from_plain(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::Map(AttrMap::from_plain_mapping(map)),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from_plain).collect()),
            scalar => Self::Scalar(scalar),
        }
    }

    /// The plain JSON form of this value.
    pub fn to_plain(&self) -> Value {
        match self {
            Self::Scalar(value) => value.clone(),
            Self::List(items) => Value::Array(items.iter().map(Self::to_plain).collect()),
            Self::Map(map) => Value::Object(map.to_plain_mapping()),
        }
    }

    pub fn as_map(&self) -> Option<&AttrMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Self::Scalar(value) => Some(value),
            _ => None,
        }
    }
}

impl From<Value> for AttrValue {
    fn from(value: Value) -> Self {
        Self::from_plain(value)
    }
}

impl From<AttrMap> for AttrValue {
    fn from(map: AttrMap) -> Self {
        Self::Map(map)
    }
}

/// Dictionary with attribute-style access. See the module documentation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttrMap {
    attributes: BTreeMap<String, AttrValue>,
    entries: BTreeMap<String, AttrValue>,
    // Allowed entry keys, for locked maps.
    locked: Option<BTreeSet<String>>,
}

impl AttrMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// A locked map whose entry keys are exactly those of `entries`, plus [RESERVED_KEY].
    pub fn locked<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, AttrValue)>,
        K: Into<String>,
    {
        let entries: BTreeMap<String, AttrValue> =
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        let allowed = entries.keys().cloned().collect();
        Self {
            attributes: BTreeMap::new(),
            entries,
            locked: Some(allowed),
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked.is_some()
    }

    /// Declare a real attribute. Attributes shadow entries and are never serialized.
    ///
    /// Declaring is how attributes come into existence; [AttrMap::set] only ever writes to an
    /// attribute that already exists.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Result<&AttrValue, MapError> {
        self.attributes
            .get(key)
            .or_else(|| self.entries.get(key))
            .ok_or_else(|| MapError::MissingKey {
                key: key.to_string(),
            })
    }

    pub fn get_mut(&mut self, key: &str) -> Result<&mut AttrValue, MapError> {
        if self.attributes.contains_key(key) {
            return self
                .attributes
                .get_mut(key)
                .ok_or_else(|| MapError::MissingKey {
                    key: key.to_string(),
                });
        }
        self.entries
            .get_mut(key)
            .ok_or_else(|| MapError::MissingKey {
                key: key.to_string(),
            })
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Result<(), MapError> {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.attributes.get_mut(&key) {
            *slot = value;
            return Ok(());
        }
        if let Some(allowed) = &self.locked {
            if !allowed.contains(&key) && key != RESERVED_KEY {
                return Err(MapError::OperationNotAllowed { key });
            }
        }
        self.entries.insert(key, value);
        Ok(())
    }

    /// Remove an entry, or failing that an attribute.
    pub fn delete(&mut self, key: &str) -> Result<AttrValue, MapError> {
        if self.locked.is_some() {
            return Err(MapError::OperationNotAllowed {
                key: key.to_string(),
            });
        }
        self.entries
            .remove(key)
            .or_else(|| self.attributes.remove(key))
            .ok_or_else(|| MapError::NotFound {
                key: key.to_string(),
            })
    }

    /// True for attributes and for entries.
    pub fn contains(&self, key: &str) -> bool {
        self.attributes.contains_key(key) || self.entries.contains_key(key)
    }

    /// Entry keys, attributes excluded.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entries as a plain JSON object, recursively. Attributes are left out.
    pub fn to_plain_mapping(&self) -> Map<String, Value> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.to_plain()))
            .collect()
    }

    /// Wrap a plain JSON object, recursively. The result is unlocked and has no attributes.
    pub fn from_plain_mapping(map: Map<String, Value>) -> Self {
        Self {
            attributes: BTreeMap::new(),
            entries: map
                .into_iter()
                .map(|(k, v)| (k, AttrValue::from_plain(v)))
                .collect(),
            locked: None,
        }
    }
}

impl Serialize for AttrMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_plain_mapping().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AttrMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Map::<String, Value>::deserialize(deserializer).map(Self::from_plain_mapping)
    }
}

impl Display for AttrMap {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        fmt_as_json(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn plain(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn attributes_shadow_entries() {
        let mut map = AttrMap::from_plain_mapping(plain(json!({"host": "entry", "name": "r1"})))
            .with_attribute("host", json!("https://api.example.com"));

        assert_eq!(
            map.get("host").unwrap(),
            &AttrValue::Scalar(json!("https://api.example.com"))
        );

        map.set("host", json!("https://other.example.com")).unwrap();
        assert_eq!(
            map.get("host").unwrap(),
            &AttrValue::Scalar(json!("https://other.example.com"))
        );
        // The entry underneath is untouched and still serializes.
        assert_eq!(map.to_plain_mapping()["host"], json!("entry"));
    }

    #[test]
    fn attributes_are_invisible_to_plain_form() {
        let map = AttrMap::new().with_attribute("auth_token", json!("secret"));
        assert!(map.contains("auth_token"));
        assert!(map.to_plain_mapping().is_empty());
        assert_eq!(map.to_string(), "{}");
    }

    #[test]
    fn missing_keys() {
        let mut map = AttrMap::new();
        assert_eq!(
            map.get("nope"),
            Err(MapError::MissingKey {
                key: "nope".into()
            })
        );
        assert_eq!(
            map.delete("nope"),
            Err(MapError::NotFound {
                key: "nope".into()
            })
        );
        assert!(!map.contains("nope"));
    }

    #[test]
    fn delete_prefers_entries_then_attributes() {
        let mut map = AttrMap::from_plain_mapping(plain(json!({"token": 1})))
            .with_attribute("token", json!(2));
        assert_eq!(map.delete("token").unwrap(), AttrValue::Scalar(json!(1)));
        assert_eq!(map.delete("token").unwrap(), AttrValue::Scalar(json!(2)));
        assert!(!map.contains("token"));
    }

    #[test]
    fn nested_objects_inside_lists_become_maps() {
        let map = AttrMap::from_plain_mapping(plain(json!({
            "devices": [{"name": "a"}, 3, [{"name": "b"}]],
        })));
        let devices = match map.get("devices").unwrap() {
            AttrValue::List(items) => items,
            other => panic!("unexpected {:?}", other),
        };
        assert!(devices[0].as_map().is_some());
        assert_eq!(devices[1].as_scalar(), Some(&json!(3)));
        match &devices[2] {
            AttrValue::List(inner) => assert!(inner[0].as_map().is_some()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn plain_round_trip_three_levels() {
        let original = json!({
            "a": {"b": {"c": [1, {"d": null}, "e"]}},
            "f": [[{"g": true}]],
            "h": 1.5,
        });
        let map = AttrMap::from_plain_mapping(plain(original.clone()));
        assert_eq!(Value::Object(map.to_plain_mapping()), original);
        assert_eq!(AttrMap::from_plain_mapping(map.to_plain_mapping()), map);
    }

    #[test]
    fn locked_map_enforces_key_set() {
        let mut map = AttrMap::locked(vec![
            ("a", AttrValue::Scalar(json!(0))),
            ("b", AttrValue::Scalar(json!(0))),
        ]);
        assert!(map.is_locked());

        map.set("a", json!(1)).unwrap();
        assert_eq!(map.get("a").unwrap(), &AttrValue::Scalar(json!(1)));

        assert_eq!(
            map.set("c", json!(1)),
            Err(MapError::OperationNotAllowed { key: "c".into() })
        );
        assert!(!map.contains("c"));

        map.set(RESERVED_KEY, json!(1)).unwrap();
        assert!(map.contains(RESERVED_KEY));

        assert_eq!(
            map.delete("a"),
            Err(MapError::OperationNotAllowed { key: "a".into() })
        );
        assert_eq!(
            map.delete("zzz"),
            Err(MapError::OperationNotAllowed { key: "zzz".into() })
        );
    }

    #[test]
    fn locked_map_writes_through_to_attributes() {
        let mut map = AttrMap::locked(Vec::<(String, AttrValue)>::new())
            .with_attribute("host", json!("h1"));
        map.set("host", json!("h2")).unwrap();
        assert_eq!(map.get("host").unwrap(), &AttrValue::Scalar(json!("h2")));
        assert!(map.is_empty());
    }

    #[test]
    fn serde_goes_through_plain_form() {
        let map: AttrMap = serde_json::from_value(json!({"x": {"y": 1}})).unwrap();
        assert!(map.get("x").unwrap().as_map().is_some());
        assert_eq!(serde_json::to_value(&map).unwrap(), json!({"x": {"y": 1}}));
    }
}
