// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the Net library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

#![allow(dead_code)]

use robotics_net::adapters::{enumeration, list_of, nested, verbatim};
use robotics_net::{
    Convertible, DeserializeField, HttpRequest, Lenient, RawResponse, SerializeField, Transport,
    TransportError,
};
use robotics_net::{wire_enum, wire_model};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Transport replaying canned replies in order, recording every request it sees.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<RawResponse, TransportError>>>,
    seen: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Result<RawResponse, TransportError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            seen: Mutex::new(vec![]),
        }
    }

    pub fn seen(&self) -> Vec<HttpRequest> {
        self.seen.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: &HttpRequest) -> Result<RawResponse, TransportError> {
        self.seen.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::connection("script exhausted")))
    }
}

pub fn envelope(data: serde_json::Value) -> RawResponse {
    RawResponse::new(
        200,
        serde_json::json!({"status": "success", "response": {"data": data}}).to_string(),
    )
}

wire_enum! {
    pub enum DeviceStatus {
        Online = "ONLINE",
        Offline = "OFFLINE",
    }
}

wire_enum! {
    pub enum Arch {
        Amd64 = "amd64",
        Arm32 = "arm32v7",
        Arm64 = "arm64v8",
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeviceConfig {
    pub key: Lenient<String>,
    pub value: Lenient<String>,
}

impl Convertible for DeviceConfig {
    fn serialize_map(&self) -> Vec<SerializeField<Self>> {
        vec![
            SerializeField::new("key", "key", |c: &Self| &c.key),
            SerializeField::new("value", "value", |c: &Self| &c.value),
        ]
    }

    fn deserialize_map() -> Vec<DeserializeField<Self>> {
        vec![
            DeserializeField::new("key", verbatim("key"), |c: &mut Self, v| c.key = v),
            DeserializeField::new("value", verbatim("value"), |c: &mut Self, v| c.value = v),
        ]
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Owner {
    pub guid: Lenient<String>,
    pub email: Lenient<String>,
}

impl Convertible for Owner {
    fn serialize_map(&self) -> Vec<SerializeField<Self>> {
        vec![
            SerializeField::new("guid", "guid", |o: &Self| &o.guid),
            SerializeField::new("emailID", "email", |o: &Self| &o.email),
        ]
    }

    fn deserialize_map() -> Vec<DeserializeField<Self>> {
        vec![
            DeserializeField::new("guid", verbatim("guid"), |o: &mut Self, v| o.guid = v),
            DeserializeField::new("email", verbatim("emailID"), |o: &mut Self, v| o.email = v),
        ]
    }
}

wire_model!(DeviceConfig, Owner);

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Device {
    pub uuid: Lenient<String>,
    pub name: Lenient<String>,
    pub status: Lenient<DeviceStatus>,
    pub arch: Lenient<Arch>,
    pub owner: Lenient<Owner>,
    pub config_variables: Lenient<Vec<DeviceConfig>>,
    pub labels: Lenient<Vec<String>>,
}

impl Convertible for Device {
    fn serialize_map(&self) -> Vec<SerializeField<Self>> {
        vec![
            SerializeField::new("uuid", "uuid", |d: &Self| &d.uuid),
            SerializeField::new("name", "name", |d: &Self| &d.name),
            SerializeField::new("status", "status", |d: &Self| &d.status),
            SerializeField::new("arch", "arch", |d: &Self| &d.arch),
            SerializeField::new("owner", "owner", |d: &Self| &d.owner),
            SerializeField::new("config_variables", "config_variables", |d: &Self| {
                &d.config_variables
            }),
            SerializeField::new("labels", "labels", |d: &Self| &d.labels),
        ]
    }

    fn deserialize_map() -> Vec<DeserializeField<Self>> {
        vec![
            DeserializeField::new("uuid", verbatim("uuid"), |d: &mut Self, v| d.uuid = v),
            DeserializeField::new("name", verbatim("name"), |d: &mut Self, v| d.name = v),
            DeserializeField::new("status", enumeration("status"), |d: &mut Self, v| {
                d.status = v
            }),
            DeserializeField::new("arch", enumeration("arch"), |d: &mut Self, v| d.arch = v),
            DeserializeField::new("owner", nested("owner"), |d: &mut Self, v| d.owner = v),
            DeserializeField::new(
                "config_variables",
                list_of("config_variables"),
                |d: &mut Self, v| d.config_variables = v,
            ),
            DeserializeField::new("labels", verbatim("labels"), |d: &mut Self, v| d.labels = v),
        ]
    }
}
