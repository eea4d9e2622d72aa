// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the Net library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

use crate::types::Params;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry budget used when none is configured.
pub const DEFAULT_RETRY_LIMIT: u32 = 4;

/// Delay between two attempts of the same call, in milliseconds.
pub const DEFAULT_BACKOFF_MS: u64 = 500;

/// Settings shared by every executor built from it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Attempts allowed after transport failures.
    pub retry_limit: u32,
    pub backoff_ms: u64,
    /// Per-exchange timeout, enforced by the transport.
    pub timeout_ms: Option<u64>,
    /// Headers sent with every request; per-call headers win on conflict.
    pub headers: Params,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            retry_limit: DEFAULT_RETRY_LIMIT,
            backoff_ms: DEFAULT_BACKOFF_MS,
            timeout_ms: None,
            headers: Params::new(),
        }
    }
}

impl ExecutorConfig {
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}
