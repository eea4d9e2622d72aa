// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the Net library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

use fmt::Formatter;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

pub use surf::http::Method;

/// Header and query parameter sets. Ordered so requests are reproducible.
pub type Params = BTreeMap<String, String>;

/// Body of an outgoing request.
#[derive(Clone, Debug, PartialEq)]
pub enum Body {
    /// No body at all.
    Empty,
    /// A JSON-encoded body.
    Json(Value),
    /// Bytes sent as-is.
    Raw(Vec<u8>),
}

impl Body {
    /// A JSON body, or no body when there is no payload.
    pub fn json(payload: Option<Value>) -> Self {
        match payload {
            Some(value) => Self::Json(value),
            None => Self::Empty,
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::Empty
    }
}

/// One HTTP exchange as handed to a [crate::client::Transport].
#[derive(Clone, Debug, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Params,
    pub query: Params,
    pub body: Body,
}

/// A response as received, before any envelope or status interpretation.
///
/// `bytes` is the body exactly as received. `body` is its text form, with invalid UTF-8 replaced,
/// so binary downloads survive intact in `bytes`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
    #[serde(default)]
    pub bytes: Vec<u8>,
    pub headers: Params,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        Self {
            status,
            bytes: body.as_bytes().to_vec(),
            body,
            headers: Params::new(),
        }
    }

    pub fn from_bytes(status: u16, bytes: Vec<u8>) -> Self {
        Self {
            status,
            body: String::from_utf8_lossy(&bytes).into_owned(),
            bytes,
            headers: Params::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// The filename announced by a `Content-Disposition` header, if there is one.
    ///
    /// An extended `filename*` parameter (RFC 5987) wins over a plain `filename`.
    pub fn attachment_filename(&self) -> Option<String> {
        let disposition = self.header("Content-Disposition")?;
        let mut plain = None;
        for param in disposition_params(disposition).into_iter().skip(1) {
            let (key, value) = match param.split_once('=') {
                Some(pair) => pair,
                None => continue,
            };
            let (key, value) = (key.trim(), value.trim());
            if key.eq_ignore_ascii_case("filename*") {
                if let Some(name) = decode_ext_value(value).filter(|name| !name.is_empty()) {
                    return Some(name);
                }
            } else if key.eq_ignore_ascii_case("filename") && plain.is_none() {
                plain = Some(unquote(value)).filter(|name| !name.is_empty());
            }
        }
        plain
    }
}

// Split a header value on the semicolons that are not inside a quoted string.
fn disposition_params(header: &str) -> Vec<&str> {
    let mut params = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    let mut escaped = false;
    for (i, c) in header.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            ';' if !quoted => {
                params.push(&header[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    params.push(&header[start..]);
    params
}

fn unquote(value: &str) -> String {
    let inner = match value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
        Some(inner) => inner,
        None => return value.to_string(),
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.extend(chars.next()),
            c => out.push(c),
        }
    }
    out
}

// `charset'language'percent-encoded`. Only UTF-8 and ISO-8859-1 are defined.
fn decode_ext_value(value: &str) -> Option<String> {
    let mut parts = value.splitn(3, '\'');
    let charset = parts.next()?;
    let _language = parts.next()?;
    let encoded = parts.next()?.as_bytes();

    let mut bytes = Vec::with_capacity(encoded.len());
    let mut i = 0;
    while i < encoded.len() {
        if encoded[i] == b'%' {
            let hex = encoded.get(i + 1..i + 3)?;
            let hex = std::str::from_utf8(hex).ok()?;
            bytes.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            bytes.push(encoded[i]);
            i += 1;
        }
    }
    if charset.eq_ignore_ascii_case("utf-8") {
        String::from_utf8(bytes).ok()
    } else if charset.eq_ignore_ascii_case("iso-8859-1") {
        Some(bytes.into_iter().map(char::from).collect())
    } else {
        None
    }
}

// Display implementation for types which serialize to JSON. Displays as a valid JSON object.
pub fn fmt_as_json<T: Serialize>(v: &T, f: &mut Formatter<'_>) -> fmt::Result {
    let string = serde_json::to_string(v).map_err(|_| fmt::Error)?;
    write!(f, "{}", string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_ignores_case() {
        let res = RawResponse::new(200, "").with_header("content-type", "application/json");
        assert_eq!(res.header("Content-Type"), Some("application/json"));
        assert_eq!(res.header("Accept"), None);
    }

    #[test]
    fn attachment_filename_quoted_and_bare() {
        let quoted = RawResponse::new(200, "")
            .with_header("Content-Disposition", r#"attachment; filename="bag.tar.gz""#);
        assert_eq!(quoted.attachment_filename().as_deref(), Some("bag.tar.gz"));

        let bare =
            RawResponse::new(200, "").with_header("Content-Disposition", "attachment; filename=log.txt");
        assert_eq!(bare.attachment_filename().as_deref(), Some("log.txt"));

        let none = RawResponse::new(200, "").with_header("Content-Disposition", "inline");
        assert_eq!(none.attachment_filename(), None);
    }

    #[test]
    fn success_range() {
        assert!(RawResponse::new(204, "").is_success());
        assert!(!RawResponse::new(302, "").is_success());
        assert!(!RawResponse::new(500, "").is_success());
    }

    #[test]
    fn attachment_filename_with_separators_and_escapes() {
        let semicolon = RawResponse::new(200, "")
            .with_header("Content-Disposition", r#"attachment; filename="run;2.bag""#);
        assert_eq!(semicolon.attachment_filename().as_deref(), Some("run;2.bag"));

        let escaped = RawResponse::new(200, "")
            .with_header("Content-Disposition", r#"attachment; filename="say \"hi\".txt""#);
        assert_eq!(escaped.attachment_filename().as_deref(), Some(r#"say "hi".txt"#));
    }

    #[test]
    fn attachment_filename_prefers_extended_parameter() {
        let res = RawResponse::new(200, "").with_header(
            "content-disposition",
            "attachment; filename=\"fallback.pdf\"; filename*=UTF-8''r%C3%A9sum%C3%A9.pdf",
        );
        assert_eq!(res.attachment_filename().as_deref(), Some("résumé.pdf"));

        let latin1 = RawResponse::new(200, "")
            .with_header("Content-Disposition", "attachment; filename*=iso-8859-1'en'%E9t%E9.log");
        assert_eq!(latin1.attachment_filename().as_deref(), Some("été.log"));

        let broken = RawResponse::new(200, "").with_header(
            "Content-Disposition",
            "attachment; filename*=UTF-8''%ZZ; filename=plain.txt",
        );
        assert_eq!(broken.attachment_filename().as_deref(), Some("plain.txt"));
    }

    #[test]
    fn binary_bodies_keep_their_bytes() {
        let res = RawResponse::from_bytes(200, vec![0x1f, 0x8b, 0xff]);
        assert_eq!(res.bytes, vec![0x1f, 0x8b, 0xff]);
        assert_eq!(res.body.chars().last(), Some(char::REPLACEMENT_CHARACTER));

        let text = RawResponse::new(200, "{}");
        assert_eq!(text.bytes, b"{}".to_vec());
    }
}
