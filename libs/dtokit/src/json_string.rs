use std::ops::BitOr;

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;

use crate::config;
use crate::error::DtoError;
use crate::value::{raw_kind, Raw};

/// Encoding flags of a JSON-string field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonFlags(u32);

impl JsonFlags {
    pub const NONE: JsonFlags = JsonFlags(0);
    /// Write `/` as is instead of `\/`.
    pub const UNESCAPED_SLASHES: JsonFlags = JsonFlags(1);
    /// Write non-ASCII characters as is instead of `\uXXXX`.
    pub const UNESCAPED_UNICODE: JsonFlags = JsonFlags(2);
    /// Indent with four spaces, one member per line.
    pub const PRETTY_PRINT: JsonFlags = JsonFlags(4);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: JsonFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl Default for JsonFlags {
    fn default() -> Self {
        JsonFlags::UNESCAPED_UNICODE | JsonFlags::UNESCAPED_SLASHES
    }
}

impl BitOr for JsonFlags {
    type Output = JsonFlags;

    fn bitor(self, rhs: JsonFlags) -> JsonFlags {
        JsonFlags(self.0 | rhs.0)
    }
}

/// Raw representation of a field is JSON text.
///
/// `from_array` decodes the text before the converter runs, `to_array`
/// encodes the converter output, `null` included (as the text `null`).
/// A raw `null` decodes to `null`. Nesting deeper than `max_depth` is
/// rejected both ways; without an explicit `max_depth` the configured
/// default applies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonString {
    /// Empty collections encode as `{}` instead of `[]`.
    pub empty_item_is_array: bool,
    pub max_depth: Option<usize>,
    pub flags: JsonFlags,
}

impl JsonString {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn empty_item_is_array(mut self, yes: bool) -> Self {
        self.empty_item_is_array = yes;
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn flags(mut self, flags: JsonFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn effective_max_depth(&self) -> usize {
        self.max_depth
            .unwrap_or_else(|| config::current().json_max_depth)
    }

    /// Decode the JSON text held by `raw`.
    pub fn decode(&self, raw: Raw, field: &str) -> Result<Raw, DtoError> {
        let text = match raw {
            Raw::Null => return Ok(Raw::Null),
            Raw::String(text) => text,
            other => {
                return Err(DtoError::type_mismatch(
                    field,
                    format!("expected JSON string, got {}", raw_kind(&other)),
                ));
            }
        };
        let max = self.effective_max_depth();
        let found = text_depth(&text);
        if found > max {
            return Err(DtoError::type_mismatch(field, depth_exceeded(found, max)));
        }

        // Depth already checked on the text.
        let mut de = serde_json::Deserializer::from_str(&text);
        de.disable_recursion_limit();
        Raw::deserialize(&mut de)
            .and_then(|decoded| de.end().map(|()| decoded))
            .map_err(|e| DtoError::type_mismatch(field, format!("malformed JSON: {e}")))
    }

    /// Encode `raw` as JSON text.
    pub fn encode(&self, raw: Raw) -> Result<Raw, DtoError> {
        if is_empty_collection(&raw) {
            let text = if self.empty_item_is_array { "{}" } else { "[]" };
            return Ok(Raw::String(text.to_string()));
        }
        self.check_depth(&raw)?;

        let text = if self.flags.contains(JsonFlags::PRETTY_PRINT) {
            let mut buf = Vec::new();
            let mut ser =
                serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
            raw.serialize(&mut ser)?;
            String::from_utf8(buf)
                .map_err(|e| DtoError::TypeMismatch(format!("encoded JSON is not UTF-8: {e}")))?
        } else {
            serde_json::to_string(&raw)?
        };
        Ok(Raw::String(self.escape(text)))
    }

    fn check_depth(&self, raw: &Raw) -> Result<(), DtoError> {
        let max = self.effective_max_depth();
        let found = depth(raw);
        if found > max {
            return Err(DtoError::TypeMismatch(depth_exceeded(found, max)));
        }
        Ok(())
    }

    /// Apply the escapes the flags leave enabled. `/` and non-ASCII only
    /// occur inside string literals of encoded JSON.
    fn escape(&self, text: String) -> String {
        let slashes = !self.flags.contains(JsonFlags::UNESCAPED_SLASHES);
        let unicode = !self.flags.contains(JsonFlags::UNESCAPED_UNICODE);
        if !slashes && !unicode {
            return text;
        }
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            match c {
                '/' if slashes => out.push_str("\\/"),
                c if unicode && !c.is_ascii() => {
                    let mut units = [0u16; 2];
                    for unit in c.encode_utf16(&mut units) {
                        out.push_str(&format!("\\u{unit:04x}"));
                    }
                }
                c => out.push(c),
            }
        }
        out
    }
}

fn is_empty_collection(raw: &Raw) -> bool {
    match raw {
        Raw::Array(items) => items.is_empty(),
        Raw::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn depth_exceeded(found: usize, max: usize) -> String {
    format!("JSON nesting depth {found} exceeds maximum {max}")
}

/// Container nesting depth of JSON text, scanned without parsing.
/// Brackets inside string literals do not count.
fn text_depth(text: &str) -> usize {
    let (mut depth, mut max) = (0usize, 0usize);
    let (mut in_string, mut escaped) = (false, false);
    for b in text.bytes() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                max = max.max(depth);
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    max
}

/// Container nesting depth; scalars are 0.
fn depth(raw: &Raw) -> usize {
    match raw {
        Raw::Array(items) => 1 + items.iter().map(depth).max().unwrap_or(0),
        Raw::Object(map) => 1 + map.values().map(depth).max().unwrap_or(0),
        _ => 0,
    }
}
