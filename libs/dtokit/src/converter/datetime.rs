use std::fmt::Write as _;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, SubsecRound};

use crate::converter::{bad_argument, BuildConverter, Converter};
use crate::error::DtoError;
use crate::rule::ConverterArg;
use crate::types::TypeSet;
use crate::value::{raw_kind, Raw, Value};

/// Inputs with an explicit offset, tried after RFC 3339.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];

/// Inputs without offset, read as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Date-time strings ↔ `Value::DateTime`.
///
/// Arguments: `[precision: Int]? [format: Str]?`, precision in `0..=9`
/// fractional digits (default 6), format in strftime syntax (default
/// [`Self::YMD_HIS`]). The format is tried first when parsing and always
/// used when writing; output keeps the wall-clock time of the parsed offset.
pub struct DateTimeConverter {
    types: TypeSet,
    precision: u16,
    format: String,
}

impl DateTimeConverter {
    pub const YMD_HIS: &'static str = "%Y-%m-%d %H:%M:%S";
    pub const YMD_HISU: &'static str = "%Y-%m-%d %H:%M:%S%.6f";
    pub const ISO8601: &'static str = "%Y-%m-%dT%H:%M:%S%:z";
    pub const YMD: &'static str = "%Y-%m-%d";

    pub const DEFAULT_PRECISION: u16 = 6;

    pub fn new(types: TypeSet, precision: u16, format: impl Into<String>) -> Result<Self, DtoError> {
        if precision > 9 {
            return Err(DtoError::UnsupportedConverter(format!(
                "DateTimeConverter precision {precision} is outside 0..=9"
            )));
        }
        let format = format.into();
        if StrftimeItems::new(&format).any(|item| matches!(item, Item::Error)) {
            return Err(DtoError::UnsupportedConverter(format!(
                "DateTimeConverter format '{format}' is not a valid strftime pattern"
            )));
        }
        Ok(Self {
            types,
            precision,
            format,
        })
    }

    pub fn precision(&self) -> u16 {
        self.precision
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    /// Parse `s`, truncating sub-second digits beyond the precision.
    pub fn parse(&self, s: &str) -> Option<DateTime<FixedOffset>> {
        self.parse_exact(s)
            .or_else(|| DateTime::parse_from_rfc3339(s).ok())
            .or_else(|| {
                OFFSET_FORMATS
                    .iter()
                    .find_map(|fmt| DateTime::parse_from_str(s, fmt).ok())
            })
            .or_else(|| {
                NAIVE_FORMATS
                    .iter()
                    .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                    .map(|dt| dt.and_utc().fixed_offset())
            })
            .or_else(|| midnight(s, Self::YMD))
            .map(|dt| dt.trunc_subsecs(self.precision))
    }

    fn parse_exact(&self, s: &str) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_str(s, &self.format)
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(s, &self.format)
                    .ok()
                    .map(|dt| dt.and_utc().fixed_offset())
            })
            .or_else(|| midnight(s, &self.format))
    }

    fn render(&self, dt: &DateTime<FixedOffset>) -> Result<String, DtoError> {
        let mut out = String::new();
        write!(out, "{}", dt.trunc_subsecs(self.precision).format(&self.format)).map_err(|_| {
            DtoError::TypeMismatch(format!("cannot format {dt} with '{}'", self.format))
        })?;
        Ok(out)
    }
}

fn midnight(s: &str, fmt: &str) -> Option<DateTime<FixedOffset>> {
    NaiveDate::parse_from_str(s, fmt)
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN).and_utc().fixed_offset())
}

impl Converter for DateTimeConverter {
    fn convert_from(&self, raw: Raw, field: &str) -> Result<Value, DtoError> {
        match raw {
            Raw::Null if self.types.accepts_null() => Ok(Value::Null),
            Raw::String(s) => self.parse(&s).map(Value::DateTime).ok_or_else(|| {
                DtoError::type_mismatch(field, format!("'{s}' is not a recognised date-time"))
            }),
            other => Err(DtoError::type_mismatch(
                field,
                format!("expected date-time string, got {}", raw_kind(&other)),
            )),
        }
    }

    fn convert_to(&self, value: Value) -> Result<Raw, DtoError> {
        match value {
            Value::Null if self.types.accepts_null() => Ok(Raw::Null),
            Value::DateTime(dt) => self.render(&dt).map(Raw::String),
            other => Err(DtoError::TypeMismatch(format!(
                "expected datetime, got {}",
                other.kind_name()
            ))),
        }
    }
}

impl BuildConverter for DateTimeConverter {
    fn build(types: TypeSet, args: &[ConverterArg]) -> Result<Self, DtoError> {
        let mut rest = args;
        let mut precision = Self::DEFAULT_PRECISION;
        if let Some((ConverterArg::Int(p), tail)) = rest.split_first() {
            precision = u16::try_from(*p).map_err(|_| {
                DtoError::UnsupportedConverter(format!(
                    "DateTimeConverter precision {p} is outside 0..=9"
                ))
            })?;
            rest = tail;
        }
        let mut format = Self::YMD_HIS.to_string();
        if let Some((ConverterArg::Str(f), tail)) = rest.split_first() {
            format = f.clone();
            rest = tail;
        }
        if let Some(arg) = rest.first() {
            return Err(bad_argument("DateTimeConverter", arg));
        }
        Self::new(types, precision, format)
    }
}
