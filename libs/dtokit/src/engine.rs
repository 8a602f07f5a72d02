//! The two conversion pipelines.

use std::borrow::Cow;
use std::collections::HashMap;

use crate::dto::Dto;
use crate::error::DtoError;
use crate::metadata;
use crate::value::{raw_kind, Raw, RawMap, Value};

/// Build a `T` from untyped data.
///
/// For each field that is not ignored, in declaration order: an absent raw
/// key takes the field's default (required fields fail with
/// `MissingProperty`); a present one is JSON-decoded when the field holds
/// JSON text, then converted. Constructor parameters are filled in order up
/// to the first one without a value; later parameters are left to the
/// constructor's own defaults. Remaining fields are assigned afterwards.
pub fn from_array<T: Dto>(raw: &Raw) -> Result<T, DtoError> {
    let meta = metadata::resolve::<T>()?;

    let input: Cow<'_, RawMap> = match raw {
        Raw::Object(map) => Cow::Borrowed(map),
        Raw::Array(items) => Cow::Owned(
            items
                .iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v.clone()))
                .collect(),
        ),
        other => {
            return Err(DtoError::TypeMismatch(format!(
                "{}: expected map, got {}",
                T::NAME,
                raw_kind(other)
            )));
        }
    };

    let mut bound: HashMap<&'static str, Value> = HashMap::new();
    let mut lazy: Vec<(&'static str, Value)> = Vec::new();

    for field in meta.fields.iter().filter(|f| !f.ignored) {
        let value = match input.get(field.raw_key) {
            None => field.default_policy.resolve(meta.type_name, field.name)?,
            Some(raw) => {
                let raw = match &field.json_string {
                    Some(json) => json.decode(raw.clone(), field.name)?,
                    None => raw.clone(),
                };
                field.converter.convert_from(raw, field.name)?
            }
        };
        if field.bound_to_constructor {
            bound.insert(field.name, value);
        } else {
            lazy.push((field.name, value));
        }
    }

    let mut args = Vec::with_capacity(meta.constructor.len());
    for param in &meta.constructor {
        match bound.remove(param) {
            Some(value) => args.push(value),
            None => break,
        }
    }
    tracing::trace!(
        dto = T::NAME,
        args = args.len(),
        params = meta.constructor.len(),
        lazy = lazy.len(),
        "constructing"
    );

    let mut obj = T::construct(args)?;
    for (name, value) in lazy {
        obj.assign(name, value)?;
    }
    Ok(obj)
}

/// Lower `obj` to untyped data, leaving out the `except` fields.
///
/// Keys follow field declaration order; ignored fields never appear, and a
/// `null` result is dropped for fields marked `omit_null`.
pub fn to_array<T: Dto>(obj: &T, except: &[&str]) -> Result<Raw, DtoError> {
    let meta = metadata::resolve::<T>()?;

    let mut out = RawMap::new();
    for field in meta
        .fields
        .iter()
        .filter(|f| !f.ignored && !except.contains(&f.name))
    {
        let value = obj.read(field.name)?;
        let mut raw = field
            .converter
            .convert_to(value)
            .map_err(|e| e.with_context(field.name))?;
        if let Some(json) = &field.json_string {
            raw = json.encode(raw).map_err(|e| e.with_context(field.name))?;
        }
        if raw.is_null() && field.omit_null {
            continue;
        }
        out.insert(field.raw_key.to_string(), raw);
    }
    Ok(Raw::Object(out))
}
