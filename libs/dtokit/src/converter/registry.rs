//! Process-wide table of named converters.
//!
//! Rules may refer to a converter by name instead of by type; the name is
//! looked up here when the rule is bound. The table starts with the
//! built-ins under `default`, `array`, `map` and `datetime`.

use std::collections::HashMap;
use std::sync::{LazyLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::converter::{
    ArrayConverter, BuildConverter, DateTimeConverter, DefaultConverter, MapConverter,
};
use crate::error::DtoError;
use crate::rule::ConverterRef;

static REGISTRY: LazyLock<RwLock<HashMap<String, ConverterRef>>> = LazyLock::new(|| {
    let builtins = [
        ("default", ConverterRef::of::<DefaultConverter>()),
        ("array", ConverterRef::of::<ArrayConverter>()),
        ("map", ConverterRef::of::<MapConverter>()),
        ("datetime", ConverterRef::of::<DateTimeConverter>()),
    ];
    RwLock::new(
        builtins
            .into_iter()
            .map(|(name, converter)| (name.to_string(), converter))
            .collect(),
    )
});

fn read() -> RwLockReadGuard<'static, HashMap<String, ConverterRef>> {
    match REGISTRY.read() {
        Ok(g) => g,
        Err(poisoned) => {
            tracing::warn!("converter registry read lock was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

fn write() -> RwLockWriteGuard<'static, HashMap<String, ConverterRef>> {
    match REGISTRY.write() {
        Ok(g) => g,
        Err(poisoned) => {
            tracing::warn!("converter registry write lock was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

/// Register `converter` under `name`, replacing any previous entry.
///
/// Only typed references can be registered; a name pointing at another
/// name is rejected with `UnsupportedConverter`.
pub fn register(name: impl Into<String>, converter: ConverterRef) -> Result<(), DtoError> {
    let name = name.into();
    if let ConverterRef::Named(target) = &converter {
        return Err(DtoError::UnsupportedConverter(format!(
            "'{name}' must register a converter type, not the name '{target}'"
        )));
    }
    tracing::info!(name = %name, converter = converter.name(), "converter registered");
    write().insert(name, converter);
    Ok(())
}

/// Register converter type `C` under `name`.
pub fn register_type<C: BuildConverter>(name: impl Into<String>) {
    let name = name.into();
    let converter = ConverterRef::of::<C>();
    tracing::info!(name = %name, converter = converter.name(), "converter registered");
    write().insert(name, converter);
}

/// Converter registered under `name`.
pub fn lookup(name: &str) -> Result<ConverterRef, DtoError> {
    read()
        .get(name)
        .cloned()
        .ok_or_else(|| DtoError::UnsupportedConverter(format!("no converter named '{name}'")))
}

pub fn is_registered(name: &str) -> bool {
    read().contains_key(name)
}

/// Registered names, sorted.
pub fn names() -> Vec<String> {
    let mut names: Vec<String> = read().keys().cloned().collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn builtins_are_present() {
        for name in ["default", "array", "map", "datetime"] {
            assert!(is_registered(name), "{name}");
        }
        assert_eq!(lookup("map").unwrap().name(), "MapConverter");
    }

    #[test]
    fn names_cannot_alias_names() {
        let err = register("alias", ConverterRef::named("array")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedConverter);
        assert!(!is_registered("alias"));
    }

    #[test]
    fn registered_types_resolve() {
        register_type::<ArrayConverter>("registry-test-list");
        assert_eq!(
            lookup("registry-test-list").unwrap(),
            ConverterRef::of::<ArrayConverter>()
        );
        assert!(names().contains(&"registry-test-list".to_string()));
        assert_eq!(lookup("nope").unwrap_err().kind(), ErrorKind::UnsupportedConverter);
    }
}
