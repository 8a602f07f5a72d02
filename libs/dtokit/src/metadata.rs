//! Field metadata resolution.
//!
//! Turns a type's [`Schema`] into the per-field rule set the engine runs
//! on. The result is a pure function of the type, so it is cached per type
//! unless the engine config turns caching off.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config;
use crate::dto::Dto;
use crate::error::DtoError;
use crate::json_string::JsonString;
use crate::rule::Convert;
use crate::schema::{DefaultFn, FieldDecl, Param, Schema};
use crate::types::TypeSet;
use crate::value::Value;

/// Which default applies when a field's raw key is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultKind {
    Constructor,
    Property,
    Literal,
    Generator,
    Null,
    Required,
}

/// Default value policy of one field. Exactly one applies; see
/// [`resolve_schema`] for the order.
#[derive(Debug, Clone, Copy)]
pub enum DefaultPolicy {
    /// Default of the constructor parameter.
    Constructor(DefaultFn),
    /// Initial value of a field set after construction.
    Property(DefaultFn),
    /// `default = ...` rule.
    Literal(DefaultFn),
    /// `default_with = ...` rule, invoked per use.
    Generator(DefaultFn),
    /// Nullable field without other default.
    Null,
    /// No default, absence is an error.
    Required,
}

impl DefaultPolicy {
    pub fn kind(&self) -> DefaultKind {
        match self {
            DefaultPolicy::Constructor(_) => DefaultKind::Constructor,
            DefaultPolicy::Property(_) => DefaultKind::Property,
            DefaultPolicy::Literal(_) => DefaultKind::Literal,
            DefaultPolicy::Generator(_) => DefaultKind::Generator,
            DefaultPolicy::Null => DefaultKind::Null,
            DefaultPolicy::Required => DefaultKind::Required,
        }
    }

    /// Produce the default value, or `MissingProperty` for required fields.
    pub fn resolve(&self, type_name: &str, field: &str) -> Result<Value, DtoError> {
        match self {
            DefaultPolicy::Constructor(f)
            | DefaultPolicy::Property(f)
            | DefaultPolicy::Literal(f)
            | DefaultPolicy::Generator(f) => Ok(f()),
            DefaultPolicy::Null => Ok(Value::Null),
            DefaultPolicy::Required => Err(DtoError::missing_property(type_name, field)),
        }
    }
}

/// Policies compare by kind; default functions have no meaningful identity.
impl PartialEq for DefaultPolicy {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind()
    }
}

/// Resolved rules of one field.
#[derive(Debug, PartialEq)]
pub struct FieldMeta {
    pub name: &'static str,
    /// Key in raw data; the field name unless renamed.
    pub raw_key: &'static str,
    /// Declared types, `null` included for nullable fields.
    pub accepted_types: TypeSet,
    pub converter: Convert,
    pub default_policy: DefaultPolicy,
    pub json_string: Option<JsonString>,
    pub ignored: bool,
    pub omit_null: bool,
    pub bound_to_constructor: bool,
}

/// Resolved rules of a type.
#[derive(Debug, PartialEq)]
pub struct TypeMeta {
    pub type_name: &'static str,
    /// Declaration order.
    pub fields: Vec<FieldMeta>,
    /// Constructor parameter names in call order.
    pub constructor: Vec<&'static str>,
}

impl TypeMeta {
    pub fn field(&self, name: &str) -> Option<&FieldMeta> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Resolve every field of `schema`.
///
/// Per field, in order: constructor binding by parameter name, attached
/// rules, accepted types, converter. The default policy is the first of:
/// constructor default, property default, `default` literal,
/// `default_with` generator, `null` for nullable fields, required.
///
/// An ignored field bound to a constructor parameter is an
/// `InvalidFieldDeclaration`; a converter rule that does not resolve is
/// `UnsupportedConverter`.
pub fn resolve_schema(type_name: &'static str, schema: Schema) -> Result<TypeMeta, DtoError> {
    let Schema {
        fields: decls,
        constructor,
    } = schema;

    let mut fields = Vec::with_capacity(decls.len());
    for decl in decls {
        let param = constructor.iter().find(|p| p.name == decl.name);
        let path = format!("{type_name}.{}", decl.name);

        if decl.rules.ignore && param.is_some() {
            return Err(DtoError::InvalidFieldDeclaration(format!(
                "{path}: ignored field is bound to a constructor parameter"
            )));
        }

        let converter = match &decl.rules.convert {
            Some(rule) if !decl.rules.ignore => rule
                .bind(decl.types.clone())
                .map_err(|e| e.with_context(&path))?,
            _ => Convert::fallback(decl.types.clone()),
        };
        let default_policy = default_policy(param, &decl);

        tracing::trace!(
            dto = type_name,
            field = decl.name,
            types = %decl.types,
            converter = converter.name(),
            default = ?default_policy.kind(),
            "field resolved"
        );

        fields.push(FieldMeta {
            name: decl.name,
            raw_key: decl.rules.rename.unwrap_or(decl.name),
            accepted_types: decl.types,
            converter,
            default_policy,
            json_string: decl.rules.json_string,
            ignored: decl.rules.ignore,
            omit_null: decl.rules.omit_null,
            bound_to_constructor: param.is_some(),
        });
    }

    Ok(TypeMeta {
        type_name,
        fields,
        constructor: constructor.iter().map(|p| p.name).collect(),
    })
}

fn default_policy(param: Option<&Param>, decl: &FieldDecl) -> DefaultPolicy {
    if let Some(f) = param.and_then(|p| p.default) {
        return DefaultPolicy::Constructor(f);
    }
    if let (None, Some(f)) = (param, decl.property_default) {
        return DefaultPolicy::Property(f);
    }
    if let Some(f) = decl.rules.default {
        return DefaultPolicy::Literal(f);
    }
    if let Some(f) = decl.rules.default_with {
        return DefaultPolicy::Generator(f);
    }
    if decl.types.accepts_null() {
        return DefaultPolicy::Null;
    }
    DefaultPolicy::Required
}

// ---------------------------------------------------------------------------
// Per-type cache
// ---------------------------------------------------------------------------

type Cache = HashMap<TypeId, Arc<TypeMeta>>;

static CACHE: LazyLock<RwLock<Cache>> = LazyLock::new(|| RwLock::new(HashMap::new()));

fn read_cache() -> RwLockReadGuard<'static, Cache> {
    match CACHE.read() {
        Ok(g) => g,
        Err(poisoned) => {
            tracing::warn!("metadata cache read lock was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

fn write_cache() -> RwLockWriteGuard<'static, Cache> {
    match CACHE.write() {
        Ok(g) => g,
        Err(poisoned) => {
            tracing::warn!("metadata cache write lock was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

/// Metadata of `T`, from the cache when enabled.
pub fn resolve<T: Dto>() -> Result<Arc<TypeMeta>, DtoError> {
    if !config::current().cache_metadata {
        return build::<T>().map(Arc::new);
    }

    let id = TypeId::of::<T>();
    let cached = read_cache().get(&id).cloned();
    if let Some(meta) = cached {
        return Ok(meta);
    }

    let built = Arc::new(build::<T>()?);
    let meta = write_cache().entry(id).or_insert(built).clone();
    tracing::debug!(dto = T::NAME, fields = meta.fields.len(), "metadata cached");
    Ok(meta)
}

/// Metadata of `T`, always rebuilt from its schema.
pub fn resolve_fresh<T: Dto>() -> Result<TypeMeta, DtoError> {
    build::<T>()
}

fn build<T: Dto>() -> Result<TypeMeta, DtoError> {
    let meta = resolve_schema(T::NAME, T::schema())?;
    tracing::debug!(
        dto = T::NAME,
        fields = meta.fields.len(),
        params = meta.constructor.len(),
        "metadata resolved"
    );
    Ok(meta)
}

/// Drop every cached entry.
pub fn clear_cache() {
    write_cache().clear();
}
