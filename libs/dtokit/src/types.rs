use std::fmt;

use crate::dto::Dto;
use crate::error::DtoError;
use crate::field::FieldValue;
use crate::value::{Object, Raw};

/// One accepted type of a field.
///
/// Type tokens are arbitrary as far as the engine is concerned; only
/// converters interpret them. `Null` is the nullability sentinel, `Mixed`
/// accepts any raw shape unchanged.
#[derive(Clone, PartialEq)]
pub enum TypeToken {
    Null,
    Bool,
    Int,
    Float,
    String,
    DateTime,
    Mixed,
    /// Ordered sequence; element types.
    List(TypeSet),
    /// Keyed collection with string keys; value types.
    Map(TypeSet),
    Enum(EnumType),
    Object(ObjectType),
}

/// Unit enum converted by case name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumType {
    pub name: &'static str,
    pub cases: &'static [&'static str],
}

impl EnumType {
    /// Static case name matching `case`, if any.
    pub fn case(&self, case: &str) -> Option<&'static str> {
        self.cases.iter().copied().find(|c| *c == case)
    }
}

/// Nested typed object. `from_array` recursively builds the nested type.
#[derive(Clone, Copy)]
pub struct ObjectType {
    pub name: &'static str,
    pub from_array: fn(&Raw) -> Result<Box<dyn Object>, DtoError>,
}

impl ObjectType {
    pub fn of<T: Dto>() -> Self {
        Self {
            name: T::NAME,
            from_array: object_from_array::<T>,
        }
    }
}

fn object_from_array<T: Dto>(raw: &Raw) -> Result<Box<dyn Object>, DtoError> {
    Ok(Box::new(T::from_array(raw)?))
}

impl PartialEq for ObjectType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl fmt::Debug for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectType").field("name", &self.name).finish()
    }
}

impl fmt::Display for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeToken::Null => write!(f, "null"),
            TypeToken::Bool => write!(f, "bool"),
            TypeToken::Int => write!(f, "int"),
            TypeToken::Float => write!(f, "float"),
            TypeToken::String => write!(f, "string"),
            TypeToken::DateTime => write!(f, "datetime"),
            TypeToken::Mixed => write!(f, "mixed"),
            TypeToken::List(items) => write!(f, "list<{items}>"),
            TypeToken::Map(items) => write!(f, "map<{items}>"),
            TypeToken::Enum(e) => write!(f, "{}", e.name),
            TypeToken::Object(o) => write!(f, "{}", o.name),
        }
    }
}

impl fmt::Debug for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

// ---------------------------------------------------------------------------
// TypeSet
// ---------------------------------------------------------------------------

/// Ordered set of accepted types, declaration order preserved.
///
/// Always describes the field's declared Rust type, never a converter's
/// own idea of it.
#[derive(Clone, Default, PartialEq)]
pub struct TypeSet(Vec<TypeToken>);

impl TypeSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Declared types of a Rust field type.
    pub fn of<T: FieldValue>() -> Self {
        T::types()
    }

    pub fn single(token: TypeToken) -> Self {
        Self(vec![token])
    }

    pub fn mixed() -> Self {
        Self::single(TypeToken::Mixed)
    }

    pub fn object<T: Dto>() -> Self {
        Self::single(TypeToken::Object(ObjectType::of::<T>()))
    }

    /// Add a token unless it is already present.
    pub fn with(mut self, token: TypeToken) -> Self {
        if !self.0.contains(&token) {
            self.0.push(token);
        }
        self
    }

    /// Same set with the `null` sentinel added.
    pub fn nullable(self) -> Self {
        self.with(TypeToken::Null)
    }

    pub fn contains_null(&self) -> bool {
        self.0.contains(&TypeToken::Null)
    }

    /// `null` passes unchanged: the set contains the sentinel or is mixed.
    pub fn accepts_null(&self) -> bool {
        self.0
            .iter()
            .any(|t| matches!(t, TypeToken::Null | TypeToken::Mixed))
    }

    pub fn is_mixed(&self) -> bool {
        self.0.contains(&TypeToken::Mixed)
    }

    /// Element types of the first `list` token.
    pub fn list_items(&self) -> Option<&TypeSet> {
        self.0.iter().find_map(|t| match t {
            TypeToken::List(items) => Some(items),
            _ => None,
        })
    }

    /// Value types of the first `map` token.
    pub fn map_items(&self) -> Option<&TypeSet> {
        self.0.iter().find_map(|t| match t {
            TypeToken::Map(items) => Some(items),
            _ => None,
        })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TypeToken> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Token names, e.g. `["string", "null"]`.
    pub fn names(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }
}

impl FromIterator<TypeToken> for TypeSet {
    fn from_iter<I: IntoIterator<Item = TypeToken>>(iter: I) -> Self {
        iter.into_iter().fold(TypeSet::new(), TypeSet::with)
    }
}

impl<'a> IntoIterator for &'a TypeSet {
    type Item = &'a TypeToken;
    type IntoIter = std::slice::Iter<'a, TypeToken>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for TypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "mixed");
        }
        for (i, token) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "|")?;
            }
            write!(f, "{token}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for TypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}
