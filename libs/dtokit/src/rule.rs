use std::borrow::Cow;
use std::fmt;

use crate::converter::default::DefaultConverter;
use crate::converter::{registry, BuildConverter, Converter};
use crate::error::DtoError;
use crate::types::TypeSet;
use crate::value::{Raw, Value};

/// Builds a boxed converter from target types and arguments.
pub type BuildFn = fn(TypeSet, &[ConverterArg]) -> Result<Box<dyn Converter>, DtoError>;

/// Reference to a converter implementation.
///
/// - `Typed`: a Rust type implementing [`BuildConverter`]; valid by
///   construction
/// - `Named`: a name looked up in the converter registry when the rule is
///   bound; unknown names fail with `UnsupportedConverter`
#[derive(Clone)]
pub enum ConverterRef {
    Typed { name: &'static str, build: BuildFn },
    Named(Cow<'static, str>),
}

impl ConverterRef {
    pub fn of<C: BuildConverter>() -> Self {
        let full = std::any::type_name::<C>();
        ConverterRef::Typed {
            name: full.rsplit("::").next().unwrap_or(full),
            build: build_boxed::<C>,
        }
    }

    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        ConverterRef::Named(name.into())
    }

    pub fn name(&self) -> &str {
        match self {
            ConverterRef::Typed { name, .. } => name,
            ConverterRef::Named(name) => name,
        }
    }

    /// Resolve to a build function, consulting the registry for names.
    pub fn resolve(&self) -> Result<(&'static str, BuildFn), DtoError> {
        match self {
            ConverterRef::Typed { name, build } => Ok((*name, *build)),
            ConverterRef::Named(name) => match registry::lookup(name)? {
                ConverterRef::Typed { name, build } => Ok((name, build)),
                ConverterRef::Named(_) => Err(DtoError::UnsupportedConverter(format!(
                    "'{name}' does not resolve to a converter type"
                ))),
            },
        }
    }
}

fn build_boxed<C: BuildConverter>(
    types: TypeSet,
    args: &[ConverterArg],
) -> Result<Box<dyn Converter>, DtoError> {
    Ok(Box::new(C::build(types, args)?))
}

impl PartialEq for ConverterRef {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl fmt::Debug for ConverterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConverterRef::Typed { name, .. } => write!(f, "{name}"),
            ConverterRef::Named(name) => write!(f, "\"{name}\""),
        }
    }
}

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

/// Construction argument of a converter, passed in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub enum ConverterArg {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Types(TypeSet),
    Converter(ConverterRef),
}

macro_rules! arg_from_int {
    ($($t:ty),*) => {$(
        impl From<$t> for ConverterArg {
            fn from(v: $t) -> Self {
                ConverterArg::Int(i64::from(v))
            }
        }
    )*};
}

arg_from_int!(i32, i64, u8, u32);

impl From<f64> for ConverterArg {
    fn from(v: f64) -> Self {
        ConverterArg::Float(v)
    }
}

impl From<bool> for ConverterArg {
    fn from(v: bool) -> Self {
        ConverterArg::Bool(v)
    }
}

impl From<&str> for ConverterArg {
    fn from(v: &str) -> Self {
        ConverterArg::Str(v.to_string())
    }
}

impl From<String> for ConverterArg {
    fn from(v: String) -> Self {
        ConverterArg::Str(v)
    }
}

impl From<TypeSet> for ConverterArg {
    fn from(v: TypeSet) -> Self {
        ConverterArg::Types(v)
    }
}

impl From<ConverterRef> for ConverterArg {
    fn from(v: ConverterRef) -> Self {
        ConverterArg::Converter(v)
    }
}

// ---------------------------------------------------------------------------
// Rule carrier
// ---------------------------------------------------------------------------

/// Declared converter rule: converter reference plus its arguments.
///
/// Target types are not part of the declaration; they are supplied from
/// the field's declared type when the rule is bound.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertRule {
    pub converter: ConverterRef,
    pub args: Vec<ConverterArg>,
}

impl ConvertRule {
    pub fn new(converter: ConverterRef, args: Vec<ConverterArg>) -> Self {
        Self { converter, args }
    }

    pub fn of<C: BuildConverter>() -> Self {
        Self::new(ConverterRef::of::<C>(), Vec::new())
    }

    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ConverterRef::named(name), Vec::new())
    }

    pub fn arg(mut self, arg: impl Into<ConverterArg>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn bind(&self, types: TypeSet) -> Result<Convert, DtoError> {
        Convert::new(&self.converter, types, self.args.clone())
    }
}

/// Bound rule carrier: converter instance with its target types and
/// arguments. Immutable once built.
pub struct Convert {
    name: &'static str,
    types: TypeSet,
    args: Vec<ConverterArg>,
    converter: Box<dyn Converter>,
}

impl Convert {
    /// Resolve `converter` and build it for `types`.
    ///
    /// Fails with `UnsupportedConverter` when the reference does not resolve
    /// or the converter rejects its arguments.
    pub fn new(
        converter: &ConverterRef,
        types: TypeSet,
        args: Vec<ConverterArg>,
    ) -> Result<Self, DtoError> {
        let (name, build) = converter.resolve()?;
        let built = build(types.clone(), &args)?;
        tracing::trace!(converter = name, types = %types, args = args.len(), "converter bound");
        Ok(Self {
            name,
            types,
            args,
            converter: built,
        })
    }

    /// Default converter for `types`.
    pub fn fallback(types: TypeSet) -> Self {
        Self {
            name: "DefaultConverter",
            types: types.clone(),
            args: Vec::new(),
            converter: Box::new(DefaultConverter::new(types)),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn types(&self) -> &TypeSet {
        &self.types
    }

    pub fn args(&self) -> &[ConverterArg] {
        &self.args
    }

    pub fn convert_from(&self, raw: Raw, field: &str) -> Result<Value, DtoError> {
        self.converter.convert_from(raw, field)
    }

    pub fn convert_to(&self, value: Value) -> Result<Raw, DtoError> {
        self.converter.convert_to(value)
    }
}

impl fmt::Debug for Convert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Convert")
            .field("converter", &self.name)
            .field("types", &self.types)
            .field("args", &self.args)
            .finish()
    }
}

/// Same converter, same target types, same arguments.
impl PartialEq for Convert {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.types == other.types && self.args == other.args
    }
}
