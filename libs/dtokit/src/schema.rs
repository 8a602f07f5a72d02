use crate::field::FieldValue;
use crate::json_string::JsonString;
use crate::rule::ConvertRule;
use crate::types::TypeSet;
use crate::value::Value;

/// Produces a default value on demand (literal, generator or constructor
/// default, already lifted into a [`Value`]).
pub type DefaultFn = fn() -> Value;

/// Rules attached to one field.
///
/// Every rule is optional; an empty `FieldRules` means "convert with the
/// Default converter under the field's own name, required unless nullable".
#[derive(Debug, Clone, Default)]
pub struct FieldRules {
    /// Excluded from both directions.
    pub ignore: bool,
    /// Default-value literal used when the raw key is absent.
    pub default: Option<DefaultFn>,
    /// Default-value generator, invoked when the raw key is absent.
    pub default_with: Option<DefaultFn>,
    /// Raw key alias.
    pub rename: Option<&'static str>,
    /// Raw representation is JSON text.
    pub json_string: Option<JsonString>,
    /// Converter override.
    pub convert: Option<ConvertRule>,
    /// `null` output omits the key instead of writing `null`.
    pub omit_null: bool,
}

/// One declared field: what the type definition says about it.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: &'static str,
    /// Declared type set (includes `null` when the field is nullable).
    pub types: TypeSet,
    /// Initial value of a field that is not a constructor parameter.
    pub property_default: Option<DefaultFn>,
    pub rules: FieldRules,
}

impl FieldDecl {
    pub fn new(name: &'static str, types: TypeSet) -> Self {
        Self {
            name,
            types,
            property_default: None,
            rules: FieldRules::default(),
        }
    }

    /// Field whose declared types come from its Rust type.
    pub fn of<T: FieldValue>(name: &'static str) -> Self {
        Self::new(name, T::types())
    }

    pub fn property_default(mut self, f: DefaultFn) -> Self {
        self.property_default = Some(f);
        self
    }

    pub fn ignore(mut self) -> Self {
        self.rules.ignore = true;
        self
    }

    pub fn default(mut self, f: DefaultFn) -> Self {
        self.rules.default = Some(f);
        self
    }

    pub fn default_with(mut self, f: DefaultFn) -> Self {
        self.rules.default_with = Some(f);
        self
    }

    pub fn rename(mut self, raw_key: &'static str) -> Self {
        self.rules.rename = Some(raw_key);
        self
    }

    pub fn json_string(mut self, options: JsonString) -> Self {
        self.rules.json_string = Some(options);
        self
    }

    pub fn convert(mut self, rule: ConvertRule) -> Self {
        self.rules.convert = Some(rule);
        self
    }

    pub fn omit_null(mut self) -> Self {
        self.rules.omit_null = true;
        self
    }
}

/// Constructor parameter. `default` makes it optional.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: &'static str,
    pub default: Option<DefaultFn>,
}

/// Explicit description of a DTO type.
///
/// - `fields`: public fields in declaration order; this is the order of
///   input consumption and of `to_array` output
/// - `constructor`: constructor parameters in call order; a field is
///   constructor-bound when a parameter with its name exists here
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub fields: Vec<FieldDecl>,
    pub constructor: Vec<Param>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn param(&self, name: &str) -> Option<&Param> {
        self.constructor.iter().find(|p| p.name == name)
    }
}

#[derive(Debug, Default)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn field(mut self, field: FieldDecl) -> Self {
        self.schema.fields.push(field);
        self
    }

    pub fn param(mut self, name: &'static str, default: Option<DefaultFn>) -> Self {
        self.schema.constructor.push(Param { name, default });
        self
    }

    pub fn build(self) -> Schema {
        self.schema
    }
}
