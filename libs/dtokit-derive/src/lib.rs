use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::meta::ParseNestedMeta;
use syn::punctuated::Punctuated;
use syn::{
    parse_macro_input, Data, DeriveInput, Expr, ExprLit, Fields, Ident, Lit, LitStr, Path, Token,
    Type,
};

/// Derive macro for typed value objects.
///
/// Generates `dtokit::Dto` (schema, constructor, field access) and
/// `dtokit::FieldValue` (so the type can be nested in other DTOs).
///
/// Fields are constructor parameters in declaration order unless marked
/// `lazy` or `ignore`. Field attributes, all under `#[dto(...)]`:
///
/// - `lazy`: not a constructor parameter, assigned after construction;
///   starts from `init`, which also serves as its default
/// - `init = expr`: initial value of `lazy` / `ignore` fields
///   (otherwise `Default::default()`)
/// - `ctor_default = expr`: constructor parameter default
/// - `hidden`: constructor parameter that is not a public field
/// - `ignore`: excluded from both directions
/// - `rename = "key"`: raw key
/// - `default = expr`: default when the raw key is absent
/// - `default_with = path`: generator called when the raw key is absent
/// - `omit_null`: `null` output omits the key
/// - `json_string` / `json_string(empty_item_is_array, max_depth = N, flags = expr)`
/// - `convert(Converter, args...)` / `convert("name", args...)`
///
/// # Example
///
/// ```ignore
/// #[derive(Debug, Clone, Dto)]
/// pub struct Event {
///     #[dto(rename = "event_id")]
///     pub id: i64,
///
///     #[dto(convert(DateTimeConverter, 3, DateTimeConverter::ISO8601))]
///     pub at: DateTime<FixedOffset>,
///
///     #[dto(lazy, init = true)]
///     pub active: bool,
/// }
/// ```
#[proc_macro_derive(Dto, attributes(dto))]
pub fn derive_dto(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match dto_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

/// Derive macro for unit enums used as DTO fields.
///
/// Converts by case name; `#[dto(rename = "...")]` on a variant changes
/// its raw name.
#[proc_macro_derive(DtoEnum, attributes(dto))]
pub fn derive_dto_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match enum_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

// ---------------------------------------------------------------------------
// Field attributes
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FieldAttrs {
    lazy: bool,
    hidden: bool,
    ignore: bool,
    omit_null: bool,
    rename: Option<LitStr>,
    default: Option<Expr>,
    default_with: Option<Path>,
    init: Option<Expr>,
    ctor_default: Option<Expr>,
    json_string: Option<JsonStringAttr>,
    convert: Option<ConvertAttr>,
}

#[derive(Default)]
struct JsonStringAttr {
    empty_item_is_array: bool,
    max_depth: Option<Expr>,
    flags: Option<Expr>,
}

struct ConvertAttr {
    converter: ConverterPath,
    args: Vec<Expr>,
}

enum ConverterPath {
    Typed(Path),
    Named(LitStr),
}

fn parse_field_attrs(field: &syn::Field) -> Result<FieldAttrs, syn::Error> {
    let mut attrs = FieldAttrs::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("dto") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("lazy") {
                attrs.lazy = true;
            } else if meta.path.is_ident("hidden") {
                attrs.hidden = true;
            } else if meta.path.is_ident("ignore") {
                attrs.ignore = true;
            } else if meta.path.is_ident("omit_null") {
                attrs.omit_null = true;
            } else if meta.path.is_ident("rename") {
                attrs.rename = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("default") {
                attrs.default = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("default_with") {
                attrs.default_with = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("init") {
                attrs.init = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("ctor_default") {
                attrs.ctor_default = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("json_string") {
                attrs.json_string = Some(parse_json_string(&meta)?);
            } else if meta.path.is_ident("convert") {
                attrs.convert = Some(parse_convert(&meta)?);
            } else {
                return Err(meta.error("unknown dto attribute"));
            }
            Ok(())
        })?;
    }

    let conflict = |msg: &str| Err(syn::Error::new_spanned(field, msg));
    if attrs.ignore && attrs.ctor_default.is_some() {
        return conflict("an ignored field cannot be a constructor parameter (`ctor_default`)");
    }
    if attrs.hidden && (attrs.lazy || attrs.ignore) {
        return conflict("`hidden` fields are constructor parameters; drop `lazy` / `ignore`");
    }
    if attrs.lazy && attrs.ctor_default.is_some() {
        return conflict("`lazy` fields are not constructor parameters; use `init`");
    }
    if attrs.init.is_some() && !(attrs.lazy || attrs.ignore) {
        return conflict("`init` applies to `lazy` or `ignore` fields");
    }
    Ok(attrs)
}

fn parse_json_string(meta: &ParseNestedMeta) -> Result<JsonStringAttr, syn::Error> {
    let mut js = JsonStringAttr::default();
    if !meta.input.peek(syn::token::Paren) {
        return Ok(js);
    }
    meta.parse_nested_meta(|inner| {
        if inner.path.is_ident("empty_item_is_array") {
            js.empty_item_is_array = true;
        } else if inner.path.is_ident("max_depth") {
            js.max_depth = Some(inner.value()?.parse()?);
        } else if inner.path.is_ident("flags") {
            js.flags = Some(inner.value()?.parse()?);
        } else {
            return Err(inner.error("unknown json_string option"));
        }
        Ok(())
    })?;
    Ok(js)
}

fn parse_convert(meta: &ParseNestedMeta) -> Result<ConvertAttr, syn::Error> {
    let content;
    syn::parenthesized!(content in meta.input);
    let mut exprs = Punctuated::<Expr, Token![,]>::parse_terminated(&content)?.into_iter();

    let converter = match exprs.next() {
        Some(Expr::Path(p)) => ConverterPath::Typed(p.path),
        Some(Expr::Lit(ExprLit {
            lit: Lit::Str(name),
            ..
        })) => ConverterPath::Named(name),
        Some(other) => {
            return Err(syn::Error::new_spanned(
                other,
                "expected a converter type or a registered converter name",
            ));
        }
        None => return Err(meta.error("convert(...) needs a converter")),
    };
    Ok(ConvertAttr {
        converter,
        args: exprs.collect(),
    })
}

// ---------------------------------------------------------------------------
// #[derive(Dto)]
// ---------------------------------------------------------------------------

/// Typed default closure: `expr` checked against the field type, lifted to a `Value`.
fn default_fn(ty: &Type, expr: TokenStream2) -> TokenStream2 {
    quote! {
        (|| -> ::dtokit::Value {
            let __v: #ty = #expr;
            <#ty as ::dtokit::FieldValue>::to_value(&__v)
        }) as ::dtokit::schema::DefaultFn
    }
}

fn dto_impl(input: &DeriveInput) -> Result<TokenStream2, syn::Error> {
    let name = &input.ident;
    let name_str = name.unraw().to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Dto only supports structs with named fields",
                ));
            }
        },
        _ => return Err(syn::Error::new_spanned(name, "Dto only supports structs")),
    };

    let mut field_decls = Vec::new();
    let mut params = Vec::new();
    let mut ctor_lets = Vec::new();
    let mut inits = Vec::new();
    let mut assign_arms = Vec::new();
    let mut read_arms = Vec::new();

    for field in fields {
        let ident = field.ident.as_ref().ok_or_else(|| {
            syn::Error::new_spanned(field, "expected named field")
        })?;
        let field_str = ident.unraw().to_string();
        let ty = &field.ty;
        let attrs = parse_field_attrs(field)?;
        let is_param = !(attrs.lazy || attrs.ignore);

        // Constructor side.
        if is_param {
            let fallback = match &attrs.ctor_default {
                Some(expr) => quote! { #expr },
                None => quote! {
                    return Err(::dtokit::DtoError::missing_argument(#name_str, #field_str))
                },
            };
            ctor_lets.push(quote! {
                let #ident: #ty = match __args.next() {
                    Some(v) => <#ty as ::dtokit::FieldValue>::from_value(v, #field_str)?,
                    None => #fallback,
                };
            });
            let param_default = match &attrs.ctor_default {
                Some(expr) => {
                    let f = default_fn(ty, quote! { #expr });
                    quote! { Some(#f) }
                }
                None => quote! { None },
            };
            params.push(quote! { .param(#field_str, #param_default) });
            inits.push(quote! { #ident });
        } else {
            let init = match &attrs.init {
                Some(expr) => quote! { #expr },
                None => quote! { ::core::default::Default::default() },
            };
            inits.push(quote! { #ident: #init });
        }

        if attrs.hidden {
            continue;
        }

        // Schema side.
        if attrs.ignore {
            field_decls.push(quote! {
                .field(::dtokit::FieldDecl::new(#field_str, ::dtokit::TypeSet::mixed()).ignore())
            });
            continue;
        }

        let mut decl = quote! { ::dtokit::FieldDecl::of::<#ty>(#field_str) };
        if let (true, Some(expr)) = (attrs.lazy, &attrs.init) {
            let f = default_fn(ty, quote! { #expr });
            decl = quote! { #decl.property_default(#f) };
        }
        if let Some(expr) = &attrs.default {
            let f = default_fn(ty, quote! { #expr });
            decl = quote! { #decl.default(#f) };
        }
        if let Some(path) = &attrs.default_with {
            let f = default_fn(ty, quote! { #path() });
            decl = quote! { #decl.default_with(#f) };
        }
        if let Some(raw_key) = &attrs.rename {
            decl = quote! { #decl.rename(#raw_key) };
        }
        if attrs.omit_null {
            decl = quote! { #decl.omit_null() };
        }
        if let Some(js) = &attrs.json_string {
            let mut options = quote! { ::dtokit::JsonString::new() };
            if js.empty_item_is_array {
                options = quote! { #options.empty_item_is_array(true) };
            }
            if let Some(depth) = &js.max_depth {
                options = quote! { #options.max_depth(#depth) };
            }
            if let Some(flags) = &js.flags {
                options = quote! { #options.flags(#flags) };
            }
            decl = quote! { #decl.json_string(#options) };
        }
        if let Some(convert) = &attrs.convert {
            let converter = match &convert.converter {
                ConverterPath::Typed(path) => quote! { ::dtokit::ConverterRef::of::<#path>() },
                ConverterPath::Named(name) => quote! { ::dtokit::ConverterRef::named(#name) },
            };
            let args = &convert.args;
            decl = quote! {
                #decl.convert(::dtokit::ConvertRule::new(
                    #converter,
                    vec![#(::dtokit::ConverterArg::from(#args)),*],
                ))
            };
        }
        field_decls.push(quote! { .field(#decl) });

        assign_arms.push(quote! {
            #field_str => {
                self.#ident = <#ty as ::dtokit::FieldValue>::from_value(value, #field_str)?;
                Ok(())
            }
        });
        read_arms.push(quote! {
            #field_str => Ok(<#ty as ::dtokit::FieldValue>::to_value(&self.#ident)),
        });
    }

    Ok(quote! {
        impl #impl_generics ::dtokit::Dto for #name #ty_generics #where_clause {
            const NAME: &'static str = #name_str;

            fn schema() -> ::dtokit::Schema {
                ::dtokit::Schema::builder()
                    #(#field_decls)*
                    #(#params)*
                    .build()
            }

            fn construct(
                args: ::std::vec::Vec<::dtokit::Value>,
            ) -> ::core::result::Result<Self, ::dtokit::DtoError> {
                #[allow(unused_mut, unused_variables)]
                let mut __args = args.into_iter();
                #(#ctor_lets)*
                Ok(Self { #(#inits),* })
            }

            fn assign(
                &mut self,
                field: &str,
                value: ::dtokit::Value,
            ) -> ::core::result::Result<(), ::dtokit::DtoError> {
                match field {
                    #(#assign_arms)*
                    _ => {
                        let _ = value;
                        Err(::dtokit::DtoError::unknown_field(#name_str, field))
                    }
                }
            }

            fn read(
                &self,
                field: &str,
            ) -> ::core::result::Result<::dtokit::Value, ::dtokit::DtoError> {
                match field {
                    #(#read_arms)*
                    _ => Err(::dtokit::DtoError::unknown_field(#name_str, field)),
                }
            }
        }

        impl #impl_generics ::dtokit::FieldValue for #name #ty_generics #where_clause {
            fn types() -> ::dtokit::TypeSet {
                ::dtokit::TypeSet::object::<Self>()
            }

            fn from_value(
                value: ::dtokit::Value,
                field: &str,
            ) -> ::core::result::Result<Self, ::dtokit::DtoError> {
                ::dtokit::field::object_from_value::<Self>(value, field)
            }

            fn to_value(&self) -> ::dtokit::Value {
                ::dtokit::Value::Object(::std::boxed::Box::new(::core::clone::Clone::clone(self)))
            }
        }
    })
}

// ---------------------------------------------------------------------------
// #[derive(DtoEnum)]
// ---------------------------------------------------------------------------

fn enum_impl(input: &DeriveInput) -> Result<TokenStream2, syn::Error> {
    let name = &input.ident;
    let name_str = name.unraw().to_string();

    let variants = match &input.data {
        Data::Enum(data) => &data.variants,
        _ => return Err(syn::Error::new_spanned(name, "DtoEnum only supports enums")),
    };

    let mut idents: Vec<&Ident> = Vec::new();
    let mut cases: Vec<String> = Vec::new();
    for variant in variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "DtoEnum only supports unit variants",
            ));
        }
        let mut case = variant.ident.unraw().to_string();
        for attr in &variant.attrs {
            if !attr.path().is_ident("dto") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    let value: LitStr = meta.value()?.parse()?;
                    case = value.value();
                    Ok(())
                } else {
                    Err(meta.error("unknown dto attribute on enum variant"))
                }
            })?;
        }
        idents.push(&variant.ident);
        cases.push(case);
    }

    Ok(quote! {
        impl #name {
            const __DTO_ENUM: ::dtokit::EnumType = ::dtokit::EnumType {
                name: #name_str,
                cases: &[#(#cases),*],
            };
        }

        impl ::dtokit::FieldValue for #name {
            fn types() -> ::dtokit::TypeSet {
                ::dtokit::TypeSet::single(::dtokit::TypeToken::Enum(Self::__DTO_ENUM))
            }

            fn from_value(
                value: ::dtokit::Value,
                field: &str,
            ) -> ::core::result::Result<Self, ::dtokit::DtoError> {
                match ::dtokit::field::enum_case(value, field, &Self::__DTO_ENUM)? {
                    #(#cases => Ok(Self::#idents),)*
                    other => Err(::dtokit::DtoError::type_mismatch(
                        field,
                        ::std::format!("'{other}' is not a case of {}", #name_str),
                    )),
                }
            }

            fn to_value(&self) -> ::dtokit::Value {
                ::dtokit::Value::Enum(match self {
                    #(Self::#idents => #cases,)*
                })
            }
        }
    })
}
