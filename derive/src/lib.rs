//! Derive macros for rowmap records.
//!
//! - `#[derive(Fields)]` emits the static field declarations and the
//!   by-name field accessors of `rowmap_core::Fields`.
//! - `#[derive(Record)]` emits the table identity of `rowmap_core::Record`.
//!
//! Both are re-exported by `rowmap-core`; depend on that crate rather than
//! on this one.
//!
//! # Example
//!
//! ```ignore
//! #[derive(Default, Fields, Record)]
//! #[record(name = "article", title = "Articles")]
//! pub struct Article {
//!     #[field(flatten)]
//!     pub base: Object,
//!     #[field(length = 128, index = "ASC")]
//!     pub title: String,
//!     #[field(length = -1)]
//!     pub body: String,
//!     #[serde(rename = "tag_list")]
//!     pub tags: Vec<String>,
//!     #[field(skip)]
//!     pub cached: bool,
//! }
//! ```
//!
//! # Field attributes
//!
//! | Attribute | Effect |
//! |---|---|
//! | `name = "col"` | Column name (`"-"` skips the field) |
//! | `length = N` | Length tag; `-1`/`-2` select `TEXT`/`LONGTEXT` for strings |
//! | `default = lit` | Default tag (string, number, or bool literal) |
//! | `index = "ASC"` | Index specification |
//! | `skip` | Not persisted |
//! | `flatten` | Splice the nested structure's columns in place |
//! | `json` | Store as JSON text even if the type looks primitive |
//!
//! Without `name`, the column is named after `#[serde(rename = "...")]`,
//! then after the lower-cased field identifier. `#[serde(skip)]` also skips
//! the field.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::meta::ParseNestedMeta;
use syn::{
    Attribute, Data, DeriveInput, Fields, Ident, Lit, LitInt, LitStr, Token, Type,
    parse_macro_input,
};

/// Derives `rowmap_core::Fields`.
#[proc_macro_derive(Fields, attributes(field))]
pub fn derive_fields(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_fields(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Derives `rowmap_core::Record`.
///
/// `#[record(name = "...", title = "...")]` sets the table name and label;
/// they default to the lower-cased and verbatim struct identifier.
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_record(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// How a field is persisted.
enum Storage {
    Column,
    Json,
    Flatten,
}

struct FieldSpec {
    ident: Ident,
    ty: Type,
    name: String,
    length: i64,
    default: String,
    index: String,
    storage: Storage,
}

#[derive(Default)]
struct FieldOptions {
    name: Option<String>,
    length: i64,
    default: String,
    index: String,
    skip: bool,
    flatten: bool,
    json: bool,
}

#[derive(Default)]
struct SerdeOptions {
    rename: Option<String>,
    skip: bool,
}

const PRIMITIVES: &[&str] = &[
    "i8", "i16", "i32", "i64", "isize", "u8", "u16", "u32", "u64", "usize", "f32", "f64", "bool",
    "String",
];

fn expand_fields(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let ident = &input.ident;
    let specs = collect_fields(input)?;
    let krate = quote!(::rowmap_core);

    let declare = specs.iter().map(|spec| {
        let ty = &spec.ty;
        let rust_ident = spec.ident.to_string();
        let name = &spec.name;
        let length = spec.length;
        let default = &spec.default;
        let index = &spec.index;
        let source = match spec.storage {
            Storage::Flatten => {
                return quote! {
                    <#ty as #krate::Fields>::declare(decls);
                };
            }
            Storage::Column => quote!(<#ty as #krate::Column>::SOURCE),
            Storage::Json => quote!(#krate::SourceKind::Json),
        };
        quote! {
            decls.push(#krate::FieldDecl {
                ident: #rust_ident,
                name: #name,
                source: #source,
                length: #length,
                default: #default,
                index: #index,
            });
        }
    });

    let get = specs.iter().map(|spec| {
        let field = &spec.ident;
        let name = &spec.name;
        match spec.storage {
            Storage::Flatten => quote! {
                if let ::std::option::Option::Some(value) =
                    #krate::Fields::get_field(&self.#field, name)?
                {
                    return ::std::result::Result::Ok(::std::option::Option::Some(value));
                }
            },
            Storage::Column => quote! {
                if name == #name {
                    return #krate::__private::encode(&self.#field).map(::std::option::Option::Some);
                }
            },
            Storage::Json => quote! {
                if name == #name {
                    return #krate::__private::json::encode(&self.#field)
                        .map(::std::option::Option::Some);
                }
            },
        }
    });

    let set = specs.iter().map(|spec| {
        let field = &spec.ident;
        let name = &spec.name;
        match spec.storage {
            Storage::Flatten => quote! {
                if #krate::Fields::set_field(&mut self.#field, name, value.clone())? {
                    return ::std::result::Result::Ok(true);
                }
            },
            Storage::Column => quote! {
                if name == #name {
                    #krate::__private::assign(&mut self.#field, value)?;
                    return ::std::result::Result::Ok(true);
                }
            },
            Storage::Json => quote! {
                if name == #name {
                    #krate::__private::json::assign(&mut self.#field, value)?;
                    return ::std::result::Result::Ok(true);
                }
            },
        }
    });

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics #krate::Fields for #ident #ty_generics #where_clause {
            fn declare(decls: &mut ::std::vec::Vec<#krate::FieldDecl>) {
                #(#declare)*
            }

            #[allow(unused_variables)]
            fn get_field(
                &self,
                name: &str,
            ) -> #krate::Result<::std::option::Option<#krate::Value>> {
                #(#get)*
                ::std::result::Result::Ok(::std::option::Option::None)
            }

            #[allow(unused_variables)]
            fn set_field(&mut self, name: &str, value: #krate::Value) -> #krate::Result<bool> {
                #(#set)*
                ::std::result::Result::Ok(false)
            }
        }
    })
}

fn collect_fields(input: &DeriveInput) -> syn::Result<Vec<FieldSpec>> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "Fields can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Fields can only be derived for structs",
            ));
        }
    };

    let mut specs = Vec::with_capacity(fields.len());
    for field in fields {
        let Some(ident) = field.ident.clone() else {
            continue;
        };
        let options = field_options(&field.attrs)?;
        let serde = serde_options(&field.attrs)?;

        if options.skip || serde.skip || options.name.as_deref() == Some("-") {
            continue;
        }

        let storage = if options.flatten {
            Storage::Flatten
        } else if options.json || !is_primitive(&field.ty) {
            Storage::Json
        } else {
            Storage::Column
        };

        let name = options
            .name
            .or(serde.rename)
            .unwrap_or_else(|| unraw(&ident).to_lowercase());

        specs.push(FieldSpec {
            ident,
            ty: field.ty.clone(),
            name,
            length: options.length,
            default: options.default,
            index: options.index,
            storage,
        });
    }
    Ok(specs)
}

fn field_options(attrs: &[Attribute]) -> syn::Result<FieldOptions> {
    let mut options = FieldOptions::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("field")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let lit: LitStr = meta.value()?.parse()?;
                options.name = Some(lit.value());
            } else if meta.path.is_ident("length") {
                options.length = parse_signed(&meta)?;
            } else if meta.path.is_ident("default") {
                options.default = parse_default(&meta)?;
            } else if meta.path.is_ident("index") {
                let lit: LitStr = meta.value()?.parse()?;
                options.index = lit.value();
            } else if meta.path.is_ident("skip") {
                options.skip = true;
            } else if meta.path.is_ident("flatten") {
                options.flatten = true;
            } else if meta.path.is_ident("json") {
                options.json = true;
            } else {
                return Err(meta.error("unknown field attribute"));
            }
            Ok(())
        })?;
    }
    if options.flatten && options.json {
        return Err(syn::Error::new_spanned(
            &attrs[0],
            "`flatten` and `json` cannot be combined",
        ));
    }
    Ok(options)
}

fn serde_options(attrs: &[Attribute]) -> syn::Result<SerdeOptions> {
    let mut options = SerdeOptions::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("serde")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") && meta.input.peek(Token![=]) {
                let lit: LitStr = meta.value()?.parse()?;
                options.rename = Some(lit.value());
            } else if meta.path.is_ident("skip") {
                options.skip = true;
            } else {
                skip_meta(&meta)?;
            }
            Ok(())
        })?;
    }
    Ok(options)
}

/// Consumes a serde option this macro does not interpret.
fn skip_meta(meta: &ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(Token![=]) {
        meta.value()?.parse::<syn::Expr>()?;
    } else if meta.input.peek(syn::token::Paren) {
        let content;
        syn::parenthesized!(content in meta.input);
        content.parse::<TokenStream2>()?;
    }
    Ok(())
}

fn parse_signed(meta: &ParseNestedMeta) -> syn::Result<i64> {
    let input = meta.value()?;
    let negative = input.peek(Token![-]);
    if negative {
        input.parse::<Token![-]>()?;
    }
    let lit: LitInt = input.parse()?;
    let value: i64 = lit.base10_parse()?;
    Ok(if negative { -value } else { value })
}

fn parse_default(meta: &ParseNestedMeta) -> syn::Result<String> {
    let input = meta.value()?;
    let negative = input.peek(Token![-]);
    if negative {
        input.parse::<Token![-]>()?;
    }
    let lit: Lit = input.parse()?;
    let text = match &lit {
        Lit::Int(i) => i.base10_digits().to_string(),
        Lit::Float(f) => f.base10_digits().to_string(),
        Lit::Str(s) if !negative => s.value(),
        Lit::Bool(b) if !negative => b.value.to_string(),
        _ => return Err(syn::Error::new_spanned(&lit, "unsupported default literal")),
    };
    Ok(if negative { format!("-{text}") } else { text })
}

fn is_primitive(ty: &Type) -> bool {
    let Type::Path(path) = ty else {
        return false;
    };
    if path.qself.is_some() {
        return false;
    }
    let Some(segment) = path.path.segments.last() else {
        return false;
    };
    segment.arguments.is_empty() && PRIMITIVES.contains(&segment.ident.to_string().as_str())
}

fn unraw(ident: &Ident) -> String {
    let name = ident.to_string();
    name.strip_prefix("r#").map(str::to_string).unwrap_or(name)
}

fn expand_record(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let ident = &input.ident;
    let mut name = None;
    let mut title = None;

    for attr in input.attrs.iter().filter(|a| a.path().is_ident("record")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let lit: LitStr = meta.value()?.parse()?;
                name = Some(lit.value());
            } else if meta.path.is_ident("title") {
                let lit: LitStr = meta.value()?.parse()?;
                title = Some(lit.value());
            } else {
                return Err(meta.error("unknown record attribute"));
            }
            Ok(())
        })?;
    }

    let name = name.unwrap_or_else(|| unraw(ident).to_lowercase());
    let title = title.unwrap_or_else(|| unraw(ident));
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::rowmap_core::Record for #ident #ty_generics #where_clause {
            fn title(&self) -> &str {
                #title
            }

            fn name(&self) -> &str {
                #name
            }
        }
    })
}
