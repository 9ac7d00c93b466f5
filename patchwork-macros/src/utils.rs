use crate::prelude::*;
use proc_macro_crate::{FoundCrate, crate_name};

macro_rules! extract {
    ($val:expr, $pat:pat, $error_message: expr) => {
        let $pat = $val else {
            return Err(Error::new_spanned($val, $error_message));
        };
    };
}

pub(crate) use extract;

pub fn extract_named_fields(span: Span, data: Data) -> Result<FieldsNamed> {
    let Data::Struct(data_struct) = data else {
        return Err(Error::new(span, "expected struct"));
    };

    extract!(
        data_struct.fields,
        Fields::Named(named_fields),
        "expected named fields"
    );

    Ok(named_fields)
}

/// Container-level `#[serde(rename_all = "...")]` rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenameRule {
    Lower,
    Upper,
    Pascal,
    Camel,
    Snake,
    ScreamingSnake,
    Kebab,
    ScreamingKebab,
}

impl RenameRule {
    fn parse(lit: &LitStr) -> Result<Self> {
        let rule = match lit.value().as_str() {
            "lowercase" => Self::Lower,
            "UPPERCASE" => Self::Upper,
            "PascalCase" => Self::Pascal,
            "camelCase" => Self::Camel,
            "snake_case" => Self::Snake,
            "SCREAMING_SNAKE_CASE" => Self::ScreamingSnake,
            "kebab-case" => Self::Kebab,
            "SCREAMING-KEBAB-CASE" => Self::ScreamingKebab,
            other => {
                return Err(Error::new_spanned(
                    lit,
                    format!("unknown rename rule `{other}`"),
                ));
            }
        };

        Ok(rule)
    }

    /// Renames a `snake_case` field the way serde does.
    pub fn apply(self, field: &str) -> String {
        match self {
            Self::Lower | Self::Snake => field.to_owned(),
            Self::Upper | Self::ScreamingSnake => field.to_ascii_uppercase(),
            Self::Pascal => field.to_upper_camel_case(),
            Self::Camel => field.to_lower_camel_case(),
            Self::Kebab => field.replace('_', "-"),
            Self::ScreamingKebab => field.to_ascii_uppercase().replace('_', "-"),
        }
    }
}

fn skip_serde_option(meta: &ParseNestedMeta) -> Result<()> {
    if meta.input.peek(Token![=]) {
        meta.value()?.parse::<Expr>()?;
    } else if meta.input.peek(token::Paren) {
        meta.parse_nested_meta(|nested| skip_serde_option(&nested))?;
    }

    Ok(())
}

/// Reads `#[serde(rename_all = "...")]` from a struct.
pub fn serde_rename_rule(attrs: &[Attribute]) -> Result<Option<RenameRule>> {
    let mut rule = None;

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("serde")) {
        attr.parse_nested_meta(|meta| {
            if !meta.path.is_ident("rename_all") {
                return skip_serde_option(&meta);
            }

            if meta.input.peek(token::Paren) {
                return Err(meta.error(
                    "`rename_all` with separate serialize and deserialize rules is not supported",
                ));
            }

            rule = Some(RenameRule::parse(&meta.value()?.parse::<LitStr>()?)?);

            Ok(())
        })?;
    }

    Ok(rule)
}

/// Reads `#[serde(rename = "...")]`, skipping every other serde option.
pub fn extract_serde_rename(field: &Field) -> Result<Option<String>> {
    let mut rename = None;

    for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("serde")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") && meta.input.peek(Token![=]) {
                rename = Some(meta.value()?.parse::<LitStr>()?.value());

                return Ok(());
            }

            skip_serde_option(&meta)
        })?;
    }

    Ok(rename)
}

/// Name of the document field backing `field`.
pub fn document_field_name(field: &Field, rule: Option<RenameRule>) -> Result<Option<String>> {
    let Some(ident) = field.ident.as_ref() else {
        return Ok(None);
    };

    if let Some(rename) = extract_serde_rename(field)? {
        return Ok(Some(rename));
    }

    let name = ident.unraw().to_string();

    Ok(Some(match rule {
        Some(rule) => rule.apply(&name),
        None => name,
    }))
}

pub fn build_fields_enum<'a>(
    field_idents: impl Iterator<Item = &'a Ident>,
    field_lits: impl Iterator<Item = &'a LitStr>,
) -> TokenStream {
    let krate = krate();

    let field_idents_upper_camel_case = field_idents
        .map(|ident| {
            Ident::new(
                &ident.unraw().to_string().to_upper_camel_case(),
                Span::call_site(),
            )
        })
        .collect_vec();

    let field_lits = field_lits.collect_vec();

    quote! {
        #[derive(
            ::std::fmt::Debug,
            ::std::clone::Clone,
            ::std::marker::Copy,
            ::std::cmp::PartialEq,
            ::std::cmp::Eq,
            ::std::hash::Hash,
        )]
        pub enum Fields {
            #( #field_idents_upper_camel_case ),*
        }

        impl Fields {
            pub const fn as_str(self) -> &'static str {
                match self {
                    #(
                        Self::#field_idents_upper_camel_case => #field_lits
                    ),*
                }
            }
        }

        impl ::std::fmt::Display for Fields {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::convert::From<Fields> for ::std::string::String {
            fn from(value: Fields) -> Self {
                ::std::string::ToString::to_string(value.as_str())
            }
        }

        impl ::std::convert::From<Fields> for #krate::FieldPath {
            fn from(value: Fields) -> Self {
                #krate::FieldPath::new(value.as_str())
            }
        }
    }
}

/// Path to the `patchwork` crate as seen from the expansion site.
pub fn krate() -> TokenStream {
    match crate_name("patchwork") {
        Ok(FoundCrate::Name(name)) => {
            let ident = Ident::new(&name, Span::call_site());
            quote! { ::#ident }
        }
        // the library aliases itself as `patchwork`
        Ok(FoundCrate::Itself) | Err(_) => quote! { ::patchwork },
    }
}
