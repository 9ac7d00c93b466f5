use crate::{
    prelude::*,
    utils::{document_field_name, extract_named_fields, serde_rename_rule},
};

#[derive(FromAttributes)]
#[darling(attributes(update))]
struct Attributes {
    entity: Type,
    #[darling(default)]
    post_updates: Option<Path>,
}

#[derive(FromAttributes)]
#[darling(attributes(update))]
struct FieldAttributes {
    #[darling(default)]
    set: bool,
    #[darling(default)]
    inc: bool,
    #[darling(default)]
    push: bool,
    #[darling(default)]
    add_to_set: bool,
    #[darling(default)]
    verb: Option<Expr>,
    #[darling(default)]
    nested: bool,
    #[darling(default)]
    rename: Option<String>,
}

enum Member {
    Leaf { verb: TokenStream },
    Nested,
    Untagged,
}

struct FieldConfig {
    ident: Ident,
    name: LitStr,
    member: Member,
}

pub fn derive_update(item: TokenStream) -> Result<TokenStream> {
    let input = parse2::<DeriveInput>(item)?;

    let attributes = Attributes::from_attributes(&input.attrs)?;
    let rename_rule = serde_rename_rule(&input.attrs)?;

    let fields_named = extract_named_fields(input.span(), input.data)?;

    let mut fields = vec![];

    for field in fields_named.named {
        let field_attributes = FieldAttributes::from_attributes(&field.attrs)?;

        let member = field_member(&field, &field_attributes)?;

        let name = match field_attributes.rename {
            Some(rename) => Some(rename),
            None => document_field_name(&field, rename_rule)?,
        };

        let Some(name) = name else {
            continue;
        };

        let Some(ident) = field.ident else {
            continue;
        };

        fields.push(FieldConfig {
            ident,
            name: LitStr::new(&name, Span::call_site()),
            member,
        });
    }

    let output = build(
        &input.ident,
        &input.generics,
        &attributes.entity,
        attributes.post_updates.as_ref(),
        &fields,
    );

    Ok(output)
}

/// Fields without a verb are `Untagged`: they recurse when their type is a
/// changes tree for the same entity and contribute nothing otherwise.
fn field_member(field: &Field, attributes: &FieldAttributes) -> Result<Member> {
    let krate = krate();

    let mut verbs = vec![];

    if attributes.set {
        verbs.push(quote! { #krate::Verb::Set });
    }

    if attributes.inc {
        verbs.push(quote! { #krate::Verb::Inc });
    }

    if attributes.push {
        verbs.push(quote! { #krate::Verb::Push });
    }

    if attributes.add_to_set {
        verbs.push(quote! { #krate::Verb::AddToSet });
    }

    if let Some(verb) = &attributes.verb {
        verbs.push(quote! { #verb });
    }

    if attributes.nested && !verbs.is_empty() {
        return Err(Error::new_spanned(
            field,
            "a nested field cannot have a verb",
        ));
    }

    if attributes.nested {
        return Ok(Member::Nested);
    }

    if verbs.len() > 1 {
        return Err(Error::new_spanned(field, "expected at most one verb"));
    }

    Ok(verbs
        .pop()
        .map_or(Member::Untagged, |verb| Member::Leaf { verb }))
}

fn build(
    ident: &Ident,
    generics: &syn::Generics,
    entity: &Type,
    post_updates: Option<&Path>,
    fields: &[FieldConfig],
) -> TokenStream {
    let krate = krate();

    let steps = fields.iter().map(|field| {
        let field_ident = &field.ident;
        let name = &field.name;

        match &field.member {
            Member::Leaf { verb } => quote! {
                #krate::update::resolve_leaf(&self.#field_ident, &#verb, path, #name, ops)?;
            },
            Member::Nested => quote! {
                #krate::update::resolve_nested::<<Self as #krate::UpdateInfo>::Entity, _>(
                    &self.#field_ident,
                    path,
                    #name,
                    ops,
                )?;
            },
            Member::Untagged => quote! {
                {
                    use #krate::update::{UntaggedNested as _, UntaggedOther as _};

                    (&#krate::update::Untagged::<<Self as #krate::UpdateInfo>::Entity, _>::new(
                        &self.#field_ident,
                    ))
                    .resolve_untagged(path, #name, ops)?;
                }
            },
        }
    });

    let post_updates = post_updates.map(|post_updates| {
        quote! {
            fn post_updates(
                &self,
                path: &#krate::FieldPath,
            ) -> #krate::Result<::std::vec::Vec<#krate::UpdateOp>> {
                #post_updates(self, path)
            }
        }
    });

    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    quote! {
        impl #impl_generics #krate::UpdateInfo for #ident #ty_generics #where_clause {
            type Entity = #entity;

            #[allow(unused_variables)]
            fn resolve(
                &self,
                path: &#krate::FieldPath,
                ops: &mut ::std::vec::Vec<#krate::UpdateOp>,
            ) -> #krate::Result<()> {
                #( #steps )*

                ::std::result::Result::Ok(())
            }

            #post_updates
        }
    }
}
