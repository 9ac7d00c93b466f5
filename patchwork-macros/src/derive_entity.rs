use crate::{
    prelude::*,
    utils::{build_fields_enum, document_field_name, extract_named_fields, serde_rename_rule},
};

#[derive(FromAttributes)]
#[darling(attributes(entity))]
struct Attributes {
    #[darling(default)]
    collection: Option<String>,
}

pub fn derive_entity(item: TokenStream) -> Result<TokenStream> {
    let input = parse2::<DeriveInput>(item)?;

    let attributes = Attributes::from_attributes(&input.attrs)?;
    let rename_rule = serde_rename_rule(&input.attrs)?;

    let fields_named = extract_named_fields(input.span(), input.data)?;
    let fields_span = fields_named.span();

    let mut id_ty = None;
    let mut fields = vec![];

    for field in fields_named.named {
        let Some(name) = document_field_name(&field, rename_rule)? else {
            continue;
        };

        let Some(ident) = field.ident else {
            continue;
        };

        if ident == "id" {
            if name != "_id" {
                return Err(Error::new_spanned(
                    &ident,
                    "id field must have `#[serde(rename = \"_id\")]`",
                ));
            }

            id_ty = Some(field.ty);
        }

        fields.push(FieldConfig {
            ident,
            lit: LitStr::new(&name, Span::call_site()),
        });
    }

    let Some(id_ty) = id_ty else {
        return Err(Error::new(fields_span, "an entity must have an `id` field"));
    };

    let output = build(
        &input.vis,
        &input.ident,
        &input.generics,
        &id_ty,
        attributes.collection,
        &fields,
    );

    Ok(output)
}

struct FieldConfig {
    ident: Ident,
    lit: LitStr,
}

fn build(
    vis: &Visibility,
    ident: &Ident,
    generics: &syn::Generics,
    id_ty: &Type,
    collection: Option<String>,
    fields: &[FieldConfig],
) -> TokenStream {
    let krate = krate();

    let snake_case_entity = ident.unraw().to_string().to_snake_case();

    let mod_ident = Ident::new(&snake_case_entity, Span::call_site());

    let collection_name = LitStr::new(
        &collection.unwrap_or_else(|| {
            snake_case_entity
                .strip_suffix("_entity")
                .unwrap_or(&snake_case_entity)
                .to_owned()
        }),
        Span::call_site(),
    );

    let fields_enum = build_fields_enum(
        fields.iter().map(|field| &field.ident),
        fields.iter().map(|field| &field.lit),
    );

    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    quote! {
        #vis mod #mod_ident {
            use super::*;

            impl #impl_generics #krate::Entity for #ident #ty_generics #where_clause {
                type Id = #id_ty;

                type Fields = Fields;

                const COLLECTION_NAME: &'static str = #collection_name;
            }

            #fields_enum
        }
    }
}
