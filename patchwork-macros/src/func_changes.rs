use crate::prelude::*;

struct Input {
    changes: Path,
    fields: Punctuated<FieldValue, Token![,]>,
}

impl Parse for Input {
    fn parse(input: ParseStream) -> Result<Self> {
        let changes = input.parse()?;

        if input.is_empty() {
            return Ok(Self {
                changes,
                fields: Punctuated::new(),
            });
        }

        input.parse::<Token![,]>()?;
        let fields = Punctuated::parse_terminated(input)?;

        Ok(Self { changes, fields })
    }
}

struct FieldValue {
    ident: Ident,
    value: Expr,
}

impl Parse for FieldValue {
    fn parse(input: ParseStream) -> Result<Self> {
        let ident = input.parse()?;
        input.parse::<Token![:]>()?;
        let value = input.parse()?;

        Ok(Self { ident, value })
    }
}

pub fn func_changes(input: TokenStream) -> Result<TokenStream> {
    let input = parse2::<Input>(input)?;

    let output = build(&input);

    Ok(output)
}

fn build(input: &Input) -> TokenStream {
    let krate = krate();
    let changes = &input.changes;

    let fields = input.fields.iter().map(|field| {
        let ident = &field.ident;
        let value = &field.value;

        quote! {
            #ident: #krate::Field::Set(#value)
        }
    });

    quote! {
        #changes {
            #( #fields, )*
            ..::std::default::Default::default()
        }
    }
}
