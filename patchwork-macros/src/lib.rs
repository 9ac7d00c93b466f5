#![warn(clippy::pedantic)]

mod derive_entity;
mod derive_update;
mod func_changes;
mod prelude;
mod utils;

fn expand<F: FnOnce(proc_macro2::TokenStream) -> syn::Result<proc_macro2::TokenStream>>(
    fun: F,
    input: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    fun(input.into())
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Implements `Entity` and generates a snake_case helper module holding the
/// `Fields` enum.
///
/// The struct needs an `id` field renamed to `_id`. The collection name
/// defaults to the snake_case struct name without an `_entity` suffix and can
/// be set with `#[entity(collection = "...")]`.
#[proc_macro_derive(Entity, attributes(entity))]
pub fn entity(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    expand(derive_entity::derive_entity, input)
}

/// Implements `UpdateInfo` for a changes struct.
///
/// ```ignore
/// #[derive(Default, Update)]
/// #[update(entity = "Problem", post_updates = "Self::touch")]
/// struct ProblemChanges {
///     #[update(set)]
///     title: Field<String>,
///     #[update(inc, rename = "revision")]
///     revisions: Field<i32>,
///     #[update(nested)]
///     description: Field<DescriptionChanges>,
///     #[update(verb = "Max")]
///     best_score: Field<i64>,
///     // not an update target, never emitted
///     reason: Option<String>,
/// }
/// ```
///
/// Leaves take one of `set`, `inc`, `push`, `add_to_set` or `verb = "..."`
/// naming any `UpdateVerb` value. A field without a verb is recursed into when
/// its type is a changes tree for the same entity, and ignored otherwise.
/// `nested` makes the recursion explicit and turns an entity mismatch into a
/// compile error. Names follow `rename`, then `#[serde(rename)]`, then the
/// field name. Container-level `#[serde(rename_all)]` is rejected.
#[proc_macro_derive(Update, attributes(update))]
pub fn update(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    expand(derive_update::derive_update, input)
}

/// `changes!(ProblemChanges, title: "A + B".to_owned())` sets the listed
/// fields and omits the rest.
#[proc_macro]
pub fn changes(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    expand(func_changes::func_changes, input)
}
