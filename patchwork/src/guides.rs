/// ## Getting started
///
/// The [`Entity`](crate::Entity) trait maps a Rust type to a `MongoDB` collection.
///
/// A type that derives [`Entity`](crate::Entity) must:
/// - be a struct with named fields
/// - implement [`Serialize`](serde::Serialize) and [`Deserialize`](serde::Deserialize)
/// - have a field named `id`, annotated with `#[serde(rename = "_id")]`
///
/// ```ignore
/// use patchwork::Entity;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize, Entity)]
/// struct Problem {
///     #[serde(rename = "_id")]
///     id: i32,
///     title: String,
///     difficulty: i32,
///     tags: Vec<String>,
/// }
/// ```
///
/// The collection name is the `snake_case` form of the struct name with any
/// `_entity` suffix removed (`ProblemEntity` → `problem`). Override it with
/// `#[entity(collection = "problems")]`.
///
/// Every entity also gets a helper module named after it, holding a `Fields`
/// enum with one variant per struct field. Variants display as the document
/// field name, honouring `#[serde(rename = "...")]`, and convert into a
/// [`FieldPath`](crate::FieldPath), so they can be used wherever a path is
/// expected:
///
/// ```ignore
/// let filter = FilterBuilder::<Problem>::new().eq(problem::Fields::Title, "A + B")?;
/// ```
///
/// ### Talking to the store
///
/// All operations go through [`CollectionAccess`](crate::CollectionAccess). It is
/// implemented for [`mongodb::Collection<Document>`](mongodb::Collection), which
/// [`Entity::collection`](crate::Entity::collection) returns, and for
/// [`MemoryCollection`](crate::MemoryCollection), an in-process collection handy
/// in tests.
///
/// ```ignore
/// let client = Client::with_uri_str("mongodb://example.com").await?;
/// let problems = Problem::collection(&client.database("judge"));
///
/// let hard = Problem::count(&problems, &FilterBuilder::new().gte("difficulty", &4)?).await?;
/// ```
///
/// ### Method overview
///
/// | Method name            | Description                                                  | Corresponding MongoDB Query                           |
/// |------------------------|--------------------------------------------------------------|-------------------------------------------------------|
/// | `Entity::count`        | Counts entities matching a filter.                           | `db.problem.countDocuments(filter)`                   |
/// | `Entity::exists`       | Returns true if at least one entity matches the filter.      | `db.problem.countDocuments(filter) > 0`               |
/// | `Entity::find`         | Runs a [`FindPipeline`](crate::FindPipeline).                | `countDocuments(filter)`, then `find(filter).sort(..).skip(..).limit(..)` |
/// | `Entity::update_one`   | Applies a changes tree to the first matching document.       | `db.problem.updateOne(filter, update)`                |
/// | `Entity::update_by_id` | Applies a changes tree to the document with the given id.    | `db.problem.updateOne({ _id: { $eq: id } }, update)`  |
pub mod getting_started {}

/// ## Filters and finds
///
/// [`FilterBuilder`](crate::FilterBuilder) collects independent predicates and
/// joins them with `$and`. An empty builder matches every document and a single
/// predicate is used as is.
///
/// ```ignore
/// let filter = FilterBuilder::<Problem>::new()
///     .range(problem::Fields::Difficulty, &2, &4)?
///     .all(problem::Fields::Tags, &["graphs"])?;
/// ```
///
/// Equivalent `MongoDB` filter:
///
/// ```mongodb
/// { $and: [{ difficulty: { $gte: 2 } }, { difficulty: { $lte: 4 } }, { tags: { $all: ["graphs"] } }] }
/// ```
///
/// Operators the builder doesn't cover can be added as raw fragments with
/// [`add_fragment`](crate::FilterBuilder::add_fragment), or passed whole as an
/// [`UntypedFilter`](crate::UntypedFilter).
///
/// ### Find pipeline
///
/// A [`FindPipeline`](crate::FindPipeline) runs filter, sort, paginate and
/// collect in that order. The total count is taken after filtering, so it
/// reports every match regardless of the requested page.
///
/// ```ignore
/// let pipeline = FindPipeline::new(
///     filter,
///     Sorted::<Problem>::new(Sort::new().desc("difficulty").asc("_id")),
/// )
/// .with_pagination(Pagination::new(1, 20)?);
///
/// let (total_count, page) = Problem::find(&problems, &pipeline).await?.into_parts();
/// ```
///
/// [`Pagination::ALL_ELEMENTS`](crate::Pagination::ALL_ELEMENTS) is the default.
/// A page whose skip count does not fit in an `i32` fails with
/// [`Error::Overflow`](crate::Error::Overflow) before the collect phase.
///
/// The sort and collect phases come from the [`FindStrategy`](crate::FindStrategy).
/// [`Unordered`](crate::Unordered) and [`Sorted`](crate::Sorted) cover the common
/// cases; implement the trait yourself to project fields or to load referenced
/// entities while collecting.
pub mod filters_and_finds {}

/// ## Partial updates
///
/// A changes struct mirrors the parts of an entity that may be updated. Each
/// field is a [`Field`](crate::Field): [`Field::Omit`](crate::Field::Omit)
/// leaves the document field untouched, [`Field::Set`](crate::Field::Set) writes
/// it, even when the value is `None`.
///
/// ```ignore
/// #[derive(Default, Update)]
/// #[update(entity = "Problem")]
/// struct DescriptionChanges {
///     #[update(set)]
///     legend: Field<String>,
///     #[update(set)]
///     notes: Field<Option<String>>,
/// }
///
/// #[derive(Default, Update)]
/// #[update(entity = "Problem", post_updates = "Self::touch")]
/// struct ProblemChanges {
///     #[update(set)]
///     title: Field<String>,
///     #[update(add_to_set, rename = "tags")]
///     tag: Field<String>,
///     #[update(nested)]
///     description: Field<DescriptionChanges>,
/// }
/// ```
///
/// Composition skips omitted fields, prefixes nested fields with the path of
/// their parent and groups the result by operator:
///
/// ```ignore
/// let changes = changes!(
///     ProblemChanges,
///     tag: "math".to_owned(),
///     description: changes!(DescriptionChanges, notes: None),
/// );
///
/// Problem::update_by_id(&problems, &id, &changes).await?;
/// ```
///
/// Equivalent `MongoDB` update:
///
/// ```mongodb
/// db.problem.updateOne({ _id: { $eq: id } }, {
///     $addToSet: { tags: "math" },
///     $set: { "description.notes": null },
/// })
/// ```
///
/// A changes tree where nothing is set composes to `None`, and
/// [`Entity::update_one`](crate::Entity::update_one) returns `false` without
/// calling the store.
///
/// ### Post updates
///
/// `post_updates` names a method returning extra operations that are appended
/// only when the node produced anything else, e.g. a modification timestamp.
///
/// ```ignore
/// impl ProblemChanges {
///     fn touch(&self, path: &FieldPath) -> patchwork::Result<Vec<UpdateOp>> {
///         Ok(vec![Verb::Set.apply(
///             path.push("last_update_time"),
///             Bson::DateTime(DateTime::now()),
///         )])
///     }
/// }
/// ```
///
/// ### Verbs
///
/// [`Verb`](crate::Verb) covers `$set`, `$inc`, `$push` and `$addToSet`. Any
/// other operator is one [`UpdateVerb`](crate::UpdateVerb) impl away, and is
/// attached to a field with `#[update(verb = "Max")]`.
///
/// ### Runtime changes
///
/// When the shape of an update is only known at runtime, assemble it with
/// [`UpdateBuilder`](crate::UpdateBuilder) instead. It composes exactly like a
/// derived changes struct.
pub mod updates {}

/// This library is named "Patchwork" because updates are stitched together from
/// many small patches.
pub mod naming {}
