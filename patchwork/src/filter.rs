use crate::{Error, FieldPath, Result};
use mongodb::bson::{self, Bson, Document, doc};
use serde::Serialize;
use std::{fmt, marker::PhantomData};

pub trait Filter<E>: Send {
    fn to_document(&self) -> Document;
}

#[derive(Debug)]
pub struct UntypedFilter<E>(Document, PhantomData<fn() -> E>);

impl<E> UntypedFilter<E> {
    pub fn new(document: Document) -> Self {
        Self(document, PhantomData)
    }
}

impl<E> Filter<E> for UntypedFilter<E> {
    fn to_document(&self) -> Document {
        self.0.clone()
    }
}

/// A `MongoDB` [query operator](https://www.mongodb.com/docs/manual/reference/operator/query/)
/// applied to a single field.
#[derive(Clone, Debug, PartialEq)]
pub enum FilterOperator {
    Eq(Bson),
    Ne(Bson),
    Gt(Bson),
    Gte(Bson),
    Lt(Bson),
    Lte(Bson),
    In(Vec<Bson>),
    Nin(Vec<Bson>),
    All(Vec<Bson>),
    Exists(bool),
}

impl FilterOperator {
    pub fn to_document(&self) -> Document {
        let (operator, bson) = match self {
            Self::Eq(val) => ("$eq", val.clone()),
            Self::Ne(val) => ("$ne", val.clone()),
            Self::Gt(val) => ("$gt", val.clone()),
            Self::Gte(val) => ("$gte", val.clone()),
            Self::Lt(val) => ("$lt", val.clone()),
            Self::Lte(val) => ("$lte", val.clone()),
            Self::In(vals) => ("$in", Bson::Array(vals.clone())),
            Self::Nin(vals) => ("$nin", Bson::Array(vals.clone())),
            Self::All(vals) => ("$all", Bson::Array(vals.clone())),
            Self::Exists(exists) => ("$exists", Bson::Boolean(*exists)),
        };

        doc! { operator: bson }
    }
}

/// Accumulates independent predicates over an entity and joins them with `$and`.
///
/// Every method consumes the builder and hands it back on success, so a failed
/// predicate never leaves a half-built filter behind:
///
/// ```
/// # use patchwork::{FilterBuilder, Result};
/// # struct Problem;
/// # fn main() -> Result<()> {
/// let filter = FilterBuilder::<Problem>::new()
///     .eq("author", "nikis05")?
///     .range("difficulty", &2, &5)?
///     .all("tags", &["graphs", "dp"])?;
///
/// assert_eq!(filter.len(), 4);
/// # Ok(())
/// # }
/// ```
///
/// Domain specific builders usually wrap a `FilterBuilder` and expose one method
/// per supported predicate.
pub struct FilterBuilder<E> {
    fragments: Vec<Document>,
    entity: PhantomData<fn() -> E>,
}

impl<E> FilterBuilder<E> {
    pub fn new() -> Self {
        Self {
            fragments: Vec::new(),
            entity: PhantomData,
        }
    }

    pub fn add_fragment(mut self, fragment: Document) -> Result<Self> {
        if fragment.is_empty() {
            return Err(Error::invalid_argument(
                "fragment",
                "filter fragment must not be empty",
            ));
        }

        self.fragments.push(fragment);
        Ok(self)
    }

    pub fn field(self, path: impl Into<FieldPath>, operator: &FilterOperator) -> Result<Self> {
        let path = path.into();

        if path.is_root() {
            return Err(Error::invalid_argument(
                "path",
                "filter field path must not be empty",
            ));
        }

        let key = String::from(path);
        self.add_fragment(doc! { key: operator.to_document() })
    }

    pub fn eq<T: Serialize + ?Sized>(self, path: impl Into<FieldPath>, value: &T) -> Result<Self> {
        let value = bson::to_bson(value)?;
        self.field(path, &FilterOperator::Eq(value))
    }

    pub fn ne<T: Serialize + ?Sized>(self, path: impl Into<FieldPath>, value: &T) -> Result<Self> {
        let value = bson::to_bson(value)?;
        self.field(path, &FilterOperator::Ne(value))
    }

    pub fn gt<T: Serialize + ?Sized>(self, path: impl Into<FieldPath>, value: &T) -> Result<Self> {
        let value = bson::to_bson(value)?;
        self.field(path, &FilterOperator::Gt(value))
    }

    pub fn gte<T: Serialize + ?Sized>(self, path: impl Into<FieldPath>, value: &T) -> Result<Self> {
        let value = bson::to_bson(value)?;
        self.field(path, &FilterOperator::Gte(value))
    }

    pub fn lt<T: Serialize + ?Sized>(self, path: impl Into<FieldPath>, value: &T) -> Result<Self> {
        let value = bson::to_bson(value)?;
        self.field(path, &FilterOperator::Lt(value))
    }

    pub fn lte<T: Serialize + ?Sized>(self, path: impl Into<FieldPath>, value: &T) -> Result<Self> {
        let value = bson::to_bson(value)?;
        self.field(path, &FilterOperator::Lte(value))
    }

    /// Adds `min <= path` and `path <= max` as two separate fragments.
    pub fn range<T: Serialize + ?Sized>(
        self,
        path: impl Into<FieldPath>,
        min: &T,
        max: &T,
    ) -> Result<Self> {
        let path = path.into();
        self.gte(&path, min)?.lte(path, max)
    }

    pub fn is_in<T: Serialize>(self, path: impl Into<FieldPath>, values: &[T]) -> Result<Self> {
        let values = to_bson_array(values)?;
        self.field(path, &FilterOperator::In(values))
    }

    pub fn not_in<T: Serialize>(self, path: impl Into<FieldPath>, values: &[T]) -> Result<Self> {
        let values = to_bson_array(values)?;
        self.field(path, &FilterOperator::Nin(values))
    }

    /// Matches array fields containing every one of `values`.
    pub fn all<T: Serialize>(self, path: impl Into<FieldPath>, values: &[T]) -> Result<Self> {
        let values = to_bson_array(values)?;
        self.field(path, &FilterOperator::All(values))
    }

    pub fn exists(self, path: impl Into<FieldPath>) -> Result<Self> {
        self.field(path, &FilterOperator::Exists(true))
    }

    pub fn not_exists(self, path: impl Into<FieldPath>) -> Result<Self> {
        self.field(path, &FilterOperator::Exists(false))
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn fragments(&self) -> &[Document] {
        &self.fragments
    }

    pub fn build(&self) -> Document {
        match self.fragments.as_slice() {
            [] => doc! {},
            [fragment] => fragment.clone(),
            fragments => doc! { "$and": fragments.to_vec() },
        }
    }
}

fn to_bson_array<T: Serialize>(values: &[T]) -> Result<Vec<Bson>> {
    values
        .iter()
        .map(|value| bson::to_bson(value).map_err(Error::from))
        .collect()
}

impl<E> Filter<E> for FilterBuilder<E> {
    fn to_document(&self) -> Document {
        self.build()
    }
}

impl<E> Default for FilterBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for FilterBuilder<E> {
    fn clone(&self) -> Self {
        Self {
            fragments: self.fragments.clone(),
            entity: PhantomData,
        }
    }
}

impl<E> fmt::Debug for FilterBuilder<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterBuilder")
            .field("fragments", &self.fragments)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Problem;

    #[test]
    fn empty_builder_matches_everything() {
        let builder = FilterBuilder::<Problem>::new();

        assert!(builder.is_empty());
        assert_eq!(builder.build(), doc! {});
    }

    #[test]
    fn single_fragment_is_used_verbatim() {
        let builder = FilterBuilder::<Problem>::new()
            .eq("title", "A + B")
            .unwrap();

        assert_eq!(builder.build(), doc! { "title": { "$eq": "A + B" } });
    }

    #[test]
    fn fragments_are_joined_with_and() {
        let builder = FilterBuilder::<Problem>::new()
            .eq("author", "kit")
            .unwrap()
            .range("difficulty", &1, &3)
            .unwrap();

        assert_eq!(
            builder.build(),
            doc! {
                "$and": [
                    { "author": { "$eq": "kit" } },
                    { "difficulty": { "$gte": 1 } },
                    { "difficulty": { "$lte": 3 } },
                ]
            }
        );
    }

    #[test]
    fn build_does_not_consume() {
        let builder = FilterBuilder::<Problem>::new().exists("archive_id").unwrap();
        let first = builder.build();
        let builder = builder.not_exists("deleted").unwrap();

        assert_eq!(first, doc! { "archive_id": { "$exists": true } });
        assert_eq!(builder.len(), 2);
    }

    #[test]
    fn set_operators() {
        let builder = FilterBuilder::<Problem>::new()
            .all("tags", &["dp", "greedy"])
            .unwrap()
            .is_in("source", &["icpc"])
            .unwrap()
            .not_in("author", &["bot"])
            .unwrap();

        assert_eq!(
            builder.fragments(),
            [
                doc! { "tags": { "$all": ["dp", "greedy"] } },
                doc! { "source": { "$in": ["icpc"] } },
                doc! { "author": { "$nin": ["bot"] } },
            ]
        );
    }

    #[test]
    fn rejects_empty_fragment() {
        let result = FilterBuilder::<Problem>::new().add_fragment(doc! {});

        assert!(matches!(
            result,
            Err(Error::InvalidArgument {
                name: "fragment",
                ..
            })
        ));
    }

    #[test]
    fn rejects_root_path() {
        let result = FilterBuilder::<Problem>::new().eq(FieldPath::root(), &1);

        assert!(matches!(
            result,
            Err(Error::InvalidArgument { name: "path", .. })
        ));
    }

    #[test]
    fn nested_paths() {
        let verdict = FieldPath::root().push("result").push("verdict");
        let builder = FilterBuilder::<Problem>::new().eq(verdict, "accepted").unwrap();

        assert_eq!(
            builder.build(),
            doc! { "result.verdict": { "$eq": "accepted" } }
        );
    }
}
