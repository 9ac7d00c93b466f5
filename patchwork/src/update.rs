//! Partial updates composed from sparse "changes" trees.
//!
//! A changes tree is any type implementing [`UpdateInfo`]. Most are generated
//! with `#[derive(Update)]`, dynamic ones are assembled with [`UpdateBuilder`].
//! Either way, composition walks the tree depth first, skips omitted fields,
//! extends the [`FieldPath`] through nested nodes and hands every present leaf
//! to its [`UpdateVerb`].

use crate::{Error, Field, FieldPath, Result};
use mongodb::bson::{self, Bson, Document, doc};
use serde::Serialize;
use std::{fmt, marker::PhantomData};

/// One field-level update operation, e.g. `$set: { "description.legend": "..." }`.
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateOp {
    operator: &'static str,
    path: FieldPath,
    value: Bson,
}

impl UpdateOp {
    pub fn new(operator: &'static str, path: FieldPath, value: Bson) -> Self {
        Self {
            operator,
            path,
            value,
        }
    }

    pub fn operator(&self) -> &'static str {
        self.operator
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    pub fn value(&self) -> &Bson {
        &self.value
    }

    pub fn to_document(&self) -> Document {
        combine(std::slice::from_ref(self))
    }
}

/// Turns a field address and a value into an update operation.
pub trait UpdateVerb {
    fn apply(&self, path: FieldPath, value: Bson) -> UpdateOp;
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Verb {
    Set,
    Inc,
    Push,
    AddToSet,
}

impl Verb {
    pub const fn operator(self) -> &'static str {
        match self {
            Self::Set => "$set",
            Self::Inc => "$inc",
            Self::Push => "$push",
            Self::AddToSet => "$addToSet",
        }
    }
}

impl UpdateVerb for Verb {
    fn apply(&self, path: FieldPath, value: Bson) -> UpdateOp {
        UpdateOp::new(self.operator(), path, value)
    }
}

/// A node of a changes tree targeting entity [`UpdateInfo::Entity`].
pub trait UpdateInfo {
    type Entity;

    /// Appends the operations of this node's own fields, addressed relative to
    /// the document root through `path`.
    fn resolve(&self, path: &FieldPath, ops: &mut Vec<UpdateOp>) -> Result<()>;

    /// Operations appended whenever the node contributes anything else.
    fn post_updates(&self, _path: &FieldPath) -> Result<Vec<UpdateOp>> {
        Ok(Vec::new())
    }

    fn compose_at(&self, path: &FieldPath) -> Result<Option<Vec<UpdateOp>>> {
        let mut ops = Vec::new();
        self.resolve(path, &mut ops)?;

        if ops.is_empty() {
            return Ok(None);
        }

        ops.extend(self.post_updates(path)?);

        Ok(Some(ops))
    }

    /// Builds the combined update document, or `None` if nothing was set.
    fn compose(&self) -> Result<Option<Document>> {
        let composed = self.compose_at(&FieldPath::root())?;

        Ok(composed.map(|ops| combine(&ops)))
    }
}

impl<N: UpdateInfo> UpdateInfo for Field<N> {
    type Entity = N::Entity;

    fn resolve(&self, path: &FieldPath, ops: &mut Vec<UpdateOp>) -> Result<()> {
        match self {
            Field::Set(node) => node.resolve(path, ops),
            Field::Omit => Ok(()),
        }
    }

    fn post_updates(&self, path: &FieldPath) -> Result<Vec<UpdateOp>> {
        match self {
            Field::Set(node) => node.post_updates(path),
            Field::Omit => Ok(Vec::new()),
        }
    }
}

#[doc(hidden)]
pub fn resolve_leaf<T: Serialize, V: UpdateVerb + ?Sized>(
    field: &Field<T>,
    verb: &V,
    parent: &FieldPath,
    name: &str,
    ops: &mut Vec<UpdateOp>,
) -> Result<()> {
    let Field::Set(value) = field else {
        return Ok(());
    };

    let op = verb.apply(parent.push(name), bson::to_bson(value)?);
    log::trace!("{} {} = {}", op.operator, op.path, op.value);
    ops.push(op);

    Ok(())
}

#[doc(hidden)]
pub fn resolve_nested<E, N: UpdateInfo<Entity = E>>(
    node: &N,
    parent: &FieldPath,
    name: &str,
    ops: &mut Vec<UpdateOp>,
) -> Result<()> {
    if let Some(nested) = node.compose_at(&parent.push(name))? {
        ops.extend(nested);
    }

    Ok(())
}

/// Wraps a field without an update role so the derive can dispatch on its type.
///
/// Method resolution prefers [`UntaggedNested`], which recurses into changes
/// trees of the same entity, and falls back to [`UntaggedOther`], which
/// contributes nothing.
#[doc(hidden)]
pub struct Untagged<'a, E, T>(&'a T, PhantomData<fn() -> E>);

impl<'a, E, T> Untagged<'a, E, T> {
    pub fn new(value: &'a T) -> Self {
        Self(value, PhantomData)
    }
}

#[doc(hidden)]
pub trait UntaggedNested {
    fn resolve_untagged(
        &self,
        parent: &FieldPath,
        name: &str,
        ops: &mut Vec<UpdateOp>,
    ) -> Result<()>;
}

impl<E, N: UpdateInfo<Entity = E>> UntaggedNested for Untagged<'_, E, N> {
    fn resolve_untagged(
        &self,
        parent: &FieldPath,
        name: &str,
        ops: &mut Vec<UpdateOp>,
    ) -> Result<()> {
        resolve_nested(self.0, parent, name, ops)
    }
}

#[doc(hidden)]
pub trait UntaggedOther {
    fn resolve_untagged(
        &self,
        _parent: &FieldPath,
        _name: &str,
        _ops: &mut Vec<UpdateOp>,
    ) -> Result<()> {
        Ok(())
    }
}

impl<E, T> UntaggedOther for &Untagged<'_, E, T> {}

/// Groups operations by operator into a single update document.
///
/// Later operations on the same path replace earlier ones.
pub fn combine(ops: &[UpdateOp]) -> Document {
    let mut statement = Document::new();

    for op in ops {
        let path = op.path.to_string();

        if let Ok(fields) = statement.get_document_mut(op.operator) {
            fields.insert(path, op.value.clone());
        } else {
            statement.insert(op.operator, doc! { path: op.value.clone() });
        }
    }

    statement
}

type BoxedVerb = Box<dyn UpdateVerb + Send + Sync>;

enum Member<E> {
    Leaf {
        segment: String,
        value: Field<Bson>,
        verb: BoxedVerb,
    },
    Nested {
        segment: String,
        node: UpdateBuilder<E>,
    },
}

/// Changes tree assembled at runtime from `(segment, value, verb)` triples.
///
/// ```
/// # use patchwork::{Field, UpdateBuilder, UpdateInfo, Verb};
/// # struct Problem;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let description = UpdateBuilder::<Problem>::new().set("legend", Field::Set("Sum two numbers"))?;
///
/// let changes = UpdateBuilder::<Problem>::new()
///     .set("title", Field::<String>::Omit)?
///     .nested("description", description)?
///     .always("revision", &1, Verb::Inc)?;
///
/// let update = changes.compose()?.unwrap();
/// assert_eq!(update.get_document("$set")?.get_str("description.legend")?, "Sum two numbers");
/// assert_eq!(update.get_document("$inc")?.get_i32("revision")?, 1);
/// # Ok(())
/// # }
/// ```
pub struct UpdateBuilder<E> {
    members: Vec<Member<E>>,
    post: Vec<(String, Bson, BoxedVerb)>,
    entity: PhantomData<fn() -> E>,
}

impl<E> UpdateBuilder<E> {
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
            post: Vec::new(),
            entity: PhantomData,
        }
    }

    pub fn set<T: Serialize>(self, segment: &str, value: Field<T>) -> Result<Self> {
        self.leaf(segment, value, Verb::Set)
    }

    pub fn leaf<T: Serialize>(
        mut self,
        segment: &str,
        value: Field<T>,
        verb: impl UpdateVerb + Send + Sync + 'static,
    ) -> Result<Self> {
        check_segment(segment)?;

        let value = match value {
            Field::Set(value) => Field::Set(bson::to_bson(&value)?),
            Field::Omit => Field::Omit,
        };

        self.members.push(Member::Leaf {
            segment: segment.to_owned(),
            value,
            verb: Box::new(verb),
        });

        Ok(self)
    }

    pub fn nested(mut self, segment: &str, node: UpdateBuilder<E>) -> Result<Self> {
        check_segment(segment)?;

        self.members.push(Member::Nested {
            segment: segment.to_owned(),
            node,
        });

        Ok(self)
    }

    /// Registers an operation emitted only if the node contributes any other.
    pub fn always<T: Serialize + ?Sized>(
        mut self,
        segment: &str,
        value: &T,
        verb: impl UpdateVerb + Send + Sync + 'static,
    ) -> Result<Self> {
        check_segment(segment)?;

        self.post
            .push((segment.to_owned(), bson::to_bson(value)?, Box::new(verb)));

        Ok(self)
    }
}

fn check_segment(segment: &str) -> Result<()> {
    if segment.is_empty() {
        return Err(Error::invalid_argument(
            "segment",
            "path segment must not be empty",
        ));
    }

    Ok(())
}

impl<E> UpdateInfo for UpdateBuilder<E> {
    type Entity = E;

    fn resolve(&self, path: &FieldPath, ops: &mut Vec<UpdateOp>) -> Result<()> {
        for member in &self.members {
            match member {
                Member::Leaf {
                    segment,
                    value,
                    verb,
                } => resolve_leaf(value, verb.as_ref(), path, segment, ops)?,
                Member::Nested { segment, node } => resolve_nested(node, path, segment, ops)?,
            }
        }

        Ok(())
    }

    fn post_updates(&self, path: &FieldPath) -> Result<Vec<UpdateOp>> {
        let ops = self
            .post
            .iter()
            .map(|(segment, value, verb)| verb.apply(path.push(segment), value.clone()))
            .collect();

        Ok(ops)
    }
}

impl<E> Default for UpdateBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for UpdateBuilder<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ops = Vec::new();
        let resolved = self.resolve(&FieldPath::root(), &mut ops);

        f.debug_struct("UpdateBuilder")
            .field("ops", &resolved.map(|()| ops))
            .finish_non_exhaustive()
    }
}
