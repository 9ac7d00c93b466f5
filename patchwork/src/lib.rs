//! Patchwork composes `MongoDB` filters, paginated finds and partial updates
//! for typed entities.
//!
//! ## Example
//!
//! ```
//! use patchwork::{
//!     Entity, Field, FilterBuilder, FindPipeline, MemoryCollection, Pagination, Sort, Sorted,
//!     Update,
//! };
//! use serde::{Deserialize, Serialize};
//!
//! // Define an entity
//! #[derive(Serialize, Deserialize, Entity)]
//! struct Problem {
//!     #[serde(rename = "_id")]
//!     id: i32,
//!     title: String,
//!     difficulty: i32,
//! }
//!
//! // Define what may change about it
//! #[derive(Default, Update)]
//! #[update(entity = "Problem")]
//! struct ProblemChanges {
//!     #[update(set)]
//!     title: Field<String>,
//!     #[update(inc)]
//!     difficulty: Field<i32>,
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> patchwork::Result<()> {
//! let problems = MemoryCollection::new();
//!
//! for id in 0..3 {
//!     problems.insert_entity(&Problem {
//!         id,
//!         title: format!("Problem {id}"),
//!         difficulty: id,
//!     })?;
//! }
//!
//! // Find the hardest problem with a difficulty of at least 1
//! let pipeline = FindPipeline::new(
//!     FilterBuilder::new().gte(problem::Fields::Difficulty, &1)?,
//!     Sorted::<Problem>::new(Sort::new().desc(problem::Fields::Difficulty)),
//! )
//! .with_pagination(Pagination::new(0, 1)?);
//!
//! let found = Problem::find(&problems, &pipeline).await?;
//! assert_eq!(found.total_count(), 2);
//! assert_eq!(found.result_set()[0].id, 2);
//!
//! // Make the first problem harder, leaving its title alone
//! let changes = patchwork::changes!(ProblemChanges, difficulty: 10);
//! assert!(Problem::update_by_id(&problems, &0, &changes).await?);
//! # Ok(())
//! # }
//! ```
//!
//! See [`guides`] module to learn more!

#![warn(clippy::pedantic)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_errors_doc
)]

extern crate self as patchwork;

use futures_util::{
    FutureExt,
    future::{self, BoxFuture},
};
use mongodb::{Collection, Database, bson::Document};
use serde::{Serialize, de::DeserializeOwned};
use std::fmt::Display;

mod access;
mod error;
mod field;
mod filter;
mod find;
#[cfg(feature = "memory")]
mod memory;
mod pagination;
mod path;
mod projection;
mod sort;
pub mod update;

pub mod guides;

pub use access::{CollectionAccess, FindQuery};
pub use error::{Error, Result};
pub use field::Field;
pub use filter::{Filter, FilterBuilder, FilterOperator, UntypedFilter};
pub use find::{FindPipeline, FindResult, FindStrategy, Sorted, Unordered};
#[cfg(feature = "memory")]
pub use memory::{MemoryCollection, MemoryError};
pub use pagination::Pagination;
pub use path::FieldPath;
pub use projection::Projection;
pub use sort::{Order, Sort};
pub use update::{UpdateBuilder, UpdateInfo, UpdateOp, UpdateVerb, Verb};

pub use mongodb;

#[cfg(feature = "derive")]
pub use patchwork_macros::{Entity, Update, changes};

/// A type stored as one document of the collection [`Entity::COLLECTION_NAME`].
///
/// Usually derived, see [`guides::getting_started`].
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    type Id: Serialize + Send + Sync + 'static;

    /// Names of the top-level document fields.
    type Fields: Display + Into<FieldPath> + Send + 'static;

    const COLLECTION_NAME: &'static str;

    fn collection(db: &Database) -> Collection<Document> {
        db.collection(Self::COLLECTION_NAME)
    }

    fn count<'a, C: CollectionAccess + ?Sized>(
        access: &'a C,
        filter: &impl Filter<Self>,
    ) -> BoxFuture<'a, Result<u64>> {
        access.count(filter.to_document())
    }

    fn exists<'a, C: CollectionAccess + ?Sized>(
        access: &'a C,
        filter: &impl Filter<Self>,
    ) -> BoxFuture<'a, Result<bool>> {
        let count = Self::count(access, filter);

        async move {
            let count = count.await?;

            Ok(count > 0)
        }
        .boxed()
    }

    fn find<'a, C, S>(
        access: &'a C,
        pipeline: &'a FindPipeline<S>,
    ) -> BoxFuture<'a, Result<FindResult<Self>>>
    where
        C: CollectionAccess + ?Sized,
        S: FindStrategy<Entity = Self>,
    {
        pipeline.execute(access)
    }

    /// Applies `changes` to the first document matching `filter`.
    ///
    /// Returns whether exactly one document matched. Changes that compose to
    /// nothing return `false` without reaching the store.
    fn update_one<'a, C: CollectionAccess + ?Sized>(
        access: &'a C,
        filter: &impl Filter<Self>,
        changes: &impl UpdateInfo<Entity = Self>,
    ) -> BoxFuture<'a, Result<bool>> {
        let filter = filter.to_document();
        let update = changes.compose();

        async move {
            let Some(update) = update? else {
                log::debug!("{}: nothing to update", Self::COLLECTION_NAME);
                return Ok(false);
            };

            let matched = access.update_one(filter, update).await?;

            Ok(matched == 1)
        }
        .boxed()
    }

    fn update_by_id<'a, C: CollectionAccess + ?Sized>(
        access: &'a C,
        id: &Self::Id,
        changes: &impl UpdateInfo<Entity = Self>,
    ) -> BoxFuture<'a, Result<bool>> {
        match by_id::<Self>(id) {
            Ok(filter) => Self::update_one(access, &filter, changes),
            Err(error) => future::ready(Err(error)).boxed(),
        }
    }
}

/// Filter matching the entity with the given id.
pub fn by_id<E: Entity>(id: &E::Id) -> Result<FilterBuilder<E>> {
    FilterBuilder::new().eq("_id", id)
}
