use crate::{
    CollectionAccess, Error, FilterBuilder, FindQuery, Pagination, Projection, Result, Sort,
};
use futures_util::{FutureExt, future::BoxFuture};
use mongodb::bson;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

#[derive(Clone, Debug, PartialEq)]
pub struct FindResult<E> {
    total_count: u64,
    result_set: Vec<E>,
}

impl<E> FindResult<E> {
    pub fn new(total_count: u64, result_set: Vec<E>) -> Self {
        Self {
            total_count,
            result_set,
        }
    }

    /// Number of matching documents before pagination.
    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn result_set(&self) -> &[E] {
        &self.result_set
    }

    pub fn into_result_set(self) -> Vec<E> {
        self.result_set
    }

    pub fn into_parts(self) -> (u64, Vec<E>) {
        (self.total_count, self.result_set)
    }
}

/// Per-entity behaviour of the sort and collect phases of a [`FindPipeline`].
pub trait FindStrategy: Send + Sync {
    type Entity: DeserializeOwned + Send + 'static;

    fn sort(&self) -> Sort {
        Sort::new()
    }

    fn projection(&self) -> Option<Projection> {
        None
    }

    fn collect<'a, C: CollectionAccess + ?Sized>(
        &'a self,
        access: &'a C,
        query: FindQuery,
    ) -> BoxFuture<'a, Result<Vec<Self::Entity>>> {
        async move {
            let documents = access.find(query).await?;

            documents
                .into_iter()
                .map(|document| bson::from_document(document).map_err(Error::from))
                .collect()
        }
        .boxed()
    }
}

#[derive(Debug)]
pub struct Unordered<E>(PhantomData<fn() -> E>);

impl<E> Unordered<E> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<E> Default for Unordered<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: DeserializeOwned + Send + 'static> FindStrategy for Unordered<E> {
    type Entity = E;
}

#[derive(Debug)]
pub struct Sorted<E> {
    sort: Sort,
    projection: Option<Projection>,
    entity: PhantomData<fn() -> E>,
}

impl<E> Sorted<E> {
    pub fn new(sort: Sort) -> Self {
        Self {
            sort,
            projection: None,
            entity: PhantomData,
        }
    }

    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = Some(projection);
        self
    }
}

impl<E: DeserializeOwned + Send + 'static> FindStrategy for Sorted<E> {
    type Entity = E;

    fn sort(&self) -> Sort {
        self.sort.clone()
    }

    fn projection(&self) -> Option<Projection> {
        self.projection
    }
}

/// Filter, sort, paginate and collect, in that order.
///
/// The total count is taken right after filtering, so it ignores pagination.
/// A store failure in any phase fails the whole pipeline.
#[derive(Debug)]
pub struct FindPipeline<S: FindStrategy> {
    filter: FilterBuilder<S::Entity>,
    strategy: S,
    pagination: Pagination,
}

impl<S: FindStrategy> FindPipeline<S> {
    pub fn new(filter: FilterBuilder<S::Entity>, strategy: S) -> Self {
        Self {
            filter,
            strategy,
            pagination: Pagination::ALL_ELEMENTS,
        }
    }

    pub fn filter(&self) -> &FilterBuilder<S::Entity> {
        &self.filter
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn strategy_mut(&mut self) -> &mut S {
        &mut self.strategy
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    pub fn set_pagination(&mut self, pagination: Pagination) {
        self.pagination = pagination;
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    pub fn execute<'a, C: CollectionAccess + ?Sized>(
        &'a self,
        access: &'a C,
    ) -> BoxFuture<'a, Result<FindResult<S::Entity>>> {
        async move {
            // Filter
            let mut query = FindQuery::new(self.filter.build());
            log::debug!("find: filter {}", query.filter);

            let total_count = access.count(query.filter.clone()).await?;
            log::debug!("find: {total_count} matching documents");

            // Sort
            query.sort = self.strategy.sort().to_document();

            // Paginate
            let skip = self.pagination.skip()?;
            query.skip = Some(u64::try_from(skip).unwrap_or_default());
            query.limit = Some(i64::from(self.pagination.items_per_page()));
            log::debug!(
                "find: page {} of size {}",
                self.pagination.page(),
                self.pagination.items_per_page()
            );

            // Collect
            query.projection = self
                .strategy
                .projection()
                .map(|projection| projection.to_document());

            let result_set = self.strategy.collect(access, query).await?;
            log::debug!("find: collected {} entities", result_set.len());

            Ok(FindResult::new(total_count, result_set))
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::future;
    use mongodb::bson::{Document, doc};
    use parking_lot::Mutex;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Language {
        identifier: String,
    }

    #[derive(Default)]
    struct RecordingAccess {
        queries: Mutex<Vec<FindQuery>>,
    }

    impl CollectionAccess for RecordingAccess {
        fn count(&self, _filter: Document) -> BoxFuture<'_, Result<u64>> {
            future::ready(Ok(42)).boxed()
        }

        fn find(&self, query: FindQuery) -> BoxFuture<'_, Result<Vec<Document>>> {
            self.queries.lock().push(query);
            future::ready(Ok(vec![doc! { "identifier": "rust" }])).boxed()
        }

        fn update_one(&self, _filter: Document, _update: Document) -> BoxFuture<'_, Result<u64>> {
            future::ready(Ok(0)).boxed()
        }
    }

    #[tokio::test]
    async fn phases_shape_the_query() {
        let access = RecordingAccess::default();
        let filter = FilterBuilder::new().eq("enabled", &true).unwrap();
        let pipeline = FindPipeline::new(
            filter,
            Sorted::<Language>::new(Sort::new().asc("identifier"))
                .with_projection(Projection::Exclude(&["script"])),
        )
        .with_pagination(Pagination::new(3, 5).unwrap());

        let result = pipeline.execute(&access).await.unwrap();

        assert_eq!(result.total_count(), 42);
        assert_eq!(
            result.result_set(),
            [Language {
                identifier: "rust".to_owned()
            }]
        );
        assert_eq!(
            access.queries.lock().as_slice(),
            [FindQuery {
                filter: doc! { "enabled": { "$eq": true } },
                sort: Some(doc! { "identifier": 1 }),
                skip: Some(15),
                limit: Some(5),
                projection: Some(doc! { "script": 0 }),
            }]
        );
    }

    #[tokio::test]
    async fn defaults_to_all_elements_unsorted() {
        let access = RecordingAccess::default();
        let pipeline = FindPipeline::new(FilterBuilder::new(), Unordered::<Language>::new());

        assert_eq!(pipeline.pagination(), Pagination::ALL_ELEMENTS);

        pipeline.execute(&access).await.unwrap();

        let queries = access.queries.lock();
        assert_eq!(queries[0].filter, doc! {});
        assert_eq!(queries[0].sort, None);
        assert_eq!(queries[0].skip, Some(0));
        assert_eq!(queries[0].limit, Some(i64::from(i32::MAX)));
    }

    #[tokio::test]
    async fn skip_overflow_aborts_before_collecting() {
        let access = RecordingAccess::default();
        let pipeline = FindPipeline::new(FilterBuilder::new(), Unordered::<Language>::new())
            .with_pagination(Pagination::new(i32::MAX, 10).unwrap());

        let result = pipeline.execute(&access).await;

        assert!(matches!(result, Err(Error::Overflow { .. })));
        assert!(access.queries.lock().is_empty());
    }
}
