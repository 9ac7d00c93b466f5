use crate::Result;
use futures_util::{FutureExt, TryStreamExt, future::BoxFuture};
use mongodb::{Collection, bson::Document};

/// A query session handed from phase to phase of a
/// [`FindPipeline`](crate::FindPipeline).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FindQuery {
    pub filter: Document,
    pub sort: Option<Document>,
    pub skip: Option<u64>,
    pub limit: Option<i64>,
    pub projection: Option<Document>,
}

impl FindQuery {
    pub fn new(filter: Document) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }
}

/// The document store operations the query and update layer relies on.
///
/// Failures are returned as [`Error::Store`](crate::Error::Store) and are never
/// retried.
pub trait CollectionAccess: Send + Sync {
    fn count(&self, filter: Document) -> BoxFuture<'_, Result<u64>>;

    /// Runs `query`, applying sort, skip, limit and projection in that order.
    fn find(&self, query: FindQuery) -> BoxFuture<'_, Result<Vec<Document>>>;

    /// Applies `update` to the first document matching `filter` and returns the
    /// number of matched documents.
    fn update_one(&self, filter: Document, update: Document) -> BoxFuture<'_, Result<u64>>;
}

impl CollectionAccess for Collection<Document> {
    fn count(&self, filter: Document) -> BoxFuture<'_, Result<u64>> {
        async move {
            let count = self.count_documents(filter).await?;

            Ok(count)
        }
        .boxed()
    }

    fn find(&self, query: FindQuery) -> BoxFuture<'_, Result<Vec<Document>>> {
        async move {
            let FindQuery {
                filter,
                sort,
                skip,
                limit,
                projection,
            } = query;

            let mut find = Collection::find(self, filter);

            if let Some(sort) = sort {
                find = find.sort(sort);
            }

            if let Some(skip) = skip {
                find = find.skip(skip);
            }

            if let Some(limit) = limit {
                find = find.limit(limit);
            }

            if let Some(projection) = projection {
                find = find.projection(projection);
            }

            let documents: Vec<Document> = find.await?.try_collect().await?;

            Ok(documents)
        }
        .boxed()
    }

    fn update_one(&self, filter: Document, update: Document) -> BoxFuture<'_, Result<u64>> {
        async move {
            let result = Collection::update_one(self, filter, update).await?;

            Ok(result.matched_count)
        }
        .boxed()
    }
}
