use mongodb::bson::{Document, doc};
use std::sync::LazyLock;

/// Fields returned by a find.
///
/// An inclusion projection drops `_id` unless it is listed explicitly.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Projection {
    Include(&'static [&'static str]),
    Exclude(&'static [&'static str]),
}

impl Projection {
    pub fn to_document(&self) -> Document {
        static DOCUMENTS: LazyLock<dashmap::DashMap<Projection, Document>> =
            LazyLock::new(dashmap::DashMap::new);

        if let Some(document) = DOCUMENTS.get(self) {
            return document.clone();
        }

        let document = match self {
            Self::Include(fields) => {
                let mut has_id = false;
                let mut document = doc! {};

                for field in *fields {
                    if *field == "_id" {
                        has_id = true;
                    }

                    document.insert(*field, 1);
                }

                if !has_id {
                    document.insert("_id", 0);
                }

                document
            }
            Self::Exclude(fields) => {
                let mut document = doc! {};

                for field in *fields {
                    document.insert(*field, 0);
                }

                document
            }
        };

        DOCUMENTS.insert(*self, document.clone());
        document
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn include_hides_id() {
        assert_eq!(
            Projection::Include(&["title", "author"]).to_document(),
            doc! { "title": 1, "author": 1, "_id": 0 }
        );
        assert_eq!(
            Projection::Include(&["_id", "title"]).to_document(),
            doc! { "_id": 1, "title": 1 }
        );
    }

    #[test]
    fn exclude() {
        let projection = Projection::Exclude(&["content"]);

        assert_eq!(projection.to_document(), doc! { "content": 0 });
        assert_eq!(projection.to_document(), doc! { "content": 0 });
    }
}
