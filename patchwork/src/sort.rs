use crate::FieldPath;
use mongodb::bson::{Bson, Document};

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    fn to_bson(self) -> Bson {
        match self {
            Self::Asc => Bson::Int32(1),
            Self::Desc => Bson::Int32(-1),
        }
    }
}

/// Sort keys in priority order: ties on a key are broken by the keys after it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Sort(Vec<(FieldPath, Order)>);

impl Sort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by(mut self, path: impl Into<FieldPath>, order: Order) -> Self {
        self.0.push((path.into(), order));
        self
    }

    pub fn asc(self, path: impl Into<FieldPath>) -> Self {
        self.by(path, Order::Asc)
    }

    pub fn desc(self, path: impl Into<FieldPath>) -> Self {
        self.by(path, Order::Desc)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> &[(FieldPath, Order)] {
        &self.0
    }

    /// `None` leaves the order up to the store.
    pub fn to_document(&self) -> Option<Document> {
        if self.is_empty() {
            return None;
        }

        let document = self
            .0
            .iter()
            .map(|(path, order)| (path.to_string(), order.to_bson()))
            .collect();

        Some(document)
    }
}
