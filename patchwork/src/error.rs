use mongodb::bson;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid argument `{name}`: {message}")]
    InvalidArgument {
        name: &'static str,
        message: String,
    },

    #[error("skip count overflows for page {page} with {items_per_page} items per page")]
    Overflow { page: i32, items_per_page: i32 },

    #[error("field value is not set")]
    EmptyValue,

    #[error("failed to encode value: {0}")]
    Encode(#[from] bson::ser::Error),

    #[error("failed to decode entity: {0}")]
    Decode(#[from] bson::de::Error),

    #[error("store error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    pub(crate) fn invalid_argument(name: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name,
            message: message.into(),
        }
    }

    /// Wraps a failure raised by a [`CollectionAccess`](crate::CollectionAccess)
    /// implementation.
    pub fn store(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Store(Box::new(error))
    }
}

impl From<mongodb::error::Error> for Error {
    fn from(value: mongodb::error::Error) -> Self {
        Self::store(value)
    }
}
