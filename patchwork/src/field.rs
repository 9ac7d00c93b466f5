use crate::{Error, Result};

/// A value that is either explicitly provided or left out.
///
/// `Field` is what separates "do not touch this field" from "write this
/// value", including writing `null`: `Field::<Option<String>>::Set(None)` is a
/// present value, [`Field::Omit`] is not.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Field<T> {
    Set(T),
    Omit,
}

impl<T> Field<T> {
    pub const fn empty() -> Self {
        Self::Omit
    }

    pub const fn of(value: T) -> Self {
        Self::Set(value)
    }

    pub fn from_opt(opt: Option<T>) -> Self {
        match opt {
            Some(val) => Self::Set(val),
            None => Self::Omit,
        }
    }

    pub const fn is_set(&self) -> bool {
        matches!(self, Self::Set(_))
    }

    pub fn get(&self) -> Result<&T> {
        match self {
            Self::Set(val) => Ok(val),
            Self::Omit => Err(Error::EmptyValue),
        }
    }

    pub fn set(&mut self, value: T) {
        *self = Self::Set(value);
    }

    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    pub const fn as_ref(&self) -> Field<&T> {
        match self {
            Self::Set(val) => Field::Set(val),
            Self::Omit => Field::Omit,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Set(val) => Some(val),
            Self::Omit => None,
        }
    }
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Self::Omit
    }
}

impl<T> From<T> for Field<T> {
    fn from(value: T) -> Self {
        Self::Set(value)
    }
}
