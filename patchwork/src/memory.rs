//! An in-process [`CollectionAccess`] that interprets the filter, sort,
//! projection and update documents produced by this crate.
//!
//! Useful in tests and for small embedded data sets. Only the operators listed
//! below are understood, anything else fails with [`MemoryError`]:
//!
//! - filters: `$and`, `$or`, `$eq`, `$ne`, `$gt`, `$gte`, `$lt`, `$lte`, `$in`,
//!   `$nin`, `$all`, `$exists` and implicit equality
//! - updates: `$set`, `$unset`, `$inc`, `$push`, `$addToSet`

use crate::{CollectionAccess, Error, FindQuery, Result};
use futures_util::{
    FutureExt,
    future::{self, BoxFuture},
};
use mongodb::bson::{self, Bson, Document};
use parking_lot::RwLock;
use serde::Serialize;
use std::cmp::Ordering;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("unsupported operator `{0}`")]
    UnsupportedOperator(String),

    #[error("malformed operand for `{0}`")]
    MalformedOperand(String),

    #[error("cannot apply `{operator}` to `{path}`")]
    Conflict { operator: String, path: String },
}

impl From<MemoryError> for Error {
    fn from(value: MemoryError) -> Self {
        Self::store(value)
    }
}

fn conflict(operator: &str, path: &str) -> MemoryError {
    MemoryError::Conflict {
        operator: operator.to_owned(),
        path: path.to_owned(),
    }
}

#[derive(Debug, Default)]
pub struct MemoryCollection {
    documents: RwLock<Vec<Document>>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, document: Document) {
        self.documents.write().push(document);
    }

    pub fn insert_entity<T: Serialize>(&self, entity: &T) -> Result<()> {
        let document = bson::to_document(entity)?;
        self.insert(document);

        Ok(())
    }

    pub fn documents(&self) -> Vec<Document> {
        self.documents.read().clone()
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    fn count_matching(&self, filter: &Document) -> Result<u64, MemoryError> {
        let mut count = 0;

        for document in self.documents.read().iter() {
            if matches(document, filter)? {
                count += 1;
            }
        }

        Ok(count)
    }

    fn find_matching(&self, query: &FindQuery) -> Result<Vec<Document>, MemoryError> {
        let mut found = Vec::new();

        for document in self.documents.read().iter() {
            if matches(document, &query.filter)? {
                found.push(document.clone());
            }
        }

        if let Some(sort) = &query.sort {
            let keys = sort_keys(sort)?;
            found.sort_by(|a, b| compare_documents(a, b, &keys));
        }

        let skip = query
            .skip
            .map_or(0, |skip| usize::try_from(skip).unwrap_or(usize::MAX));

        let limit = match query.limit {
            Some(limit) if limit != 0 => usize::try_from(limit.unsigned_abs()).unwrap_or(usize::MAX),
            _ => usize::MAX,
        };

        let page = found.into_iter().skip(skip).take(limit);

        match &query.projection {
            Some(projection) => page
                .map(|document| project(&document, projection))
                .collect(),
            None => Ok(page.collect()),
        }
    }

    fn update_first(&self, filter: &Document, update: &Document) -> Result<u64, MemoryError> {
        let mut documents = self.documents.write();

        for document in documents.iter_mut() {
            if matches(document, filter)? {
                let mut updated = document.clone();
                apply_update(&mut updated, update)?;
                *document = updated;

                return Ok(1);
            }
        }

        Ok(0)
    }
}

impl FromIterator<Document> for MemoryCollection {
    fn from_iter<T: IntoIterator<Item = Document>>(iter: T) -> Self {
        Self {
            documents: RwLock::new(iter.into_iter().collect()),
        }
    }
}

impl CollectionAccess for MemoryCollection {
    fn count(&self, filter: Document) -> BoxFuture<'_, Result<u64>> {
        future::ready(self.count_matching(&filter).map_err(Error::from)).boxed()
    }

    fn find(&self, query: FindQuery) -> BoxFuture<'_, Result<Vec<Document>>> {
        future::ready(self.find_matching(&query).map_err(Error::from)).boxed()
    }

    fn update_one(&self, filter: Document, update: Document) -> BoxFuture<'_, Result<u64>> {
        future::ready(self.update_first(&filter, &update).map_err(Error::from)).boxed()
    }
}

fn get_path<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;

    for segment in segments {
        current = match current {
            Bson::Document(nested) => nested.get(segment)?,
            _ => return None,
        };
    }

    Some(current)
}

fn set_path(
    document: &mut Document,
    operator: &str,
    path: &str,
    value: Bson,
) -> Result<(), MemoryError> {
    let mut segments = path.split('.').collect::<Vec<_>>();
    let last = segments.pop().ok_or_else(|| conflict(operator, path))?;

    let mut current = document;

    for segment in segments {
        if !current.contains_key(segment) {
            current.insert(segment, Document::new());
        }

        current = match current.get_mut(segment) {
            Some(Bson::Document(nested)) => nested,
            _ => return Err(conflict(operator, path)),
        };
    }

    current.insert(last, value);

    Ok(())
}

fn remove_path(document: &mut Document, path: &str) {
    let Some((parent, last)) = path.rsplit_once('.') else {
        document.remove(path);
        return;
    };

    let mut current = document;

    for segment in parent.split('.') {
        match current.get_mut(segment) {
            Some(Bson::Document(nested)) => current = nested,
            _ => return,
        }
    }

    current.remove(last);
}

#[allow(clippy::cast_precision_loss)]
fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(value) => Some(f64::from(*value)),
        Bson::Int64(value) => Some(*value as f64),
        Bson::Double(value) => Some(*value),
        _ => None,
    }
}

/// `NaN` sorts below every number and equals itself.
fn compare_doubles(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Exact comparison of an integer against a double, without rounding either.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn compare_integer_double(integer: i64, double: f64) -> Ordering {
    // 2^63, the first double above every `i64`.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;

    if double.is_nan() {
        return Ordering::Greater;
    }

    if double >= LIMIT {
        return Ordering::Less;
    }

    if double < -LIMIT {
        return Ordering::Greater;
    }

    let whole = double.trunc();

    integer.cmp(&(whole as i64)).then_with(|| {
        let fraction = double - whole;

        if fraction > 0.0 {
            Ordering::Less
        } else if fraction < 0.0 {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    })
}

/// Integers compare exactly; doubles only when one side is a double.
fn compare_numbers(a: &Bson, b: &Bson) -> Option<Ordering> {
    let integer = |value: &Bson| match value {
        Bson::Int32(value) => Some(i64::from(*value)),
        Bson::Int64(value) => Some(*value),
        _ => None,
    };

    let ordering = match (a, b) {
        (Bson::Double(a), Bson::Double(b)) => compare_doubles(*a, *b),
        (Bson::Double(a), b) => compare_integer_double(integer(b)?, *a).reverse(),
        (a, Bson::Double(b)) => compare_integer_double(integer(a)?, *b),
        (a, b) => integer(a)?.cmp(&integer(b)?),
    };

    Some(ordering)
}

/// Orders two values of the same kind; `None` for values that don't compare.
fn compare_bson(a: &Bson, b: &Bson) -> Option<Ordering> {
    match (a, b) {
        (Bson::String(a), Bson::String(b)) | (Bson::Symbol(a), Bson::Symbol(b)) => Some(a.cmp(b)),
        (Bson::Boolean(a), Bson::Boolean(b)) => Some(a.cmp(b)),
        (Bson::DateTime(a), Bson::DateTime(b)) => Some(a.cmp(b)),
        (Bson::ObjectId(a), Bson::ObjectId(b)) => Some(a.cmp(b)),
        (Bson::Null, Bson::Null) => Some(Ordering::Equal),
        _ => compare_numbers(a, b),
    }
}

fn type_rank(value: &Bson) -> u8 {
    match value {
        Bson::Null | Bson::Undefined => 0,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) => 1,
        Bson::Decimal128(_) => 2,
        Bson::String(_) => 3,
        Bson::Symbol(_) => 4,
        Bson::Document(_) => 5,
        Bson::Array(_) => 6,
        Bson::Binary(_) => 7,
        Bson::ObjectId(_) => 8,
        Bson::Boolean(_) => 9,
        Bson::DateTime(_) => 10,
        Bson::Timestamp(_) => 11,
        _ => 12,
    }
}

fn values_equal(a: &Bson, b: &Bson) -> bool {
    compare_numbers(a, b).map_or_else(|| a == b, Ordering::is_eq)
}

fn equals(found: Option<&Bson>, value: &Bson) -> bool {
    match found {
        None => matches!(value, Bson::Null),
        Some(found @ Bson::Array(items)) => {
            found == value || items.iter().any(|item| values_equal(item, value))
        }
        Some(found) => values_equal(found, value),
    }
}

fn compares(found: Option<&Bson>, operand: &Bson, accept: impl Fn(Ordering) -> bool) -> bool {
    match found {
        None => false,
        Some(Bson::Array(items)) => items
            .iter()
            .any(|item| compare_bson(item, operand).is_some_and(&accept)),
        Some(found) => compare_bson(found, operand).is_some_and(accept),
    }
}

fn operand_array<'a>(operator: &str, operand: &'a Bson) -> Result<&'a [Bson], MemoryError> {
    match operand {
        Bson::Array(values) => Ok(values.as_slice()),
        _ => Err(MemoryError::MalformedOperand(operator.to_owned())),
    }
}

fn operator_matches(
    found: Option<&Bson>,
    operator: &str,
    operand: &Bson,
) -> Result<bool, MemoryError> {
    let matched = match operator {
        "$eq" => equals(found, operand),
        "$ne" => !equals(found, operand),
        "$gt" => compares(found, operand, Ordering::is_gt),
        "$gte" => compares(found, operand, Ordering::is_ge),
        "$lt" => compares(found, operand, Ordering::is_lt),
        "$lte" => compares(found, operand, Ordering::is_le),
        "$in" => operand_array(operator, operand)?
            .iter()
            .any(|value| equals(found, value)),
        "$nin" => !operand_array(operator, operand)?
            .iter()
            .any(|value| equals(found, value)),
        "$all" => {
            let values = operand_array(operator, operand)?;
            !values.is_empty() && values.iter().all(|value| equals(found, value))
        }
        "$exists" => {
            let Bson::Boolean(exists) = operand else {
                return Err(MemoryError::MalformedOperand(operator.to_owned()));
            };

            found.is_some() == *exists
        }
        other => return Err(MemoryError::UnsupportedOperator(other.to_owned())),
    };

    Ok(matched)
}

fn field_matches(found: Option<&Bson>, condition: &Bson) -> Result<bool, MemoryError> {
    match condition {
        Bson::Document(operators)
            if operators.keys().next().is_some_and(|key| key.starts_with('$')) =>
        {
            for (operator, operand) in operators {
                if !operator_matches(found, operator, operand)? {
                    return Ok(false);
                }
            }

            Ok(true)
        }
        value => Ok(equals(found, value)),
    }
}

fn sub_filters<'a>(
    operator: &str,
    condition: &'a Bson,
) -> Result<Vec<&'a Document>, MemoryError> {
    operand_array(operator, condition)?
        .iter()
        .map(|filter| match filter {
            Bson::Document(filter) => Ok(filter),
            _ => Err(MemoryError::MalformedOperand(operator.to_owned())),
        })
        .collect()
}

fn matches(document: &Document, filter: &Document) -> Result<bool, MemoryError> {
    for (key, condition) in filter {
        let matched = match key.as_str() {
            "$and" => {
                let mut matched = true;
                for filter in sub_filters(key, condition)? {
                    if !matches(document, filter)? {
                        matched = false;
                        break;
                    }
                }
                matched
            }
            "$or" => {
                let mut matched = false;
                for filter in sub_filters(key, condition)? {
                    if matches(document, filter)? {
                        matched = true;
                        break;
                    }
                }
                matched
            }
            operator if operator.starts_with('$') => {
                return Err(MemoryError::UnsupportedOperator(operator.to_owned()));
            }
            path => field_matches(get_path(document, path), condition)?,
        };

        if !matched {
            return Ok(false);
        }
    }

    Ok(true)
}

#[derive(Clone, Copy)]
enum Direction {
    Asc,
    Desc,
}

#[allow(clippy::cast_possible_truncation)]
fn sort_keys(sort: &Document) -> Result<Vec<(&str, Direction)>, MemoryError> {
    sort.iter()
        .map(|(path, direction)| {
            let direction = match direction {
                Bson::Int32(direction) => i64::from(*direction),
                Bson::Int64(direction) => *direction,
                Bson::Double(direction) => *direction as i64,
                _ => 0,
            };

            match direction {
                1 => Ok((path.as_str(), Direction::Asc)),
                -1 => Ok((path.as_str(), Direction::Desc)),
                _ => Err(MemoryError::MalformedOperand("$sort".to_owned())),
            }
        })
        .collect()
}

fn compare_sort_values(a: Option<&Bson>, b: Option<&Bson>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => type_rank(a)
            .cmp(&type_rank(b))
            .then_with(|| compare_bson(a, b).unwrap_or(Ordering::Equal)),
    }
}

fn compare_documents(a: &Document, b: &Document, keys: &[(&str, Direction)]) -> Ordering {
    for (path, direction) in keys {
        let ordering = compare_sort_values(get_path(a, path), get_path(b, path));

        if ordering != Ordering::Equal {
            return match direction {
                Direction::Asc => ordering,
                Direction::Desc => ordering.reverse(),
            };
        }
    }

    Ordering::Equal
}

fn truthy(flag: &Bson) -> bool {
    !matches!(
        flag,
        Bson::Int32(0) | Bson::Int64(0) | Bson::Boolean(false)
    ) && !matches!(flag, Bson::Double(value) if *value == 0.0)
}

fn project(document: &Document, projection: &Document) -> Result<Document, MemoryError> {
    let include = projection
        .iter()
        .any(|(path, flag)| path != "_id" && truthy(flag));

    if !include {
        let mut projected = document.clone();

        for path in projection.keys() {
            remove_path(&mut projected, path);
        }

        return Ok(projected);
    }

    let mut projected = Document::new();

    if projection.get("_id").is_none_or(truthy) {
        if let Some(id) = document.get("_id") {
            projected.insert("_id", id.clone());
        }
    }

    for (path, flag) in projection {
        if path == "_id" || !truthy(flag) {
            continue;
        }

        if let Some(value) = get_path(document, path) {
            set_path(&mut projected, "$project", path, value.clone())?;
        }
    }

    Ok(projected)
}

fn increment(current: Option<&Bson>, delta: &Bson) -> Option<Bson> {
    match (current.unwrap_or(&Bson::Int32(0)), delta) {
        (Bson::Int32(a), Bson::Int32(b)) => Some(
            a.checked_add(*b)
                .map_or_else(|| Bson::Int64(i64::from(*a) + i64::from(*b)), Bson::Int32),
        ),
        (Bson::Int32(a), Bson::Int64(b)) | (Bson::Int64(b), Bson::Int32(a)) => {
            i64::from(*a).checked_add(*b).map(Bson::Int64)
        }
        (Bson::Int64(a), Bson::Int64(b)) => a.checked_add(*b).map(Bson::Int64),
        (a, b) => Some(Bson::Double(as_f64(a)? + as_f64(b)?)),
    }
}

fn array_at(document: &Document, operator: &str, path: &str) -> Result<Vec<Bson>, MemoryError> {
    match get_path(document, path) {
        None => Ok(Vec::new()),
        Some(Bson::Array(items)) => Ok(items.clone()),
        Some(_) => Err(conflict(operator, path)),
    }
}

fn apply_update(document: &mut Document, update: &Document) -> Result<(), MemoryError> {
    for (operator, fields) in update {
        let Bson::Document(fields) = fields else {
            return Err(MemoryError::MalformedOperand(operator.clone()));
        };

        for (path, value) in fields {
            match operator.as_str() {
                "$set" => set_path(document, operator, path, value.clone())?,
                "$unset" => remove_path(document, path),
                "$inc" => {
                    let next = increment(get_path(document, path), value)
                        .ok_or_else(|| conflict(operator, path))?;
                    set_path(document, operator, path, next)?;
                }
                "$push" => {
                    let mut items = array_at(document, operator, path)?;
                    items.push(value.clone());
                    set_path(document, operator, path, Bson::Array(items))?;
                }
                "$addToSet" => {
                    let mut items = array_at(document, operator, path)?;
                    if !items.contains(value) {
                        items.push(value.clone());
                    }
                    set_path(document, operator, path, Bson::Array(items))?;
                }
                other => return Err(MemoryError::UnsupportedOperator(other.to_owned())),
            }
        }
    }

    Ok(())
}
