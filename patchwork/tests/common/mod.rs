#![allow(dead_code)]

use futures_util::{
    FutureExt,
    future::{self, BoxFuture},
};
use patchwork::{
    CollectionAccess, Entity, Error, Field, FieldPath, Filter, FilterBuilder, FindQuery,
    MemoryCollection, Result, Update, UpdateOp, UpdateVerb, Verb,
    mongodb::bson::{Bson, DateTime, Document},
};
use serde::{Deserialize, Serialize};
use std::io;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Entity)]
pub struct Problem {
    #[serde(rename = "_id")]
    pub id: i32,
    pub title: String,
    pub author: String,
    pub difficulty: i32,
    pub tags: Vec<String>,
    pub in_archive: bool,
    pub description: Description,
    pub revision: i32,
    pub last_update_time: Option<DateTime>,
    pub archive_id: Option<i32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Description {
    pub legend: String,
    pub input: String,
    pub output: String,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Update)]
#[update(entity = "Problem")]
pub struct DescriptionChanges {
    #[update(set)]
    pub legend: Field<String>,
    #[update(set)]
    pub input: Field<String>,
    #[update(set)]
    pub output: Field<String>,
    #[update(set)]
    pub notes: Field<Option<String>>,
}

#[derive(Debug, Default, Update)]
#[update(entity = "Problem", post_updates = "Self::touch")]
pub struct ProblemChanges {
    #[update(set)]
    pub title: Field<String>,
    #[update(set)]
    pub difficulty: Field<i32>,
    #[update(verb = "Max", rename = "difficulty")]
    pub raise_difficulty: Field<i32>,
    #[update(add_to_set, rename = "tags")]
    pub tag: Field<String>,
    #[update(set)]
    pub in_archive: Field<bool>,
    #[update(set)]
    pub archive_id: Field<Option<i32>>,
    #[update(nested)]
    pub description: Field<DescriptionChanges>,
    pub reason: Option<String>,
}

impl ProblemChanges {
    fn touch(&self, path: &FieldPath) -> Result<Vec<UpdateOp>> {
        Ok(vec![
            Verb::Inc.apply(path.push("revision"), Bson::Int32(1)),
            Verb::Set.apply(
                path.push("last_update_time"),
                Bson::DateTime(DateTime::now()),
            ),
        ])
    }
}

pub struct Max;

impl UpdateVerb for Max {
    fn apply(&self, path: FieldPath, value: Bson) -> UpdateOp {
        UpdateOp::new("$max", path, value)
    }
}

/// Problem search as exposed to the problem list page.
#[derive(Debug, Default)]
pub struct ProblemFilter(FilterBuilder<Problem>);

impl ProblemFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(self, title: &str) -> Result<Self> {
        Ok(Self(self.0.eq(problem::Fields::Title, title)?))
    }

    pub fn difficulty_between(self, min: i32, max: i32) -> Result<Self> {
        Ok(Self(self.0.range(problem::Fields::Difficulty, &min, &max)?))
    }

    pub fn with_tags(self, tags: &[&str]) -> Result<Self> {
        Ok(Self(self.0.all(problem::Fields::Tags, tags)?))
    }

    pub fn in_archive(self, in_archive: bool) -> Result<Self> {
        Ok(Self(self.0.eq(problem::Fields::InArchive, &in_archive)?))
    }

    pub fn into_builder(self) -> FilterBuilder<Problem> {
        self.0
    }
}

impl Filter<Problem> for ProblemFilter {
    fn to_document(&self) -> Document {
        self.0.build()
    }
}

pub fn problem(id: i32) -> Problem {
    let tags = match id % 3 {
        0 => vec!["math".to_owned()],
        1 => vec!["math".to_owned(), "greedy".to_owned()],
        _ => vec!["graphs".to_owned()],
    };

    Problem {
        id,
        title: format!("Problem {id}"),
        author: if id % 2 == 0 { "alice" } else { "bob" }.to_owned(),
        difficulty: id % 5,
        tags,
        in_archive: id % 4 != 0,
        description: Description {
            legend: format!("Legend {id}"),
            input: "Two integers".to_owned(),
            output: "One integer".to_owned(),
            notes: Some("None".to_owned()),
        },
        revision: 0,
        last_update_time: None,
        archive_id: None,
    }
}

pub fn problems(count: i32) -> MemoryCollection {
    let collection = MemoryCollection::new();

    for id in 0..count {
        collection
            .insert_entity(&problem(id))
            .expect("fixture problem encodes");
    }

    collection
}

pub fn load(collection: &MemoryCollection, id: i32) -> Problem {
    let document = collection
        .documents()
        .into_iter()
        .find(|document| document.get_i32("_id").is_ok_and(|value| value == id))
        .expect("problem exists");

    patchwork::mongodb::bson::from_document(document).expect("problem decodes")
}

/// A store whose every call fails.
pub struct FailingAccess;

fn unavailable() -> Error {
    Error::store(io::Error::new(
        io::ErrorKind::ConnectionRefused,
        "store unavailable",
    ))
}

impl CollectionAccess for FailingAccess {
    fn count(&self, _filter: Document) -> BoxFuture<'_, Result<u64>> {
        future::ready(Err(unavailable())).boxed()
    }

    fn find(&self, _query: FindQuery) -> BoxFuture<'_, Result<Vec<Document>>> {
        future::ready(Err(unavailable())).boxed()
    }

    fn update_one(&self, _filter: Document, _update: Document) -> BoxFuture<'_, Result<u64>> {
        future::ready(Err(unavailable())).boxed()
    }
}
