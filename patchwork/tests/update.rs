mod common;

use common::{DescriptionChanges, FailingAccess, Problem, ProblemChanges, load, problems};
use patchwork::{
    CollectionAccess, Entity, Error, Field, Update, UpdateBuilder, UpdateInfo, by_id, changes,
    mongodb::bson::{Bson, doc},
};

#[test]
fn nested_leaf_is_addressed_by_dotted_path() {
    let changes = changes!(
        ProblemChanges,
        description: changes!(DescriptionChanges, legend: "Add two numbers".to_owned()),
    );

    let update = changes.compose().unwrap().unwrap();

    let set = update.get_document("$set").unwrap();
    assert_eq!(set.get_str("description.legend").unwrap(), "Add two numbers");
    assert!(set.get_datetime("last_update_time").is_ok());
    assert_eq!(set.len(), 2);
    assert_eq!(update.get_document("$inc").unwrap(), &doc! { "revision": 1 });
}

#[test]
fn explicit_null_differs_from_omitted() {
    let changes = ProblemChanges {
        archive_id: Field::Set(None),
        description: Field::Set(DescriptionChanges {
            notes: Field::Set(None),
            ..Default::default()
        }),
        ..Default::default()
    };

    let update = changes.compose().unwrap().unwrap();
    let set = update.get_document("$set").unwrap();

    assert_eq!(set.get("archive_id"), Some(&Bson::Null));
    assert_eq!(set.get("description.notes"), Some(&Bson::Null));
    assert!(!set.contains_key("title"));
    assert!(!set.contains_key("description.legend"));
}

#[test]
fn untagged_fields_and_omitted_nodes_compose_to_nothing() {
    let changes = ProblemChanges {
        description: Field::Set(DescriptionChanges::default()),
        reason: Some("typo".to_owned()),
        ..Default::default()
    };

    assert_eq!(changes.compose().unwrap(), None);
}

#[derive(Default, Update)]
#[update(entity = "Problem")]
struct StatementChanges {
    description: Field<DescriptionChanges>,
    #[update(rename = "description")]
    statement: Field<DescriptionChanges>,
    comment: Option<String>,
}

#[test]
fn untagged_changes_trees_are_recursed_into() {
    let changes = StatementChanges {
        description: Field::Set(changes!(
            DescriptionChanges,
            legend: "Add two numbers".to_owned(),
        )),
        statement: Field::Set(changes!(DescriptionChanges, notes: None)),
        comment: Some("typo".to_owned()),
    };

    assert_eq!(
        changes.compose().unwrap(),
        Some(doc! {
            "$set": {
                "description.legend": "Add two numbers",
                "description.notes": null,
            }
        })
    );

    let comment_only = StatementChanges {
        comment: Some("typo".to_owned()),
        ..Default::default()
    };

    assert_eq!(comment_only.compose().unwrap(), None);
}

#[test]
fn verbs_are_grouped_by_operator() {
    let changes = changes!(
        ProblemChanges,
        title: "A + B".to_owned(),
        raise_difficulty: 4,
        tag: "math".to_owned(),
    );

    let update = changes.compose().unwrap().unwrap();

    assert_eq!(
        update.keys().collect::<Vec<_>>(),
        ["$set", "$max", "$addToSet", "$inc"]
    );
    assert_eq!(update.get_document("$max").unwrap(), &doc! { "difficulty": 4 });
    assert_eq!(update.get_document("$addToSet").unwrap(), &doc! { "tags": "math" });
    assert_eq!(
        update.get_document("$set").unwrap().get_str("title").unwrap(),
        "A + B"
    );
}

#[tokio::test]
async fn update_by_id_applies_nested_changes() {
    let collection = problems(3);

    let changes = changes!(
        ProblemChanges,
        title: "Sum".to_owned(),
        description: changes!(DescriptionChanges, legend: "Add two numbers".to_owned()),
    );

    let matched = Problem::update_by_id(&collection, &1, &changes).await.unwrap();

    assert!(matched);

    let updated = load(&collection, 1);
    let mut expected = common::problem(1);
    expected.title = "Sum".to_owned();
    expected.description.legend = "Add two numbers".to_owned();
    expected.revision = 1;
    expected.last_update_time = updated.last_update_time;

    assert!(updated.last_update_time.is_some());
    assert_eq!(updated, expected);
    assert_eq!(load(&collection, 0), common::problem(0));
}

#[tokio::test]
async fn add_to_set_keeps_tags_unique() {
    let collection = problems(1);
    let changes = changes!(ProblemChanges, tag: "dp".to_owned());

    for _ in 0..2 {
        assert!(Problem::update_by_id(&collection, &0, &changes).await.unwrap());
    }

    let updated = load(&collection, 0);
    assert_eq!(updated.tags, ["math", "dp"]);
    assert_eq!(updated.revision, 2);
}

#[tokio::test]
async fn applying_the_same_set_twice_is_idempotent() {
    let collection = problems(2);

    let description = UpdateBuilder::<Problem>::new()
        .set("legend", Field::Set("Add two numbers"))
        .unwrap()
        .set("notes", Field::<Option<String>>::Set(None))
        .unwrap();
    let changes = UpdateBuilder::<Problem>::new()
        .set("title", Field::Set("Sum"))
        .unwrap()
        .nested("description", description)
        .unwrap();

    let update = changes.compose().unwrap().unwrap();
    let filter = by_id::<Problem>(&1).unwrap().build();

    collection
        .update_one(filter.clone(), update.clone())
        .await
        .unwrap();
    let once = collection.documents();

    collection.update_one(filter, update).await.unwrap();
    let twice = collection.documents();

    assert_eq!(once, twice);
    assert_eq!(load(&collection, 1).description.notes, None);
}

#[tokio::test]
async fn missing_document_is_not_matched() {
    let collection = problems(3);
    let changes = changes!(ProblemChanges, title: "Sum".to_owned());

    let matched = Problem::update_by_id(&collection, &7, &changes).await.unwrap();

    assert!(!matched);
    assert_eq!(collection.documents(), problems(3).documents());
}

#[tokio::test]
async fn nothing_to_update_skips_the_store() {
    let changes = ProblemChanges {
        reason: Some("no-op".to_owned()),
        ..Default::default()
    };

    let matched = Problem::update_by_id(&FailingAccess, &1, &changes).await.unwrap();

    assert!(!matched);
}

#[tokio::test]
async fn store_errors_are_propagated() {
    let changes = changes!(ProblemChanges, in_archive: false);

    let error = Problem::update_by_id(&FailingAccess, &1, &changes)
        .await
        .unwrap_err();

    assert!(
        matches!(&error, Error::Store(source) if source.to_string() == "store unavailable"),
        "unexpected error: {error:?}"
    );
}
