//! Integration tests for the collection engine.

mod lifecycle;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use reactive_collection::{
    request, BatchRequest, Collection, CollectionConfig, CollectionError, CollectionOptions,
    CreateManyParams, CreateParams, DeleteManyParams, DeleteParams, DuplicateOrigin, Fetched,
    ReadManyParams, ReadOneParams, ReadParams, RefreshManyParams, RefreshParams, RuntimeError,
    UpdateManyParams, UpdateParams,
};
use serde_json::{json, Value};
use todo::{abc, seeded, tasks, todos, Todo, Unavailable};

#[tokio::test]
async fn create_appends_returned_item() {
    let (collection, _) = todos();

    let created = collection
        .create(CreateParams::new(request::ok(Todo::new(1, "Buy groceries"))))
        .await
        .unwrap();

    assert_eq!(created, Some(Todo::new(1, "Buy groceries")));
    assert_eq!(tasks(&collection), vec!["Buy groceries"]);
    assert!(!collection.is_creating());
}

#[tokio::test]
async fn create_duplicate_hands_payload_to_on_error() {
    let (collection, _) = todos();
    collection
        .create(CreateParams::new(request::ok(Todo::new(1, "Buy groceries"))))
        .await
        .unwrap();

    let payload = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&payload);
    let result = collection
        .create(
            CreateParams::new(request::ok(Todo::new(1, "Buy groceries again"))).on_error(
                move |error| {
                    if let CollectionError::Duplicate { payload, .. } = error {
                        *sink.lock().unwrap() = Some(payload.clone());
                    }
                },
            ),
        )
        .await;

    let error = result.unwrap_err();
    assert_eq!(error.duplicate_origin(), Some(DuplicateOrigin::Existing));
    assert_eq!(*payload.lock().unwrap(), Some(json!({ "status": 409 })));
    assert_eq!(tasks(&collection), vec!["Buy groceries"]);
}

#[tokio::test]
async fn throw_on_duplicates_skips_on_error() {
    let collection: Collection<Todo> = Collection::with_config(
        CollectionConfig::new().with_throw_on_duplicates("todo already exists"),
    );
    collection
        .create(CreateParams::new(request::ok(Todo::new(1, "Buy groceries"))))
        .await
        .unwrap();

    let called = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&called);
    let error = collection
        .create(
            CreateParams::new(request::ok(Todo::new(1, "Buy groceries"))).on_error(move |_| {
                flag.store(true, Ordering::SeqCst);
            }),
        )
        .await
        .unwrap_err();

    match error {
        CollectionError::DuplicateFatal { origin, message } => {
            assert_eq!(origin, DuplicateOrigin::Existing);
            assert_eq!(message, "todo already exists");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!called.load(Ordering::SeqCst));
}

#[tokio::test]
async fn large_integer_ids_stay_distinct() {
    let (collection, _) = todos();

    for id in [1_000_000_000_000_000_000, 1_000_000_000_000_000_001] {
        collection
            .create(CreateParams::new(request::ok(Todo::new(id, "Archive"))))
            .await
            .unwrap();
    }

    assert_eq!(collection.items().len(), 2);
    assert_eq!(
        collection.get_item(&Todo::key(1_000_000_000_000_000_001)),
        Some(Todo::new(1_000_000_000_000_000_001, "Archive"))
    );
    assert_eq!(collection.get_item(&Todo::key(999_999_999_999_999_999)), None);
}

#[tokio::test]
async fn create_many_is_all_or_nothing() {
    let (collection, _) = seeded(abc()).await;

    let error = collection
        .create_many(CreateManyParams::new(BatchRequest::items(request::ok(vec![
            Todo::new(4, "Read a book"),
            Todo::new(2, "Walk the cat"),
        ]))))
        .await
        .unwrap_err();
    assert_eq!(error.duplicate_origin(), Some(DuplicateOrigin::Existing));

    let error = collection
        .create_many(CreateManyParams::new(BatchRequest::items(request::ok(vec![
            Todo::new(4, "Read a book"),
            Todo::new(4, "Read a book"),
        ]))))
        .await
        .unwrap_err();
    assert_eq!(error.duplicate_origin(), Some(DuplicateOrigin::Batch));

    assert_eq!(
        tasks(&collection),
        vec!["Buy groceries", "Walk the dog", "Write code"]
    );
}

#[tokio::test]
async fn create_many_joins_independent_requests() {
    let (collection, _) = todos();

    let created = collection
        .create_many(CreateManyParams::new(vec![
            request::ok(Todo::new(1, "Buy groceries")),
            request::err(Unavailable),
            request::empty(),
            request::ok(Todo::new(2, "Walk the dog")),
        ]))
        .await
        .unwrap();

    assert_eq!(created.len(), 2);
    assert_eq!(tasks(&collection), vec!["Buy groceries", "Walk the dog"]);
}

#[tokio::test]
async fn read_replaces_list_and_total() {
    let (collection, _) = seeded(vec![Todo::new(9, "Stale")]).await;

    collection
        .read(ReadParams::new(request::ok(Fetched::with_total_count(
            abc(),
            12,
        ))))
        .await
        .unwrap();

    assert_eq!(collection.items(), abc());
    assert_eq!(collection.total_count_fetched(), Some(12));
    assert!(!collection.is_reading());
}

#[tokio::test]
async fn failed_read_clears_unless_kept() {
    let (collection, _) = todos();
    collection
        .read(ReadParams::new(request::ok(Fetched::with_total_count(abc(), 3))))
        .await
        .unwrap();

    collection
        .read(ReadParams::new(request::err(Unavailable)).keep_existing_on_error(true))
        .await
        .unwrap_err();
    assert_eq!(collection.items().len(), 3);
    assert_eq!(collection.total_count_fetched(), Some(3));

    let failed = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&failed);
    let error = collection
        .read(ReadParams::new(request::err(Unavailable)).on_error(move |_| {
            flag.store(true, Ordering::SeqCst);
        }))
        .await
        .unwrap_err();
    assert_eq!(error.to_string(), "request failed: backend unavailable");
    assert!(failed.load(Ordering::SeqCst));
    assert!(collection.items().is_empty());
    assert_eq!(collection.total_count_fetched(), None);
}

#[tokio::test]
async fn read_keeps_fetched_duplicates_and_reports_them() {
    let (collection, reporter) = todos();
    let mut fetched = abc();
    fetched.push(Todo::new(2, "Walk the dog"));

    collection
        .read(ReadParams::new(request::ok(Fetched::new(fetched))))
        .await
        .unwrap();

    assert_eq!(collection.items().len(), 4);
    assert!(matches!(
        reporter.errors().as_slice(),
        [RuntimeError::FetchedDuplicates(_)]
    ));
}

#[tokio::test]
async fn read_rejects_fetched_duplicates_when_disallowed() {
    let (collection, _) = seeded(abc()).await;
    collection.set_allow_fetched_duplicates(false);

    let error = collection
        .read(ReadParams::new(request::ok(Fetched::new(vec![
            Todo::new(5, "One"),
            Todo::new(5, "Two"),
        ]))))
        .await
        .unwrap_err();

    assert_eq!(error.duplicate_origin(), Some(DuplicateOrigin::Batch));
    assert!(collection.items().is_empty());
}

#[tokio::test]
async fn reinserting_an_item_is_idempotent() {
    let (collection, _) = seeded(abc()).await;

    for _ in 0..2 {
        collection
            .read_one(ReadOneParams::new(request::ok(Todo::new(2, "Walk the dog"))))
            .await
            .unwrap();
    }

    assert_eq!(collection.items(), abc());
}

#[tokio::test]
async fn update_preserves_position() {
    let (collection, _) = seeded(abc()).await;

    let updated = collection
        .update(UpdateParams::new(
            request::ok(Todo::new(2, "Walk the dog").completed()),
            Todo::key(2),
        ))
        .await
        .unwrap();

    assert_eq!(updated, Some(Todo::new(2, "Walk the dog").completed()));
    let items = collection.items();
    assert_eq!(items[1], Todo::new(2, "Walk the dog").completed());
    assert_eq!(
        tasks(&collection),
        vec!["Buy groceries", "Walk the dog", "Write code"]
    );
}

#[tokio::test]
async fn update_with_refresh_trusts_the_refetched_item() {
    let (collection, _) = seeded(abc()).await;

    let updated = collection
        .update(
            UpdateParams::new(request::ok(Todo::key(3)), Todo::key(3))
                .refresh(request::ok(Todo::new(3, "Write tests"))),
        )
        .await
        .unwrap();

    assert_eq!(updated, Some(Todo::new(3, "Write tests")));
    assert_eq!(
        tasks(&collection),
        vec!["Buy groceries", "Walk the dog", "Write tests"]
    );
}

#[tokio::test]
async fn update_many_is_all_or_nothing() {
    let (collection, _) = seeded(abc()).await;

    let error = collection
        .update_many(UpdateManyParams::new(
            BatchRequest::items(request::ok(vec![
                Todo::new(1, "Buy groceries").completed(),
                Todo::new(1, "Buy groceries"),
            ])),
            vec![Todo::key(1)],
        ))
        .await
        .unwrap_err();
    assert_eq!(error.duplicate_origin(), Some(DuplicateOrigin::Batch));
    assert_eq!(collection.items(), abc());

    let updated = collection
        .update_many(UpdateManyParams::new(
            vec![
                request::ok(Todo::new(1, "Buy groceries").completed()),
                request::ok(Todo::new(3, "Write code").completed()),
            ],
            vec![Todo::key(1), Todo::key(3)],
        ))
        .await
        .unwrap();
    assert_eq!(updated.len(), 2);

    let completed: Vec<bool> = collection
        .items()
        .iter()
        .map(|todo| todo.completed == Some(true))
        .collect();
    assert_eq!(completed, vec![true, false, true]);
}

#[tokio::test]
async fn read_many_and_refresh_many_upsert() {
    let (collection, _) = seeded(abc()).await;

    let read = collection
        .read_many(
            ReadManyParams::new(BatchRequest::from(request::ok(Fetched::with_total_count(
                vec![Todo::new(4, "Read a book"), Todo::new(1, "Buy milk")],
                40,
            ))))
            .items(vec![Todo::key(1)]),
        )
        .await
        .unwrap();
    assert_eq!(read.len(), 2);
    assert_eq!(
        tasks(&collection),
        vec!["Buy milk", "Walk the dog", "Write code", "Read a book"]
    );
    assert_eq!(collection.total_count_fetched(), Some(40));

    collection
        .refresh_many(RefreshManyParams::new(
            vec![
                request::ok(Todo::new(2, "Walk the cat")),
                request::err(Unavailable),
            ],
            vec![Todo::key(2), Todo::key(3)],
        ))
        .await
        .unwrap();
    assert_eq!(
        tasks(&collection),
        vec!["Buy milk", "Walk the cat", "Write code", "Read a book"]
    );
    assert!(!collection.is_refreshing());
}

#[tokio::test]
async fn refresh_upserts_single_item() {
    let (collection, _) = seeded(abc()).await;

    let refreshed = collection
        .refresh(RefreshParams::new(
            request::ok(Todo::new(1, "Buy groceries").completed()),
            Todo::key(1),
        ))
        .await
        .unwrap();

    assert_eq!(refreshed, Some(Todo::new(1, "Buy groceries").completed()));
    assert_eq!(collection.items()[0].completed, Some(true));
}

#[tokio::test]
async fn delete_with_field_directive_sets_absolute_total() {
    let (collection, _) = todos();
    collection
        .read(ReadParams::new(request::ok(Fetched::with_total_count(abc(), 30))))
        .await
        .unwrap();

    let response = collection
        .delete(
            DeleteParams::with_request(request::ok(json!({ "totalItems": 1 })), Todo::key(2))
                .decrement_total_count("totalItems"),
        )
        .await
        .unwrap();

    assert_eq!(response, Some(json!({ "totalItems": 1 })));
    assert_eq!(collection.total_count_fetched(), Some(1));
    assert_eq!(tasks(&collection), vec!["Buy groceries", "Write code"]);
}

#[tokio::test]
async fn local_delete_decrements_per_item() {
    let (collection, reporter) = todos();
    collection
        .read(ReadParams::new(request::ok(Fetched::with_total_count(abc(), 3))))
        .await
        .unwrap();

    let response: Option<Value> = collection
        .delete(DeleteParams::new(Todo::key(1)).decrement_total_count(true))
        .await
        .unwrap();
    assert_eq!(response, None);
    assert_eq!(collection.total_count_fetched(), Some(2));

    collection
        .delete(DeleteParams::new(Todo::key(2)).decrement_total_count(5u64))
        .await
        .unwrap();
    assert_eq!(collection.total_count_fetched(), Some(2));
    assert!(matches!(
        reporter.errors().as_slice(),
        [RuntimeError::InvalidTotalCount(_)]
    ));
    assert_eq!(tasks(&collection), vec!["Write code"]);
}

#[tokio::test]
async fn delete_many_counts_the_batch() {
    let (collection, reporter) = todos();
    collection
        .read(ReadParams::new(request::ok(Fetched::with_total_count(abc(), 2))))
        .await
        .unwrap();

    let responses = collection
        .delete_many(
            DeleteManyParams::with_request(
                vec![request::ok(json!({ "ok": true })), request::ok(json!({ "ok": true }))],
                vec![Todo::key(1), Todo::key(3)],
            )
            .decrement_total_count(true),
        )
        .await
        .unwrap();

    assert_eq!(responses.len(), 2);
    assert_eq!(collection.total_count_fetched(), Some(0));
    assert_eq!(tasks(&collection), vec!["Walk the dog"]);
    assert!(reporter.errors().is_empty());

    collection
        .delete_many(DeleteManyParams::new(vec![Todo::key(2), Todo::key(9)]).decrement_total_count(true))
        .await
        .unwrap();
    assert_eq!(collection.total_count_fetched(), Some(0));
    assert_eq!(reporter.errors().len(), 1);
    assert!(collection.items().is_empty());
}

#[tokio::test]
async fn delete_with_read_request_rereads_instead() {
    let (collection, _) = seeded(abc()).await;

    collection
        .delete(
            DeleteParams::with_request(request::ok(json!({})), Todo::key(1)).read_request(
                request::ok(Fetched::with_total_count(
                    vec![Todo::new(2, "Walk the dog"), Todo::new(3, "Write code")],
                    2,
                )),
            ),
        )
        .await
        .unwrap();

    assert_eq!(tasks(&collection), vec!["Walk the dog", "Write code"]);
    assert_eq!(collection.total_count_fetched(), Some(2));
    assert!(!collection.is_deleting());
}

#[tokio::test]
async fn failed_delete_keeps_item() {
    let (collection, _) = seeded(abc()).await;

    let error = collection
        .delete(DeleteParams::<Todo, Value>::with_request(
            request::err(Unavailable),
            Todo::key(1),
        ))
        .await
        .unwrap_err();

    assert!(matches!(error, CollectionError::Request(_)));
    assert_eq!(collection.items().len(), 3);
    assert!(!collection.is_item_deleting(&Todo::key(1)));
}

#[tokio::test]
async fn empty_request_is_a_no_op() {
    let (collection, _) = seeded(abc()).await;

    let succeeded = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&succeeded);
    let created = collection
        .create(CreateParams::new(request::empty()).on_success(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }))
        .await
        .unwrap();

    assert_eq!(created, None);
    assert_eq!(succeeded.load(Ordering::SeqCst), 0);
    assert_eq!(collection.items(), abc());
}

#[tokio::test]
async fn panicking_callback_is_reported() {
    let (collection, reporter) = todos();

    let created = collection
        .create(
            CreateParams::new(request::ok(Todo::new(1, "Buy groceries")))
                .on_success(|_| panic!("render failed")),
        )
        .await
        .unwrap();

    assert!(created.is_some());
    assert_eq!(
        reporter.errors(),
        vec![RuntimeError::CallbackPanicked {
            operation: "create",
            message: "render failed".to_string(),
        }]
    );
}

#[tokio::test]
async fn field_groups_decide_in_order() {
    let collection: Collection<Value> = Collection::from_options(
        CollectionOptions::from_json(r#"{ "id_fields": ["uuId", "id"] }"#).unwrap(),
    );
    collection
        .read(ReadParams::new(request::ok(Fetched::new(vec![
            json!({ "uuId": "a", "id": 1, "name": "first" }),
        ]))))
        .await
        .unwrap();

    // uuId is owned by both sides, so the differing id is never consulted.
    collection
        .read_one(ReadOneParams::new(request::ok(
            json!({ "uuId": "a", "id": 2, "name": "renamed" }),
        )))
        .await
        .unwrap();
    assert_eq!(collection.items().len(), 1);
    assert_eq!(collection.items()[0]["name"], "renamed");

    // Without any owned field nothing matches, so the item is appended.
    collection
        .read_one(ReadOneParams::new(request::ok(json!({ "name": "anonymous" }))))
        .await
        .unwrap();
    assert_eq!(collection.items().len(), 2);
}

#[tokio::test]
async fn statuses_follow_identity() {
    let (collection, _) = seeded(abc()).await;

    collection.set_unique_status("selected", Todo::key(1), true);
    collection.set_unique_status("selected", Todo::key(2), true);
    assert_eq!(collection.unique_status("selected"), Some(Todo::key(2)));

    collection.set_unique_status("selected", Todo::key(1), false);
    assert!(collection.has_unique_status("selected", &Todo::new(2, "Walk the dog")));

    collection.set_unique_status("selected", Todo::key(2), false);
    assert_eq!(collection.unique_status("selected"), None);

    collection.set_item_status(Todo::key(3), "starred");
    collection.set_item_status(Todo::new(3, "Write code"), "pinned");
    assert_eq!(collection.item_statuses(&Todo::key(3)).len(), 2);

    collection.delete_item_status(&Todo::key(3), "starred");
    let statuses = collection.item_statuses(&Todo::key(3));
    assert!(statuses.contains("pinned"));
    assert!(!statuses.contains("starred"));
}

#[tokio::test]
async fn lookups_by_descriptor_and_field() {
    let (collection, _) = seeded(abc()).await;

    assert_eq!(
        collection.get_item(&Todo::key(3)),
        Some(Todo::new(3, "Write code"))
    );
    assert_eq!(
        collection.get_item_by_field("task", &json!("Walk the dog")),
        Some(Todo::new(2, "Walk the dog"))
    );
    assert_eq!(collection.get_item(&Todo::key(7)), None);
}
