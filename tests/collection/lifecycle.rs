use reactive_collection::{
    request, CreateParams, DeleteParams, ReadOneParams, ReadParams, RefreshParams, UpdateParams,
};
use serde_json::Value;

use crate::todo::{abc, deferred, seeded, tasks, Todo};

#[tokio::test]
async fn update_marks_item_until_resolved() {
    let (collection, _) = seeded(abc()).await;
    let (resolve, pending) = deferred();

    let update = collection.update(UpdateParams::new(pending, Todo::key(2)));

    assert!(collection.is_item_updating(&Todo::key(2)));
    assert!(collection.is_item_updating(&Todo::new(2, "Walk the dog")));
    assert!(!collection.is_item_updating(&Todo::key(1)));
    assert!(collection.is_updating());
    assert!(collection.is_saving());
    assert!(collection.is_mutating());
    assert!(collection.is_processing());
    assert!(collection.is_item_processing(&Todo::key(2)));
    assert!(!collection.is_item_processing(&Todo::key(3)));

    resolve.send(Todo::new(2, "Walk the dog").completed()).unwrap();
    update.await.unwrap();

    assert!(!collection.is_item_updating(&Todo::key(2)));
    assert!(!collection.is_processing());
    assert_eq!(collection.items()[1].completed, Some(true));
}

#[tokio::test]
async fn dropping_the_operation_releases_markers() {
    let (collection, _) = seeded(abc()).await;

    let update = collection.update(UpdateParams::new(request::pending(), Todo::key(1)));
    let delete = collection.delete(DeleteParams::<Todo, Value>::with_request(
        request::pending(),
        Todo::key(3),
    ));
    let create = collection.create(CreateParams::new(request::pending()));
    assert!(collection.is_item_updating(&Todo::key(1)));
    assert!(collection.is_item_deleting(&Todo::key(3)));
    assert!(collection.is_creating());

    drop(update);
    drop(delete);
    drop(create);

    assert!(!collection.is_processing());
    assert!(collection.snapshot().updating_items().is_empty());
    assert!(collection.snapshot().deleting_items().is_empty());
    assert_eq!(collection.items(), abc());
}

#[tokio::test]
async fn refresh_does_not_toggle_reading() {
    let (collection, _) = seeded(abc()).await;

    let refresh = collection.refresh(RefreshParams::new(request::pending(), Todo::key(2)));

    assert!(!collection.is_reading());
    assert!(collection.is_item_refreshing(&Todo::key(2)));
    assert!(collection.is_refreshing());
    assert!(!collection.is_mutating());
    assert!(collection.is_processing());

    drop(refresh);
    assert!(!collection.is_refreshing());
}

#[tokio::test]
async fn overlapping_reads_keep_flag_until_last() {
    let (collection, _) = seeded(abc()).await;
    let (first_done, first) = deferred();
    let (second_done, second) = deferred();

    let first = collection.read(ReadParams::new(first));
    let second = collection.read_one(ReadOneParams::new(second).item(Todo::key(1)));
    assert!(collection.is_reading());
    assert!(collection.is_item_refreshing(&Todo::key(1)));

    first_done
        .send(reactive_collection::Fetched::new(abc()))
        .unwrap();
    first.await.unwrap();
    assert!(collection.is_reading());

    second_done.send(Todo::new(1, "Buy milk")).unwrap();
    second.await.unwrap();
    assert!(!collection.is_reading());
    assert!(!collection.is_refreshing());
    assert_eq!(tasks(&collection)[0], "Buy milk");
}

#[tokio::test]
async fn update_refresh_keeps_both_markers() {
    let (collection, _) = seeded(abc()).await;
    let (refreshed, refresh) = deferred();

    let update = tokio::spawn(collection.update(
        UpdateParams::new(request::ok(Todo::key(3)), Todo::key(3)).refresh(refresh),
    ));

    while !collection.is_item_refreshing(&Todo::key(3)) {
        tokio::task::yield_now().await;
    }
    assert!(collection.is_item_updating(&Todo::key(3)));

    refreshed.send(Todo::new(3, "Write tests")).unwrap();
    let updated = update.await.unwrap().unwrap();

    assert_eq!(updated, Some(Todo::new(3, "Write tests")));
    assert!(!collection.is_item_updating(&Todo::key(3)));
    assert!(!collection.is_item_refreshing(&Todo::key(3)));
}

#[tokio::test]
async fn concurrent_operations_on_same_item_last_wins() {
    let (collection, _) = seeded(abc()).await;
    let (first_done, first) = deferred();
    let (second_done, second) = deferred();

    let first = collection.update(UpdateParams::new(first, Todo::key(1)));
    let second = collection.update(UpdateParams::new(second, Todo::key(1)));

    second_done.send(Todo::new(1, "Second")).unwrap();
    second.await.unwrap();
    first_done.send(Todo::new(1, "First")).unwrap();
    first.await.unwrap();

    assert_eq!(tasks(&collection)[0], "First");
    assert!(!collection.is_updating());
}
