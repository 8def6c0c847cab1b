use std::collections::BTreeSet;
use std::sync::Arc;
use tasknest_core::db::open_db_in_memory;
use tasknest_core::{SqliteTaskStore, Task, TaskRepository, TaskStore, Urgency};

fn new_repository() -> TaskRepository {
    TaskRepository::new(Arc::new(SqliteTaskStore::new(open_db_in_memory().unwrap())))
}

#[tokio::test]
async fn live_query_emits_current_contents_first() {
    let repository = new_repository();
    let id = repository
        .add(Task::new("Buy milk", Urgency::Low))
        .await
        .unwrap();

    let mut live = repository.tasks();
    assert!(!live.is_attached());

    let first = live.next().await.unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].id, Some(id));
    assert!(live.is_attached());
}

#[tokio::test]
async fn store_query_all_follows_direct_writes() {
    let store = Arc::new(SqliteTaskStore::new(open_db_in_memory().unwrap()));
    let mut live = Arc::clone(&store).query_all();
    assert!(live.next().await.unwrap().is_empty());

    let id = store.upsert(&Task::new("Buy milk", Urgency::Low)).unwrap();

    let snapshot = live.next().await.unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].id, Some(id));
}

#[tokio::test]
async fn live_query_starts_empty_on_empty_table() {
    let repository = new_repository();
    let mut live = repository.tasks();

    assert!(live.next().await.unwrap().is_empty());
}

#[tokio::test]
async fn toggle_through_add_replaces_the_record() {
    let repository = new_repository();
    let mut live = repository.tasks();
    assert!(live.next().await.unwrap().is_empty());

    repository
        .add(Task::new("Buy milk", Urgency::Low))
        .await
        .unwrap();
    let snapshot = live.next().await.unwrap();
    assert_eq!(snapshot.len(), 1);
    assert!(!snapshot[0].completed);

    repository.add(snapshot[0].toggled()).await.unwrap();
    let snapshot_after = live.next().await.unwrap();
    assert_eq!(snapshot_after.len(), 1);
    assert_eq!(snapshot_after[0].id, snapshot[0].id);
    assert!(snapshot_after[0].completed);
}

#[tokio::test]
async fn update_and_delete_pass_through_to_store() {
    let repository = new_repository();
    let mut task = Task::new("Pay rent", Urgency::High);
    task.id = Some(repository.add(task.clone()).await.unwrap());

    repository.update(task.toggled()).await.unwrap();
    assert!(repository.store().list_all().unwrap()[0].completed);

    repository.delete(task.clone()).await.unwrap();
    repository.delete(task).await.unwrap();
    assert!(repository.store().list_all().unwrap().is_empty());
}

#[tokio::test]
async fn dropping_live_query_detaches_and_new_query_rescans() {
    let repository = new_repository();
    let store = Arc::clone(repository.store());

    let mut live = repository.tasks();
    live.next().await.unwrap();
    assert_eq!(store.subscriber_count(), 1);
    drop(live);
    assert_eq!(store.subscriber_count(), 0);

    repository
        .add(Task::new("Walk dog", Urgency::Medium))
        .await
        .unwrap();

    let mut restarted = repository.tasks();
    assert_eq!(restarted.next().await.unwrap().len(), 1);
}

#[tokio::test]
async fn lagging_live_query_resumes_from_current_table() {
    let repository = new_repository();
    let mut live = repository.tasks();
    live.next().await.unwrap();

    for i in 0..100 {
        repository
            .add(Task::new(format!("task {i}"), Urgency::Low))
            .await
            .unwrap();
    }

    let snapshot = live.next().await.unwrap();
    assert_eq!(snapshot.len(), 100);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_adds_publish_one_snapshot_each_in_commit_order() {
    const WRITERS: usize = 16;
    let repository = new_repository();
    let mut live = repository.tasks();
    assert!(live.next().await.unwrap().is_empty());

    let writers: Vec<_> = (0..WRITERS)
        .map(|index| {
            let repository = repository.clone();
            tokio::spawn(async move {
                repository
                    .add(Task::new(format!("task {index}"), Urgency::Medium))
                    .await
                    .unwrap()
            })
        })
        .collect();
    let mut ids = BTreeSet::new();
    for writer in writers {
        ids.insert(writer.await.unwrap());
    }
    assert_eq!(ids.len(), WRITERS);

    let mut snapshots = Vec::with_capacity(WRITERS);
    for _ in 0..WRITERS {
        snapshots.push(live.next().await.unwrap());
    }
    let lengths: Vec<usize> = snapshots.iter().map(Vec::len).collect();
    assert_eq!(lengths, (1..=WRITERS).collect::<Vec<_>>());

    let last = snapshots.last().unwrap();
    let listed: BTreeSet<_> = last.iter().filter_map(|task| task.id).collect();
    assert_eq!(listed, ids);
}
