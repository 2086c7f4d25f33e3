use direflow::tasks::{FileTaskStore, TaskError, TaskPatch, TaskStore};
use std::fs;

fn seeded_store(root: &std::path::Path) -> FileTaskStore {
    let dir = root.join("tasks");
    fs::create_dir_all(&dir).expect("tasks dir");
    fs::write(
        dir.join("task-1.md"),
        "---\nid: task-1\ntitle: Add login\nstatus: todo\npriority: high\n---\n\n# Context\nUse OAuth.\n",
    )
    .expect("write task");
    FileTaskStore::new(dir)
}

#[test]
fn get_task_reads_front_matter_and_body() {
    let temp = tempfile::tempdir().expect("tempdir");
    let store = seeded_store(temp.path());

    let task = store.get_task("task-1").expect("get").expect("task");
    assert_eq!(task.title, "Add login");
    assert_eq!(task.status.as_deref(), Some("todo"));
    assert_eq!(task.body, "# Context\nUse OAuth.\n");
    assert_eq!(
        task.extra.get("priority"),
        Some(&serde_yaml::Value::String("high".to_string()))
    );
}

#[test]
fn unknown_task_is_none_for_get_and_update() {
    let temp = tempfile::tempdir().expect("tempdir");
    let store = seeded_store(temp.path());
    assert!(store.get_task("task-2").expect("get").is_none());
    assert!(store
        .update_task("task-2", &TaskPatch::default())
        .expect("update")
        .is_none());
}

#[test]
fn update_task_rewrites_patched_fields_and_keeps_the_rest() {
    let temp = tempfile::tempdir().expect("tempdir");
    let store = seeded_store(temp.path());

    let patch = TaskPatch {
        status: Some("in_progress".to_string()),
        ..TaskPatch::default()
    };
    let updated = store
        .update_task("task-1", &patch)
        .expect("update")
        .expect("task");
    assert_eq!(updated.status.as_deref(), Some("in_progress"));

    let reread = store.get_task("task-1").expect("get").expect("task");
    assert_eq!(reread, updated);
    assert_eq!(reread.title, "Add login");
    assert_eq!(reread.body, "# Context\nUse OAuth.\n");
    assert!(reread.extra.contains_key("priority"));
}

#[test]
fn path_like_task_ids_are_rejected() {
    let temp = tempfile::tempdir().expect("tempdir");
    let store = seeded_store(temp.path());
    assert!(matches!(
        store.get_task("../task-1"),
        Err(TaskError::InvalidId { .. })
    ));
}

#[test]
fn files_without_front_matter_are_malformed() {
    let temp = tempfile::tempdir().expect("tempdir");
    let store = seeded_store(temp.path());
    fs::write(store.root().join("task-3.md"), "just notes\n").expect("write");
    assert!(matches!(
        store.get_task("task-3"),
        Err(TaskError::Malformed { .. })
    ));
}
