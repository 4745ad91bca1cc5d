use std::fs;

use lifeboard::config::Config;
use lifeboard::engine::TaskEngine;
use lifeboard::storage::{FileStore, TASKS_FILE};
use lifeboard::store::TaskStore;
use lifeboard::task::{NewTask, TaskStatus};

fn open(dir: &std::path::Path) -> TaskEngine<FileStore> {
    let store = FileStore::open(dir).expect("open store");
    TaskEngine::new(store, Config::default())
}

#[test]
fn seeded_tasks_survive_a_restart() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;

    let mut first = open(dir.path());
    assert!(first.initialize().seeded);
    let created = first.create_task(NewTask::new("health", "Stretch"))?;

    let mut second = open(dir.path());
    let report = second.initialize();
    assert!(!report.seeded);
    assert_eq!(report.loaded, first.tasks().len());
    let reloaded = second.task(&created.id).expect("persisted");
    assert_eq!(reloaded, &created);

    Ok(())
}

#[test]
fn reorder_and_delete_hit_the_disk() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let mut engine = open(dir.path());
    engine.initialize();

    let a = engine.create_task(NewTask::new("home", "Fix tap"))?;
    let b = engine.create_task(NewTask::new("home", "Paint fence"))?;
    engine.reorder_tasks(&[b.id.clone(), a.id.clone()], TaskStatus::NotStarted)?;
    engine.delete_task("finances")?;

    let store = FileStore::open(dir.path())?;
    assert_eq!(store.get_task(&b.id)?.expect("b").order, 0);
    assert_eq!(store.get_task(&a.id)?.expect("a").order, 1);
    assert!(store.get_task("finances")?.is_none());
    assert!(store.get_task("f1")?.is_none());

    Ok(())
}

#[test]
fn unreadable_store_degrades_to_empty() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join(TASKS_FILE), "{ not json")?;

    let mut engine = open(dir.path());
    let report = engine.initialize();
    assert!(report.degraded);
    assert_eq!(report.loaded, 0);
    assert!(engine.tasks().is_empty());

    Ok(())
}
