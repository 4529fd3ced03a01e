// tests/multi_cook.rs

//! Range tasks hand every stale variant of one source to a single
//! `internal_cook_multi` call.

mod common;

use common::{ContentTree, MemoryDatabase, TestTask, build_cooker_with_db, event_log};
use cooker::{FilePath, FileType};

fn texture_task() -> TestTask {
    TestTask::new("TextureCookTask", 20, FileType::Texture0, &event_log())
        .range(FileType::FIRST_TEXTURE, FileType::LAST_TEXTURE)
}

#[test]
fn test_one_multi_call_per_source() {
    for parallel in [false, true] {
        let tree = ContentTree::new();
        let hero = tree.write_source("Art/Hero.png", "png");
        let sky = tree.write_source("Art/Sky.png", "png");
        let db = MemoryDatabase::new();

        let task = if parallel { texture_task().parallel() } else { texture_task() };
        let mut cooker = build_cooker_with_db(&tree, vec![task.boxed()], &db);
        cooker.cook_all_out_of_date_content().unwrap();

        let mut multi = task.multi();
        multi.sort();
        assert_eq!(multi.len(), 2, "parallel={}", parallel);
        for (group, base) in multi.iter().zip([&hero, &sky]) {
            let expected: Vec<FilePath> = FileType::texture_variants().map(|t| base.with_type(t)).collect();
            assert_eq!(group, &expected);
        }

        for variant in FileType::texture_variants() {
            assert!(tree.read_cooked(&hero.with_type(variant)).is_some());
        }
        assert_eq!(db.updated().len(), 10);
    }
}

#[test]
fn test_group_holds_only_stale_variants() {
    let tree = ContentTree::new();
    let hero = tree.write_source("Art/Hero.png", "png");
    let db = MemoryDatabase::new();
    db.mark_fresh(&hero.with_type(FileType::Texture0));
    db.mark_fresh(&hero.with_type(FileType::Texture3));
    db.mark_fresh(&hero.with_type(FileType::Texture4));

    let task = texture_task();
    let mut cooker = build_cooker_with_db(&tree, vec![task.boxed()], &db);
    cooker.cook_all_out_of_date_content().unwrap();

    assert_eq!(
        task.multi(),
        vec![vec![
            hero.with_type(FileType::Texture1),
            hero.with_type(FileType::Texture2),
        ]]
    );
}

#[test]
fn test_single_stale_variant_uses_single_cook() {
    let tree = ContentTree::new();
    let hero = tree.write_source("Art/Hero.png", "png");
    let db = MemoryDatabase::new();
    for variant in FileType::texture_variants().skip(1) {
        db.mark_fresh(&hero.with_type(variant));
    }

    let task = texture_task();
    let mut cooker = build_cooker_with_db(&tree, vec![task.boxed()], &db);
    cooker.cook_all_out_of_date_content().unwrap();

    assert!(task.multi().is_empty());
    assert_eq!(task.cooked(), vec![hero.with_type(FileType::Texture0)]);
}

#[test]
fn test_failed_group_fails_every_member() {
    let tree = ContentTree::new();
    tree.write_source("Art/Broken.png", "png");
    let fine = tree.write_source("Art/Fine.png", "png");
    let db = MemoryDatabase::new();

    let task = texture_task().parallel().failing("Art/Broken");
    let mut cooker = build_cooker_with_db(&tree, vec![task.boxed()], &db);

    match cooker.cook_all_out_of_date_content() {
        Err(cooker::Error::BatchFailed { failed, total, .. }) => assert_eq!((failed, total), (5, 10)),
        other => panic!("expected batch failure, got {:?}", other),
    }
    let mut updated = db.updated();
    updated.sort();
    let expected: Vec<FilePath> = FileType::texture_variants().map(|t| fine.with_type(t)).collect();
    assert_eq!(updated, expected);
}
