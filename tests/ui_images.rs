// tests/ui_images.rs

//! Images extracted from UI movies follow their movie: live images are
//! opened for add and tracked, orphans are opened for delete and dropped.

mod common;

use common::{ContentTree, RecordingScc, events};
use cooker::database::SourceKind;
use cooker::progress::SilentProgress;
use cooker::tasks::UiMovieCookTask;
use cooker::{CookSource, Cooker, CookerSettings, FilePath, FileType, Platform};
use std::fs;

fn cooker_with_scc(tree: &ContentTree, scc: &RecordingScc) -> Cooker {
    Cooker::builder(tree.config(), CookerSettings::new(Platform::PC))
        .tasks(vec![Box::new(UiMovieCookTask::new())])
        .source_control(Box::new(scc.clone()))
        .progress(Box::new(SilentProgress))
        .build()
        .unwrap()
}

fn is_tracked(cooker: &Cooker, relative: &str) -> bool {
    let path = FilePath::parse(relative).unwrap();
    cooker
        .context()
        .source_files_of_type(FileType::Texture0)
        .contains(&path)
}

#[test]
fn test_images_follow_their_movie() {
    let tree = ContentTree::new();
    tree.install_tool("FalconCooker");
    tree.write_source("GeneratedPC/UIImages/Menu/Main/a.png", "png");
    tree.write_source("GeneratedPC/UIImages/Old/b.png", "png");
    let movie_output = tree.platform_content_dir().join("Menu/Main.fcn");
    fs::create_dir_all(movie_output.parent().unwrap()).unwrap();
    fs::write(&movie_output, "movie").unwrap();

    let scc = RecordingScc::default();
    let mut cooker = cooker_with_scc(&tree, &scc);
    assert!(is_tracked(&cooker, "GeneratedPC/UIImages/Old/b.png"));

    cooker.cook_all_out_of_date_content().unwrap();

    let live = tree.source_dir().join("GeneratedPC/UIImages/Menu/Main/a.png");
    let orphan = tree.source_dir().join("GeneratedPC/UIImages/Old/b.png");
    let log = events(&scc.log);
    assert!(log.contains(&format!("add:{}", live.display())), "{:?}", log);
    assert!(log.contains(&format!("delete:{}", orphan.display())), "{:?}", log);
    assert!(!log.contains(&format!("add:{}", orphan.display())));

    assert!(is_tracked(&cooker, "GeneratedPC/UIImages/Menu/Main/a.png"));
    assert!(!is_tracked(&cooker, "GeneratedPC/UIImages/Old/b.png"));
}

#[test]
fn test_no_image_folder_means_no_file_operations() {
    let tree = ContentTree::new();
    tree.install_tool("FalconCooker");

    let scc = RecordingScc::default();
    let mut cooker = cooker_with_scc(&tree, &scc);
    cooker.cook_all_out_of_date_content().unwrap();

    // Only the generated folder sync before the stages
    let log = events(&scc.log);
    assert_eq!(log.len(), 1, "{:?}", log);
    assert!(log[0].starts_with("sync:"));
}

#[test]
fn test_movie_depends_on_its_images_and_folder() {
    let tree = ContentTree::new();
    tree.install_tool("FalconCooker");
    let movie = tree.write_source("Menu/Main.swf", "swf");
    tree.write_source("GeneratedPC/UIImages/Menu/Main/b.png", "png");
    tree.write_source("GeneratedPC/UIImages/Menu/Main/a.png", "png");
    tree.write_source("GeneratedPC/UIImages/Menu/Main/notes.txt", "not an image");

    let scc = RecordingScc::default();
    let cooker = cooker_with_scc(&tree, &scc);
    let sources = cooker.tasks()[0].get_sources(cooker.context(), &movie).unwrap();

    assert_eq!(
        sources,
        vec![
            CookSource::source(&movie),
            CookSource {
                relative: "GeneratedPC/UIImages/Menu/Main/a.png".to_string(),
                kind: SourceKind::Source,
            },
            CookSource {
                relative: "GeneratedPC/UIImages/Menu/Main/b.png".to_string(),
                kind: SourceKind::Source,
            },
            CookSource::directory("GeneratedPC/UIImages/Menu/Main"),
        ]
    );
}

#[test]
fn test_missing_converter_fails_validation() {
    let tree = ContentTree::new();
    tree.write_source("Menu/Main.swf", "swf");

    let scc = RecordingScc::default();
    let mut cooker = cooker_with_scc(&tree, &scc);
    // A FalconCooker on PATH would satisfy validation
    if which::which("FalconCooker").is_ok() {
        return;
    }
    assert!(matches!(
        cooker.cook_all_out_of_date_content(),
        Err(cooker::Error::Environment(_))
    ));
    // A failed precondition must not sync the generated folder
    assert!(events(&scc.log).is_empty());
}
