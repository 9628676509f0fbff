use std::fs;

use super::fixture::Fixture;
use super::*;

const NARRATIVE: &str = "# Boing\n\n## Say hello\n\n{{< commit add-hello >}}\n";
const V1: &str = "import pytch\n";
const V2: &str = "import pytch\n\ndef hello():\n    pass\n";
const V3: &str = "import pytch\n\ndef greet():\n    pass\n";

#[test]
fn test_commit_slug() {
    assert_eq!(commit_slug("Add hello {#add-hello}\n\nBody"), Some("add-hello".into()));
    assert_eq!(commit_slug("Subject\n\nTagged late {#v1.2_x}"), Some("v1.2_x".into()));
    assert_eq!(commit_slug("Just a commit"), None);
    assert_eq!(commit_slug("Not a tag {#}"), None);
}

#[test]
fn test_load_patches_from_tagged_commits() {
    let mut fx = Fixture::new();
    fx.commit(
        "Start",
        &[("boing/code.py", V1), ("boing/tutorial.md", NARRATIVE)],
    );
    fx.commit(
        "Add hello {#add-hello}",
        &[("boing/code.py", V2), ("boing/tutorial.md", NARRATIVE)],
    );
    fx.commit(
        "Polish narrative",
        &[("boing/code.py", V2), ("boing/tutorial.md", "# Boing\n")],
    );
    fx.commit(
        "Rename {#rename}",
        &[("boing/code.py", V3), ("boing/tutorial.md", NARRATIVE)],
    );

    let history = fx.history().load().unwrap();

    assert_eq!(history.directory, "boing");
    assert_eq!(history.narrative, NARRATIVE);
    assert_eq!(history.complete_code, V3);
    assert_eq!(history.patches.len(), 2);
    assert_eq!(history.patches["add-hello"], patch_between(V1, V2));
    // diffed against the untagged parent, not the previous tagged commit
    assert_eq!(history.patches["rename"], patch_between(V2, V3));
    assert!(history.summary.is_none());
    assert!(history.assets.is_empty());
}

#[test]
fn test_root_commit_diffs_against_empty() {
    let mut fx = Fixture::new();
    fx.commit(
        "First {#first}",
        &[("boing/code.py", V1), ("boing/tutorial.md", NARRATIVE)],
    );

    let history = fx.history().load().unwrap();
    assert_eq!(history.patches["first"], patch_between("", V1));
}

#[test]
fn test_duplicate_slug_is_an_error() {
    let mut fx = Fixture::new();
    let files = [("boing/code.py", V1), ("boing/tutorial.md", NARRATIVE)];
    let first = fx.commit("One {#same}", &files);
    let second = fx.commit("Two {#same}", &files);

    match fx.history().load() {
        Err(HistoryError::DuplicateSlug {
            slug,
            first: a,
            second: b,
        }) => {
            assert_eq!(slug, "same");
            assert_eq!(a, first.to_string());
            assert_eq!(b, second.to_string());
        }
        other => panic!("expected duplicate slug, got {other:?}"),
    }
}

#[test]
fn test_layout_requires_single_directory() {
    let mut fx = Fixture::new();
    fx.commit(
        "Two tutorials",
        &[("boing/tutorial.md", NARRATIVE), ("zap/tutorial.md", NARRATIVE)],
    );

    assert!(matches!(
        fx.history().load(),
        Err(HistoryError::Layout { entries: 2, .. })
    ));
}

#[test]
fn test_layout_rejects_top_level_file() {
    let mut fx = Fixture::new();
    fx.commit("Loose file", &[("README.md", "hi\n")]);

    assert!(matches!(
        fx.history().load(),
        Err(HistoryError::Layout { entries: 1, .. })
    ));
}

#[test]
fn test_assets_and_summary() {
    let mut fx = Fixture::new();
    fx.commit(
        "Everything",
        &[
            ("boing/code.py", V1),
            ("boing/tutorial.md", NARRATIVE),
            ("boing/summary.md", "Bounce a ball.\n"),
            ("boing/images/ball.png", "PNG"),
            ("boing/sounds/pop.mp3", "MP3"),
        ],
    );

    let history = fx.history().load().unwrap();
    assert_eq!(history.summary.as_deref(), Some("Bounce a ball.\n"));

    let paths: Vec<&str> = history.assets.iter().map(|a| a.path.as_str()).collect();
    assert_eq!(paths, ["boing/images/ball.png", "boing/sounds/pop.mp3"]);
    assert_eq!(history.assets[0].data, b"PNG");
}

#[test]
fn test_custom_layout() {
    let mut fx = Fixture::new();
    fx.commit(
        "Custom {#start}",
        &[("boing/main.py", V1), ("boing/README.md", "# Boing\n")],
    );

    let layout = TutorialLayout {
        narrative: "README.md".into(),
        code: "main.py".into(),
        summary: "summary.md".into(),
    };
    let history = fx.history().with_layout(layout).load().unwrap();
    assert_eq!(history.narrative, "# Boing\n");
    assert_eq!(history.complete_code, V1);
    assert!(history.assets.is_empty());
}

#[test]
fn test_narrative_from_working_directory() {
    let mut fx = Fixture::new();
    fx.commit(
        "Start",
        &[("boing/code.py", V1), ("boing/tutorial.md", NARRATIVE)],
    );

    let boing = fx.dir.path().join("boing");
    fs::create_dir_all(&boing).unwrap();
    fs::write(boing.join("tutorial.md"), "# Edited, not committed\n").unwrap();

    let history = GitHistory::discover(&boing).unwrap().load().unwrap();
    assert_eq!(history.narrative, "# Edited, not committed\n");
    // program source still comes from the commit
    assert_eq!(history.complete_code, V1);
}

#[test]
fn test_missing_narrative() {
    let mut fx = Fixture::new();
    fx.commit("Code only", &[("boing/code.py", V1)]);

    match fx.history().load() {
        Err(HistoryError::MissingFile(path)) => {
            assert_eq!(path, Path::new("boing").join("tutorial.md"));
        }
        other => panic!("expected missing file, got {other:?}"),
    }
}

#[test]
fn test_tip_revision() {
    let mut fx = Fixture::new();
    let files_v1 = [("boing/code.py", V1), ("boing/tutorial.md", NARRATIVE)];
    let first = fx.commit("Start", &files_v1);
    fx.commit(
        "Later {#later}",
        &[("boing/code.py", V2), ("boing/tutorial.md", NARRATIVE)],
    );

    let history = fx.history().with_tip(first.to_string()).load().unwrap();
    assert_eq!(history.complete_code, V1);
    assert!(history.patches.is_empty());
}

#[test]
fn test_open_rejects_non_repository() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        GitHistory::open(dir.path()),
        Err(HistoryError::Repository(..))
    ));
}
