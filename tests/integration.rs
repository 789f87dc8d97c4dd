//! Integration tests exercising the public API end to end.
//!
//! These tests verify that:
//! 1. Paths, ordering and wildcard expansion behave as documented
//! 2. Copy and move produce identical subtrees and never lose data
//! 3. Hard and soft links follow their targets (or dangle) correctly
//! 4. Content streams enforce the single-writer lock
//! 5. Generic code over `FsCommands` works with `FileSystem`

use memtree::*;
use proptest::prelude::*;
use std::io::{Read, Write};
use std::time::{Duration, SystemTime};

// =============================================================================
// Fixtures
// =============================================================================

/// ```text
/// /
/// ├── destination/
/// └── source/
///     ├── subFolder/
///     │   └── subSubFile.txt
///     └── subFile.txt
/// ```
fn copy_fixture() -> FileSystem {
    let mut fs = FileSystem::new();
    fs.mkdir("/destination", false).unwrap();
    fs.mkdir("/source/subFolder", true).unwrap();
    fs.write_file("/source/subFile.txt", "subFileContent", false)
        .unwrap();
    fs.write_file("/source/subFolder/subSubFile.txt", "subSubFileContent", false)
        .unwrap();
    fs
}

fn names(fs: &FileSystem, path: &str) -> Vec<String> {
    fs.ls(path).unwrap().into_iter().map(|e| e.name).collect()
}

// =============================================================================
// Paths and Ordering
// =============================================================================

#[test]
fn folder_paths_derive_from_parents() {
    let mut tree = Tree::new();
    let root = tree.root();
    assert_eq!(tree.path(root).unwrap(), "/");

    let a = tree.create_folder("a");
    tree.add_content(root, a).unwrap();
    let b = tree.create_folder("b");
    tree.add_content(a, b).unwrap();

    let parent_path = tree.path(a).unwrap();
    assert_eq!(tree.path(b).unwrap(), format!("{parent_path}b/"));
}

#[test]
fn children_are_observably_sorted() {
    let mut fs = FileSystem::new();
    for name in ["file10", "file2", "File1"] {
        fs.write_file(name, "", false).unwrap();
    }
    for name in ["zdir", "adir"] {
        fs.mkdir(name, false).unwrap();
    }
    assert_eq!(
        names(&fs, "/"),
        ["adir", "zdir", "File1", "file2", "file10"]
    );
}

#[test]
fn dot_tokens_and_root_parent_are_no_ops() {
    let mut fs = FileSystem::new();
    fs.mkdir("/a", false).unwrap();
    let tree = fs.tree();
    let root = tree.root();
    assert_eq!(tree.resolve_path("..", root, root).unwrap(), vec![root]);
    assert_eq!(tree.resolve_path("./././", root, root).unwrap(), vec![root]);
    assert_eq!(
        tree.resolve_path("/a/../..", root, root).unwrap(),
        vec![root]
    );
}

#[test]
fn wildcard_only_in_final_position() {
    let fs = copy_fixture();
    let tree = fs.tree();
    let root = tree.root();

    let children = tree.resolve_path("/source/*", root, root).unwrap();
    let source = tree.resolve_path("/source", root, root).unwrap()[0];
    assert_eq!(children, tree.children(source).unwrap());

    assert!(matches!(
        tree.resolve_path("/*/subFolder", root, root),
        Err(FsError::InvalidPath { .. })
    ));
}

// =============================================================================
// Copy and Move
// =============================================================================

#[test]
fn copy_then_copy_again_adds_suffix() {
    let mut fs = copy_fixture();
    fs.cp("/source/subFile.txt", "/destination", None).unwrap();
    assert_eq!(
        fs.read_file("/destination/subFile.txt").unwrap(),
        "subFileContent"
    );

    fs.cp("/source/subFile.txt", "/destination", None).unwrap();
    assert_eq!(
        fs.read_file("/destination/subFile.txt (1)").unwrap(),
        "subFileContent"
    );
    assert_eq!(
        names(&fs, "/destination"),
        ["subFile.txt", "subFile.txt (1)"]
    );
}

#[test]
fn move_folder_yields_identical_subtree() {
    let mut fs = copy_fixture();
    fs.mv("/source/subFolder", "/destination", None).unwrap();
    assert_eq!(names(&fs, "/source"), ["subFile.txt"]);
    assert_eq!(
        fs.read_file("/destination/subFolder/subSubFile.txt").unwrap(),
        "subSubFileContent"
    );
}

#[test]
fn move_with_collision_removes_originals_after_placing_all() {
    let mut fs = copy_fixture();
    fs.cp("/source/*", "/destination", None).unwrap();
    fs.mv("/source/*", "/destination", None).unwrap();

    assert!(names(&fs, "/source").is_empty());
    assert_eq!(
        names(&fs, "/destination"),
        ["subFolder", "subFolder (1)", "subFile.txt", "subFile.txt (1)"]
    );
    assert_eq!(
        fs.read_file("/destination/subFolder (1)/subSubFile.txt").unwrap(),
        "subSubFileContent"
    );
}

#[test]
fn failed_move_changes_nothing() {
    let mut fs = copy_fixture();
    fs.ln("/source/subFile.txt", "/source", Some("link"), LinkKind::Soft)
        .unwrap();
    fs.cp("/source/subFile.txt", "/", None).unwrap();
    fs.rm("/source/subFile.txt").unwrap();

    let before = names(&fs, "/source");
    assert!(matches!(
        fs.mv("/source/*", "/destination", None),
        Err(FsError::LinkDangling { .. })
    ));
    assert_eq!(names(&fs, "/source"), before);
    assert!(names(&fs, "/destination").is_empty());
}

// =============================================================================
// Links
// =============================================================================

#[test]
fn hard_link_tracks_target_and_survives_removal() {
    let mut fs = copy_fixture();
    fs.ln("/source/subFile.txt", "/", Some("hard"), LinkKind::Hard)
        .unwrap();
    assert_eq!(fs.metadata("/hard").unwrap().size, 14);

    fs.write_file("/source/subFile.txt", "!", true).unwrap();
    assert_eq!(fs.read_file("/hard").unwrap(), "subFileContent!");

    fs.rm("/source/subFile.txt").unwrap();
    assert_eq!(fs.read_file("/hard").unwrap(), "subFileContent!");
    assert_eq!(fs.metadata("/hard").unwrap().size, 15);
}

#[test]
fn soft_link_dangles_once_target_removed() {
    let mut fs = copy_fixture();
    fs.ln("/source/subFile.txt", "/", Some("soft"), LinkKind::Soft)
        .unwrap();
    assert_eq!(fs.read_file("/soft").unwrap(), "subFileContent");

    fs.rm("/source/subFile.txt").unwrap();
    let err = fs.read_file("/soft").unwrap_err();
    assert!(matches!(err, FsError::LinkDangling { .. }));
    assert!(std::error::Error::source(&err).is_some());

    let entry = fs.ls("/soft").unwrap().remove(0);
    assert!(entry.link.is_some());
    assert_eq!(entry.size, None);
}

#[test]
fn folder_size_skips_dangling_links() {
    let mut fs = copy_fixture();
    fs.ln("/source/subFile.txt", "/destination", None, LinkKind::Soft)
        .unwrap();
    assert_eq!(fs.metadata("/destination").unwrap().size, 14);
    fs.rm("/source/subFile.txt").unwrap();
    assert_eq!(fs.metadata("/destination").unwrap().size, 0);
}

#[test]
fn hard_link_to_ancestor_does_not_recurse_forever() {
    let mut fs = copy_fixture();
    fs.ln("/source", "/source/subFolder", Some("up"), LinkKind::Hard)
        .unwrap();
    assert_eq!(
        fs.read_file("/source/subFolder/up/subFile.txt").unwrap(),
        "subFileContent"
    );
    let size = fs.metadata("/source").unwrap().size;
    assert_eq!(size, 14 + 17);
}

#[test]
fn soft_link_never_binds_to_a_replacement_of_a_detached_target() {
    let mut fs = FileSystem::new();
    fs.mkdir("/a", false).unwrap();
    fs.write_file("/a/file", "real", false).unwrap();
    fs.ln("/a", "/", Some("h"), LinkKind::Hard).unwrap();
    fs.rm("/a").unwrap();
    fs.mkdir("/a", false).unwrap();
    fs.write_file("/a/file", "imposter", false).unwrap();

    assert_eq!(fs.read_file("/h/file").unwrap(), "real");
    assert!(matches!(
        fs.ln("/h/file", "/", Some("s"), LinkKind::Soft),
        Err(FsError::InvalidPath { .. })
    ));
    assert!(!fs.exists("/s").unwrap());
}

#[test]
fn removed_self_linked_folder_is_freed() {
    let mut fs = FileSystem::new();
    fs.mkdir("/a", false).unwrap();
    fs.ln("/a", "/a", Some("self"), LinkKind::Hard).unwrap();
    let a = fs.tree().find_child(fs.tree().root(), "a").unwrap().unwrap();

    fs.rm("/a").unwrap();
    assert!(!fs.tree().contains(a));
}

// =============================================================================
// Content Streams
// =============================================================================

#[test]
fn second_writer_fails_until_first_closes() {
    let mut fs = FileSystem::new();
    let mut first = fs.open_write("/f", false).unwrap();
    assert!(matches!(
        fs.open_write("/f", true),
        Err(FsError::ContentLocked { .. })
    ));
    first.write_all(b"abc").unwrap();
    first.close();

    let mut second = fs.open_write("/f", true).unwrap();
    second.write_all(b"def").unwrap();
    drop(second);
    assert_eq!(fs.read_file("/f").unwrap(), "abcdef");
}

#[test]
fn locked_content_surfaces_as_would_block() {
    let mut fs = FileSystem::new();
    let _writer = fs.open_write("/f", false).unwrap();
    let io: std::io::Error = fs.open_write("/f", false).unwrap_err().into();
    assert_eq!(io.kind(), std::io::ErrorKind::WouldBlock);
}

#[test]
fn reader_yields_configured_chunks() {
    let tree = Tree::with_config(
        TreeConfig::default().with_read_chunk_size(2),
        SystemClock,
    );
    let mut fs = FileSystem::with_tree(tree);
    fs.write_file("/f", "abcde", false).unwrap();

    let chunks: Vec<Vec<u8>> = fs.open_read("/f").unwrap().collect();
    assert_eq!(chunks, [b"ab".to_vec(), b"cd".to_vec(), b"e".to_vec()]);

    let mut text = String::new();
    fs.open_read("/f").unwrap().read_to_string(&mut text).unwrap();
    assert_eq!(text, "abcde");
}

#[test]
fn manual_clock_stamps_modifications() {
    let clock = ManualClock::default();
    let mut fs = FileSystem::with_tree(Tree::with_clock(clock.clone()));
    clock.advance(Duration::from_secs(30));
    fs.write_file("/f", "x", false).unwrap();
    clock.advance(Duration::from_secs(30));

    let expected = SystemTime::UNIX_EPOCH + Duration::from_secs(30);
    assert_eq!(fs.metadata("/f").unwrap().last_modified, expected);
    assert_eq!(fs.metadata("/").unwrap().last_modified, expected);
}

// =============================================================================
// Generic Code over FsCommands
// =============================================================================

fn backup<F: FsCommands + ?Sized>(fs: &mut F, folder: &str) -> FsResult<usize> {
    fs.mkdir("/backup", true).or_else(|e| match e {
        FsError::NameConflict { .. } => Ok(()),
        e => Err(e),
    })?;
    fs.cp(&format!("{folder}/*"), "/backup", None)?;
    Ok(fs.ls("/backup")?.len())
}

#[test]
fn generic_function_with_commands_bound() {
    let mut fs = copy_fixture();
    assert_eq!(backup(&mut fs, "/source").unwrap(), 2);
    let dynamic: &mut dyn FsCommands = &mut fs;
    assert_eq!(backup(dynamic, "/source").unwrap(), 4);
    assert!(fs.is_file("/backup/subFile.txt (1)").unwrap());
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn added_folder_is_found_by_name(name in "[a-zA-Z0-9 ._-]{1,16}") {
        prop_assume!(name != "." && name != "..");
        let mut tree = Tree::new();
        let root = tree.root();
        let folder = tree.create_folder(name.clone());
        tree.add_content(root, folder).unwrap();
        prop_assert_eq!(tree.find_child(root, &name).unwrap(), Some(folder));
        prop_assert_eq!(tree.path(folder).unwrap(), format!("/{name}/"));
    }

    #[test]
    fn write_then_append_round_trips(s in ".{0,64}", s2 in ".{0,64}") {
        let mut fs = FileSystem::new();
        fs.write_file("/f", &s, false).unwrap();
        prop_assert_eq!(fs.read_file("/f").unwrap(), s.clone());
        fs.write_file("/f", &s2, true).unwrap();
        prop_assert_eq!(fs.read_file("/f").unwrap(), format!("{s}{s2}"));
    }
}
