use std::fs;
use std::sync::Arc;

use pages::{PageError, WikiPage, find_page, load_tree};
use pretty_assertions::assert_eq;
use wikitext::{MapVariableSource, VariableSource};

fn host() -> Arc<dyn VariableSource> {
    Arc::new(MapVariableSource::new())
}

#[test]
fn loads_pages_and_sub_pages() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("_root.wiki"), "!define COLOR {red}\n").unwrap();
    fs::write(dir.path().join("FrontPage.wiki"), "Color is ${COLOR}. See >SubPage.").unwrap();
    fs::create_dir(dir.path().join("FrontPage")).unwrap();
    fs::write(dir.path().join("FrontPage").join("SubPage.wiki"), "${COLOR} below").unwrap();
    fs::create_dir(dir.path().join("EmptyParent")).unwrap();
    fs::write(dir.path().join("EmptyParent").join("LeafPage.wiki"), "leaf").unwrap();

    let root = load_tree(dir.path(), host()).unwrap();
    let root: Arc<dyn WikiPage> = root;

    let names: Vec<_> = root.children().iter().map(|c| c.name().to_string()).collect();
    assert_eq!(names, vec!["EmptyParent", "FrontPage"]);

    let front = find_page(&root, "FrontPage").unwrap();
    assert_eq!(
        front.html().unwrap(),
        "<p>Color is red. See <a href=\"FrontPage.SubPage\">&gt;SubPage</a>.</p>\n"
    );
    assert_eq!(
        find_page(&root, "FrontPage.SubPage").unwrap().html().unwrap(),
        "<p>red below</p>\n"
    );
    assert_eq!(find_page(&root, "EmptyParent").unwrap().data().content, "");
    assert_eq!(
        find_page(&root, "EmptyParent.LeafPage").unwrap().html().unwrap(),
        "<p>leaf</p>\n"
    );
}

#[test]
fn skips_files_that_are_not_pages() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Bad.Name.wiki"), "x").unwrap();
    fs::write(dir.path().join(".HiddenPage.wiki"), "x").unwrap();
    fs::write(dir.path().join("notes.txt"), "x").unwrap();
    fs::write(dir.path().join("GoodPage.wiki"), "x").unwrap();
    fs::create_dir(dir.path().join("_assets")).unwrap();

    let root = load_tree(dir.path(), host()).unwrap();
    let root: Arc<dyn WikiPage> = root;
    let names: Vec<_> = root.children().iter().map(|c| c.name().to_string()).collect();
    assert_eq!(names, vec!["GoodPage"]);
    assert_eq!(root.data().content, "");
}

#[test]
fn missing_directory_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nowhere");
    match load_tree(&missing, host()) {
        Err(PageError::Io { path, .. }) => assert_eq!(path, missing),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("expected an error"),
    }
}
