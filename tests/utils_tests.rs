use depgraph::utils::{file_walker, table};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

#[test]
fn table_renderer_produces_expected_grid() {
    let headers = ["A", "B"];
    let rows = vec![vec!["x".into(), "y".into()], vec!["long".into()]];
    let out = table::render(&headers, &rows);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "+------+---+");
    assert_eq!(lines[1], "| A    | B |");
    assert_eq!(lines[3], "| x    | y |");
    assert_eq!(lines[4], "| long |   |");
    assert_eq!(lines.len(), 6);
}

#[test]
fn file_walker_respects_ignore_and_no_ignore() {
    let dir = tempdir().unwrap();
    let root = dir.path();

    write(&root.join("svc/go.mod"), "module example.com/svc\n");
    write(&root.join("svc/main.go"), "package main\n");
    write(&root.join("third_party/dep/go.mod"), "module example.com/dep\n");
    write(&root.join(".gitignore"), "third_party/\n");

    let files = file_walker::go_mod_files(root, false);
    assert_eq!(files, vec![root.join("svc/go.mod")]);

    let files_all = file_walker::go_mod_files(root, true);
    assert_eq!(files_all, vec![root.join("svc/go.mod"), root.join("third_party/dep/go.mod")]);
}

#[test]
fn file_walker_skips_testdata_vendor_and_underscore_dirs() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("_work");

    write(&root.join("lib/go.mod"), "module example.com/lib\n");
    write(&root.join("lib/testdata/fixture/go.mod"), "module example.com/fixture\n");
    write(&root.join("app/vendor/example.com/lib/go.mod"), "module example.com/lib\n");
    write(&root.join("_scratch/go.mod"), "module example.com/scratch\n");

    // The root itself may have any name; --no-ignore does not bring these back.
    for no_ignore in [false, true] {
        assert_eq!(file_walker::go_mod_files(&root, no_ignore), vec![root.join("lib/go.mod")]);
    }
}

fn write(path: &Path, s: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, s).unwrap();
}
