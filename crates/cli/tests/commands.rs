use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn inkpress(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_inkpress"))
        .arg("--root")
        .arg(root)
        .args(args)
        .output()
        .unwrap()
}

fn site() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let posts = dir.path().join("content/posts");
    fs::create_dir_all(&posts).unwrap();
    fs::write(
        posts.join("hello.md"),
        "---\ntitle: Hello\ndate: 2024-01-15\ntags: [rust]\n---\n# Hello\n\nSee [docs](https://example.com).\n",
    )
    .unwrap();
    fs::write(
        posts.join("later.md"),
        "---\ntitle: Later\ndate: 2024-03-01\ndraft: true\n---\nNot yet.\n",
    )
    .unwrap();
    dir
}

#[test]
fn build_then_list_and_render() {
    let site = site();
    let build = inkpress(site.path(), &["build"]);
    assert!(build.status.success(), "{}", String::from_utf8_lossy(&build.stderr));
    assert!(site.path().join(".inkpress/posts.json").is_file());

    let list = inkpress(site.path(), &["list"]);
    let stdout = String::from_utf8_lossy(&list.stdout);
    assert!(stdout.contains("2024-01-15  hello"), "{stdout}");
    assert!(!stdout.contains("later"), "{stdout}");

    let render = inkpress(site.path(), &["render", "hello"]);
    assert!(render.status.success());
    let html = String::from_utf8_lossy(&render.stdout);
    assert!(html.contains("target=\"_blank\""), "{html}");

    let plain = inkpress(site.path(), &["render", "hello", "--plain"]);
    let html = String::from_utf8_lossy(&plain.stdout);
    assert!(html.contains("<a href=\"https://example.com\">docs</a>"), "{html}");
}

#[test]
fn development_build_lists_drafts() {
    let site = site();
    assert!(inkpress(site.path(), &["build", "--mode", "development"]).status.success());
    let list = inkpress(site.path(), &["list", "--drafts"]);
    let stdout = String::from_utf8_lossy(&list.stdout);
    let lines: Vec<_> = stdout.lines().collect();
    assert_eq!(lines.len(), 2, "{stdout}");
    assert!(lines[0].contains("later") && lines[0].ends_with("(draft)"), "{stdout}");
}

#[test]
fn rendering_a_missing_slug_exits_with_failure() {
    let site = site();
    assert!(inkpress(site.path(), &["build"]).status.success());
    let render = inkpress(site.path(), &["render", "nope"]);
    assert_eq!(render.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&render.stderr).contains("not found"));
}
