//! Integration tests for `tth render`.

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

/// Creates a temp TTH_HOME directory for test isolation.
fn temp_tth_home() -> TempDir {
    TempDir::new().expect("create temp tth home")
}

#[test]
fn test_render_plain_text_from_stdin() {
    let home = temp_tth_home();

    cargo_bin_cmd!("tth")
        .env("TTH_HOME", home.path())
        .arg("render")
        .write_stdin("Hello world\n<script>x</script>")
        .assert()
        .success()
        .stdout("Hello&nbsp;world<br>&lt;script&gt;x&lt;/script&gt;\n");
}

#[test]
fn test_render_chunked_matches_whole() {
    let home = temp_tth_home();
    let input = "Intro:\n```python\nprint(\"hi\")\n```\nDone <thi";

    let whole = cargo_bin_cmd!("tth")
        .env("TTH_HOME", home.path())
        .args(["render", "--no-highlight"])
        .write_stdin(input)
        .output()
        .unwrap();
    let chunked = cargo_bin_cmd!("tth")
        .env("TTH_HOME", home.path())
        .args(["render", "--no-highlight", "--chunk-size", "3"])
        .write_stdin(input)
        .output()
        .unwrap();

    assert!(whole.status.success());
    assert_eq!(chunked.stdout, whole.stdout);
    let html = String::from_utf8(whole.stdout).unwrap();
    assert!(html.contains(r#"<div class="code-block">"#));
    assert!(html.contains("print(&quot;hi&quot;)<br>"));
    assert!(html.ends_with("Done&nbsp;&lt;thi\n"));
    assert!(!html.contains("```"));
}

#[test]
fn test_render_highlighted_code_from_file() {
    let home = temp_tth_home();
    let input = home.path().join("answer.txt");
    fs::write(&input, "```python\nx = 1\n```\n").unwrap();

    cargo_bin_cmd!("tth")
        .env("TTH_HOME", home.path())
        .args(["render", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(r#"<div class="code-block"><span style="white-space:pre;">"#))
        .stdout(predicate::str::contains("color:#"))
        .stdout(predicate::str::contains("</div>"));
}

#[test]
fn test_render_page_wrapper() {
    let home = temp_tth_home();

    cargo_bin_cmd!("tth")
        .env("TTH_HOME", home.path())
        .args(["render", "--page"])
        .write_stdin("hi")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("<!DOCTYPE html>"))
        .stdout(predicate::str::contains(".code-block"))
        .stdout(predicate::str::contains("<body>\nhi\n</body>"));
}

#[test]
fn test_render_transcript_records() {
    let home = temp_tth_home();
    let records = concat!(
        r#"{"kind":"user_role","content":"User"}"#,
        "\n",
        r#"{"kind":"user_text","content":"hi there"}"#,
        "\n",
        r#"{"kind":"ai_role","content":"AI"}"#,
        "\n",
        r#"{"kind":"ai_text","content":"Hel"}"#,
        "\n",
        r#"{"kind":"ai_text","content":"lo\n"}"#,
        "\n",
    );

    cargo_bin_cmd!("tth")
        .env("TTH_HOME", home.path())
        .args(["render", "--transcript"])
        .write_stdin(records)
        .assert()
        .success()
        .stdout("<br>User:hi&nbsp;there<br>AI:Hello<br>\n");
}

#[test]
fn test_render_transcript_rejects_unknown_kind() {
    let home = temp_tth_home();

    cargo_bin_cmd!("tth")
        .env("TTH_HOME", home.path())
        .args(["render", "--transcript"])
        .write_stdin(r#"{"kind":"system","content":"x"}"#)
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 1"));
}

#[test]
fn test_render_missing_file_fails() {
    let home = temp_tth_home();

    cargo_bin_cmd!("tth")
        .env("TTH_HOME", home.path())
        .args(["render", "/nonexistent/input.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn test_list_themes() {
    cargo_bin_cmd!("tth")
        .args(["render", "--list-themes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("InspiredGitHub"));
}
