//! Integration tests for `tth ask` against a mock Ollama server.


use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use fixtures::ndjson_response;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn temp_tth_home() -> TempDir {
    TempDir::new().expect("create temp tth home")
}

fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

#[tokio::test]
async fn test_ask_streams_transcript_markup() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_tth_home();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(serde_json::json!({
            "model": "deepseek-r1:14b",
            "prompt": "Show code",
            "stream": true
        })))
        .respond_with(ndjson_response(&[
            "<think>ok</think>\n",
            "```pyth",
            "on\nx = 1\n",
            "```",
        ]))
        .expect(1)
        .mount(&server)
        .await;

    cargo_bin_cmd!("tth")
        .env("TTH_HOME", home.path())
        .env("OLLAMA_BASE_URL", server.uri())
        .args(["ask", "-p", "Show code", "--no-highlight"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "<br>User:Show&nbsp;code<br>AI:&lt;think&gt;ok&lt;/think&gt;<br>",
        ))
        .stdout(predicate::str::contains(
            r#"<div class="code-block"><span style="white-space:pre;">x = 1<br></span></div>"#,
        ))
        .stdout(predicate::str::contains("```").not());
}

#[tokio::test]
async fn test_ask_runs_config_questions_in_order() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_tth_home();
    let server = MockServer::start().await;
    fs::write(
        home.path().join("config.toml"),
        "questions = [\"first\", \"  \", \"second\"]\n[render]\nuser_label = \"Me\"\n",
    )
    .unwrap();

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(serde_json::json!({ "prompt": "first" })))
        .respond_with(ndjson_response(&["one"]))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(serde_json::json!({ "prompt": "second" })))
        .respond_with(ndjson_response(&["two"]))
        .expect(1)
        .mount(&server)
        .await;

    cargo_bin_cmd!("tth")
        .env("TTH_HOME", home.path())
        .env("OLLAMA_BASE_URL", server.uri())
        .arg("ask")
        .assert()
        .success()
        .stdout("<br>Me:first<br>AI:one<br>Me:second<br>AI:two\n");
}

#[tokio::test]
async fn test_ask_non_streaming() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_tth_home();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(serde_json::json!({
            "model": "llama3",
            "stream": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"model":"llama3","response":"a < b","done":true}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    cargo_bin_cmd!("tth")
        .env("TTH_HOME", home.path())
        .env("OLLAMA_BASE_URL", server.uri())
        .args(["ask", "-p", "q", "-m", "llama3", "--no-stream"])
        .assert()
        .success()
        .stdout("<br>User:q<br>AI:a&nbsp;&lt;&nbsp;b\n");
}

#[tokio::test]
async fn test_ask_http_error_fails() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_tth_home();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(
            ResponseTemplate::new(404).set_body_string(r#"{"error":"model 'nope' not found"}"#),
        )
        .mount(&server)
        .await;

    cargo_bin_cmd!("tth")
        .env("TTH_HOME", home.path())
        .env("OLLAMA_BASE_URL", server.uri())
        .args(["ask", "-p", "q", "-m", "nope"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("HTTP 404: model 'nope' not found"));
}

#[test]
fn test_ask_without_prompts_fails() {
    let home = temp_tth_home();

    cargo_bin_cmd!("tth")
        .env("TTH_HOME", home.path())
        .arg("ask")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No prompt given"));
}

#[test]
fn test_ask_rejects_invalid_base_url() {
    let home = temp_tth_home();

    cargo_bin_cmd!("tth")
        .env("TTH_HOME", home.path())
        .env("OLLAMA_BASE_URL", "not a url")
        .args(["ask", "-p", "q"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid Ollama base URL"));
}
