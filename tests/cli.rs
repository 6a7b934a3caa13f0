use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn parse_jsonl(stdout: &[u8]) -> Vec<Value> {
    let s = String::from_utf8_lossy(stdout);
    s.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str::<Value>(l).expect("valid jsonl line"))
        .collect()
}

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

fn replay(name: &str) -> PathBuf {
    fixtures().join("replay").join(name)
}

fn refnav() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("refnav"));
    cmd.env_remove("REFNAV_ROOT")
        .env_remove("REFNAV_FORMAT")
        .env_remove("RUST_LOG");
    cmd
}

/// Command with `--root` on the fixture workspace
fn workspace_cmd() -> Command {
    let mut cmd = refnav();
    cmd.arg("--root").arg(fixtures().join("workspace"));
    cmd
}

fn rg_available() -> bool {
    std::process::Command::new("rg")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn start_line(item: &Value) -> u64 {
    item["range"]["start"]["line"].as_u64().unwrap()
}

fn is_nearest(item: &Value) -> bool {
    item["meta"]["nearest"].as_bool().unwrap_or(false)
}

#[test]
fn tree_groups_matches_by_file() {
    let mut cmd = workspace_cmd();
    cmd.args(["tree", "src/main.rs", "--line", "4", "--col", "14", "--replay"])
        .arg(replay("references.json"));

    let assert = cmd.assert().success();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(items.len(), 8);

    let files: Vec<_> = items
        .iter()
        .filter(|v| v["kind"] == "file")
        .map(|v| (v["path"].as_str().unwrap(), v["meta"]["count"].as_u64().unwrap()))
        .collect();
    assert_eq!(
        files,
        vec![("src/lib.rs", 1), ("src/main.rs", 3), ("tests/smoke.rs", 1)]
    );

    // each file row is followed by its own matches, in line order
    let main_lines: Vec<_> = items
        .iter()
        .filter(|v| v["kind"] == "match" && v["path"] == "src/main.rs")
        .map(start_line)
        .collect();
    assert_eq!(main_lines, vec![0, 3, 4]);
    assert_eq!(items[2]["kind"], "file");
    assert_eq!(items[3]["path"], "src/main.rs");
}

#[test]
fn tree_flags_match_under_cursor() {
    let mut cmd = workspace_cmd();
    cmd.args(["tree", "src/main.rs", "--line", "4", "--col", "14", "--replay"])
        .arg(replay("references.json"));

    let assert = cmd.assert().success();
    let items = parse_jsonl(&assert.get_output().stdout);
    let nearest: Vec<_> = items.iter().filter(|v| is_nearest(v)).collect();

    assert_eq!(nearest.len(), 1);
    assert_eq!(nearest[0]["path"], "src/main.rs");
    assert_eq!(start_line(nearest[0]), 3);
    assert_eq!(nearest[0]["excerpt"], "let a = compute(1);");
}

#[test]
fn tree_file_rows_carry_hash() {
    let mut cmd = workspace_cmd();
    cmd.args(["tree", "src/main.rs", "--replay"])
        .arg(replay("references.json"));

    let assert = cmd.assert().success();
    let items = parse_jsonl(&assert.get_output().stdout);
    for item in items.iter().filter(|v| v["kind"] == "file") {
        let hash = item["meta"]["hash"].as_str().expect("hash present");
        assert_eq!(hash.len(), 16);
        assert_eq!(item["meta"]["truncated"], false);
    }
}

#[test]
fn tree_exclude_drops_file() {
    let mut cmd = workspace_cmd();
    cmd.args(["tree", "src/main.rs", "--exclude", "tests/smoke.rs", "--replay"])
        .arg(replay("references.json"));

    let assert = cmd.assert().success();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(items.len(), 6);
    assert!(items.iter().all(|v| v["path"] != "tests/smoke.rs"));
}

#[test]
fn tree_reports_unloadable_file() {
    let mut cmd = workspace_cmd();
    cmd.args(["tree", "src/lib.rs", "--replay"])
        .arg(replay("missing_file.json"));

    let assert = cmd.assert().success();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(items.len(), 4);

    let gone = &items[0];
    assert_eq!(gone["kind"], "file");
    assert_eq!(gone["path"], "src/gone.rs");
    assert_eq!(gone["errors"][0]["code"], "LOAD_FAILED");

    let gone_match = &items[1];
    assert_eq!(gone_match["kind"], "match");
    assert!(gone_match.get("excerpt").is_none());
}

#[test]
fn unsupported_query_is_not_a_failure() {
    let mut cmd = workspace_cmd();
    cmd.args(["tree", "src/main.rs", "--kind", "implementations", "--replay"])
        .arg(replay("unsupported.json"));

    let assert = cmd.assert().success();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["kind"], "error");
    assert_eq!(items[0]["errors"][0]["code"], "NO_RESULT");
}

#[test]
fn empty_answer_prints_nothing() {
    let mut cmd = workspace_cmd();
    cmd.args(["tree", "src/main.rs", "--replay"])
        .arg(replay("empty.json"));

    cmd.assert().success().stdout(predicate::str::is_empty());
}

#[test]
fn empty_answer_markdown_says_no_results() {
    let mut cmd = workspace_cmd();
    cmd.args(["--format", "md", "tree", "src/main.rs", "--replay"])
        .arg(replay("empty.json"));

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("# No results."));
}

#[test]
fn first_prefers_cursor_file() {
    let mut cmd = workspace_cmd();
    cmd.args(["first", "src/lib.rs", "--line", "1", "--col", "9", "--replay"])
        .arg(replay("references.json"));

    let assert = cmd.assert().success();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["path"], "src/lib.rs");
    assert_eq!(items[0]["excerpt"], "pub fn compute(x: i32) -> i32 {");
    assert!(is_nearest(&items[0]));
}

#[test]
fn first_after_cursor_in_same_file() {
    // no match on line 3 of main.rs; the next one is on line 4
    let mut cmd = workspace_cmd();
    cmd.args(["first", "src/main.rs", "--line", "3", "--col", "1", "--replay"])
        .arg(replay("references.json"));

    let assert = cmd.assert().success();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(start_line(&items[0]), 3);
}

#[test]
fn first_falls_back_to_closest_path() {
    let mut cmd = workspace_cmd();
    cmd.args(["first", "tests/other.rs", "--replay"])
        .arg(replay("references.json"));

    let assert = cmd.assert().success();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(items[0]["path"], "tests/smoke.rs");
}

#[test]
fn walk_forward_wraps_around() {
    let mut cmd = workspace_cmd();
    cmd.args(["walk", "src/main.rs", "--line", "4", "--col", "14", "--steps", "3", "--replay"])
        .arg(replay("references.json"));

    let assert = cmd.assert().success();
    let items = parse_jsonl(&assert.get_output().stdout);
    let visited: Vec<_> = items
        .iter()
        .map(|v| (v["path"].as_str().unwrap().to_string(), start_line(v)))
        .collect();
    assert_eq!(
        visited,
        vec![
            ("src/main.rs".to_string(), 3),
            ("src/main.rs".to_string(), 4),
            ("tests/smoke.rs".to_string(), 2),
            ("src/lib.rs".to_string(), 0),
        ]
    );
}

#[test]
fn walk_backward() {
    let mut cmd = workspace_cmd();
    cmd.args(["walk", "src/main.rs", "--line", "4", "--col", "14", "--steps", "2", "--backward", "--replay"])
        .arg(replay("references.json"));

    let assert = cmd.assert().success();
    let items = parse_jsonl(&assert.get_output().stdout);
    let lines: Vec<_> = items.iter().map(start_line).collect();
    assert_eq!(lines, vec![3, 0, 0]);
    assert_eq!(items[2]["path"], "src/lib.rs");
}

#[test]
fn walk_by_file_jumps_to_next_group() {
    let mut cmd = workspace_cmd();
    cmd.args(["walk", "src/main.rs", "--line", "4", "--col", "14", "--by-file", "--replay"])
        .arg(replay("references.json"));

    let assert = cmd.assert().success();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(items.len(), 2);
    assert_eq!(items[1]["path"], "tests/smoke.rs");
}

#[test]
fn line_must_be_one_based() {
    let mut cmd = workspace_cmd();
    cmd.args(["first", "src/main.rs", "--line", "0", "--replay"])
        .arg(replay("references.json"));

    cmd.assert().failure();
}

#[test]
fn invalid_replay_file_fails() {
    let temp = tempdir().unwrap();
    let bad = temp.path().join("bad.json");
    write_file(&bad, "{ not json");

    let mut cmd = workspace_cmd();
    cmd.args(["tree", "src/main.rs", "--replay"]).arg(&bad);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load replay file"));
}

#[test]
fn format_from_environment() {
    let mut cmd = workspace_cmd();
    cmd.env("REFNAV_FORMAT", "raw")
        .args(["tree", "src/main.rs", "--line", "4", "--col", "14", "--replay"])
        .arg(replay("references.json"));

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("src/main.rs\n"))
        .stdout(predicate::str::contains("  4, 13: let a = compute(1);"));
}

#[test]
fn rg_finds_references() {
    if !rg_available() {
        eprintln!("skipping: rg not installed");
        return;
    }

    let temp = tempdir().unwrap();
    write_file(
        &temp.path().join("src/lib.rs"),
        "pub fn compute(x: i32) -> i32 {\n    x * 2\n}\n",
    );
    write_file(
        &temp.path().join("src/main.rs"),
        "fn main() {\n    let a = compute(1);\n    let recompute = 0;\n}\n",
    );

    let mut cmd = refnav();
    cmd.arg("--root")
        .arg(temp.path())
        .args(["tree", "src/main.rs", "--line", "2", "--col", "15"]);

    let assert = cmd.assert().success();
    let items = parse_jsonl(&assert.get_output().stdout);
    let matches: Vec<_> = items
        .iter()
        .filter(|v| v["kind"] == "match")
        .map(|v| (v["path"].as_str().unwrap().to_string(), start_line(v)))
        .collect();

    // whole words only: `recompute` is not a reference
    assert_eq!(
        matches,
        vec![("src/lib.rs".to_string(), 0), ("src/main.rs".to_string(), 1)]
    );
    assert!(is_nearest(&items[3]));
}

#[test]
fn rg_finds_implementations() {
    if !rg_available() {
        eprintln!("skipping: rg not installed");
        return;
    }

    let temp = tempdir().unwrap();
    write_file(
        &temp.path().join("shapes.rs"),
        "trait Shape {}\nstruct Circle;\nimpl Shape for Circle {}\nfn draw(s: &dyn Shape) {}\n",
    );

    let mut cmd = refnav();
    cmd.arg("--root")
        .arg(temp.path())
        .args(["tree", "shapes.rs", "--line", "1", "--col", "8", "--kind", "implementations"]);

    let assert = cmd.assert().success();
    let items = parse_jsonl(&assert.get_output().stdout);
    let matches: Vec<_> = items.iter().filter(|v| v["kind"] == "match").collect();
    assert_eq!(matches.len(), 1);
    assert_eq!(start_line(matches[0]), 2);
    assert_eq!(matches[0]["range"]["start"]["character"], 5);
}

#[test]
fn no_identifier_under_cursor_is_no_result() {
    if !rg_available() {
        eprintln!("skipping: rg not installed");
        return;
    }

    let temp = tempdir().unwrap();
    write_file(&temp.path().join("a.rs"), "   \n");

    let mut cmd = refnav();
    cmd.arg("--root").arg(temp.path()).args(["first", "a.rs"]);

    let assert = cmd.assert().success();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(items[0]["errors"][0]["code"], "NO_RESULT");
}

#[test]
fn copy_prints_plain_listing() {
    let mut cmd = workspace_cmd();
    cmd.args(["--format", "json", "copy", "src/main.rs", "--replay"])
        .arg(replay("references.json"));

    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("src/lib.rs\n  1, 8: pub fn compute"))
        .stdout(predicate::str::contains("tests/smoke.rs\n  3, 24: sample::compute(3), 6);\n"));
}

#[test]
fn copy_empty_tree_prints_summary() {
    let mut cmd = workspace_cmd();
    cmd.args(["copy", "src/main.rs", "--replay"])
        .arg(replay("empty.json"));

    cmd.assert().success().stdout("No results.\n");
}

fn binary_workspace() -> (tempfile::TempDir, PathBuf) {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join("blob.dat"), [0xffu8, 0x00, b'a', b'\n']).unwrap();
    let answer = temp.path().join("answer.json");
    write_file(
        &answer,
        r#"{"locations":[{"file":"blob.dat","range":{"start":{"line":0,"character":2},"end":{"line":0,"character":3}}}]}"#,
    );
    (temp, answer)
}

#[test]
fn lossy_decode_is_flagged() {
    let (temp, answer) = binary_workspace();

    let mut cmd = refnav();
    cmd.arg("--root")
        .arg(temp.path())
        .args(["tree", "blob.dat", "--replay"])
        .arg(&answer);

    let assert = cmd.assert().success();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(items[0]["errors"][0]["code"], "LOSSY_DECODE");
    assert!(items[0]["meta"]["hash"].is_string());
}

#[test]
fn skip_binary_refuses_undecodable_file() {
    let (temp, answer) = binary_workspace();

    let mut cmd = refnav();
    cmd.arg("--root")
        .arg(temp.path())
        .args(["--skip-binary", "tree", "blob.dat", "--replay"])
        .arg(&answer);

    let assert = cmd.assert().success();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(items[0]["errors"][0]["code"], "LOAD_FAILED");
    assert!(items[1].get("excerpt").is_none());
}
