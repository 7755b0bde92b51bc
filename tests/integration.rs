use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn pidx_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("pidx");
    path
}

/// One-page PDF whose content stream draws `phrase`.
/// Body first, then an xref with correct byte offsets so pdf-extract can parse it.
fn minimal_pdf_with_phrase(phrase: &str) -> Vec<u8> {
    let stream = format!("BT /F1 12 Tf 100 700 Td ({}) Tj ET", phrase);
    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");
    let o1 = out.len();
    out.extend_from_slice(b"1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n");
    let o2 = out.len();
    out.extend_from_slice(b"2 0 obj << /Type /Pages /Kids [3 0 R] /Count 1 >> endobj\n");
    let o3 = out.len();
    out.extend_from_slice(b"3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >> endobj\n");
    let o4 = out.len();
    out.extend_from_slice(
        format!(
            "4 0 obj << /Length {} >> stream\n{}\nendstream endobj\n",
            stream.len(),
            stream
        )
        .as_bytes(),
    );
    let o5 = out.len();
    out.extend_from_slice(
        b"5 0 obj << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> endobj\n",
    );
    let xref_start = out.len();
    out.extend_from_slice(b"xref\n0 6\n");
    out.extend_from_slice(format!("{:010} 65535 f \n", 0).as_bytes());
    for offset in [o1, o2, o3, o4, o5] {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(b"trailer << /Size 6 /Root 1 0 R >>\nstartxref\n");
    out.extend_from_slice(format!("{}\n", xref_start).as_bytes());
    out.extend_from_slice(b"%%EOF\n");
    out
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    fs::create_dir_all(root.join("config")).unwrap();
    fs::create_dir_all(root.join("data/text")).unwrap();
    fs::create_dir_all(root.join("files")).unwrap();

    fs::write(
        root.join("data/names.json"),
        r#"{
  "version": "test-1",
  "names": [
    {
      "display_name": "Bill Clinton",
      "slug": "bill-clinton",
      "search_variants": ["Bill Clinton", "Clinton, Bill", "Clinton", "Bill", "BC"],
      "priority": "P0",
      "category": "politics"
    },
    {
      "display_name": "Ghislaine Maxwell",
      "search_variants": ["Ghislaine Maxwell", "Maxwell"],
      "priority": "P0",
      "category": "associate"
    },
    {
      "display_name": "Al Gore",
      "search_variants": ["Al"],
      "priority": "P2",
      "category": "politics"
    }
  ]
}"#,
    )
    .unwrap();

    // Flight log: two rows 500+ characters apart, each naming Clinton four ways.
    let row = "Bill Clinton | Clinton, Bill | Bill Clinton | BC";
    let flight_log = format!(
        "DATE  PASSENGERS\n{}\n{}\n{}\x0cPage two mentions Ghislaine Maxwell and Albert Baldwin.",
        row,
        "-".repeat(520),
        row
    );
    fs::write(root.join("data/text/flight_logs.txt"), flight_log).unwrap();
    fs::write(root.join("data/text/blank.txt"), "   \n").unwrap();

    fs::write(
        root.join("data/manifest.json"),
        r#"{
  "files": [
    {
      "filename": "EPSTEIN FLIGHT LOGS.pdf",
      "local_path": "text/flight_logs.txt",
      "classification": "Flight Log",
      "source_url": "https://example.org/flight_logs.pdf",
      "source_attribution": "Court exhibit",
      "sha256": null,
      "verification_status": "UNVERIFIED",
      "priority": "P0"
    },
    {
      "filename": "scan-without-ocr.pdf",
      "local_path": "text/blank.txt",
      "classification": "Scan",
      "priority": "P0"
    },
    {
      "filename": "low-priority.pdf",
      "local_path": "text/flight_logs.txt",
      "priority": "P3"
    }
  ]
}"#,
    )
    .unwrap();

    fs::write(
        root.join("files/exhibit.pdf"),
        minimal_pdf_with_phrase("Exhibit naming Ghislaine Maxwell"),
    )
    .unwrap();
    fs::write(root.join("files/notes.md"), "Maxwell in an excluded file").unwrap();

    let config_content = r#"[names]
path = "../data/names.json"

[output]
path = "../output/people_index.json"
version = "1.0"
description = "integration test"

[indexer]
proximity_threshold = 200
snippet_chars = 40

[sources.manifest.priority]
path = "../data/manifest.json"
priorities = ["P0"]

[sources.filesystem.exhibits]
root = "../files"
include_globs = ["**/*.pdf"]
classification = "Exhibit"
"#;

    let config_path = root.join("config/pidx.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_pidx(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = pidx_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run pidx binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn index_path(tmp: &TempDir) -> PathBuf {
    tmp.path().join("output/people_index.json")
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn person<'a>(index: &'a Value, slug: &str) -> &'a Value {
    index["people"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["slug"] == slug)
        .unwrap_or_else(|| panic!("no person {}", slug))
}

#[test]
fn test_index_writes_deduplicated_evidence() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_pidx(&config_path, &["index", "--progress", "off"]);
    assert!(success, "index failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("people: 3"));
    assert!(stdout.contains("ok"));

    let index = read_json(&index_path(&tmp));
    assert_eq!(index["_metadata"]["total_names"], 3);

    let clinton = person(&index, "bill-clinton");
    assert_eq!(clinton["found_in_documents"], true);
    // two table rows far apart: one match per row, not one per column
    assert_eq!(clinton["total_matches"], 2);
    let doc = &clinton["documents"][0];
    assert_eq!(doc["filename"], "EPSTEIN FLIGHT LOGS.pdf");
    assert_eq!(doc["classification"], "Flight Log");
    assert_eq!(doc["match_count"], 2);
    assert_eq!(doc["sha256"].as_str().unwrap().len(), 64);
    for m in doc["matches"].as_array().unwrap() {
        assert_eq!(m["page"], 1);
        assert_eq!(m["matched_variant"], "Clinton, Bill");
        assert!(!m["snippet"].as_str().unwrap().contains('\n'));
    }
}

#[test]
fn test_word_boundaries_and_length_floor() {
    let (tmp, config_path) = setup_test_env();
    let (_, stderr, success) = run_pidx(&config_path, &["index", "--progress", "off"]);
    assert!(success, "index failed: {}", stderr);

    let index = read_json(&index_path(&tmp));
    let gore = person(&index, "al-gore");
    assert_eq!(gore["found_in_documents"], false);
    assert_eq!(gore["total_matches"], 0);
    assert_eq!(gore["documents"].as_array().unwrap().len(), 0);
}

#[test]
fn test_unreadable_documents_are_skipped() {
    let (tmp, config_path) = setup_test_env();
    let (stdout, stderr, success) = run_pidx(&config_path, &["index", "--progress", "off"]);
    assert!(success, "index failed: {}", stderr);
    assert!(stdout.contains("scan-without-ocr.pdf"));

    let index = read_json(&index_path(&tmp));
    let all_files: Vec<String> = index["people"]
        .as_array()
        .unwrap()
        .iter()
        .flat_map(|p| p["documents"].as_array().unwrap().clone())
        .map(|d| d["filename"].as_str().unwrap().to_string())
        .collect();
    assert!(!all_files.iter().any(|f| f == "scan-without-ocr.pdf"));
    assert!(!all_files.iter().any(|f| f == "low-priority.pdf"));
}

#[test]
fn test_pdf_source_is_indexed() {
    let (tmp, config_path) = setup_test_env();
    let (_, stderr, success) = run_pidx(&config_path, &["index", "--progress", "off"]);
    assert!(success, "index failed: {}", stderr);

    let index = read_json(&index_path(&tmp));
    let maxwell = person(&index, "ghislaine-maxwell");
    let files: Vec<&str> = maxwell["documents"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["filename"].as_str().unwrap())
        .collect();
    assert_eq!(files, vec!["EPSTEIN FLIGHT LOGS.pdf", "exhibit.pdf"]);
    assert_eq!(maxwell["documents"][0]["matches"][0]["page"], 2);
    assert_eq!(maxwell["documents"][1]["classification"], "Exhibit");
}

#[test]
fn test_index_is_idempotent() {
    let (tmp, config_path) = setup_test_env();

    let (_, _, ok1) = run_pidx(&config_path, &["index", "--progress", "off"]);
    assert!(ok1);
    let first = read_json(&index_path(&tmp));

    let (_, _, ok2) = run_pidx(&config_path, &["index", "--progress", "off"]);
    assert!(ok2);
    let second = read_json(&index_path(&tmp));

    assert_eq!(
        serde_json::to_string(&first["people"]).unwrap(),
        serde_json::to_string(&second["people"]).unwrap()
    );
}

#[test]
fn test_stdout_and_dry_run() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) =
        run_pidx(&config_path, &["index", "--stdout", "--progress", "json"]);
    assert!(success, "index --stdout failed: {}", stderr);
    let index: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(index["people"].as_array().unwrap().len(), 3);
    assert!(stderr.contains("\"phase\":\"indexing\""));
    assert!(!index_path(&tmp).exists());

    let (stdout, _, success) = run_pidx(&config_path, &["index", "--dry-run", "--progress", "off"]);
    assert!(success);
    assert!(stdout.contains("dry-run"));
    assert!(!index_path(&tmp).exists());
}

#[test]
fn test_patch_apply_replay_and_conflict() {
    let (tmp, config_path) = setup_test_env();
    run_pidx(&config_path, &["index", "--progress", "off"]);

    let patch_path = tmp.path().join("fix.toml");
    fs::write(
        &patch_path,
        r#"[[patch]]
slug = "bill-clinton"
field = "category"
expect = "politics"
value = "politics-us"

[[patch]]
slug = "ghislaine-maxwell"
field = "pinpoint_entity_id"
value = "/m/0abc"
"#,
    )
    .unwrap();

    let (stdout, stderr, success) = run_pidx(&config_path, &["patch", patch_path.to_str().unwrap()]);
    assert!(success, "patch failed: {} {}", stdout, stderr);
    assert!(stdout.contains("applied: 2"));
    let index = read_json(&index_path(&tmp));
    assert_eq!(person(&index, "bill-clinton")["category"], "politics-us");
    assert_eq!(person(&index, "ghislaine-maxwell")["pinpoint_entity_id"], "/m/0abc");

    let (stdout, _, success) = run_pidx(&config_path, &["patch", patch_path.to_str().unwrap()]);
    assert!(success);
    assert!(stdout.contains("applied: 0"));
    assert!(stdout.contains("unchanged: 2"));

    let stale = tmp.path().join("stale.toml");
    fs::write(
        &stale,
        r#"[[patch]]
slug = "bill-clinton"
field = "category"
expect = "politics"
value = "other"
"#,
    )
    .unwrap();
    let before = fs::read_to_string(index_path(&tmp)).unwrap();
    let (_, stderr, success) = run_pidx(&config_path, &["patch", stale.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("expected"));
    assert_eq!(fs::read_to_string(index_path(&tmp)).unwrap(), before);
}

#[test]
fn test_rebuild_keeps_curated_fields() {
    let (tmp, config_path) = setup_test_env();
    let (_, stderr, success) = run_pidx(&config_path, &["index", "--progress", "off"]);
    assert!(success, "index failed: {}", stderr);

    let curate = tmp.path().join("curate.toml");
    fs::write(
        &curate,
        r#"[[patch]]
slug = "ghislaine-maxwell"
field = "custom_content.one_liner"
value = "British socialite"

[[patch]]
slug = "bill-clinton"
field = "pinpoint_entity_id"
value = "/m/0wrong"
"#,
    )
    .unwrap();
    let (_, stderr, success) = run_pidx(&config_path, &["patch", curate.to_str().unwrap()]);
    assert!(success, "patch failed: {}", stderr);

    let (stdout, stderr, success) = run_pidx(&config_path, &["index", "--progress", "off"]);
    assert!(success, "rebuild failed: {}", stderr);
    assert!(stdout.contains("curated fields kept: 2"));

    let index = read_json(&index_path(&tmp));
    let maxwell = person(&index, "ghislaine-maxwell");
    assert_eq!(maxwell["custom_content"]["one_liner"], "British socialite");
    assert_eq!(maxwell["total_matches"], 2);
    assert_eq!(person(&index, "bill-clinton")["pinpoint_entity_id"], "/m/0wrong");

    // a correction written against the old value still applies after a rebuild
    let fix = tmp.path().join("fix.toml");
    fs::write(
        &fix,
        r#"[[patch]]
slug = "bill-clinton"
field = "pinpoint_entity_id"
expect = "/m/0wrong"
value = "/m/0157m"
"#,
    )
    .unwrap();
    let (stdout, stderr, success) = run_pidx(&config_path, &["patch", fix.to_str().unwrap()]);
    assert!(success, "fix rejected: {} {}", stdout, stderr);
    assert!(stdout.contains("applied: 1"));
    let index = read_json(&index_path(&tmp));
    assert_eq!(person(&index, "bill-clinton")["pinpoint_entity_id"], "/m/0157m");
}

#[test]
fn test_warnings_name_the_reason() {
    let (tmp, config_path) = setup_test_env();
    let manifest = tmp.path().join("data/manifest.json");
    let content = fs::read_to_string(&manifest)
        .unwrap()
        .replace("\"local_path\": \"text/blank.txt\"", "\"local_path\": \"text/gone.txt\"");
    fs::write(&manifest, content).unwrap();

    let (stdout, stderr, success) = run_pidx(&config_path, &["index", "--progress", "off"]);
    assert!(success, "index failed: {}", stderr);
    assert!(stdout.contains("warning: scan-without-ocr.pdf: file not found"));
}

#[test]
fn test_write_manifest_fills_hashes() {
    let (tmp, config_path) = setup_test_env();
    let (stdout, stderr, success) =
        run_pidx(&config_path, &["index", "--progress", "off", "--write-manifest"]);
    assert!(success, "index failed: {}", stderr);
    assert!(stdout.contains("manifest_updated.json"));

    let updated = read_json(&tmp.path().join("data/manifest_updated.json"));
    let files = updated["files"].as_array().unwrap();
    assert_eq!(files.len(), 3);
    let flight_hash = files[0]["sha256"].as_str().unwrap();
    assert_eq!(flight_hash.len(), 64);

    let index = read_json(&index_path(&tmp));
    assert_eq!(person(&index, "bill-clinton")["documents"][0]["sha256"], flight_hash);
    // the original manifest is left alone
    assert!(read_json(&tmp.path().join("data/manifest.json"))["files"][0]["sha256"].is_null());
}

#[test]
fn test_sources_and_stats() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_pidx(&config_path, &["sources"]);
    assert!(success);
    assert!(stdout.contains("priority"));
    assert!(stdout.contains("exhibits"));
    assert!(stdout.contains("manifest"));

    run_pidx(&config_path, &["index", "--progress", "off"]);
    let (stdout, stderr, success) = run_pidx(&config_path, &["stats", "--top", "2"]);
    assert!(success, "stats failed: {}", stderr);
    assert!(stdout.contains("Names:       3"));
    assert!(stdout.contains("Not found:   1"));
    assert!(stdout.contains("EPSTEIN FLIGHT LOGS.pdf"));
}

#[test]
fn test_missing_config_fails() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, success) = run_pidx(&tmp.path().join("nope.toml"), &["index"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}
