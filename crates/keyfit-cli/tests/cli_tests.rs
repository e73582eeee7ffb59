mod common;

use assert_cmd::Command;
use common::{start_backend, LIFETIME_TOTAL, SCOPED_TOTAL};
use regex::Regex;
use std::fs;
use tempfile::TempDir;

struct TestContext {
    dir: TempDir,
    backend: String,
}

impl TestContext {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
            backend: start_backend(),
        }
    }

    fn keyfit(&self) -> Command {
        let mut cmd = Command::cargo_bin("keyfit").unwrap();
        cmd.current_dir(self.dir.path())
            .arg("--backend")
            .arg(&self.backend)
            .arg("--prefs")
            .arg(self.dir.path().join("prefs.json"));
        cmd
    }

    fn stdout(&self, args: &[&str]) -> String {
        let output = self.keyfit().args(args).output().unwrap();
        assert!(
            output.status.success(),
            "keyfit {:?} failed:\n{}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).unwrap()
    }
}

#[test]
fn test_help_lists_commands() {
    let output = Command::cargo_bin("keyfit").unwrap().arg("--help").output().unwrap();
    let text = String::from_utf8(output.stdout).unwrap();
    for sub in ["ranking", "heatmap", "apps", "status", "toggle", "layout", "watch"] {
        assert!(text.contains(sub), "missing {} in help", sub);
    }
}

#[test]
fn test_layout_preference_round_trip() {
    let ctx = TestContext::new();
    assert!(ctx.stdout(&["layout"]).contains("JP"));
    assert!(ctx.stdout(&["layout", "us"]).contains("US"));
    assert!(ctx.stdout(&["layout"]).contains("US"));

    let saved = fs::read_to_string(ctx.dir.path().join("prefs.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&saved).unwrap();
    assert_eq!(json["keyLayout"]["value"], "US");
}

#[test]
fn test_layout_rejects_unknown_variant() {
    let ctx = TestContext::new();
    ctx.keyfit().args(["layout", "DE"]).assert().failure();
}

#[test]
fn test_ranking_prints_totals_and_exports_csv() {
    let ctx = TestContext::new();
    let csv_path = ctx.dir.path().join("ranking.csv");
    let out = ctx.stdout(&["ranking", "--csv", csv_path.to_str().unwrap()]);

    let total = Regex::new(&format!(r"Total Typed: {} / {}", SCOPED_TOTAL, LIFETIME_TOTAL)).unwrap();
    assert!(total.is_match(&out), "unexpected output:\n{}", out);
    assert!(out.contains("Space"));

    let csv = fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "rank,key_code,key_name,count");
    assert!(lines[1].starts_with("1,Space,"));
    assert!(lines[2].starts_with("2,KeyE,E,20"));
}

#[test]
fn test_ranking_all_preset_uses_observed_range() {
    let ctx = TestContext::new();
    let out = ctx.stdout(&["ranking", "--preset", "All", "--app", "2"]);
    let scope = Regex::new(r"\d{4}-\d{2}-\d{2} → \d{4}-\d{2}-\d{2}\s+\[All\]\s+Browser").unwrap();
    assert!(scope.is_match(&out), "unexpected output:\n{}", out);
}

#[test]
fn test_heatmap_writes_svg() {
    let ctx = TestContext::new();
    let svg_path = ctx.dir.path().join("heat.svg");
    ctx.stdout(&["heatmap", "--svg", svg_path.to_str().unwrap(), "--key-width", "40"]);

    let svg = fs::read_to_string(&svg_path).unwrap();
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains(r#"data-code="Space" data-count="30""#));
    assert!(svg.contains(r#"width="40""#));
}

#[test]
fn test_apps_lists_lifetime_totals() {
    let ctx = TestContext::new();
    let out = ctx.stdout(&["apps"]);
    assert!(out.contains("Editor"));
    assert!(out.contains("Browser"));
    assert!(out.contains(&LIFETIME_TOTAL.to_string()));
    assert!(out.contains("200"));
}

#[test]
fn test_toggle_flips_status() {
    let ctx = TestContext::new();
    assert!(ctx.stdout(&["status"]).contains("❌ Stopped"));
    assert!(ctx.stdout(&["toggle"]).contains("✅ Monitoring"));
    assert!(ctx.stdout(&["status"]).contains("✅ Monitoring"));
}

#[test]
fn test_unreachable_backend_fails() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("keyfit")
        .unwrap()
        .current_dir(dir.path())
        .args(["--backend", "http://127.0.0.1:1", "status"])
        .assert()
        .failure();
}
