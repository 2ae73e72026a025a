// Tests for the exported run document and summary

use gossamer_core::report::{ScanReport, generate_summary};
use url::Url;

fn seed() -> Url {
    Url::parse("http://site.test/").unwrap()
}

#[test]
fn report_carries_target_results_and_count() {
    let results = vec![
        "http://site.test/a".to_string(),
        "http://cdn.other.test/b.js".to_string(),
    ];
    let report = ScanReport::new(&seed(), results, false);

    assert_eq!(report.target, "http://site.test/");
    assert_eq!(report.count, 2);
    assert!(report.tree.is_none());
}

#[test]
fn report_optionally_includes_the_tree() {
    let results = vec!["http://site.test/docs/intro".to_string()];
    let report = ScanReport::new(&seed(), results, true);

    let tree = report.tree.as_ref().unwrap();
    assert!(tree.children.contains_key("docs"));
}

#[test]
fn saved_json_round_trips() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("scan.json");

    let results = vec![
        "http://site.test/a".to_string(),
        "http://site.test/b?x=1".to_string(),
    ];
    let report = ScanReport::new(&seed(), results, true);
    report.save_json(&path)?;

    let raw = std::fs::read_to_string(&path)?;
    let value: serde_json::Value = serde_json::from_str(&raw)?;

    assert_eq!(value["target"], "http://site.test/");
    assert_eq!(value["count"], 2);
    assert_eq!(value["results"][0], "http://site.test/a");
    assert!(value["tree"]["children"].is_object());
    assert!(value["generated_at"].is_string());
    Ok(())
}

#[test]
fn summary_splits_counts_by_authority() {
    let results = vec![
        "http://site.test/a".to_string(),
        "http://site.test/b".to_string(),
        "http://cdn.other.test/c.js".to_string(),
    ];
    let summary = generate_summary(&seed(), &results);

    assert!(summary.contains("Internal links: 2"));
    assert!(summary.contains("External links: 1"));
    assert!(summary.contains("Total discovered: 3"));
}
