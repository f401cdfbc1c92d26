use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const GAINERS_PAGE: &str = "<html><body><table><tr><th>Company</th><th>High</th><th>Low</th>\
    <th>Last Price</th><th>Prev Close</th><th>Change</th><th>% Gain</th></tr>\
    <tr><td>Alpha</td><td>12</td><td>10</td><td>Rs. 11.5</td><td>10.8</td><td>0.7</td><td>6.48%</td></tr>\
    <tr><td>Beta</td><td>55</td><td>50</td><td>Rs. 54</td><td>50.2</td><td>3.8</td><td>7.57%</td></tr>\
    </table></body></html>";

const NEWS_PAGE: &str = "<html><body><main>\
    <p>Benchmark indices ended flat as metal stocks offset weakness in banks.</p>\
    <p>Crude oil prices eased after the latest inventory data.</p>\
    </main></body></html>";

#[allow(deprecated)]
fn marketlens(index_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("marketlens").expect("binary");
    cmd.env_remove("OPENAI_API_KEY")
        .env_remove("MARKETLENS_EMBEDDING_MODE")
        .env("MARKETLENS_INDEX_DIR", index_dir);
    cmd
}

fn json_output(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("command run");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid json")
}

#[test]
fn classify_prints_category_and_template() {
    let tmp = tempdir().unwrap();
    marketlens(tmp.path())
        .args(["classify", "Show latest quarterly results"])
        .assert()
        .success()
        .stdout(predicate::str::contains("result (template: results)"));

    let body = json_output(marketlens(tmp.path()).args(["classify", "--json", "large cap stocks"]));
    assert_eq!(body["category"], "large_cap");
    assert_eq!(body["template"], "large_cap");
}

#[test]
fn classify_honours_custom_rules() {
    let tmp = tempdir().unwrap();
    let rules = tmp.path().join("rules.toml");
    fs::write(
        &rules,
        "[[rule]]\ncategory = \"top_gainers\"\nkeywords = [\"rally\"]\n",
    )
    .unwrap();
    let body = json_output(marketlens(tmp.path()).args([
        "classify",
        "--json",
        "--rules",
        rules.to_str().unwrap(),
        "midday rally",
    ]));
    assert_eq!(body["category"], "top_gainers");
}

#[test]
fn extract_reads_local_movers_page() {
    let tmp = tempdir().unwrap();
    let page = tmp.path().join("nse-gainers.html");
    fs::write(&page, GAINERS_PAGE).unwrap();

    let body = json_output(marketlens(tmp.path()).args(["extract", "--json", page.to_str().unwrap()]));
    assert_eq!(body["page"], "movers");
    let records = body["records"]["records"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1]["kind"]["company"], "Beta");
    assert_eq!(records[1]["kind"]["price"], "₹54");
}

#[test]
fn chunk_reports_stats() {
    let tmp = tempdir().unwrap();
    let file = tmp.path().join("doc.txt");
    fs::write(&file, "x".repeat(5000)).unwrap();
    let body = json_output(
        marketlens(tmp.path())
            .env("MARKETLENS_CHUNK_OVERLAP", "100")
            .env("MARKETLENS_CHUNK_SIZE", "1000")
            .args(["chunk", "--json", file.to_str().unwrap()]),
    );
    assert_eq!(body.as_array().unwrap().len(), 6);
}

#[test]
fn index_is_built_once_and_queried() {
    let tmp = tempdir().unwrap();
    let page = tmp.path().join("news.html");
    fs::write(&page, NEWS_PAGE).unwrap();
    let index_dir = tmp.path().join("indexes");

    let first = json_output(marketlens(&index_dir).args([
        "index",
        "--json",
        "--query",
        "metal stocks",
        page.to_str().unwrap(),
    ]));
    let path = first["path"].as_str().unwrap();
    assert!(Path::new(path).exists());
    assert_eq!(first["hits"][0]["chunk"]["sequence_index"], 0);

    let second = json_output(marketlens(&index_dir).args(["index", "--json", page.to_str().unwrap()]));
    assert_eq!(second["fingerprint"], first["fingerprint"]);
}

#[test]
fn analyze_without_shareholding_data_is_not_available() {
    let tmp = tempdir().unwrap();
    let page = tmp.path().join("nse-gainers.html");
    fs::write(&page, GAINERS_PAGE).unwrap();

    let body = json_output(marketlens(tmp.path()).args([
        "analyze",
        "--json",
        "--source",
        page.to_str().unwrap(),
        "shareholding trend",
    ]));
    assert_eq!(body["outcome"]["status"], "no_data");
    assert_eq!(body["context"]["text"], "No shareholding data available.");
}

#[test]
fn analyze_without_api_key_reports_generation_failure() {
    let tmp = tempdir().unwrap();
    let page = tmp.path().join("nse-gainers.html");
    fs::write(&page, GAINERS_PAGE).unwrap();

    let body = json_output(marketlens(tmp.path()).args([
        "analyze",
        "--json",
        "-s",
        page.to_str().unwrap(),
        "top gainers today",
    ]));
    assert_eq!(body["query"]["category"], "top_gainers");
    assert_eq!(body["context"]["items"], 2);
    assert!(body["context"]["text"]
        .as_str()
        .unwrap()
        .starts_with("Beta: ₹54 (+7.57%)"));
    assert_eq!(body["outcome"]["status"], "generation_failed");
}

#[test]
fn missing_source_is_an_error_for_extract() {
    let tmp = tempdir().unwrap();
    marketlens(tmp.path())
        .args(["extract", "/nonexistent/page.html"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to fetch"));
}

#[test]
fn unknown_news_preset_is_rejected() {
    let tmp = tempdir().unwrap();
    marketlens(tmp.path())
        .args(["analyze", "--news", "reuters", "market news"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown news preset 'reuters'"));
}

#[test]
fn local_file_named_like_a_symbol_is_read_from_disk() {
    let tmp = tempdir().unwrap();
    fs::write(tmp.path().join("TCS"), NEWS_PAGE).unwrap();

    let body = json_output(
        marketlens(tmp.path())
            .current_dir(tmp.path())
            .args(["extract", "--json", "TCS"]),
    );
    assert_eq!(body["extract"]["source"], "TCS");
    assert_eq!(body["page"], "news");
}
