//! End-to-end runs through the standard capabilities

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

mod common;

use std::sync::Arc;

use common::{config_for, orchestrator, search_body, verified_aws_key, ScriptedRunner};
use leakhunt_core::agents::clarify::CLARIFICATION;
use leakhunt_core::agents::{CLARIFY, RECON, REPORT, SCAN, SEARCH};
use leakhunt_core::oracle::{Decision, RuleOracle, ScriptedOracle};
use leakhunt_core::orchestrator::{Payload, Termination};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BANK: &str = "https://github.com/acme/bank";
const TOOLS: &str = "https://github.com/acme/tools";

fn speakers(outcome: &leakhunt_core::orchestrator::RunOutcome) -> Vec<&str> {
    outcome
        .transcript
        .messages()
        .iter()
        .map(|m| m.speaker.as_str())
        .collect()
}

#[tokio::test]
async fn test_brand_search_reports_single_verified_finding() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/code"))
        .and(query_param("q", "hdfc AND (api_key= OR apikey= OR access_token= OR secret= OR password=)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(&[
            "https://github.com/acme/bank/blob/main/config.py",
            "https://github.com/acme/tools/blob/main/README.md",
            "https://github.com/acme/bank/blob/dev/settings.py",
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let runner = Arc::new(
        ScriptedRunner::new().trufflehog_records(BANK, &[verified_aws_key(BANK, "config.py", 12)]),
    );
    let config = config_for(&server);
    let outcome = orchestrator(&config, runner.clone(), Arc::new(RuleOracle::new()))
        .run("hdfc")
        .await;

    assert!(outcome.is_completed(), "{:?}", outcome.termination);
    assert_eq!(speakers(&outcome), vec!["user", SEARCH, SCAN, REPORT]);
    assert_eq!(outcome.turns, 3);

    let search = &outcome.transcript.messages()[1];
    assert_eq!(
        search.payload,
        Some(Payload::Repositories(vec![BANK.to_string(), TOOLS.to_string()]))
    );

    let scans = outcome.transcript.latest_scan_results().unwrap();
    assert_eq!(scans.len(), 2);
    assert_eq!(scans[0].repository(), BANK);
    assert_eq!(scans[0].findings().len(), 1);
    assert!(!scans[1].has_findings());

    let summary = outcome.final_message().unwrap();
    assert!(summary.contains("1. [CRITICAL] AWS (verified) in https://github.com/acme/bank"));
    assert!(summary.contains("Where: config.py:12"));
    assert!(!summary.contains("2. ["));
    assert!(summary.contains(TOOLS));
    assert!(outcome.transcript.last().unwrap().is_terminate());

    // trufflehog once per repository, gitleaks clone and scan per repository
    let programs = runner.programs();
    assert_eq!(programs.iter().filter(|p| *p == "trufflehog").count(), 2);
    assert_eq!(programs.iter().filter(|p| *p == "git").count(), 2);
    assert_eq!(programs.iter().filter(|p| *p == "gitleaks").count(), 2);

    assert_eq!(outcome.tool_executions.len(), programs.len());
    assert!(outcome
        .tool_executions
        .iter()
        .all(|e| e.completed_at.is_some() && e.error.is_none()));
}

#[tokio::test]
async fn test_repository_named_like_stop_phrase_is_still_scanned() {
    const ODD: &str = "https://github.com/acme/TERMINATE-tools";

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(&[
            "https://github.com/acme/TERMINATE-tools/blob/main/a.py",
        ])))
        .mount(&server)
        .await;

    let runner = Arc::new(
        ScriptedRunner::new().trufflehog_records(ODD, &[verified_aws_key(ODD, "a.py", 4)]),
    );
    let config = config_for(&server);
    let outcome = orchestrator(&config, runner.clone(), Arc::new(RuleOracle::new()))
        .run("hdfc")
        .await;

    assert!(outcome.is_completed(), "{:?}", outcome.termination);
    assert_eq!(speakers(&outcome), vec!["user", SEARCH, SCAN, REPORT]);
    assert!(!outcome.transcript.messages()[1].is_terminate());
    assert!(runner.programs().contains(&"trufflehog".to_string()));

    let summary = outcome.final_message().unwrap();
    assert!(summary.contains("Where: a.py:4"));
}

#[tokio::test]
async fn test_repository_url_skips_code_search() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(&[])))
        .expect(0)
        .mount(&server)
        .await;

    let runner = Arc::new(ScriptedRunner::new().gitleaks_records(
        BANK,
        vec![json!({
            "Description": "Generic API Key",
            "File": ".env",
            "StartLine": 3,
            "Secret": "sk_live_51Habcdefghijkl",
            "RuleID": "generic-api-key",
            "Commit": "77aa01b",
            "Author": "ops",
            "Email": "ops@acme.test",
            "Date": "2024-01-09T12:00:00Z"
        })],
    ));
    let config = config_for(&server);
    let outcome = orchestrator(&config, runner, Arc::new(RuleOracle::new()))
        .run("https://github.com/acme/bank/blob/main/.env")
        .await;

    assert!(outcome.is_completed(), "{:?}", outcome.termination);
    let messages = outcome.transcript.messages();
    assert_eq!(messages[1].speaker, SEARCH);
    assert_eq!(messages[1].handoff_target(), Some(SCAN));
    assert_eq!(
        messages[1].payload,
        Some(Payload::Repositories(vec![BANK.to_string()]))
    );

    let summary = outcome.final_message().unwrap();
    assert!(summary.contains("generic-api-key"));
    assert!(summary.contains("Where: .env:3"));
}

#[tokio::test]
async fn test_clean_scan_hands_off_without_oracle() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(&[
            "https://github.com/acme/tools/blob/main/app.js",
        ])))
        .mount(&server)
        .await;

    let oracle = Arc::new(ScriptedOracle::new([
        Decision::Select(SEARCH.to_string()),
        Decision::Select(SCAN.to_string()),
    ]));
    let config = config_for(&server);
    let outcome = orchestrator(&config, Arc::new(ScriptedRunner::new()), oracle.clone())
        .run("acme")
        .await;

    assert!(outcome.is_completed(), "{:?}", outcome.termination);
    assert_eq!(oracle.calls(), 2);
    assert_eq!(speakers(&outcome), vec!["user", SEARCH, SCAN, REPORT]);
    assert_eq!(outcome.transcript.messages()[2].handoff_target(), Some(REPORT));
    assert!(outcome
        .final_message()
        .unwrap()
        .contains("No sensitive information was found"));
}

#[tokio::test]
async fn test_empty_search_hands_off_to_report() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(&[])))
        .mount(&server)
        .await;

    let runner = Arc::new(ScriptedRunner::new());
    let config = config_for(&server);
    let outcome = orchestrator(&config, runner.clone(), Arc::new(RuleOracle::new()))
        .run("nosuchbrand")
        .await;

    assert!(outcome.is_completed());
    assert_eq!(speakers(&outcome), vec!["user", SEARCH, REPORT]);
    let summary = outcome.final_message().unwrap();
    assert!(summary.starts_with("No sensitive information was found"));
    assert!(summary.contains("No GitHub results found for this query"));
    assert!(runner.programs().is_empty());
}

#[tokio::test]
async fn test_tool_failures_are_reported_not_fatal() {
    let server = MockServer::start().await;
    let runner = Arc::new(
        ScriptedRunner::new()
            .trufflehog_exit(BANK, 183, "error: rate limited")
            .failing_clone(BANK),
    );
    let config = config_for(&server);
    let outcome = orchestrator(&config, runner.clone(), Arc::new(RuleOracle::new()))
        .run(BANK)
        .await;

    assert!(outcome.is_completed(), "{:?}", outcome.termination);
    let scans = outcome.transcript.latest_scan_results().unwrap();
    assert_eq!(scans[0].tool_errors().len(), 2);

    let summary = outcome.final_message().unwrap();
    assert!(summary.contains("## Tool errors"));
    assert!(summary.contains("rate limited"));
    assert!(summary.contains("repository not found"));
    // clone failed, so gitleaks itself never ran
    assert!(!runner.programs().contains(&"gitleaks".to_string()));
}

#[tokio::test]
async fn test_search_api_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/code"))
        .respond_with(ResponseTemplate::new(403).set_body_string("API rate limit exceeded"))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let outcome = orchestrator(&config, Arc::new(ScriptedRunner::new()), Arc::new(RuleOracle::new()))
        .run("hdfc")
        .await;

    assert!(outcome.is_completed());
    assert_eq!(speakers(&outcome), vec!["user", SEARCH, REPORT]);
    assert!(outcome.final_message().unwrap().contains("403"));
}

#[tokio::test]
async fn test_domain_request_runs_recon() {
    let server = MockServer::start().await;
    let runner = Arc::new(
        ScriptedRunner::new()
            .text("whois", "Registrar: Example Registrar, Inc.")
            .text("nmap", "443/tcp open https"),
    );
    let config = config_for(&server);
    let outcome = orchestrator(&config, runner.clone(), Arc::new(RuleOracle::new()))
        .run("example.com")
        .await;

    assert!(outcome.is_completed());
    assert_eq!(speakers(&outcome), vec!["user", RECON]);
    let summary = outcome.final_message().unwrap();
    assert!(summary.contains("Example Registrar"));
    assert!(summary.contains("443/tcp open https"));

    let calls = runner.calls.lock().unwrap();
    let nmap = calls.iter().find(|c| c.program == "nmap").unwrap();
    assert_eq!(nmap.args, vec!["-sT", "-Pn", "example.com"]);
}

#[tokio::test]
async fn test_unclear_request_asks_for_clarification() {
    let server = MockServer::start().await;
    let config = config_for(&server);
    let outcome = orchestrator(&config, Arc::new(ScriptedRunner::new()), Arc::new(RuleOracle::new()))
        .run("hello")
        .await;

    assert!(outcome.is_completed());
    assert_eq!(speakers(&outcome), vec!["user", CLARIFY]);
    assert_eq!(outcome.final_message(), Some(CLARIFICATION));
}

#[tokio::test]
async fn test_turn_budget_leaves_run_incomplete() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(&[
            "https://github.com/acme/bank/blob/main/a.py",
        ])))
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.orchestrator.max_turns = 1;
    let outcome = orchestrator(&config, Arc::new(ScriptedRunner::new()), Arc::new(RuleOracle::new()))
        .run("hdfc")
        .await;

    assert!(matches!(
        outcome.termination,
        Termination::BudgetExceeded { max_turns: 1 }
    ));
    assert_eq!(speakers(&outcome), vec!["user", SEARCH]);
    assert!(!outcome.transcript.is_terminated());
}
