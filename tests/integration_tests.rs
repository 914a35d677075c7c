//! Integration tests for Scout
//!
//! These drive the `scout` binary end to end against temporary projects.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to create a scout Command isolated from the user's registry and env
fn scout(config_home: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("scout");
    cmd.env("SCOUT_CONFIG_DIR", config_home.path())
        .env_remove("CLAUDE_CMD")
        .env_remove("SCOUT_CLAUDE_CMD")
        .env_remove("SCOUT_MODEL")
        .env_remove("RUST_LOG");
    cmd
}

/// Helper to create a temporary project directory
fn create_temp_project() -> TempDir {
    TempDir::new().unwrap()
}

const FEATURES_JSON: &str = r#"[
  {"category": "auth", "name": "Login", "description": "Users can log in",
   "steps": ["open /login", "submit valid credentials"], "priority": 1},
  {"category": "cart", "name": "Add to cart", "description": "Items can be added",
   "steps": ["open a product", "click add"], "priority": 2, "passes": true}
]"#;

fn import_features(home: &TempDir, project: &TempDir) {
    let file = project.path().join("features.json");
    fs::write(&file, FEATURES_JSON).unwrap();
    scout(home)
        .current_dir(project.path())
        .args(["features", "import"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 2 feature(s)"));
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_scout_help() {
        let home = TempDir::new().unwrap();
        scout(&home)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("run"))
            .stdout(predicate::str::contains("mcp"));
    }

    #[test]
    fn test_scout_version() {
        let home = TempDir::new().unwrap();
        scout(&home).arg("--version").assert().success();
    }

    #[test]
    fn test_tools_lists_all_operations() {
        let home = TempDir::new().unwrap();
        let assert = scout(&home).arg("tools").assert().success();
        let out = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
        for tool in [
            "finding_report",
            "finding_get_stats",
            "finding_list",
            "finding_update_status",
            "feature_list_for_testing",
            "feature_get_by_id",
            "coverage_get_stats",
        ] {
            assert!(out.contains(tool), "missing {}", tool);
        }
    }

    #[test]
    fn test_max_iterations_must_be_positive() {
        let home = TempDir::new().unwrap();
        let project = create_temp_project();
        scout(&home)
            .current_dir(project.path())
            .args(["run", "--max-iterations", "0"])
            .assert()
            .failure();
    }
}

// =============================================================================
// Tracking store through the CLI
// =============================================================================

mod tracking {
    use super::*;

    #[test]
    fn test_import_and_query_features() {
        let home = TempDir::new().unwrap();
        let project = create_temp_project();
        import_features(&home, &project);

        assert!(project.path().join("features.db").exists());

        scout(&home)
            .current_dir(project.path())
            .args(["call", "feature_list_for_testing", "--args", r#"{"include_passing": false}"#])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"count\": 1"))
            .stdout(predicate::str::contains("Login"));

        scout(&home)
            .current_dir(project.path())
            .args(["call", "coverage_get_stats"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"coverage_percentage\": 50.0"));
    }

    #[test]
    fn test_import_with_invalid_entry_writes_nothing() {
        let home = TempDir::new().unwrap();
        let project = create_temp_project();
        let file = project.path().join("features.json");
        fs::write(
            &file,
            r#"[
  {"category": "auth", "name": "Login", "description": "Users can log in", "steps": ["open /login"]},
  {"category": "cart", "name": "Checkout", "description": "Orders go through", "steps": []}
]"#,
        )
        .unwrap();

        scout(&home)
            .current_dir(project.path())
            .args(["features", "import"])
            .arg(&file)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Feature #2 ('Checkout')"));

        scout(&home)
            .current_dir(project.path())
            .args(["call", "feature_list_for_testing"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"count\": 0"));
    }

    #[test]
    fn test_report_update_and_stats() {
        let home = TempDir::new().unwrap();
        let project = create_temp_project();

        scout(&home)
            .current_dir(project.path())
            .args([
                "call",
                "finding_report",
                "--args",
                r#"{"severity": "CRITICAL", "category": "Security", "title": "SQL injection in search",
                    "description": "A quote in the search box returns a database error",
                    "steps_to_reproduce": ["open /search", "enter '"]}"#,
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("Finding #1 reported successfully"))
            .stdout(predicate::str::contains("\"severity\": \"critical\""));

        assert!(project.path().join("test_findings.db").exists());

        scout(&home)
            .current_dir(project.path())
            .args([
                "call",
                "finding_update_status",
                "--args",
                r#"{"finding_id": 1, "status": "FIXED"}"#,
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("Finding #1 status updated to fixed"));

        scout(&home)
            .current_dir(project.path())
            .args(["stats", "--json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"fixed\": 1"))
            .stdout(predicate::str::contains("\"open_critical\": 0"));
    }

    #[test]
    fn test_invalid_call_exits_non_zero_with_payload() {
        let home = TempDir::new().unwrap();
        let project = create_temp_project();

        scout(&home)
            .current_dir(project.path())
            .args(["call", "finding_list", "--args", r#"{"severity": "extreme"}"#])
            .assert()
            .failure()
            .stdout(predicate::str::contains("\"kind\": \"validation\""));

        scout(&home)
            .current_dir(project.path())
            .args(["call", "feature_get_by_id", "--args", r#"{"feature_id": 42}"#])
            .assert()
            .failure()
            .stdout(predicate::str::contains("Feature with ID 42 not found"));

        scout(&home)
            .current_dir(project.path())
            .args(["call", "no_such_tool"])
            .assert()
            .failure()
            .stdout(predicate::str::contains("Unknown tool: no_such_tool"))
            .stderr(predicate::str::contains("Available tools: coverage_get_stats"));
    }

    #[test]
    fn test_features_mark() {
        let home = TempDir::new().unwrap();
        let project = create_temp_project();
        import_features(&home, &project);

        scout(&home)
            .current_dir(project.path())
            .args(["features", "mark", "1", "--passing", "--in-progress"])
            .assert()
            .success()
            .stdout(predicate::str::contains("passing"));

        scout(&home)
            .current_dir(project.path())
            .args(["features", "mark", "1"])
            .assert()
            .failure();

        scout(&home)
            .current_dir(project.path())
            .args(["features", "mark", "9", "--failing"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Feature with ID 9 not found"));
    }
}

// =============================================================================
// Project registry and configuration
// =============================================================================

mod projects {
    use super::*;

    #[test]
    fn test_register_and_resolve_by_name() {
        let home = TempDir::new().unwrap();
        let project = create_temp_project();

        scout(&home)
            .args(["project", "add", "shop"])
            .arg(project.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("Registered project 'shop'"));

        scout(&home)
            .args(["project", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("shop"));

        scout(&home)
            .args(["--project-dir", "shop", "call", "finding_get_stats"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"total\": 0"));
        assert!(project.path().join("test_findings.db").exists());
    }

    #[test]
    fn test_unknown_project_is_an_error() {
        let home = TempDir::new().unwrap();
        let cwd = create_temp_project();
        scout(&home)
            .current_dir(cwd.path())
            .args(["--project-dir", "nowhere", "stats"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown project 'nowhere'"));
    }

    #[test]
    fn test_config_init_and_validate() {
        let home = TempDir::new().unwrap();
        let project = create_temp_project();

        scout(&home)
            .current_dir(project.path())
            .args(["config", "init"])
            .assert()
            .success();
        assert!(project.path().join(".scout/scout.toml").exists());

        scout(&home)
            .current_dir(project.path())
            .args(["config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("is valid"));

        fs::write(
            project.path().join(".scout/scout.toml"),
            "[session]\ncompletion_marker = \"\"\n",
        )
        .unwrap();
        scout(&home)
            .current_dir(project.path())
            .args(["config", "validate"])
            .assert()
            .failure();
    }

    #[test]
    fn test_malformed_config_aborts_run() {
        let home = TempDir::new().unwrap();
        let project = create_temp_project();
        fs::create_dir_all(project.path().join(".scout")).unwrap();
        fs::write(project.path().join(".scout/scout.toml"), "[session\n").unwrap();

        scout(&home)
            .current_dir(project.path())
            .args(["run", "--max-iterations", "1"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Configuration error"));
    }
}

// =============================================================================
// MCP stdio server
// =============================================================================

mod mcp {
    use super::*;

    #[test]
    fn test_mcp_round_trip() {
        let home = TempDir::new().unwrap();
        let project = create_temp_project();
        let frames = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"finding_list","arguments":{}}}"#,
            "\n",
        );

        let assert = scout(&home)
            .current_dir(project.path())
            .arg("mcp")
            .write_stdin(frames)
            .assert()
            .success();
        let out = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
        let responses: Vec<serde_json::Value> = out
            .lines()
            .map(|l| serde_json::from_str(l).expect("stdout must carry only JSON-RPC frames"))
            .collect();

        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0]["result"]["serverInfo"]["name"], "scout");
        assert_eq!(responses[1]["result"]["tools"].as_array().unwrap().len(), 7);
        assert_eq!(responses[2]["result"]["isError"], false);
    }
}

// =============================================================================
// Exploration loop with a fake agent
// =============================================================================

#[cfg(unix)]
mod exploration_loop {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    fn write_agent(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake-agent.sh");
        fs::write(&path, format!("#!/bin/sh\ncat > /dev/null\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn fast_config(project: &TempDir) {
        fs::create_dir_all(project.path().join(".scout")).unwrap();
        fs::write(
            project.path().join(".scout/scout.toml"),
            "[session]\ncontinue_delay_secs = 0\n",
        )
        .unwrap();
    }

    #[test]
    fn test_run_stops_when_agent_completes() {
        let home = TempDir::new().unwrap();
        let project = create_temp_project();
        fast_config(&project);
        let agent = write_agent(
            project.path(),
            r#"echo '{"type":"result","subtype":"success","is_error":false,"result":"All covered <promise>TESTING_COMPLETE</promise>"}'"#,
        );

        scout(&home)
            .current_dir(project.path())
            .env("SCOUT_CLAUDE_CMD", &agent)
            .args(["run", "--max-iterations", "5"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Testing complete"))
            .stdout(predicate::str::contains("Sessions run: 1"));

        assert!(project.path().join(".scout/mcp.json").exists());
        assert!(project.path().join(".scout/logs/session-1-output.log").exists());
        assert!(!project.path().join(".scout/logs/session-2-output.log").exists());
    }

    #[test]
    fn test_run_hits_iteration_limit() {
        let home = TempDir::new().unwrap();
        let project = create_temp_project();
        fast_config(&project);
        let agent = write_agent(
            project.path(),
            r#"echo '{"type":"assistant","message":{"content":[{"type":"text","text":"Checked the login page"}]}}'"#,
        );

        scout(&home)
            .current_dir(project.path())
            .env("SCOUT_CLAUDE_CMD", &agent)
            .args(["run", "--max-iterations", "2"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Reached max iterations (2)"))
            .stdout(predicate::str::contains("Sessions run: 2"))
            .stdout(predicate::str::contains("To resume, run the same command again"));

        let history = fs::read_to_string(project.path().join(".scout/logs/sessions.log")).unwrap();
        assert_eq!(history.lines().count(), 2);
    }

    #[test]
    fn test_failing_agent_is_retried_not_fatal() {
        let home = TempDir::new().unwrap();
        let project = create_temp_project();
        fast_config(&project);
        let agent = write_agent(project.path(), "echo 'rate limited' >&2\nexit 2");

        scout(&home)
            .current_dir(project.path())
            .env("SCOUT_CLAUDE_CMD", &agent)
            .args(["run", "--max-iterations", "2"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Sessions run: 2 (2 failed)"));
    }

    #[test]
    fn test_missing_agent_binary_is_retried() {
        let home = TempDir::new().unwrap();
        let project = create_temp_project();
        fast_config(&project);

        scout(&home)
            .current_dir(project.path())
            .env("SCOUT_CLAUDE_CMD", "/nonexistent/agent")
            .args(["run", "--max-iterations", "1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Sessions run: 1 (1 failed)"));
    }
}
