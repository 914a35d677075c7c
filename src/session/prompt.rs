use std::path::Path;

use tracing::{debug, warn};

pub const PROMPT_FILE_NAME: &str = "tester_prompt.md";

/// Placeholder replaced with the configured completion marker.
const MARKER_PLACEHOLDER: &str = "{{completion_marker}}";

const DEFAULT_PROMPT: &str = r#"You are an exploratory tester. Your job is to use the application in this
project the way a curious, demanding user would, and to record every problem
you find.

## Tools

The `scout` MCP server gives you a durable record that survives between sessions:

- `feature_list_for_testing` / `feature_get_by_id`: the feature checklist to verify
- `finding_list` / `finding_get_stats`: issues already reported (check before reporting duplicates)
- `finding_report`: record a new issue with clear steps to reproduce
- `finding_update_status`: mark an issue in_progress, fixed or wont_fix after re-testing it
- `coverage_get_stats`: how much of the checklist is covered

## How to work

1. Start by reviewing coverage and the open findings so you do not repeat earlier work.
2. Pick features that are not yet passing or have few findings, and exercise them.
3. Look for functional bugs, confusing UX, edge cases, security problems and accessibility gaps.
4. Report each issue once, with severity (critical, high, medium, low), category
   (functional, ux, edge-case, security, accessibility) and reproduction steps.
5. Re-test open findings; update their status when the behavior has changed.

Each session starts with a fresh context. Everything worth keeping must go
through the tools above.

When you are confident nothing meaningful is left to explore, output exactly:

<promise>{{completion_marker}}</promise>
"#;

/// Load the tester prompt: `<prompts_dir>/tester_prompt.md` if present,
/// otherwise the built-in default. The marker placeholder is filled in both cases.
pub fn load_prompt(prompts_dir: &Path, completion_marker: &str) -> String {
    let custom = prompts_dir.join(PROMPT_FILE_NAME);
    let template = match std::fs::read_to_string(&custom) {
        Ok(content) if !content.trim().is_empty() => {
            debug!(path = %custom.display(), "Using custom tester prompt");
            content
        }
        Ok(_) => {
            warn!(path = %custom.display(), "Custom tester prompt is empty, using default");
            DEFAULT_PROMPT.to_string()
        }
        Err(_) => DEFAULT_PROMPT.to_string(),
    };
    template.replace(MARKER_PLACEHOLDER, completion_marker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_prompt_names_tools_and_marker() {
        let dir = tempdir().unwrap();
        let prompt = load_prompt(dir.path(), "TESTING_COMPLETE");
        for tool in [
            "finding_report",
            "finding_list",
            "finding_update_status",
            "finding_get_stats",
            "feature_list_for_testing",
            "feature_get_by_id",
            "coverage_get_stats",
        ] {
            assert!(prompt.contains(tool), "prompt should mention {}", tool);
        }
        assert!(prompt.contains("<promise>TESTING_COMPLETE</promise>"));
        assert!(!prompt.contains(MARKER_PLACEHOLDER));
    }

    #[test]
    fn test_custom_prompt_wins() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(PROMPT_FILE_NAME),
            "Test the checkout flow. Finish with <promise>{{completion_marker}}</promise>",
        )
        .unwrap();
        let prompt = load_prompt(dir.path(), "DONE");
        assert_eq!(prompt, "Test the checkout flow. Finish with <promise>DONE</promise>");
    }

    #[test]
    fn test_empty_custom_prompt_falls_back() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(PROMPT_FILE_NAME), "  \n").unwrap();
        assert!(load_prompt(dir.path(), "X").contains("exploratory tester"));
    }
}
