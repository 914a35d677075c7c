use serde::Deserialize;
use serde_json::Value;

/// Events from the agent CLI's stream-json output format
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum StreamEvent {
    #[serde(rename = "assistant")]
    Assistant { message: AssistantMessage },

    #[serde(rename = "user")]
    User,

    #[serde(rename = "result")]
    Result {
        #[serde(default)]
        subtype: String,
        #[serde(default)]
        result: Option<String>,
        #[serde(default)]
        is_error: bool,
    },

    #[serde(rename = "system")]
    System {
        #[serde(default)]
        subtype: String,
    },
}

#[derive(Debug, Deserialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "tool_use")]
    ToolUse { name: String, input: Value },

    #[serde(rename = "text")]
    Text { text: String },

    #[serde(other)]
    Other,
}

/// `mcp__scout__finding_report` -> `finding_report`; plain names pass through.
pub fn short_tool_name(name: &str) -> &str {
    match name.strip_prefix("mcp__") {
        Some(rest) => rest.split_once("__").map(|(_, tool)| tool).unwrap_or(rest),
        None => name,
    }
}

fn str_field<'a>(input: &'a Value, key: &str) -> Option<&'a str> {
    input.get(key).and_then(|v| v.as_str())
}

/// Extract a human-readable description from a tool use event
pub fn describe_tool_use(name: &str, input: &Value) -> String {
    let short = short_tool_name(name);
    match short {
        "finding_report" => {
            let severity = str_field(input, "severity").unwrap_or("?");
            let title = str_field(input, "title")
                .map(|t| truncate_str(t, 50))
                .unwrap_or_else(|| "untitled".to_string());
            format!("Reporting [{}]: {}", severity.to_lowercase(), title)
        }
        "finding_update_status" => {
            let id = input.get("finding_id").and_then(|v| v.as_i64()).unwrap_or(0);
            let status = str_field(input, "status").unwrap_or("?");
            format!("Finding #{} -> {}", id, status)
        }
        "finding_list" => "Listing findings".to_string(),
        "finding_get_stats" | "coverage_get_stats" => "Checking stats".to_string(),
        "feature_list_for_testing" => "Listing features".to_string(),
        "feature_get_by_id" => {
            let id = input.get("feature_id").and_then(|v| v.as_i64()).unwrap_or(0);
            format!("Reading feature #{}", id)
        }
        "browser_navigate" => {
            let url = str_field(input, "url")
                .map(|u| truncate_str(u, 60))
                .unwrap_or_else(|| "page".to_string());
            format!("Navigating: {}", url)
        }
        "browser_click" => {
            let element = str_field(input, "element")
                .map(|e| truncate_str(e, 40))
                .unwrap_or_else(|| "element".to_string());
            format!("Clicking: {}", element)
        }
        "browser_type" => "Typing input".to_string(),
        "browser_take_screenshot" | "browser_snapshot" => "Capturing page".to_string(),
        "Bash" => {
            let cmd = str_field(input, "command")
                .map(|s| truncate_str(s, 40))
                .unwrap_or_else(|| "command".to_string());
            format!("Running: {}", cmd)
        }
        "Read" => {
            let path = str_field(input, "file_path").unwrap_or("file");
            format!("Reading: {}", shorten_path(path))
        }
        _ => short.to_string(),
    }
}

/// Get an emoji for a tool
pub fn tool_emoji(name: &str) -> &'static str {
    let short = short_tool_name(name);
    match short {
        "finding_report" => "\u{1F41B}",                         // bug
        "finding_update_status" => "\u{270F}\u{FE0F}",           // pencil
        "finding_list" | "feature_list_for_testing" => "\u{1F4CB}", // clipboard
        "finding_get_stats" | "coverage_get_stats" => "\u{1F4CA}",  // chart
        "feature_get_by_id" => "\u{1F4D6}",                      // book
        "Bash" => "\u{2699}\u{FE0F}",                            // gear
        s if s.starts_with("browser_") => "\u{1F310}",           // globe
        _ => "\u{1F527}",                                        // wrench
    }
}

/// Shorten a file path to just the last 2 components
fn shorten_path(path: &str) -> String {
    let parts: Vec<&str> = path.split('/').collect();
    if parts.len() <= 2 {
        path.to_string()
    } else {
        parts[parts.len() - 2..].join("/")
    }
}

/// Truncate a string with ellipsis, respecting char boundaries
fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Truncate thinking text to a reasonable snippet
pub fn truncate_thinking(text: &str, max_len: usize) -> String {
    let first_line = text.lines().next().unwrap_or(text);
    truncate_str(first_line.trim(), max_len)
}
