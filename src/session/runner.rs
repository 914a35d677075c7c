use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::prompt::load_prompt;
use super::stream::{ContentBlock, StreamEvent, describe_tool_use, tool_emoji, truncate_thinking};
use super::{SessionOutcome, SessionSignal};
use crate::config::Config;
use crate::errors::SessionError;
use crate::ui::SessionUI;

/// Inputs for one exploration session.
#[derive(Debug, Clone)]
pub struct SessionRequest {
    pub project_dir: PathBuf,
    /// Opaque model / engine identifier handed to the agent.
    pub model: String,
    /// 1-based session number, used to name the transcript.
    pub iteration: u32,
}

/// Runs exactly one exploration session and classifies how it ended.
///
/// Implementations never fail: every problem is folded into
/// [`SessionSignal::Error`].
#[async_trait]
pub trait SessionRunner: Send + Sync {
    async fn run(&self, request: &SessionRequest) -> SessionOutcome;
}

/// Session runner backed by the Claude CLI in stream-json mode.
pub struct ClaudeSessionRunner {
    config: Config,
    ui: Option<Arc<SessionUI>>,
}

impl ClaudeSessionRunner {
    pub fn new(config: Config) -> Self {
        Self { config, ui: None }
    }

    pub fn with_ui(mut self, ui: Arc<SessionUI>) -> Self {
        self.ui = Some(ui);
        self
    }

    fn step(&self, msg: &str) {
        debug!("{}", msg);
        if let Some(ref ui) = self.ui {
            ui.log_step(msg);
        }
    }

    /// Point the agent at `scout mcp` for this project.
    pub fn write_mcp_config(&self, project_dir: &Path) -> Result<PathBuf, SessionError> {
        let exe = std::env::current_exe().unwrap_or_else(|_| PathBuf::from("scout"));
        let path = self.config.mcp_config_file.clone();
        let write = || -> std::io::Result<()> {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let body = serde_json::to_string_pretty(&mcp_config_json(&exe, project_dir))
                .map_err(std::io::Error::other)?;
            std::fs::write(&path, body)
        };
        write().map_err(|source| SessionError::WriteFailed {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    async fn run_session(&self, request: &SessionRequest) -> Result<SessionOutcome, SessionError> {
        self.write_mcp_config(&request.project_dir)?;
        let prompt = load_prompt(&self.config.prompts_dir, &self.config.completion_marker);
        let output_file = self.config.session_output_file(request.iteration);
        let start = Instant::now();

        let flags = self.config.claude_flags(&request.model);
        let cmd_display = format!("{} {}", self.config.claude_cmd, flags.join(" "));
        self.step(&format!("Spawning: {}", cmd_display));

        let mut cmd = Command::new(&self.config.claude_cmd);
        cmd.args(&flags)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .current_dir(&request.project_dir);
        // Own process group: an operator Ctrl+C reaches the loop, not the agent.
        #[cfg(unix)]
        cmd.process_group(0);
        cmd.kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| SessionError::SpawnFailed {
            command: self.config.claude_cmd.clone(),
            source,
        })?;
        self.step(&format!("Process spawned (PID: {})", child.id().unwrap_or(0)));

        if let Some(mut stdin) = child.stdin.take() {
            let written = async {
                stdin.write_all(prompt.as_bytes()).await?;
                stdin.shutdown().await
            }
            .await;
            if let Err(e) = written {
                // The agent may exit before reading; its exit status decides the outcome.
                warn!(error = %e, "Failed to write prompt to agent stdin");
            }
        }

        let stderr = child.stderr.take();
        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            if let Some(mut stderr) = stderr {
                let _ = stderr.read_to_string(&mut buf).await;
            }
            buf
        });

        let ui_clone = self.ui.clone();
        let elapsed_task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            interval.tick().await;
            loop {
                interval.tick().await;
                if let Some(ref ui) = ui_clone {
                    ui.update_elapsed(start.elapsed());
                }
            }
        });

        let streamed = match child.stdout.take() {
            Some(stdout) => self.read_stream(stdout).await,
            None => Err(std::io::Error::other("agent stdout was not captured")),
        };
        if let Err(ref e) = streamed {
            warn!(error = %e, "Agent stream failed; stopping agent");
            if let Err(e) = child.kill().await {
                warn!(error = %e, "Failed to kill agent process");
            }
        }
        // Reap the agent on every path so no session outlives its turn.
        let waited = child.wait().await;
        elapsed_task.abort();
        let stderr_text = stderr_task.await.unwrap_or_default();
        let summary = streamed?;
        let status = waited?;
        let exit_code = status.code().unwrap_or(-1);
        self.step(&format!(
            "Completed in {:.1}s (exit: {})",
            start.elapsed().as_secs_f64(),
            exit_code
        ));

        let StreamSummary {
            text: accumulated_text,
            final_result,
            is_error,
        } = summary;
        let response = final_result.unwrap_or(accumulated_text);
        let mut transcript = response.clone();
        if !stderr_text.trim().is_empty() {
            transcript.push_str("\n--- stderr ---\n");
            transcript.push_str(&stderr_text);
        }
        std::fs::write(&output_file, &transcript).map_err(|source| SessionError::WriteFailed {
            path: output_file.clone(),
            source,
        })?;

        let signal = classify(exit_code, is_error, &response, &self.config.promise_tag())?;
        Ok(SessionOutcome::new(signal, response))
    }

    /// Consume the agent's stdout until EOF. Bytes that are not UTF-8 are
    /// replaced rather than ending the session.
    async fn read_stream<R>(&self, stdout: R) -> std::io::Result<StreamSummary>
    where
        R: AsyncRead + Unpin,
    {
        let mut reader = BufReader::new(stdout);
        let mut buf = Vec::new();
        let mut summary = StreamSummary::default();

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            let decoded = String::from_utf8_lossy(&buf);
            let line = decoded.trim_end_matches(['\n', '\r']);
            if line.trim().is_empty() {
                continue;
            }
            self.handle_line(line, &mut summary);
        }
        Ok(summary)
    }

    fn handle_line(&self, line: &str, summary: &mut StreamSummary) {
        match serde_json::from_str::<StreamEvent>(line) {
            Ok(StreamEvent::Assistant { message }) => {
                for content in message.content {
                    match content {
                        ContentBlock::ToolUse { name, input } => {
                            let desc = describe_tool_use(&name, &input);
                            debug!(tool = %name, "{}", desc);
                            if let Some(ref ui) = self.ui {
                                ui.show_tool_use(tool_emoji(&name), &desc);
                            }
                        }
                        ContentBlock::Text { text } => {
                            summary.text.push_str(&text);
                            summary.text.push('\n');
                            let snippet = truncate_thinking(&text, 60);
                            if !snippet.is_empty()
                                && let Some(ref ui) = self.ui
                            {
                                ui.show_thinking(&snippet);
                            }
                        }
                        ContentBlock::Other => {}
                    }
                }
            }
            Ok(StreamEvent::Result {
                result,
                is_error,
                subtype,
            }) => {
                debug!(%subtype, is_error, "Agent result event");
                summary.final_result = result;
                summary.is_error = is_error;
            }
            Ok(StreamEvent::User | StreamEvent::System { .. }) => {}
            Err(_) => {
                // Not a stream event; keep it in the transcript.
                summary.text.push_str(line);
                summary.text.push('\n');
            }
        }
    }
}

/// What the agent said over one session's stdout.
#[derive(Debug, Default)]
struct StreamSummary {
    text: String,
    final_result: Option<String>,
    is_error: bool,
}

#[async_trait]
impl SessionRunner for ClaudeSessionRunner {
    async fn run(&self, request: &SessionRequest) -> SessionOutcome {
        info!(iteration = request.iteration, model = %request.model, "Starting exploration session");
        match self.run_session(request).await {
            Ok(outcome) => {
                info!(iteration = request.iteration, signal = %outcome.signal, "Session finished");
                outcome
            }
            Err(e) => {
                warn!(iteration = request.iteration, error = %e, "Session failed");
                SessionOutcome::error(e.to_string())
            }
        }
    }
}

/// Map how the agent ended onto a signal. Abnormal endings are errors;
/// otherwise the completion tag decides between `complete` and `continue`.
pub fn classify(
    exit_code: i32,
    is_error: bool,
    output: &str,
    promise_tag: &str,
) -> Result<SessionSignal, SessionError> {
    if exit_code != 0 {
        return Err(SessionError::NonZeroExit { exit_code });
    }
    if is_error {
        return Err(SessionError::AgentReported(truncate_thinking(output, 200)));
    }
    if output.contains(promise_tag) {
        Ok(SessionSignal::Complete)
    } else {
        Ok(SessionSignal::Continue)
    }
}

/// MCP client configuration that launches this executable's `mcp` command.
pub fn mcp_config_json(exe: &Path, project_dir: &Path) -> Value {
    json!({
        "mcpServers": {
            "scout": {
                "command": exe.display().to_string(),
                "args": ["mcp", "--project-dir", project_dir.display().to_string()]
            }
        }
    })
}
