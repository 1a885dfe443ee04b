//! Clipboard export through the platform's command-line clipboard tools.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Clipboard: Send + Sync {
    /// Replaces the clipboard content with `text`.
    async fn copy(&self, text: &str) -> Result<()>;
}

/// A program that reads the clipboard content from its stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardTool {
    pub program: String,
    pub args: Vec<String>,
}

impl ClipboardTool {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Tries each tool in order and uses the first one installed.
pub struct SystemClipboard {
    tools: Vec<ClipboardTool>,
}

impl Default for SystemClipboard {
    fn default() -> Self {
        let tools = if cfg!(target_os = "macos") {
            vec![ClipboardTool::new("pbcopy", &[])]
        } else if cfg!(target_os = "windows") {
            vec![ClipboardTool::new("clip", &[])]
        } else {
            vec![
                ClipboardTool::new("wl-copy", &[]),
                ClipboardTool::new("xclip", &["-selection", "clipboard"]),
                ClipboardTool::new("xsel", &["--clipboard", "--input"]),
            ]
        };
        Self { tools }
    }
}

impl SystemClipboard {
    pub fn with_tools(tools: Vec<ClipboardTool>) -> Self {
        Self { tools }
    }
}

async fn pipe_to(tool: &ClipboardTool, text: &str) -> std::io::Result<std::process::ExitStatus> {
    let mut child = Command::new(&tool.program)
        .args(&tool.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(text.as_bytes()).await?;
    }
    child.wait().await
}

#[async_trait]
impl Clipboard for SystemClipboard {
    async fn copy(&self, text: &str) -> Result<()> {
        for tool in &self.tools {
            match pipe_to(tool, text).await {
                Ok(status) if status.success() => {
                    info!(tool = %tool.program, bytes = text.len(), "Copied to clipboard");
                    return Ok(());
                }
                Ok(status) => bail!("{} exited with {}", tool.program, status),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!(tool = %tool.program, "Clipboard tool not installed");
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to run {}", tool.program));
                }
            }
        }
        bail!("No clipboard tool available")
    }
}
