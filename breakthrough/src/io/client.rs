//! Generative service abstraction.
//!
//! The [`GenerativeClient`] trait decouples the controller from the service
//! backend. Implementations never fail: transport problems come back as text
//! prefixed with [`error_prefix`], which the controller shows to the operator
//! like any other response. Tests use scripted clients that replay canned text.

use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, instrument, warn};

use crate::core::types::GenerationRequest;
use crate::io::config::{ModelConfig, RequestFormat};
use crate::io::process::run_with_input;

/// Contract for one blocking generation call.
pub trait GenerativeClient {
    /// Run the request and return the response text, or error text on failure.
    fn run(&self, request: &GenerationRequest) -> String;
}

/// Prefix used for error text returned in place of a response.
pub fn error_prefix(model: &str) -> String {
    format!("ERROR from {model}: ")
}

/// Client that pipes each request to an external command and reads stdout.
#[derive(Debug, Clone)]
pub struct CommandClient {
    model: String,
    program: String,
    args: Vec<String>,
    format: RequestFormat,
    timeout: Duration,
    output_limit_bytes: usize,
}

impl CommandClient {
    pub fn new(model: &str, config: &ModelConfig, timeout: Duration, output_limit_bytes: usize) -> Self {
        let mut argv = config.command.iter().cloned();
        Self {
            model: model.to_string(),
            program: argv.next().unwrap_or_default(),
            args: argv.collect(),
            format: config.format,
            timeout,
            output_limit_bytes,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn try_run(&self, request: &GenerationRequest) -> Result<String> {
        let input = encode_request(request, self.format)?;
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        let output = run_with_input(cmd, input, self.timeout, self.output_limit_bytes)
            .with_context(|| format!("run {}", self.program))?;

        if output.timed_out {
            anyhow::bail!("{} timed out after {:?}", self.program, self.timeout);
        }
        if !output.status.success() {
            let detail = output
                .stderr_tail()
                .map(|line| format!(": {line}"))
                .unwrap_or_default();
            anyhow::bail!(
                "{} exited with status {:?}{detail}",
                self.program,
                output.status.code()
            );
        }
        if output.stdout_dropped > 0 {
            anyhow::bail!(
                "response exceeded output_limit_bytes ({}){}",
                self.output_limit_bytes,
                output.stdout_truncated_notice().trim_end()
            );
        }
        Ok(output.stdout_text())
    }
}

impl GenerativeClient for CommandClient {
    #[instrument(skip_all, fields(model = %self.model, messages = request.messages.len(), max_tokens = request.max_tokens))]
    fn run(&self, request: &GenerationRequest) -> String {
        match self.try_run(request) {
            Ok(text) => {
                info!(bytes = text.len(), "generation finished");
                text
            }
            Err(err) => {
                warn!(err = %format!("{err:#}"), "generation failed");
                format!("{}{err:#}", error_prefix(&self.model))
            }
        }
    }
}

/// Serialize a request for a command's stdin.
pub fn encode_request(request: &GenerationRequest, format: RequestFormat) -> Result<Vec<u8>> {
    match format {
        RequestFormat::Json => {
            let mut buf = serde_json::to_vec(request).context("serialize generation request")?;
            buf.push(b'\n');
            Ok(buf)
        }
        RequestFormat::Text => Ok(render_text(request).into_bytes()),
    }
}

fn render_text(request: &GenerationRequest) -> String {
    request
        .messages
        .iter()
        .map(|message| format!("{}:\n{}", message.role.label(), message.content.trim_end()))
        .collect::<Vec<_>>()
        .join("\n\n")
}
