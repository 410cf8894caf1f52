//! Vision intake: where the domain/challenge text comes from, plus the
//! optional clarification Q&A that extends it.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::{debug, info, instrument, warn};

use crate::core::types::{CallSettings, GenerationRequest, Message, Role};
use crate::io::client::GenerativeClient;
use crate::io::operator::Operator;

/// Characters of the vision file shown before asking to use it.
pub const PREVIEW_CHARS: usize = 200;

const CLARIFY_SYSTEM: &str = "You are a helpful AI that clarifies the user's domain or challenge. \
    Ask short follow-up questions to fully understand the user's needs.";

/// Resolve the vision: command-line words, then the vision file, then a prompt.
///
/// An unreadable vision file is reported and skipped. Fails when every source
/// comes back empty.
#[instrument(skip_all, fields(vision_file = %vision_file.display()))]
pub fn resolve_vision(
    cli_words: &[String],
    vision_file: &Path,
    operator: &mut dyn Operator,
) -> Result<String> {
    let joined = cli_words.join(" ");
    if !joined.trim().is_empty() {
        debug!("vision taken from command line");
        return Ok(joined.trim().to_string());
    }

    match read_vision_file(vision_file) {
        Ok(Some(content)) => {
            if operator.confirm_vision_file(&preview(&content))? {
                info!(chars = content.chars().count(), "using vision file");
                return Ok(content);
            }
        }
        Ok(None) => {}
        Err(err) => {
            warn!(err = %format!("{err:#}"), "unreadable vision file, asking instead");
            operator.notify(&format!("Error reading {}: {err:#}", vision_file.display()))?;
        }
    }

    let typed = operator.ask_vision()?;
    if typed.trim().is_empty() {
        bail!("no domain or challenge was provided");
    }
    Ok(typed.trim().to_string())
}

fn read_vision_file(path: &Path) -> Result<Option<String>> {
    if !path.is_file() {
        return Ok(None);
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("read vision file {}", path.display()))?;
    let content = content.trim();
    Ok((!content.is_empty()).then(|| content.to_string()))
}

/// First [`PREVIEW_CHARS`] characters, with an ellipsis when cut.
pub fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// Run the optional follow-up Q&A and return the (possibly extended) vision.
///
/// Each round the service asks one question; the operator's answer is
/// threaded back until they type `done`. All user turns, starting with the
/// original vision, are appended under `Additional Clarifications:`.
#[instrument(skip_all)]
pub fn clarify(
    vision: String,
    client: &dyn GenerativeClient,
    operator: &mut dyn Operator,
    settings: &CallSettings,
) -> Result<String> {
    if !operator.wants_clarification()? {
        return Ok(vision);
    }

    let mut conversation = vec![Message::system(CLARIFY_SYSTEM), Message::user(vision.clone())];
    loop {
        let request =
            GenerationRequest::from_messages(conversation.clone(), settings.clarify_max_tokens, settings);
        let question = client.run(&request);
        let Some(answer) = operator.answer_question(&question)? else {
            break;
        };
        conversation.push(Message::assistant(question));
        conversation.push(Message::user(answer));
    }

    let rounds = conversation.len().saturating_sub(2) / 2;
    info!(rounds, "clarification finished");
    Ok(with_clarifications(&vision, &conversation))
}

fn with_clarifications(vision: &str, conversation: &[Message]) -> String {
    let lines: Vec<String> = conversation
        .iter()
        .filter(|m| m.role == Role::User)
        .map(|m| format!("user: {}", m.content))
        .collect();
    format!("{vision}\n\nAdditional Clarifications:\n{}", lines.join("\n"))
}
