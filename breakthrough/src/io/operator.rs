//! Operator interaction: stage decisions and free-text answers.
//!
//! [`ConsoleOperator`] talks to a terminal (or any reader/writer pair). In
//! auto-yes mode it answers every decision itself and only reads free text.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use tracing::debug;

use crate::core::decision::{ApplyDecision, ProceedDecision};
use crate::core::stages::StageDefinition;

/// Everything the controller and vision intake need from a human.
pub trait Operator {
    /// Proceed, skip, or quit before calling the service for `stage`.
    fn proceed(&mut self, stage: &StageDefinition) -> Result<ProceedDecision>;

    /// Apply, retry, or discard a response for `stage`.
    fn review(&mut self, stage: &StageDefinition, response: &str) -> Result<ApplyDecision>;

    /// Show a progress line.
    fn notify(&mut self, message: &str) -> Result<()>;

    /// Offer a prepared vision file; `preview` is already shortened.
    fn confirm_vision_file(&mut self, preview: &str) -> Result<bool>;

    /// Ask for the domain/challenge description.
    fn ask_vision(&mut self) -> Result<String>;

    fn wants_clarification(&mut self) -> Result<bool>;

    /// Show a clarifying question; `None` ends the Q&A.
    fn answer_question(&mut self, question: &str) -> Result<Option<String>>;
}

pub struct ConsoleOperator<R, W> {
    input: R,
    out: W,
    auto_yes: bool,
}

impl<R: BufRead, W: Write> ConsoleOperator<R, W> {
    pub fn new(input: R, out: W, auto_yes: bool) -> Self {
        Self {
            input,
            out,
            auto_yes,
        }
    }

    pub fn into_inner(self) -> (R, W) {
        (self.input, self.out)
    }

    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.out, "{prompt}")?;
        self.out.flush().context("flush prompt")?;
        let mut line = String::new();
        let n = self
            .input
            .read_line(&mut line)
            .context("read operator input")?;
        if n == 0 {
            debug!("operator input closed");
            writeln!(self.out)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

impl<R: BufRead, W: Write> Operator for ConsoleOperator<R, W> {
    fn proceed(&mut self, stage: &StageDefinition) -> Result<ProceedDecision> {
        writeln!(self.out, "\n=== {} ===", stage.name)?;
        if self.auto_yes {
            writeln!(self.out, "Auto-yes enabled: Proceeding with this step.")?;
            return Ok(ProceedDecision::Proceed);
        }
        loop {
            let Some(reply) = self.ask("Proceed with this step? (y = proceed, s = skip, q = quit): ")?
            else {
                writeln!(self.out, "No input received. Quitting.")?;
                return Ok(ProceedDecision::Quit);
            };
            match ProceedDecision::parse(&reply) {
                Some(decision) => return Ok(decision),
                None => writeln!(self.out, "Invalid choice. Please enter 'y', 's', or 'q'.")?,
            }
        }
    }

    fn review(&mut self, _stage: &StageDefinition, response: &str) -> Result<ApplyDecision> {
        writeln!(self.out, "\nAI Response:\n{response}")?;
        if self.auto_yes {
            writeln!(self.out, "Auto-yes enabled: Applying changes.")?;
            return Ok(ApplyDecision::Apply);
        }
        loop {
            let Some(reply) = self.ask(
                "Apply changes (create/update project files)? (y = apply, r = retry step, n = discard): ",
            )?
            else {
                writeln!(self.out, "No input received. Discarding file changes.")?;
                return Ok(ApplyDecision::Discard);
            };
            match ApplyDecision::parse(&reply) {
                Some(decision) => return Ok(decision),
                None => writeln!(self.out, "Invalid choice. Please enter 'y', 'r', or 'n'.")?,
            }
        }
    }

    fn notify(&mut self, message: &str) -> Result<()> {
        writeln!(self.out, "{message}")?;
        Ok(())
    }

    fn confirm_vision_file(&mut self, preview: &str) -> Result<bool> {
        writeln!(self.out, "\n=== FOUND VISION FILE ===")?;
        writeln!(self.out, "Preview:\n---\n{preview}\n---")?;
        if self.auto_yes {
            writeln!(self.out, "Auto-yes enabled: Using the vision file as domain/challenge.")?;
            return Ok(true);
        }
        let reply = self.ask("Use this content as your domain/challenge? (y/n): ")?;
        Ok(reply.is_some_and(|r| r.eq_ignore_ascii_case("y")))
    }

    fn ask_vision(&mut self) -> Result<String> {
        writeln!(self.out, "=== INITIAL DOMAIN OR CHALLENGE ===")?;
        let reply = self.ask(
            "Describe the domain or challenge you want breakthrough ideas for (a line or paragraph): ",
        )?;
        Ok(reply.unwrap_or_default())
    }

    fn wants_clarification(&mut self) -> Result<bool> {
        if self.auto_yes {
            writeln!(self.out, "Auto-yes enabled: Skipping follow-up questions.")?;
            return Ok(false);
        }
        let reply =
            self.ask("Should the AI ask follow-up questions about your domain/challenge? (y/n): ")?;
        Ok(reply.is_some_and(|r| r.eq_ignore_ascii_case("y")))
    }

    fn answer_question(&mut self, question: &str) -> Result<Option<String>> {
        writeln!(self.out, "\nAI asks:\n{question}")?;
        let reply = self.ask("Your answer (type 'done' to finish Q&A): ")?;
        Ok(reply.filter(|answer| !answer.eq_ignore_ascii_case("done")))
    }
}
