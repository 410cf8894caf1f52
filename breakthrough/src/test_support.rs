//! Scripted test doubles for the generative client and the operator.

use std::cell::RefCell;
use std::collections::VecDeque;

use anyhow::Result;

use crate::core::decision::{ApplyDecision, ProceedDecision};
use crate::core::stages::StageDefinition;
use crate::core::types::GenerationRequest;
use crate::io::client::{GenerativeClient, error_prefix};
use crate::io::operator::Operator;

/// Client that replays canned responses in order and records every request.
///
/// Once the script runs out it answers with error text, like a failing backend.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    responses: RefCell<VecDeque<String>>,
    requests: RefCell<Vec<GenerationRequest>>,
}

impl ScriptedClient {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: RefCell::new(responses.into_iter().map(Into::into).collect()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.borrow().clone()
    }

    /// User prompt of the n-th recorded request.
    pub fn prompt(&self, n: usize) -> Option<String> {
        self.requests
            .borrow()
            .get(n)
            .and_then(|request| request.messages.last())
            .map(|message| message.content.clone())
    }
}

impl GenerativeClient for ScriptedClient {
    fn run(&self, request: &GenerationRequest) -> String {
        self.requests.borrow_mut().push(request.clone());
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| format!("{}script exhausted", error_prefix("scripted")))
    }
}

/// Operator answering from queues.
///
/// With empty queues it quits at a proceed prompt and discards at an apply
/// prompt, the same as a closed console; [`ScriptedOperator::approving`]
/// proceeds and applies instead.
#[derive(Debug, Default)]
pub struct ScriptedOperator {
    proceeds: VecDeque<ProceedDecision>,
    reviews: VecDeque<ApplyDecision>,
    approve_when_empty: bool,
    confirm_file: bool,
    typed_vision: String,
    clarify: bool,
    answers: VecDeque<String>,
    transcript: Vec<String>,
}

impl ScriptedOperator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn approving() -> Self {
        Self {
            approve_when_empty: true,
            ..Self::default()
        }
    }

    pub fn proceeds(mut self, decisions: impl IntoIterator<Item = ProceedDecision>) -> Self {
        self.proceeds.extend(decisions);
        self
    }

    pub fn reviews(mut self, decisions: impl IntoIterator<Item = ApplyDecision>) -> Self {
        self.reviews.extend(decisions);
        self
    }

    pub fn confirm_file(mut self, confirm: bool) -> Self {
        self.confirm_file = confirm;
        self
    }

    pub fn typed_vision(mut self, vision: &str) -> Self {
        self.typed_vision = vision.to_string();
        self
    }

    pub fn clarify(mut self, clarify: bool) -> Self {
        self.clarify = clarify;
        self
    }

    pub fn answers<I, S>(mut self, answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.answers.extend(answers.into_iter().map(Into::into));
        self
    }

    /// Everything the operator was shown, one entry per interaction.
    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }
}

impl Operator for ScriptedOperator {
    fn proceed(&mut self, stage: &StageDefinition) -> Result<ProceedDecision> {
        self.transcript.push(format!("proceed? {}", stage.index));
        let fallback = if self.approve_when_empty {
            ProceedDecision::Proceed
        } else {
            ProceedDecision::Quit
        };
        Ok(self.proceeds.pop_front().unwrap_or(fallback))
    }

    fn review(&mut self, stage: &StageDefinition, _response: &str) -> Result<ApplyDecision> {
        self.transcript.push(format!("apply? {}", stage.index));
        let fallback = if self.approve_when_empty {
            ApplyDecision::Apply
        } else {
            ApplyDecision::Discard
        };
        Ok(self.reviews.pop_front().unwrap_or(fallback))
    }

    fn notify(&mut self, message: &str) -> Result<()> {
        self.transcript.push(message.to_string());
        Ok(())
    }

    fn confirm_vision_file(&mut self, preview: &str) -> Result<bool> {
        self.transcript.push(format!("vision file: {preview}"));
        Ok(self.confirm_file)
    }

    fn ask_vision(&mut self) -> Result<String> {
        self.transcript.push("vision?".to_string());
        Ok(self.typed_vision.clone())
    }

    fn wants_clarification(&mut self) -> Result<bool> {
        Ok(self.clarify)
    }

    fn answer_question(&mut self, question: &str) -> Result<Option<String>> {
        self.transcript.push(format!("asks: {question}"));
        Ok(self
            .answers
            .pop_front()
            .filter(|answer| !answer.eq_ignore_ascii_case("done")))
    }
}
