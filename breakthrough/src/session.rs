//! Interactive controller for the staged walkthrough.
//!
//! One [`Session`] is driven through every catalog stage in index order. Each
//! stage is an explicit [`StageState`] machine: the operator decides whether to
//! call the service, then whether to apply, retry, or discard the response.

use anyhow::Result;
use tracing::{info, instrument, warn};

use crate::core::decision::{ApplyDecision, ProceedDecision, StageOutcome, StageState};
use crate::core::outputs::StageOutputs;
use crate::core::parser::parse_response;
use crate::core::stages::{self, StageDefinition};
use crate::core::threader::ContextThreader;
use crate::core::types::{CallSettings, GenerationRequest};
use crate::io::client::GenerativeClient;
use crate::io::operator::Operator;
use crate::io::store::ProjectFileStore;

/// Everything one run accumulates.
#[derive(Debug, Clone)]
pub struct Session {
    pub vision: String,
    pub outputs: StageOutputs,
    pub store: ProjectFileStore,
}

impl Session {
    pub fn new(vision: impl Into<String>, store: ProjectFileStore) -> Self {
        Self {
            vision: vision.into(),
            outputs: StageOutputs::new(),
            store,
        }
    }
}

/// How a whole run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every stage reached a terminal state; one entry per stage, in order.
    Completed(Vec<(usize, StageOutcome)>),
    /// The operator quit at `stage`.
    Aborted { stage: usize },
}

/// Collaborators shared by every stage of a run.
pub struct Controller<'a> {
    threader: &'a ContextThreader,
    client: &'a dyn GenerativeClient,
    operator: &'a mut dyn Operator,
    settings: CallSettings,
}

impl<'a> Controller<'a> {
    pub fn new(
        threader: &'a ContextThreader,
        client: &'a dyn GenerativeClient,
        operator: &'a mut dyn Operator,
        settings: CallSettings,
    ) -> Self {
        Self {
            threader,
            client,
            operator,
            settings,
        }
    }

    /// Drive every stage in order, stopping early only when the operator quits.
    #[instrument(skip_all, fields(root = %session.store.root().display()))]
    pub fn run(&mut self, session: &mut Session) -> Result<RunOutcome> {
        let mut outcomes = Vec::with_capacity(stages::STAGE_COUNT);
        for stage in stages::all() {
            let outcome = self.run_stage(session, stage)?;
            info!(stage = stage.index, outcome = ?outcome, "stage finished");
            if outcome == StageOutcome::Aborted {
                return Ok(RunOutcome::Aborted { stage: stage.index });
            }
            outcomes.push((stage.index, outcome));
        }

        self.operator
            .notify("\n=== Breakthrough Idea Process Completed ===")?;
        self.operator.notify(&format!(
            "You can check '{}' for your breakthrough blueprint files.",
            session.store.root().join("doc").display()
        ))?;
        Ok(RunOutcome::Completed(outcomes))
    }

    /// Run one stage to a terminal state.
    ///
    /// The prompt is built once, so a retry resends exactly the same request.
    pub fn run_stage(
        &mut self,
        session: &mut Session,
        stage: &StageDefinition,
    ) -> Result<StageOutcome> {
        let prompt = self
            .threader
            .build_prompt(stage.index, &session.vision, &session.outputs)?;
        let request = GenerationRequest::for_stage(stage.system_instruction, &prompt, &self.settings);

        let mut state = StageState::AwaitingProceedDecision;
        let mut outcome = StageOutcome::Skipped;
        while !state.is_terminal() {
            state = match state {
                StageState::AwaitingProceedDecision => match self.operator.proceed(stage)? {
                    ProceedDecision::Proceed => StageState::Calling,
                    ProceedDecision::Skip => {
                        self.operator.notify(&format!("Skipping {}.", stage.name))?;
                        StageState::SkippedOrDiscarded
                    }
                    ProceedDecision::Quit => {
                        self.operator.notify("Exiting.")?;
                        outcome = StageOutcome::Aborted;
                        StageState::Aborted
                    }
                },
                StageState::Calling => {
                    StageState::AwaitingApplyDecision(self.client.run(&request))
                }
                StageState::AwaitingApplyDecision(response) => {
                    match self.operator.review(stage, &response)? {
                        ApplyDecision::Apply => {
                            self.commit(session, stage, response)?;
                            outcome = StageOutcome::Committed;
                            StageState::Committed
                        }
                        ApplyDecision::Retry => {
                            self.operator.notify("Repeating this step...")?;
                            StageState::Calling
                        }
                        ApplyDecision::Discard => {
                            self.operator.notify("Skipping file changes.")?;
                            session.outputs.record(stage.index, response);
                            outcome = StageOutcome::Discarded;
                            StageState::SkippedOrDiscarded
                        }
                    }
                }
                terminal => terminal,
            };
        }
        Ok(outcome)
    }

    /// Apply a response: parsed sections, then the fallback document, then a flush.
    fn commit(
        &mut self,
        session: &mut Session,
        stage: &StageDefinition,
        response: String,
    ) -> Result<()> {
        let parsed = parse_response(&response);
        let applied = session.store.apply_parsed(parsed);
        session
            .store
            .upsert(stage.fallback_path, stage.fallback_content(&response));

        let report = session.store.save_all();
        if !report.failed.is_empty() {
            warn!(stage = stage.index, failed = ?report.failed, "stage applied with save failures");
            self.operator.notify(&format!(
                "Some files could not be saved: {}",
                report.failed.join(", ")
            ))?;
        }
        self.operator.notify(&format!(
            "Applied {applied} file section(s) and wrote {}. Changes saved to {}.",
            stage.fallback_path,
            session.store.root().display()
        ))?;

        session.outputs.record(stage.index, response);
        Ok(())
    }
}
