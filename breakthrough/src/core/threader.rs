//! Prompt builder that threads the vision and prior stage outputs into a stage template.
//!
//! Values are bound as template data, never spliced into template source, so a
//! vision or response that happens to contain `{{ step1 }}` is rendered verbatim.

use std::collections::BTreeMap;

use anyhow::{Result, anyhow};
use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use tracing::debug;

use crate::core::outputs::StageOutputs;
use crate::core::stages::{self, STAGE_COUNT, output_key};

/// Substituted for a prior stage that was skipped or has not run.
pub const NO_OUTPUT: &str = "(No output)";

const VISION_KEY: &str = "vision";

static TEMPLATE_NAMES: [&str; STAGE_COUNT] = [
    "stage1", "stage2", "stage3", "stage4", "stage5", "stage6", "stage7", "stage8",
];

/// Template engine holding every stage template.
pub struct ContextThreader {
    env: Environment<'static>,
}

impl ContextThreader {
    pub fn new() -> Result<Self> {
        let mut env = environment();
        for (name, stage) in TEMPLATE_NAMES.iter().zip(stages::all()) {
            env.add_template(name, stage.prompt_template)
                .map_err(|err| anyhow!("invalid template for stage {}: {err}", stage.index))?;
        }
        Ok(Self { env })
    }

    /// Render the user prompt for `stage_index`.
    ///
    /// Only the vision and outputs of stages before `stage_index` are bound.
    pub fn build_prompt(
        &self,
        stage_index: usize,
        vision: &str,
        outputs: &StageOutputs,
    ) -> Result<String> {
        let name = stage_index
            .checked_sub(1)
            .and_then(|i| TEMPLATE_NAMES.get(i))
            .ok_or_else(|| anyhow!("unknown stage index {stage_index}"))?;
        let template = self.env.get_template(name)?;
        let rendered = template.render(threaded_context(stage_index, vision, outputs))?;
        debug!(stage = stage_index, bytes = rendered.len(), "built stage prompt");
        Ok(rendered)
    }
}

fn environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env.set_keep_trailing_newline(true);
    env
}

fn threaded_context<'a>(
    stage_index: usize,
    vision: &'a str,
    outputs: &'a StageOutputs,
) -> BTreeMap<String, &'a str> {
    let mut ctx = BTreeMap::new();
    ctx.insert(VISION_KEY.to_string(), vision);
    for prior in 1..stage_index {
        ctx.insert(output_key(prior), outputs.get(prior).unwrap_or(NO_OUTPUT));
    }
    ctx
}
