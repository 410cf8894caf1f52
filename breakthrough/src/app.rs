//! Orchestration for one `breakthrough` invocation.
//!
//! Loads config, resolves the model, collects the vision, checks the project
//! root, and hands a fresh [`Session`] to the controller.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::core::threader::ContextThreader;
use crate::core::types::CallSettings;
use crate::io::client::{CommandClient, GenerativeClient};
use crate::io::config::{BreakthroughConfig, load_config};
use crate::io::operator::{ConsoleOperator, Operator};
use crate::io::store::{ProjectFileStore, preflight};
use crate::io::vision::{clarify, resolve_vision};
use crate::session::{Controller, RunOutcome, Session};

/// Command-line inputs after parsing.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub model: String,
    /// Free-text vision words; empty means "ask".
    pub vision: Vec<String>,
    pub auto_yes: bool,
    pub config_path: PathBuf,
    /// Overrides `project_dir` from the config file.
    pub project_dir: Option<PathBuf>,
}

/// Run the walkthrough against the console.
pub fn run(options: &RunOptions) -> Result<RunOutcome> {
    let mut config = load_config(&options.config_path)?;
    if let Some(dir) = &options.project_dir {
        config.project_dir = dir.clone();
    }
    let (name, model) = config.model(&options.model)?;
    info!(model = name, project_dir = %config.project_dir.display(), "starting walkthrough");

    let client = CommandClient::new(
        name,
        model,
        config.request_timeout(),
        config.output_limit_bytes,
    );
    let settings = config.call_settings(model);

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    writeln!(stdout, "Using model: {}", client.model()).context("write to stdout")?;
    if options.auto_yes {
        writeln!(stdout, "Auto-yes mode enabled: all prompts will be answered 'yes'.")
            .context("write to stdout")?;
    }
    let mut operator = ConsoleOperator::new(stdin.lock(), stdout, options.auto_yes);

    run_with(&config, settings, &client, &mut operator, &options.vision)
}

/// Run the walkthrough with explicit collaborators.
pub fn run_with(
    config: &BreakthroughConfig,
    settings: CallSettings,
    client: &dyn GenerativeClient,
    operator: &mut dyn Operator,
    vision_words: &[String],
) -> Result<RunOutcome> {
    let threader = ContextThreader::new()?;

    let vision = resolve_vision(vision_words, &config.vision_file, operator)?;
    let vision = clarify(vision, client, operator, &settings)?;
    debug!(chars = vision.chars().count(), "vision ready");

    preflight(&config.project_dir);
    let store = ProjectFileStore::load(&config.project_dir);
    let mut session = Session::new(vision, store);

    Controller::new(&threader, client, operator, settings).run(&mut session)
}
