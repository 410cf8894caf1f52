//! Staged generative walkthrough for breakthrough ideas.
//!
//! Runs eight fixed stages against a configured model, asking the operator
//! before each call and before each write into the project document tree.

use std::path::PathBuf;

use clap::Parser;

use breakthrough::app::{self, RunOptions};
use breakthrough::exit_codes;
use breakthrough::io::config::DEFAULT_CONFIG_FILE;
use breakthrough::logging;
use breakthrough::session::RunOutcome;

#[derive(Parser)]
#[command(
    name = "breakthrough",
    version,
    about = "Staged generative walkthrough for breakthrough ideas"
)]
struct Cli {
    /// Answer every decision with yes and skip follow-up questions.
    #[arg(short = 'y', long)]
    auto_yes: bool,

    /// TOML config file; defaults apply when it does not exist.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Project directory to load and write (overrides the config).
    #[arg(long)]
    project_dir: Option<PathBuf>,

    /// Model name from the config, e.g. `claude37sonnet` or `deepseekr1`.
    model: String,

    /// Domain or challenge description. Prompted for when omitted.
    vision: Vec<String>,
}

fn main() {
    logging::init();
    let cli = Cli::parse();
    let options = RunOptions {
        model: cli.model,
        vision: cli.vision,
        auto_yes: cli.auto_yes,
        config_path: cli.config,
        project_dir: cli.project_dir,
    };

    let code = match app::run(&options) {
        Ok(RunOutcome::Completed(_)) => exit_codes::OK,
        Ok(RunOutcome::Aborted { .. }) => exit_codes::ABORTED,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_codes::INVALID
        }
    };
    std::process::exit(code);
}
