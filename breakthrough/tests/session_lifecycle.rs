//! End-to-end controller runs with scripted service and operator.
//!
//! Each test drives a real project directory in a tempdir and checks what the
//! walkthrough leaves on disk.

use std::fs;
use std::path::Path;

use breakthrough::app::run_with;
use breakthrough::core::decision::{ApplyDecision, ProceedDecision, StageOutcome};
use breakthrough::core::stages::{self, STAGE_COUNT};
use breakthrough::core::threader::{ContextThreader, NO_OUTPUT};
use breakthrough::core::types::CallSettings;
use breakthrough::io::config::BreakthroughConfig;
use breakthrough::io::store::ProjectFileStore;
use breakthrough::session::{Controller, RunOutcome, Session};
use breakthrough::test_support::{ScriptedClient, ScriptedOperator};

fn run(
    root: &Path,
    client: &ScriptedClient,
    operator: &mut ScriptedOperator,
) -> (RunOutcome, Session) {
    let threader = ContextThreader::new().expect("threader");
    let mut session = Session::new("desalination with waste heat", ProjectFileStore::load(root));
    let outcome = Controller::new(&threader, client, operator, CallSettings::default())
        .run(&mut session)
        .expect("run");
    (outcome, session)
}

fn doc(root: &Path, stage_index: usize) -> std::path::PathBuf {
    root.join(stages::fallback_path(stage_index).expect("stage"))
}

#[test]
fn discarded_output_is_threaded_but_never_written() {
    let temp = tempfile::tempdir().expect("tempdir");
    let client = ScriptedClient::new(["stage one idea", "stage two idea"]);
    let mut operator = ScriptedOperator::new()
        .proceeds([ProceedDecision::Proceed, ProceedDecision::Proceed])
        .reviews([ApplyDecision::Discard, ApplyDecision::Apply]);

    let (outcome, session) = run(temp.path(), &client, &mut operator);

    assert_eq!(outcome, RunOutcome::Aborted { stage: 3 });
    assert!(!doc(temp.path(), 1).exists());
    assert!(doc(temp.path(), 2).is_file());
    assert_eq!(session.outputs.get(1), Some("stage one idea"));
    let second_prompt = client.prompt(1).expect("second prompt");
    assert!(second_prompt.contains("stage one idea"));
}

#[test]
fn discarding_a_marked_response_touches_no_files() {
    let temp = tempfile::tempdir().expect("tempdir");
    let response = "=== File: x.md ===\ncontent\n=== File: doc/y.md ===\nmore";
    let client = ScriptedClient::new([response]);
    let mut operator = ScriptedOperator::new()
        .proceeds([ProceedDecision::Proceed, ProceedDecision::Quit])
        .reviews([ApplyDecision::Discard]);

    let (outcome, session) = run(temp.path(), &client, &mut operator);

    assert_eq!(outcome, RunOutcome::Aborted { stage: 2 });
    assert_eq!(session.outputs.get(1), Some(response));
    assert!(session.store.is_empty());
    assert_eq!(fs::read_dir(temp.path()).expect("read dir").count(), 0);
}

#[test]
fn quit_at_first_stage_writes_nothing() {
    let temp = tempfile::tempdir().expect("tempdir");
    let client = ScriptedClient::new(["never used"]);
    let mut operator = ScriptedOperator::new();

    let (outcome, session) = run(temp.path(), &client, &mut operator);

    assert_eq!(outcome, RunOutcome::Aborted { stage: 1 });
    assert!(client.requests().is_empty());
    assert!(session.outputs.is_empty());
    assert_eq!(fs::read_dir(temp.path()).expect("read dir").count(), 0);
}

#[test]
fn applying_stage_five_writes_blueprint_with_header() {
    let temp = tempfile::tempdir().expect("tempdir");
    let client = ScriptedClient::new(["A merged design without markers."]);
    let mut operator = ScriptedOperator::new()
        .proceeds([
            ProceedDecision::Skip,
            ProceedDecision::Skip,
            ProceedDecision::Skip,
            ProceedDecision::Skip,
            ProceedDecision::Proceed,
        ])
        .reviews([ApplyDecision::Apply]);

    let (outcome, _) = run(temp.path(), &client, &mut operator);

    assert_eq!(outcome, RunOutcome::Aborted { stage: 6 });
    let blueprint = fs::read_to_string(doc(temp.path(), 5)).expect("blueprint");
    assert_eq!(
        blueprint,
        "# 5) Merged Breakthrough Blueprint\n\nA merged design without markers."
    );
    let prompt = client.prompt(0).expect("stage 5 prompt");
    assert!(prompt.contains(NO_OUTPUT));
    assert!(prompt.contains("desalination with waste heat"));
}

#[test]
fn full_run_without_markers_keeps_existing_files() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("README.md"), "keep me").expect("seed");
    let responses: Vec<String> = (1..=STAGE_COUNT).map(|i| format!("plain output {i}")).collect();
    let client = ScriptedClient::new(responses);
    let mut operator = ScriptedOperator::approving();

    let (outcome, session) = run(temp.path(), &client, &mut operator);

    let expected: Vec<(usize, StageOutcome)> =
        (1..=STAGE_COUNT).map(|i| (i, StageOutcome::Committed)).collect();
    assert_eq!(outcome, RunOutcome::Completed(expected));
    assert_eq!(
        fs::read_to_string(temp.path().join("README.md")).expect("readme"),
        "keep me"
    );
    for stage in stages::all() {
        assert!(doc(temp.path(), stage.index).is_file(), "missing {}", stage.fallback_path);
    }
    assert_eq!(session.store.len(), STAGE_COUNT + 1);

    let last_prompt = client.prompt(STAGE_COUNT - 1).expect("stage 8 prompt");
    for i in 1..STAGE_COUNT {
        assert!(last_prompt.contains(&format!("plain output {i}")));
    }
}

#[test]
fn later_marker_section_wins_and_escaping_paths_are_dropped() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path().join("project");
    fs::create_dir_all(root.join("src")).expect("mkdir");
    fs::write(root.join("src/a.txt"), "original").expect("seed");
    let client = ScriptedClient::new([
        "intro\n=== File: src/a.txt ===\nold\n=== File: src/a.txt ===\nnew\n=== File: ../outside.md ===\nescape\n",
    ]);
    let mut operator = ScriptedOperator::new()
        .proceeds([ProceedDecision::Proceed])
        .reviews([ApplyDecision::Apply]);

    let (outcome, _) = run(&root, &client, &mut operator);

    assert_eq!(outcome, RunOutcome::Aborted { stage: 2 });
    assert_eq!(fs::read_to_string(root.join("src/a.txt")).expect("a.txt"), "new");
    assert!(!temp.path().join("outside.md").exists());
    let fallback = fs::read_to_string(doc(&root, 1)).expect("fallback");
    assert!(fallback.starts_with("# 1) Context & Constraints Clarification\n\nintro"));
}

#[test]
fn service_error_text_can_be_retried() {
    let temp = tempfile::tempdir().expect("tempdir");
    let client = ScriptedClient::new(["ERROR from scripted: overloaded", "recovered"]);
    let mut operator = ScriptedOperator::new()
        .proceeds([ProceedDecision::Proceed])
        .reviews([ApplyDecision::Retry, ApplyDecision::Apply]);

    let (_, session) = run(temp.path(), &client, &mut operator);

    assert_eq!(session.outputs.get(1), Some("recovered"));
    let written = fs::read_to_string(doc(temp.path(), 1)).expect("doc");
    assert!(written.ends_with("recovered"));
    assert!(operator.transcript().iter().any(|line| line == "Repeating this step..."));
}

#[test]
fn run_with_takes_vision_from_confirmed_file() {
    let temp = tempfile::tempdir().expect("tempdir");
    let vision_file = temp.path().join("user_prompt.txt");
    fs::write(&vision_file, "grid-scale storage from sand").expect("vision");
    let config = BreakthroughConfig {
        project_dir: temp.path().join("some_project"),
        vision_file,
        ..BreakthroughConfig::default()
    };
    let client = ScriptedClient::new(Vec::<String>::new());
    let mut operator = ScriptedOperator::new()
        .confirm_file(true)
        .proceeds([ProceedDecision::Proceed])
        .reviews([ApplyDecision::Discard]);

    let outcome = run_with(&config, CallSettings::default(), &client, &mut operator, &[])
        .expect("run");

    assert_eq!(outcome, RunOutcome::Aborted { stage: 2 });
    let prompt = client.prompt(0).expect("stage 1 prompt");
    assert!(prompt.contains("grid-scale storage from sand"));
    assert!(config.project_dir.join("doc").is_dir());
}
