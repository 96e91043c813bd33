// CLI commands: each one mounts a workspace session around a source file
use anyhow::{bail, Context, Result};
use arena_common::types::Language;
use arena_workspace::backend::HttpBackend;
use arena_workspace::config::WorkspaceConfig;
use arena_workspace::diagnostics::DiagnosticLocator;
use arena_workspace::host::{ConfirmGate, EditorHost, FixedAnswer, MemoryEditor};
use arena_workspace::paste_guard::PasteDecision;
use arena_workspace::{ActionOutcome, WorkspaceSession};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::terminal::{self, ConsoleNotifier, StdinGate};

/// Mount a session whose editor holds the contents of `file`.
fn open_session(
    config: Option<&Path>,
    file: &Path,
    gate: Arc<dyn ConfirmGate>,
) -> Result<(WorkspaceSession, Arc<MemoryEditor>)> {
    let config = WorkspaceConfig::load_or_env(config)?;
    let source = terminal::read_text(file)?;
    let editor = Arc::new(MemoryEditor::new(source));

    info!(file = %file.display(), backend_url = %config.backend_url, "Opening workspace");

    let session = WorkspaceSession::mount(
        &config,
        Arc::new(HttpBackend::from_config(&config)),
        editor.clone(),
        gate,
        Arc::new(ConsoleNotifier),
    );
    Ok((session, editor))
}

fn gate_for(yes: bool) -> Arc<dyn ConfirmGate> {
    if yes {
        Arc::new(FixedAnswer(true))
    } else {
        Arc::new(StdinGate)
    }
}

/// Run a solution against the samples or custom input
pub async fn run(
    config: Option<&Path>,
    problem: &str,
    language: Language,
    file: &Path,
    custom_input: Option<&str>,
    sample_cases: u32,
    json: bool,
) -> Result<()> {
    let (session, editor) = open_session(config, file, gate_for(false))?;
    session.set_case_counts(sample_cases, 0);

    if !json {
        println!("🚀 Running {} ({})...", file.display(), language);
    }
    let outcome = session.run(problem, language, custom_input).await;
    report(&session, &editor, outcome, json)
}

/// Submit a solution for grading
pub async fn submit(
    config: Option<&Path>,
    problem: &str,
    language: Language,
    file: &Path,
    yes: bool,
    total_cases: u32,
    json: bool,
) -> Result<()> {
    let (session, editor) = open_session(config, file, gate_for(yes))?;
    session.set_case_counts(0, total_cases);

    if !json {
        println!("📤 Submitting {} ({})...", file.display(), language);
    }
    let outcome = session.submit(problem, language).await;
    report(&session, &editor, outcome, json)
}

fn report(session: &WorkspaceSession, editor: &MemoryEditor, outcome: ActionOutcome, json: bool) -> Result<()> {
    if json {
        let snapshot = serde_json::to_string_pretty(&session.snapshot()).context("Failed to serialize snapshot")?;
        println!("{}", snapshot);
    }

    match outcome {
        ActionOutcome::Completed(result) | ActionOutcome::Partial(result) => {
            if !json {
                println!("\n{}", terminal::render_result(&result));
                let markers = editor.markers();
                if !markers.is_empty() {
                    println!("📍 Diagnostics:\n{}", terminal::render_markers(&markers, &editor.document()));
                }
            }
            Ok(())
        }
        ActionOutcome::Declined => {
            println!("❌ Aborted");
            Ok(())
        }
        ActionOutcome::Rejected(rejection) => bail!("{}", rejection),
        ActionOutcome::Failed(failure) => bail!("{} failed: {}", failure.mode, failure.message),
        ActionOutcome::Dropped => bail!("Workspace closed before the judge responded"),
    }
}

/// Place compiler output on source lines locally
pub fn diagnose(file: &Path, errors: Option<&Path>, json: bool) -> Result<()> {
    let document = terminal::read_text(file)?;
    let error_text = match errors {
        Some(path) => terminal::read_text(path)?,
        None => terminal::read_stdin()?,
    };

    let markers = DiagnosticLocator::default().locate(&error_text, &document);
    info!(markers = markers.len(), "Diagnostics located");

    if json {
        println!("{}", serde_json::to_string_pretty(&markers).context("Failed to serialize markers")?);
    } else if markers.is_empty() {
        println!("No source lines matched the compiler output.");
    } else {
        print!("{}", terminal::render_markers(&markers, &document));
    }
    Ok(())
}

/// Classify a paste the way the editor would
pub fn paste(config: Option<&Path>, file: &Path, snippet: &Path, yes: bool) -> Result<()> {
    let (session, _editor) = open_session(config, file, gate_for(yes))?;
    let pasted = terminal::read_text(snippet)?;

    match session.on_paste(&pasted) {
        PasteDecision::Inline => println!("✅ Inline paste (already in the document)"),
        PasteDecision::Blank => println!("✅ Blank paste"),
        PasteDecision::ExternalConfirmed { attempts } => {
            println!("⚠️  External paste accepted (attempt #{})", attempts)
        }
        PasteDecision::ExternalRejected { attempts } => {
            println!("❌ External paste discarded (attempt #{})", attempts)
        }
    }
    Ok(())
}
