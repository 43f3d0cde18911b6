//! One-shot generation from the command line.

use std::io::Read;

use anyhow::{Context, Result};
use chrono::Datelike;
use tokio_util::sync::CancellationToken;

use eduplan_core::{
    DocumentKind, GeneratedContent, GenerationPipeline, GenerationRequest, PipelineError,
    RefinementRequest,
};

/// Run `request` and print the resulting JSON to stdout.
///
/// Ctrl-C cancels the in-flight attempt instead of killing the process
/// mid-write.
pub async fn run_generate(
    pipeline: &GenerationPipeline,
    mut request: GenerationRequest,
) -> Result<()> {
    if let GenerationRequest::CurriculumMap(params) = &mut request {
        params.year.get_or_insert_with(|| chrono::Local::now().year());
    }

    let cancel = CancellationToken::new();
    let watcher = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("Cancelling...");
                cancel.cancel();
            }
        }
    });

    let result = pipeline.run_cancellable(&request, &cancel).await;
    watcher.abort();

    let content = result.map_err(describe_failure)?;
    print_content(&content)
}

/// Build a refinement request from a JSON file (`-` reads stdin).
pub fn load_refinement(
    kind: DocumentKind,
    file: &str,
    section: &str,
    instructions: &str,
) -> Result<GenerationRequest> {
    let raw = if file == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read document from stdin")?;
        buf
    } else {
        std::fs::read_to_string(file).with_context(|| format!("failed to read {file}"))?
    };

    let content: serde_json::Value =
        serde_json::from_str(&raw).with_context(|| format!("{file} is not valid JSON"))?;

    // Accept both a bare document and a saved record with a `contenido` field.
    let content = match content {
        serde_json::Value::Object(mut obj) if obj.contains_key("contenido") => {
            obj.remove("contenido").unwrap_or_default()
        }
        other => other,
    };

    Ok(GenerationRequest::SectionRefinement(RefinementRequest::new(
        kind,
        content,
        section,
        instructions,
    )))
}

fn print_content(content: &GeneratedContent) -> Result<()> {
    let pretty = serde_json::to_string_pretty(content.body()).context("failed to render JSON")?;
    println!("{pretty}");
    Ok(())
}

fn describe_failure(err: PipelineError) -> anyhow::Error {
    match err {
        PipelineError::InvalidResponseShape { reason, excerpt } => {
            anyhow::anyhow!("{reason}\n\nModel output began with:\n{excerpt}")
        }
        PipelineError::NoCredential => anyhow::anyhow!(
            "{err}\nRun `eduplan init --api-key <KEY>` or export GEMINI_API_KEY."
        ),
        other => anyhow::Error::new(other),
    }
}
