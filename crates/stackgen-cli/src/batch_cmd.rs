//! `stackgen batch`: run a file of prompts through the orchestrator and
//! save one JSON result per prompt.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use stackgen_core::orchestrator::Orchestrator;
use stackgen_core::task::{GenerationMode, TaskRequest};

const FILENAME_PREFIX_LEN: usize = 50;

/// Options for a batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub output_dir: PathBuf,
    pub mode: GenerationMode,
    /// Retries after the first attempt fails with a request-level error.
    pub max_retries: u32,
    pub retry_delay: Duration,
}

/// Outcome counts for a batch run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Read prompts from a file, one per line. Blank lines and lines starting
/// with `#` are ignored.
pub fn read_prompts(path: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read prompts file {}", path.display()))?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_owned)
        .collect())
}

/// Turn free text into a filename fragment.
///
/// Drops everything except word characters, whitespace and hyphens, then
/// collapses each run of whitespace or hyphens into a single `_` and
/// truncates to `max_len` characters.
pub fn sanitize_filename(text: &str, max_len: usize) -> String {
    let kept: String = text
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect();

    let mut out = String::with_capacity(kept.len());
    let mut in_sep = false;
    for c in kept.trim().chars() {
        if c == '-' || c.is_whitespace() {
            if !in_sep {
                out.push('_');
                in_sep = true;
            }
        } else {
            out.push(c);
            in_sep = false;
        }
    }
    out.chars().take(max_len).collect()
}

/// Output path for the prompt at `index` (zero-based). The name is built
/// from the prompt's first sentence.
pub fn result_path(output_dir: &Path, index: usize, prompt: &str) -> PathBuf {
    let first_sentence = prompt.split('.').next().unwrap_or(prompt);
    let prefix = sanitize_filename(first_sentence, FILENAME_PREFIX_LEN);
    output_dir.join(format!("result_prompt_{:02}_{prefix}.json", index + 1))
}

/// Run every prompt in order, retrying request-level errors up to
/// `max_retries` times. Cancellation stops the run between attempts.
pub async fn run_batch(
    orchestrator: &Orchestrator,
    prompts: &[String],
    options: &BatchOptions,
    cancel: CancellationToken,
) -> Result<BatchSummary> {
    std::fs::create_dir_all(&options.output_dir).with_context(|| {
        format!(
            "failed to create output directory {}",
            options.output_dir.display()
        )
    })?;

    let mut summary = BatchSummary::default();
    let total = prompts.len();

    'prompts: for (index, prompt) in prompts.iter().enumerate() {
        if cancel.is_cancelled() {
            summary.skipped = total - index;
            break;
        }
        tracing::info!(prompt = index + 1, total, "processing prompt");

        let request = TaskRequest::new(prompt.as_str(), options.mode.clone());
        let mut attempt = 0u32;
        loop {
            match orchestrator.run(&request).await {
                Ok(state) => {
                    let path = result_path(&options.output_dir, index, prompt);
                    let json = serde_json::to_string_pretty(&state)
                        .context("failed to serialize task state")?;
                    std::fs::write(&path, json)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    tracing::info!(path = %path.display(), "saved result");
                    summary.succeeded += 1;
                    break;
                }
                Err(e) if attempt >= options.max_retries => {
                    tracing::error!(prompt = index + 1, error = %e, "giving up on prompt");
                    summary.failed += 1;
                    break;
                }
                Err(e) => {
                    attempt += 1;
                    tracing::warn!(
                        prompt = index + 1,
                        attempt,
                        max_retries = options.max_retries,
                        error = %e,
                        "request failed, retrying"
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(options.retry_delay) => {}
                        _ = cancel.cancelled() => {
                            summary.failed += 1;
                            summary.skipped = total - index - 1;
                            break 'prompts;
                        }
                    }
                }
            }
        }
    }

    tracing::info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        skipped = summary.skipped,
        "batch complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    use stackgen_test_utils::{Behavior, ScriptedGenerator, orchestrator, registry_of};

    fn options(dir: &Path, max_retries: u32) -> BatchOptions {
        BatchOptions {
            output_dir: dir.to_path_buf(),
            mode: GenerationMode::Dependencies,
            max_retries,
            retry_delay: Duration::from_secs(10),
        }
    }

    #[test]
    fn sanitize_strips_punctuation_and_collapses_separators() {
        assert_eq!(
            sanitize_filename("Build a REST API -- with auth!", 50),
            "Build_a_REST_API_with_auth"
        );
        assert_eq!(sanitize_filename("  spaced   out  ", 50), "spaced_out");
        assert_eq!(sanitize_filename("snake_case stays", 50), "snake_case_stays");
        assert_eq!(sanitize_filename("?!", 50), "");
    }

    #[test]
    fn sanitize_truncates_by_characters() {
        let long = "word ".repeat(30);
        let name = sanitize_filename(&long, 50);
        assert_eq!(name.chars().count(), 50);
        assert_eq!(sanitize_filename("héllo wörld", 7), "héllo_w");
    }

    #[test]
    fn result_path_uses_first_sentence() {
        let path = result_path(
            Path::new("out"),
            2,
            "Create a web scraper. It should use async IO.",
        );
        assert_eq!(
            path,
            Path::new("out").join("result_prompt_03_Create_a_web_scraper.json")
        );
    }

    #[test]
    fn read_prompts_skips_blanks_and_comments() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("prompts.txt");
        std::fs::write(&path, "# header\n\nfirst task\n   \n  second task  \n").unwrap();

        let prompts = read_prompts(&path).unwrap();
        assert_eq!(prompts, vec!["first task", "second task"]);
    }

    #[test]
    fn read_prompts_missing_file_is_an_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        assert!(read_prompts(&tmp.path().join("absent.txt")).is_err());
    }

    #[tokio::test]
    async fn writes_one_file_per_prompt() {
        let tmp = tempfile::TempDir::new().unwrap();
        let out = tmp.path().join("generated");
        let orch = orchestrator(
            ScriptedGenerator::new("primary"),
            registry_of(&["openai", "deepseek"]),
            2,
        );
        let prompts = vec!["Build a chat app.".to_string(), "Write a CLI".to_string()];

        let summary = run_batch(&orch, &prompts, &options(&out, 0), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(
            summary,
            BatchSummary {
                succeeded: 2,
                failed: 0,
                skipped: 0
            }
        );

        let first = std::fs::read_to_string(out.join("result_prompt_01_Build_a_chat_app.json"))
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&first).unwrap();
        assert_eq!(json["task_description"], "Build a chat app.");
        assert_eq!(json["results"].as_array().unwrap().len(), 4);
        assert!(out.join("result_prompt_02_Write_a_CLI.json").exists());
    }

    #[tokio::test(start_paused = true)]
    async fn retries_request_errors_then_gives_up() {
        let tmp = tempfile::TempDir::new().unwrap();
        let primary = ScriptedGenerator::new("primary").with_validation(Behavior::Fail);
        let orch = orchestrator(primary, registry_of(&["openai"]), 2);
        let prompts = vec!["doomed".to_string()];

        let summary = run_batch(&orch, &prompts, &options(tmp.path(), 3), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.succeeded, 0);
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn cancelled_batch_skips_remaining_prompts() {
        let tmp = tempfile::TempDir::new().unwrap();
        let orch = orchestrator(ScriptedGenerator::new("primary"), registry_of(&["openai"]), 2);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let prompts = vec!["a".to_string(), "b".to_string()];
        let summary = run_batch(&orch, &prompts, &options(tmp.path(), 0), cancel)
            .await
            .unwrap();
        assert_eq!(
            summary,
            BatchSummary {
                succeeded: 0,
                failed: 0,
                skipped: 2
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_retry_delay() {
        let tmp = tempfile::TempDir::new().unwrap();
        let primary = ScriptedGenerator::new("primary").with_validation(Behavior::Fail);
        let orch = orchestrator(primary, registry_of(&["openai"]), 2);
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let prompts = vec!["first".to_string(), "second".to_string()];
        let summary = run_batch(&orch, &prompts, &options(tmp.path(), 3), cancel)
            .await
            .unwrap();
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 1);
    }
}
