use crate::error::{OrchestratorError, VerdictParseError};
use crate::generator::Generator;

/// Parse a free-form verdict into a boolean.
///
/// Only the words `true` and `false` are accepted, in any letter case and
/// with surrounding whitespace ignored. Anything else is an error; no
/// default is applied.
pub fn parse_verdict(text: &str) -> Result<bool, VerdictParseError> {
    let word = text.trim();
    if word.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if word.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(VerdictParseError(text.to_owned()))
    }
}

/// Ask the generator whether the description is a programming task.
pub async fn run_validation(
    generator: &dyn Generator,
    task_description: &str,
) -> Result<bool, OrchestratorError> {
    let verdict = generator
        .validate(task_description)
        .await
        .map_err(OrchestratorError::Validation)?;

    let is_valid = parse_verdict(&verdict).inspect_err(|e| {
        tracing::error!(generator = generator.name(), error = %e, "unparseable validation verdict");
    })?;

    tracing::info!(generator = generator.name(), is_valid, "task validated");
    Ok(is_valid)
}
