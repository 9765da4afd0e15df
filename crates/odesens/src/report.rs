//! Output of analysis results and model listings.

use std::fmt::Write as _;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use color_eyre::eyre::WrapErr;
use odesens_core::{BuiltinModel, SensitivityResult};

/// Write content to a file atomically using write-then-rename pattern.
///
/// The content goes to a sibling temporary file first, which is then renamed
/// over the target, so readers never see a partially written file.
pub fn atomic_write(path: &Path, content: &str) -> io::Result<()> {
    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

pub fn to_json(result: &SensitivityResult) -> serde_json::Result<String> {
    serde_json::to_string_pretty(result)
}

/// Write the result as JSON to `output`, or to stdout when `None`.
pub fn write_result(result: &SensitivityResult, output: Option<&Path>) -> color_eyre::Result<()> {
    let json = to_json(result).wrap_err("Failed to serialize result")?;
    match output {
        Some(path) => {
            atomic_write(path, &json)
                .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("result written to {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{json}")?;
        }
    }
    Ok(())
}

/// Log the dominant parameter of every state at the last time.
pub fn log_summary(result: &SensitivityResult) {
    let Some(last) = result.times().len().checked_sub(1) else {
        return;
    };
    for state in result.states() {
        let Some(totals) = state.total_order_at(last) else {
            continue;
        };
        let dominant = totals
            .iter()
            .zip(result.parameters())
            .filter(|(value, _)| !value.is_nan())
            .max_by(|a, b| a.0.total_cmp(b.0));
        if let Some((value, parameter)) = dominant {
            tracing::info!(
                "{}: largest total-order index at t={} is {parameter} ({value:.3})",
                state.name,
                result.times()[last]
            );
        }
    }
    if !result.warnings().is_empty() {
        tracing::warn!(
            "{} index values deviate beyond the tolerated band; consider a larger n",
            result.warnings().len()
        );
    }
}

/// Human-readable table of the built-in models
pub fn models_listing() -> String {
    let mut out = String::new();
    for model in BuiltinModel::ALL {
        let _ = writeln!(out, "{}", model.name());
        let _ = writeln!(out, "    {}", model.description());
        let _ = writeln!(out, "    parameters: {}", model.parameter_names().join(", "));
        let states: Vec<String> = model
            .state_names()
            .iter()
            .zip(model.default_initial_values())
            .map(|(name, value)| format!("{name} = {value}"))
            .collect();
        let _ = writeln!(out, "    states:     {}", states.join(", "));
    }
    out
}
