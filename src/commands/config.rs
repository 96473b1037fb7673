//! `wavescope config`: edit the TOML file in place.

use crate::config::{get_config_path, ScopeConfig};
use anyhow::Context;
use std::ffi::OsStr;
use std::path::Path;
use std::process::Command;

/// Editors tried when neither `$VISUAL` nor `$EDITOR` is set.
const FALLBACK_EDITORS: [&str; 2] = ["nano", "vi"];

/// Opens the configuration file in an editor and validates the result.
///
/// A missing file is seeded with the defaults so the editor shows every
/// key.
///
/// # Errors
/// - If the default config cannot be written
/// - If no editor is found or it exits with an error
/// - If the edited file no longer parses
pub fn handle_config() -> anyhow::Result<()> {
    let config_path = get_config_path()?;
    if !config_path.exists() {
        ScopeConfig::default().save_to(&config_path)?;
        tracing::info!("Seeded {} with defaults", config_path.display());
    }

    let preferred = ["VISUAL", "EDITOR"]
        .into_iter()
        .find_map(|var| std::env::var(var).ok());
    let Some((program, args)) = resolve_editor(preferred.as_deref(), on_path) else {
        anyhow::bail!("No editor found; set $EDITOR (tried {})", FALLBACK_EDITORS.join(", "));
    };
    tracing::debug!("Editing {} with {} {:?}", config_path.display(), program, args);

    let status = Command::new(&program)
        .args(&args)
        .arg(&config_path)
        .status()
        .with_context(|| format!("Failed to launch editor '{program}'"))?;
    if !status.success() {
        anyhow::bail!("Editor '{program}' exited with {status}");
    }

    ScopeConfig::load_from(&config_path)?;
    tracing::info!("Config file {} is valid", config_path.display());
    Ok(())
}

/// Splits the preferred editor command, or picks the first fallback that
/// `available` accepts.
fn resolve_editor(
    preferred: Option<&str>,
    available: impl Fn(&str) -> bool,
) -> Option<(String, Vec<String>)> {
    if let Some(mut words) = preferred.map(str::split_whitespace) {
        if let Some(program) = words.next() {
            return Some((program.to_string(), words.map(str::to_string).collect()));
        }
    }
    FALLBACK_EDITORS
        .into_iter()
        .find(|editor| available(editor))
        .map(|editor| (editor.to_string(), Vec::new()))
}

fn on_path(program: &str) -> bool {
    std::env::var_os("PATH").is_some_and(|paths| {
        std::env::split_paths(&paths).any(|dir| is_file(&dir.join(OsStr::new(program))))
    })
}

fn is_file(path: &Path) -> bool {
    path.metadata().is_ok_and(|meta| meta.is_file())
}
