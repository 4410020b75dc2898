//! `#token#` templates.
//!
//! `soils.sol.tpl` renders into its sibling `soils.sol`. Tokens are replaced in
//! the map's insertion order, so a later token may match text produced by an
//! earlier substitution.

use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{PatchError, PatchResult};

/// Output path of a template: the file name with its final `.suffix` removed.
pub fn template_output_path(template: &Path) -> PatchResult<PathBuf> {
    let name = template
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            PatchError::InvalidInput(format!("invalid template path {}", template.display()))
        })?;
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => Ok(template.with_file_name(stem)),
        _ => Err(PatchError::InvalidInput(format!(
            "template '{}' has no suffix to strip",
            name
        ))),
    }
}

pub fn render_template<V: Display>(text: &str, tokens: &IndexMap<String, V>) -> String {
    let mut rendered = text.to_string();
    for (token, value) in tokens {
        let placeholder = format!("#{}#", token);
        rendered = rendered.replace(&placeholder, &value.to_string());
    }
    rendered
}

/// Render a template next to itself and return the written path.
pub fn apply_template<V: Display>(
    template: &Path,
    tokens: &IndexMap<String, V>,
) -> PatchResult<PathBuf> {
    let output = template_output_path(template)?;
    let text = fs::read_to_string(template).map_err(|source| PatchError::Io {
        path: template.to_path_buf(),
        source,
    })?;
    fs::write(&output, render_template(&text, tokens)).map_err(|source| PatchError::Io {
        path: output.clone(),
        source,
    })?;
    debug!(template = %template.display(), output = %output.display(), tokens = tokens.len(), "template applied");
    Ok(output)
}
