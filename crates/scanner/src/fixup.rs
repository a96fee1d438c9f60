//! Repairs descriptors written by older capture tools.
//!
//! Those documents open with `[` instead of `{`, never close the outer object,
//! and texture entries are missing commas after `format`, `control0` and
//! `control1` (the control words are also written as bare hex literals).

use std::path::Path;

use log::{debug, info, warn};

use crate::artifact::discover_artifacts;
use crate::error::DescriptorError;

/// Returns the repaired document, pretty-printed with two-space indentation.
pub fn repair_descriptor(text: &str) -> Result<String, DescriptorError> {
    let document = match text.strip_prefix('[') {
        Some(rest) => {
            let content = format!("{{\n{rest}\n}}");
            let content = if content[1..].trim_start().starts_with("\"texture\"") {
                content.lines().map(repair_texture_line).collect::<Vec<_>>().join("\n")
            } else {
                content
            };

            serde_json::from_str::<serde_json::Value>(&content).map_err(DescriptorError::Repair)?
        }
        None => serde_json::from_str::<serde_json::Value>(text)?,
    };

    Ok(serde_json::to_string_pretty(&document)?)
}

fn repair_texture_line(line: &str) -> String {
    let trimmed = line.trim_start();
    let indent = &line[..line.len() - trimmed.len()];

    if trimmed.starts_with("\"format\":") && !trimmed.ends_with(',') {
        return format!("{line},");
    }

    if trimmed.starts_with("\"control0\"") || trimmed.starts_with("\"control1\"") {
        if let Some((key, value)) = trimmed.split_once(':') {
            if let Some(value) = parse_hex_literal(value.trim()) {
                return format!("{indent}{key}: {value},");
            }
        }
        return line.to_string();
    }

    if trimmed.starts_with("\"control1_hex\"") {
        let mut chars = line.chars();
        chars.next_back();
        return chars.as_str().to_string();
    }

    line.to_string()
}

fn parse_hex_literal(value: &str) -> Option<u64> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    u64::from_str_radix(digits, 16).ok()
}

/// Rewrites every descriptor that is paired with a dump in `dir`.
///
/// Descriptors that cannot be repaired are logged and left untouched.
/// Returns the number of files rewritten.
pub fn repair_directory(dir: impl AsRef<Path>) -> Result<usize, DescriptorError> {
    let dir = dir.as_ref();
    let mut repaired = 0;

    for artifact in discover_artifacts(dir)? {
        let path = &artifact.descriptor_path;
        let result = std::fs::read_to_string(path)
            .map_err(|e| DescriptorError::io(path, e))
            .and_then(|text| repair_descriptor(&text))
            .and_then(|fixed| {
                std::fs::write(path, fixed).map_err(|e| DescriptorError::io(path, e))
            });

        match result {
            Ok(()) => {
                debug!("Repaired {}", path.display());
                repaired += 1;
            }
            Err(e) => warn!("Failed to repair {}: {e}", path.display()),
        }
    }

    info!("Repaired {repaired} descriptor(s) in {}", dir.display());
    Ok(repaired)
}
