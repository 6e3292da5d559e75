#![forbid(unsafe_code)]

use std::path::Path;

use anyhow::Context as _;
use serde::Serialize;

use crate::core::record::TaskRecord;

/// Two-space indented JSON with a trailing newline. serde_json never escapes
/// non-ASCII, so descriptions keep their original characters.
pub fn to_pretty_string<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<String> {
    let mut out = serde_json::to_string_pretty(value)?;
    out.push('\n');
    Ok(out)
}

pub fn write_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> anyhow::Result<()> {
    let data = to_pretty_string(value)?;
    super::write_atomic(path, data.as_bytes())
}

pub fn read_records(path: &Path) -> anyhow::Result<Vec<TaskRecord>> {
    let data = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&data).with_context(|| format!("failed to parse {}", path.display()))
}
