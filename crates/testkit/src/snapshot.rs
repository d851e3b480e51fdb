//! Golden-file snapshots of resolved layout trees.
//!
//! Trees are serialized as pretty JSON with object keys sorted and floats
//! rounded to [`FLOAT_DECIMALS`] places, so goldens survive harmless
//! rounding noise. To rewrite goldens, rerun with
//! `ANCHORKIT_UPDATE_SNAPSHOTS=1`.

use anchorkit_layout::{LayoutNode, NodeSnapshot};
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Environment variable that enables snapshot updates.
pub const UPDATE_SNAPSHOTS_ENV: &str = "ANCHORKIT_UPDATE_SNAPSHOTS";

/// Decimal places kept for floating point values.
pub const FLOAT_DECIMALS: i32 = 4;

/// Assert that the subtree under `node` matches the golden file at `path`.
pub fn assert_tree_snapshot<P: AsRef<Path>>(path: P, node: &LayoutNode) -> Result<()> {
    assert_json_snapshot(path, &NodeSnapshot::capture(node))
}

/// Assert that `value` matches the JSON golden file at `path`.
///
/// With `ANCHORKIT_UPDATE_SNAPSHOTS=1` the file is (re)written instead.
pub fn assert_json_snapshot<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> Result<()> {
    let path = path.as_ref();
    let actual = canonical_json(value)?;

    if should_update_snapshots() {
        tracing::info!(path = %path.display(), "updating layout snapshot");
        return write_snapshot(path, &actual);
    }

    let expected = fs::read_to_string(path).with_context(|| {
        format!(
            "Snapshot missing at {} (run with {}=1 to create it)",
            path.display(),
            UPDATE_SNAPSHOTS_ENV
        )
    })?;

    if expected != actual {
        anyhow::bail!(
            "Layout snapshot mismatch at {} (run with {}=1 to update)\n--- expected\n{}\n--- actual\n{}",
            path.display(),
            UPDATE_SNAPSHOTS_ENV,
            expected,
            actual
        );
    }
    Ok(())
}

/// Render `value` the way goldens are stored.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String> {
    let value = serde_json::to_value(value).context("Failed to serialize snapshot value")?;
    let mut out = serde_json::to_string_pretty(&canonicalize(value))
        .context("Failed to format snapshot JSON")?;
    out.push('\n');
    Ok(out)
}

fn should_update_snapshots() -> bool {
    matches!(
        std::env::var(UPDATE_SNAPSHOTS_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

fn write_snapshot(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create snapshot directory {}", parent.display()))?;
    }
    fs::write(path, contents)
        .with_context(|| format!("Failed to write snapshot {}", path.display()))
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, canonicalize(v)))
                    .collect(),
            )
        }
        Value::Array(values) => Value::Array(values.into_iter().map(canonicalize).collect()),
        Value::Number(n) if !n.is_i64() && !n.is_u64() => match n.as_f64() {
            Some(f) => round_float(f),
            None => Value::Number(n),
        },
        other => other,
    }
}

fn round_float(f: f64) -> Value {
    let scale = 10f64.powi(FLOAT_DECIMALS);
    let mut rounded = (f * scale).round() / scale;
    // Keep "-0.0" out of goldens.
    if rounded == 0.0 {
        rounded = 0.0;
    }
    serde_json::Number::from_f64(rounded)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
