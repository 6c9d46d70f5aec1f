use tracing::trace;

use super::error::PatchError;
use super::{DiffOp, DiffSummaryLine, OpKind, PatchResult};

/// Replay `ops` over `base`.
///
/// EQUAL and DELETE ops must match `base` at the read cursor; INSERT ops are
/// copied to the output. The script has to consume all of `base`: a short
/// script is rejected rather than having the tail copied silently.
///
/// The returned result always has `applied == false`; persisting the document
/// is up to the caller. With `dry_run` set a per-op preview is attached.
pub fn apply(base: &str, ops: &[DiffOp], dry_run: bool) -> Result<PatchResult, PatchError> {
    if ops.is_empty() {
        return Err(PatchError::Validation {
            reason: "edit script is empty".to_string(),
        });
    }

    // `cursor` is a byte index into `base`, `offset` the same position in chars.
    let mut cursor = 0usize;
    let mut offset = 0usize;
    let mut output = String::with_capacity(base.len());
    let mut preview = dry_run.then(|| Vec::with_capacity(ops.len()));

    for (index, op) in ops.iter().enumerate() {
        if let Some(lines) = preview.as_mut() {
            lines.push(DiffSummaryLine {
                kind: op.kind,
                text: op.text.clone(),
                context_offset: offset,
            });
        }

        match op.kind {
            OpKind::Insert => output.push_str(&op.text),
            OpKind::Equal | OpKind::Delete => {
                let rest = &base[cursor..];
                if !rest.starts_with(op.text.as_str()) {
                    return Err(PatchError::Mismatch {
                        index,
                        offset,
                        expected: op.text.clone(),
                        found: rest.chars().take(op.text.chars().count()).collect(),
                    });
                }

                cursor += op.text.len();
                offset += op.text.chars().count();
                if op.kind == OpKind::Equal {
                    output.push_str(&op.text);
                }
            }
        }
    }

    if cursor < base.len() {
        return Err(PatchError::Incomplete {
            consumed: offset,
            total: offset + base[cursor..].chars().count(),
        });
    }

    trace!(
        ops = ops.len(),
        input_len = base.len(),
        output_len = output.len(),
        dry_run,
        "Edit script replayed"
    );

    Ok(PatchResult {
        applied: false,
        result_document: output,
        preview,
    })
}
