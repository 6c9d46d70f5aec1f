//! Edit-script patching.
//!
//! An edit script is an ordered list of [`DiffOp`]s in the
//! `[[kind, text], ...]` tuple form produced by diff-match-patch style
//! differs. [`apply`] replays such a script against a base
//! document without touching any storage.

mod engine;
mod error;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use engine::apply;
pub use error::PatchError;

/// Kind of a single edit operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Delete,
    Equal,
    Insert,
}

impl OpKind {
    /// Numeric wire code: `-1`, `0` or `1`.
    pub fn code(self) -> i8 {
        match self {
            OpKind::Delete => -1,
            OpKind::Equal => 0,
            OpKind::Insert => 1,
        }
    }

    /// Kind with INSERT and DELETE swapped.
    pub fn inverse(self) -> Self {
        match self {
            OpKind::Delete => OpKind::Insert,
            OpKind::Equal => OpKind::Equal,
            OpKind::Insert => OpKind::Delete,
        }
    }
}

impl TryFrom<i64> for OpKind {
    type Error = PatchError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            -1 => Ok(OpKind::Delete),
            0 => Ok(OpKind::Equal),
            1 => Ok(OpKind::Insert),
            other => Err(PatchError::Validation {
                reason: format!("operation kind {other} is not one of -1, 0, 1"),
            }),
        }
    }
}

impl Serialize for OpKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i8(self.code())
    }
}

impl<'de> Deserialize<'de> for OpKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = i64::deserialize(deserializer)?;
        OpKind::try_from(code).map_err(de::Error::custom)
    }
}

/// One step of an edit script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffOp {
    pub kind: OpKind,
    pub text: String,
}

impl DiffOp {
    pub fn new(kind: OpKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn equal(text: impl Into<String>) -> Self {
        Self::new(OpKind::Equal, text)
    }

    pub fn delete(text: impl Into<String>) -> Self {
        Self::new(OpKind::Delete, text)
    }

    pub fn insert(text: impl Into<String>) -> Self {
        Self::new(OpKind::Insert, text)
    }
}

impl Serialize for DiffOp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.kind, &self.text).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DiffOp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (kind, text) = <(OpKind, String)>::deserialize(deserializer)?;
        Ok(DiffOp { kind, text })
    }
}

/// Decode an edit script from its raw JSON form.
///
/// Unlike the `Deserialize` impl this reports which op is malformed, which is
/// what a model needs to correct its own tool call.
pub fn parse_ops(value: &Value) -> Result<Vec<DiffOp>, PatchError> {
    let items = value.as_array().ok_or_else(|| PatchError::Validation {
        reason: "edit script must be an array of [kind, text] tuples".to_string(),
    })?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| parse_op(index, item))
        .collect()
}

fn parse_op(index: usize, item: &Value) -> Result<DiffOp, PatchError> {
    let invalid = |reason: String| PatchError::Validation {
        reason: format!("op {index}: {reason}"),
    };

    let pair = match item.as_array() {
        Some(pair) if pair.len() == 2 => pair,
        Some(pair) => {
            return Err(invalid(format!(
                "expected a [kind, text] pair, got {} elements",
                pair.len()
            )));
        }
        None => return Err(invalid("expected a [kind, text] pair".to_string())),
    };

    let code = pair[0]
        .as_i64()
        .ok_or_else(|| invalid(format!("kind must be an integer, got {}", pair[0])))?;
    let kind = OpKind::try_from(code)
        .map_err(|_| invalid(format!("kind {code} is not one of -1, 0, 1")))?;
    let text = pair[1]
        .as_str()
        .ok_or_else(|| invalid(format!("text must be a string, got {}", pair[1])))?;

    Ok(DiffOp::new(kind, text))
}

/// The script that undoes `ops`: INSERT and DELETE swap, order is kept.
pub fn invert(ops: &[DiffOp]) -> Vec<DiffOp> {
    ops.iter()
        .map(|op| DiffOp::new(op.kind.inverse(), op.text.clone()))
        .collect()
}

/// Document the script expects as input (EQUAL and DELETE texts).
pub fn source_text(ops: &[DiffOp]) -> String {
    ops.iter()
        .filter(|op| op.kind != OpKind::Insert)
        .map(|op| op.text.as_str())
        .collect()
}

/// Document the script produces (EQUAL and INSERT texts).
pub fn target_text(ops: &[DiffOp]) -> String {
    ops.iter()
        .filter(|op| op.kind != OpKind::Delete)
        .map(|op| op.text.as_str())
        .collect()
}

/// A patch addressed at a document in some external store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchRequest {
    pub target_id: String,
    pub ops: Vec<DiffOp>,
    #[serde(default)]
    pub dry_run: bool,
}

impl PatchRequest {
    /// Replay this request's script over `base`.
    pub fn apply_to(&self, base: &str) -> Result<PatchResult, PatchError> {
        apply(base, &self.ops, self.dry_run)
    }
}

/// Outcome of replaying an edit script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchResult {
    /// Set only once the caller has persisted `result_document`.
    pub applied: bool,
    pub result_document: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<Vec<DiffSummaryLine>>,
}

impl PatchResult {
    /// Record that the result has been written back to its store.
    pub fn mark_applied(mut self) -> Self {
        self.applied = true;
        self
    }
}

/// Per-op entry of a dry-run preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffSummaryLine {
    pub kind: OpKind,
    pub text: String,
    /// Character offset into the base document where this op starts.
    pub context_offset: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_ops_accepts_tuple_form() {
        let ops = parse_ops(&json!([[0, "foo "], [-1, "bar"], [1, "baz"]])).unwrap();
        assert_eq!(
            ops,
            vec![
                DiffOp::equal("foo "),
                DiffOp::delete("bar"),
                DiffOp::insert("baz")
            ]
        );
    }

    #[test]
    fn parse_ops_rejects_unknown_kind() {
        let err = parse_ops(&json!([[0, "a"], [2, "b"]])).unwrap_err();
        assert!(matches!(err, PatchError::Validation { .. }));
        assert!(err.to_string().contains("op 1"), "{err}");
    }

    #[test]
    fn parse_ops_rejects_non_string_text() {
        let err = parse_ops(&json!([[1, 42]])).unwrap_err();
        assert!(err.to_string().contains("text must be a string"), "{err}");
    }

    #[test]
    fn parse_ops_rejects_wrong_arity() {
        let err = parse_ops(&json!([[1, "a", "b"]])).unwrap_err();
        assert!(err.to_string().contains("3 elements"), "{err}");
    }

    #[test]
    fn diff_op_serializes_as_pair() {
        let value = serde_json::to_value(DiffOp::delete("x")).unwrap();
        assert_eq!(value, json!([-1, "x"]));

        let back: DiffOp = serde_json::from_value(json!([1, "y"])).unwrap();
        assert_eq!(back, DiffOp::insert("y"));
    }

    #[test]
    fn invert_swaps_insert_and_delete_only() {
        let ops = vec![
            DiffOp::equal("a"),
            DiffOp::delete("b"),
            DiffOp::insert("c"),
        ];
        assert_eq!(
            invert(&ops),
            vec![DiffOp::equal("a"), DiffOp::insert("b"), DiffOp::delete("c")]
        );
        assert_eq!(source_text(&ops), "ab");
        assert_eq!(target_text(&ops), "ac");
    }

    #[test]
    fn request_uses_camel_case_fields() {
        let request: PatchRequest = serde_json::from_value(json!({
            "targetId": "notes/today.md",
            "ops": [[0, "x"]],
            "dryRun": true
        }))
        .unwrap();
        assert_eq!(request.target_id, "notes/today.md");
        assert!(request.dry_run);
        assert_eq!(request.apply_to("x").unwrap().result_document, "x");
    }
}
