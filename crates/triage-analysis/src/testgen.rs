//! Generated unit test handling
//!
//! The model is asked for `{"test_code": "..."}`. Whatever comes back, the
//! caller gets a test body: the decoded code, a marker comment, or the raw
//! text under a marker comment.

use crate::syntax::{one_line, parse_tolerant, walk};
use serde_json::Value;
use triage_agent::extract::{balanced_object, strip_markdown_fences};

/// Emitted when the reply is JSON without a `test_code` string
pub const MISSING_KEY_MARKER: &str = "# No 'test_code' key in generated test.";

/// Prefixed to raw model text that could not be decoded
pub const UNPARSED_MARKER: &str = "# Could not decode generated test; raw model output follows.";

/// Extract the test body from a model reply
pub fn parse_generated_test(raw: &str) -> String {
    let clean = strip_markdown_fences(raw);

    let value = serde_json::from_str::<Value>(clean).ok().or_else(|| {
        balanced_object(clean).and_then(|object| serde_json::from_str::<Value>(object).ok())
    });

    match value {
        Some(Value::Object(object)) => match object.get("test_code") {
            Some(Value::String(code)) if !code.trim().is_empty() => code.trim().to_string(),
            _ => MISSING_KEY_MARKER.to_string(),
        },
        _ => {
            tracing::warn!(chars = raw.len(), "Generated test was not JSON");
            format!("{}\n{}", UNPARSED_MARKER, raw.trim())
        }
    }
}

/// Test sketch built from the snippet itself, for when no model is available
///
/// Asserts on the last `return` expression of the snippet.
pub fn sketch_test(code: &str, reason: &str) -> String {
    let header = format!("# Test generation failed: {}", reason);

    let Some(tree) = parse_tolerant(code) else {
        return format!("{}\n# No return statement found.", header);
    };

    let mut function = None;
    let mut returned = None;
    walk(tree.root_node(), |node| match node.kind() {
        "function_definition" if function.is_none() => {
            function = node
                .child_by_field_name("name")
                .map(|name| one_line(&name, code));
        }
        "return_statement" => {
            if let Some(expr) = node.named_child(0) {
                returned = Some(one_line(&expr, code));
            }
        }
        _ => {}
    });

    match returned {
        Some(expr) => format!(
            "{}\ndef test_{}():\n    expected = None  # replace with the expected value\n    assert {} == expected",
            header,
            function.as_deref().unwrap_or("case"),
            expr
        ),
        None => format!("{}\n# No return statement found.", header),
    }
}
