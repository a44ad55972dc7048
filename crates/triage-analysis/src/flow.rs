//! Control-flow extraction and simulated execution paths

use crate::syntax::{node_text, one_line, parse_python, walk};
use serde::{Deserialize, Serialize};
use serde_json::json;
use triage_core::Result;

/// Header line of a simulated execution path report
pub const PATHS_HEADER: &str = "Simulated Execution Path:";

/// Branch conditions, loop headers and called functions in a snippet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowSummary {
    pub branches: Vec<String>,
    pub loops: Vec<String>,
    pub function_calls: Vec<String>,
}

/// Extract the control-flow summary of Python source
pub fn visualize_flow(code: &str) -> Result<FlowSummary> {
    let tree = parse_python(code)?;
    let mut summary = FlowSummary::default();

    walk(tree.root_node(), |node| match node.kind() {
        "if_statement" | "elif_clause" => {
            if let Some(condition) = node.child_by_field_name("condition") {
                summary.branches.push(one_line(&condition, code));
            }
        }
        "for_statement" | "while_statement" => {
            summary.loops.push(loop_header(node_text(&node, code)));
        }
        "call" => {
            if let Some(function) = node.child_by_field_name("function") {
                summary.function_calls.push(one_line(&function, code));
            }
        }
        _ => {}
    });

    Ok(summary)
}

/// [`visualize_flow`] rendered as JSON; failures become `{"error": ...}`
pub fn flow_json(code: &str) -> String {
    let value = match visualize_flow(code) {
        Ok(summary) => json!(summary),
        Err(e) => json!({ "error": e.to_string() }),
    };
    serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
}

fn loop_header(text: &str) -> String {
    let first_line = text.lines().next().unwrap_or("").trim();
    first_line
        .strip_suffix(':')
        .unwrap_or(first_line)
        .trim_end()
        .to_string()
}

/// Describe the branches and return values a snippet can take
///
/// One line per `if`/`elif` condition, conditional expression and `return`,
/// in source order. Unparseable input yields `Simulation failed: ...`.
pub fn simulate_paths(code: &str) -> String {
    let tree = match parse_python(code) {
        Ok(tree) => tree,
        Err(e) => return format!("Simulation failed: {}", e),
    };

    let mut lines = vec![PATHS_HEADER.to_string()];

    walk(tree.root_node(), |node| match node.kind() {
        "if_statement" | "elif_clause" => {
            if let Some(condition) = node.child_by_field_name("condition") {
                lines.push(format!(
                    "- If `{}` is True → executes branch.",
                    one_line(&condition, code)
                ));
            }
        }
        "conditional_expression" => {
            // <value> if <condition> else <alternative>
            let mut cursor = node.walk();
            let parts: Vec<_> = node.named_children(&mut cursor).collect();
            if let [value, condition, alternative] = parts.as_slice() {
                lines.push(format!(
                    "- If `{}` is True → evaluates `{}`, otherwise `{}`.",
                    one_line(condition, code),
                    one_line(value, code),
                    one_line(alternative, code)
                ));
            }
        }
        "return_statement" => {
            let value = node
                .named_child(0)
                .map(|expr| one_line(&expr, code))
                .unwrap_or_else(|| "None".to_string());
            lines.push(format!("- Returns → {}", value));
        }
        _ => {}
    });

    lines.join("\n")
}

/// Keyword heuristic for what a snippet does
pub fn explain_code(code: &str) -> String {
    if code.contains("def") && code.contains("return") {
        "Likely a function returning a value: maybe a slice, transformation, or computed result."
            .to_string()
    } else {
        "Can't determine purpose. Not a function?".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulate_conditional_expression() {
        let report = simulate_paths("def f(x): return -x if x < 0 else x");
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(
            lines,
            vec![
                PATHS_HEADER,
                "- Returns → -x if x < 0 else x",
                "- If `x < 0` is True → evaluates `-x`, otherwise `x`.",
            ]
        );
    }

    #[test]
    fn test_simulate_if_statements_in_order() {
        let code = "\
def sign(x):
    if x > 0:
        return 1
    elif x < 0:
        return -1
    return
";
        let report = simulate_paths(code);
        assert_eq!(
            report,
            "Simulated Execution Path:\n\
             - If `x > 0` is True → executes branch.\n\
             - Returns → 1\n\
             - If `x < 0` is True → executes branch.\n\
             - Returns → -1\n\
             - Returns → None"
        );
    }

    #[test]
    fn test_simulate_rejects_invalid_source() {
        assert!(simulate_paths("def broken(:").starts_with("Simulation failed:"));
    }

    #[test]
    fn test_visualize_flow() {
        let code = "\
for i in range(3):
    print(i)
while x:
    if x % 2:
        x = step(x)
";
        let flow = visualize_flow(code).unwrap();
        assert_eq!(flow.loops, vec!["for i in range(3)", "while x"]);
        assert_eq!(flow.branches, vec!["x % 2"]);
        assert_eq!(flow.function_calls, vec!["range", "print", "step"]);
    }

    #[test]
    fn test_flow_json_reports_errors() {
        let value: serde_json::Value = serde_json::from_str(&flow_json("def broken(:")).unwrap();
        assert!(value["error"].as_str().unwrap().contains("invalid syntax"));

        let value: serde_json::Value = serde_json::from_str(&flow_json("len(x)")).unwrap();
        assert_eq!(value["function_calls"][0], "len");
    }

    #[test]
    fn test_explain_code() {
        assert!(explain_code("def f(): return 1").starts_with("Likely a function"));
        assert!(explain_code("x = 1").starts_with("Can't determine"));
    }
}
