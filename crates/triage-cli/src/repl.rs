//! Interactive loop and report printing

use anyhow::Result;
use serde_json::Value;
use std::io::Write;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};
use triage_orchestrator::Triage;

const FILE_DIRECTIVE: &str = "file:";

/// One line typed at the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplInput {
    Exit,
    Empty,
    /// A file directive, with the file contents or the reason they are missing
    File { path: String, content: String },
    Request(String),
}

/// Interpret a line typed at the prompt
pub fn interpret(line: &str) -> ReplInput {
    let line = line.trim();

    if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
        return ReplInput::Exit;
    }

    if let Some(path) = line.strip_prefix(FILE_DIRECTIVE) {
        let path = path.trim().to_string();
        let content = load_file_content(Path::new(&path));
        return ReplInput::File { path, content };
    }

    if line.is_empty() {
        ReplInput::Empty
    } else {
        ReplInput::Request(line.to_string())
    }
}

/// File contents, or a message saying why they could not be read
pub fn load_file_content(path: &Path) -> String {
    if !path.exists() {
        return format!("❌ File not found: {}", path.display());
    }
    match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => format!("❌ Error reading file: {}", e),
    }
}

/// Resolve a one-off input that may be a file directive
pub fn resolve_input(input: &str) -> String {
    match input.trim().strip_prefix(FILE_DIRECTIVE) {
        Some(path) => load_file_content(Path::new(path.trim())),
        None => input.to_string(),
    }
}

/// Render a report: `- Key: value` lines for a JSON object, raw text otherwise
pub fn format_report(report: &str) -> String {
    let object = match serde_json::from_str::<Value>(report.trim()) {
        Ok(Value::Object(object)) => object,
        _ => return report.to_string(),
    };

    object
        .iter()
        .map(|(key, value)| match value {
            Value::String(text) => format!("- {}: {}", capitalize(key), text),
            other => format!(
                "- {}:\n{}",
                capitalize(key),
                serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string())
            ),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn capitalize(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Read requests from stdin until `exit`, `quit` or end of input
pub async fn run(triage: &dyn Triage, mode: &str) -> Result<()> {
    println!("🧠 AI Debugger");
    println!("Type 'exit' to quit. Use 'file:<path>' to load a file.");
    println!("Mode: {}", mode);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let request = match interpret(&line) {
            ReplInput::Exit => break,
            ReplInput::Empty => continue,
            ReplInput::File { path, content } => {
                println!("\n📂 Loaded file `{}`", path);
                content
            }
            ReplInput::Request(request) => request,
        };

        if request.trim().is_empty() {
            continue;
        }

        let report = triage.debug_tool_issue(&request).await;
        println!("{}", format_report(&report));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_exit_words() {
        assert_eq!(interpret("exit"), ReplInput::Exit);
        assert_eq!(interpret("  QUIT "), ReplInput::Exit);
        assert_eq!(interpret("   "), ReplInput::Empty);
        assert_eq!(
            interpret("def f(): pass"),
            ReplInput::Request("def f(): pass".to_string())
        );
    }

    #[test]
    fn test_file_directive_loads_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bug.py");
        std::fs::write(&path, "def f(x): return -x\n").unwrap();

        match interpret(&format!("file: {}", path.display())) {
            ReplInput::File { content, .. } => assert_eq!(content, "def f(x): return -x\n"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_becomes_message() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.py");

        let content = resolve_input(&format!("file:{}", missing.display()));
        assert!(content.starts_with("❌ File not found:"));
        assert_eq!(resolve_input("plain text"), "plain text");
    }

    #[test]
    fn test_format_report_object() {
        let report = r#"{"explanation": "Returns abs", "bug_found": false, "tags": ["a"]}"#;
        let text = format_report(report);

        assert!(text.contains("- Explanation: Returns abs"));
        assert!(text.contains("- Bug_found:\nfalse"));
        assert!(text.contains("- Tags:\n[\n  \"a\"\n]"));
    }

    #[test]
    fn test_format_report_raw_text() {
        assert_eq!(format_report("Severity: low"), "Severity: low");
        assert_eq!(format_report("[1, 2]"), "[1, 2]");
    }
}
