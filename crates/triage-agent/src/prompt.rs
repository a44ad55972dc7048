//! Prompt builders
//!
//! Each builder returns the full text sent to the backend for one call.

/// Field descriptions of the verdict schema, in output order
pub const VERDICT_FIELDS: &[(&str, &str, &str)] = &[
    ("explanation", "string", "What does the code do, and what is wrong with it?"),
    ("bug_found", "boolean", "true if the code is buggy, else false"),
    ("suggested_fix", "string", "Complete corrected source if a bug was found, else empty"),
    ("severity", "string", "Bug severity: low, medium or critical"),
];

/// Schema description shared by the verdict and repair prompts
pub fn verdict_schema() -> String {
    let mut schema = String::from("{\n");
    for (name, kind, description) in VERDICT_FIELDS {
        schema.push_str(&format!("    \"{}\": {}  // {}\n", name, kind, description));
    }
    schema.push('}');
    schema
}

/// Ask for a structured verdict about a reported defect
pub fn build_verdict_prompt(input: &str) -> String {
    format!(
        "You are a debugging assistant. Analyze the following code or issue report.\n\n\
         ## INPUT\n\n{}\n\n\
         ## OUTPUT FORMAT\n\n\
         Respond with a single JSON object matching this schema and nothing else:\n\n{}\n",
        input.trim(),
        verdict_schema()
    )
}

/// Ask the model to rewrite a rejected structured answer so it fits the schema
pub fn build_repair_prompt(rejected: &str, error: &str) -> String {
    format!(
        "The following output did not satisfy the required schema.\n\n\
         ## SCHEMA\n\n{}\n\n\
         ## REJECTED OUTPUT\n\n{}\n\n\
         ## ERROR\n\n{}\n\n\
         Rewrite the output as a single JSON object that satisfies the schema. \
         Keep its meaning. Respond with the JSON object only.\n",
        verdict_schema(),
        rejected.trim(),
        error
    )
}

/// Ask for a one-word severity label
pub fn build_severity_prompt(code: &str) -> String {
    format!(
        "Analyze the code and return bug severity:\n\n\
         low: stylistic or non-critical\n\
         medium: unexpected behavior\n\
         critical: logic-breaking bug\n\n\
         ```python\n{}\n```\n\n\
         Return only one word: low, medium, or critical.",
        code.trim()
    )
}

/// Ask for a pytest unit test wrapped in a JSON object
pub fn build_unit_test_prompt(code: &str) -> String {
    format!(
        "You're a test generation AI. Given this function, return a valid pytest unit test \
         as JSON with this format:\n\n\
         {{\n    \"test_code\": \"<PYTEST CODE>\"\n}}\n\n\
         Function:\n```python\n{}\n```",
        code.trim()
    )
}

/// Ask for a bug classification
pub fn build_bug_type_prompt(input: &str) -> String {
    format!(
        "Classify the bug in this code or error log:\n\n\"\"\"{}\"\"\"\n\n\
         Format:\nBug Type: <type>\nReason: <explanation>",
        input.trim()
    )
}

/// Ask for a readability refactor
pub fn build_refactor_prompt(code: &str) -> String {
    format!(
        "Refactor this code for readability and best practices:\n\n```python\n{}\n```",
        code.trim()
    )
}

/// Ask for a corrected version of buggy code
pub fn build_suggest_fix_prompt(code: &str) -> String {
    format!(
        "You're a code-fixing assistant. Suggest a fix for:\n\n```python\n{}\n```",
        code.trim()
    )
}
