//! Prompt building and reply parsing for the single-shot agent
//!
//! The agent alternates between asking the model for the next step and
//! feeding the chosen tool's output back as an observation.

/// Marker the model uses to finish
pub const FINAL_ANSWER: &str = "Final Answer:";

const ACTION: &str = "Action:";
const ACTION_INPUT: &str = "Action Input:";
const OBSERVATION: &str = "Observation:";

/// What the model asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentStep {
    /// Call a tool
    Action { tool: String, input: String },
    /// Done; the text is the answer
    Final(String),
}

/// Build the prompt for the next step
///
/// `scratchpad` holds earlier actions and their observations.
pub fn build_agent_prompt(
    input: &str,
    tool_descriptions: &str,
    tool_names: &[&str],
    scratchpad: &str,
) -> String {
    let mut prompt = String::new();

    prompt.push_str("Answer the following debugging request as best you can. ");
    prompt.push_str("You have access to the following tools:\n\n");
    prompt.push_str(tool_descriptions);
    prompt.push_str("\n\n");

    prompt.push_str("Use the following format:\n\n");
    prompt.push_str("Question: the input you must answer\n");
    prompt.push_str("Thought: what to do next\n");
    prompt.push_str(&format!(
        "{} the tool to use, one of [{}]\n",
        ACTION,
        tool_names.join(", ")
    ));
    prompt.push_str(&format!("{} the input to the tool\n", ACTION_INPUT));
    prompt.push_str(&format!("{} the result of the tool\n", OBSERVATION));
    prompt.push_str("... (Thought/Action/Action Input/Observation can repeat)\n");
    prompt.push_str(&format!("{} the final answer to the request\n\n", FINAL_ANSWER));

    prompt.push_str("Begin!\n\n");
    prompt.push_str(&format!("Question: {}\n", input.trim()));
    prompt.push_str(scratchpad);
    prompt.push_str("Thought:");

    prompt
}

/// Prompt that demands an answer once the step budget is spent
pub fn build_forced_answer_prompt(
    input: &str,
    tool_descriptions: &str,
    tool_names: &[&str],
    scratchpad: &str,
) -> String {
    let mut prompt = build_agent_prompt(input, tool_descriptions, tool_names, scratchpad);
    prompt.push_str(" I have used all my tool calls and must answer now.\n");
    prompt.push_str(FINAL_ANSWER);
    prompt
}

/// Parse a model reply
///
/// A reply with neither a final answer nor a complete action is taken as the
/// final answer.
pub fn parse_agent_step(reply: &str) -> AgentStep {
    let reply = strip_observation(reply);

    if let Some(pos) = reply.find(FINAL_ANSWER) {
        return AgentStep::Final(reply[pos + FINAL_ANSWER.len()..].trim().to_string());
    }

    let tool = reply.lines().find_map(|line| {
        line.trim()
            .strip_prefix(ACTION)
            .map(|value| value.trim().to_string())
    });

    // The input runs to the end of the reply so multi-line code survives
    let input = reply
        .find(ACTION_INPUT)
        .map(|pos| reply[pos + ACTION_INPUT.len()..].trim().to_string());

    match (tool, input) {
        (Some(tool), Some(input)) if !tool.is_empty() => AgentStep::Action { tool, input },
        _ => AgentStep::Final(reply.trim().to_string()),
    }
}

/// Drop anything the model invented after its action
pub fn strip_observation(reply: &str) -> &str {
    match reply.find(OBSERVATION) {
        Some(pos) => &reply[..pos],
        None => reply,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_lists_tools_and_question() {
        let prompt = build_agent_prompt(
            "def f(x): return -x",
            "CodeExplainer: Explains code",
            &["CodeExplainer", "FlowVisualizer"],
            "",
        );

        assert!(prompt.contains("CodeExplainer: Explains code"));
        assert!(prompt.contains("one of [CodeExplainer, FlowVisualizer]"));
        assert!(prompt.contains("Question: def f(x): return -x\n"));
        assert!(prompt.ends_with("Thought:"));
    }

    #[test]
    fn test_forced_prompt_ends_with_final_answer() {
        let prompt = build_forced_answer_prompt("q", "", &[], "Observation: x\n");
        assert!(prompt.ends_with(FINAL_ANSWER));
        assert!(prompt.contains("Observation: x\n"));
    }

    #[test]
    fn test_parse_action() {
        let step = parse_agent_step(
            "I should look at the flow.\nAction: FlowVisualizer\nAction Input: if a:\n    go()",
        );
        assert_eq!(
            step,
            AgentStep::Action {
                tool: "FlowVisualizer".to_string(),
                input: "if a:\n    go()".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_final_answer() {
        let step = parse_agent_step("I know now.\nFinal Answer: the function negates x");
        assert_eq!(step, AgentStep::Final("the function negates x".to_string()));
    }

    #[test]
    fn test_invented_observation_is_ignored() {
        let step = parse_agent_step(
            "Action: CodeParser\nAction Input: def f(): pass\nObservation: made up\nFinal Answer: no",
        );
        assert!(matches!(step, AgentStep::Action { ref tool, .. } if tool == "CodeParser"));
    }

    #[test]
    fn test_unparseable_reply_is_final() {
        assert_eq!(
            parse_agent_step("  just some prose \n"),
            AgentStep::Final("just some prose".to_string())
        );
        assert_eq!(
            parse_agent_step("Action: CodeParser\n(no input given)"),
            AgentStep::Final("Action: CodeParser\n(no input given)".to_string())
        );
    }
}
