//! Prompt assembly for the analysis step.
//!
//! The persona and the work itself come from the crew configuration
//! ([`crate::crew`]); this module only adds the fixed framing around them:
//! how an agent is introduced to the model, and the output contract the
//! answer must follow so it can be parsed into an
//! [`crate::output::AnalysisResult`].

use crate::crew::{interpolate, CrewConfig};
use crate::error::BriefError;

/// Output contract appended to every task.
///
/// Field names must match [`crate::output::AnalysisResult`] exactly.
pub const OUTPUT_CONTRACT: &str = r#"Respond with ONE JSON object and nothing else: no prose before or after it, no Markdown fences.
The object must have exactly these fields:

{
  "summary": string,                          // narrative summary of the whole document
  "key_points": [string, ...],                // ordered, most important first
  "quick_summary": string,                    // one or two sentences
  "extended_summary": string,                 // several paragraphs
  "actionable_insights": [string, ...],       // ordered, most valuable first
  "source_document_list": [string, ...],      // sources cited by the document; [] if none
  "potential_biases_and_limitations": string
}

Use only information found in the document. Write every field in the document's language."#;

/// The two messages of an analysis call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisPrompt {
    pub system: String,
    pub user: String,
}

/// Build the system and user messages for the selected task of `crew`.
///
/// The system message introduces the agent; the user message carries the
/// task description (with `{document}` filled in), the expected output and
/// the JSON contract.
pub fn build_analysis_prompt(crew: &CrewConfig, markdown: &str) -> Result<AnalysisPrompt, BriefError> {
    let (agent, task) = crew.selected()?;
    let inputs = [("document", markdown)];

    let role = interpolate(agent.role.trim(), &inputs)?;
    let goal = interpolate(agent.goal.trim(), &inputs)?;
    let backstory = interpolate(agent.backstory.trim(), &inputs)?;
    let system = format!("You are {role}. {backstory}\nYour personal goal is: {goal}");

    let description = interpolate(task.description.trim(), &inputs)?;
    let expected = interpolate(task.expected_output.trim(), &inputs)?;
    let user = format!(
        "{description}\n\nThis is the expected criteria for your final answer: {expected}\n\n{OUTPUT_CONTRACT}"
    );

    Ok(AnalysisPrompt { system, user })
}
