//! Prompt template for task suggestions.

/// Fill the suggestion template. Empty goals or notes get a placeholder.
pub fn build_prompt(goals: &str, notes: &str, query: &str) -> String {
    let goals = if goals.is_empty() { "No goals set" } else { goals };
    let notes = if notes.is_empty() {
        "No notes available"
    } else {
        notes
    };

    format!(
        r#"
You are an intelligent productivity assistant. Based on the user's goals and notes,
generate actionable task suggestions.

User's Goals:
{goals}

User's Notes:
{notes}

User's Query:
{query}

Please generate 3-5 specific, actionable task suggestions that align with the user's goals and context.

Return your response as a JSON array with the following structure:
[
  {{
    "title": "Task title",
    "reason": "Why this task aligns with their goals"
  }},
  ...
]

Only return valid JSON, no additional text.
"#
    )
}
