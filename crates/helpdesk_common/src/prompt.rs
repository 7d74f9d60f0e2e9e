//! Prompt construction for the local model.

use crate::context::SystemContext;

/// Behavioural instructions sent ahead of every question
pub const SYSTEM_PROMPT: &str = "You are an IT helpdesk assistant (Tier 1 support agent). \
Provide clear, step‑by‑step troubleshooting instructions for common technical issues. \
Your answers must not rely on any cloud or internet‑based services. \
Never ask the user to go online. \
Be concise and polite, and always include a check‑in question at the end \
to see if the instructions helped.";

/// Combine the system instructions with the user's question.
///
/// `_context` is accepted alongside the query; its fields are not part of
/// the prompt text.
pub fn build_prompt(_context: &SystemContext, user_query: &str) -> String {
    format!("{}\nUser: {}\nAssistant:", SYSTEM_PROMPT, user_query)
}
