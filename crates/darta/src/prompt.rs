/// System instruction handed to the model when a session is created.
pub fn system_prompt() -> &'static str {
    include_str!("prompts/system.md")
}

/// Opening assistant message shown before any exchange has happened.
pub const GREETING: &str =
    "Hello! I am DARTA. Send me your sales, receipt photos, voice notes, or upload documents (PDF, CSV).";
