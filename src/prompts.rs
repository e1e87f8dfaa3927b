//! Prompt for the summarization activity.
//!
//! Centralising the template keeps the wire-visible prompt text in exactly
//! one place and lets unit tests assert against it without calling a real
//! completion service.

/// Template with a single substitution slot for the extracted text.
pub const SUMMARY_PROMPT_TEMPLATE: &str =
    "Can you explain what the following text is about? {text}";

/// Fill the template with extracted document text.
pub fn summary_prompt(text: &str) -> String {
    SUMMARY_PROMPT_TEMPLATE.replace("{text}", text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_text_verbatim() {
        assert_eq!(
            summary_prompt("Hello World"),
            "Can you explain what the following text is about? Hello World"
        );
    }

    #[test]
    fn empty_text_leaves_question_intact() {
        assert_eq!(
            summary_prompt(""),
            "Can you explain what the following text is about? "
        );
    }
}
