//! Context assembly for the chat prompt

use crate::types::KnowledgeRecord;

/// Shown in place of retrieved documents when nothing matched
pub const NO_RELEVANT_DOCUMENTS: &str = "No relevant documents found in the knowledge base.";

/// Marker placed in the prompt when this turn carries an image
pub const IMAGE_CONTEXT_MARKER: &str =
    "[Image Context: The previous image is part of this conversation.]";

/// Fixed answer instruction closing every prompt
pub const ANSWER_INSTRUCTION: &str = "If this is a video, provide a concise summary of its overall content, focusing on the main theme, key elements (like settings, characters, actions, and objects), and identify the company being advertised if it’s an ad. Use the retrieved context to provide additional information if relevant. Do not mention frame-by-frame analysis or specific frame details.";

/// Which visual context line, if any, goes into the prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualContext<'a> {
    /// An image is attached to this turn
    AttachedImage,
    /// Summary carried over from an earlier image turn
    Carried(&'a str),
    /// No visual context at all
    Absent,
}

impl<'a> VisualContext<'a> {
    /// An attached image wins over a cached summary
    pub fn select(has_image: bool, last_visual_context: Option<&'a str>) -> Self {
        match (has_image, last_visual_context) {
            (true, _) => Self::AttachedImage,
            (false, Some(summary)) => Self::Carried(summary),
            (false, None) => Self::Absent,
        }
    }
}

/// Prompt builder for chat turns
pub struct PromptBuilder;

impl PromptBuilder {
    /// Render retrieved records, one `Retrieved Document {id}: ...` line each
    pub fn build_retrieved_context(records: &[KnowledgeRecord]) -> String {
        if records.is_empty() {
            return NO_RELEVANT_DOCUMENTS.to_string();
        }

        records
            .iter()
            .map(KnowledgeRecord::prompt_line)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Merge history, visual context, retrieved records and the query.
    ///
    /// Extracted file content reaches the prompt through `history`, where it
    /// was folded in as a `Bot:` line.
    pub fn build_chat_prompt(
        history: &str,
        visual: VisualContext<'_>,
        retrieved: &[KnowledgeRecord],
        query: &str,
    ) -> String {
        let mut prompt = format!("{}\n", history);

        match visual {
            VisualContext::AttachedImage => {
                prompt.push_str(IMAGE_CONTEXT_MARKER);
                prompt.push('\n');
            }
            VisualContext::Carried(summary) => {
                prompt.push_str(&format!("[Context: {}]\n", summary));
            }
            VisualContext::Absent => {}
        }

        prompt.push_str(&format!(
            "Additional Context from Knowledge Base:\n{retrieved}\nQuery: {query}\nAnswer: {instruction}",
            retrieved = Self::build_retrieved_context(retrieved),
            query = query,
            instruction = ANSWER_INSTRUCTION,
        ));

        prompt
    }
}
