//! One chat turn end-to-end

use bytes::Bytes;
use std::sync::Arc;

use crate::generation::{PromptBuilder, ResponseStream, StreamingDispatcher, VisualContext};
use crate::ingestion::FileParser;
use crate::providers::LlmProvider;
use crate::retrieval::KeywordRetriever;
use crate::session::{Role, SharedSession};
use crate::storage::ProcessedLog;
use crate::types::{content::unsupported_message, ExtractedContent, FileType, PromptPayload};

/// Queries starting with this (ASCII case-insensitive) add a knowledge record
pub const KNOWLEDGE_COMMAND_PREFIX: &str = "add to knowledge base:";

/// Reply to a knowledge command with nothing after the prefix
pub const EMPTY_KNOWLEDGE_COMMAND: &str =
    "Error: No content provided to add to the knowledge base.";

/// Content of a knowledge command, trimmed; `None` if `query` is not one
pub fn parse_knowledge_command(query: &str) -> Option<&str> {
    let prefix = query.get(..KNOWLEDGE_COMMAND_PREFIX.len())?;
    if !prefix.eq_ignore_ascii_case(KNOWLEDGE_COMMAND_PREFIX) {
        return None;
    }
    Some(query[KNOWLEDGE_COMMAND_PREFIX.len()..].trim())
}

/// A file attached to a chat turn
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub data: Bytes,
}

impl Upload {
    pub fn new(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }
}

/// Drives command interception, extraction, state updates, retrieval,
/// prompt assembly and dispatch for each turn.
pub struct ChatEngine {
    llm: Arc<dyn LlmProvider>,
    parser: FileParser,
    retriever: KeywordRetriever,
    session: SharedSession,
    dispatcher: StreamingDispatcher,
    processed_log: Option<Arc<ProcessedLog>>,
}

impl ChatEngine {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        parser: FileParser,
        retriever: KeywordRetriever,
        session: SharedSession,
        processed_log: Option<Arc<ProcessedLog>>,
    ) -> Self {
        let dispatcher = StreamingDispatcher::new(Arc::clone(&llm), session.clone());
        Self {
            llm,
            parser,
            retriever,
            session,
            dispatcher,
            processed_log,
        }
    }

    /// Session shared with the HTTP layer
    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    /// Generation provider
    pub fn llm(&self) -> &Arc<dyn LlmProvider> {
        &self.llm
    }

    /// Process one turn and return the caller-visible fragment stream.
    ///
    /// Knowledge commands and unsupported uploads answer immediately without
    /// contacting the backend.
    pub async fn handle_turn(&self, query: &str, upload: Option<Upload>) -> ResponseStream {
        if let Some(content) = parse_knowledge_command(query) {
            return single(self.add_knowledge(query, content));
        }

        let upload = upload.filter(|u| !u.filename.is_empty());

        let mut extracted = None;
        if let Some(upload) = upload {
            let filename = upload.filename.to_lowercase();

            if !FileType::from_filename(&filename).is_supported() {
                let message = unsupported_message(&filename);
                tracing::warn!("Rejected upload: {}", message);
                self.log_extraction(&filename, &message).await;
                return single(message);
            }

            self.session.record_turn(Role::User, query);

            let content = self.parser.extract(&filename, upload.data).await;
            self.log_extraction(&filename, &content.render()).await;
            if let Some(line) = content.history_line() {
                self.session.record_turn(Role::Bot, &line);
            }
            extracted = Some(content);
        } else {
            self.session.record_turn(Role::User, query);
        }

        let image = extracted
            .as_ref()
            .and_then(ExtractedContent::image_base64)
            .map(str::to_string);

        let retrieved = self
            .session
            .with_knowledge(|store| self.retriever.retrieve(store, query));
        let (history, last_visual) = self.session.context_snapshot();

        let visual = VisualContext::select(image.is_some(), last_visual.as_deref());
        let prompt = PromptBuilder::build_chat_prompt(&history, visual, &retrieved, query);

        tracing::info!(
            "Dispatching turn: {} retrieved record(s), visual context: {:?}",
            retrieved.len(),
            match visual {
                VisualContext::AttachedImage => "attached image",
                VisualContext::Carried(_) => "carried",
                VisualContext::Absent => "none",
            }
        );

        let payload = PromptPayload::streaming(self.llm.model(), prompt, image);
        self.dispatcher.dispatch(payload)
    }

    fn add_knowledge(&self, query: &str, content: &str) -> String {
        if content.is_empty() {
            tracing::warn!("Knowledge command without content");
            return EMPTY_KNOWLEDGE_COMMAND.to_string();
        }

        let response = self.session.with_knowledge(|store| store.add(content));
        tracing::info!("{}", response);

        self.session.record_turn(Role::User, query);
        self.session.record_turn(Role::Bot, &response);
        response
    }

    async fn log_extraction(&self, filename: &str, content: &str) {
        if let Some(log) = &self.processed_log {
            if let Err(e) = log.append(filename, content).await {
                tracing::warn!("Failed to write {}: {}", log.path().display(), e);
            }
        }
    }
}

fn single(text: String) -> ResponseStream {
    Box::pin(futures::stream::once(futures::future::ready(text)))
}
