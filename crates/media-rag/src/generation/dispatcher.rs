//! Streaming dispatcher: relays backend fragments and updates session state

use futures::stream::BoxStream;
use futures_util::StreamExt;
use std::sync::Arc;

use crate::providers::LlmProvider;
use crate::session::{Role, SharedSession};
use crate::types::PromptPayload;

/// Caller-visible text fragments for one turn
pub type ResponseStream = BoxStream<'static, String>;

/// Sends the assembled payload and forwards fragments as they arrive.
///
/// The forwarded stream and the accumulated reply advance together. Once the
/// backend closes the stream the reply becomes the `Bot:` line and, for image
/// turns, the cached visual context. A backend failure yields one diagnostic
/// fragment which is also recorded as the `Bot:` line.
#[derive(Clone)]
pub struct StreamingDispatcher {
    llm: Arc<dyn LlmProvider>,
    session: SharedSession,
}

impl StreamingDispatcher {
    pub fn new(llm: Arc<dyn LlmProvider>, session: SharedSession) -> Self {
        Self { llm, session }
    }

    pub fn dispatch(&self, payload: PromptPayload) -> ResponseStream {
        let llm = Arc::clone(&self.llm);
        let session = self.session.clone();
        let had_image = payload.has_image();

        Box::pin(async_stream::stream! {
            let mut reply = String::new();

            let failure = match llm.generate_stream(payload).await {
                Ok(mut fragments) => {
                    let mut failure = None;
                    while let Some(item) = fragments.next().await {
                        match item {
                            Ok(fragment) => {
                                reply.push_str(&fragment);
                                yield fragment;
                            }
                            Err(e) => {
                                failure = Some(e);
                                break;
                            }
                        }
                    }
                    failure
                }
                Err(e) => Some(e),
            };

            match failure {
                None => {
                    tracing::debug!("Stream completed ({} chars)", reply.len());
                    session.complete_turn(&reply, had_image);
                }
                Some(e) => {
                    tracing::error!("Generation via {} failed: {}", llm.name(), e);
                    let message = e.diagnostic();
                    session.record_turn(Role::Bot, &message);
                    yield message;
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeLlm;

    fn payload(image: Option<&str>) -> PromptPayload {
        PromptPayload::streaming("llava:7b", "prompt", image.map(str::to_string))
    }

    #[tokio::test]
    async fn test_fragments_forwarded_in_order() {
        let session = SharedSession::new(3);
        let dispatcher =
            StreamingDispatcher::new(Arc::new(FakeLlm::replying(&["Hel", "lo"])), session.clone());

        let received: Vec<String> = dispatcher.dispatch(payload(None)).collect().await;
        assert_eq!(received, vec!["Hel", "lo"]);

        let (history, visual) = session.context_snapshot();
        assert_eq!(history, "Bot: Hello");
        assert_eq!(visual, None);
    }

    #[tokio::test]
    async fn test_image_turn_overwrites_visual_context() {
        let session = SharedSession::new(3);
        session.with_conversation(|c| c.set_visual_context("old summary".to_string()));

        let dispatcher = StreamingDispatcher::new(
            Arc::new(FakeLlm::replying(&["A blue ", "bottle."])),
            session.clone(),
        );
        let _: Vec<String> = dispatcher.dispatch(payload(Some("aW1n"))).collect().await;

        let (_, visual) = session.context_snapshot();
        assert_eq!(visual.as_deref(), Some("A blue bottle."));
    }

    #[tokio::test]
    async fn test_text_turn_leaves_visual_context() {
        let session = SharedSession::new(3);
        session.with_conversation(|c| c.set_visual_context("old summary".to_string()));

        let dispatcher =
            StreamingDispatcher::new(Arc::new(FakeLlm::replying(&["sure"])), session.clone());
        let _: Vec<String> = dispatcher.dispatch(payload(None)).collect().await;

        let (history, visual) = session.context_snapshot();
        assert_eq!(history, "Bot: sure");
        assert_eq!(visual.as_deref(), Some("old summary"));
    }

    #[tokio::test]
    async fn test_connection_failure_yields_single_diagnostic() {
        let session = SharedSession::new(3);
        let dispatcher =
            StreamingDispatcher::new(Arc::new(FakeLlm::unreachable()), session.clone());

        let received: Vec<String> = dispatcher.dispatch(payload(Some("aW1n"))).collect().await;
        assert_eq!(received.len(), 1);
        assert!(received[0].starts_with("Error: "));

        let (history, visual) = session.context_snapshot();
        assert_eq!(history, format!("Bot: {}", received[0]));
        assert_eq!(visual, None);
    }

    #[tokio::test]
    async fn test_mid_stream_failure_replaces_remaining_content() {
        let session = SharedSession::new(3);
        let dispatcher = StreamingDispatcher::new(
            Arc::new(FakeLlm::failing_after(&["partial "])),
            session.clone(),
        );

        let received: Vec<String> = dispatcher.dispatch(payload(None)).collect().await;
        assert_eq!(received.len(), 2);
        assert_eq!(received[0], "partial ");
        assert!(received[1].starts_with("Error: "));

        let (history, _) = session.context_snapshot();
        assert_eq!(history, format!("Bot: {}", received[1]));
    }
}
