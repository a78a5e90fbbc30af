use crate::catalog::Product;
use crate::markup::{render_markup, RenderedMarkup};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

pub mod transport;

use transport::{ChatError, ChatResponse};

pub const ADVISOR_SYSTEM_PROMPT: &str = "
You are a professional skincare and beauty product advisor specializing in L'Oréal portfolio brands including CeraVe, La Roche-Posay, Vichy, Lancôme, Urban Decay, Maybelline, and other L'Oréal owned brands.

When users ask about routines or products, provide helpful, detailed advice about:
- Skincare routines and product order
- Product benefits and ingredients
- Skin type recommendations
- How to use products effectively
- Compatibility between products

You should focus on the products available in our catalog and provide practical, actionable skincare advice. If someone asks about topics unrelated to skincare, beauty, or our product range, politely redirect them back to skincare and beauty topics.
";

pub const GREETING: &str = "👋 Hello! How can I help you today? You can search for products above and select them to build a routine!";

pub const NO_RESPONSE_NOTICE: &str = "⚠️ No response from AI.";

const ROUTINE_REQUEST_PREFIX: &str = "Please create a skincare routine using these products: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// One bubble of the on-screen conversation.
///
/// `Notice` turns are assistant-side text produced locally (greeting, failures).
/// They are shown but never replayed to the endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Turn {
    User { text: String },
    Assistant { text: String, rendered: RenderedMarkup },
    Notice { text: String, rendered: RenderedMarkup },
}

impl Turn {
    fn assistant(text: String) -> Self {
        let rendered = render_markup(&text);
        Self::Assistant { text, rendered }
    }

    fn notice(text: String) -> Self {
        let rendered = render_markup(&text);
        Self::Notice { text, rendered }
    }

    pub fn role(&self) -> Role {
        match self {
            Self::User { .. } => Role::User,
            Self::Assistant { .. } | Self::Notice { .. } => Role::Assistant,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::User { text } | Self::Assistant { text, .. } | Self::Notice { text, .. } => text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    AwaitingResponse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("nothing to send")]
    EmptyInput,
    #[error("a response is still pending")]
    Busy,
}

/// Snapshot of the history to send for one request cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub messages: Vec<Message>,
}

pub fn routine_request(selection: &[Arc<Product>]) -> String {
    let names = selection
        .iter()
        .map(|product| product.display_name())
        .collect::<Vec<_>>()
        .join(", ");
    format!("{ROUTINE_REQUEST_PREFIX}{names}")
}

/// Message history replayed to the endpoint plus the turns shown on screen.
#[derive(Debug, Clone)]
pub struct Conversation {
    history: Vec<Message>,
    turns: Vec<Turn>,
    state: CycleState,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self::with_system_prompt(ADVISOR_SYSTEM_PROMPT)
    }

    pub fn with_system_prompt(system_prompt: &str) -> Self {
        Self {
            history: vec![Message::new(Role::System, system_prompt)],
            turns: vec![Turn::notice(GREETING.to_string())],
            state: CycleState::Idle,
        }
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    pub fn is_awaiting_response(&self) -> bool {
        self.state == CycleState::AwaitingResponse
    }

    pub fn submit_user_text(&mut self, text: &str) -> Result<PendingRequest, SubmitError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SubmitError::EmptyInput);
        }
        self.begin_cycle(text.to_string())
    }

    pub fn submit_selection_prompt(
        &mut self,
        selection: &[Arc<Product>],
    ) -> Result<PendingRequest, SubmitError> {
        if selection.is_empty() {
            return Err(SubmitError::EmptyInput);
        }
        self.begin_cycle(routine_request(selection))
    }

    fn begin_cycle(&mut self, text: String) -> Result<PendingRequest, SubmitError> {
        if self.is_awaiting_response() {
            tracing::warn!("submission rejected while awaiting response");
            return Err(SubmitError::Busy);
        }

        self.history.push(Message::new(Role::User, text.clone()));
        self.turns.push(Turn::User { text });
        self.state = CycleState::AwaitingResponse;
        tracing::info!(history = self.history.len(), "request cycle started");

        Ok(PendingRequest {
            messages: self.history.clone(),
        })
    }

    /// Closes the outstanding cycle. Returns `None` when no cycle was outstanding.
    pub fn complete_cycle(
        &mut self,
        outcome: Result<ChatResponse, ChatError>,
    ) -> Option<&Turn> {
        if !self.is_awaiting_response() {
            tracing::warn!("completion arrived with no request outstanding");
            return None;
        }
        self.state = CycleState::Idle;

        let turn = match outcome {
            Ok(response) => {
                let text = response
                    .primary_text()
                    .unwrap_or(NO_RESPONSE_NOTICE)
                    .to_string();
                self.history
                    .push(Message::new(Role::Assistant, text.clone()));
                tracing::info!(history = self.history.len(), "request cycle completed");
                Turn::assistant(text)
            }
            Err(err) => {
                // Failure notices stay off the replayed history.
                tracing::error!(error = %err, "request cycle failed");
                Turn::notice(format!("⚠️ Error: {err}"))
            }
        };
        self.turns.push(turn);
        self.turns.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::{product, sample_catalog};
    use crate::catalog::selection::SelectionSet;
    use crate::markup::{Inline, Node};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use super::transport::{ChatChoice, ChatTransport, ChoiceMessage};

    fn reply(content: &str) -> ChatResponse {
        ChatResponse {
            choices: vec![ChatChoice {
                message: Some(ChoiceMessage {
                    content: Some(content.to_string()),
                }),
            }],
        }
    }

    struct ScriptedTransport {
        replies: Mutex<Vec<Result<ChatResponse, ChatError>>>,
        seen: Mutex<Vec<Vec<Message>>>,
    }

    impl ScriptedTransport {
        fn new(mut replies: Vec<Result<ChatResponse, ChatError>>) -> Self {
            replies.reverse();
            Self {
                replies: Mutex::new(replies),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatTransport for ScriptedTransport {
        async fn complete(&self, messages: &[Message]) -> Result<ChatResponse, ChatError> {
            self.seen
                .lock()
                .expect("seen lock")
                .push(messages.to_vec());
            self.replies
                .lock()
                .expect("replies lock")
                .pop()
                .unwrap_or_else(|| Err(ChatError::Request("script exhausted".to_string())))
        }
    }

    #[test]
    fn conversation_starts_with_system_prompt_and_greeting() {
        let conversation = Conversation::new();
        assert_eq!(conversation.history().len(), 1);
        assert_eq!(conversation.history()[0].role, Role::System);
        assert_eq!(conversation.turns().len(), 1);
        assert!(matches!(conversation.turns()[0], Turn::Notice { .. }));
        assert_eq!(conversation.turns()[0].text(), GREETING);
        assert_eq!(conversation.state(), CycleState::Idle);
    }

    #[test]
    fn blank_text_is_rejected_without_touching_history() {
        let mut conversation = Conversation::new();
        for blank in ["", "   ", "\n\t "] {
            assert_eq!(
                conversation.submit_user_text(blank),
                Err(SubmitError::EmptyInput)
            );
        }
        assert_eq!(conversation.history().len(), 1);
        assert_eq!(conversation.turns().len(), 1);
        assert_eq!(conversation.state(), CycleState::Idle);
    }

    #[test]
    fn submission_appends_trimmed_user_message_and_snapshots_history() {
        let mut conversation = Conversation::new();
        let pending = conversation
            .submit_user_text("  Which serum for dry skin?  ")
            .expect("non-empty text should submit");

        assert_eq!(conversation.state(), CycleState::AwaitingResponse);
        assert_eq!(pending.messages, conversation.history());
        assert_eq!(
            pending.messages.last(),
            Some(&Message::new(Role::User, "Which serum for dry skin?"))
        );
        assert_eq!(
            conversation.turns().last(),
            Some(&Turn::User {
                text: "Which serum for dry skin?".to_string()
            })
        );
    }

    #[test]
    fn user_text_is_never_interpreted_as_markup() {
        let mut conversation = Conversation::new();
        conversation
            .submit_user_text("**bold** - not a list")
            .expect("text should submit");
        assert_eq!(
            conversation.turns().last(),
            Some(&Turn::User {
                text: "**bold** - not a list".to_string()
            })
        );
    }

    #[test]
    fn selection_prompt_lists_brand_and_name() {
        let selection = vec![
            Arc::new(product(1, "CeraVe", "Moisturizing Cream", "moisturizer")),
            Arc::new(product(2, "La Roche-Posay", "Anthelios", "suncare")),
        ];
        let mut conversation = Conversation::new();
        let pending = conversation
            .submit_selection_prompt(&selection)
            .expect("selection should submit");

        assert_eq!(
            pending.messages.last().map(|message| message.content.as_str()),
            Some(
                "Please create a skincare routine using these products: CeraVe Moisturizing Cream, La Roche-Posay Anthelios"
            )
        );
    }

    #[test]
    fn selection_prompt_follows_selection_order() {
        let catalog = sample_catalog();
        let mut selection = SelectionSet::new();
        selection.toggle(2, &catalog);
        selection.toggle(1, &catalog);

        assert_eq!(
            routine_request(selection.members()),
            "Please create a skincare routine using these products: La Roche-Posay Anthelios, CeraVe Moisturizing Cream"
        );
    }

    #[test]
    fn empty_selection_is_rejected() {
        let mut conversation = Conversation::new();
        assert_eq!(
            conversation.submit_selection_prompt(&[]),
            Err(SubmitError::EmptyInput)
        );
        assert_eq!(conversation.history().len(), 1);
    }

    #[test]
    fn second_submission_while_awaiting_is_rejected() {
        let mut conversation = Conversation::new();
        conversation
            .submit_user_text("first")
            .expect("first submission should start a cycle");

        assert_eq!(
            conversation.submit_user_text("second"),
            Err(SubmitError::Busy)
        );
        assert_eq!(conversation.history().len(), 2);
        assert_eq!(conversation.turns().len(), 2);
    }

    #[test]
    fn successful_reply_is_rendered_and_recorded() {
        let mut conversation = Conversation::new();
        conversation.submit_user_text("routine?").expect("submit");

        let turn = conversation
            .complete_cycle(Ok(reply("  **Step 1:** Cleanse\n- Use warm water  ")))
            .cloned()
            .expect("cycle was outstanding");

        let Turn::Assistant { text, rendered } = turn else {
            panic!("expected assistant turn");
        };
        assert_eq!(text, "**Step 1:** Cleanse\n- Use warm water");
        assert_eq!(
            rendered.nodes[0],
            Node::Inline(Inline::Bold(vec![Inline::Text("Step 1:".to_string())]))
        );
        assert_eq!(
            conversation.history().last(),
            Some(&Message::new(Role::Assistant, text))
        );
        assert_eq!(conversation.state(), CycleState::Idle);
    }

    #[test]
    fn missing_reply_content_uses_sentinel() {
        let mut conversation = Conversation::new();
        conversation.submit_user_text("hello").expect("submit");
        conversation.complete_cycle(Ok(ChatResponse::default()));

        assert_eq!(
            conversation.history().last(),
            Some(&Message::new(Role::Assistant, NO_RESPONSE_NOTICE))
        );
        assert!(matches!(
            conversation.turns().last(),
            Some(Turn::Assistant { .. })
        ));
    }

    #[test]
    fn transport_failure_appends_one_notice_and_returns_to_idle() {
        let mut conversation = Conversation::new();
        conversation.submit_user_text("hello").expect("submit");
        let history_before = conversation.history().len();
        let turns_before = conversation.turns().len();

        let turn = conversation
            .complete_cycle(Err(ChatError::Status { status: 500 }))
            .cloned()
            .expect("cycle was outstanding");

        assert_eq!(turn.role(), Role::Assistant);
        assert_eq!(turn.text(), "⚠️ Error: Server error: 500");
        assert!(matches!(turn, Turn::Notice { .. }));
        assert_eq!(conversation.turns().len(), turns_before + 1);
        assert_eq!(conversation.history().len(), history_before);
        assert_eq!(conversation.state(), CycleState::Idle);

        conversation
            .submit_user_text("again")
            .expect("idle conversation should accept a new submission");
    }

    #[test]
    fn failure_notice_is_not_replayed_upstream() {
        let mut conversation = Conversation::new();
        conversation.submit_user_text("first").expect("submit");
        conversation.complete_cycle(Err(ChatError::Request("offline".to_string())));

        let pending = conversation.submit_user_text("second").expect("submit");
        let roles: Vec<Role> = pending.messages.iter().map(|message| message.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::User]);
        assert!(pending
            .messages
            .iter()
            .all(|message| !message.content.contains("offline")));
        assert!(conversation
            .turns()
            .iter()
            .any(|turn| turn.text() == "⚠️ Error: Request failed: offline"));
    }

    #[test]
    fn completion_without_outstanding_cycle_is_ignored() {
        let mut conversation = Conversation::new();
        assert!(conversation.complete_cycle(Ok(reply("stray"))).is_none());
        assert_eq!(conversation.history().len(), 1);
        assert_eq!(conversation.turns().len(), 1);
    }

    #[tokio::test]
    async fn cycles_replay_whole_history_through_transport() {
        let transport = ScriptedTransport::new(vec![
            Ok(reply("Try a gentle cleanser.")),
            Err(ChatError::Status { status: 503 }),
            Ok(reply("Apply SPF last.")),
        ]);
        let mut conversation = Conversation::with_system_prompt("advisor");

        for text in ["cleanser?", "serum?", "sunscreen?"] {
            let pending = conversation.submit_user_text(text).expect("submit");
            let outcome = transport.complete(&pending.messages).await;
            conversation.complete_cycle(outcome);
        }

        let seen = transport.seen.lock().expect("seen lock");
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].len(), 2);
        assert_eq!(seen[1].len(), 4);
        // The failed second cycle left only its user message behind.
        assert_eq!(seen[2].len(), 5);
        assert_eq!(seen[2][4], Message::new(Role::User, "sunscreen?"));

        let history = conversation.history();
        assert_eq!(history.len(), 6);
        assert_eq!(history[5], Message::new(Role::Assistant, "Apply SPF last."));
        assert_eq!(conversation.turns().len(), 7);
    }

    #[test]
    fn messages_serialize_with_lowercase_roles() {
        let value = serde_json::to_value(Message::new(Role::Assistant, "ok"))
            .expect("message should serialize");
        assert_eq!(value, serde_json::json!({"role": "assistant", "content": "ok"}));
    }
}
