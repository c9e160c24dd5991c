//! Conversation assembly.
//!
//! A round's conversation is rebuilt from the input bundle every time:
//! the spec as the opening user turn, the previous answer as the assistant
//! turn, and the fix note and/or execution log as the closing user turn.

use crate::bundle::InputBundle;
use crate::config::GenerationTarget;
use crate::provider::{ChatMessage, Role};
use tracing::debug;

/// Closing turn used when the previous round produced output but the user
/// gave neither a fix note nor a log.
pub const DEFAULT_FOLLOW_UP: &str = "Please review the program and improve it.";

/// Ordered messages sent with one completion request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    /// Assemble the conversation for one round
    pub fn build(bundle: &InputBundle, target: &GenerationTarget) -> Self {
        let mut messages = Vec::new();

        if !bundle.spec.is_empty() {
            messages.push(ChatMessage::user(&bundle.spec));
        }

        if let Some(previous) = prior_output(bundle, target) {
            messages.push(ChatMessage::assistant(previous));
            messages.push(ChatMessage::user(follow_up(bundle)));
        }

        Self { messages }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<ChatMessage> {
        self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Log every turn at debug level
    pub fn trace(&self) {
        for m in &self.messages {
            debug!(role = m.role.as_str(), content = %m.content, "conversation turn");
        }
    }

    /// Count of turns with the given role
    pub fn count(&self, role: Role) -> usize {
        self.messages.iter().filter(|m| m.role == role).count()
    }
}

/// Wrap source in a fence tagged for `language`
pub fn fence_source(source: &str, language: &str) -> String {
    format!("\n```{}\n{}\n```\n", language, source)
}

fn prior_output(bundle: &InputBundle, target: &GenerationTarget) -> Option<String> {
    if !bundle.prior_explanation.is_empty() {
        Some(bundle.prior_explanation.clone())
    } else if !bundle.prior_source.is_empty() {
        Some(fence_source(&bundle.prior_source, &target.language))
    } else {
        None
    }
}

fn follow_up(bundle: &InputBundle) -> String {
    let mut reply = String::new();

    if !bundle.fix.is_empty() {
        reply.push_str(&bundle.fix);
        reply.push('\n');
    }

    if !bundle.log.is_empty() {
        reply.push_str(&format!(
            "\nWhen I ran the program and it produced the following log output:\n```\n{}\n```\n",
            bundle.log
        ));
    }

    if reply.is_empty() {
        reply.push_str(DEFAULT_FOLLOW_UP);
    }

    reply
}
