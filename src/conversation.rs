use crate::error::AgentError;
use crate::types::Message;
use uuid::Uuid;

/// The message sequence of a single chat request.
///
/// Invariants: at most one system message, and every tool result answers a
/// tool call made earlier in the same conversation.
#[derive(Debug, Clone)]
pub struct Conversation {
    id: String,
    messages: Vec<Message>,
}

impl Conversation {
    pub fn from_messages(messages: Vec<Message>) -> Result<Self, AgentError> {
        if messages.is_empty() {
            return Err(AgentError::invalid("messages must not be empty"));
        }
        let mut conversation = Conversation {
            id: Uuid::new_v4().to_string(),
            messages: Vec::with_capacity(messages.len() + 3),
        };
        for message in messages {
            conversation.push(message)?;
        }
        Ok(conversation)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn has_system_prompt(&self) -> bool {
        self.messages.iter().any(Message::is_system)
    }

    /// Puts `prompt` at the front unless a system message is already present.
    /// Returns whether one was inserted.
    pub fn ensure_system_prompt(&mut self, prompt: &str) -> bool {
        if self.has_system_prompt() {
            return false;
        }
        self.messages.insert(0, Message::system(prompt));
        true
    }

    // Append one message
    pub fn push(&mut self, message: Message) -> Result<(), AgentError> {
        match &message {
            Message::System { .. } if self.has_system_prompt() => {
                return Err(AgentError::invalid("only one system message is allowed"));
            }
            Message::Tool { tool_call_id, .. } if !self.knows_tool_call(tool_call_id) => {
                return Err(AgentError::invalid(format!(
                    "tool result references unknown tool call {:?}",
                    tool_call_id
                )));
            }
            _ => {}
        }
        self.messages.push(message);
        Ok(())
    }

    fn knows_tool_call(&self, id: &str) -> bool {
        self.messages
            .iter()
            .flat_map(Message::tool_calls)
            .any(|call| call.id == id)
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}
