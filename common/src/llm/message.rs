use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
}

/// one chat turn in the shape both chat apis accept
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// system turn followed by user turn; an empty system instruction is omitted
pub fn chat_messages(system: &str, user: &str) -> Vec<Message> {
    let mut messages = Vec::with_capacity(2);
    if !system.trim().is_empty() {
        messages.push(Message::system(system));
    }
    messages.push(Message::user(user));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation() {
        let msg = Message::system("test");
        assert_eq!(msg.role, MessageRole::System);
        assert_eq!(msg.content, "test");
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_value(Message::user("hallo")).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "hallo");
    }

    #[test]
    fn test_chat_messages_skips_blank_system() {
        assert_eq!(chat_messages("", "frage").len(), 1);

        let messages = chat_messages("du bist ein tutor", "frage");
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[1].role, MessageRole::User);
    }
}
