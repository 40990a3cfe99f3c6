// =============================================================================
// Message Types
// =============================================================================

/// Speaker of a conversation turn as the generative service sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    User,
    Model,
}

impl MessageRole {
    /// Role string used on the wire.
    pub fn as_wire(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Model => "model",
        }
    }
}

/// One replayed turn of history: role and text only.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Model,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_map_to_wire_names() {
        assert_eq!(MessageRole::User.as_wire(), "user");
        assert_eq!(MessageRole::Model.as_wire(), "model");
    }

    #[test]
    fn constructors_set_role() {
        assert_eq!(Message::user("hi").role, MessageRole::User);
        assert_eq!(Message::model("hello").content, "hello");
    }
}
