//! Conversation turns and roles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person asking questions.
    User,
    /// The model's answer.
    Assistant,
}

impl Role {
    /// Lowercase name, as stored and serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Who wrote the turn.
    pub role: Role,
    /// The message text, exactly as recorded.
    pub content: String,
}

impl ConversationTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }

    /// Shorthand for a [`Role::User`] turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Shorthand for a [`Role::Assistant`] turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// A conversation and its full, untruncated list of turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Caller-chosen identifier.
    pub id: String,
    /// Every turn, oldest first.
    pub turns: Vec<ConversationTurn>,
}

impl Conversation {
    /// An empty conversation.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), turns: Vec::new() }
    }
}

/// The most recent `max_turns` turns of `turns`, oldest first.
pub fn recent_turns(turns: &[ConversationTurn], max_turns: usize) -> Vec<ConversationTurn> {
    let start = turns.len().saturating_sub(max_turns);
    turns[start..].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_roundtrips_through_its_name() {
        for role in [Role::User, Role::Assistant] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("system".parse::<Role>().is_err());
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&ConversationTurn::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }

    #[test]
    fn recent_turns_keeps_the_tail_in_order() {
        let turns: Vec<_> = (0..4).map(|i| ConversationTurn::user(i.to_string())).collect();
        let tail = recent_turns(&turns, 2);
        assert_eq!(tail, vec![ConversationTurn::user("2"), ConversationTurn::user("3")]);
        assert_eq!(recent_turns(&turns, 10).len(), 4);
        assert!(recent_turns(&turns, 0).is_empty());
    }
}
