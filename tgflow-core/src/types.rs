//! Update and payload types as delivered by the Bot API (`getUpdates` result items and webhook bodies).
//!
//! Payloads are decoded just far enough to classify and dispatch them; anything the engine does not
//! know about is kept as opaque JSON in [`UpdateKind::Other`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Scope label that matches every chat type.
pub const SCOPE_ALL: &str = "all";

/// User identity (id, names, bot flag).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

/// Chat identity. `kind` is the Bot API `type` field ("private", "group", "supergroup", "channel")
/// and doubles as the scope label for pattern handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub title: Option<String>,
    pub username: Option<String>,
}

/// A chat message (also used for edited messages and channel posts).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default)]
    pub date: i64,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
    pub caption: Option<String>,
}

impl Message {
    /// Text content, falling back to the media caption. Empty strings count as absent.
    pub fn content(&self) -> Option<&str> {
        self.text
            .as_deref()
            .or(self.caption.as_deref())
            .filter(|s| !s.is_empty())
    }

    /// Send time; `None` when the server did not provide a valid unix timestamp.
    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        if self.date <= 0 {
            return None;
        }
        DateTime::from_timestamp(self.date, 0)
    }
}

/// Inline keyboard button press.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<Message>,
    pub data: Option<String>,
    pub chat_instance: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOption {
    pub text: String,
    #[serde(default)]
    pub voter_count: i64,
}

/// Poll state snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub options: Vec<PollOption>,
    #[serde(default)]
    pub is_closed: bool,
    #[serde(default)]
    pub total_voter_count: i64,
}

/// A user's vote in a non-anonymous poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollAnswer {
    pub poll_id: String,
    pub user: Option<User>,
    #[serde(default)]
    pub option_ids: Vec<i32>,
}

/// Membership change. Old and new member objects are kept opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMemberUpdated {
    pub chat: Chat,
    pub from: User,
    #[serde(default)]
    pub date: i64,
    #[serde(default)]
    pub old_chat_member: Value,
    #[serde(default)]
    pub new_chat_member: Value,
}

/// The single payload carried by an [`Update`].
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateKind {
    Message(Message),
    EditedMessage(Message),
    ChannelPost(Message),
    EditedChannelPost(Message),
    CallbackQuery(CallbackQuery),
    Poll(Poll),
    PollAnswer(PollAnswer),
    MyChatMember(ChatMemberUpdated),
    ChatMember(ChatMemberUpdated),
    /// Any payload kind not modelled above, as the remaining JSON fields of the update object.
    Other(Value),
}

/// One incoming event: server-assigned sequence id plus exactly one payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawUpdate")]
pub struct Update {
    pub update_id: i64,
    pub kind: UpdateKind,
}

/// Wire shape: every payload is an optional top-level field.
#[derive(Deserialize)]
struct RawUpdate {
    update_id: i64,
    message: Option<Message>,
    edited_message: Option<Message>,
    channel_post: Option<Message>,
    edited_channel_post: Option<Message>,
    callback_query: Option<CallbackQuery>,
    poll: Option<Poll>,
    poll_answer: Option<PollAnswer>,
    my_chat_member: Option<ChatMemberUpdated>,
    chat_member: Option<ChatMemberUpdated>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

impl From<RawUpdate> for Update {
    fn from(raw: RawUpdate) -> Self {
        let kind = if let Some(m) = raw.message {
            UpdateKind::Message(m)
        } else if let Some(m) = raw.edited_message {
            UpdateKind::EditedMessage(m)
        } else if let Some(m) = raw.channel_post {
            UpdateKind::ChannelPost(m)
        } else if let Some(m) = raw.edited_channel_post {
            UpdateKind::EditedChannelPost(m)
        } else if let Some(q) = raw.callback_query {
            UpdateKind::CallbackQuery(q)
        } else if let Some(p) = raw.poll {
            UpdateKind::Poll(p)
        } else if let Some(a) = raw.poll_answer {
            UpdateKind::PollAnswer(a)
        } else if let Some(c) = raw.my_chat_member {
            UpdateKind::MyChatMember(c)
        } else if let Some(c) = raw.chat_member {
            UpdateKind::ChatMember(c)
        } else {
            UpdateKind::Other(Value::Object(raw.rest))
        };
        Self {
            update_id: raw.update_id,
            kind,
        }
    }
}

impl Update {
    /// The message-like payload, if any (message, edited message, channel post, edited channel post).
    pub fn message(&self) -> Option<&Message> {
        match &self.kind {
            UpdateKind::Message(m)
            | UpdateKind::EditedMessage(m)
            | UpdateKind::ChannelPost(m)
            | UpdateKind::EditedChannelPost(m) => Some(m),
            _ => None,
        }
    }

    /// Non-empty poll identifier, present only for poll updates.
    pub fn poll_id(&self) -> Option<&str> {
        match &self.kind {
            UpdateKind::Poll(p) if !p.id.is_empty() => Some(p.id.as_str()),
            _ => None,
        }
    }

    /// Callback query data, present only for callback updates that carry it.
    pub fn callback_data(&self) -> Option<&str> {
        match &self.kind {
            UpdateKind::CallbackQuery(q) => q.data.as_deref(),
            _ => None,
        }
    }

    /// Non-empty text content of a message-like payload.
    pub fn text(&self) -> Option<&str> {
        self.message().and_then(Message::content)
    }

    /// Scope label of the originating chat.
    pub fn scope(&self) -> Option<&str> {
        match &self.kind {
            UpdateKind::CallbackQuery(q) => q.message.as_ref().map(|m| m.chat.kind.as_str()),
            UpdateKind::MyChatMember(c) | UpdateKind::ChatMember(c) => Some(c.chat.kind.as_str()),
            _ => self.message().map(|m| m.chat.kind.as_str()),
        }
    }

    /// Short kind name for logs.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            UpdateKind::Message(_) => "message",
            UpdateKind::EditedMessage(_) => "edited_message",
            UpdateKind::ChannelPost(_) => "channel_post",
            UpdateKind::EditedChannelPost(_) => "edited_channel_post",
            UpdateKind::CallbackQuery(_) => "callback_query",
            UpdateKind::Poll(_) => "poll",
            UpdateKind::PollAnswer(_) => "poll_answer",
            UpdateKind::MyChatMember(_) => "my_chat_member",
            UpdateKind::ChatMember(_) => "chat_member",
            UpdateKind::Other(_) => "other",
        }
    }
}

/// Bot API response envelope: `{ok, result, description, error_code}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
}
