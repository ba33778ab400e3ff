use serde::{Deserialize, Serialize};

use crate::domain::user::UserId;

/// A channel message as delivered by the message pipeline. The fetch
/// aggregator only cares about `user_id`; the rest rides along for rendering.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub channel_id: String,
    pub user_id: UserId,
    pub message: String,
    #[serde(default)]
    pub create_at: i64,
}

impl Post {
    pub fn new(
        id: impl Into<String>,
        channel_id: impl Into<String>,
        user_id: impl Into<UserId>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            channel_id: channel_id.into(),
            user_id: user_id.into(),
            message: message.into(),
            create_at: 0,
        }
    }
}
