//! Saved assistant conversations, one list per account.

use chrono::Local;
use tracing::{debug, info};

use crate::model::{ChatHistory, ChatHistoryId, ChatMessage, ChatRole, User};
use crate::ports::StoreError;
use crate::service::{JemputService, ServiceError};

/// Title used when a conversation has no question yet.
pub const DEFAULT_HISTORY_TITLE: &str = "Percakapan Baru";

/// Most conversations returned by [`JemputService::chat_histories`].
pub const HISTORY_LIST_LIMIT: usize = 50;

/// Longest title kept verbatim, in characters.
const TITLE_MAX_CHARS: usize = 50;

/// Characters kept before the ellipsis when a title is shortened.
const TITLE_HEAD_CHARS: usize = 47;

/// Title derived from the first question of a transcript.
///
/// Questions longer than 50 characters are cut to 47 followed by `...`.
#[must_use]
pub fn history_title(messages: &[ChatMessage]) -> String {
    let question = messages
        .iter()
        .find(|message| message.role == ChatRole::User)
        .map(|message| message.content.trim())
        .filter(|content| !content.is_empty());
    match question {
        Some(content) if content.chars().count() > TITLE_MAX_CHARS => {
            let head: String = content.chars().take(TITLE_HEAD_CHARS).collect();
            format!("{head}...")
        }
        Some(content) => content.to_owned(),
        None => DEFAULT_HISTORY_TITLE.to_owned(),
    }
}

impl JemputService {
    /// Store the transcript of the active conversation.
    ///
    /// With `id` set the saved transcript is replaced and the title kept;
    /// otherwise (or when that conversation was deleted meanwhile) a new one
    /// is created and titled from its first question. A transcript without
    /// any question is not saved and yields `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Forbidden`] when `id` belongs to another
    /// account, and [`ServiceError::Store`] when a read or write fails.
    pub async fn save_chat_history(
        &self,
        actor: &User,
        id: Option<&ChatHistoryId>,
        messages: &[ChatMessage],
    ) -> Result<Option<ChatHistory>, ServiceError> {
        if !messages.iter().any(|message| message.role == ChatRole::User) {
            debug!(user_id = %actor.id, "nothing to save in chat history");
            return Ok(None);
        }
        let now = Local::now().naive_local();

        let stored = match id {
            Some(id) => self.stores.histories.history(id).await?,
            None => None,
        };
        if let Some(stored) = stored {
            if stored.user_id != actor.id {
                return Err(ServiceError::Forbidden);
            }
            let history = ChatHistory {
                last_modified: now,
                messages: messages.to_vec(),
                ..stored
            };
            self.stores.histories.replace_history(history.clone()).await?;
            debug!(
                history_id = %history.id,
                messages = history.messages.len(),
                "chat history updated"
            );
            return Ok(Some(history));
        }

        let history = ChatHistory {
            id: ChatHistoryId(self.stores.ids.next_id()),
            user_id: actor.id.clone(),
            title: history_title(messages),
            created_at: now,
            last_modified: now,
            messages: messages.to_vec(),
        };
        self.stores.histories.insert_history(history.clone()).await?;
        info!(
            history_id = %history.id,
            user_id = %actor.id,
            title = %history.title,
            "chat history created"
        );
        Ok(Some(history))
    }

    /// The actor's conversations, most recently modified first, capped at
    /// [`HISTORY_LIST_LIMIT`].
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Store`] when the read fails.
    pub async fn chat_histories(&self, actor: &User) -> Result<Vec<ChatHistory>, ServiceError> {
        let mut histories = self.stores.histories.histories_for_user(&actor.id).await?;
        histories.sort_by(|left, right| right.last_modified.cmp(&left.last_modified));
        histories.truncate(HISTORY_LIST_LIMIT);
        Ok(histories)
    }

    /// Load one of the actor's conversations.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Forbidden`] when it belongs to another account
    /// and [`ServiceError::Store`] when it does not exist or the read fails.
    pub async fn chat_history(
        &self,
        actor: &User,
        id: &ChatHistoryId,
    ) -> Result<ChatHistory, ServiceError> {
        let history = self
            .stores
            .histories
            .history(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.0.clone()))?;
        if history.user_id != actor.id {
            return Err(ServiceError::Forbidden);
        }
        Ok(history)
    }

    /// Delete one of the actor's conversations.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Forbidden`] when it belongs to another account
    /// and [`ServiceError::Store`] when it does not exist or the delete fails.
    pub async fn delete_chat_history(
        &self,
        actor: &User,
        id: &ChatHistoryId,
    ) -> Result<(), ServiceError> {
        self.chat_history(actor, id).await?;
        self.stores.histories.delete_history(id).await?;
        info!(history_id = %id, user_id = %actor.id, "chat history deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(role: ChatRole, content: &str) -> ChatMessage {
        ChatMessage {
            role,
            content: content.to_owned(),
        }
    }

    #[test]
    fn title_falls_back_without_question() {
        assert_eq!(history_title(&[]), "Percakapan Baru");
        assert_eq!(
            history_title(&[message(ChatRole::System, "prompt")]),
            "Percakapan Baru"
        );
        assert_eq!(
            history_title(&[message(ChatRole::User, "   ")]),
            "Percakapan Baru"
        );
    }

    #[test]
    fn title_uses_first_question_up_to_fifty_chars() {
        let fifty = "a".repeat(50);
        let messages = [
            message(ChatRole::System, "prompt"),
            message(ChatRole::User, &fifty),
            message(ChatRole::User, "kedua"),
        ];
        assert_eq!(history_title(&messages), fifty);

        let long = "Bagaimana cara memilah sampah plastik dan kertas di rumah tangga?";
        let title = history_title(&[message(ChatRole::User, long)]);
        assert_eq!(title.chars().count(), 50);
        assert_eq!(title, "Bagaimana cara memilah sampah plastik dan kerta...");
    }
}
