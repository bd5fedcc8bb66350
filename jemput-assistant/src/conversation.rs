//! Chat transcript seeded with the waste-management system prompt.

use jemput_core::history::history_title;
use jemput_core::model::{ChatMessage, ChatRole, User};

/// Build the system prompt restricting answers to waste and environment topics.
#[must_use]
pub fn system_prompt(user: &User) -> String {
    format!(
        "Anda adalah asisten AI khusus untuk Aplikasi Manajemen Bank Sampah. \
         Nama pengguna: {username}, Role: {role}.\n\n\
         ATURAN PENTING:\n\
         1. Anda HANYA boleh menjawab pertanyaan tentang: sampah, pengelolaan sampah, \
         bank sampah, daur ulang, lingkungan hidup, kebersihan, komposting, limbah, \
         polusi, 3R (Reduce Reuse Recycle), TPA, dan topik terkait lingkungan.\n\
         2. Jika pengguna bertanya di LUAR topik tersebut, jawab dengan sopan: \
         'Maaf, saya hanya bisa membantu dengan topik seputar sampah dan pengelolaan lingkungan. \
         Silakan ajukan pertanyaan tentang sampah, daur ulang, atau lingkungan hidup.'\n\
         3. Gunakan bahasa Indonesia yang ramah dan mudah dipahami.\n\
         4. Berikan jawaban yang informatif, praktis, dan berdasarkan data jika tersedia.",
        username = user.username,
        role = user.role,
    )
}

#[derive(Debug, Clone)]
/// Ordered chat transcript, always starting with the system prompt.
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    /// Start a transcript for `user`.
    #[must_use]
    pub fn new(user: &User) -> Self {
        Self::with_system_prompt(system_prompt(user))
    }

    /// Continue a saved transcript, adding the system prompt for `user` when
    /// the saved messages do not start with one.
    #[must_use]
    pub fn resume(user: &User, messages: Vec<ChatMessage>) -> Self {
        if messages
            .first()
            .is_some_and(|message| message.role == ChatRole::System)
        {
            return Self { messages };
        }
        let mut conversation = Self::new(user);
        conversation.messages.extend(messages);
        conversation
    }

    /// Start a transcript with a custom system prompt.
    #[must_use]
    pub fn with_system_prompt(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage {
                role: ChatRole::System,
                content: prompt.into(),
            }],
        }
    }

    /// All messages including the system prompt.
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Messages meant for display, without the system prompt.
    pub fn visible(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages
            .iter()
            .filter(|message| message.role != ChatRole::System)
    }

    /// Append a question.
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage {
            role: ChatRole::User,
            content: content.into(),
        });
    }

    /// Append an answer.
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage {
            role: ChatRole::Assistant,
            content: content.into(),
        });
    }

    /// Drop the last message if it is an unanswered question.
    ///
    /// Used when a request fails so the transcript matches what the API saw.
    pub fn rollback_last_user(&mut self) -> Option<ChatMessage> {
        if self
            .messages
            .last()
            .is_some_and(|message| message.role == ChatRole::User)
        {
            return self.messages.pop();
        }
        None
    }

    /// Whether the transcript holds at least one question.
    #[must_use]
    pub fn has_questions(&self) -> bool {
        self.messages
            .iter()
            .any(|message| message.role == ChatRole::User)
    }

    /// Title shown for this transcript, derived from its first question.
    #[must_use]
    pub fn title(&self) -> String {
        history_title(&self.messages)
    }
}

#[cfg(test)]
mod tests {
    use jemput_core::model::{Role, UserId};

    use super::*;

    fn petugas() -> User {
        User {
            id: UserId("U1".to_owned()),
            username: "dewi".to_owned(),
            password_hash: String::new(),
            role: Role::Technician,
        }
    }

    #[test]
    fn system_prompt_names_user_and_role() {
        let conversation = Conversation::new(&petugas());
        let [system] = conversation.messages() else {
            panic!("expected only the system prompt");
        };
        assert_eq!(system.role, ChatRole::System);
        assert!(system.content.contains("Nama pengguna: dewi, Role: Petugas"));
        assert_eq!(conversation.visible().count(), 0);
    }

    #[test]
    fn rollback_only_removes_unanswered_question() {
        let mut conversation = Conversation::with_system_prompt("prompt");
        assert!(conversation.rollback_last_user().is_none());

        conversation.push_user("Apa itu limbah B3?");
        conversation.push_assistant("Limbah berbahaya dan beracun.");
        assert!(conversation.rollback_last_user().is_none());
        assert_eq!(conversation.messages().len(), 3);

        conversation.push_user("Contohnya?");
        let removed = conversation.rollback_last_user().expect("question removed");
        assert_eq!(removed.content, "Contohnya?");
        assert_eq!(conversation.messages().len(), 3);
    }

    #[test]
    fn title_comes_from_first_question() {
        let mut conversation = Conversation::with_system_prompt("prompt");
        assert_eq!(conversation.title(), "Percakapan Baru");
        assert!(!conversation.has_questions());

        conversation.push_user("  Kompos  ");
        conversation.push_user("Pertanyaan kedua yang tidak dipakai");
        assert_eq!(conversation.title(), "Kompos");

        let mut long = Conversation::with_system_prompt("prompt");
        long.push_user("Bagaimana cara memilah sampah plastik dan kertas di rumah tangga?");
        assert_eq!(
            long.title(),
            "Bagaimana cara memilah sampah plastik dan kerta..."
        );
    }

    #[test]
    fn resume_keeps_saved_prompt_or_adds_one() {
        let saved = vec![
            ChatMessage {
                role: ChatRole::System,
                content: "prompt lama".to_owned(),
            },
            ChatMessage {
                role: ChatRole::User,
                content: "Apa itu TPA?".to_owned(),
            },
        ];
        let resumed = Conversation::resume(&petugas(), saved.clone());
        assert_eq!(resumed.messages(), saved.as_slice());

        let without_prompt = saved.into_iter().skip(1).collect();
        let resumed = Conversation::resume(&petugas(), without_prompt);
        assert_eq!(resumed.messages().len(), 2);
        assert!(
            resumed
                .messages()
                .first()
                .is_some_and(|message| message.content.contains("Nama pengguna: dewi"))
        );
        assert_eq!(resumed.visible().count(), 1);
    }

    #[test]
    fn roles_serialize_lowercase() {
        let message = ChatMessage {
            role: ChatRole::Assistant,
            content: "ok".to_owned(),
        };
        let json = serde_json::to_value(&message).expect("serialize");
        assert_eq!(json["role"], "assistant");
    }
}
