use magjob_core::{
    chat_topic, Chat, ChatEvent, ChatMember, ChatMessage, Clock, Page, PageRequest, Sort,
    DEFAULT_OWNER_NICKNAME,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::ChatRepository;
use crate::error::AppError;
use crate::realtime::Hub;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChat {
    pub title: String,
    pub organization_id: Uuid,
    /// The creating member, who becomes the chat's first admin.
    pub member_id: Uuid,
    pub nickname: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatPatch {
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub chat_id: Uuid,
    pub member_id: Uuid,
    pub nickname: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationAnswer {
    pub chat_id: Uuid,
    pub member_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    pub chat_member_id: Uuid,
    pub content: String,
    pub attachment: Option<String>,
    pub first_and_last_name: Option<String>,
}

async fn require_chat(chats: &dyn ChatRepository, id: Uuid) -> Result<Chat, AppError> {
    chats
        .find_chat(id)
        .await?
        .ok_or_else(|| AppError::not_found("Chat", id))
}

async fn announce(hub: &Hub, chat_id: Uuid, event: &ChatEvent) -> Result<(), AppError> {
    let delivered = hub.publish_json(&chat_topic(chat_id), event).await?;
    tracing::debug!("Chat {} event delivered to {} subscribers", chat_id, delivered);
    Ok(())
}

#[derive(Clone)]
pub struct ChatService {
    chats: Arc<dyn ChatRepository>,
    clock: Arc<dyn Clock>,
}

impl ChatService {
    pub fn new(chats: Arc<dyn ChatRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { chats, clock }
    }

    pub async fn list(&self, page: &PageRequest) -> Result<Page<Chat>, AppError> {
        self.chats.list_chats(page).await
    }

    pub async fn list_by_organization(&self, organization_id: Uuid, page: &PageRequest) -> Result<Page<Chat>, AppError> {
        self.chats.list_chats_by_organization(organization_id, page).await
    }

    pub async fn list_by_member(&self, member_id: Uuid, page: &PageRequest) -> Result<Page<Chat>, AppError> {
        self.chats.list_chats_by_member(member_id, page).await
    }

    pub async fn find(&self, id: Uuid) -> Result<Chat, AppError> {
        require_chat(self.chats.as_ref(), id).await
    }

    pub async fn create(&self, request: NewChat) -> Result<Chat, AppError> {
        let chat = Chat {
            id: Uuid::new_v4(),
            title: request.title,
            organization_id: request.organization_id,
            date_of_creation: self.clock.now().date(),
        };
        let nickname = request
            .nickname
            .unwrap_or_else(|| DEFAULT_OWNER_NICKNAME.to_string());
        let owner = ChatMember::owner(chat.id, request.member_id, nickname);
        self.chats.insert_chat(&chat, &owner).await?;
        tracing::info!("Created chat {} owned by member {}", chat.id, request.member_id);
        Ok(chat)
    }

    pub async fn update(&self, id: Uuid, patch: ChatPatch) -> Result<Chat, AppError> {
        let mut chat = self.find(id).await?;
        chat.title = patch.title;
        self.chats.update_chat(&chat).await?;
        Ok(chat)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.chats.delete_chat(id).await? {
            return Err(AppError::not_found("Chat", id));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct ChatMemberService {
    chats: Arc<dyn ChatRepository>,
    hub: Arc<Hub>,
}

impl ChatMemberService {
    pub fn new(chats: Arc<dyn ChatRepository>, hub: Arc<Hub>) -> Self {
        Self { chats, hub }
    }

    pub async fn find(&self, id: Uuid) -> Result<ChatMember, AppError> {
        self.chats
            .find_chat_member(id)
            .await?
            .ok_or_else(|| AppError::not_found("Chat member", id))
    }

    pub async fn list_by_member(&self, member_id: Uuid, page: &PageRequest) -> Result<Page<ChatMember>, AppError> {
        self.chats.list_chat_members_by_member(member_id, page).await
    }

    /// Members that have joined the chat.
    pub async fn list_by_chat(&self, chat_id: Uuid, page: &PageRequest) -> Result<Page<ChatMember>, AppError> {
        require_chat(self.chats.as_ref(), chat_id).await?;
        self.chats.list_chat_members_by_chat(chat_id, true, page).await
    }

    /// Invitations still waiting for an answer.
    pub async fn list_pending(&self, chat_id: Uuid, page: &PageRequest) -> Result<Page<ChatMember>, AppError> {
        require_chat(self.chats.as_ref(), chat_id).await?;
        self.chats.list_chat_members_by_chat(chat_id, false, page).await
    }

    pub async fn invite(&self, request: Invitation) -> Result<ChatMember, AppError> {
        require_chat(self.chats.as_ref(), request.chat_id).await?;
        if self
            .chats
            .find_chat_member_in_chat(request.chat_id, request.member_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "Member {} is already part of chat {}",
                request.member_id, request.chat_id
            )));
        }
        let member = ChatMember::invite(request.chat_id, request.member_id, request.nickname);
        self.chats.insert_chat_member(&member).await?;
        Ok(member)
    }

    pub async fn set_nickname(&self, id: Uuid, nickname: String) -> Result<ChatMember, AppError> {
        let mut member = self.find(id).await?;
        member.nickname = nickname;
        self.chats.update_chat_member(&member).await?;
        Ok(member)
    }

    async fn pending_invitation(&self, answer: InvitationAnswer) -> Result<ChatMember, AppError> {
        let member = self
            .chats
            .find_chat_member_in_chat(answer.chat_id, answer.member_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "No invitation for member {} in chat {}",
                    answer.member_id, answer.chat_id
                ))
            })?;
        if member.is_invitation_accepted {
            return Err(AppError::Conflict("The invitation was already accepted.".to_string()));
        }
        Ok(member)
    }

    pub async fn accept_invitation(&self, answer: InvitationAnswer) -> Result<ChatMember, AppError> {
        let mut member = self.pending_invitation(answer).await?;
        member.is_invitation_accepted = true;
        self.chats.update_chat_member(&member).await?;
        announce(
            &self.hub,
            member.chat_id,
            &ChatEvent::Joined {
                nickname: member.nickname.clone(),
            },
        )
        .await?;
        Ok(member)
    }

    /// Declining removes the invitation.
    pub async fn reject_invitation(&self, answer: InvitationAnswer) -> Result<(), AppError> {
        let member = self.pending_invitation(answer).await?;
        self.chats.delete_chat_member(member.id).await?;
        Ok(())
    }

    pub async fn give_admin(&self, id: Uuid) -> Result<ChatMember, AppError> {
        let mut member = self.find(id).await?;
        if member.is_admin {
            return Err(AppError::Conflict(format!("Chat member {} is already an admin", id)));
        }
        member.is_admin = true;
        self.chats.update_chat_member(&member).await?;
        announce(
            &self.hub,
            member.chat_id,
            &ChatEvent::AdminGranted {
                nickname: member.nickname.clone(),
            },
        )
        .await?;
        Ok(member)
    }

    pub async fn remove_admin(&self, id: Uuid) -> Result<ChatMember, AppError> {
        let mut member = self.find(id).await?;
        if !member.is_admin {
            return Err(AppError::NotFound(format!("Chat member {} is not an admin", id)));
        }
        member.is_admin = false;
        self.chats.update_chat_member(&member).await?;
        announce(
            &self.hub,
            member.chat_id,
            &ChatEvent::AdminRevoked {
                nickname: member.nickname.clone(),
            },
        )
        .await?;
        Ok(member)
    }

    /// Leaving a chat.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let member = self.find(id).await?;
        self.chats.delete_chat_member(id).await?;
        if member.is_invitation_accepted {
            announce(
                &self.hub,
                member.chat_id,
                &ChatEvent::Left {
                    nickname: member.nickname,
                },
            )
            .await?;
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct ChatMessageService {
    chats: Arc<dyn ChatRepository>,
    hub: Arc<Hub>,
    clock: Arc<dyn Clock>,
}

impl ChatMessageService {
    pub fn new(chats: Arc<dyn ChatRepository>, hub: Arc<Hub>, clock: Arc<dyn Clock>) -> Self {
        Self { chats, hub, clock }
    }

    /// Newest first unless the caller asks for another order.
    pub async fn list_by_chat(&self, chat_id: Uuid, page: &PageRequest) -> Result<Page<ChatMessage>, AppError> {
        require_chat(self.chats.as_ref(), chat_id).await?;
        let page = match page.sort {
            Some(_) => page.clone(),
            None => page.clone().sorted_by(Sort::new("sentAt", false)),
        };
        self.chats.list_messages_by_chat(chat_id, &page).await
    }

    pub async fn send(&self, chat_id: Uuid, request: NewMessage) -> Result<ChatMessage, AppError> {
        require_chat(self.chats.as_ref(), chat_id).await?;
        let author = self
            .chats
            .find_chat_member(request.chat_member_id)
            .await?
            .ok_or_else(|| AppError::not_found("Chat member", request.chat_member_id))?;
        if !author.can_post_in(chat_id) {
            return Err(AppError::Forbidden(format!(
                "Chat member {} cannot post in chat {}",
                author.id, chat_id
            )));
        }

        let message = ChatMessage {
            id: Uuid::new_v4(),
            chat_id,
            chat_member_id: author.id,
            content: request.content,
            attachment: request.attachment,
            viewed_by: Vec::new(),
            first_and_last_name: request.first_and_last_name,
            sent_at: self.clock.now(),
        };
        self.chats.insert_message(&message).await?;
        announce(
            &self.hub,
            chat_id,
            &ChatEvent::Message {
                message: message.clone(),
            },
        )
        .await?;
        Ok(message)
    }

    /// Records that `viewer` has seen the message. Repeated calls are no-ops.
    pub async fn mark_viewed(&self, id: Uuid, viewer: &str) -> Result<ChatMessage, AppError> {
        let mut message = self
            .chats
            .find_message(id)
            .await?
            .ok_or_else(|| AppError::not_found("Chat message", id))?;
        if message.mark_viewed_by(viewer) {
            self.chats.update_message(&message).await?;
            announce(
                &self.hub,
                message.chat_id,
                &ChatEvent::Viewed {
                    message_id: message.id,
                    viewer: viewer.to_string(),
                },
            )
            .await?;
        }
        Ok(message)
    }
}
