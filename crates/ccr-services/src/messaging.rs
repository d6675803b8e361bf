//! Client and staff messaging
//!
//! Clients write to the staff team as a whole (no receiver). Staff answer
//! with a new message addressed to the client; replies are not linked to the
//! original except through the `Re: ` subject prefix.

use std::collections::HashMap;

use ccr_auth::{Access, CurrentUser};
use ccr_contracts::messages::{MessageContract, MessageForm, ReplyContract, ReplyForm};
use ccr_contracts::Contract;
use ccr_core::error::PortalError;
use ccr_core::result::PortalResult;
use ccr_core::traits::Id;
use ccr_models::{Message, NewMessage, Project};
use serde::Serialize;
use tracing::{info, instrument};

use crate::context::ServiceContext;
use crate::result::ServiceOutcome;

/// A message with the names a listing shows next to it
#[derive(Debug, Clone, Serialize)]
pub struct InboxEntry {
    pub message: Message,
    pub sender_name: Option<String>,
    pub project_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientInbox {
    pub received: Vec<InboxEntry>,
    pub sent: Vec<InboxEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplyView {
    pub original: InboxEntry,
    /// Subject the reply will carry
    pub subject: String,
}

pub struct MessageService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> MessageService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    async fn annotate(&self, messages: Vec<Message>) -> PortalResult<Vec<InboxEntry>> {
        let mut senders: HashMap<Id, Option<String>> = HashMap::new();
        let mut projects: HashMap<Id, Option<String>> = HashMap::new();
        let mut entries = Vec::with_capacity(messages.len());

        for message in messages {
            let sender_name = match senders.get(&message.sender_id) {
                Some(name) => name.clone(),
                None => {
                    let name = self
                        .ctx
                        .stores
                        .users
                        .find_account(message.sender_id)
                        .await?
                        .map(|account| account.user.display_name());
                    senders.insert(message.sender_id, name.clone());
                    name
                }
            };

            let project_name = match message.project_id {
                None => None,
                Some(project_id) => match projects.get(&project_id) {
                    Some(name) => name.clone(),
                    None => {
                        let name = self
                            .ctx
                            .stores
                            .projects
                            .find(project_id)
                            .await?
                            .map(|project| project.name);
                        projects.insert(project_id, name.clone());
                        name
                    }
                },
            };

            entries.push(InboxEntry {
                message,
                sender_name,
                project_name,
            });
        }

        Ok(entries)
    }

    /// Project a client is about to write about
    pub async fn compose(&self, user: &CurrentUser, project_id: Id) -> PortalResult<Project> {
        let project = self.ctx.project(project_id).await?;
        user.authorize_client_project(&project)?;
        Ok(project)
    }

    #[instrument(skip(self, user, form), fields(user_id = user.id))]
    pub async fn send(
        &self,
        user: &CurrentUser,
        project_id: Id,
        form: &MessageForm,
    ) -> PortalResult<ServiceOutcome<Message>> {
        let project = self.compose(user, project_id).await?;
        let accepted = MessageContract.validate(form)?;

        let message = self
            .ctx
            .stores
            .messages
            .create(NewMessage {
                project_id: Some(project.id),
                sender_id: user.id,
                receiver_id: None,
                subject: accepted.subject,
                body: accepted.body,
            })
            .await?;

        info!(message_id = message.id, project_id, "Client message sent to staff");
        Ok(ServiceOutcome::success_with_message(
            message,
            "Your message has been sent to the CCR team.",
        ))
    }

    pub async fn client_inbox(&self, user: &CurrentUser) -> PortalResult<ClientInbox> {
        user.require(Access::Client)?;
        let received = self.ctx.stores.messages.list_received(user.id).await?;
        let sent = self.ctx.stores.messages.list_sent(user.id).await?;

        Ok(ClientInbox {
            received: self.annotate(received).await?,
            sent: self.annotate(sent).await?,
        })
    }

    /// Every message written by a client, whoever it was addressed to
    pub async fn staff_inbox(&self, user: &CurrentUser) -> PortalResult<Vec<InboxEntry>> {
        user.require(Access::Staff)?;
        let messages = self.ctx.stores.messages.list_from_clients().await?;
        self.annotate(messages).await
    }

    async fn repliable(&self, user: &CurrentUser, message_id: Id) -> PortalResult<Message> {
        let message = self.ctx.message(message_id).await?;
        let sender_role = self.ctx.role_of(message.sender_id).await?;
        user.authorize_reply(sender_role)?;
        Ok(message)
    }

    pub async fn reply_view(&self, user: &CurrentUser, message_id: Id) -> PortalResult<ReplyView> {
        let message = self.repliable(user, message_id).await?;
        let subject = message.reply_subject();
        let original = self
            .annotate(vec![message])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| PortalError::not_found::<Message>(message_id))?;
        Ok(ReplyView { original, subject })
    }

    #[instrument(skip(self, user, form), fields(user_id = user.id))]
    pub async fn reply(
        &self,
        user: &CurrentUser,
        message_id: Id,
        form: &ReplyForm,
    ) -> PortalResult<ServiceOutcome<Message>> {
        let original = self.repliable(user, message_id).await?;
        let body = ReplyContract.validate(form)?;

        let reply = self
            .ctx
            .stores
            .messages
            .create(NewMessage {
                project_id: original.project_id,
                sender_id: user.id,
                receiver_id: Some(original.sender_id),
                subject: Some(original.reply_subject()),
                body,
            })
            .await?;

        info!(message_id = reply.id, in_reply_to = original.id, "Staff reply sent");
        let recipient = self.ctx.account(original.sender_id).await?;
        let notice = format!("Reply sent to {}.", recipient.user.display_name());
        Ok(ServiceOutcome::success_with_message(reply, notice))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::portal;

    fn message(subject: Option<&str>) -> MessageForm {
        MessageForm {
            subject: subject.map(str::to_string),
            body: "¿Cuándo se instalan las ventanas?".into(),
        }
    }

    fn reply() -> ReplyForm {
        ReplyForm {
            body: "La próxima semana.".into(),
        }
    }

    #[tokio::test]
    async fn test_client_message_goes_to_staff() {
        let p = portal().await;
        let service = MessageService::new(&p.ctx);

        let sent = service
            .send(&p.client, p.project.id, &message(Some("Ventanas")))
            .await
            .unwrap()
            .into_result();
        assert_eq!(sent.receiver_id, None);
        assert_eq!(sent.project_id, Some(p.project.id));
        assert_eq!(sent.sender_id, p.client.id);

        let inbox = service.staff_inbox(&p.worker).await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].sender_name.as_deref(), Some("cliente"));
        assert_eq!(inbox[0].project_name.as_deref(), Some("Residencial Los Pinos"));
    }

    #[tokio::test]
    async fn test_other_client_cannot_send() {
        let p = portal().await;
        let err = MessageService::new(&p.ctx)
            .send(&p.other_client, p.project.id, &message(None))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert!(p.ctx.stores.messages.list_from_clients().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reply_to_client() {
        let p = portal().await;
        let service = MessageService::new(&p.ctx);
        let original = service
            .send(&p.client, p.project.id, &message(Some("Ventanas")))
            .await
            .unwrap()
            .into_result();

        let view = service.reply_view(&p.admin, original.id).await.unwrap();
        assert_eq!(view.subject, "Re: Ventanas");

        let answer = service
            .reply(&p.admin, original.id, &reply())
            .await
            .unwrap()
            .into_result();
        assert_eq!(answer.receiver_id, Some(p.client.id));
        assert_eq!(answer.project_id, Some(p.project.id));
        assert_eq!(answer.subject.as_deref(), Some("Re: Ventanas"));

        let inbox = service.client_inbox(&p.client).await.unwrap();
        assert_eq!(inbox.received.len(), 1);
        assert_eq!(inbox.sent.len(), 1);
        assert_eq!(inbox.received[0].message.id, answer.id);
    }

    #[tokio::test]
    async fn test_reply_without_subject() {
        let p = portal().await;
        let service = MessageService::new(&p.ctx);
        let original = service
            .send(&p.client, p.project.id, &message(None))
            .await
            .unwrap()
            .into_result();

        let answer = service
            .reply(&p.worker, original.id, &reply())
            .await
            .unwrap()
            .into_result();
        assert_eq!(answer.subject.as_deref(), Some("Re: "));
    }

    #[tokio::test]
    async fn test_cannot_reply_to_staff_message() {
        let p = portal().await;
        let service = MessageService::new(&p.ctx);
        let original = service
            .send(&p.client, p.project.id, &message(Some("Ventanas")))
            .await
            .unwrap()
            .into_result();
        let staff_reply = service
            .reply(&p.admin, original.id, &reply())
            .await
            .unwrap()
            .into_result();

        let err = service
            .reply(&p.worker, staff_reply.id, &reply())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert_eq!(service.client_inbox(&p.client).await.unwrap().received.len(), 1);

        assert_eq!(
            service.reply(&p.client, original.id, &reply()).await.unwrap_err().status_code(),
            403
        );
        assert_eq!(
            service.reply(&p.worker, 9_999, &reply()).await.unwrap_err().status_code(),
            404
        );
    }

    #[tokio::test]
    async fn test_staff_inbox_follows_current_role() {
        let p = portal().await;
        let service = MessageService::new(&p.ctx);
        service
            .send(&p.client, p.project.id, &message(None))
            .await
            .unwrap();
        assert_eq!(service.staff_inbox(&p.admin).await.unwrap().len(), 1);

        p.ctx
            .stores
            .users
            .update_profile(
                p.client.id,
                ccr_models::ProfileChanges {
                    role: ccr_models::Role::Worker,
                    phone: None,
                    company_name: None,
                },
            )
            .await
            .unwrap();
        assert!(service.staff_inbox(&p.admin).await.unwrap().is_empty());
        assert_eq!(
            service.client_inbox(&p.client).await.unwrap_err().status_code(),
            403
        );
    }
}
