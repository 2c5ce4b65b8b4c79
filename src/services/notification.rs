//! Notification service
//!
//! Notifications are texted to a user's phone and kept so the user can list
//! them and mark them read. Sending to another user, broadcasting and
//! querying provider delivery status are admin operations.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::error::{AppError, Result};
use crate::models::{Notification, User};
use crate::security::auth::Claims;
use crate::security::validation::RequestValidator;
use crate::sms::{MessageStatus, SmsSender};
use crate::storage::repository::{Repository, SortOrder};

pub const NOTIFICATION_SENT: &str = "Notification envoyée avec succès";
pub const RECIPIENT_NOT_FOUND: &str = "Utilisateur ou numéro non trouvé";
pub const TEST_SMS_TITLE: &str = "Test SMS";
pub const TEST_SMS_CONTENT: &str = "Ceci est un message de test de votre chatbot de santé maternelle.";

/// Outcome of a single send
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationDelivery {
    pub success: bool,
    pub notification_id: String,
    pub message: String,
}

/// Outcome of a broadcast
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BroadcastSummary {
    pub success: bool,
    pub sent: usize,
    pub failed: usize,
    pub message: String,
}

impl BroadcastSummary {
    pub fn new(sent: usize, failed: usize) -> Self {
        Self {
            success: failed == 0,
            sent,
            failed,
            message: format!("{} envoyées, {} échouées", sent, failed),
        }
    }
}

/// Provider status of a sent message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryStatus {
    pub status: String,
    pub message: String,
    pub price: Option<String>,
    pub date_sent: Option<String>,
}

impl From<MessageStatus> for DeliveryStatus {
    fn from(status: MessageStatus) -> Self {
        Self {
            message: format!("Status: {}", status.status),
            status: status.status,
            price: status.price,
            date_sent: status.date_sent,
        }
    }
}

#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Text a notification to `target`, or to the caller when `None`.
    async fn send(
        &self,
        caller: &Claims,
        target: Option<&str>,
        title: &str,
        content: &str,
    ) -> Result<NotificationDelivery>;

    /// Admin only.
    async fn broadcast(
        &self,
        caller: &Claims,
        user_ids: &[String],
        title: &str,
        content: &str,
    ) -> Result<BroadcastSummary>;

    /// Notifications of a user, newest first.
    async fn list(&self, user_id: &str) -> Result<Vec<Notification>>;

    async fn mark_read(&self, user_id: &str, notification_id: &str) -> Result<Notification>;

    /// Admin only.
    async fn message_status(&self, caller: &Claims, sid: &str) -> Result<DeliveryStatus>;

    /// Fixed test message to the caller's own phone.
    async fn send_test(&self, caller: &Claims) -> Result<NotificationDelivery>;
}

pub struct NotificationServiceImpl {
    notifications: Arc<dyn Repository<Notification>>,
    users: Arc<dyn Repository<User>>,
    sms: Arc<dyn SmsSender>,
    clock: Arc<dyn Clock>,
}

impl NotificationServiceImpl {
    pub fn new(
        notifications: Arc<dyn Repository<Notification>>,
        users: Arc<dyn Repository<User>>,
        sms: Arc<dyn SmsSender>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            notifications,
            users,
            sms,
            clock,
        }
    }

    fn require_admin(caller: &Claims) -> Result<()> {
        if caller.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization("Non autorisé".to_string()))
        }
    }

    /// Send and store one notification.
    async fn deliver(&self, user_id: &str, title: &str, content: &str) -> Result<NotificationDelivery> {
        let phone = self
            .users
            .get_by_id(user_id)
            .await?
            .and_then(|user| user.phone_number)
            .ok_or_else(|| AppError::NotFound(RECIPIENT_NOT_FOUND.to_string()))?;

        let mut notification = Notification::new(user_id, title, content, self.clock.now());
        let sent = self.sms.send(&phone, &notification.sms_text()).await?;
        notification.mark_sent(&sent.sid, self.clock.now());
        notification.provider_status = sent.status;

        let notification = self.notifications.create(&notification).await?;
        info!(user_id, notification_id = %notification.id, "Notification sent");

        Ok(NotificationDelivery {
            success: true,
            notification_id: notification.id,
            message: NOTIFICATION_SENT.to_string(),
        })
    }
}

#[async_trait]
impl NotificationService for NotificationServiceImpl {
    async fn send(
        &self,
        caller: &Claims,
        target: Option<&str>,
        title: &str,
        content: &str,
    ) -> Result<NotificationDelivery> {
        let title = RequestValidator::required("title", Some(title))?;
        let content = RequestValidator::required("content", Some(content))?;

        let target = target.map(str::trim).filter(|t| !t.is_empty()).unwrap_or(caller.sub.as_str());
        if target != caller.sub {
            Self::require_admin(caller)?;
        }

        self.deliver(target, title, content).await
    }

    async fn broadcast(
        &self,
        caller: &Claims,
        user_ids: &[String],
        title: &str,
        content: &str,
    ) -> Result<BroadcastSummary> {
        Self::require_admin(caller)?;
        let title = RequestValidator::required("title", Some(title))?;
        let content = RequestValidator::required("content", Some(content))?;
        if user_ids.is_empty() {
            return Err(AppError::Validation("Données manquantes".to_string()));
        }

        let (mut sent, mut failed) = (0, 0);
        for user_id in user_ids {
            match self.deliver(user_id, title, content).await {
                Ok(_) => sent += 1,
                Err(e) => {
                    warn!(user_id = %user_id, error = %e, "Broadcast delivery failed");
                    failed += 1;
                }
            }
        }

        info!(sent, failed, "Broadcast finished");
        Ok(BroadcastSummary::new(sent, failed))
    }

    async fn list(&self, user_id: &str) -> Result<Vec<Notification>> {
        self.notifications
            .list_all_by_owner(user_id, SortOrder::Descending)
            .await
    }

    async fn mark_read(&self, user_id: &str, notification_id: &str) -> Result<Notification> {
        let mut notification = self
            .notifications
            .get_by_id(notification_id)
            .await?
            .filter(|n| n.user_id == user_id)
            .ok_or_else(|| AppError::NotFound("Non trouvé".to_string()))?;

        notification.mark_read(self.clock.now());
        self.notifications
            .update(notification_id, &notification)
            .await?
            .ok_or_else(|| AppError::NotFound("Non trouvé".to_string()))
    }

    async fn message_status(&self, caller: &Claims, sid: &str) -> Result<DeliveryStatus> {
        Self::require_admin(caller)?;
        let sid = RequestValidator::required("sid", Some(sid))?;

        let status = self.sms.status(sid).await?;

        let tracked = self
            .notifications
            .find_by_field("provider_sid", &json!(sid))
            .await?;
        for mut notification in tracked {
            notification.provider_status = Some(status.status.clone());
            notification.updated_at = self.clock.now();
            self.notifications
                .update(&notification.id, &notification)
                .await?;
        }

        Ok(status.into())
    }

    async fn send_test(&self, caller: &Claims) -> Result<NotificationDelivery> {
        self.deliver(&caller.sub, TEST_SMS_TITLE, TEST_SMS_CONTENT).await
    }
}

pub fn create_notification_service(
    notifications: Arc<dyn Repository<Notification>>,
    users: Arc<dyn Repository<User>>,
    sms: Arc<dyn SmsSender>,
    clock: Arc<dyn Clock>,
) -> Arc<dyn NotificationService> {
    Arc::new(NotificationServiceImpl::new(notifications, users, sms, clock))
}
