//! Reminder service
//!
//! Reminders are stored per user and sent by SMS on request.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::clock::Clock;
use crate::error::{AppError, Result};
use crate::models::{Reminder, User};
use crate::security::validation::RequestValidator;
use crate::sms::SmsSender;
use crate::storage::repository::{Repository, SortOrder};

pub const REMINDER_CREATED: &str = "Rappel créé avec succès";
pub const REMINDER_SENT: &str = "Rappel envoyé avec succès";
pub const NO_PHONE_NUMBER: &str = "Numéro de téléphone non disponible";

const MAX_TITLE_LENGTH: usize = 200;

/// Reminder to create
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewReminder {
    pub title: Option<String>,
    pub description: Option<String>,
    /// ISO-8601 date or date-time
    pub remind_at: Option<String>,
    pub sms_body: Option<String>,
}

/// Outcome of a successful send
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReminderDelivery {
    pub success: bool,
    pub message: String,
    pub sid: String,
}

#[async_trait]
pub trait ReminderService: Send + Sync {
    async fn create(&self, user_id: &str, reminder: NewReminder) -> Result<Reminder>;

    /// Reminders of a user by date, earliest first.
    async fn list(&self, user_id: &str) -> Result<Vec<Reminder>>;

    /// Text a reminder owned by `user_id`.
    async fn send(&self, user_id: &str, reminder_id: &str) -> Result<ReminderDelivery>;
}

pub struct ReminderServiceImpl {
    reminders: Arc<dyn Repository<Reminder>>,
    users: Arc<dyn Repository<User>>,
    sms: Arc<dyn SmsSender>,
    clock: Arc<dyn Clock>,
}

impl ReminderServiceImpl {
    pub fn new(
        reminders: Arc<dyn Repository<Reminder>>,
        users: Arc<dyn Repository<User>>,
        sms: Arc<dyn SmsSender>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            reminders,
            users,
            sms,
            clock,
        }
    }

    async fn owner_phone(&self, user_id: &str) -> Result<Option<String>> {
        Ok(self
            .users
            .get_by_id(user_id)
            .await?
            .and_then(|user| user.phone_number))
    }
}

#[async_trait]
impl ReminderService for ReminderServiceImpl {
    async fn create(&self, user_id: &str, reminder: NewReminder) -> Result<Reminder> {
        let title = RequestValidator::required("title", reminder.title.as_deref())?;
        let remind_at = RequestValidator::required("remind_at", reminder.remind_at.as_deref())?;
        RequestValidator::validate_length("title", title, None, Some(MAX_TITLE_LENGTH))?;
        let remind_at = RequestValidator::parse_datetime("remind_at", remind_at)?;

        let description = reminder
            .description
            .map(|d| RequestValidator::sanitize_string(&d))
            .filter(|d| !d.is_empty());

        let reminder = Reminder::new(
            user_id,
            &RequestValidator::sanitize_string(title),
            description,
            remind_at,
            self.owner_phone(user_id).await?,
            reminder.sms_body,
            self.clock.now(),
        );
        let reminder = self.reminders.create(&reminder).await?;
        info!(user_id, reminder_id = %reminder.id, "Reminder created");
        Ok(reminder)
    }

    async fn list(&self, user_id: &str) -> Result<Vec<Reminder>> {
        self.reminders
            .list_all_by_owner(user_id, SortOrder::Ascending)
            .await
    }

    async fn send(&self, user_id: &str, reminder_id: &str) -> Result<ReminderDelivery> {
        let mut reminder = self
            .reminders
            .get_by_id(reminder_id)
            .await?
            .filter(|reminder| reminder.user_id == user_id)
            .ok_or_else(|| AppError::NotFound("Rappel non trouvé".to_string()))?;

        let phone = match reminder.phone_number.clone() {
            Some(phone) => Some(phone),
            None => self.owner_phone(user_id).await?,
        }
        .ok_or_else(|| AppError::Validation(NO_PHONE_NUMBER.to_string()))?;

        let sent = self.sms.send(&phone, &reminder.sms_text()).await?;
        reminder.mark_sent(&sent.sid, self.clock.now());
        self.reminders.update(&reminder.id, &reminder).await?;
        info!(user_id, reminder_id, sid = %sent.sid, "Reminder sent");

        Ok(ReminderDelivery {
            success: true,
            message: REMINDER_SENT.to_string(),
            sid: sent.sid,
        })
    }
}

pub fn create_reminder_service(
    reminders: Arc<dyn Repository<Reminder>>,
    users: Arc<dyn Repository<User>>,
    sms: Arc<dyn SmsSender>,
    clock: Arc<dyn Clock>,
) -> Arc<dyn ReminderService> {
    Arc::new(ReminderServiceImpl::new(reminders, users, sms, clock))
}
