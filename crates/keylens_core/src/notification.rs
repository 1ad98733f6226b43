use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    #[default]
    Global,
    Release,
}

/// Entry of the notification center feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationItem {
    pub timestamp: i64,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(rename = "type", default)]
    pub notification_type: Option<NotificationType>,
}

impl NotificationItem {
    pub fn is_global(&self) -> bool {
        self.notification_type == Some(NotificationType::Global)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationsResponse {
    #[serde(default)]
    pub notifications: Vec<NotificationItem>,
    #[serde(default)]
    pub total_unread: i64,
}
