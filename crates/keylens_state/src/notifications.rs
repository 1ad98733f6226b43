use crate::store::Store;
use keylens_core::{
    ApiError, ApiRequest, NotificationItem, NotificationsResponse, endpoints,
};
use log::warn;
use uuid::Uuid;

/// Error toast as handed to the reducer; the id is assigned on insert.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorPayload {
    pub name: String,
    pub message: String,
    pub title: Option<String>,
    pub instance_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorNotification {
    pub id: String,
    pub name: String,
    pub message: String,
    pub title: Option<String>,
    pub instance_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessagePayload {
    pub title: String,
    pub message: String,
    pub group: Option<String>,
}

impl MessagePayload {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            group: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageNotification {
    pub id: String,
    pub title: String,
    pub message: String,
    pub group: Option<String>,
}

/// Toast that stays until removed explicitly, replaced when its id repeats.
#[derive(Debug, Clone, PartialEq)]
pub struct InfiniteMessage {
    pub id: String,
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationCenter {
    pub loading: bool,
    pub is_center_open: bool,
    pub is_notification_open: bool,
    pub total_unread: i64,
    pub notifications: Vec<NotificationItem>,
    pub last_received_notification: Option<NotificationItem>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationsState {
    pub errors: Vec<ErrorNotification>,
    pub messages: Vec<MessageNotification>,
    pub infinite_messages: Vec<InfiniteMessage>,
    pub notification_center: NotificationCenter,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NotificationsAction {
    AddErrorNotification(ErrorPayload),
    RemoveError(String),
    ResetErrors,
    AddMessageNotification(MessagePayload),
    RemoveMessage(String),
    ResetMessages,
    AddInfiniteNotification(InfiniteMessage),
    RemoveInfiniteNotification(String),
    /// `None` toggles.
    SetIsCenterOpen(Option<bool>),
    /// `None` toggles.
    SetIsNotificationOpen(Option<bool>),
    GetNotifications,
    GetNotificationsSuccess(NotificationsResponse),
    GetNotificationsFailed,
    UnreadNotifications(i64),
    SetNewNotificationReceived(NotificationsResponse),
    SetLastReceivedNotification(Option<NotificationItem>),
}

fn toggle(current: bool, value: Option<bool>) -> bool {
    value.unwrap_or(!current)
}

pub fn reduce(state: &mut NotificationsState, action: NotificationsAction) {
    match action {
        NotificationsAction::AddErrorNotification(payload) => {
            state.errors.push(ErrorNotification {
                id: Uuid::new_v4().to_string(),
                name: payload.name,
                message: payload.message,
                title: payload.title,
                instance_id: payload.instance_id,
            });
        }
        NotificationsAction::RemoveError(id) => state.errors.retain(|error| error.id != id),
        NotificationsAction::ResetErrors => state.errors.clear(),
        NotificationsAction::AddMessageNotification(payload) => {
            state.messages.push(MessageNotification {
                id: Uuid::new_v4().to_string(),
                title: payload.title,
                message: payload.message,
                group: payload.group,
            });
        }
        NotificationsAction::RemoveMessage(id) => state.messages.retain(|message| message.id != id),
        NotificationsAction::ResetMessages => state.messages.clear(),
        NotificationsAction::AddInfiniteNotification(message) => {
            match state
                .infinite_messages
                .iter_mut()
                .find(|existing| existing.id == message.id)
            {
                Some(existing) => *existing = message,
                None => state.infinite_messages.push(message),
            }
        }
        NotificationsAction::RemoveInfiniteNotification(id) => {
            state.infinite_messages.retain(|message| message.id != id)
        }
        NotificationsAction::SetIsCenterOpen(value) => {
            let center = &mut state.notification_center;
            center.is_center_open = toggle(center.is_center_open, value);
        }
        NotificationsAction::SetIsNotificationOpen(value) => {
            let center = &mut state.notification_center;
            center.is_notification_open = toggle(center.is_notification_open, value);
        }
        NotificationsAction::GetNotifications => state.notification_center.loading = true,
        NotificationsAction::GetNotificationsSuccess(response) => {
            let center = &mut state.notification_center;
            center.loading = false;
            center.notifications = response.notifications;
            center.total_unread = response.total_unread;
        }
        NotificationsAction::GetNotificationsFailed => state.notification_center.loading = false,
        NotificationsAction::UnreadNotifications(total_unread) => {
            state.notification_center.total_unread = total_unread;
        }
        NotificationsAction::SetNewNotificationReceived(response) => {
            let center = &mut state.notification_center;
            center.total_unread = response.total_unread;
            center.is_notification_open = true;
        }
        NotificationsAction::SetLastReceivedNotification(notification) => {
            state.notification_center.last_received_notification = notification;
        }
    }
}

pub async fn fetch_notifications(store: &Store) -> Result<NotificationsResponse, ApiError> {
    store.dispatch(NotificationsAction::GetNotifications);

    match store
        .fetch::<NotificationsResponse>(ApiRequest::get(endpoints::NOTIFICATIONS))
        .await
    {
        Ok(response) => {
            store.dispatch(NotificationsAction::GetNotificationsSuccess(response.clone()));
            Ok(response)
        }
        Err(error) => {
            warn!("Failed to load notifications: {}", error);
            store.dispatch(NotificationsAction::GetNotificationsFailed);
            Err(error)
        }
    }
}

/// Marks the feed as read; the backend answers with the remaining unread count.
pub async fn unread_notifications(store: &Store) -> Result<i64, ApiError> {
    let response = store
        .fetch::<NotificationsResponse>(ApiRequest::patch(endpoints::NOTIFICATIONS_READ))
        .await?;

    store.dispatch(NotificationsAction::UnreadNotifications(response.total_unread));
    Ok(response.total_unread)
}

/// Handles a feed pushed by the backend: opens the popup and remembers the
/// newest global notification, if any.
pub fn set_new_notification(store: &Store, response: NotificationsResponse) {
    let last_global = response
        .notifications
        .iter()
        .find(|notification| notification.is_global())
        .cloned();

    store.dispatch(NotificationsAction::SetNewNotificationReceived(response));
    store.dispatch(NotificationsAction::SetLastReceivedNotification(last_global));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use keylens_core::Method;
    use keylens_test_support::FakeApi;
    use serde_json::json;

    fn feed() -> serde_json::Value {
        json!({
            "notifications": [
                { "timestamp": 123123125, "title": "string", "body": "string", "read": false },
                { "timestamp": 123123123, "title": "string", "body": "string", "read": false },
                { "timestamp": 123123121, "title": "string", "body": "string", "read": false }
            ],
            "totalUnread": 3
        })
    }

    #[test]
    fn error_notification_gets_an_id() {
        let mut state = NotificationsState::default();
        reduce(
            &mut state,
            NotificationsAction::AddErrorNotification(ErrorPayload {
                name: "Error".into(),
                message: "some error".into(),
                title: None,
                instance_id: None,
            }),
        );

        assert_eq!(state.errors.len(), 1);
        assert_eq!(state.errors[0].message, "some error");
        assert!(!state.errors[0].id.is_empty());

        let id = state.errors[0].id.clone();
        reduce(&mut state, NotificationsAction::RemoveError(id));
        assert!(state.errors.is_empty());
    }

    #[test]
    fn infinite_notification_is_replaced_by_id() {
        let mut state = NotificationsState::default();
        let message = |text: &str| InfiniteMessage {
            id: "id".into(),
            title: "Import".into(),
            message: text.into(),
        };

        reduce(&mut state, NotificationsAction::AddInfiniteNotification(message("message text")));
        reduce(&mut state, NotificationsAction::AddInfiniteNotification(message("updated text")));
        assert_eq!(state.infinite_messages, vec![message("updated text")]);

        reduce(&mut state, NotificationsAction::RemoveInfiniteNotification("id".into()));
        assert!(state.infinite_messages.is_empty());
    }

    #[test]
    fn center_flags_toggle_without_payload() {
        let mut state = NotificationsState::default();

        reduce(&mut state, NotificationsAction::SetIsCenterOpen(None));
        assert!(state.notification_center.is_center_open);

        reduce(&mut state, NotificationsAction::SetIsCenterOpen(Some(true)));
        assert!(state.notification_center.is_center_open);

        reduce(&mut state, NotificationsAction::SetIsNotificationOpen(None));
        assert!(state.notification_center.is_notification_open);
    }

    #[tokio::test]
    async fn fetch_failure_is_silent() {
        let api = FakeApi::new().with_error(
            Method::Get,
            "notifications",
            500,
            json!({ "message": "Something was wrong!" }),
        );
        let store = Store::builder(api.as_service_arc()).build();
        store.record_actions();

        assert!(fetch_notifications(&store).await.is_err());
        assert_eq!(
            store.take_actions(),
            vec![
                Action::Notifications(NotificationsAction::GetNotifications),
                Action::Notifications(NotificationsAction::GetNotificationsFailed),
            ]
        );
    }

    #[tokio::test]
    async fn unread_uses_backend_total() {
        let api = FakeApi::new().with_response(Method::Patch, "notifications/read", feed());
        let store = Store::builder(api.as_service_arc()).build();
        store.record_actions();

        assert_eq!(unread_notifications(&store).await.unwrap(), 3);
        assert_eq!(
            store.take_actions(),
            vec![Action::Notifications(NotificationsAction::UnreadNotifications(3))]
        );
    }

    #[test]
    fn new_feed_without_global_items_clears_last_received() {
        let store = Store::builder(FakeApi::new().as_service_arc()).build();
        let response: NotificationsResponse = serde_json::from_value(feed()).unwrap();

        store.record_actions();
        set_new_notification(&store, response.clone());

        assert_eq!(
            store.take_actions(),
            vec![
                Action::Notifications(NotificationsAction::SetNewNotificationReceived(response)),
                Action::Notifications(NotificationsAction::SetLastReceivedNotification(None)),
            ]
        );
        store.select(|state| {
            assert_eq!(state.app.notifications.notification_center.total_unread, 3);
            assert!(state.app.notifications.notification_center.is_notification_open);
        });
    }
}
