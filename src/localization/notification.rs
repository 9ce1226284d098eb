use tokio::sync::broadcast;
use tracing::trace;

/// Change notifications published by the localization manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Notification {
    /// Layout direction flipped with the current language
    LayoutDirectionChanged,
    /// Current language, string table or language icons changed
    LocalizationChanged,
    /// Supported languages list changed
    SupportedLanguagesListChanged,
}

impl Notification {
    pub fn name(&self) -> &'static str {
        match self {
            Notification::LayoutDirectionChanged => "TapLayoutDirectionChangedNotification",
            Notification::LocalizationChanged => "TapLocalizationChangedNotification",
            Notification::SupportedLanguagesListChanged => "TapSupportedLanguagesListChanged",
        }
    }
}

/// In-process fan-out of [`Notification`]s
#[derive(Debug, Clone)]
pub struct NotificationCenter {
    sender: broadcast::Sender<Notification>,
}

impl NotificationCenter {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Receives every notification posted after this call
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub fn post(
        &self,
        notification: Notification,
    ) {
        if self.sender.send(notification).is_err() {
            trace!(name = notification.name(), "Notification posted without listeners");
        }
    }
}
