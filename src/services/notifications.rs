//! User-facing notifications
//!
//! The mutation coordinator pushes a notification for every mutation that
//! reaches the backend, success or failure. The CLI drains the queue after
//! each command and prints what it finds.

use std::fmt;
use std::sync::RwLock;

/// Type of notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationType {
    /// Informational message
    Info,
    /// Success message
    Success,
    /// Warning message
    Warning,
    /// Error message
    Error,
}

impl NotificationType {
    /// Get the icon/prefix for this notification type
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Info => "i",
            Self::Success => "+",
            Self::Warning => "!",
            Self::Error => "x",
        }
    }

    /// Get the title for this notification type
    pub fn title(&self) -> &'static str {
        match self {
            Self::Info => "Info",
            Self::Success => "Success",
            Self::Warning => "Warning",
            Self::Error => "Error",
        }
    }
}

/// A queued notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub notification_type: NotificationType,
    /// The user can retry the action that produced this notification
    pub recoverable: bool,
}

impl Notification {
    pub fn new(message: impl Into<String>, notification_type: NotificationType) -> Self {
        Self {
            message: message.into(),
            notification_type,
            recoverable: false,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, NotificationType::Info)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, NotificationType::Success)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, NotificationType::Warning)
    }

    /// An error the user can recover from by retrying
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            recoverable: true,
            ..Self::new(message, NotificationType::Error)
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.notification_type.icon(),
            self.notification_type.title(),
            self.message
        )?;
        if self.recoverable {
            write!(f, " (you can retry)")?;
        }
        Ok(())
    }
}

/// Thread-safe FIFO of pending notifications
#[derive(Debug, Default)]
pub struct NotificationQueue {
    items: RwLock<Vec<Notification>>,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, notification: Notification) {
        if let Ok(mut items) = self.items.write() {
            items.push(notification);
        }
    }

    /// Take every queued notification, oldest first
    pub fn drain(&self) -> Vec<Notification> {
        self.items
            .write()
            .map(|mut items| std::mem::take(&mut *items))
            .unwrap_or_default()
    }

    pub fn latest(&self) -> Option<Notification> {
        self.items.read().ok().and_then(|items| items.last().cloned())
    }

    pub fn len(&self) -> usize {
        self.items.read().map(|items| items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
