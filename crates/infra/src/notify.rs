//! Outbound notices (account emails and review reminders).
//!
//! Delivery is fire-and-forget: a failed send is logged and never rolls back
//! the operation that triggered it.

use std::sync::Mutex;

use thiserror::Error;
use tracing::{info, warn};

use hrspace_core::Email;

/// Message to deliver. Carries plaintext secrets, so it has no `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub enum Notice {
    /// Confirm a self-registered account.
    VerifyOnly {
        name: String,
        email: Email,
        confirmation_code: String,
    },
    /// New password for an already verified account.
    PasswordOnly {
        name: String,
        email: Email,
        password: String,
    },
    /// New credential that still needs verification.
    PasswordAndVerify {
        name: String,
        email: Email,
        password: String,
        confirmation_code: String,
        /// Who created the credential, shown in the message.
        sender: String,
    },
    /// Ask a reviewer to complete a review.
    ReviewReminder {
        reviewer_name: String,
        reviewee_name: String,
        email: Email,
        link: String,
    },
}

impl Notice {
    pub fn kind(&self) -> &'static str {
        match self {
            Notice::VerifyOnly { .. } => "verify_only",
            Notice::PasswordOnly { .. } => "password_only",
            Notice::PasswordAndVerify { .. } => "password_and_verify",
            Notice::ReviewReminder { .. } => "review_reminder",
        }
    }

    pub fn recipient(&self) -> &Email {
        match self {
            Notice::VerifyOnly { email, .. }
            | Notice::PasswordOnly { email, .. }
            | Notice::PasswordAndVerify { email, .. }
            | Notice::ReviewReminder { email, .. } => email,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("notice delivery failed: {0}")]
pub struct NotifyError(pub String);

pub trait Notifier: Send + Sync {
    fn send(&self, notice: &Notice) -> Result<(), NotifyError>;
}

/// Send and forget. Failures are logged.
pub fn dispatch(notifier: &dyn Notifier, notice: Notice) {
    match notifier.send(&notice) {
        Ok(()) => info!(kind = notice.kind(), to = %notice.recipient(), "notice sent"),
        Err(err) => warn!(kind = notice.kind(), to = %notice.recipient(), error = %err, "notice not delivered"),
    }
}

/// Logs notices instead of delivering them.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn send(&self, notice: &Notice) -> Result<(), NotifyError> {
        info!(kind = notice.kind(), to = %notice.recipient(), "outbound notice");
        Ok(())
    }
}

/// Keeps every notice in memory; can be told to fail.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notice>>,
    failing: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose every send fails (after recording the attempt).
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    pub fn sent(&self) -> Vec<Notice> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.sent().iter().map(Notice::kind).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn send(&self, notice: &Notice) -> Result<(), NotifyError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(notice.clone());
        }
        if self.failing {
            return Err(NotifyError("mail server unavailable".to_string()));
        }
        Ok(())
    }
}
