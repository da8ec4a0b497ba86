//! # Contact Messages
//!
//! Inbox for messages submitted through the public contact form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One message submitted through the contact form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactMessage {
    /// Unique message identifier
    pub id: Uuid,

    /// Sender name
    pub name: String,

    /// Sender email
    pub email: String,

    /// Optional subject line
    pub subject: Option<String>,

    /// Message body
    pub body: String,

    /// Submission timestamp
    pub sent_at: DateTime<Utc>,
}

impl ContactMessage {
    /// Create a new message
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        subject: Option<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            subject,
            body: body.into(),
            sent_at: Utc::now(),
        }
    }
}
