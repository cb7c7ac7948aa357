//! Background jobs - queued account notification emails.

mod notification;

pub use notification::{notification_job_handler, NotificationJob, NotificationKind, Recipient};
