//! Email adapters.
//!
//! - `resend` - Resend HTTP API
//! - `smtp` - SMTP relay via lettre
//! - `recording` - Captures messages for tests

mod recording;
mod resend;
mod smtp;

pub use recording::RecordingMailer;
pub use resend::{ResendConfig, ResendMailer};
pub use smtp::{SmtpConfig, SmtpMailer};
