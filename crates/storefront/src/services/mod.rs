//! Business logic services for the notification service.
//!
//! - `email` - Order confirmation and owner alert emails

pub mod email;
