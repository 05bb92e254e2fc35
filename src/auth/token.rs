//! Token secrets, salted digests, and persisted records.

pub mod record;
pub mod secret;
