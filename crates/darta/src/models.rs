//! These models represent the objects passed between the composer, the
//! conversation session, and the model provider.
//!
//! There are a few related formats we need to interact with:
//! - attachments staged by the view layer, before a message is composed
//! - the internal message/content structs the session keeps as history
//! - the Gemini generateContent wire format, built from the internal structs
//!
//! The wire format is always produced at the provider boundary with to/from
//! helpers; nothing outside `providers` touches raw JSON.
pub mod content;
pub mod message;
pub mod role;
pub mod tool;
