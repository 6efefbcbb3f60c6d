pub mod attachment;
pub mod chat;
pub mod composer;
pub mod dashboard;
pub mod errors;
pub mod gateway;
pub mod models;
pub mod prompt;
pub mod providers;
pub mod recorder;
pub mod session;
pub mod transcript;
