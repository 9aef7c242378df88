pub mod api_client;
pub mod config;
pub mod editor;
pub mod errors;
pub mod flags;
pub mod ini_file;
pub mod logging;
pub mod mailer;
pub mod message;
pub mod quota_checker;
