pub mod auth;
pub mod chat;
pub mod home;
pub mod notifications;
pub mod profile;
pub mod render;
pub mod saved;
pub mod search;
