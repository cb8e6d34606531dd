pub mod admin;
pub mod artists;
pub mod auth;
pub mod comments;
pub mod favorites;
pub mod folders;
pub mod health;
pub mod playlists;
pub mod reports;
pub mod songs;
pub mod subscriptions;
pub mod uploads;
pub mod verification;
