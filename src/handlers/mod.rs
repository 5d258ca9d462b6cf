pub mod auth;
pub mod dashboard;
pub mod entries;
pub mod health;
pub mod images;
pub mod steps;
