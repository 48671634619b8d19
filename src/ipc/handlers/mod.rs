pub mod auth;
pub mod buses;
pub mod core;
pub mod fees;
pub mod lists;
pub mod notifications;
pub mod payments;
pub mod profile;
pub mod recovery;
pub mod reports;
pub mod school;
pub mod staff;
pub mod whatsapp;
