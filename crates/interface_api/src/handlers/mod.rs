//! Request handlers

pub mod documents;
pub mod health;
pub mod reference;
pub mod reports;
