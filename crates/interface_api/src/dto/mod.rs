//! Request/response data transfer objects

pub mod documents;
pub mod reference;
pub mod reports;
