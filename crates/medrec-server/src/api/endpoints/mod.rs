//! Route handlers, one module per role.

pub mod admin;
pub mod auth;
pub mod bio_analyst;
pub mod doctor;
pub mod patient;
pub mod pharmacist;
