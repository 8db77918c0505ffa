//! HTTP request handlers organized by functionality

pub mod auth;
pub mod consents;
pub mod employees;
pub mod health;
pub mod organisations;
pub mod osint;
pub mod scan;
