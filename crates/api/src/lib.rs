//! `brigade-api` — HTTP surface for the back office.

pub mod app;
pub mod authz;
pub mod context;
pub mod jwt;
pub mod middleware;
