//! Terminal to-do list manager: a task store persisted as JSON, driven by a
//! ratatui interface.

pub mod app;
pub mod config;
pub mod models;
pub mod notify;
pub mod parser;
pub mod storage;
pub mod store;
pub mod ui;
