//! Terminal dashboard for looking up GitHub repositories and browsing their
//! issues.
//!
//! The [`store::Store`] owns everything fetched from the API and hands out
//! immutable snapshots; [`app::App`] turns key presses into fetches and
//! [`ui`] draws the current snapshot.

pub mod action;
pub mod app;
pub mod config;
pub mod error;
pub mod event;
pub mod forge;
pub mod github;
pub mod route;
pub mod store;
pub mod tui;
pub mod types;
pub mod ui;
pub mod views;
