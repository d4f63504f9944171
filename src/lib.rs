//! Fiber Analyzer
//!
//! Spreadsheet pipeline for optical fiber draw and measurement records, plus a
//! small runner window that launches it as a child process.

pub mod cli;
pub mod config;
pub mod data;
pub mod gui;
pub mod logging;
pub mod naming;
pub mod pipeline;
