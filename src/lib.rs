//! Toolsmith: HTML Tool Generation with Provider Failover
//!
//! Turns a free-text request into a self-contained HTML tool page. Requests are
//! resolved in a fixed order: reuse of a previously generated artifact, a canned
//! template for stock tools, then AI generation across an ordered list of
//! backend providers with sticky failover.

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod failover;
pub mod keywords;
pub mod logging;
pub mod pipeline;
pub mod provider;
pub mod store;
pub mod template;
pub mod validation;
