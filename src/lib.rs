//! RecruitAIr
//!
//! Tracks job offers, applicants, criteria and per-criterion scores, and runs two
//! background pipelines against a remote AI service: the extractor (job offer text →
//! criteria) and the evaluator (applicant CV × criterion → score).

pub mod app_state;
pub mod config;
pub mod db;
pub mod models;
pub mod pipeline;
pub mod routes;
pub mod services;
pub mod telemetry;
