//! Client orchestrator for the AI web summarizer backend.
//!
//! Extracts readable text from web pages, submits summarize/chat
//! requests and long-running jobs (image text detection, audio
//! transcription), polls job status until a terminal state, and routes
//! results into registered UI sinks. All AI computation, authentication
//! and storage live in the remote backend; this crate owns only the
//! HTTP orchestration, the polling state machine and result routing.

pub mod config;
pub mod models;
pub mod services;
pub mod session;
