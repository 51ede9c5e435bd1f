//! Core library for the streamguard safety-filtering streaming proxy.
//!
//! Two binaries are built from this crate: `gateway`, the front door that
//! streams an upstream chat-completions generator to clients while gating
//! each emitted window through a guardrail classifier, and `guardrail`, the
//! batching classification service the gateway calls into.

pub mod categories;
pub mod chat;
pub mod config;
pub mod error;
pub mod gateway;
pub mod guardrail_client;
pub mod guardrail_service;
pub mod upstream;
pub mod window;
