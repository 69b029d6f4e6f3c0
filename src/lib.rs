//! LeadFlow Prospecting Pipeline Library
//!
//! Turns a company URL into enriched prospect leads: ICP synthesis, cohort projection,
//! search-grounded prospect discovery and profile enrichment, coordinated as one pipeline.
//!
//! # Modules
//!
//! - `profile`: URL → Ideal Customer Profile synthesis.
//! - `cohort`: ICP → cohort options projection.
//! - `discovery`: Search-grounded prospect discovery.
//! - `enrichment`: Lead enrichment against the profile-collection provider.
//! - `insights`: Profile record → lead insight blocks.
//! - `pipeline`: Discovery → enrichment coordination.
//! - `runs`: Pipeline runs polled over HTTP.
//! - `jobs`: Enrichment job-state table.
//! - `profile_cache`: Checksum-validated profile memoization.
//! - `circuit_breaker`: Breaker in front of the enrichment provider.
//! - `gemini_client`: Generative model REST client.
//! - `brightdata_client`: Enrichment provider dataset API client.
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `models`: Core data models.
//! - `webhook_handler`: Provider completion webhook handler.
//! - `webhook_models`: Webhook payload models.

pub mod brightdata_client;
pub mod circuit_breaker;
pub mod cohort;
pub mod config;
pub mod discovery;
pub mod enrichment;
pub mod errors;
pub mod gemini_client;
pub mod handlers;
pub mod insights;
pub mod jobs;
pub mod models;
pub mod pipeline;
pub mod profile;
pub mod profile_cache;
pub mod runs;
pub mod webhook_handler;
pub mod webhook_models;
