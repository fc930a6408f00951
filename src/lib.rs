//! # kgenrich: knowledge-graph enrichment with a local model server
//!
//! Analyzes Python source with Tree-sitter, asks a locally hosted Ollama model
//! to describe each class and function, and writes the annotations back onto
//! existing knowledge-graph nodes. Also ships a smoke test for the local
//! sentence-embedding pipeline.
//!
//! ## Architecture
//!
//! - **[`config`]**: Configuration loading, environment overrides, validation
//! - **[`ollama`]**: Blocking client for the Ollama HTTP API (`/api/tags`, `/api/generate`)
//! - **[`extractor`]**: Tree-sitter entity parsing, prompts, per-entity analysis
//! - **[`graph`]**: Graph session capability, enrichment driver, SQLite-backed graph
//! - **[`embedder`]**: Text embedding via ONNX Runtime (sentence-transformers models)
//! - **[`smoke`]**: Embedding quality checks (dimensions, batch shape, similarity)
//! - **[`logging`]**: `tracing` subscriber setup shared by the binaries

pub mod config;
pub mod embedder;
pub mod extractor;
pub mod graph;
pub mod logging;
pub mod ollama;
pub mod smoke;
