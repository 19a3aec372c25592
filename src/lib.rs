//! # pixfit
//!
//! Fit arbitrary images into pixel bounds and byte budgets, for storage as
//! inline document fields. Transparent formats keep their container and
//! their alpha channel; heavy opaque formats are flattened to JPEG; and an
//! iterative compressor trades quality first, geometry second, until the
//! output fits the budget.
//!
//! # Architecture: One Pipeline, One Batch Layer
//!
//! The product is the [`pipeline`] module — a pure transform from input
//! bytes + constraints to output bytes + metadata:
//!
//! ```text
//! decode → classify format → fit dimensions → rasterize → compress loop → package
//! ```
//!
//! Everything else is the batch layer that feeds it: input collection,
//! parallelism, caching, progress display, and reporting. The split exists
//! for three reasons:
//!
//! - **Statelessness**: a pipeline invocation owns all of its state and
//!   retains none of it, so concurrent invocations need no locking.
//! - **Testability**: the compressor runs against an [`pipeline::ImageBackend`]
//!   trait, so every loop transition is unit tested with a mock encoder
//!   returning scripted byte sizes — no real codecs involved.
//! - **Embeddability**: callers that already have bytes in hand use
//!   [`pipeline::normalize`] directly and never touch the filesystem.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pipeline`] | The normalization pipeline: formats, dimension math, rasterizer, compressor, entry point |
//! | [`batch`] | Walks inputs, runs the pipeline in parallel via rayon, streams progress events, writes reports |
//! | [`cache`] | Content-addressed skip cache so unchanged files aren't re-encoded across runs |
//! | [`config`] | Optional `pixfit.toml` loading, validation, and the documented stock config |
//! | [`output`] | CLI output formatting — pure `format_*` functions, `print_*` wrappers |
//!
//! # Design Decisions
//!
//! ## Capabilities Over Format Lists
//!
//! The pipeline never asks "is this PNG or GIF or WebP?" — it asks the
//! [`pipeline::ImageKind`] variant for its `supports_alpha` and
//! `supports_quality` capabilities. The rasterizer's flattening policy and
//! the compressor's choice of lever both read those flags, so adding a
//! container touches one file.
//!
//! ## A Bounded Loop, Not a Callback Chain
//!
//! The compressor is a single driving loop with an explicit iteration
//! ceiling and a defined terminal failure
//! ([`pipeline::PipelineError::BudgetExceeded`]). Inputs whose geometry
//! degenerates to 1×1 before fitting the budget return the smallest attempt
//! rather than spinning.
//!
//! ## Pass-Through Is Byte-Identical
//!
//! An input already inside every constraint is returned untouched — no
//! decode/re-encode round trip, so pixels and alpha are bit-exact and the
//! output can never be larger than the input.
//!
//! ## Pure-Rust Codecs (No ImageMagick, No FFmpeg)
//!
//! Decoding and encoding go through the `image` crate — pure Rust,
//! statically linked. No system dependencies, no version conflicts; the
//! binary is fully self-contained.

pub mod batch;
pub mod cache;
pub mod config;
pub mod output;
pub mod pipeline;
