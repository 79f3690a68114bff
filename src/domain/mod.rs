//! Shared data model layer (types only).
//!
//! ## Files
//! - `value.rs`: the configuration tree (`ConfigValue`/`ConfigMap`) and its
//!   pure helpers (deep merge, structural diff).
//! - `models.rs`: layout, settings file, scan/cache reports, JSON envelopes.
//! - `errors.rs`: typed errors surfaced by the pipeline and settings layer.
//!
//! ## Rule of thumb
//! Domain types should be data-only: no filesystem side effects.
//!
//! ## Compatibility note
//! Report structs are serialized under `--json`; keep them in sync with
//! `docs/contracts/*`.

pub mod errors;
pub mod models;
pub mod value;
