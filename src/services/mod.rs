//! Service layer containing the cache pipeline and its collaborators.
//!
//! ## Service map
//! - `guard.rs`: risk scanner trait + recursive source scan.
//! - `sources.rs`: configuration sources, env file parsing, `${VAR}` lookups.
//! - `bootstrap.rs`: fresh bootstrap context and source resolution.
//! - `codec.rs`: artifact encode/decode/write.
//! - `verify.rs`: read-back verification with artifact rollback.
//! - `pipeline.rs`: the clear/guard/build/write/verify state machine.
//! - `settings.rs`: `confcache.toml` loading and layout resolution.
//! - `storage.rs`: filesystem primitives + cache clearing.
//! - `output.rs`: JSON/text output helpers.
//!
//! ## Conventions
//! - Prefer pure helpers where possible.
//! - Side effects go through `storage::Filesystem` when they touch the artifact.
//! - Keep command handlers thin; delegate to services.

pub mod bootstrap;
pub mod codec;
pub mod guard;
pub mod output;
pub mod pipeline;
pub mod settings;
pub mod sources;
pub mod storage;
pub mod verify;
