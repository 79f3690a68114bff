//! Process exit codes. Part of the command contract: scripts use them to
//! tell a built cache from a skipped one.

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1; // Verification failed, or an upstream error
pub const INVALID_SETTINGS: i32 = 2; // Bad pattern or unreadable confcache.toml
pub const GUARD_SKIPPED: i32 = 3; // Only with --strict; otherwise a skip exits 0
