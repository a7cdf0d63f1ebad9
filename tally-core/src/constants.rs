//! Key layout and cache defaults.
//!
//! Every key the recorder or the fetch cache writes is derived from these
//! values, so changing them orphans existing history in a live store.

// ═══════════════════════════════════════════════════════════════════════════════
// KEY LAYOUT
// ═══════════════════════════════════════════════════════════════════════════════

/// Suffix of the list holding serialized call inputs: `{identity}:inputs`.
pub const INPUTS_SUFFIX: &str = ":inputs";

/// Suffix of the list holding serialized call outputs: `{identity}:outputs`.
pub const OUTPUTS_SUFFIX: &str = ":outputs";

/// Prefix of per-resource access counters: `count:{resource}`.
pub const ACCESS_COUNT_PREFIX: &str = "count:";

// ═══════════════════════════════════════════════════════════════════════════════
// FETCH CACHE DEFAULTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Lifetime of an access counter after its most recent access, in seconds.
pub const DEFAULT_ACCESS_TTL_SECONDS: u64 = 10;

/// Maximum number of memoized fetch results held in-process.
pub const DEFAULT_MEMO_CAPACITY: usize = 128;

/// HTTP request timeout for page fetches, in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 30;

// ═══════════════════════════════════════════════════════════════════════════════
// DATA CACHE
// ═══════════════════════════════════════════════════════════════════════════════

/// Identity under which `DataCache::store` calls are recorded.
pub const DATA_CACHE_STORE_IDENTITY: &str = "Cache.store";
