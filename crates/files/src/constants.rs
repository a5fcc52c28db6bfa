/// Upper bound for a single decoded attachment payload (20 MiB).
pub const DEFAULT_MAX_PAYLOAD_BYTES: u64 = 20 * 1024 * 1024;
