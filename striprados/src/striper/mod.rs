//! Striping client
//!
//! A logical file is cut into stripe units that are dealt round-robin over
//! `stripe_count` backing objects named `key.<index:016x>`. The head object
//! (index 0) carries the file size and the layout it was written with.
//!
//! Submodules:
//! - `layout`: stripe unit / object size / stripe count and offset mapping
//! - `util`: range splitting and object naming
//! - `writer`: stream -> backing objects, finalizes `striper.size`
//! - `reader`: backing objects -> stream, bounded by `striper.size`
//! - `scanner`: enumerates logical files from head objects
//! - `progress`: transfer progress reporting
pub mod layout;
pub mod progress;
pub mod reader;
pub mod scanner;
pub mod util;
pub mod writer;

/// Logical file length, decimal ASCII, on the head object only.
pub const SIZE_ATTR: &str = "striper.size";
pub const STRIPE_UNIT_ATTR: &str = "striper.layout.stripe_unit";
pub const STRIPE_COUNT_ATTR: &str = "striper.layout.stripe_count";
pub const OBJECT_SIZE_ATTR: &str = "striper.layout.object_size";

/// Read/write chunk size, independent of the stripe unit.
pub const DEFAULT_BUFFER_SIZE: usize = 2 << 20; // 2 MiB

/// Parse a decimal attribute value; trailing NULs and whitespace are
/// tolerated since C writers often store the terminator too.
pub(crate) fn parse_decimal(raw: &[u8]) -> Option<u64> {
    std::str::from_utf8(raw)
        .ok()?
        .trim_matches(|c: char| c == '\0' || c.is_ascii_whitespace())
        .parse()
        .ok()
}
