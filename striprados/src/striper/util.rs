//! Helpers: split logical ranges along stripe boundaries, name backing
//! objects.

use super::layout::LayoutPolicy;

/// Width of the zero-padded object index in backing object names.
pub const OBJECT_INDEX_WIDTH: usize = 16;
const HEAD_SUFFIX: &str = "0000000000000000";

/// A piece of a logical range that lives contiguously in one backing object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripeSpan {
    pub object_index: u64,
    pub object_offset: u64,
    pub len: usize,
}

/// Split the logical range [offset, offset+len) into per-object spans,
/// each bounded by the end of its stripe unit.
pub fn split_range(layout: LayoutPolicy, mut offset: u64, len: usize) -> Vec<StripeSpan> {
    let mut remaining = len as u64;
    let mut out = Vec::new();
    while remaining > 0 {
        let ext = layout.locate(offset);
        let take = ext.stripe_remaining.min(remaining);
        out.push(StripeSpan {
            object_index: ext.object_index,
            object_offset: ext.object_offset,
            len: take as usize,
        });
        offset += take;
        remaining -= take;
    }
    out
}

/// `key.%016x`
pub fn object_name(key: &str, object_index: u64) -> String {
    format!("{key}.{object_index:0width$x}", width = OBJECT_INDEX_WIDTH)
}

pub fn head_object_name(key: &str) -> String {
    object_name(key, 0)
}

/// Logical name for a head object, `None` for any other object.
pub fn head_key(object: &str) -> Option<&str> {
    let (key, suffix) = object.rsplit_once('.')?;
    (suffix == HEAD_SUFFIX).then_some(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_within_single_unit() {
        let layout = LayoutPolicy::default();
        let spans = split_range(layout, 123, 4096);
        assert_eq!(
            spans,
            vec![StripeSpan {
                object_index: 0,
                object_offset: 123,
                len: 4096
            }]
        );
    }

    #[test]
    fn test_split_across_lanes() {
        let layout = LayoutPolicy::new(4, 8, 2).unwrap();
        // units: 0->obj0@0, 1->obj1@0, 2->obj0@4, 3->obj1@4, 4->obj2@0
        let spans = split_range(layout, 2, 16);
        let got: Vec<(u64, u64, usize)> = spans
            .iter()
            .map(|s| (s.object_index, s.object_offset, s.len))
            .collect();
        assert_eq!(
            got,
            vec![(0, 2, 2), (1, 0, 4), (0, 4, 4), (1, 4, 4), (2, 0, 2)]
        );
        assert_eq!(spans.iter().map(|s| s.len).sum::<usize>(), 16);
    }

    #[test]
    fn test_zero_len() {
        let layout = LayoutPolicy::default();
        assert!(split_range(layout, 77, 0).is_empty());
    }

    #[test]
    fn test_object_names() {
        assert_eq!(object_name("foo", 0), "foo.0000000000000000");
        assert_eq!(object_name("foo", 1), "foo.0000000000000001");
        assert_eq!(object_name("foo", 26), "foo.000000000000001a");
        assert_eq!(head_object_name("a.b"), "a.b.0000000000000000");
    }

    #[test]
    fn test_head_key() {
        assert_eq!(head_key("foo.0000000000000000"), Some("foo"));
        assert_eq!(head_key("a.b.0000000000000000"), Some("a.b"));
        assert_eq!(head_key(".0000000000000000"), Some(""));
        assert_eq!(head_key("foo.0000000000000001"), None);
        assert_eq!(head_key("foo.00000000000000000"), None);
        assert_eq!(head_key("foo.000000000000000"), None);
        assert_eq!(head_key("foo"), None);
    }
}
