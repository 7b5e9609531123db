//! Striping layout: maps a logical file offset onto a backing object.
//!
//! Stripe units are dealt round-robin over `stripe_count` lanes. Each lane
//! fills one backing object with `object_size / stripe_unit` units before
//! the whole group (an object set) rolls over to the next `stripe_count`
//! objects.

use thiserror::Error;

pub const DEFAULT_STRIPE_UNIT: u64 = 512 << 10; // 512 KiB
pub const DEFAULT_OBJECT_SIZE: u64 = 4 << 20; // 4 MiB
pub const DEFAULT_STRIPE_COUNT: u64 = 4;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("stripe unit must be positive")]
    ZeroStripeUnit,
    #[error("object size must be positive")]
    ZeroObjectSize,
    #[error("object size {object_size} is not a multiple of stripe unit {stripe_unit}")]
    Misaligned { object_size: u64, stripe_unit: u64 },
    #[error("stripe count must be at least 1")]
    ZeroStripeCount,
    #[error("object set of {stripe_count} x {object_size} bytes exceeds the addressable range")]
    SetTooLarge { object_size: u64, stripe_count: u64 },
    #[error("invalid layout attribute {attr}: {value:?}")]
    BadAttribute { attr: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutPolicy {
    stripe_unit: u64,
    object_size: u64,
    stripe_count: u64,
}

/// Where one logical byte lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    pub object_index: u64,
    pub lane: u64,
    pub object_offset: u64,
    /// Bytes left in the current stripe unit, including this one.
    pub stripe_remaining: u64,
}

impl Default for LayoutPolicy {
    fn default() -> Self {
        Self {
            stripe_unit: DEFAULT_STRIPE_UNIT,
            object_size: DEFAULT_OBJECT_SIZE,
            stripe_count: DEFAULT_STRIPE_COUNT,
        }
    }
}

impl LayoutPolicy {
    pub fn new(stripe_unit: u64, object_size: u64, stripe_count: u64) -> Result<Self, LayoutError> {
        if stripe_unit == 0 {
            return Err(LayoutError::ZeroStripeUnit);
        }
        if object_size == 0 {
            return Err(LayoutError::ZeroObjectSize);
        }
        if object_size % stripe_unit != 0 {
            return Err(LayoutError::Misaligned {
                object_size,
                stripe_unit,
            });
        }
        if stripe_count == 0 {
            return Err(LayoutError::ZeroStripeCount);
        }
        // every offset computation stays below one object set per index
        if object_size.checked_mul(stripe_count).is_none() {
            return Err(LayoutError::SetTooLarge {
                object_size,
                stripe_count,
            });
        }
        Ok(Self {
            stripe_unit,
            object_size,
            stripe_count,
        })
    }

    pub fn stripe_unit(&self) -> u64 {
        self.stripe_unit
    }

    pub fn object_size(&self) -> u64 {
        self.object_size
    }

    pub fn stripe_count(&self) -> u64 {
        self.stripe_count
    }

    /// Stripe units one backing object holds.
    pub fn units_per_object(&self) -> u64 {
        self.object_size / self.stripe_unit
    }

    /// Logical bytes covered by one object set.
    pub fn object_set_size(&self) -> u64 {
        self.object_size * self.stripe_count
    }

    pub fn locate(&self, offset: u64) -> Extent {
        let unit = offset / self.stripe_unit;
        let within_unit = offset % self.stripe_unit;
        let stripe_no = unit / self.stripe_count;
        let lane = unit % self.stripe_count;
        let object_set = stripe_no / self.units_per_object();
        Extent {
            object_index: object_set * self.stripe_count + lane,
            lane,
            object_offset: (stripe_no % self.units_per_object()) * self.stripe_unit + within_unit,
            stripe_remaining: self.stripe_unit - within_unit,
        }
    }

    /// Number of backing objects a file of `size` bytes touches, counting
    /// the head object even for an empty file.
    pub fn object_count(&self, size: u64) -> u64 {
        if size == 0 {
            return 1;
        }
        let units = size.div_ceil(self.stripe_unit);
        let full_sets = (size - 1) / self.object_set_size();
        let units_in_last_set = units - full_sets * self.units_per_object() * self.stripe_count;
        full_sets * self.stripe_count + units_in_last_set.min(self.stripe_count)
    }
}
