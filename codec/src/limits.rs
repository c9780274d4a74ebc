//! Limits enforced while reading and writing structs.

/// Codec-specific limits that bound allocation driven by untrusted input.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CodecLimits {
    /// Maximum number of bytes a single field may span.
    pub max_field_bytes: usize,
    /// Maximum number of items a list serializer will decode or encode.
    pub max_list_items: usize,
}

impl Default for CodecLimits {
    fn default() -> Self {
        Self {
            max_field_bytes: 64 * 1024,
            max_list_items: 4096,
        }
    }
}

impl CodecLimits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_field_bytes: 256,
            max_list_items: 16,
        }
    }

    /// Creates limits with no restrictions (use with caution).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_field_bytes: usize::MAX,
            max_list_items: usize::MAX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_reasonable() {
        let limits = CodecLimits::default();
        assert!(limits.max_field_bytes >= 1024);
        assert!(limits.max_list_items > 0);
    }

    #[test]
    fn testing_limits_smaller() {
        let default = CodecLimits::default();
        let testing = CodecLimits::for_testing();
        assert!(testing.max_field_bytes < default.max_field_bytes);
        assert!(testing.max_list_items < default.max_list_items);
    }

    #[test]
    fn unlimited_limits_max() {
        let limits = CodecLimits::unlimited();
        assert_eq!(limits.max_field_bytes, usize::MAX);
        assert_eq!(limits.max_list_items, usize::MAX);
    }
}
