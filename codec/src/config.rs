//! Reader/writer configuration.

use crate::limits::CodecLimits;

/// How custom serializer instances are obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SerializerCache {
    /// One process-wide instance per serializer type.
    #[default]
    Shared,
    /// A fresh instance for every field use.
    Disabled,
}

/// Configuration shared by [`StructReader`](crate::StructReader) and
/// [`StructWriter`](crate::StructWriter).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CodecConfig {
    pub limits: CodecLimits,
    pub serializer_cache: SerializerCache,
}

impl CodecConfig {
    #[must_use]
    pub fn with_limits(mut self, limits: CodecLimits) -> Self {
        self.limits = limits;
        self
    }

    #[must_use]
    pub fn with_serializer_cache(mut self, cache: SerializerCache) -> Self {
        self.serializer_cache = cache;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_shares_serializers() {
        let config = CodecConfig::default();
        assert_eq!(config.serializer_cache, SerializerCache::Shared);
        assert_eq!(config.limits, CodecLimits::default());
    }

    #[test]
    fn builder_overrides() {
        let config = CodecConfig::default()
            .with_limits(CodecLimits::for_testing())
            .with_serializer_cache(SerializerCache::Disabled);
        assert_eq!(config.limits, CodecLimits::for_testing());
        assert_eq!(config.serializer_cache, SerializerCache::Disabled);
    }
}
