//! Custom field serializers and the process-wide instance registry.

mod length_prefixed;
mod list;

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use tracing::debug;

use crate::config::{CodecConfig, SerializerCache};
use crate::error::CodecResult;
use crate::field::{FieldDescriptor, SerializerRef};
use crate::value::{FieldRef, FieldValue};

pub use length_prefixed::LengthPrefixedSerializer;
pub use list::{StructList, StructListSerializer};

/// Reads and writes one field wholesale, bypassing fixed-width packing.
///
/// The codec aligns the stream to a byte boundary before calling either
/// method, so implementations work on whole bytes only.
pub trait FieldSerializer: Send + Sync + 'static {
    /// Decodes the field from `source`.
    ///
    /// `parent` is the struct being populated; fields with a lower index
    /// already hold their decoded values.
    fn read(
        &self,
        source: &mut dyn Read,
        field: &FieldDescriptor,
        parent: &dyn Any,
        config: &CodecConfig,
    ) -> CodecResult<FieldValue>;

    /// Encodes `value` into `sink`.
    fn write(
        &self,
        sink: &mut dyn Write,
        value: FieldRef<'_>,
        field: &FieldDescriptor,
        config: &CodecConfig,
    ) -> CodecResult<()>;
}

/// Cache of serializer instances, one per implementation type.
#[derive(Default)]
pub struct SerializerRegistry {
    instances: RwLock<HashMap<TypeId, Arc<dyn FieldSerializer>>>,
}

impl SerializerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry used by every reader and writer.
    pub fn global() -> &'static Self {
        static REGISTRY: OnceLock<SerializerRegistry> = OnceLock::new();
        REGISTRY.get_or_init(Self::new)
    }

    /// Returns an instance of `serializer` according to `cache`.
    pub fn resolve(
        &self,
        serializer: &SerializerRef,
        cache: SerializerCache,
    ) -> Arc<dyn FieldSerializer> {
        match cache {
            SerializerCache::Shared => self.shared(serializer),
            SerializerCache::Disabled => serializer.instantiate(),
        }
    }

    /// Returns the cached instance, creating it on first use.
    pub fn shared(&self, serializer: &SerializerRef) -> Arc<dyn FieldSerializer> {
        if let Some(instance) = self
            .instances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&serializer.type_id())
        {
            return Arc::clone(instance);
        }

        let mut instances = self
            .instances
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let instance = instances.entry(serializer.type_id()).or_insert_with(|| {
            debug!(serializer = serializer.name(), "caching serializer instance");
            serializer.instantiate()
        });
        Arc::clone(instance)
    }

    /// Returns `true` if an instance of `serializer` is cached.
    pub fn is_cached(&self, serializer: &SerializerRef) -> bool {
        self.instances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&serializer.type_id())
    }

    /// Number of cached instances.
    pub fn len(&self) -> usize {
        self.instances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for SerializerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerializerRegistry")
            .field("cached", &self.len())
            .finish()
    }
}
