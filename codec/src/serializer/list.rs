//! Repeated nested structs framed by a caller-supplied predicate.

use std::any::Any;
use std::fmt;
use std::io::{Read, Write};
use std::marker::PhantomData;

use tracing::trace;

use super::FieldSerializer;
use crate::config::CodecConfig;
use crate::error::{CodecError, CodecResult, LimitKind};
use crate::field::FieldDescriptor;
use crate::reader::StructReader;
use crate::shape::BinaryStruct;
use crate::value::{FieldRef, FieldValue};
use crate::writer::StructWriter;

/// Describes a homogeneous list of nested structs.
///
/// The field value is a `Vec<Self::Item>`.
pub trait StructList: Send + Sync + 'static {
    type Item: BinaryStruct + Default;

    /// Decides whether another item follows.
    ///
    /// `bytes` counts the bytes consumed by the items read so far and
    /// `parent` is the enclosing struct, already populated up to this field.
    fn read_next(items: usize, bytes: usize, field: &FieldDescriptor, parent: &dyn Any) -> bool;
}

/// Serializer for fields declared with a [`StructList`].
pub struct StructListSerializer<L>(PhantomData<fn() -> L>);

impl<L> Default for StructListSerializer<L> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<L> fmt::Debug for StructListSerializer<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StructListSerializer")
    }
}

impl<L: StructList> FieldSerializer for StructListSerializer<L> {
    fn read(
        &self,
        source: &mut dyn Read,
        field: &FieldDescriptor,
        parent: &dyn Any,
        config: &CodecConfig,
    ) -> CodecResult<FieldValue> {
        let mut reader = StructReader::with_config(source, config.clone());
        let mut items: Vec<L::Item> = Vec::new();
        let mut bytes = 0;
        while L::read_next(items.len(), bytes, field, parent) {
            check_items(items.len() + 1, config)?;
            let mut item = L::Item::default();
            bytes += reader.read(&mut item)?;
            items.push(item);
        }
        trace!(field = field.name, items = items.len(), bytes, "read struct list");
        Ok(FieldValue::Custom(Box::new(items)))
    }

    fn write(
        &self,
        sink: &mut dyn Write,
        value: FieldRef<'_>,
        field: &FieldDescriptor,
        config: &CodecConfig,
    ) -> CodecResult<()> {
        let items = value.as_custom::<Vec<L::Item>>()?;
        check_items(items.len(), config)?;
        let mut writer = StructWriter::with_config(sink, config.clone());
        for item in items {
            writer.write(item)?;
        }
        writer.flush()?;
        trace!(field = field.name, items = items.len(), "wrote struct list");
        Ok(())
    }
}

fn check_items(count: usize, config: &CodecConfig) -> CodecResult<()> {
    if count > config.limits.max_list_items {
        return Err(CodecError::LimitsExceeded {
            kind: LimitKind::ListItems,
            limit: config.limits.max_list_items,
            actual: count,
        });
    }
    Ok(())
}
