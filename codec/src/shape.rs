//! Struct shapes: the validated, ordered field list of a struct type.

use std::any::{type_name, Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use tracing::debug;

use crate::error::{CodecError, CodecResult, LimitKind, StructDefinitionError};
use crate::field::{FieldDescriptor, FieldWidth, ValueKind};
use crate::limits::CodecLimits;
use crate::value::{FieldRef, FieldValue};

/// A record that can be read from and written to a bitstream.
///
/// `describe` lists the fields; the accessors move values in and out by field
/// name. A struct that extends another (e.g. a packet sharing a fixed header)
/// appends its fields to the other's description and delegates the
/// accessors for the shared names.
pub trait BinaryStruct: Any + Send {
    /// The declared fields, in any order.
    fn describe() -> Vec<FieldDescriptor>
    where
        Self: Sized;

    /// Borrows the current value of field `name`.
    fn field(&self, name: &str) -> Option<FieldRef<'_>>;

    /// Assigns a decoded value to field `name`.
    fn set_field(&mut self, name: &str, value: FieldValue) -> CodecResult<()>;
}

/// The resolved field list of one struct type, sorted by index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructShape {
    type_name: &'static str,
    fields: Vec<FieldDescriptor>,
}

impl StructShape {
    /// Sorts and validates a field list.
    pub fn from_fields(
        type_name: &'static str,
        mut fields: Vec<FieldDescriptor>,
    ) -> Result<Self, StructDefinitionError> {
        fields.sort_by_key(|field| field.index);
        let shape = Self { type_name, fields };
        shape.validate()?;
        Ok(shape)
    }

    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Fields in read/write order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter()
    }

    fn validate(&self) -> Result<(), StructDefinitionError> {
        let ty = self.type_name;
        let mut names = HashSet::new();
        for (position, field) in self.fields.iter().enumerate() {
            if let Some(previous) = position.checked_sub(1).map(|p| &self.fields[p]) {
                if previous.index == field.index {
                    return Err(StructDefinitionError::DuplicateIndex {
                        ty,
                        index: field.index,
                        first: previous.name,
                        second: field.name,
                    });
                }
            }
            if !names.insert(field.name) {
                return Err(StructDefinitionError::DuplicateName {
                    ty,
                    field: field.name,
                });
            }
            self.validate_width(position, field)?;
        }
        Ok(())
    }

    fn validate_width(
        &self,
        position: usize,
        field: &FieldDescriptor,
    ) -> Result<(), StructDefinitionError> {
        let ty = self.type_name;
        match field.width {
            FieldWidth::Bits(bits) => {
                if field.kind == ValueKind::Custom {
                    return Err(StructDefinitionError::MissingSerializer {
                        ty,
                        field: field.name,
                    });
                }
                let too_wide = field.kind.max_bits().is_some_and(|max| bits > max);
                if bits == 0 || too_wide {
                    return Err(StructDefinitionError::InvalidWidth {
                        ty,
                        field: field.name,
                        kind: field.kind,
                        bits,
                    });
                }
            }
            FieldWidth::LengthOf {
                field: length_field,
                multiplier,
            } => {
                if field.kind == ValueKind::Custom {
                    return Err(StructDefinitionError::MissingSerializer {
                        ty,
                        field: field.name,
                    });
                }
                if field.kind == ValueKind::Bool {
                    return Err(StructDefinitionError::UnsizedKind {
                        ty,
                        field: field.name,
                        kind: field.kind,
                    });
                }
                if multiplier == 0 {
                    return Err(StructDefinitionError::InvalidMultiplier {
                        ty,
                        field: field.name,
                    });
                }
                let Some(length_position) =
                    self.fields.iter().position(|f| f.name == length_field)
                else {
                    return Err(StructDefinitionError::UnknownLengthField {
                        ty,
                        field: field.name,
                        length_field,
                    });
                };
                if length_position >= position {
                    return Err(StructDefinitionError::LengthFieldOutOfOrder {
                        ty,
                        field: field.name,
                        length_field,
                    });
                }
                if !matches!(
                    self.fields[length_position].kind,
                    ValueKind::Int | ValueKind::Byte
                ) {
                    return Err(StructDefinitionError::LengthFieldNotInteger {
                        ty,
                        field: field.name,
                        length_field,
                    });
                }
            }
            FieldWidth::Custom(_) => {}
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a StructShape {
    type Item = &'a FieldDescriptor;
    type IntoIter = std::slice::Iter<'a, FieldDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

type ShapeCache = RwLock<HashMap<TypeId, Arc<StructShape>>>;

fn shape_cache() -> &'static ShapeCache {
    static CACHE: OnceLock<ShapeCache> = OnceLock::new();
    CACHE.get_or_init(ShapeCache::default)
}

/// Returns the shape of `T`, resolving and caching it on first use.
///
/// Definition errors are reported on every call and never cached.
pub fn resolve<T: BinaryStruct>() -> CodecResult<Arc<StructShape>> {
    let key = TypeId::of::<T>();
    if let Some(shape) = shape_cache()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&key)
    {
        return Ok(Arc::clone(shape));
    }

    let shape = Arc::new(StructShape::from_fields(type_name::<T>(), T::describe())?);
    let mut cache = shape_cache()
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    let shape = cache.entry(key).or_insert_with(|| {
        debug!(
            ty = shape.type_name(),
            fields = shape.len(),
            "resolved struct shape"
        );
        shape
    });
    Ok(Arc::clone(shape))
}

/// Computes the bit width of `field` for the current state of `owner`.
pub(crate) fn field_bits<T: BinaryStruct>(
    field: &FieldDescriptor,
    owner: &T,
    limits: &CodecLimits,
) -> CodecResult<usize> {
    let bits = match field.width {
        FieldWidth::Bits(bits) => bits as usize,
        FieldWidth::LengthOf {
            field: length_field,
            multiplier,
        } => {
            let len = owner
                .field(length_field)
                .ok_or_else(|| CodecError::unknown_field::<T>(length_field))?
                .as_int()?;
            len.checked_mul(u64::from(multiplier))
                .and_then(|bits| usize::try_from(bits).ok())
                .ok_or(CodecError::LimitsExceeded {
                    kind: LimitKind::FieldBytes,
                    limit: limits.max_field_bytes,
                    actual: usize::MAX,
                })?
        }
        FieldWidth::Custom(_) => return Ok(0),
    };
    let bytes = bits.div_ceil(8);
    if bytes > limits.max_field_bytes {
        return Err(CodecError::LimitsExceeded {
            kind: LimitKind::FieldBytes,
            limit: limits.max_field_bytes,
            actual: bytes,
        });
    }
    Ok(bits)
}
