//! Object layouts and the builder that declares them.

use std::sync::Arc;

use crate::error::{TypeError, TypeResult};
use crate::field::{Field, FieldDescriptor, FieldKind, ObjectField, ValueField};
use crate::primitive::Primitive;

/// Type descriptor: a name, the ordered field declarations, and the offset
/// table derived from them.
///
/// Fields are packed back to back in declaration order, so the offset of
/// field `i` is the sum of the sizes of fields `0..i`. Array types carry an
/// element kind instead of fields; their fixed part is the length header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectType {
    name: String,
    fields: Vec<FieldDescriptor>,
    offsets: Vec<u64>,
    size: u64,
    element: Option<FieldKind>,
}

impl ObjectType {
    /// Size in bytes of an array's length header.
    pub const ARRAY_HEADER_SIZE: u64 = 8;

    /// Start declaring a type.
    pub fn builder(name: impl Into<String>) -> TypeBuilder {
        TypeBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Descriptor for an array of `element` values.
    pub fn array(name: impl Into<String>, element: FieldKind) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            fields: Vec::new(),
            offsets: Vec::new(),
            size: Self::ARRAY_HEADER_SIZE,
            element: Some(element),
        })
    }

    /// The registered name. Registries key reconstruction factories by it.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared byte size of one instance (the fixed header for arrays).
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Element kind, for array types.
    pub fn element(&self) -> Option<FieldKind> {
        self.element
    }

    pub fn is_array(&self) -> bool {
        self.element.is_some()
    }

    /// Look up a field declaration by index.
    pub fn field(&self, index: usize) -> TypeResult<&FieldDescriptor> {
        self.fields.get(index).ok_or_else(|| self.unknown(index))
    }

    /// Byte offset of the field at `index`.
    pub fn offset(&self, index: usize) -> TypeResult<u64> {
        self.offsets.get(index).copied().ok_or_else(|| self.unknown(index))
    }

    /// Byte offset of the field `handle` names, provided this type declares
    /// a field of the same kind and width at that index.
    pub fn checked_offset(&self, handle: &FieldDescriptor) -> TypeResult<u64> {
        let declared = self.field(handle.index())?;
        if declared.kind() != handle.kind() || declared.size() != handle.size() {
            return Err(TypeError::FieldMismatch {
                type_name: self.name.clone(),
                index: handle.index(),
                declared_kind: declared.kind(),
                declared_size: declared.size(),
                handle_kind: handle.kind(),
                handle_size: handle.size(),
            });
        }
        self.offset(handle.index())
    }

    fn unknown(&self, index: usize) -> TypeError {
        TypeError::UnknownField {
            type_name: self.name.clone(),
            index,
        }
    }
}

/// Accumulates field declarations and hands out typed handles for them.
///
/// ```
/// use pobj_types::{Field, ObjectType};
///
/// let mut builder = ObjectType::builder("geo.Point");
/// let x: Field<i32> = builder.field();
/// let y: Field<i32> = builder.field();
/// let point = builder.build();
///
/// assert_eq!(point.size(), 8);
/// assert_eq!(point.offset(x.index()).unwrap(), 0);
/// assert_eq!(point.offset(y.index()).unwrap(), 4);
/// ```
#[derive(Debug)]
pub struct TypeBuilder {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl TypeBuilder {
    /// Declare a primitive field holding `T`.
    pub fn field<T: Primitive>(&mut self) -> Field<T> {
        Field::from_descriptor(self.push_fixed(T::KIND))
    }

    /// Declare a reference field pointing at objects of type `T`.
    pub fn object_field<T>(&mut self) -> ObjectField<T> {
        ObjectField::from_descriptor(self.push_fixed(FieldKind::Reference))
    }

    /// Declare a value field embedding the bytes of `value_type`.
    pub fn value_field<T>(&mut self, value_type: &ObjectType) -> ValueField<T> {
        let descriptor = FieldDescriptor::value(self.fields.len(), value_type.size());
        self.fields.push(descriptor);
        ValueField::from_descriptor(descriptor)
    }

    /// Resolve offsets and freeze the descriptor.
    pub fn build(self) -> Arc<ObjectType> {
        let mut offsets = Vec::with_capacity(self.fields.len());
        let mut size = 0u64;
        for field in &self.fields {
            offsets.push(size);
            size += field.size();
        }
        Arc::new(ObjectType {
            name: self.name,
            fields: self.fields,
            offsets,
            size,
            element: None,
        })
    }

    fn push_fixed(&mut self, kind: FieldKind) -> FieldDescriptor {
        // Only called with fixed-width kinds.
        let index = self.fields.len();
        let descriptor =
            FieldDescriptor::fixed(index, kind).unwrap_or_else(|| FieldDescriptor::value(index, 0));
        self.fields.push(descriptor);
        descriptor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Point;

    #[test]
    fn offsets_are_packed_in_declaration_order() {
        let mut b = ObjectType::builder("Mixed");
        let flag: Field<bool> = b.field();
        let count: Field<i64> = b.field();
        let letter: Field<char> = b.field();
        let ty = b.build();

        assert_eq!(ty.offset(flag.index()).unwrap(), 0);
        assert_eq!(ty.offset(count.index()).unwrap(), 1);
        assert_eq!(ty.offset(letter.index()).unwrap(), 9);
        assert_eq!(ty.size(), 13);
    }

    #[test]
    fn checked_offset_accepts_own_handles() {
        let mut b = ObjectType::builder("Pair");
        let _tag: Field<u8> = b.field();
        let count: Field<u32> = b.field();
        let ty = b.build();
        assert_eq!(ty.checked_offset(count.descriptor()).unwrap(), 1);
    }

    #[test]
    fn checked_offset_rejects_handle_of_other_kind() {
        let mut ab = ObjectType::builder("Narrow");
        let _a: Field<i8> = ab.field();
        let _b: Field<i16> = ab.field();
        let narrow = ab.build();

        let mut wb = ObjectType::builder("Wide");
        let _x: Field<i64> = wb.field();
        let y: Field<i64> = wb.field();
        let _wide = wb.build();

        assert_eq!(
            narrow.checked_offset(y.descriptor()),
            Err(TypeError::FieldMismatch {
                type_name: "Narrow".into(),
                index: 1,
                declared_kind: FieldKind::Short,
                declared_size: 2,
                handle_kind: FieldKind::Long,
                handle_size: 8,
            })
        );
    }

    #[test]
    fn checked_offset_rejects_value_field_of_other_width() {
        let mut sb = ObjectType::builder("Small");
        let _v: Field<i32> = sb.field();
        let small = sb.build();
        let mut lb = ObjectType::builder("Large");
        let _v: Field<i64> = lb.field();
        let large = lb.build();

        let mut hb = ObjectType::builder("Holder");
        let _inner: ValueField<Point> = hb.value_field(&small);
        let holder = hb.build();

        let mut ob = ObjectType::builder("OtherHolder");
        let inner: ValueField<Point> = ob.value_field(&large);
        let _other = ob.build();

        let err = holder.checked_offset(inner.descriptor()).unwrap_err();
        assert!(matches!(err, TypeError::FieldMismatch { declared_size: 4, handle_size: 8, .. }));
    }

    #[test]
    fn checked_offset_reports_unknown_index() {
        let mut b = ObjectType::builder("Pair");
        let _a: Field<u8> = b.field();
        let _b: Field<u8> = b.field();
        let extra: Field<u8> = b.field();
        let _ty3 = b.build();

        let mut b = ObjectType::builder("Single");
        let _a: Field<u8> = b.field();
        let single = b.build();
        assert!(matches!(
            single.checked_offset(extra.descriptor()),
            Err(TypeError::UnknownField { index: 2, .. })
        ));
    }

    #[test]
    fn value_field_takes_embedded_size() {
        let mut pb = ObjectType::builder("Point");
        let _x: Field<f64> = pb.field();
        let _y: Field<f64> = pb.field();
        let point = pb.build();

        let mut b = ObjectType::builder("Segment");
        let start: ValueField<Point> = b.value_field(&point);
        let end: ValueField<Point> = b.value_field(&point);
        let segment = b.build();

        assert_eq!(start.size(), 16);
        assert_eq!(segment.offset(end.index()).unwrap(), 16);
        assert_eq!(segment.size(), 32);
        assert_eq!(segment.field(start.index()).unwrap().kind(), FieldKind::Value);
    }

    #[test]
    fn reference_fields_are_address_sized() {
        let mut b = ObjectType::builder("Node");
        let next: ObjectField<Point> = b.object_field();
        let ty = b.build();
        assert_eq!(next.size(), 8);
        assert_eq!(ty.field(next.index()).unwrap().kind(), FieldKind::Reference);
    }

    #[test]
    fn unknown_index_is_an_error() {
        let ty = ObjectType::builder("Empty").build();
        assert_eq!(ty.size(), 0);
        assert_eq!(
            ty.offset(0),
            Err(TypeError::UnknownField {
                type_name: "Empty".into(),
                index: 0
            })
        );
    }

    #[test]
    fn array_descriptor() {
        let ty = ObjectType::array("bytes", FieldKind::Byte);
        assert!(ty.is_array());
        assert_eq!(ty.element(), Some(FieldKind::Byte));
        assert_eq!(ty.size(), ObjectType::ARRAY_HEADER_SIZE);
        assert!(ty.fields().is_empty());
    }
}
