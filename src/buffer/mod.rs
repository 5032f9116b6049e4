//! Type-tagged buffers for numeric arrays.
//!
//! The harness manages arrays whose element type is only known at runtime.
//! Every supported type is a [`TypeTag`] with a fixed byte width, and a
//! [`Buffer`] is an owned, contiguous run of elements of one tag. String type
//! names are validated once at the boundary; past that point everything works
//! on the closed enum.

use bytemuck::Pod;
use std::str::FromStr;

use crate::error::AllocError;

/// Maximum number of extents a dimension vector carries.
pub const MAX_DIMS: usize = 5;

/// Identifier for a supported numeric element type.
///
/// The set is closed: signed/unsigned integers of 8-64 bits plus the two IEEE
/// float widths. Each tag maps to exactly one byte width, known before any
/// allocation happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
}

impl TypeTag {
    pub const ALL: [TypeTag; 10] = [
        TypeTag::Int8,
        TypeTag::Int16,
        TypeTag::Int32,
        TypeTag::Int64,
        TypeTag::UInt8,
        TypeTag::UInt16,
        TypeTag::UInt32,
        TypeTag::UInt64,
        TypeTag::Float32,
        TypeTag::Float64,
    ];

    /// Byte width of one element. This lookup is the single source of truth
    /// other components use when converting element counts to byte counts.
    pub fn width(self) -> usize {
        match self {
            TypeTag::Int8 | TypeTag::UInt8 => 1,
            TypeTag::Int16 | TypeTag::UInt16 => 2,
            TypeTag::Int32 | TypeTag::UInt32 | TypeTag::Float32 => 4,
            TypeTag::Int64 | TypeTag::UInt64 | TypeTag::Float64 => 8,
        }
    }

    /// Canonical type name, as used in run specs and log lines.
    pub fn name(self) -> &'static str {
        match self {
            TypeTag::Int8 => "int8_t",
            TypeTag::Int16 => "int16_t",
            TypeTag::Int32 => "int32_t",
            TypeTag::Int64 => "int64_t",
            TypeTag::UInt8 => "uint8_t",
            TypeTag::UInt16 => "uint16_t",
            TypeTag::UInt32 => "uint32_t",
            TypeTag::UInt64 => "uint64_t",
            TypeTag::Float32 => "float",
            TypeTag::Float64 => "double",
        }
    }

    /// Parses a type name. `"int"` is accepted as an alias for `int32_t`.
    /// Unknown names produce `None`; callers at the boundary turn that into an
    /// explicit failure instead of falling through.
    pub fn parse(name: &str) -> Option<TypeTag> {
        match name {
            "int8_t" => Some(TypeTag::Int8),
            "int16_t" => Some(TypeTag::Int16),
            "int" | "int32_t" => Some(TypeTag::Int32),
            "int64_t" => Some(TypeTag::Int64),
            "uint8_t" => Some(TypeTag::UInt8),
            "uint16_t" => Some(TypeTag::UInt16),
            "uint32_t" => Some(TypeTag::UInt32),
            "uint64_t" => Some(TypeTag::UInt64),
            "float" => Some(TypeTag::Float32),
            "double" => Some(TypeTag::Float64),
            _ => None,
        }
    }
}

impl FromStr for TypeTag {
    type Err = AllocError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TypeTag::parse(s).ok_or_else(|| AllocError::UnknownTypeName(s.to_string()))
    }
}

/// Ordered sequence of up to [`MAX_DIMS`] extents.
///
/// Zero entries after the first mark unused dimensions. The element count is
/// the product of the first extent and every subsequent non-zero extent, so
/// `[100, 0, 0, 0, 0]` and `[100]` describe the same 1-D array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dims([usize; MAX_DIMS]);

impl Dims {
    /// Builds a dimension vector from 1 to 5 extents; unspecified trailing
    /// positions are unused. `None` when `extents` is empty or too long.
    pub fn from_slice(extents: &[usize]) -> Option<Dims> {
        if extents.is_empty() || extents.len() > MAX_DIMS {
            return None;
        }
        let mut n = [0usize; MAX_DIMS];
        n[..extents.len()].copy_from_slice(extents);
        Some(Dims(n))
    }

    pub fn extents(&self) -> &[usize; MAX_DIMS] {
        &self.0
    }

    /// Total element count: the first extent always counts, zero entries
    /// beyond it are skipped.
    pub fn element_count(&self) -> usize {
        let mut numel = self.0[0];
        for &extent in &self.0[1..] {
            if extent != 0 {
                numel *= extent;
            }
        }
        numel
    }
}

/// An owned, contiguous run of elements of one [`TypeTag`].
///
/// A buffer is released exactly once; releasing flips the handle to the null
/// sentinel and a second release is a no-op. Storage is 8-byte aligned words
/// so typed views are valid for every supported element type.
#[derive(Debug)]
pub struct Buffer {
    tag: TypeTag,
    byte_len: usize,
    data: Option<Vec<u64>>,
}

impl Buffer {
    /// Allocates `count + offset` zero-initialized elements of `tag`.
    /// A zero count is valid and yields an empty (but non-null) buffer.
    pub fn alloc(tag: TypeTag, count: usize, offset: usize) -> Buffer {
        let byte_len = (count + offset) * tag.width();
        let words = byte_len.div_ceil(8);
        Buffer {
            tag,
            byte_len,
            data: Some(vec![0u64; words]),
        }
    }

    /// A handle in the released (null sentinel) state.
    pub fn null(tag: TypeTag) -> Buffer {
        Buffer {
            tag,
            byte_len: 0,
            data: None,
        }
    }

    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    pub fn is_null(&self) -> bool {
        self.data.is_none()
    }

    /// Number of whole elements held, 0 once released.
    pub fn element_count(&self) -> usize {
        self.byte_len / self.tag.width()
    }

    /// Raw bytes of the buffer; empty once released.
    pub fn bytes(&self) -> &[u8] {
        match &self.data {
            Some(words) => &bytemuck::cast_slice(words)[..self.byte_len],
            None => &[],
        }
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        let byte_len = self.byte_len;
        match &mut self.data {
            Some(words) => &mut bytemuck::cast_slice_mut(words)[..byte_len],
            None => &mut [],
        }
    }

    /// Typed view over the elements. `T` must have the tag's byte width.
    pub fn as_slice<T: Pod>(&self) -> &[T] {
        assert_eq!(
            std::mem::size_of::<T>(),
            self.tag.width(),
            "typed view does not match buffer tag {}",
            self.tag.name()
        );
        let count = self.element_count();
        match &self.data {
            Some(words) => &bytemuck::cast_slice(words)[..count],
            None => &[],
        }
    }

    pub fn as_mut_slice<T: Pod>(&mut self) -> &mut [T] {
        assert_eq!(
            std::mem::size_of::<T>(),
            self.tag.width(),
            "typed view does not match buffer tag {}",
            self.tag.name()
        );
        let count = self.element_count();
        match &mut self.data {
            Some(words) => &mut bytemuck::cast_slice_mut(words)[..count],
            None => &mut [],
        }
    }

    /// Frees the storage and flips the handle to the null sentinel.
    /// Releasing an already-null buffer is a no-op.
    pub fn release(&mut self) {
        self.data = None;
        self.byte_len = 0;
    }
}

/// Allocates `count + offset` elements of the named type. Fails on an
/// unrecognized type name without producing a buffer.
pub fn allocate(datatype: &str, count: usize, offset: usize) -> Result<Buffer, AllocError> {
    let tag: TypeTag = datatype.parse()?;
    Ok(Buffer::alloc(tag, count, offset))
}

/// Releases a buffer obtained from [`allocate`]. Returns `true` on success,
/// including for an already-released handle; returns `false` on an
/// unrecognized type name, leaving the buffer untouched.
pub fn release(buffer: &mut Buffer, datatype: &str) -> bool {
    if TypeTag::parse(datatype).is_none() {
        return false;
    }
    buffer.release();
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tag_has_a_fixed_width() {
        for tag in TypeTag::ALL {
            assert!(matches!(tag.width(), 1 | 2 | 4 | 8));
            // The canonical name round-trips through the parser.
            assert_eq!(TypeTag::parse(tag.name()), Some(tag));
        }
    }

    #[test]
    fn int_is_an_alias_for_int32() {
        assert_eq!(TypeTag::parse("int"), Some(TypeTag::Int32));
        assert_eq!(TypeTag::parse("int").unwrap().width(), 4);
    }

    #[test]
    fn unknown_type_names_fail_to_parse() {
        for name in ["", "complex", "float16", "INT", "double "] {
            assert_eq!(TypeTag::parse(name), None);
            assert!(name.parse::<TypeTag>().is_err());
        }
    }

    #[test]
    fn allocate_and_release_leave_a_null_handle() {
        let mut buf = allocate("double", 100, 0).unwrap();
        assert!(!buf.is_null());
        assert_eq!(buf.element_count(), 100);
        assert_eq!(buf.bytes().len(), 800);

        assert!(release(&mut buf, "double"));
        assert!(buf.is_null());
        assert!(buf.bytes().is_empty());

        // Second release is a successful no-op.
        assert!(release(&mut buf, "double"));
        assert!(buf.is_null());
    }

    #[test]
    fn allocate_with_unknown_type_fails() {
        assert_eq!(
            allocate("quaternion", 10, 0).err(),
            Some(AllocError::UnknownTypeName("quaternion".to_string()))
        );
    }

    #[test]
    fn release_with_unknown_type_leaves_buffer_untouched() {
        let mut buf = allocate("float", 16, 0).unwrap();
        assert!(!release(&mut buf, "quaternion"));
        assert!(!buf.is_null());
        assert_eq!(buf.element_count(), 16);
    }

    #[test]
    fn zero_length_buffers_are_valid() {
        let mut buf = allocate("int32_t", 0, 0).unwrap();
        assert!(!buf.is_null());
        assert_eq!(buf.element_count(), 0);
        assert!(buf.bytes().is_empty());
        assert!(release(&mut buf, "int32_t"));
    }

    #[test]
    fn offset_extends_the_allocation() {
        let buf = allocate("int16_t", 10, 3).unwrap();
        assert_eq!(buf.element_count(), 13);
        assert_eq!(buf.bytes().len(), 26);
    }

    #[test]
    fn typed_views_match_the_allocation() {
        let mut buf = Buffer::alloc(TypeTag::Float64, 4, 0);
        for (i, v) in buf.as_mut_slice::<f64>().iter_mut().enumerate() {
            *v = i as f64 * 0.5;
        }
        assert_eq!(buf.as_slice::<f64>(), &[0.0, 0.5, 1.0, 1.5]);
    }

    #[test]
    fn element_count_is_the_product_of_nonzero_extents() {
        let dims = Dims::from_slice(&[10, 20, 3]).unwrap();
        assert_eq!(dims.element_count(), 600);
    }

    #[test]
    fn element_count_ignores_trailing_zero_extents() {
        let a = Dims::from_slice(&[100, 0, 0, 0, 0]).unwrap();
        let b = Dims::from_slice(&[100]).unwrap();
        assert_eq!(a.element_count(), b.element_count());
        assert_eq!(a.element_count(), 100);
    }

    #[test]
    fn first_extent_counts_even_when_zero() {
        let dims = Dims::from_slice(&[0, 8]).unwrap();
        assert_eq!(dims.element_count(), 0);
    }

    #[test]
    fn dims_reject_empty_and_oversized_extent_lists() {
        assert_eq!(Dims::from_slice(&[]), None);
        assert_eq!(Dims::from_slice(&[1, 2, 3, 4, 5, 6]), None);
    }
}
