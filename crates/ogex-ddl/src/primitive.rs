//! Primitive leaves: typed, optionally vectorized value arrays

use half::f16;

use crate::data_type::DataType;
use crate::reference::Reference;
use crate::structure::NameScope;

/// A string value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DdlString {
    pub value: String,
    /// Emit verbatim instead of quoting and escaping
    pub literal: bool,
}

impl DdlString {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            literal: false,
        }
    }

    /// A pre-formatted value written as-is
    pub fn literal(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            literal: true,
        }
    }
}

impl From<&str> for DdlString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for DdlString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Flat value storage, one variant per data type
///
/// Vectorized primitives store their tuples back to back; the tuple width
/// lives on [`Primitive::vector_size`].
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveData {
    Bool(Vec<bool>),
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    UnsignedInt8(Vec<u8>),
    UnsignedInt16(Vec<u16>),
    UnsignedInt32(Vec<u32>),
    UnsignedInt64(Vec<u64>),
    Half(Vec<f16>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    String(Vec<DdlString>),
    Ref(Vec<Reference>),
    Type(Vec<DataType>),
}

macro_rules! primitive_data_from {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<Vec<$ty>> for PrimitiveData {
                fn from(values: Vec<$ty>) -> Self {
                    PrimitiveData::$variant(values)
                }
            }
        )*
    };
}

primitive_data_from! {
    Bool => bool,
    Int8 => i8,
    Int16 => i16,
    Int32 => i32,
    Int64 => i64,
    UnsignedInt8 => u8,
    UnsignedInt16 => u16,
    UnsignedInt32 => u32,
    UnsignedInt64 => u64,
    Half => f16,
    Float => f32,
    Double => f64,
    String => DdlString,
    Ref => Reference,
    Type => DataType,
}

impl PrimitiveData {
    pub fn data_type(&self) -> DataType {
        match self {
            PrimitiveData::Bool(_) => DataType::Bool,
            PrimitiveData::Int8(_) => DataType::Int8,
            PrimitiveData::Int16(_) => DataType::Int16,
            PrimitiveData::Int32(_) => DataType::Int32,
            PrimitiveData::Int64(_) => DataType::Int64,
            PrimitiveData::UnsignedInt8(_) => DataType::UnsignedInt8,
            PrimitiveData::UnsignedInt16(_) => DataType::UnsignedInt16,
            PrimitiveData::UnsignedInt32(_) => DataType::UnsignedInt32,
            PrimitiveData::UnsignedInt64(_) => DataType::UnsignedInt64,
            PrimitiveData::Half(_) => DataType::Half,
            PrimitiveData::Float(_) => DataType::Float,
            PrimitiveData::Double(_) => DataType::Double,
            PrimitiveData::String(_) => DataType::String,
            PrimitiveData::Ref(_) => DataType::Ref,
            PrimitiveData::Type(_) => DataType::Type,
        }
    }

    /// Number of scalar values (not tuples)
    pub fn len(&self) -> usize {
        match self {
            PrimitiveData::Bool(v) => v.len(),
            PrimitiveData::Int8(v) => v.len(),
            PrimitiveData::Int16(v) => v.len(),
            PrimitiveData::Int32(v) => v.len(),
            PrimitiveData::Int64(v) => v.len(),
            PrimitiveData::UnsignedInt8(v) => v.len(),
            PrimitiveData::UnsignedInt16(v) => v.len(),
            PrimitiveData::UnsignedInt32(v) => v.len(),
            PrimitiveData::UnsignedInt64(v) => v.len(),
            PrimitiveData::Half(v) => v.len(),
            PrimitiveData::Float(v) => v.len(),
            PrimitiveData::Double(v) => v.len(),
            PrimitiveData::String(v) => v.len(),
            PrimitiveData::Ref(v) => v.len(),
            PrimitiveData::Type(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A typed leaf of the structure tree
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub data: PrimitiveData,
    /// Tuple width, 0 for plain scalars
    pub vector_size: usize,
    pub name: Option<String>,
    pub scope: NameScope,
    /// Break the data block after this many elements (verbose encoder)
    pub max_elements_per_line: Option<usize>,
    pub comment: Option<String>,
}

impl Primitive {
    /// Scalar primitive
    pub fn new(data: impl Into<PrimitiveData>) -> Self {
        Self::with_vector_size(data, 0)
    }

    /// Primitive over flat tuple storage
    pub fn with_vector_size(data: impl Into<PrimitiveData>, vector_size: usize) -> Self {
        Self {
            data: data.into(),
            vector_size,
            name: None,
            scope: NameScope::Global,
            max_elements_per_line: None,
            comment: None,
        }
    }

    /// Vectorized primitive from fixed-width tuples
    pub fn vectors<T, const N: usize>(values: &[[T; N]]) -> Self
    where
        T: Copy,
        Vec<T>: Into<PrimitiveData>,
    {
        let flat: Vec<T> = values.iter().flat_map(|tuple| tuple.iter().copied()).collect();
        Self::with_vector_size(flat, N)
    }

    pub fn float(values: Vec<f32>) -> Self {
        Self::new(values)
    }

    pub fn double(values: Vec<f64>) -> Self {
        Self::new(values)
    }

    pub fn unsigned_int32(values: Vec<u32>) -> Self {
        Self::new(values)
    }

    pub fn boolean(value: bool) -> Self {
        Self::new(vec![value])
    }

    /// Single string value
    pub fn string(value: impl Into<DdlString>) -> Self {
        Self::new(vec![value.into()])
    }

    /// Single reference value
    pub fn reference(value: Reference) -> Self {
        Self::new(vec![value])
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self.scope = NameScope::Global;
        self
    }

    pub fn with_local_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self.scope = NameScope::Local;
        self
    }

    pub fn with_max_elements_per_line(mut self, count: usize) -> Self {
        self.max_elements_per_line = Some(count);
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn data_type(&self) -> DataType {
        self.data.data_type()
    }

    /// Number of elements (tuples when vectorized)
    ///
    /// `None` when the flat value count is not a multiple of the vector size.
    pub fn element_count(&self) -> Option<usize> {
        let len = self.data.len();
        match self.vector_size {
            0 => Some(len),
            width if len % width == 0 => Some(len / width),
            _ => None,
        }
    }

    /// Exactly one element of at most four components
    pub fn is_simple(&self) -> bool {
        self.vector_size <= 4 && self.element_count() == Some(1)
    }

    /// Whether the verbose encoder writes this primitive on one line
    pub fn renders_inline(&self) -> bool {
        self.comment.is_none() && (self.is_simple() || self.data.is_empty())
    }

    pub(crate) fn references_mut(&mut self) -> Option<&mut Vec<Reference>> {
        match &mut self.data {
            PrimitiveData::Ref(refs) => Some(refs),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vectors_flatten() {
        let primitive = Primitive::vectors(&[[1.0f32, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        assert_eq!(primitive.vector_size, 3);
        assert_eq!(primitive.data.len(), 6);
        assert_eq!(primitive.element_count(), Some(2));
        assert_eq!(primitive.data_type(), DataType::Float);
    }

    #[test]
    fn test_width_mismatch() {
        let primitive = Primitive::with_vector_size(vec![1u32, 2, 3, 4], 3);
        assert_eq!(primitive.element_count(), None);
        assert!(!primitive.is_simple());
    }

    #[test]
    fn test_simplicity() {
        assert!(Primitive::float(vec![1.0]).is_simple());
        assert!(!Primitive::float(vec![1.0, 2.0]).is_simple());
        assert!(Primitive::vectors(&[[0.0f32; 4]]).is_simple());
        assert!(!Primitive::vectors(&[[0.0f32; 16]]).is_simple());
        assert!(!Primitive::float(vec![]).is_simple());
    }

    #[test]
    fn test_comment_blocks_inline() {
        let plain = Primitive::float(vec![1.0]);
        assert!(plain.renders_inline());
        assert!(!plain.with_comment("scale").renders_inline());
        assert!(Primitive::float(vec![]).renders_inline());
    }
}
