//! Dynamically typed, column-major host arrays.
//!
//! A `HostArray` is the adapter's view of a value owned by the host numerical
//! environment: a class tag, a dimension vector and a real (plus optional
//! imaginary) payload. The payload variant *is* the class, so a value can never
//! claim one class while storing another.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Host class identifiers, named the way the host names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassId {
    Double,
    Single,
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Logical,
    Char,
}

impl ClassId {
    /// Host-facing class name (`"double"`, `"int32"`, ...).
    pub fn name(self) -> &'static str {
        match self {
            ClassId::Double => "double",
            ClassId::Single => "single",
            ClassId::Int8 => "int8",
            ClassId::Uint8 => "uint8",
            ClassId::Int16 => "int16",
            ClassId::Uint16 => "uint16",
            ClassId::Int32 => "int32",
            ClassId::Uint32 => "uint32",
            ClassId::Int64 => "int64",
            ClassId::Uint64 => "uint64",
            ClassId::Logical => "logical",
            ClassId::Char => "char",
        }
    }

    /// Logical and char arrays are not numeric in the host's sense.
    pub fn is_numeric(self) -> bool {
        !matches!(self, ClassId::Logical | ClassId::Char)
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Typed element storage for one half (real or imaginary) of a host array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "class", content = "values", rename_all = "lowercase")]
pub enum ArrayData {
    Double(Vec<f64>),
    Single(Vec<f32>),
    Int8(Vec<i8>),
    Uint8(Vec<u8>),
    Int16(Vec<i16>),
    Uint16(Vec<u16>),
    Int32(Vec<i32>),
    Uint32(Vec<u32>),
    Int64(Vec<i64>),
    Uint64(Vec<u64>),
    Logical(Vec<bool>),
    Char(Vec<char>),
}

impl ArrayData {
    /// Zero-filled storage of the given class.
    pub fn zeros(class: ClassId, len: usize) -> Self {
        match class {
            ClassId::Double => ArrayData::Double(vec![0.0; len]),
            ClassId::Single => ArrayData::Single(vec![0.0; len]),
            ClassId::Int8 => ArrayData::Int8(vec![0; len]),
            ClassId::Uint8 => ArrayData::Uint8(vec![0; len]),
            ClassId::Int16 => ArrayData::Int16(vec![0; len]),
            ClassId::Uint16 => ArrayData::Uint16(vec![0; len]),
            ClassId::Int32 => ArrayData::Int32(vec![0; len]),
            ClassId::Uint32 => ArrayData::Uint32(vec![0; len]),
            ClassId::Int64 => ArrayData::Int64(vec![0; len]),
            ClassId::Uint64 => ArrayData::Uint64(vec![0; len]),
            ClassId::Logical => ArrayData::Logical(vec![false; len]),
            ClassId::Char => ArrayData::Char(vec!['\0'; len]),
        }
    }

    pub fn class(&self) -> ClassId {
        match self {
            ArrayData::Double(_) => ClassId::Double,
            ArrayData::Single(_) => ClassId::Single,
            ArrayData::Int8(_) => ClassId::Int8,
            ArrayData::Uint8(_) => ClassId::Uint8,
            ArrayData::Int16(_) => ClassId::Int16,
            ArrayData::Uint16(_) => ClassId::Uint16,
            ArrayData::Int32(_) => ClassId::Int32,
            ArrayData::Uint32(_) => ClassId::Uint32,
            ArrayData::Int64(_) => ClassId::Int64,
            ArrayData::Uint64(_) => ClassId::Uint64,
            ArrayData::Logical(_) => ClassId::Logical,
            ArrayData::Char(_) => ClassId::Char,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ArrayData::Double(v) => v.len(),
            ArrayData::Single(v) => v.len(),
            ArrayData::Int8(v) => v.len(),
            ArrayData::Uint8(v) => v.len(),
            ArrayData::Int16(v) => v.len(),
            ArrayData::Uint16(v) => v.len(),
            ArrayData::Int32(v) => v.len(),
            ArrayData::Uint32(v) => v.len(),
            ArrayData::Int64(v) => v.len(),
            ArrayData::Uint64(v) => v.len(),
            ArrayData::Logical(v) => v.len(),
            ArrayData::Char(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw native-endian bytes of a numeric payload.
    ///
    /// Returns `None` for logical and char storage, which have no defined
    /// in-memory representation on the host side.
    pub fn to_ne_bytes(&self) -> Option<Vec<u8>> {
        fn collect<T, const N: usize>(values: &[T], to: impl Fn(&T) -> [u8; N]) -> Vec<u8> {
            values.iter().flat_map(to).collect()
        }

        let bytes = match self {
            ArrayData::Double(v) => collect(v, |x| x.to_ne_bytes()),
            ArrayData::Single(v) => collect(v, |x| x.to_ne_bytes()),
            ArrayData::Int8(v) => collect(v, |x| x.to_ne_bytes()),
            ArrayData::Uint8(v) => v.clone(),
            ArrayData::Int16(v) => collect(v, |x| x.to_ne_bytes()),
            ArrayData::Uint16(v) => collect(v, |x| x.to_ne_bytes()),
            ArrayData::Int32(v) => collect(v, |x| x.to_ne_bytes()),
            ArrayData::Uint32(v) => collect(v, |x| x.to_ne_bytes()),
            ArrayData::Int64(v) => collect(v, |x| x.to_ne_bytes()),
            ArrayData::Uint64(v) => collect(v, |x| x.to_ne_bytes()),
            ArrayData::Logical(_) | ArrayData::Char(_) => return None,
        };
        Some(bytes)
    }
}

/// Construction errors for `HostArray`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostArrayError {
    #[error("dimensions {dims:?} describe {expected} elements but the payload holds {actual}")]
    DimensionMismatch {
        dims: Vec<usize>,
        expected: usize,
        actual: usize,
    },
    #[error("imaginary part is {imag} with {imag_len} elements, real part is {real} with {real_len}")]
    ImaginaryMismatch {
        real: ClassId,
        real_len: usize,
        imag: ClassId,
        imag_len: usize,
    },
    #[error("{0} arrays cannot be complex")]
    NonNumericComplex(ClassId),
    #[error("an array needs at least two dimensions, got {0}")]
    TooFewDimensions(usize),
    #[error("dimensions {0:?} describe more elements than can be addressed")]
    TooManyElements(Vec<usize>),
}

/// A host-native array value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawHostArray")]
pub struct HostArray {
    dims: Vec<usize>,
    real: ArrayData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    imag: Option<ArrayData>,
}

#[derive(Deserialize)]
struct RawHostArray {
    dims: Vec<usize>,
    real: ArrayData,
    #[serde(default)]
    imag: Option<ArrayData>,
}

impl TryFrom<RawHostArray> for HostArray {
    type Error = HostArrayError;

    fn try_from(raw: RawHostArray) -> Result<Self, Self::Error> {
        HostArray::new(raw.dims, raw.real, raw.imag)
    }
}

impl HostArray {
    /// Build an array, checking that the dimensions and both payload halves agree.
    pub fn new(
        dims: Vec<usize>,
        real: ArrayData,
        imag: Option<ArrayData>,
    ) -> Result<Self, HostArrayError> {
        if dims.len() < 2 {
            return Err(HostArrayError::TooFewDimensions(dims.len()));
        }
        let expected = dims
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or_else(|| HostArrayError::TooManyElements(dims.clone()))?;
        if expected != real.len() {
            return Err(HostArrayError::DimensionMismatch {
                dims,
                expected,
                actual: real.len(),
            });
        }
        if let Some(im) = &imag {
            if !real.class().is_numeric() {
                return Err(HostArrayError::NonNumericComplex(real.class()));
            }
            if im.class() != real.class() || im.len() != real.len() {
                return Err(HostArrayError::ImaginaryMismatch {
                    real: real.class(),
                    real_len: real.len(),
                    imag: im.class(),
                    imag_len: im.len(),
                });
            }
        }
        Ok(Self { dims, real, imag })
    }

    /// A real `1 x n` row vector.
    pub fn row(real: ArrayData) -> Self {
        let n = real.len();
        Self {
            dims: vec![1, n],
            real,
            imag: None,
        }
    }

    /// A real `0 x 0` array of the given class.
    pub fn empty_of(class: ClassId) -> Self {
        Self {
            dims: vec![0, 0],
            real: ArrayData::zeros(class, 0),
            imag: None,
        }
    }

    /// The host's empty double matrix (`[]`).
    pub fn empty() -> Self {
        Self::empty_of(ClassId::Double)
    }

    pub fn double_scalar(value: f64) -> Self {
        Self::scalar(ArrayData::Double(vec![value]))
    }

    pub fn int32_scalar(value: i32) -> Self {
        Self::scalar(ArrayData::Int32(vec![value]))
    }

    fn scalar(real: ArrayData) -> Self {
        Self {
            dims: vec![1, 1],
            real,
            imag: None,
        }
    }

    pub fn class_id(&self) -> ClassId {
        self.real.class()
    }

    pub fn is_numeric(&self) -> bool {
        self.class_id().is_numeric()
    }

    pub fn is_complex(&self) -> bool {
        self.imag.is_some()
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn numel(&self) -> usize {
        self.real.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numel() == 0
    }

    pub fn real(&self) -> &ArrayData {
        &self.real
    }

    pub fn imag(&self) -> Option<&ArrayData> {
        self.imag.as_ref()
    }

    /// Borrow the real payload as `f64` if this is a double array.
    pub fn as_f64(&self) -> Option<&[f64]> {
        match &self.real {
            ArrayData::Double(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow the real payload as `i32` if this is an int32 array.
    pub fn as_i32(&self) -> Option<&[i32]> {
        match &self.real {
            ArrayData::Int32(v) => Some(v),
            _ => None,
        }
    }

    /// Move the real payload out as `Vec<f64>` if this is a double array.
    pub fn into_f64(self) -> Option<Vec<f64>> {
        match self.real {
            ArrayData::Double(v) => Some(v),
            _ => None,
        }
    }

    /// Move the real payload out as `Vec<i32>` if this is an int32 array.
    pub fn into_i32(self) -> Option<Vec<i32>> {
        match self.real {
            ArrayData::Int32(v) => Some(v),
            _ => None,
        }
    }
}

impl From<Vec<f64>> for HostArray {
    fn from(values: Vec<f64>) -> Self {
        HostArray::row(ArrayData::Double(values))
    }
}

impl From<Vec<i32>> for HostArray {
    fn from(values: Vec<i32>) -> Self {
        HostArray::row(ArrayData::Int32(values))
    }
}
