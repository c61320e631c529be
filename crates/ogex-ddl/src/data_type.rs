//! OpenDDL primitive data types

use std::fmt;
use std::str::FromStr;

use ogex_core::Error;

/// The data type of a primitive's values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UnsignedInt8,
    UnsignedInt16,
    UnsignedInt32,
    UnsignedInt64,
    Half,
    Float,
    Double,
    String,
    Ref,
    Type,
}

impl DataType {
    pub const ALL: [DataType; 15] = [
        DataType::Bool,
        DataType::Int8,
        DataType::Int16,
        DataType::Int32,
        DataType::Int64,
        DataType::UnsignedInt8,
        DataType::UnsignedInt16,
        DataType::UnsignedInt32,
        DataType::UnsignedInt64,
        DataType::Half,
        DataType::Float,
        DataType::Double,
        DataType::String,
        DataType::Ref,
        DataType::Type,
    ];

    /// Name as written in OpenDDL text
    pub fn name(self) -> &'static str {
        match self {
            DataType::Bool => "bool",
            DataType::Int8 => "int8",
            DataType::Int16 => "int16",
            DataType::Int32 => "int32",
            DataType::Int64 => "int64",
            DataType::UnsignedInt8 => "unsigned_int8",
            DataType::UnsignedInt16 => "unsigned_int16",
            DataType::UnsignedInt32 => "unsigned_int32",
            DataType::UnsignedInt64 => "unsigned_int64",
            DataType::Half => "half",
            DataType::Float => "float",
            DataType::Double => "double",
            DataType::String => "string",
            DataType::Ref => "ref",
            DataType::Type => "type",
        }
    }

    pub fn is_unsigned_integer(self) -> bool {
        matches!(
            self,
            DataType::UnsignedInt8
                | DataType::UnsignedInt16
                | DataType::UnsignedInt32
                | DataType::UnsignedInt64
        )
    }

    /// Largest value an unsigned integer type can hold
    pub fn unsigned_max(self) -> Option<u64> {
        match self {
            DataType::UnsignedInt8 => Some(u8::MAX as u64),
            DataType::UnsignedInt16 => Some(u16::MAX as u64),
            DataType::UnsignedInt32 => Some(u32::MAX as u64),
            DataType::UnsignedInt64 => Some(u64::MAX),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataType {
    type Err = Error;

    /// Accepts the long names and the OpenDDL short aliases (`u32`, `f`, ...)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let data_type = match s {
            "bool" | "b" => DataType::Bool,
            "int8" | "i8" => DataType::Int8,
            "int16" | "i16" => DataType::Int16,
            "int32" | "i32" => DataType::Int32,
            "int64" | "i64" => DataType::Int64,
            "unsigned_int8" | "u8" => DataType::UnsignedInt8,
            "unsigned_int16" | "u16" => DataType::UnsignedInt16,
            "unsigned_int32" | "u32" => DataType::UnsignedInt32,
            "unsigned_int64" | "u64" => DataType::UnsignedInt64,
            "half" | "h" | "float16" => DataType::Half,
            "float" | "f" | "float32" => DataType::Float,
            "double" | "d" | "float64" => DataType::Double,
            "string" | "s" => DataType::String,
            "ref" | "r" => DataType::Ref,
            "type" | "t" => DataType::Type,
            other => return Err(Error::unknown_type(other)),
        };
        Ok(data_type)
    }
}
