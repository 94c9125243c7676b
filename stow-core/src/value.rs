use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Dynamically typed value moved between records and the store.
///
/// Every variant wraps an `Option`: the `None` case is a *typed* absent value, it
/// still knows the column type it belongs to. This is what lets the staging table
/// declare column types for rows that only carry NULLs. `Value::Null` is the
/// untyped absent value, produced by drivers that cannot tell.
#[derive(Default, Debug, Clone, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Boolean(Option<bool>),
    Int8(Option<i8>),
    Int16(Option<i16>),
    Int32(Option<i32>),
    Int64(Option<i64>),
    UInt8(Option<u8>),
    UInt16(Option<u16>),
    UInt32(Option<u32>),
    UInt64(Option<u64>),
    Float32(Option<f32>),
    Float64(Option<f64>),
    Decimal(Option<Decimal>, /* prec: */ u8, /* scale: */ u8),
    Char(Option<char>),
    Varchar(Option<String>),
    Blob(Option<Box<[u8]>>),
    Date(Option<Date>),
    Time(Option<Time>),
    Timestamp(Option<PrimitiveDateTime>),
    TimestampWithTimezone(Option<OffsetDateTime>),
    Uuid(Option<Uuid>),
}

impl Value {
    /// True for `Null` and for every typed variant holding `None`.
    pub fn is_null(&self) -> bool {
        matches!(
            self,
            Value::Null
                | Value::Boolean(None)
                | Value::Int8(None)
                | Value::Int16(None)
                | Value::Int32(None)
                | Value::Int64(None)
                | Value::UInt8(None)
                | Value::UInt16(None)
                | Value::UInt32(None)
                | Value::UInt64(None)
                | Value::Float32(None)
                | Value::Float64(None)
                | Value::Decimal(None, ..)
                | Value::Char(None)
                | Value::Varchar(None)
                | Value::Blob(None)
                | Value::Date(None)
                | Value::Time(None)
                | Value::Timestamp(None)
                | Value::TimestampWithTimezone(None)
                | Value::Uuid(None)
        )
    }

    /// The absent value of the same type.
    pub fn as_null(&self) -> Value {
        match self {
            Value::Null => Value::Null,
            Value::Boolean(..) => Value::Boolean(None),
            Value::Int8(..) => Value::Int8(None),
            Value::Int16(..) => Value::Int16(None),
            Value::Int32(..) => Value::Int32(None),
            Value::Int64(..) => Value::Int64(None),
            Value::UInt8(..) => Value::UInt8(None),
            Value::UInt16(..) => Value::UInt16(None),
            Value::UInt32(..) => Value::UInt32(None),
            Value::UInt64(..) => Value::UInt64(None),
            Value::Float32(..) => Value::Float32(None),
            Value::Float64(..) => Value::Float64(None),
            Value::Decimal(.., prec, scale) => Value::Decimal(None, *prec, *scale),
            Value::Char(..) => Value::Char(None),
            Value::Varchar(..) => Value::Varchar(None),
            Value::Blob(..) => Value::Blob(None),
            Value::Date(..) => Value::Date(None),
            Value::Time(..) => Value::Time(None),
            Value::Timestamp(..) => Value::Timestamp(None),
            Value::TimestampWithTimezone(..) => Value::TimestampWithTimezone(None),
            Value::Uuid(..) => Value::Uuid(None),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_null() {
            return serializer.serialize_none();
        }
        match self {
            Value::Boolean(Some(v)) => serializer.serialize_bool(*v),
            Value::Int8(Some(v)) => serializer.serialize_i8(*v),
            Value::Int16(Some(v)) => serializer.serialize_i16(*v),
            Value::Int32(Some(v)) => serializer.serialize_i32(*v),
            Value::Int64(Some(v)) => serializer.serialize_i64(*v),
            Value::UInt8(Some(v)) => serializer.serialize_u8(*v),
            Value::UInt16(Some(v)) => serializer.serialize_u16(*v),
            Value::UInt32(Some(v)) => serializer.serialize_u32(*v),
            Value::UInt64(Some(v)) => serializer.serialize_u64(*v),
            Value::Float32(Some(v)) => serializer.serialize_f32(*v),
            Value::Float64(Some(v)) => serializer.serialize_f64(*v),
            Value::Decimal(Some(v), ..) => serializer.collect_str(v),
            Value::Char(Some(v)) => serializer.serialize_char(*v),
            Value::Varchar(Some(v)) => serializer.serialize_str(v),
            Value::Blob(Some(v)) => serializer.serialize_bytes(v),
            Value::Date(Some(v)) => serializer.collect_str(v),
            Value::Time(Some(v)) => serializer.collect_str(v),
            Value::Timestamp(Some(v)) => serializer.collect_str(v),
            Value::TimestampWithTimezone(Some(v)) => serializer.collect_str(v),
            Value::Uuid(Some(v)) => serializer.collect_str(v),
            _ => serializer.serialize_none(),
        }
    }
}
