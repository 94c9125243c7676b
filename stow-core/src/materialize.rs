use crate::{AsValue, Context, Error, Record, Result, RowLabeled, Value};
use rust_decimal::Decimal;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Types a result row can be turned into.
///
/// Records implement it through `#[derive(Record)]` (see [`materialize_record`]),
/// scalars read the first column of the row.
pub trait Materialize: Sized {
    fn materialize(row: RowLabeled) -> Result<Self>;
}

/// Build a fresh `R` from a row.
///
/// Columns are matched to fields by case insensitive name, columns without a field
/// are ignored and fields without a column keep their `Default` value. A NULL
/// assigned to a field that cannot hold one leaves the default in place.
pub fn materialize_record<R: Record>(row: RowLabeled) -> Result<R> {
    let descriptor = R::descriptor();
    let mut result = R::default();
    let RowLabeled { labels, values } = row;
    for (label, value) in labels.iter().zip(values.into_vec()) {
        let Some(field) = descriptor.field(label) else {
            continue;
        };
        if value.is_null() && !field.nullable {
            continue;
        }
        (field.set)(&mut result, value).with_context(|| {
            format!(
                "While assigning column `{}` to `{}::{}`",
                label, descriptor.type_name, field.name
            )
        })?;
    }
    Ok(result)
}

fn first_column(row: RowLabeled) -> Result<Value> {
    row.values
        .into_vec()
        .into_iter()
        .next()
        .ok_or_else(|| Error::msg("Cannot materialize a scalar from a row without columns"))
}

macro_rules! impl_materialize_scalar {
    ($($ty:ty => $empty:expr),+ $(,)?) => {
        $(
            impl Materialize for $ty {
                fn materialize(row: RowLabeled) -> Result<Self> {
                    let value = first_column(row)?;
                    if value.is_null() {
                        return Ok($empty);
                    }
                    <$ty as AsValue>::try_from_value(value)
                }
            }
        )+
    };
    ($($ty:ty),+ $(,)?) => {
        impl_materialize_scalar!($($ty => Default::default()),+);
    };
}

impl_materialize_scalar!(
    bool, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, char, String, Vec<u8>, Decimal, Uuid,
);
impl_materialize_scalar!(
    Date => OffsetDateTime::UNIX_EPOCH.date(),
    Time => Time::MIDNIGHT,
    PrimitiveDateTime => PrimitiveDateTime::new(OffsetDateTime::UNIX_EPOCH.date(), Time::MIDNIGHT),
    OffsetDateTime => OffsetDateTime::UNIX_EPOCH,
);

impl<T: AsValue> Materialize for Option<T> {
    fn materialize(row: RowLabeled) -> Result<Self> {
        Self::try_from_value(first_column(row)?)
    }
}

impl Materialize for RowLabeled {
    fn materialize(row: RowLabeled) -> Result<Self> {
        Ok(row)
    }
}
