use crate::{Value, matches_path};
use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use syn::{GenericArgument, PathArguments, Type, TypePath, TypeSlice};

/// Column type information recovered from a Rust field type at macro expansion time.
#[derive(Default, Debug)]
pub struct TypeDecoded {
    /// Typed absent value describing the column type.
    pub value: Value,
    /// `Option` somewhere in the wrapper chain.
    pub nullable: bool,
}

/// `None` for types that are not known here, their column type is then resolved at
/// runtime through `AsValue`.
pub fn decode_type(ty: &Type) -> Option<TypeDecoded> {
    let mut nullable = false;
    let value = 'data_type: {
        if let Type::Path(TypePath { path, .. }) = ty {
            if let Some(ident) = path.get_ident() {
                if ident == "bool" {
                    break 'data_type Value::Boolean(None);
                } else if ident == "i8" {
                    break 'data_type Value::Int8(None);
                } else if ident == "i16" {
                    break 'data_type Value::Int16(None);
                } else if ident == "i32" {
                    break 'data_type Value::Int32(None);
                } else if ident == "i64" {
                    break 'data_type Value::Int64(None);
                } else if ident == "u8" {
                    break 'data_type Value::UInt8(None);
                } else if ident == "u16" {
                    break 'data_type Value::UInt16(None);
                } else if ident == "u32" {
                    break 'data_type Value::UInt32(None);
                } else if ident == "u64" {
                    break 'data_type Value::UInt64(None);
                } else if ident == "f32" {
                    break 'data_type Value::Float32(None);
                } else if ident == "f64" {
                    break 'data_type Value::Float64(None);
                } else if ident == "char" {
                    break 'data_type Value::Char(None);
                }
            }
            if matches_path(path, &["std", "string", "String"]) {
                break 'data_type Value::Varchar(None);
            } else if matches_path(path, &["rust_decimal", "Decimal"]) {
                break 'data_type Value::Decimal(None, 0, 0);
            } else if matches_path(path, &["time", "Time"]) {
                break 'data_type Value::Time(None);
            } else if matches_path(path, &["time", "Date"]) {
                break 'data_type Value::Date(None);
            } else if matches_path(path, &["time", "PrimitiveDateTime"]) {
                break 'data_type Value::Timestamp(None);
            } else if matches_path(path, &["time", "OffsetDateTime"]) {
                break 'data_type Value::TimestampWithTimezone(None);
            } else if matches_path(path, &["uuid", "Uuid"]) {
                break 'data_type Value::Uuid(None);
            }
            let is_option = matches_path(path, &["std", "option", "Option"]);
            let is_box = matches_path(path, &["std", "boxed", "Box"]);
            let is_vec = matches_path(path, &["std", "vec", "Vec"]);
            if is_option || is_box || is_vec {
                let PathArguments::AngleBracketed(bracketed) = &path.segments.last()?.arguments
                else {
                    return None;
                };
                let Some(GenericArgument::Type(inner)) = bracketed.args.first() else {
                    return None;
                };
                let inner = decode_type(inner)?;
                if is_vec {
                    if matches!(inner.value, Value::UInt8(..)) && !inner.nullable {
                        break 'data_type Value::Blob(None);
                    }
                    return None;
                }
                nullable = is_option || inner.nullable;
                break 'data_type inner.value;
            }
        } else if let Type::Slice(TypeSlice { elem, .. }) = ty {
            if matches!(decode_type(elem)?.value, Value::UInt8(..)) {
                break 'data_type Value::Blob(None);
            }
        }
        return None;
    };
    Some(TypeDecoded { value, nullable })
}

impl ToTokens for Value {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let ts = match self {
            Value::Null => quote! { ::stow::Value::Null },
            Value::Boolean(..) => quote! { ::stow::Value::Boolean(None) },
            Value::Int8(..) => quote! { ::stow::Value::Int8(None) },
            Value::Int16(..) => quote! { ::stow::Value::Int16(None) },
            Value::Int32(..) => quote! { ::stow::Value::Int32(None) },
            Value::Int64(..) => quote! { ::stow::Value::Int64(None) },
            Value::UInt8(..) => quote! { ::stow::Value::UInt8(None) },
            Value::UInt16(..) => quote! { ::stow::Value::UInt16(None) },
            Value::UInt32(..) => quote! { ::stow::Value::UInt32(None) },
            Value::UInt64(..) => quote! { ::stow::Value::UInt64(None) },
            Value::Float32(..) => quote! { ::stow::Value::Float32(None) },
            Value::Float64(..) => quote! { ::stow::Value::Float64(None) },
            Value::Decimal(.., precision, scale) => {
                quote! { ::stow::Value::Decimal(None, #precision, #scale) }
            }
            Value::Char(..) => quote! { ::stow::Value::Char(None) },
            Value::Varchar(..) => quote! { ::stow::Value::Varchar(None) },
            Value::Blob(..) => quote! { ::stow::Value::Blob(None) },
            Value::Date(..) => quote! { ::stow::Value::Date(None) },
            Value::Time(..) => quote! { ::stow::Value::Time(None) },
            Value::Timestamp(..) => quote! { ::stow::Value::Timestamp(None) },
            Value::TimestampWithTimezone(..) => {
                quote! { ::stow::Value::TimestampWithTimezone(None) }
            }
            Value::Uuid(..) => quote! { ::stow::Value::Uuid(None) },
        };
        tokens.extend(ts);
    }
}
