use crate::rename_all::RenameRule;
use quote::ToTokens;
use stow_core::{KeyRole, TypeDecoded, decode_type};
use syn::{Error, Field, Ident, LitStr, Result, Type, ext::IdentExt, parse::ParseBuffer};

pub(crate) struct FieldMetadata {
    pub(crate) ident: Ident,
    pub(crate) ty: Type,
    /// Column name.
    pub(crate) name: String,
    pub(crate) role: KeyRole,
    pub(crate) ignore: bool,
    /// `None` when the column type is only known at runtime.
    pub(crate) decoded: Option<TypeDecoded>,
}

pub(crate) fn decode_field(field: &Field, rename_all: Option<RenameRule>) -> Result<FieldMetadata> {
    let Some(ident) = field.ident.clone() else {
        return Err(Error::new_spanned(
            field,
            "Record fields must be named, tuple structs are not supported",
        ));
    };
    let name = ident.unraw().to_string();
    let mut metadata = FieldMetadata {
        name: match rename_all {
            Some(rule) => rule.apply(&name),
            None => name,
        },
        ident,
        ty: field.ty.clone(),
        role: KeyRole::None,
        ignore: false,
        decoded: decode_type(&field.ty),
    };
    let mut primary_key = false;
    let mut default_key = false;
    for attr in field.attrs.iter().filter(|a| a.path().is_ident("stow")) {
        attr.parse_nested_meta(|arg| {
            if arg.path.is_ident("primary_key") {
                primary_key = true;
            } else if arg.path.is_ident("default_key") {
                default_key = true;
            } else if arg.path.is_ident("ignore") {
                metadata.ignore = true;
            } else if arg.path.is_ident("name") {
                let value = arg.value().and_then(ParseBuffer::parse::<LitStr>).map_err(|e| {
                    Error::new(
                        e.span(),
                        "Error while parsing `name`, use it like: `#[stow(name = \"ColumnName\")]`",
                    )
                })?;
                metadata.name = value.value();
            } else {
                return Err(arg.error(format!(
                    "Unknown attribute `{}` inside stow macro",
                    arg.path.to_token_stream()
                )));
            }
            Ok(())
        })?;
    }
    metadata.role = match (primary_key, default_key) {
        (true, true) => {
            return Err(Error::new_spanned(
                field,
                format!(
                    "Field `{}` cannot be both `primary_key` and `default_key`",
                    metadata.ident
                ),
            ));
        }
        (true, false) => KeyRole::PrimaryKey,
        (false, true) => KeyRole::DefaultKey,
        (false, false) => KeyRole::None,
    };
    if metadata.ignore && metadata.role != KeyRole::None {
        return Err(Error::new_spanned(
            field,
            format!("Ignored field `{}` cannot be a key", metadata.ident),
        ));
    }
    if metadata.name.trim().is_empty() {
        return Err(Error::new_spanned(field, "Column name cannot be empty"));
    }
    Ok(metadata)
}
