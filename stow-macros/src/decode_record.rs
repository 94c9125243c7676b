use crate::{
    decode_field::{FieldMetadata, decode_field},
    rename_all::RenameRule,
};
use stow_core::KeyRole;
use syn::{Error, Fields, ItemStruct, LitStr, Result, parse::ParseBuffer};

pub(crate) struct RecordMetadata {
    pub(crate) item: ItemStruct,
    pub(crate) table: String,
    /// Mapped fields in declaration order, ignored ones left out.
    pub(crate) fields: Vec<FieldMetadata>,
}

pub(crate) fn decode_record(item: ItemStruct) -> Result<RecordMetadata> {
    if !item.generics.params.is_empty() {
        return Err(Error::new_spanned(
            &item.generics,
            "Record cannot be derived for generic structs",
        ));
    }
    let Fields::Named(..) = &item.fields else {
        return Err(Error::new_spanned(
            &item.ident,
            "Record can only be derived for structs with named fields",
        ));
    };
    let mut table = format!("{}s", item.ident);
    let mut rename_all = None;
    for attr in item.attrs.iter().filter(|a| a.path().is_ident("stow")) {
        attr.parse_nested_meta(|arg| {
            if arg.path.is_ident("table") {
                let value = arg.value().and_then(ParseBuffer::parse::<LitStr>).map_err(|e| {
                    Error::new(
                        e.span(),
                        "Error while parsing `table`, use it like: `#[stow(table = \"MyTable\")]`",
                    )
                })?;
                if value.value().trim().is_empty() {
                    return Err(Error::new(value.span(), "Table name cannot be empty"));
                }
                table = value.value();
            } else if arg.path.is_ident("rename_all") {
                let value = arg.value().and_then(ParseBuffer::parse::<LitStr>)?;
                rename_all = Some(RenameRule::parse(&value)?);
            } else {
                return Err(arg.error("Unknown attribute inside stow macro, expected `table` or `rename_all`"));
            }
            Ok(())
        })?;
    }
    let mut fields: Vec<FieldMetadata> = Vec::new();
    for field in &item.fields {
        let metadata = decode_field(field, rename_all)?;
        if metadata.ignore {
            continue;
        }
        let other = fields.iter().find(|f| f.role == KeyRole::PrimaryKey);
        if let (KeyRole::PrimaryKey, Some(other)) = (metadata.role, other) {
            return Err(Error::new_spanned(
                field,
                format!(
                    "`{}` declares more than one primary key: `{}` and `{}`",
                    item.ident, other.ident, metadata.ident
                ),
            ));
        }
        if fields
            .iter()
            .any(|f| f.name.eq_ignore_ascii_case(&metadata.name))
        {
            return Err(Error::new_spanned(
                field,
                format!("Column `{}` is mapped more than once", metadata.name),
            ));
        }
        fields.push(metadata);
    }
    Ok(RecordMetadata {
        item,
        table,
        fields,
    })
}
