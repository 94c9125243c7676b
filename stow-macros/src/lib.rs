mod decode_field;
mod decode_record;
mod rename_all;

use decode_record::{RecordMetadata, decode_record};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use stow_core::TypeDecoded;
use syn::{ItemStruct, parse_macro_input};

/// Implements `Record` and `Materialize` for a struct with named fields.
///
/// Struct attributes: `#[stow(table = "Name")]`, `#[stow(rename_all = "PascalCase")]`.
/// Field attributes: `#[stow(primary_key)]`, `#[stow(default_key)]`,
/// `#[stow(name = "Column")]`, `#[stow(ignore)]`.
#[proc_macro_derive(Record, attributes(stow))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let item = parse_macro_input!(input as ItemStruct);
    match decode_record(item) {
        Ok(record) => encode_record(&record).into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn encode_record(record: &RecordMetadata) -> TokenStream2 {
    let name = &record.item.ident;
    let type_name = name.to_string();
    let table = &record.table;
    let fields = record.fields.iter().map(|f| {
        let column = &f.name;
        let ident = &f.ident;
        let ty = &f.ty;
        let role = f.role;
        let (value, nullable) = match &f.decoded {
            Some(TypeDecoded { value, nullable }) => (quote!(#value), quote!(#nullable)),
            None => (
                quote!(<#ty as ::stow::AsValue>::as_empty_value()),
                quote!(<#ty as ::stow::AsValue>::try_from_value(
                    <#ty as ::stow::AsValue>::as_empty_value()
                )
                .is_ok()),
            ),
        };
        quote! {
            ::stow::FieldDescriptor {
                name: #column,
                value: #value,
                nullable: #nullable,
                role: #role,
                get: |record: &#name| {
                    ::stow::AsValue::as_value(::std::clone::Clone::clone(&record.#ident))
                },
                set: |record: &mut #name, value: ::stow::Value| {
                    record.#ident = <#ty as ::stow::AsValue>::try_from_value(value)?;
                    Ok(())
                },
            }
        }
    });
    quote! {
        impl ::stow::Record for #name {
            fn descriptor() -> &'static ::stow::RecordDescriptor<Self> {
                static DESCRIPTOR: ::std::sync::LazyLock<::stow::RecordDescriptor<#name>> =
                    ::std::sync::LazyLock::new(|| ::stow::RecordDescriptor {
                        type_name: #type_name,
                        table_name: ::std::borrow::Cow::Borrowed(#table),
                        fields: ::std::vec![#(#fields),*].into_boxed_slice(),
                    });
                &DESCRIPTOR
            }
        }

        impl ::stow::Materialize for #name {
            fn materialize(row: ::stow::RowLabeled) -> ::stow::Result<Self> {
                ::stow::materialize_record::<Self>(row)
            }
        }
    }
}
