use crate::{AsValue, Error, Materialize, Result, Value};
use proc_macro2::TokenStream;
use quote::{ToTokens, TokenStreamExt, quote};
use std::{borrow::Cow, fmt};

/// Role a field plays with respect to generated keys.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum KeyRole {
    /// Plain column.
    #[default]
    None,
    /// Identity generated by the store. Never inserted nor updated, returned by `INSERT`
    /// and used as the default `UPDATE` predicate.
    PrimaryKey,
    /// Column with a store side default. Left out of `INSERT` while absent.
    DefaultKey,
}

impl ToTokens for KeyRole {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        tokens.append_all(match self {
            KeyRole::None => quote!(::stow::KeyRole::None),
            KeyRole::PrimaryKey => quote!(::stow::KeyRole::PrimaryKey),
            KeyRole::DefaultKey => quote!(::stow::KeyRole::DefaultKey),
        });
    }
}

pub type Getter<R> = fn(&R) -> Value;
pub type Setter<R> = fn(&mut R, Value) -> Result<()>;

/// Resolved metadata of one mapped field of `R`.
pub struct FieldDescriptor<R> {
    /// Column name.
    pub name: &'static str,
    /// Typed absent value describing the declared type.
    pub value: Value,
    /// The Rust type can represent an absent value.
    pub nullable: bool,
    pub role: KeyRole,
    pub get: Getter<R>,
    pub set: Setter<R>,
}

impl<R> FieldDescriptor<R> {
    pub fn is_primary_key(&self) -> bool {
        self.role == KeyRole::PrimaryKey
    }
    pub fn is_default_key(&self) -> bool {
        self.role == KeyRole::DefaultKey
    }
    /// Current value of the field on `record`.
    pub fn value_of(&self, record: &R) -> Value {
        (self.get)(record)
    }
    /// Case insensitive match against a column label.
    pub fn matches(&self, column: &str) -> bool {
        self.name.eq_ignore_ascii_case(column)
    }
}

impl<R> fmt::Debug for FieldDescriptor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("value", &self.value)
            .field("nullable", &self.nullable)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// Ordered field table of a record type, built once and shared read only.
pub struct RecordDescriptor<R> {
    pub type_name: &'static str,
    /// Target table, `type_name + "s"` unless declared.
    pub table_name: Cow<'static, str>,
    pub fields: Box<[FieldDescriptor<R>]>,
}

impl<R> RecordDescriptor<R> {
    pub fn builder(type_name: &'static str) -> RecordDescriptorBuilder<R> {
        RecordDescriptorBuilder {
            type_name,
            table_name: None,
            fields: Vec::new(),
        }
    }
    pub fn primary_key(&self) -> Option<&FieldDescriptor<R>> {
        self.fields.iter().find(|f| f.is_primary_key())
    }
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor<R>> {
        self.fields.iter().find(|f| f.matches(name))
    }
    /// Explicit `table_name` when given and not blank, the descriptor's table otherwise.
    pub fn table_or<'a>(&'a self, table_name: Option<&'a str>) -> &'a str {
        match table_name {
            Some(table) if !table.trim().is_empty() => table,
            _ => &self.table_name,
        }
    }
}

impl<R> fmt::Debug for RecordDescriptor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordDescriptor")
            .field("type_name", &self.type_name)
            .field("table_name", &self.table_name)
            .field("fields", &self.fields)
            .finish()
    }
}

/// Registration of a record type without the derive macro.
///
/// ```rust
/// use stow_core::{KeyRole, RecordDescriptor, Value};
/// #[derive(Default)]
/// struct Tag {
///     id: Option<i64>,
///     label: String,
/// }
/// let descriptor = RecordDescriptor::<Tag>::builder("Tag")
///     .field::<Option<i64>>("TagId", |t| t.id.into(), |t, v| Ok(t.id = stow_core::AsValue::try_from_value(v)?))
///     .role(KeyRole::PrimaryKey)
///     .field::<String>("Label", |t| t.label.clone().into(), |t, v| Ok(t.label = stow_core::AsValue::try_from_value(v)?))
///     .build()
///     .unwrap();
/// assert_eq!(descriptor.table_name, "Tags");
/// assert_eq!(descriptor.primary_key().map(|f| f.name), Some("TagId"));
/// assert!(matches!(descriptor.fields[1].value, Value::Varchar(None)));
/// ```
pub struct RecordDescriptorBuilder<R> {
    type_name: &'static str,
    table_name: Option<Cow<'static, str>>,
    fields: Vec<FieldDescriptor<R>>,
}

impl<R> RecordDescriptorBuilder<R> {
    pub fn table(mut self, table_name: impl Into<Cow<'static, str>>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    /// Append a field, `T` is the declared Rust type and decides the column type.
    pub fn field<T: AsValue>(mut self, name: &'static str, get: Getter<R>, set: Setter<R>) -> Self {
        let value = T::as_empty_value();
        self.fields.push(FieldDescriptor {
            name,
            value,
            nullable: T::try_from_value(T::as_empty_value()).is_ok(),
            role: KeyRole::None,
            get,
            set,
        });
        self
    }

    /// Set the role of the last appended field.
    pub fn role(mut self, role: KeyRole) -> Self {
        if let Some(field) = self.fields.last_mut() {
            field.role = role;
        }
        self
    }

    pub fn primary_key(self) -> Self {
        self.role(KeyRole::PrimaryKey)
    }

    pub fn default_key(self) -> Self {
        self.role(KeyRole::DefaultKey)
    }

    pub fn build(self) -> Result<RecordDescriptor<R>> {
        for (i, field) in self.fields.iter().enumerate() {
            if self.fields[..i].iter().any(|f| f.matches(field.name)) {
                return Err(Error::msg(format!(
                    "Field `{}` is declared more than once in `{}`",
                    field.name, self.type_name
                )));
            }
        }
        if self.fields.iter().filter(|f| f.is_primary_key()).count() > 1 {
            return Err(Error::msg(format!(
                "`{}` declares more than one primary key",
                self.type_name
            )));
        }
        Ok(RecordDescriptor {
            type_name: self.type_name,
            table_name: self
                .table_name
                .unwrap_or_else(|| format!("{}s", self.type_name).into()),
            fields: self.fields.into_boxed_slice(),
        })
    }
}

/// A struct mapped to a table.
///
/// Usually implemented with `#[derive(Record)]`. Implementors must return the same
/// descriptor on every call, the derive keeps it in a `static LazyLock`.
pub trait Record: Materialize + Default + Send + Sync + 'static {
    fn descriptor() -> &'static RecordDescriptor<Self>;

    fn table_name() -> &'static str {
        &Self::descriptor().table_name
    }
}

/// Ordered field descriptors of `R`.
pub fn resolve<R: Record>() -> &'static [FieldDescriptor<R>] {
    &R::descriptor().fields
}
