use convert_case::{Case, Casing};
use syn::{Error, LitStr, Result};

/// Column casing requested with `#[stow(rename_all = "..")]`.
///
/// Only casings producing plain identifiers, names are written unquoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RenameRule {
    Lower,
    Upper,
    Pascal,
    Camel,
    Snake,
    ScreamingSnake,
}

impl RenameRule {
    pub(crate) fn parse(value: &LitStr) -> Result<Self> {
        Ok(match value.value().as_str() {
            "lowercase" => Self::Lower,
            "UPPERCASE" => Self::Upper,
            "PascalCase" => Self::Pascal,
            "camelCase" => Self::Camel,
            "snake_case" => Self::Snake,
            "SCREAMING_SNAKE_CASE" => Self::ScreamingSnake,
            other => {
                return Err(Error::new(
                    value.span(),
                    format!(
                        "Unknown case `{other}`, expected one of: lowercase, UPPERCASE, PascalCase, camelCase, snake_case, SCREAMING_SNAKE_CASE"
                    ),
                ));
            }
        })
    }

    pub(crate) fn apply(self, name: &str) -> String {
        match self {
            Self::Lower => name.to_case(Case::Flat),
            Self::Upper => name.to_case(Case::UpperFlat),
            Self::Pascal => name.to_case(Case::Pascal),
            Self::Camel => name.to_case(Case::Camel),
            Self::Snake => name.to_case(Case::Snake),
            Self::ScreamingSnake => name.to_case(Case::UpperSnake),
        }
    }
}
