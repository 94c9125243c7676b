pub use stow_core::*;
pub use stow_macros::*;
