//! This module defines the strongly-typed values exchanged with libsfh.
//!
//! It currently includes the format table (`FormatKey`, `FormatSpec`) and the
//! object descriptor returned by `ShotfileHeader::object_info`.

pub mod format_code;
pub mod object_info;

// Re-export the main type(s) for easier access.
pub use format_code::{FormatArg, FormatKey, FormatSpec, ScalarKind};
pub use object_info::ObjectInfo;
