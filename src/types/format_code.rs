//! The canonical mapping between friendly format keys and libsfh format codes.
//!
//! libsfh identifies storage formats by small integer codes. Callers usually
//! think in terms of a scalar kind (`int16`, `float32`, ...) or a fixed-width
//! character block (a run of blanks whose length is the block width), so this
//! module offers both as a tagged `FormatKey` and lets any caller fall back to
//! a raw code that is passed through untouched.

use crate::error::SfhError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A scalar element kind understood by libsfh.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Bool,
}

impl ScalarKind {
    /// The lowercase type name, matching numpy's `dtype.name`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::UInt16 => "uint16",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Bool => "bool",
        }
    }
}

impl FromStr for ScalarKind {
    type Err = SfhError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "int8" | "i8" => Ok(Self::Int8),
            "int16" | "i16" => Ok(Self::Int16),
            "int32" | "i32" => Ok(Self::Int32),
            "int64" | "i64" => Ok(Self::Int64),
            "uint16" | "u16" => Ok(Self::UInt16),
            "uint32" | "u32" => Ok(Self::UInt32),
            "uint64" | "u64" => Ok(Self::UInt64),
            "float32" | "f32" => Ok(Self::Float32),
            "float64" | "f64" => Ok(Self::Float64),
            "bool" | "bool_" => Ok(Self::Bool),
            other => Err(SfhError::UnsupportedFormat(format!(
                "unknown scalar kind '{}'",
                other
            ))),
        }
    }
}

/// A friendly, tagged lookup key for the format table.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FormatKey {
    Scalar(ScalarKind),
    /// A fixed-width character block, keyed by its blank-padded width.
    Blank(usize),
}

/// Every key with a known code, in table order.
const FORMAT_TABLE: &[(FormatKey, u16)] = &[
    (FormatKey::Scalar(ScalarKind::Int8), 1),
    (FormatKey::Blank(1), 2),
    (FormatKey::Scalar(ScalarKind::Int16), 3),
    (FormatKey::Scalar(ScalarKind::Int32), 4),
    (FormatKey::Scalar(ScalarKind::Float32), 5),
    (FormatKey::Scalar(ScalarKind::Float64), 6),
    (FormatKey::Scalar(ScalarKind::Bool), 7),
    (FormatKey::Scalar(ScalarKind::UInt16), 9),
    (FormatKey::Scalar(ScalarKind::Int64), 13),
    (FormatKey::Scalar(ScalarKind::UInt32), 14),
    (FormatKey::Scalar(ScalarKind::UInt64), 15),
    (FormatKey::Blank(8), 1794),
    (FormatKey::Blank(16), 3842),
    (FormatKey::Blank(32), 7938),
    (FormatKey::Blank(48), 12034),
    (FormatKey::Blank(64), 16130),
    (FormatKey::Blank(72), 18178),
];

impl FormatKey {
    /// Looks up the libsfh code for this key, if the table has one.
    pub fn code(&self) -> Option<u16> {
        FORMAT_TABLE
            .iter()
            .find(|(key, _)| key == self)
            .map(|(_, code)| *code)
    }

    /// Reverse lookup: the friendly key for a libsfh code.
    pub fn from_code(code: u16) -> Option<FormatKey> {
        FORMAT_TABLE
            .iter()
            .find(|(_, c)| *c == code)
            .map(|(key, _)| *key)
    }
}

impl fmt::Display for FormatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatKey::Scalar(kind) => write!(f, "{}", kind.name()),
            FormatKey::Blank(width) => write!(f, "char[{}]", width),
        }
    }
}

/// What a caller hands to `modify_format`: either a friendly key or a raw code.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FormatSpec {
    Key(FormatKey),
    Raw(u16),
}

impl FormatSpec {
    /// Resolves to the code that is sent to `sfhmdformat_`.
    ///
    /// Raw codes are passed through verbatim. A key without a table entry has
    /// no numeric reading and is rejected before reaching the native layer.
    pub fn resolve(&self) -> Result<u16, SfhError> {
        match self {
            FormatSpec::Raw(code) => Ok(*code),
            FormatSpec::Key(key) => key.code().ok_or_else(|| {
                SfhError::UnsupportedFormat(format!("no format code for key {}", key))
            }),
        }
    }

    /// Parses a textual format argument.
    ///
    /// A non-empty run of blanks selects a character block of that width, a
    /// scalar kind name selects that kind, and a decimal number is taken as a
    /// raw code.
    pub fn parse(text: &str) -> Result<FormatSpec, SfhError> {
        if !text.is_empty() && text.bytes().all(|b| b == b' ') {
            return Ok(FormatSpec::Key(FormatKey::Blank(text.len())));
        }
        if let Ok(kind) = text.parse::<ScalarKind>() {
            return Ok(FormatSpec::Key(FormatKey::Scalar(kind)));
        }
        text.trim()
            .parse::<u16>()
            .map(FormatSpec::Raw)
            .map_err(|_| SfhError::UnsupportedFormat(format!("cannot interpret '{}'", text)))
    }
}

/// A format argument as a dynamically typed caller hands it over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg<'a> {
    /// An integer, taken as a raw code when it fits in `u16`.
    Code(i64),
    /// A format string, read by [`FormatSpec::parse`].
    Text(&'a str),
    /// The name of a scalar type object, e.g. `int16` for `numpy.int16`.
    TypeName(&'a str),
}

impl FormatSpec {
    /// Interprets a dynamically typed format argument.
    pub fn from_arg(arg: FormatArg<'_>) -> Result<FormatSpec, SfhError> {
        match arg {
            FormatArg::Code(code) => u16::try_from(code).map(FormatSpec::Raw).map_err(|_| {
                SfhError::UnsupportedFormat(format!("format code {} is out of range", code))
            }),
            FormatArg::Text(text) => FormatSpec::parse(text),
            FormatArg::TypeName(name) => name
                .parse::<ScalarKind>()
                .map(FormatSpec::from)
                .map_err(|_| SfhError::UnsupportedFormat(format!("no format for type '{}'", name))),
        }
    }
}

impl From<u16> for FormatSpec {
    fn from(code: u16) -> Self {
        FormatSpec::Raw(code)
    }
}

impl From<ScalarKind> for FormatSpec {
    fn from(kind: ScalarKind) -> Self {
        FormatSpec::Key(FormatKey::Scalar(kind))
    }
}

impl From<FormatKey> for FormatSpec {
    fn from(key: FormatKey) -> Self {
        FormatSpec::Key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_codes_match_table() {
        assert_eq!(FormatKey::Scalar(ScalarKind::Int8).code(), Some(1));
        assert_eq!(FormatKey::Scalar(ScalarKind::Int16).code(), Some(3));
        assert_eq!(FormatKey::Scalar(ScalarKind::Float64).code(), Some(6));
        assert_eq!(FormatKey::Scalar(ScalarKind::UInt16).code(), Some(9));
        assert_eq!(FormatKey::Scalar(ScalarKind::UInt64).code(), Some(15));
    }

    #[test]
    fn test_blank_width_codes() {
        assert_eq!(FormatKey::Blank(1).code(), Some(2));
        assert_eq!(FormatKey::Blank(8).code(), Some(1794));
        assert_eq!(FormatKey::Blank(72).code(), Some(18178));
        assert_eq!(FormatKey::Blank(12).code(), None);
    }

    #[test]
    fn test_table_codes_are_unique() {
        for (key, code) in FORMAT_TABLE {
            assert_eq!(FormatKey::from_code(*code), Some(*key));
        }
        assert_eq!(FormatKey::from_code(8), None);
    }

    #[test]
    fn test_parse_blank_runs_and_kind_names() {
        assert_eq!(
            FormatSpec::parse("        ").unwrap(),
            FormatSpec::Key(FormatKey::Blank(8))
        );
        assert_eq!(
            FormatSpec::parse("float32").unwrap(),
            FormatSpec::Key(FormatKey::Scalar(ScalarKind::Float32))
        );
        assert_eq!(
            FormatSpec::parse("bool_").unwrap(),
            FormatSpec::Key(FormatKey::Scalar(ScalarKind::Bool))
        );
    }

    #[test]
    fn test_parse_falls_back_to_raw_code() {
        assert_eq!(FormatSpec::parse("1794").unwrap(), FormatSpec::Raw(1794));
        assert_eq!(FormatSpec::parse("8").unwrap().resolve().unwrap(), 8);
        assert!(FormatSpec::parse("complex128").is_err());
        assert!(FormatSpec::parse("").is_err());
    }

    #[test]
    fn test_resolve_rejects_unmapped_blank_width() {
        let err = FormatSpec::Key(FormatKey::Blank(12)).resolve().unwrap_err();
        assert!(err.to_string().contains("char[12]"));
    }

    #[test]
    fn test_from_arg_dispatches_by_argument_kind() {
        assert_eq!(
            FormatSpec::from_arg(FormatArg::Code(1794)).unwrap(),
            FormatSpec::Raw(1794)
        );
        assert_eq!(
            FormatSpec::from_arg(FormatArg::Text("    ")).unwrap(),
            FormatSpec::Key(FormatKey::Blank(4))
        );
        assert_eq!(
            FormatSpec::from_arg(FormatArg::Text("13")).unwrap(),
            FormatSpec::Raw(13)
        );
        assert_eq!(
            FormatSpec::from_arg(FormatArg::TypeName("int16")).unwrap(),
            FormatSpec::Key(FormatKey::Scalar(ScalarKind::Int16))
        );
        assert_eq!(
            FormatSpec::from_arg(FormatArg::TypeName("bool_")).unwrap(),
            FormatSpec::Key(FormatKey::Scalar(ScalarKind::Bool))
        );
    }

    #[test]
    fn test_from_arg_rejects_out_of_range_codes_and_unknown_types() {
        assert!(matches!(
            FormatSpec::from_arg(FormatArg::Code(70000)),
            Err(SfhError::UnsupportedFormat(_))
        ));
        assert!(FormatSpec::from_arg(FormatArg::Code(-1)).is_err());
        // Type names never fall back to raw codes.
        assert!(FormatSpec::from_arg(FormatArg::TypeName("8")).is_err());
        assert!(FormatSpec::from_arg(FormatArg::TypeName("str")).is_err());
    }
}
