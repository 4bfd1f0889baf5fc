//! This file is the root of the `sfh` Rust crate.
//!
//! Its responsibilities are strictly limited to:
//! 1.  Declaring all the top-level modules of our library (`header`, `native`, etc.)
//!     so the Rust compiler knows they exist.
//! 2.  Defining the `#[pymodule]` which acts as the main entry point when the
//!     compiled library is imported into Python (feature `python`).

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
//==================================================================================
// 1. Module Declarations
//==================================================================================
#[macro_use]
mod observability; // Make macros available throughout the crate

pub mod config;
pub mod error;
pub mod header;
pub mod native;
pub mod types;

#[cfg(feature = "python")]
mod ffi;

pub use config::SfhConfig;
pub use error::{Result, SfhError};
pub use header::ShotfileHeader;
pub use native::{LibSfh, SfhLibrary};
pub use types::{FormatArg, FormatKey, FormatSpec, ObjectInfo, ScalarKind};

//==================================================================================
// 2. Python Module Definition
//==================================================================================
#[cfg(feature = "python")]
use pyo3::prelude::*;

/// The `sfh` Python module.
#[cfg(feature = "python")]
#[pymodule]
fn sfh(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // --- Classes ---
    m.add_class::<ffi::PyShotfileHeader>()?;
    m.add_class::<ffi::PyObjectInfo>()?;

    // --- Library loading ---
    m.add_function(wrap_pyfunction!(ffi::load_library_py, m)?)?;

    // --- Expose the error type raised for libsfh failures ---
    m.add(
        "SfhError",
        m.py().get_type_bound::<pyo3::exceptions::PyRuntimeError>(),
    )?;

    // --- Expose version string as a module attribute ---
    m.add("__version__", VERSION)?;

    // --- Turn on logging of native calls ---
    m.add_function(wrap_pyfunction!(ffi::enable_verbose_logging_py, m)?)?;

    Ok(())
}
