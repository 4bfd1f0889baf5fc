//! This module serves as the public API for the scripting-language layer.
//!
//! Its primary responsibility is to declare the sub-modules that translate the
//! Rust handle into another ecosystem's object model. Currently it only contains
//! the Python bridge.

//==================================================================================
// 1. Module Declarations
//==================================================================================
/// Contains all logic for interfacing with the Python/CPython ecosystem.
pub mod python;

//==================================================================================
// 2. Public API Re-exports
//==================================================================================
pub use self::python::{
    enable_verbose_logging_py, load_library_py, PyObjectInfo, PyShotfileHeader,
};
