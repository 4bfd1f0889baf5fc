// In: src/native/libsfh.rs

//! The production `SfhLibrary`, backed by the shared library loaded at runtime.
//!
//! All symbols are resolved eagerly in [`LibSfh::load`]. A library build that
//! lacks any entry point is rejected at load time, which doubles as the ABI
//! compatibility check for a deployment.

use std::os::raw::c_char;
use std::path::{Path, PathBuf};

use libloading::{Library, Symbol};

use crate::config::SfhConfig;
use crate::error::SfhError;
use crate::native::{NativeText, SfhLibrary};

//==================================================================================
// 1. Entry Point Table
//==================================================================================

macro_rules! entry_points {
    ($($field:ident: $symbol:literal => fn($($arg:ty),* $(,)?);)+) => {
        struct EntryPoints {
            $($field: unsafe extern "C" fn($($arg),*),)+
        }

        impl EntryPoints {
            /// # Safety
            /// `library` must be a libsfh build whose exported symbols follow the
            /// signatures declared in this table.
            unsafe fn resolve(library: &Library) -> Result<Self, SfhError> {
                Ok(Self {
                    $($field: {
                        let symbol: Symbol<unsafe extern "C" fn($($arg),*)> = library
                            .get(concat!($symbol, "\0").as_bytes())
                            .map_err(|source| SfhError::MissingSymbol { symbol: $symbol, source })?;
                        *symbol
                    },)+
                })
            }
        }
    };
}

// Argument order: error out, handle ref, regular arguments, then one hidden
// `u64` length per character argument. `sfhopen_` takes the name before the ref.
entry_points! {
    open: "sfhopen_" => fn(*mut i32, *const c_char, *mut i32, u64);
    close: "sfhclose_" => fn(*mut i32, *mut i32);
    lonam: "sfhlonam_" => fn(*mut i32, *mut i32, *mut i16, *mut c_char, *mut u16, u64);
    rdphysdim: "sfhrdphysdim_" => fn(*mut i32, *mut i32, *const c_char, *mut u16, u64);
    rdobj: "sfhrdobj_" => fn(
        *mut i32, *mut i32, *const c_char, *mut u16, *mut u32, *mut u32, *mut u16, u64,
    );
    rstatus: "sfhrstatus_" => fn(*mut i32, *mut i32, *const c_char, *mut i32, u64);
    wstatus: "sfhwstatus_" => fn(*mut i32, *mut i32, *const c_char, *const i32, u64);
    rdgmod: "sfhrdgmod_" => fn(*mut i32, *mut i32, *mut c_char, u64);
    diagmod: "sfhdiagmod_" => fn(*mut i32, *mut i32, *const c_char, u64);
    newobj: "sfhnewobj_" => fn(*mut i32, *mut i32, *const c_char, *const u16, *const u16, u64);
    rdformat: "sfhrdformat_" => fn(*mut i32, *mut i32, *const c_char, *mut u16, u64);
    mdformat: "sfhmdformat_" => fn(*mut i32, *mut i32, *const c_char, *const u16, u64);
    rdnsteps: "sfhrdnsteps_" => fn(*mut i32, *mut i32, *const c_char, *mut u32, u64);
    monam: "sfhmonam_" => fn(*mut i32, *mut i32, *const c_char, *const c_char, u64, u64);
    rename: "sfhrename_" => fn(*mut i32, *mut i32, *const c_char, u64);
    modtim: "sfhmodtim_" => fn(*mut i32, *mut i32, *const c_char, *const u32, u64);
    mtext: "sfhmtext_" => fn(*mut i32, *mut i32, *const c_char, *const c_char, u64, u64);
    strel: "sfhstrel_" => fn(*mut i32, *mut i32, *const c_char, *const c_char, u64, u64);
    mdrel: "sfhmdrel_" => fn(
        *mut i32, *mut i32, *const c_char, *const c_char, *const c_char, u64, u64, u64,
    );
    delrel: "sfhdelrel_" => fn(*mut i32, *mut i32, *const c_char, *const c_char, u64, u64);
    rdindex1: "sfhrdindex1_" => fn(*mut i32, *mut i32, *const c_char, *mut u32, u64);
    rdindex24: "sfhrdindex24_" => fn(
        *mut i32, *mut i32, *const c_char, *mut u32, *mut u32, *mut u32, u64,
    );
    mdindex1: "sfhmdindex1_" => fn(*mut i32, *mut i32, *const c_char, *const u32, u64);
    mdindex24: "sfhmdindex24_" => fn(
        *mut i32, *mut i32, *const c_char, *const u32, *const u32, *const u32, u64,
    );
    devinfo: "sfhdevinfo_" => fn(*mut i32, *mut i32, *const c_char, *mut i16, *mut i32, u64);
    streltb: "sfhstreltb_" => fn(*mut i32, *mut i32, *const c_char, *const c_char, u64, u64);
    error: "sfherror_" => fn(*mut i32, *const c_char, u64);
}

//==================================================================================
// 2. The Loaded Library
//==================================================================================

/// A loaded libsfh with every entry point resolved.
pub struct LibSfh {
    entry: EntryPoints,
    path: PathBuf,
    // Keeps the code behind `entry` mapped; must outlive every call.
    _library: Library,
}

impl LibSfh {
    /// Loads the shared library at `path` and resolves all entry points.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SfhError> {
        let path = path.as_ref().to_path_buf();
        // SAFETY: loading runs the library's initialisers; libsfh has no
        // constructor side effects beyond its own state.
        let library = unsafe { Library::new(&path) }.map_err(|source| SfhError::LibraryLoad {
            path: path.clone(),
            source,
        })?;
        // SAFETY: the signatures in the table mirror the libsfh interface.
        let entry = unsafe { EntryPoints::resolve(&library)? };
        log::debug!("loaded libsfh from {}", path.display());
        Ok(Self {
            entry,
            path,
            _library: library,
        })
    }

    /// Loads the library named by a configuration.
    pub fn from_config(config: &SfhConfig) -> Result<Self, SfhError> {
        Self::load(config.resolve_library_path()?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for LibSfh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibSfh").field("path", &self.path).finish()
    }
}

//==================================================================================
// 3. SfhLibrary Implementation
//==================================================================================

// SAFETY (applies to every call below): all pointers come from live Rust
// references or slices, every character pointer is paired with its exact byte
// length, and output buffers are sized by the caller as libsfh expects.
impl SfhLibrary for LibSfh {
    fn open(&self, filename: NativeText<'_>, sfhref: &mut i32) -> i32 {
        let mut error = 0;
        unsafe { (self.entry.open)(&mut error, filename.as_ptr(), sfhref, filename.len()) };
        error
    }

    fn close(&self, sfhref: &mut i32) -> i32 {
        let mut error = 0;
        unsafe { (self.entry.close)(&mut error, sfhref) };
        error
    }

    fn list_objects(
        &self,
        sfhref: &mut i32,
        capacity: &mut i16,
        names: &mut [u8],
        types: &mut [u16],
    ) -> i32 {
        debug_assert!(types.len() >= *capacity as usize);
        let mut error = 0;
        unsafe {
            (self.entry.lonam)(
                &mut error,
                sfhref,
                capacity,
                names.as_mut_ptr() as *mut c_char,
                types.as_mut_ptr(),
                names.len() as u64,
            )
        };
        error
    }

    fn read_phys_dim(&self, sfhref: &mut i32, name: NativeText<'_>, physdim: &mut u16) -> i32 {
        let mut error = 0;
        unsafe { (self.entry.rdphysdim)(&mut error, sfhref, name.as_ptr(), physdim, name.len()) };
        error
    }

    fn read_object(
        &self,
        sfhref: &mut i32,
        name: NativeText<'_>,
        object_type: &mut u16,
        num_dims: &mut u32,
        num_steps: &mut u32,
        format: &mut u16,
    ) -> i32 {
        let mut error = 0;
        unsafe {
            (self.entry.rdobj)(
                &mut error,
                sfhref,
                name.as_ptr(),
                object_type,
                num_dims,
                num_steps,
                format,
                name.len(),
            )
        };
        error
    }

    fn read_status(&self, sfhref: &mut i32, name: NativeText<'_>, status: &mut i32) -> i32 {
        let mut error = 0;
        unsafe { (self.entry.rstatus)(&mut error, sfhref, name.as_ptr(), status, name.len()) };
        error
    }

    fn write_status(&self, sfhref: &mut i32, name: NativeText<'_>, status: i32) -> i32 {
        let mut error = 0;
        unsafe { (self.entry.wstatus)(&mut error, sfhref, name.as_ptr(), &status, name.len()) };
        error
    }

    fn read_modus(&self, sfhref: &mut i32, modus: &mut [u8]) -> i32 {
        let mut error = 0;
        unsafe {
            (self.entry.rdgmod)(
                &mut error,
                sfhref,
                modus.as_mut_ptr() as *mut c_char,
                modus.len() as u64,
            )
        };
        error
    }

    fn write_modus(&self, sfhref: &mut i32, modus: NativeText<'_>) -> i32 {
        let mut error = 0;
        unsafe { (self.entry.diagmod)(&mut error, sfhref, modus.as_ptr(), modus.len()) };
        error
    }

    fn new_object(
        &self,
        sfhref: &mut i32,
        name: NativeText<'_>,
        object_type: u16,
        sub_type: u16,
    ) -> i32 {
        let mut error = 0;
        unsafe {
            (self.entry.newobj)(
                &mut error,
                sfhref,
                name.as_ptr(),
                &object_type,
                &sub_type,
                name.len(),
            )
        };
        error
    }

    fn read_format(&self, sfhref: &mut i32, name: NativeText<'_>, format: &mut u16) -> i32 {
        let mut error = 0;
        unsafe { (self.entry.rdformat)(&mut error, sfhref, name.as_ptr(), format, name.len()) };
        error
    }

    fn modify_format(&self, sfhref: &mut i32, name: NativeText<'_>, format: u16) -> i32 {
        let mut error = 0;
        unsafe { (self.entry.mdformat)(&mut error, sfhref, name.as_ptr(), &format, name.len()) };
        error
    }

    fn read_nsteps(&self, sfhref: &mut i32, name: NativeText<'_>, nsteps: &mut u32) -> i32 {
        let mut error = 0;
        unsafe { (self.entry.rdnsteps)(&mut error, sfhref, name.as_ptr(), nsteps, name.len()) };
        error
    }

    fn modify_name(
        &self,
        sfhref: &mut i32,
        name: NativeText<'_>,
        new_name: NativeText<'_>,
    ) -> i32 {
        let mut error = 0;
        unsafe {
            (self.entry.monam)(
                &mut error,
                sfhref,
                name.as_ptr(),
                new_name.as_ptr(),
                name.len(),
                new_name.len(),
            )
        };
        error
    }

    fn rename(&self, sfhref: &mut i32, new_name: NativeText<'_>) -> i32 {
        let mut error = 0;
        unsafe { (self.entry.rename)(&mut error, sfhref, new_name.as_ptr(), new_name.len()) };
        error
    }

    fn modify_timebase(&self, sfhref: &mut i32, name: NativeText<'_>, num_values: u32) -> i32 {
        let mut error = 0;
        unsafe {
            (self.entry.modtim)(&mut error, sfhref, name.as_ptr(), &num_values, name.len())
        };
        error
    }

    fn modify_text(&self, sfhref: &mut i32, name: NativeText<'_>, text: NativeText<'_>) -> i32 {
        let mut error = 0;
        unsafe {
            (self.entry.mtext)(
                &mut error,
                sfhref,
                name.as_ptr(),
                text.as_ptr(),
                name.len(),
                text.len(),
            )
        };
        error
    }

    fn set_relation(
        &self,
        sfhref: &mut i32,
        name: NativeText<'_>,
        relation: NativeText<'_>,
    ) -> i32 {
        let mut error = 0;
        unsafe {
            (self.entry.strel)(
                &mut error,
                sfhref,
                name.as_ptr(),
                relation.as_ptr(),
                name.len(),
                relation.len(),
            )
        };
        error
    }

    fn modify_relation(
        &self,
        sfhref: &mut i32,
        name: NativeText<'_>,
        old_relation: NativeText<'_>,
        new_relation: NativeText<'_>,
    ) -> i32 {
        let mut error = 0;
        unsafe {
            (self.entry.mdrel)(
                &mut error,
                sfhref,
                name.as_ptr(),
                old_relation.as_ptr(),
                new_relation.as_ptr(),
                name.len(),
                old_relation.len(),
                new_relation.len(),
            )
        };
        error
    }

    fn delete_relation(
        &self,
        sfhref: &mut i32,
        name: NativeText<'_>,
        relation: NativeText<'_>,
    ) -> i32 {
        let mut error = 0;
        unsafe {
            (self.entry.delrel)(
                &mut error,
                sfhref,
                name.as_ptr(),
                relation.as_ptr(),
                name.len(),
                relation.len(),
            )
        };
        error
    }

    fn read_index1(&self, sfhref: &mut i32, name: NativeText<'_>, index1: &mut u32) -> i32 {
        let mut error = 0;
        unsafe { (self.entry.rdindex1)(&mut error, sfhref, name.as_ptr(), index1, name.len()) };
        error
    }

    fn read_index24(
        &self,
        sfhref: &mut i32,
        name: NativeText<'_>,
        indices: &mut [u32; 3],
    ) -> i32 {
        let mut error = 0;
        let [index2, index3, index4] = indices;
        unsafe {
            (self.entry.rdindex24)(
                &mut error,
                sfhref,
                name.as_ptr(),
                index2,
                index3,
                index4,
                name.len(),
            )
        };
        error
    }

    fn modify_index1(&self, sfhref: &mut i32, name: NativeText<'_>, index1: u32) -> i32 {
        let mut error = 0;
        unsafe { (self.entry.mdindex1)(&mut error, sfhref, name.as_ptr(), &index1, name.len()) };
        error
    }

    fn modify_index24(&self, sfhref: &mut i32, name: NativeText<'_>, indices: [u32; 3]) -> i32 {
        let mut error = 0;
        unsafe {
            (self.entry.mdindex24)(
                &mut error,
                sfhref,
                name.as_ptr(),
                &indices[0],
                &indices[1],
                &indices[2],
                name.len(),
            )
        };
        error
    }

    fn device_info(
        &self,
        sfhref: &mut i32,
        name: NativeText<'_>,
        crate_number: &mut i16,
        station_number: &mut i32,
    ) -> i32 {
        let mut error = 0;
        unsafe {
            (self.entry.devinfo)(
                &mut error,
                sfhref,
                name.as_ptr(),
                crate_number,
                station_number,
                name.len(),
            )
        };
        error
    }

    fn set_relation_timebase(
        &self,
        sfhref: &mut i32,
        name: NativeText<'_>,
        timebase: NativeText<'_>,
    ) -> i32 {
        let mut error = 0;
        unsafe {
            (self.entry.streltb)(
                &mut error,
                sfhref,
                name.as_ptr(),
                timebase.as_ptr(),
                name.len(),
                timebase.len(),
            )
        };
        error
    }

    fn error_message(&self, entry: &'static str, code: i32) -> Option<String> {
        // sfherror_ prints its diagnostic itself, prefixed with the user string.
        let mut code = code;
        let prefix = crate::native::marshal::marshal(entry);
        unsafe { (self.entry.error)(&mut code, prefix.as_ptr(), prefix.len()) };
        None
    }
}
