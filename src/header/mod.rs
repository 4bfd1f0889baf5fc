// In: src/header/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Header Handle
// ====================================================================================
//
// `ShotfileHeader` is the sole public-facing API of the binding. It owns one libsfh
// handle reference and knows two states:
//
//   Closed (sfhref == 0) --open()--> Open (sfhref != 0) --close()/drop--> Closed
//                                      `--open()--> close, then Open again
//
// Every call other than `open` checks the state first and fails with
// `SfhError::NotOpen` without touching the library. Every native call goes
// through the same three steps:
//
//   1. marshal text arguments (`native::marshal`)
//   2. invoke the `SfhLibrary` entry point
//   3. `check` the returned code, then unmarshal outputs
//
// All operations take `&mut self`: libsfh is not documented as thread-safe, and the
// exclusive borrow serializes access to a handle for the duration of each call.
// ====================================================================================

use std::sync::Arc;

use crate::config::SfhConfig;
use crate::error::{Result, SfhError};
use crate::native::marshal::{blank_buffer, marshal, unmarshal};
use crate::native::{LibSfh, SfhLibrary};
use crate::types::{FormatSpec, ObjectInfo};

/// Width of a name slot in the `sfhlonam_` listing.
pub const NAME_WIDTH: usize = 8;
/// Width of the diagnostic mode buffer filled by `sfhrdgmod_`.
pub const MODUS_WIDTH: usize = 8;
/// Default number of slots requested when listing objects.
pub const DEFAULT_LIST_CAPACITY: usize = 100;

/// An owned handle on one shotfile header inside libsfh.
pub struct ShotfileHeader<L: SfhLibrary = LibSfh> {
    library: Arc<L>,
    sfhref: i32,
    list_capacity: usize,
}

impl ShotfileHeader<LibSfh> {
    /// Loads the library described by `config` and returns a closed handle on it.
    pub fn from_config(config: &SfhConfig) -> Result<Self> {
        let library = Arc::new(LibSfh::from_config(config)?);
        Self::new(library).with_list_capacity(config.object_list_capacity)
    }
}

impl<L: SfhLibrary> ShotfileHeader<L> {
    /// Creates a closed handle.
    pub fn new(library: Arc<L>) -> Self {
        Self {
            library,
            sfhref: 0,
            list_capacity: DEFAULT_LIST_CAPACITY,
        }
    }

    /// Creates a handle and opens `filename` on it.
    pub fn open_with(library: Arc<L>, filename: impl AsRef<[u8]>) -> Result<Self> {
        let mut header = Self::new(library);
        header.open(filename)?;
        Ok(header)
    }

    /// Overrides the number of slots requested by [`objects`](Self::objects).
    pub fn with_list_capacity(mut self, capacity: usize) -> Result<Self> {
        if capacity == 0 || capacity > i16::MAX as usize {
            return Err(SfhError::Config(format!(
                "object list capacity must be within 1..={}, got {}",
                i16::MAX,
                capacity
            )));
        }
        self.list_capacity = capacity;
        Ok(self)
    }

    /// `true` while the handle refers to an open header.
    pub fn status(&self) -> bool {
        self.sfhref != 0
    }

    pub fn library(&self) -> &Arc<L> {
        &self.library
    }

    //==============================================================================
    // 1. Lifecycle
    //==============================================================================

    /// Opens `filename`, closing any header this handle already holds.
    pub fn open(&mut self, filename: impl AsRef<[u8]>) -> Result<()> {
        self.close()?;
        let file = String::from_utf8_lossy(filename.as_ref());
        let mut sfhref = 0;
        let code = self.library.open(marshal(&filename), &mut sfhref);
        if let Err(e) = self.check("sfhopen_", code) {
            if sfhref != 0 {
                self.release_partial_open(sfhref);
            }
            return Err(e);
        }
        self.sfhref = sfhref;
        log_metric!("event" = "open", "file" = file, "sfhref" = sfhref);
        Ok(())
    }

    /// Closes a reference libsfh handed out alongside a failed `sfhopen_`.
    ///
    /// The open error is what the caller sees, so the close outcome is only logged.
    fn release_partial_open(&self, mut sfhref: i32) {
        let leaked = sfhref;
        let code = self.library.close(&mut sfhref);
        log_metric!("event" = "close_after_failed_open", "sfhref" = leaked, "code" = code);
        if code != 0 {
            log::warn!(
                "sfhclose_ returned {} for reference {} left by a failed sfhopen_",
                code,
                leaked
            );
        }
    }

    /// Closes the header. A no-op on a closed handle.
    ///
    /// The reference is reset even when `sfhclose_` reports an error, so the
    /// native close is never attempted twice for one open.
    pub fn close(&mut self) -> Result<()> {
        if !self.status() {
            return Ok(());
        }
        let code = self.library.close(&mut self.sfhref);
        let closed = std::mem::replace(&mut self.sfhref, 0);
        log_metric!("event" = "close", "sfhref" = closed, "code" = code);
        self.check("sfhclose_", code)
    }

    //==============================================================================
    // 2. Object Enumeration & Description
    //==============================================================================

    /// Lists the header's objects as `(names, type codes)`, in native slot order.
    ///
    /// Slots whose type code is zero are empty and skipped.
    pub fn objects(&mut self) -> Result<(Vec<String>, Vec<u32>)> {
        self.ensure_open()?;
        let capacity = self.list_capacity;
        let mut list_len = capacity as i16;
        let mut names = blank_buffer(capacity * NAME_WIDTH);
        let mut types = vec![0u16; capacity];
        let code =
            self.library
                .list_objects(&mut self.sfhref, &mut list_len, &mut names, &mut types);
        self.check("sfhlonam_", code)?;

        Ok(names
            .chunks_exact(NAME_WIDTH)
            .zip(types.iter())
            .filter(|(_, ty)| **ty != 0)
            .map(|(field, &ty)| (unmarshal(field), u32::from(ty)))
            .unzip())
    }

    pub fn phys_dim(&mut self, name: impl AsRef<[u8]>) -> Result<u16> {
        self.ensure_open()?;
        let mut physdim = 0;
        let code = self
            .library
            .read_phys_dim(&mut self.sfhref, marshal(&name), &mut physdim);
        self.check("sfhrdphysdim_", code)?;
        Ok(physdim)
    }

    /// Describes one object: type, dimensionality, step count and format.
    pub fn object_info(&mut self, name: impl AsRef<[u8]>) -> Result<ObjectInfo> {
        self.ensure_open()?;
        let (mut object_type, mut num_dims, mut num_steps, mut format) = (0, 0, 0, 0);
        let code = self.library.read_object(
            &mut self.sfhref,
            marshal(&name),
            &mut object_type,
            &mut num_dims,
            &mut num_steps,
            &mut format,
        );
        self.check("sfhrdobj_", code)?;
        Ok(ObjectInfo {
            name: String::from_utf8_lossy(name.as_ref()).into_owned(),
            object_type,
            num_dims,
            num_steps,
            format,
        })
    }

    pub fn nsteps(&mut self, name: impl AsRef<[u8]>) -> Result<u32> {
        self.ensure_open()?;
        let mut nsteps = 0;
        let code = self
            .library
            .read_nsteps(&mut self.sfhref, marshal(&name), &mut nsteps);
        self.check("sfhrdnsteps_", code)?;
        Ok(nsteps)
    }

    pub fn new_object(
        &mut self,
        name: impl AsRef<[u8]>,
        object_type: u16,
        sub_type: u16,
    ) -> Result<()> {
        self.ensure_open()?;
        let code = self
            .library
            .new_object(&mut self.sfhref, marshal(&name), object_type, sub_type);
        self.check("sfhnewobj_", code)
    }

    pub fn modify_name(
        &mut self,
        name: impl AsRef<[u8]>,
        new_name: impl AsRef<[u8]>,
    ) -> Result<()> {
        self.ensure_open()?;
        let code = self
            .library
            .modify_name(&mut self.sfhref, marshal(&name), marshal(&new_name));
        self.check("sfhmonam_", code)
    }

    pub fn modify_timebase(
        &mut self,
        name: impl AsRef<[u8]>,
        num_values: u32,
    ) -> Result<()> {
        self.ensure_open()?;
        let code = self
            .library
            .modify_timebase(&mut self.sfhref, marshal(&name), num_values);
        self.check("sfhmodtim_", code)
    }

    pub fn modify_text(
        &mut self,
        name: impl AsRef<[u8]>,
        text: impl AsRef<[u8]>,
    ) -> Result<()> {
        self.ensure_open()?;
        let code = self
            .library
            .modify_text(&mut self.sfhref, marshal(&name), marshal(&text));
        self.check("sfhmtext_", code)
    }

    //==============================================================================
    // 3. Status Flags & Diagnostic Mode
    //==============================================================================

    /// The application-defined status flag of an object.
    pub fn status_flag(&mut self, name: impl AsRef<[u8]>) -> Result<i32> {
        self.ensure_open()?;
        let mut status = 0;
        let code = self
            .library
            .read_status(&mut self.sfhref, marshal(&name), &mut status);
        self.check("sfhrstatus_", code)?;
        Ok(status)
    }

    pub fn set_status_flag(&mut self, name: impl AsRef<[u8]>, status: i32) -> Result<()> {
        self.ensure_open()?;
        let code = self
            .library
            .write_status(&mut self.sfhref, marshal(&name), status);
        self.check("sfhwstatus_", code)
    }

    /// The header's diagnostic mode, trimmed and free of NUL padding.
    pub fn modus(&mut self) -> Result<String> {
        self.ensure_open()?;
        let mut modus = blank_buffer(MODUS_WIDTH);
        let code = self.library.read_modus(&mut self.sfhref, &mut modus);
        self.check("sfhrdgmod_", code)?;
        Ok(unmarshal(&modus))
    }

    pub fn set_modus(&mut self, modus: impl AsRef<[u8]>) -> Result<()> {
        self.ensure_open()?;
        let code = self.library.write_modus(&mut self.sfhref, marshal(&modus));
        self.check("sfhdiagmod_", code)
    }

    /// Renames the diagnostic the header belongs to.
    pub fn rename(&mut self, new_name: impl AsRef<[u8]>) -> Result<()> {
        self.ensure_open()?;
        let code = self.library.rename(&mut self.sfhref, marshal(&new_name));
        self.check("sfhrename_", code)
    }

    //==============================================================================
    // 4. Storage Format
    //==============================================================================

    pub fn format(&mut self, name: impl AsRef<[u8]>) -> Result<u16> {
        self.ensure_open()?;
        let mut format = 0;
        let code = self
            .library
            .read_format(&mut self.sfhref, marshal(&name), &mut format);
        self.check("sfhrdformat_", code)?;
        Ok(format)
    }

    /// Changes an object's storage format.
    ///
    /// Friendly keys go through the format table; raw codes are sent as given.
    pub fn modify_format(
        &mut self,
        name: impl AsRef<[u8]>,
        format: impl Into<FormatSpec>,
    ) -> Result<()> {
        self.ensure_open()?;
        let code_value = format.into().resolve()?;
        let code = self
            .library
            .modify_format(&mut self.sfhref, marshal(&name), code_value);
        self.check("sfhmdformat_", code)
    }

    //==============================================================================
    // 5. Relations
    //==============================================================================

    pub fn set_relation(
        &mut self,
        name: impl AsRef<[u8]>,
        relation: impl AsRef<[u8]>,
    ) -> Result<()> {
        self.ensure_open()?;
        let code = self
            .library
            .set_relation(&mut self.sfhref, marshal(&name), marshal(&relation));
        self.check("sfhstrel_", code)
    }

    pub fn modify_relation(
        &mut self,
        name: impl AsRef<[u8]>,
        old_relation: impl AsRef<[u8]>,
        new_relation: impl AsRef<[u8]>,
    ) -> Result<()> {
        self.ensure_open()?;
        let code = self.library.modify_relation(
            &mut self.sfhref,
            marshal(&name),
            marshal(&old_relation),
            marshal(&new_relation),
        );
        self.check("sfhmdrel_", code)
    }

    pub fn delete_relation(
        &mut self,
        name: impl AsRef<[u8]>,
        relation: impl AsRef<[u8]>,
    ) -> Result<()> {
        self.ensure_open()?;
        let code = self
            .library
            .delete_relation(&mut self.sfhref, marshal(&name), marshal(&relation));
        self.check("sfhdelrel_", code)
    }

    pub fn set_relation_timebase(
        &mut self,
        name: impl AsRef<[u8]>,
        timebase: impl AsRef<[u8]>,
    ) -> Result<()> {
        self.ensure_open()?;
        let code =
            self.library
                .set_relation_timebase(&mut self.sfhref, marshal(&name), marshal(&timebase));
        self.check("sfhstreltb_", code)
    }

    //==============================================================================
    // 6. Indices & Device Info
    //==============================================================================

    pub fn index1(&mut self, name: impl AsRef<[u8]>) -> Result<u32> {
        self.ensure_open()?;
        let mut index1 = 0;
        let code = self
            .library
            .read_index1(&mut self.sfhref, marshal(&name), &mut index1);
        self.check("sfhrdindex1_", code)?;
        Ok(index1)
    }

    /// Returns `(index2, index3, index4)`.
    pub fn index24(&mut self, name: impl AsRef<[u8]>) -> Result<(u32, u32, u32)> {
        self.ensure_open()?;
        let mut indices = [0u32; 3];
        let code = self
            .library
            .read_index24(&mut self.sfhref, marshal(&name), &mut indices);
        self.check("sfhrdindex24_", code)?;
        let [index2, index3, index4] = indices;
        Ok((index2, index3, index4))
    }

    pub fn modify_index1(&mut self, name: impl AsRef<[u8]>, index1: u32) -> Result<()> {
        self.ensure_open()?;
        let code = self
            .library
            .modify_index1(&mut self.sfhref, marshal(&name), index1);
        self.check("sfhmdindex1_", code)
    }

    pub fn modify_index24(
        &mut self,
        name: impl AsRef<[u8]>,
        index2: u32,
        index3: u32,
        index4: u32,
    ) -> Result<()> {
        self.ensure_open()?;
        let code = self.library.modify_index24(
            &mut self.sfhref,
            marshal(&name),
            [index2, index3, index4],
        );
        self.check("sfhmdindex24_", code)
    }

    /// Returns `(crate number, station number)` of the acquiring device.
    pub fn device_info(&mut self, name: impl AsRef<[u8]>) -> Result<(i16, i32)> {
        self.ensure_open()?;
        let (mut crate_number, mut station_number) = (0, 0);
        let code = self.library.device_info(
            &mut self.sfhref,
            marshal(&name),
            &mut crate_number,
            &mut station_number,
        );
        self.check("sfhdevinfo_", code)?;
        Ok((crate_number, station_number))
    }

    //==============================================================================
    // 7. Helpers
    //==============================================================================

    fn ensure_open(&self) -> Result<()> {
        if self.status() {
            Ok(())
        } else {
            Err(SfhError::NotOpen)
        }
    }

    /// Turns a native error code into a `Result`, asking libsfh to describe failures.
    fn check(&self, entry: &'static str, code: i32) -> Result<()> {
        log::trace!("{} returned {}", entry, code);
        if code == 0 {
            return Ok(());
        }
        let message = self.library.error_message(entry, code);
        Err(SfhError::Native {
            entry,
            code,
            message,
        })
    }
}

impl<L: SfhLibrary> Drop for ShotfileHeader<L> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("failed to close shotfile header on drop: {}", e);
        }
    }
}

impl<L: SfhLibrary> std::fmt::Debug for ShotfileHeader<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShotfileHeader")
            .field("sfhref", &self.sfhref)
            .field("list_capacity", &self.list_capacity)
            .finish()
    }
}
