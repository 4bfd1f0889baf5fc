// In: src/native/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Native Seam
// ====================================================================================
//
// `SfhLibrary` names every libsfh entry point the binding uses. Each method takes
// the handle reference by `&mut` (libsfh receives it by reference) and returns the
// raw error code the entry point wrote to its error-out parameter. Nothing here
// interprets codes; that is the handle's job.
//
//   [ShotfileHeader]  -- marshal::marshal(text) -> NativeText -->  [SfhLibrary]
//         ^                                                            |
//         `---------------- i32 code + out values ---------------------'
//
// `LibSfh` is the production implementation, resolving symbols from the shared
// library at load time. Tests substitute a recording mock.
// ====================================================================================

pub mod libsfh;
pub mod marshal;

#[cfg(test)]
pub(crate) mod mock;

pub use libsfh::LibSfh;
pub use marshal::NativeText;

/// The libsfh entry points, one method each.
///
/// Every method returns the native error code; zero means success.
pub trait SfhLibrary {
    /// `sfhopen_`
    fn open(&self, filename: NativeText<'_>, sfhref: &mut i32) -> i32;

    /// `sfhclose_`
    fn close(&self, sfhref: &mut i32) -> i32;

    /// `sfhlonam_`: fills `names` with 8-byte slots and `types` with their codes.
    fn list_objects(
        &self,
        sfhref: &mut i32,
        capacity: &mut i16,
        names: &mut [u8],
        types: &mut [u16],
    ) -> i32;

    /// `sfhrdphysdim_`
    fn read_phys_dim(&self, sfhref: &mut i32, name: NativeText<'_>, physdim: &mut u16) -> i32;

    /// `sfhrdobj_`
    fn read_object(
        &self,
        sfhref: &mut i32,
        name: NativeText<'_>,
        object_type: &mut u16,
        num_dims: &mut u32,
        num_steps: &mut u32,
        format: &mut u16,
    ) -> i32;

    /// `sfhrstatus_`
    fn read_status(&self, sfhref: &mut i32, name: NativeText<'_>, status: &mut i32) -> i32;

    /// `sfhwstatus_`
    fn write_status(&self, sfhref: &mut i32, name: NativeText<'_>, status: i32) -> i32;

    /// `sfhrdgmod_`: fills the fixed-width `modus` buffer.
    fn read_modus(&self, sfhref: &mut i32, modus: &mut [u8]) -> i32;

    /// `sfhdiagmod_`
    fn write_modus(&self, sfhref: &mut i32, modus: NativeText<'_>) -> i32;

    /// `sfhnewobj_`
    fn new_object(
        &self,
        sfhref: &mut i32,
        name: NativeText<'_>,
        object_type: u16,
        sub_type: u16,
    ) -> i32;

    /// `sfhrdformat_`
    fn read_format(&self, sfhref: &mut i32, name: NativeText<'_>, format: &mut u16) -> i32;

    /// `sfhmdformat_`
    fn modify_format(&self, sfhref: &mut i32, name: NativeText<'_>, format: u16) -> i32;

    /// `sfhrdnsteps_`
    fn read_nsteps(&self, sfhref: &mut i32, name: NativeText<'_>, nsteps: &mut u32) -> i32;

    /// `sfhmonam_`
    fn modify_name(&self, sfhref: &mut i32, name: NativeText<'_>, new_name: NativeText<'_>)
        -> i32;

    /// `sfhrename_`
    fn rename(&self, sfhref: &mut i32, new_name: NativeText<'_>) -> i32;

    /// `sfhmodtim_`
    fn modify_timebase(&self, sfhref: &mut i32, name: NativeText<'_>, num_values: u32) -> i32;

    /// `sfhmtext_`
    fn modify_text(&self, sfhref: &mut i32, name: NativeText<'_>, text: NativeText<'_>) -> i32;

    /// `sfhstrel_`
    fn set_relation(&self, sfhref: &mut i32, name: NativeText<'_>, relation: NativeText<'_>)
        -> i32;

    /// `sfhmdrel_`
    fn modify_relation(
        &self,
        sfhref: &mut i32,
        name: NativeText<'_>,
        old_relation: NativeText<'_>,
        new_relation: NativeText<'_>,
    ) -> i32;

    /// `sfhdelrel_`
    fn delete_relation(
        &self,
        sfhref: &mut i32,
        name: NativeText<'_>,
        relation: NativeText<'_>,
    ) -> i32;

    /// `sfhrdindex1_`
    fn read_index1(&self, sfhref: &mut i32, name: NativeText<'_>, index1: &mut u32) -> i32;

    /// `sfhrdindex24_`
    fn read_index24(&self, sfhref: &mut i32, name: NativeText<'_>, indices: &mut [u32; 3])
        -> i32;

    /// `sfhmdindex1_`
    fn modify_index1(&self, sfhref: &mut i32, name: NativeText<'_>, index1: u32) -> i32;

    /// `sfhmdindex24_`
    fn modify_index24(&self, sfhref: &mut i32, name: NativeText<'_>, indices: [u32; 3]) -> i32;

    /// `sfhdevinfo_`
    fn device_info(
        &self,
        sfhref: &mut i32,
        name: NativeText<'_>,
        crate_number: &mut i16,
        station_number: &mut i32,
    ) -> i32;

    /// `sfhstreltb_`
    fn set_relation_timebase(
        &self,
        sfhref: &mut i32,
        name: NativeText<'_>,
        timebase: NativeText<'_>,
    ) -> i32;

    /// Asks the library to describe `code` (`sfherror_`).
    ///
    /// Returns `None` when the backend reports the error on its own channel
    /// instead of handing back text.
    fn error_message(&self, entry: &'static str, code: i32) -> Option<String>;
}
