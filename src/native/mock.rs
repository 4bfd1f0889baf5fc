// In: src/native/mock.rs

//! A recording, in-memory stand-in for libsfh used by the handle tests.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::native::{NativeText, SfhLibrary};

/// One recorded native invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub entry: &'static str,
    pub sfhref: i32,
    pub text: Vec<String>,
    pub values: Vec<i64>,
}

#[derive(Default)]
struct MockState {
    calls: Vec<Call>,
    failures: HashMap<&'static str, i32>,
    next_ref: i32,
    objects: Vec<(String, u16)>,
    modus: Vec<u8>,
    ref_on_failed_open: bool,
}

/// A fake libsfh. Successful opens hand out increasing nonzero references.
pub struct MockSfh {
    state: Mutex<MockState>,
}

impl MockSfh {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                next_ref: 1,
                modus: b"OP      ".to_vec(),
                ..Default::default()
            }),
        }
    }

    /// Seeds the slots reported by `sfhlonam_`. A type of zero marks an empty slot.
    pub fn with_objects(self, objects: &[(&str, u16)]) -> Self {
        self.state.lock().unwrap().objects = objects
            .iter()
            .map(|(name, ty)| (name.to_string(), *ty))
            .collect();
        self
    }

    /// Sets the raw 8-byte buffer written by `sfhrdgmod_`.
    pub fn with_modus(self, modus: &[u8]) -> Self {
        self.state.lock().unwrap().modus = modus.to_vec();
        self
    }

    /// Makes a failing `sfhopen_` still write a reference, as libsfh may.
    pub fn with_ref_on_failed_open(self) -> Self {
        self.state.lock().unwrap().ref_on_failed_open = true;
        self
    }

    /// Makes every later call to `entry` report `code`.
    pub fn fail(&self, entry: &'static str, code: i32) {
        self.state.lock().unwrap().failures.insert(entry, code);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn entries(&self) -> Vec<&'static str> {
        self.calls().into_iter().map(|c| c.entry).collect()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.calls().iter().filter(|c| c.entry == entry).count()
    }

    pub fn last(&self) -> Option<Call> {
        self.calls().last().cloned()
    }

    fn record(
        &self,
        entry: &'static str,
        sfhref: i32,
        text: &[NativeText<'_>],
        values: &[i64],
    ) -> i32 {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call {
            entry,
            sfhref,
            text: text
                .iter()
                .map(|t| {
                    assert_eq!(t.len() as usize, t.as_bytes().len());
                    String::from_utf8_lossy(t.as_bytes()).into_owned()
                })
                .collect(),
            values: values.to_vec(),
        });
        state.failures.get(entry).copied().unwrap_or(0)
    }
}

impl SfhLibrary for MockSfh {
    fn open(&self, filename: NativeText<'_>, sfhref: &mut i32) -> i32 {
        let code = self.record("sfhopen_", *sfhref, &[filename], &[]);
        let mut state = self.state.lock().unwrap();
        if code == 0 || state.ref_on_failed_open {
            *sfhref = state.next_ref;
            state.next_ref += 1;
        }
        code
    }

    fn close(&self, sfhref: &mut i32) -> i32 {
        self.record("sfhclose_", *sfhref, &[], &[])
    }

    fn list_objects(
        &self,
        sfhref: &mut i32,
        capacity: &mut i16,
        names: &mut [u8],
        types: &mut [u16],
    ) -> i32 {
        let code = self.record("sfhlonam_", *sfhref, &[], &[*capacity as i64]);
        if code == 0 {
            let state = self.state.lock().unwrap();
            for (slot, (name, ty)) in state.objects.iter().enumerate().take(*capacity as usize) {
                let field = &mut names[slot * 8..(slot + 1) * 8];
                let bytes = name.as_bytes();
                let n = bytes.len().min(8);
                field[..n].copy_from_slice(&bytes[..n]);
                types[slot] = *ty;
            }
        }
        code
    }

    fn read_phys_dim(&self, sfhref: &mut i32, name: NativeText<'_>, physdim: &mut u16) -> i32 {
        *physdim = 2;
        self.record("sfhrdphysdim_", *sfhref, &[name], &[])
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
        *object_type = 6;
        *num_dims = 2;
        *num_steps = 4096;
        *format = 5;
        self.record("sfhrdobj_", *sfhref, &[name], &[])
    }

    fn read_status(&self, sfhref: &mut i32, name: NativeText<'_>, status: &mut i32) -> i32 {
        *status = -1;
        self.record("sfhrstatus_", *sfhref, &[name], &[])
    }

    fn write_status(&self, sfhref: &mut i32, name: NativeText<'_>, status: i32) -> i32 {
        self.record("sfhwstatus_", *sfhref, &[name], &[status as i64])
    }

    fn read_modus(&self, sfhref: &mut i32, modus: &mut [u8]) -> i32 {
        let code = self.record("sfhrdgmod_", *sfhref, &[], &[modus.len() as i64]);
        let state = self.state.lock().unwrap();
        let n = state.modus.len().min(modus.len());
        modus[..n].copy_from_slice(&state.modus[..n]);
        code
    }

    fn write_modus(&self, sfhref: &mut i32, modus: NativeText<'_>) -> i32 {
        self.record("sfhdiagmod_", *sfhref, &[modus], &[])
    }

    fn new_object(
        &self,
        sfhref: &mut i32,
        name: NativeText<'_>,
        object_type: u16,
        sub_type: u16,
    ) -> i32 {
        self.record(
            "sfhnewobj_",
            *sfhref,
            &[name],
            &[object_type as i64, sub_type as i64],
        )
    }

    fn read_format(&self, sfhref: &mut i32, name: NativeText<'_>, format: &mut u16) -> i32 {
        *format = 1794;
        self.record("sfhrdformat_", *sfhref, &[name], &[])
    }

    fn modify_format(&self, sfhref: &mut i32, name: NativeText<'_>, format: u16) -> i32 {
        self.record("sfhmdformat_", *sfhref, &[name], &[format as i64])
    }

    fn read_nsteps(&self, sfhref: &mut i32, name: NativeText<'_>, nsteps: &mut u32) -> i32 {
        *nsteps = 4096;
        self.record("sfhrdnsteps_", *sfhref, &[name], &[])
    }

    fn modify_name(
        &self,
        sfhref: &mut i32,
        name: NativeText<'_>,
        new_name: NativeText<'_>,
    ) -> i32 {
        self.record("sfhmonam_", *sfhref, &[name, new_name], &[])
    }

    fn rename(&self, sfhref: &mut i32, new_name: NativeText<'_>) -> i32 {
        self.record("sfhrename_", *sfhref, &[new_name], &[])
    }

    fn modify_timebase(&self, sfhref: &mut i32, name: NativeText<'_>, num_values: u32) -> i32 {
        self.record("sfhmodtim_", *sfhref, &[name], &[num_values as i64])
    }

    fn modify_text(&self, sfhref: &mut i32, name: NativeText<'_>, text: NativeText<'_>) -> i32 {
        self.record("sfhmtext_", *sfhref, &[name, text], &[])
    }

    fn set_relation(
        &self,
        sfhref: &mut i32,
        name: NativeText<'_>,
        relation: NativeText<'_>,
    ) -> i32 {
        self.record("sfhstrel_", *sfhref, &[name, relation], &[])
    }

    fn modify_relation(
        &self,
        sfhref: &mut i32,
        name: NativeText<'_>,
        old_relation: NativeText<'_>,
        new_relation: NativeText<'_>,
    ) -> i32 {
        self.record(
            "sfhmdrel_",
            *sfhref,
            &[name, old_relation, new_relation],
            &[],
        )
    }

    fn delete_relation(
        &self,
        sfhref: &mut i32,
        name: NativeText<'_>,
        relation: NativeText<'_>,
    ) -> i32 {
        self.record("sfhdelrel_", *sfhref, &[name, relation], &[])
    }

    fn read_index1(&self, sfhref: &mut i32, name: NativeText<'_>, index1: &mut u32) -> i32 {
        *index1 = 11;
        self.record("sfhrdindex1_", *sfhref, &[name], &[])
    }

    fn read_index24(
        &self,
        sfhref: &mut i32,
        name: NativeText<'_>,
        indices: &mut [u32; 3],
    ) -> i32 {
        *indices = [22, 33, 44];
        self.record("sfhrdindex24_", *sfhref, &[name], &[])
    }

    fn modify_index1(&self, sfhref: &mut i32, name: NativeText<'_>, index1: u32) -> i32 {
        self.record("sfhmdindex1_", *sfhref, &[name], &[index1 as i64])
    }

    fn modify_index24(&self, sfhref: &mut i32, name: NativeText<'_>, indices: [u32; 3]) -> i32 {
        let values: Vec<i64> = indices.iter().map(|&v| v as i64).collect();
        self.record("sfhmdindex24_", *sfhref, &[name], &values)
    }

    fn device_info(
        &self,
        sfhref: &mut i32,
        name: NativeText<'_>,
        crate_number: &mut i16,
        station_number: &mut i32,
    ) -> i32 {
        *crate_number = -2;
        *station_number = 70_000;
        self.record("sfhdevinfo_", *sfhref, &[name], &[])
    }

    fn set_relation_timebase(
        &self,
        sfhref: &mut i32,
        name: NativeText<'_>,
        timebase: NativeText<'_>,
    ) -> i32 {
        self.record("sfhstreltb_", *sfhref, &[name, timebase], &[])
    }

    fn error_message(&self, entry: &'static str, code: i32) -> Option<String> {
        Some(format!("mock failure {} in {}", code, entry))
    }
}
