// In: src/ffi/python.rs

use log::LevelFilter;
use pyo3::exceptions::{PyRuntimeError, PyTypeError, PyValueError};
use pyo3::prelude::*;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, Mutex, Once};

use crate::config::SfhConfig;
use crate::header::ShotfileHeader;
use crate::native::LibSfh;
use crate::types::{FormatArg, FormatSpec, ObjectInfo};

//==================================================================================
// I. Shared Library Registry
//==================================================================================

/// The library every Python-side handle shares, plus the capacity it was configured with.
struct Loaded {
    library: Arc<LibSfh>,
    list_capacity: usize,
}

static LIBRARY: Mutex<Option<Loaded>> = Mutex::new(None);

fn install(config: &SfhConfig) -> PyResult<(Arc<LibSfh>, usize)> {
    let library = Arc::new(LibSfh::from_config(config)?);
    let mut slot = LIBRARY
        .lock()
        .map_err(|_| PyRuntimeError::new_err("libsfh registry lock poisoned"))?;
    *slot = Some(Loaded {
        library: Arc::clone(&library),
        list_capacity: config.object_list_capacity,
    });
    Ok((library, config.object_list_capacity))
}

/// Returns the shared library, loading it from the environment on first use.
fn shared_library() -> PyResult<(Arc<LibSfh>, usize)> {
    {
        let slot = LIBRARY
            .lock()
            .map_err(|_| PyRuntimeError::new_err("libsfh registry lock poisoned"))?;
        if let Some(loaded) = slot.as_ref() {
            return Ok((Arc::clone(&loaded.library), loaded.list_capacity));
        }
    }
    install(&SfhConfig::from_env()?)
}

/// Loads libsfh explicitly and returns the path it was loaded from.
///
/// Without `path`, the location is resolved from `SFH_CONFIG`, `SFH_LIBRARY`
/// and `SYS`. Handles created afterwards use the newly loaded library.
#[pyfunction]
#[pyo3(name = "load_library", signature = (path = None))]
pub fn load_library_py(path: Option<String>) -> PyResult<String> {
    let mut config = SfhConfig::from_env()?;
    if let Some(path) = path {
        config.library_path = Some(PathBuf::from(path));
    }
    let (library, _) = install(&config)?;
    Ok(library.path().display().to_string())
}

//==================================================================================
// II. ObjectInfo
//==================================================================================

#[pyclass(name = "ObjectInfo", module = "sfh")]
#[derive(Clone)]
pub struct PyObjectInfo {
    #[pyo3(get)]
    name: String,
    #[pyo3(get, name = "type")]
    object_type: u16,
    #[pyo3(get, name = "nDim")]
    num_dims: u32,
    #[pyo3(get, name = "nSteps")]
    num_steps: u32,
    #[pyo3(get)]
    format: u16,
}

impl From<ObjectInfo> for PyObjectInfo {
    fn from(info: ObjectInfo) -> Self {
        Self {
            name: info.name,
            object_type: info.object_type,
            num_dims: info.num_dims,
            num_steps: info.num_steps,
            format: info.format,
        }
    }
}

#[pymethods]
impl PyObjectInfo {
    fn __repr__(&self) -> String {
        format!(
            "ObjectInfo(name={:?}, type={}, nDim={}, nSteps={}, format={})",
            self.name, self.object_type, self.num_dims, self.num_steps, self.format
        )
    }
}

//==================================================================================
// III. ShotfileHeader
//==================================================================================

/// Python-facing handle. Method names follow the historic scripting API.
#[pyclass(name = "ShotfileHeader", module = "sfh")]
pub struct PyShotfileHeader {
    inner: ShotfileHeader<LibSfh>,
}

/// A name or text argument. The historic API takes `str` and `bytes` alike.
#[derive(FromPyObject)]
enum TextArg {
    Text(String),
    Bytes(Vec<u8>),
}

impl TextArg {
    fn as_bytes(&self) -> &[u8] {
        match self {
            TextArg::Text(text) => text.as_bytes(),
            TextArg::Bytes(bytes) => bytes,
        }
    }
}

/// Interprets a Python format argument: an int is a raw code, a string is a
/// format string, and a type object (e.g. `numpy.int16`) goes by its `__name__`.
fn format_spec_from_py(value: &Bound<'_, PyAny>) -> PyResult<FormatSpec> {
    let spec = if let Ok(code) = value.extract::<i64>() {
        FormatSpec::from_arg(FormatArg::Code(code))
    } else if let Ok(text) = value.extract::<String>() {
        FormatSpec::from_arg(FormatArg::Text(&text))
    } else if let Ok(name) = value.getattr("__name__") {
        let name: String = name.extract()?;
        FormatSpec::from_arg(FormatArg::TypeName(&name))
    } else {
        return Err(PyTypeError::new_err(
            "format must be an int code, a format string, or a scalar type",
        ));
    };
    Ok(spec?)
}

#[pymethods]
impl PyShotfileHeader {
    #[new]
    #[pyo3(signature = (filename = None))]
    fn new(filename: Option<TextArg>) -> PyResult<Self> {
        let (library, list_capacity) = shared_library()?;
        let mut inner = ShotfileHeader::new(library).with_list_capacity(list_capacity)?;
        if let Some(filename) = filename {
            inner.open(filename.as_bytes())?;
        }
        Ok(Self { inner })
    }

    fn __enter__(slf: Py<Self>) -> Py<Self> {
        slf
    }

    fn __exit__(
        &mut self,
        _exc_type: PyObject,
        _exc_value: PyObject,
        _traceback: PyObject,
    ) -> PyResult<bool> {
        self.inner.close()?;
        Ok(false)
    }

    fn __repr__(&self) -> String {
        format!("ShotfileHeader(status={})", self.inner.status())
    }

    #[getter]
    fn status(&self) -> bool {
        self.inner.status()
    }

    fn open(&mut self, filename: TextArg) -> PyResult<()> {
        Ok(self.inner.open(filename.as_bytes())?)
    }

    fn close(&mut self) -> PyResult<()> {
        Ok(self.inner.close()?)
    }

    #[pyo3(name = "GetObjects")]
    fn get_objects(&mut self) -> PyResult<(Vec<String>, Vec<u32>)> {
        Ok(self.inner.objects()?)
    }

    #[pyo3(name = "GetPhysDim")]
    fn get_phys_dim(&mut self, name: TextArg) -> PyResult<u16> {
        Ok(self.inner.phys_dim(name.as_bytes())?)
    }

    #[pyo3(name = "GetObjectInfo")]
    fn get_object_info(&mut self, name: TextArg) -> PyResult<PyObjectInfo> {
        Ok(self.inner.object_info(name.as_bytes())?.into())
    }

    #[pyo3(name = "GetStatus")]
    fn get_status(&mut self, name: TextArg) -> PyResult<i32> {
        Ok(self.inner.status_flag(name.as_bytes())?)
    }

    #[pyo3(name = "SetStatus")]
    fn set_status(&mut self, name: TextArg, status: i32) -> PyResult<()> {
        Ok(self.inner.set_status_flag(name.as_bytes(), status)?)
    }

    #[pyo3(name = "GetModus")]
    fn get_modus(&mut self) -> PyResult<String> {
        Ok(self.inner.modus()?)
    }

    #[pyo3(name = "SetModus")]
    fn set_modus(&mut self, modus: TextArg) -> PyResult<()> {
        Ok(self.inner.set_modus(modus.as_bytes())?)
    }

    #[pyo3(name = "NewObject")]
    fn new_object(&mut self, name: TextArg, object_type: u16, sub_type: u16) -> PyResult<()> {
        Ok(self.inner.new_object(name.as_bytes(), object_type, sub_type)?)
    }

    #[pyo3(name = "GetFormat")]
    fn get_format(&mut self, name: TextArg) -> PyResult<u16> {
        Ok(self.inner.format(name.as_bytes())?)
    }

    #[pyo3(name = "ModifyFormat")]
    fn modify_format(&mut self, name: TextArg, format: &Bound<'_, PyAny>) -> PyResult<()> {
        let spec = format_spec_from_py(format)?;
        Ok(self.inner.modify_format(name.as_bytes(), spec)?)
    }

    #[pyo3(name = "GetNSteps")]
    fn get_nsteps(&mut self, name: TextArg) -> PyResult<u32> {
        Ok(self.inner.nsteps(name.as_bytes())?)
    }

    #[pyo3(name = "ModifyName")]
    fn modify_name(&mut self, name: TextArg, new_name: TextArg) -> PyResult<()> {
        Ok(self.inner.modify_name(name.as_bytes(), new_name.as_bytes())?)
    }

    #[pyo3(name = "Rename")]
    fn rename(&mut self, new_diag_name: TextArg) -> PyResult<()> {
        Ok(self.inner.rename(new_diag_name.as_bytes())?)
    }

    #[pyo3(name = "ModifyTimebase")]
    fn modify_timebase(&mut self, name: TextArg, n_vals: u32) -> PyResult<()> {
        Ok(self.inner.modify_timebase(name.as_bytes(), n_vals)?)
    }

    #[pyo3(name = "ModifyText")]
    fn modify_text(&mut self, name: TextArg, text: TextArg) -> PyResult<()> {
        Ok(self.inner.modify_text(name.as_bytes(), text.as_bytes())?)
    }

    #[pyo3(name = "SetRelation")]
    fn set_relation(&mut self, name: TextArg, relation: TextArg) -> PyResult<()> {
        Ok(self.inner.set_relation(name.as_bytes(), relation.as_bytes())?)
    }

    #[pyo3(name = "ModifyRelation")]
    fn modify_relation(
        &mut self,
        name: TextArg,
        old_relation: TextArg,
        new_relation: TextArg,
    ) -> PyResult<()> {
        Ok(self.inner.modify_relation(
            name.as_bytes(),
            old_relation.as_bytes(),
            new_relation.as_bytes(),
        )?)
    }

    #[pyo3(name = "DeleteRelation")]
    fn delete_relation(&mut self, name: TextArg, relation: TextArg) -> PyResult<()> {
        Ok(self.inner.delete_relation(name.as_bytes(), relation.as_bytes())?)
    }

    #[pyo3(name = "GetIndex1")]
    fn get_index1(&mut self, name: TextArg) -> PyResult<u32> {
        Ok(self.inner.index1(name.as_bytes())?)
    }

    #[pyo3(name = "GetIndex24")]
    fn get_index24(&mut self, name: TextArg) -> PyResult<(u32, u32, u32)> {
        Ok(self.inner.index24(name.as_bytes())?)
    }

    #[pyo3(name = "ModifyIndex1")]
    fn modify_index1(&mut self, name: TextArg, index1: u32) -> PyResult<()> {
        Ok(self.inner.modify_index1(name.as_bytes(), index1)?)
    }

    #[pyo3(name = "ModifyIndex24")]
    fn modify_index24(
        &mut self,
        name: TextArg,
        index2: u32,
        index3: u32,
        index4: u32,
    ) -> PyResult<()> {
        Ok(self.inner.modify_index24(name.as_bytes(), index2, index3, index4)?)
    }

    #[pyo3(name = "DeviceInfo")]
    fn device_info(&mut self, name: TextArg) -> PyResult<(i16, i32)> {
        Ok(self.inner.device_info(name.as_bytes())?)
    }

    #[pyo3(name = "SetRelationTimebase")]
    fn set_relation_timebase(&mut self, name: TextArg, timebase: TextArg) -> PyResult<()> {
        Ok(self.inner.set_relation_timebase(name.as_bytes(), timebase.as_bytes())?)
    }
}

//==================================================================================
// IV. Logging
//==================================================================================

static INIT_LOGGER: Once = Once::new();

#[pyfunction]
#[pyo3(name = "enable_verbose_logging", signature = (log_file = None, level = "info"))]
pub fn enable_verbose_logging_py(log_file: Option<String>, level: &str) -> PyResult<()> {
    let level = LevelFilter::from_str(level)
        .map_err(|_| PyValueError::new_err(format!("Invalid log level '{}'", level)))?;
    let file = match log_file {
        Some(filename) => Some(OpenOptions::new().append(true).create(true).open(filename)?),
        None => None,
    };

    INIT_LOGGER.call_once(move || {
        let mut builder = env_logger::Builder::new();

        builder.is_test(false);
        builder.filter_level(level);

        // Custom formatter: just print the level and message
        builder.format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "[{}] {}", record.level(), record.args())?;
            buf.flush()?;
            Ok(())
        });

        if let Some(file) = file {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }

        let _ = builder.try_init();
    });
    Ok(())
}
