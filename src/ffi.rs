//! Safe wrapper over the flight-dynamics C shim.
//!
//! Compiled only with the `jsbsim` feature; the rest of the crate sees the
//! backend through the `Oracle` trait and never touches these bindings.

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_double, c_int, c_void};

use crate::dataset::PropertySnapshot;
use crate::oracle::{Oracle, OracleError};

// Shim status codes.
const FDM_OK: c_int = 0;
const FDM_TRIM_DIVERGED: c_int = 1;
const FDM_UNKNOWN_PROPERTY: c_int = 2;
const FDM_BAD_ENGINE: c_int = 3;

#[link(name = "fdmshim")]
extern "C" {
    fn fdm_create(root_dir: *const c_char, model: *const c_char) -> *mut c_void;
    fn fdm_destroy(handle: *mut c_void);
    fn fdm_set_property(handle: *mut c_void, name: *const c_char, value: c_double) -> c_int;
    fn fdm_get_property(handle: *mut c_void, name: *const c_char, out: *mut c_double) -> c_int;
    fn fdm_do_trim(handle: *mut c_void, mode: c_int) -> c_int;
    fn fdm_run(handle: *mut c_void) -> c_int;
    fn fdm_num_engines(handle: *mut c_void) -> c_int;
    fn fdm_init_running(handle: *mut c_void, engine: c_int) -> c_int;
    fn fdm_catalog_begin(handle: *mut c_void, root: *const c_char) -> c_int;
    fn fdm_catalog_name(handle: *mut c_void, index: c_int) -> *const c_char;
    fn fdm_catalog_value(handle: *mut c_void, index: c_int) -> c_double;
}

/// Owned handle to one backend simulation instance.
pub struct FdmOracle {
    handle: *mut c_void,
}

impl FdmOracle {
    pub fn create(root_dir: &str, model: &str) -> Result<Self, OracleError> {
        let root = cstring(root_dir)?;
        let model = cstring(model)?;
        let handle = unsafe { fdm_create(root.as_ptr(), model.as_ptr()) };
        if handle.is_null() {
            return Err(OracleError::Backend(format!(
                "failed to load model '{}'",
                model.to_string_lossy()
            )));
        }
        Ok(Self { handle })
    }

    fn check(&self, status: c_int, what: &str) -> Result<(), OracleError> {
        match status {
            FDM_OK => Ok(()),
            FDM_TRIM_DIVERGED => Err(OracleError::TrimDiverged(what.to_string())),
            FDM_UNKNOWN_PROPERTY => Err(OracleError::UnknownProperty(what.to_string())),
            FDM_BAD_ENGINE => Err(OracleError::BadEngineIndex(0)),
            other => Err(OracleError::Backend(format!("{what}: status {other}"))),
        }
    }
}

fn cstring(s: &str) -> Result<CString, OracleError> {
    CString::new(s).map_err(|_| OracleError::Backend(format!("embedded NUL in '{s}'")))
}

impl Oracle for FdmOracle {
    fn set_property(&mut self, name: &str, value: f64) -> Result<(), OracleError> {
        let cname = cstring(name)?;
        let status = unsafe { fdm_set_property(self.handle, cname.as_ptr(), value) };
        self.check(status, name)
    }

    fn get_property(&mut self, name: &str) -> Result<f64, OracleError> {
        let cname = cstring(name)?;
        let mut out: c_double = 0.0;
        let status = unsafe { fdm_get_property(self.handle, cname.as_ptr(), &mut out) };
        self.check(status, name)?;
        Ok(out)
    }

    fn property_catalog(&mut self, root: &str) -> Result<PropertySnapshot, OracleError> {
        let croot = cstring(root)?;
        let count = unsafe { fdm_catalog_begin(self.handle, croot.as_ptr()) };
        if count < 0 {
            return Err(OracleError::Backend(format!("catalog walk under '{root}'")));
        }
        let mut snapshot = PropertySnapshot::new();
        for i in 0..count {
            let name = unsafe { fdm_catalog_name(self.handle, i) };
            if name.is_null() {
                return Err(OracleError::Backend(format!("catalog entry {i} missing")));
            }
            let name = unsafe { CStr::from_ptr(name) }.to_string_lossy().into_owned();
            let value = unsafe { fdm_catalog_value(self.handle, i) };
            snapshot.insert(name, value);
        }
        Ok(snapshot)
    }

    fn do_trim(&mut self, mode: i32) -> Result<(), OracleError> {
        let status = unsafe { fdm_do_trim(self.handle, mode) };
        self.check(status, "trim")
    }

    fn run(&mut self) -> Result<(), OracleError> {
        let status = unsafe { fdm_run(self.handle) };
        self.check(status, "step")
    }

    fn num_engines(&mut self) -> Result<usize, OracleError> {
        let n = unsafe { fdm_num_engines(self.handle) };
        if n < 0 {
            return Err(OracleError::Backend("engine count query".to_string()));
        }
        Ok(n as usize)
    }

    fn init_engine_running(&mut self, engine: usize) -> Result<(), OracleError> {
        let status = unsafe { fdm_init_running(self.handle, engine as c_int) };
        if status == FDM_BAD_ENGINE {
            return Err(OracleError::BadEngineIndex(engine));
        }
        self.check(status, "engine init")
    }
}

impl Drop for FdmOracle {
    fn drop(&mut self) {
        unsafe { fdm_destroy(self.handle) };
    }
}
