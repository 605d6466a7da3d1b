use super::SurfacePadding;
use std::ffi::{CStr, c_int, c_void};

type ComputeSurfacePaddingFn = unsafe extern "C" fn(c_int, c_int, c_int, c_int, c_int) -> c_int;

const LIB_NAME: &CStr = c"libadreno_utils.so";
const SYMBOL: &CStr = c"compute_surface_padding";

/// The Adreno utility library, opened once at startup.
///
/// The library stays loaded for as long as this value lives; share it through
/// an `Arc` and hand it to the `PaddingAdvisor`.
#[derive(Debug)]
pub struct AdrenoUtils {
    lib: *mut c_void,
    compute_padding: ComputeSurfacePaddingFn,
}

// SAFETY: the library handle and function pointer are never mutated after
// `load`, and `compute_surface_padding` is a pure computation.
unsafe impl Send for AdrenoUtils {}
unsafe impl Sync for AdrenoUtils {}

impl AdrenoUtils {
    /// Loads `libadreno_utils.so` and resolves `compute_surface_padding`.
    ///
    /// Returns `None` when either is missing; callers fall back to fixed
    /// alignment.
    #[must_use]
    pub fn load() -> Option<Self> {
        // SAFETY: both strings are NUL-terminated literals.
        let lib = unsafe { libc::dlopen(LIB_NAME.as_ptr(), libc::RTLD_NOW) };
        if lib.is_null() {
            log::debug!("{} not available, using fixed stride alignment", LIB_NAME.to_string_lossy());
            return None;
        }

        let sym = unsafe { libc::dlsym(lib, SYMBOL.as_ptr()) };
        if sym.is_null() {
            log::warn!(
                "{} has no {}, using fixed stride alignment",
                LIB_NAME.to_string_lossy(),
                SYMBOL.to_string_lossy()
            );
            unsafe { libc::dlclose(lib) };
            return None;
        }

        // SAFETY: the symbol is the vendor's five-int padding routine.
        let compute_padding =
            unsafe { std::mem::transmute::<*mut c_void, ComputeSurfacePaddingFn>(sym) };

        Some(Self {
            lib,
            compute_padding,
        })
    }
}

impl SurfacePadding for AdrenoUtils {
    fn compute_padding(
        &self,
        width: i32,
        bpp: i32,
        surface_tile_height: i32,
        raster_mode: i32,
        padding_threshold: i32,
    ) -> i32 {
        unsafe {
            (self.compute_padding)(width, bpp, surface_tile_height, raster_mode, padding_threshold)
        }
    }
}

impl Drop for AdrenoUtils {
    fn drop(&mut self) {
        unsafe {
            libc::dlclose(self.lib);
        }
    }
}
