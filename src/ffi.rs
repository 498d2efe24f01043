//! FFI bindings for Wellcheck
//!
//! This module provides C-compatible functions so a host UI can reuse the
//! normalization and payload rules without reimplementing them. All functions
//! use C strings (null-terminated) and return allocated memory that must be
//! freed by the caller using `wellcheck_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::features::estimate_vitals;
use crate::normalizer::{BandScale, ScaleKind};
use crate::pipeline::assessment_to_payload;
use crate::types::{EntryPoint, StressLevel};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

fn entry_from_code(code: i32) -> Option<EntryPoint> {
    match code {
        0 => Some(EntryPoint::Youth),
        1 => Some(EntryPoint::General),
        _ => None,
    }
}

fn scale_from_code(code: i32) -> Option<ScaleKind> {
    match code {
        0 => Some(ScaleKind::SleepDisturbance),
        1 => Some(ScaleKind::PhysicalActivity),
        2 => Some(ScaleKind::SocialFunctioning),
        _ => None,
    }
}

/// Validate an assessment JSON document and return the request body JSON.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `wellcheck_free_string`.
/// - Returns NULL on error; call `wellcheck_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn wellcheck_build_payload(json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    match assessment_to_payload(&json_str) {
        Ok(body) => string_to_cstr(&body),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Estimate vitals for a stress level (1-10) and return them as JSON.
///
/// # Safety
/// - Returns a newly allocated string that must be freed with `wellcheck_free_string`.
/// - Returns NULL on error; call `wellcheck_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn wellcheck_estimate_vitals(stress_level: i32) -> *mut c_char {
    clear_last_error();

    let level = match u8::try_from(stress_level)
        .map_err(|_| format!("Stress level must be between 1 and 10, got {stress_level}"))
        .and_then(|l| StressLevel::new(l).map_err(|e| e.to_string()))
    {
        Ok(level) => level,
        Err(msg) => {
            set_last_error(&msg);
            return ptr::null_mut();
        }
    };

    match serde_json::to_string(&estimate_vitals(level)) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Raw score for a slider step.
///
/// `entry`: 0 = youth, 1 = general. `scale`: 0 = sleep disturbance,
/// 1 = physical activity, 2 = social functioning. Returns NaN for unknown
/// codes.
#[no_mangle]
pub extern "C" fn wellcheck_raw_of(entry: i32, scale: i32, step: u8) -> f64 {
    match (entry_from_code(entry), scale_from_code(scale)) {
        (Some(entry), Some(kind)) => BandScale::for_entry(entry, kind).raw_of(step),
        _ => f64::NAN,
    }
}

/// Slider step owning a raw score. Returns 0 for unknown codes.
#[no_mangle]
pub extern "C" fn wellcheck_step_of(entry: i32, scale: i32, raw: f64) -> u8 {
    match (entry_from_code(entry), scale_from_code(scale)) {
        (Some(entry), Some(kind)) => BandScale::for_entry(entry, kind).step_of(raw),
        _ => 0,
    }
}

/// Free a string returned by Wellcheck.
///
/// # Safety
/// - `s` must be a pointer returned by a Wellcheck function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn wellcheck_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local string that is valid until the next
///   Wellcheck call on the same thread.
/// - Returns NULL if there was no error.
/// - Do NOT free this pointer.
#[no_mangle]
pub unsafe extern "C" fn wellcheck_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match e.borrow().as_ref() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the Wellcheck library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free this pointer.
#[no_mangle]
pub unsafe extern "C" fn wellcheck_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ffi_build_payload() {
        let json = CString::new(r#"{"age": 14, "sex": 0}"#).unwrap();

        unsafe {
            let result = wellcheck_build_payload(json.as_ptr());
            assert!(!result.is_null());

            let result_str = CStr::from_ptr(result).to_str().unwrap();
            assert!(result_str.starts_with(r#"{"features":"#));
            assert!(result_str.contains("Physical-BMI"));

            wellcheck_free_string(result);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let invalid = CString::new(r#"{"age": 3, "screen_hours": 30}"#).unwrap();
            let result = wellcheck_build_payload(invalid.as_ptr());
            assert!(result.is_null());

            let error = wellcheck_last_error();
            assert!(!error.is_null());

            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(error_str.contains("age"));
            assert!(error_str.contains("screen_hours"));
        }
    }

    #[test]
    fn test_ffi_null_pointer() {
        unsafe {
            assert!(wellcheck_build_payload(ptr::null()).is_null());
            assert!(!wellcheck_last_error().is_null());
        }
    }

    #[test]
    fn test_ffi_estimate_vitals() {
        unsafe {
            let result = wellcheck_estimate_vitals(5);
            assert!(!result.is_null());
            let value: serde_json::Value =
                serde_json::from_str(CStr::from_ptr(result).to_str().unwrap()).unwrap();
            assert_eq!(value["heart_rate_bpm"], 78);
            wellcheck_free_string(result);

            assert!(wellcheck_estimate_vitals(0).is_null());
            assert!(wellcheck_estimate_vitals(300).is_null());
        }
    }

    #[test]
    fn test_ffi_band_lookup() {
        assert_eq!(wellcheck_raw_of(0, 2, 3), 80.0);
        assert_eq!(wellcheck_step_of(0, 2, 80.0), 3);
        assert_eq!(wellcheck_step_of(9, 2, 80.0), 0);
        assert!(wellcheck_raw_of(0, 7, 1).is_nan());
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = wellcheck_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert!(!version_str.is_empty());
        }
    }
}
