//! FFI bindings for formguard
//!
//! C-compatible functions for embedding the detector from other languages.
//! All functions use C strings (null-terminated) and return allocated
//! memory that must be freed by the caller using `formguard_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::DetectorConfig;
use crate::detector::BehaviorDetector;
use crate::events::InteractionEvent;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
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

/// Opaque handle to a BehaviorDetector
pub struct DetectorHandle {
    detector: BehaviorDetector,
}

/// Create a new detector from a configuration JSON object.
///
/// Pass NULL or an empty object for the default configuration; any subset
/// of the recognized options may be present.
///
/// # Safety
/// - `config_json`, when non-NULL, must be a valid null-terminated C string.
/// - Returns a pointer that must be freed with `formguard_detector_free`.
/// - Returns NULL on error; call `formguard_last_error` for the message.
#[no_mangle]
pub unsafe extern "C" fn formguard_detector_new(
    config_json: *const c_char,
) -> *mut DetectorHandle {
    clear_last_error();

    let config = match cstr_to_string(config_json) {
        None => DetectorConfig::default(),
        Some(json) if json.trim().is_empty() => DetectorConfig::default(),
        Some(json) => match serde_json::from_str::<DetectorConfig>(&json) {
            Ok(config) => config,
            Err(e) => {
                set_last_error(&format!("Invalid configuration JSON: {}", e));
                return ptr::null_mut();
            }
        },
    };

    let handle = Box::new(DetectorHandle {
        detector: BehaviorDetector::new(config),
    });
    Box::into_raw(handle)
}

/// Free a detector.
///
/// # Safety
/// - `detector` must be a valid pointer returned by `formguard_detector_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn formguard_detector_free(detector: *mut DetectorHandle) {
    if !detector.is_null() {
        drop(Box::from_raw(detector));
    }
}

/// Process one interaction event given as JSON.
///
/// Returns the updated bot score in [0, 1], or a negative value on error.
///
/// # Safety
/// - `detector` must be a valid pointer returned by `formguard_detector_new`.
/// - `event_json` must be a valid null-terminated C string.
/// - On error, call `formguard_last_error` to get the message.
#[no_mangle]
pub unsafe extern "C" fn formguard_detector_process(
    detector: *mut DetectorHandle,
    event_json: *const c_char,
) -> f64 {
    clear_last_error();

    if detector.is_null() {
        set_last_error("Null detector pointer");
        return -1.0;
    }
    let handle = &mut *detector;

    let json = match cstr_to_string(event_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid event string pointer");
            return -1.0;
        }
    };

    let event: InteractionEvent = match serde_json::from_str(&json) {
        Ok(event) => event,
        Err(e) => {
            set_last_error(&format!("Invalid event JSON: {}", e));
            return -1.0;
        }
    };

    match handle.detector.process(event) {
        Ok(outcome) => outcome.bot_score,
        Err(e) => {
            set_last_error(&e.to_string());
            -1.0
        }
    }
}

/// Generate a report snapshot and return it as JSON.
///
/// # Safety
/// - `detector` must be a valid pointer returned by `formguard_detector_new`.
/// - Returns a newly allocated string that must be freed with
///   `formguard_free_string`.
/// - Returns NULL on error; call `formguard_last_error` for the message.
#[no_mangle]
pub unsafe extern "C" fn formguard_detector_report(
    detector: *mut DetectorHandle,
) -> *mut c_char {
    clear_last_error();

    if detector.is_null() {
        set_last_error("Null detector pointer");
        return ptr::null_mut();
    }
    let handle = &mut *detector;

    let report = handle.detector.report();
    match serde_json::to_string(&report) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Stop ingesting events. Accumulated state is kept.
///
/// # Safety
/// - `detector` must be a valid pointer returned by `formguard_detector_new`.
#[no_mangle]
pub unsafe extern "C" fn formguard_detector_stop(detector: *mut DetectorHandle) {
    if !detector.is_null() {
        (*detector).detector.stop();
    }
}

/// Resume ingesting events, continuing from existing history.
///
/// # Safety
/// - `detector` must be a valid pointer returned by `formguard_detector_new`.
#[no_mangle]
pub unsafe extern "C" fn formguard_detector_start(detector: *mut DetectorHandle) {
    if !detector.is_null() {
        (*detector).detector.start();
    }
}

/// Free a string returned by formguard functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a formguard function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn formguard_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next formguard call on this
///   thread. Do NOT free it.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn formguard_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the formguard library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn formguard_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_cstring(ms: u64) -> CString {
        CString::new(format!(
            r#"{{"timestamp":"2024-03-10T12:00:{:02}.{:03}Z","event_type":"key","key":{{"key":"a"}}}}"#,
            ms / 1000,
            ms % 1000
        ))
        .unwrap()
    }

    #[test]
    fn test_ffi_detector_lifecycle() {
        unsafe {
            let config = CString::new(r#"{ "min_sample_size": 5 }"#).unwrap();
            let detector = formguard_detector_new(config.as_ptr());
            assert!(!detector.is_null());

            for i in 0..6 {
                let event = event_cstring(i * 100);
                let score = formguard_detector_process(detector, event.as_ptr());
                assert!(score >= 0.0);
            }

            let report = formguard_detector_report(detector);
            assert!(!report.is_null());
            let report_str = CStr::from_ptr(report).to_str().unwrap();
            assert!(report_str.contains("botScore"));
            assert!(report_str.contains("interactionCount"));

            formguard_free_string(report);
            formguard_detector_free(detector);
        }
    }

    #[test]
    fn test_ffi_null_config_uses_defaults() {
        unsafe {
            let detector = formguard_detector_new(ptr::null());
            assert!(!detector.is_null());
            formguard_detector_free(detector);
        }
    }

    #[test]
    fn test_ffi_invalid_event_sets_error() {
        unsafe {
            let detector = formguard_detector_new(ptr::null());
            let bad = CString::new("not json").unwrap();

            let score = formguard_detector_process(detector, bad.as_ptr());
            assert!(score < 0.0);

            let error = formguard_last_error();
            assert!(!error.is_null());
            assert!(!CStr::from_ptr(error).to_str().unwrap().is_empty());

            formguard_detector_free(detector);
        }
    }

    #[test]
    fn test_ffi_invalid_config_sets_error() {
        unsafe {
            let bad = CString::new(r#"{ "sensitivity": "very" }"#).unwrap();
            let detector = formguard_detector_new(bad.as_ptr());
            assert!(detector.is_null());
            assert!(!formguard_last_error().is_null());
        }
    }

    #[test]
    fn test_ffi_stop_and_start() {
        unsafe {
            let detector = formguard_detector_new(ptr::null());

            formguard_detector_stop(detector);
            let event = event_cstring(0);
            let score = formguard_detector_process(detector, event.as_ptr());
            assert_eq!(score, 0.0);

            formguard_detector_start(detector);
            let score = formguard_detector_process(detector, event.as_ptr());
            assert!(score >= 0.0);

            formguard_detector_free(detector);
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = formguard_version();
            assert!(!version.is_null());
            assert!(!CStr::from_ptr(version).to_str().unwrap().is_empty());
        }
    }
}
