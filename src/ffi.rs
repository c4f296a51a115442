//! FFI bindings for the attention-quality engine
//!
//! This module provides C-compatible functions for driving the engine from
//! browser bridges and native shells. All functions use C strings
//! (null-terminated) and return allocated memory that must be freed by the
//! caller using `attn_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::AttentionConfig;
use crate::replay::{replay_to_dwell, ReplayProcessor};

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

// ============================================================================
// Stateless API
// ============================================================================

/// Replay a JSON array of attn.signal.v1 records and return a dwell report.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `attn_free_string`.
/// - Returns NULL on error; call `attn_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn attn_replay_to_dwell(json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    match replay_to_dwell(json_str) {
        Ok(report) => string_to_cstr(&report),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to a ReplayProcessor
pub struct AttnProcessorHandle {
    processor: ReplayProcessor,
}

/// Create a new processor.
///
/// # Safety
/// - `config_json` may be NULL (defaults) or a valid null-terminated C string.
/// - Returns a pointer that must be freed with `attn_processor_free`.
/// - Returns NULL on error; call `attn_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn attn_processor_new(
    config_json: *const c_char,
) -> *mut AttnProcessorHandle {
    clear_last_error();

    let config = if config_json.is_null() {
        AttentionConfig::default()
    } else {
        let json_str = match cstr_to_string(config_json) {
            Some(s) => s,
            None => {
                set_last_error("Invalid config string pointer");
                return ptr::null_mut();
            }
        };
        match AttentionConfig::from_json(&json_str) {
            Ok(config) => config,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        }
    };

    let handle = Box::new(AttnProcessorHandle {
        processor: ReplayProcessor::with_config(config),
    });
    Box::into_raw(handle)
}

/// Free a processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `attn_processor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn attn_processor_free(processor: *mut AttnProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Feed one attn.signal.v1 record and return the dwell events it produced as a
/// JSON array (possibly empty).
///
/// # Safety
/// - `processor` must be a valid pointer returned by `attn_processor_new`.
/// - `signal_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `attn_free_string`.
/// - Returns NULL on error; call `attn_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn attn_processor_process_signal(
    processor: *mut AttnProcessorHandle,
    signal_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &mut *processor;

    let json_str = match cstr_to_string(signal_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid signal string pointer");
            return ptr::null_mut();
        }
    };

    let emitted = match handle.processor.process_line(&json_str) {
        Ok(emitted) => emitted,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    match serde_json::to_string(&emitted) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Return the tracked sections as a JSON array.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `attn_processor_new`.
/// - Returns a newly allocated string that must be freed with `attn_free_string`.
/// - Returns NULL on error; call `attn_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn attn_processor_snapshot(
    processor: *mut AttnProcessorHandle,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;

    match handle.processor.snapshot_json() {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Return the full dwell report for everything processed so far.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `attn_processor_new`.
/// - Returns a newly allocated string that must be freed with `attn_free_string`.
/// - Returns NULL on error; call `attn_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn attn_processor_report(processor: *mut AttnProcessorHandle) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;

    match serde_json::to_string(&handle.processor.report()) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by attn functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by an attn function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn attn_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next attn function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn attn_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn attn_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
