//! String marshaling between Rust and the native library.
//!
//! Nothing else in the crate builds or reads C strings directly.

use std::ffi::{c_char, CStr, CString};

use crate::errors::BridgeError;

/// Encode `value` as a nul-terminated UTF-8 buffer.
///
/// The returned `CString` must outlive the native call it is passed into.
/// `what` names the argument in the error if `value` contains a zero byte.
pub fn encode(value: &str, what: &'static str) -> Result<CString, BridgeError> {
    CString::new(value).map_err(|_| BridgeError::InteriorNul { what })
}

/// Decode a native C string. A null pointer yields an empty string and
/// invalid UTF-8 is replaced rather than rejected.
///
/// # Safety
///
/// `ptr` must be null or point to a nul-terminated buffer that stays valid
/// for the duration of this call.
pub unsafe fn decode(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    // SAFETY: caller guarantees ptr is a valid nul-terminated string.
    unsafe { CStr::from_ptr(ptr) }
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;

    fn roundtrip(s: &str) -> String {
        let encoded = encode(s, "test").unwrap();
        unsafe { decode(encoded.as_ptr()) }
    }

    #[test]
    fn roundtrips_text() {
        assert_eq!(roundtrip("hello"), "hello");
        assert_eq!(roundtrip("<h1>héllo wörld 🌍</h1>"), "<h1>héllo wörld 🌍</h1>");
    }

    #[test]
    fn empty_string_is_just_the_terminator() {
        let encoded = encode("", "test").unwrap();
        assert_eq!(encoded.as_bytes_with_nul(), &[0]);
        assert_eq!(roundtrip(""), "");
    }

    #[test]
    fn null_decodes_to_empty() {
        assert_eq!(unsafe { decode(ptr::null()) }, "");
    }

    #[test]
    fn decode_stops_at_first_nul() {
        let bytes = b"seq-1\0trailing\0";
        let s = unsafe { decode(bytes.as_ptr() as *const c_char) };
        assert_eq!(s, "seq-1");
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let bytes = [b'a', 0xff, b'b', 0];
        let s = unsafe { decode(bytes.as_ptr() as *const c_char) };
        assert_eq!(s, "a\u{fffd}b");
    }

    #[test]
    fn interior_nul_is_rejected() {
        let err = encode("a\0b", "script").unwrap_err();
        assert!(matches!(err, BridgeError::InteriorNul { what: "script" }));
    }
}
