use libduckdb_sys::duckdb_string_t;
use std::borrow::Cow;

/// Borrow a DuckDB string value as UTF-8 (lossy).
///
/// # Safety
///
/// `s` must come from a non-NULL `duckdb_string_t` vector row provided by DuckDB for the
/// active scalar invocation, and the returned value must not outlive that invocation.
pub unsafe fn decode_duckdb_string(s: &duckdb_string_t) -> Cow<'_, str> {
    // SAFETY: Reading the inlined length is valid for both string layouts.
    let inlined_len = unsafe { s.value.inlined.length };

    let bytes: &[u8] = if inlined_len <= 12 {
        // SAFETY: `inlined_len <= 12`, so the inlined buffer holds the bytes.
        let inlined = unsafe { &s.value.inlined.inlined };
        // SAFETY: `inlined` contains `inlined_len` initialized bytes.
        unsafe { std::slice::from_raw_parts(inlined.as_ptr() as *const u8, inlined_len as usize) }
    } else {
        // SAFETY: Non-inlined strings use the pointer layout.
        let (ptr, len) = unsafe { (s.value.pointer.ptr, s.value.pointer.length as usize) };
        // SAFETY: DuckDB keeps `len` bytes alive at `ptr` for the invocation.
        unsafe { std::slice::from_raw_parts(ptr as *const u8, len) }
    };

    String::from_utf8_lossy(bytes)
}
