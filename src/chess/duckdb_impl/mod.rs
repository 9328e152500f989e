pub mod bind_info_ffi;
pub mod scalar;
pub mod string;
