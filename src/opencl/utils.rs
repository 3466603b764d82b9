//! Вспомогательные функции для OpenCL

use super::types::cl_int;
use crate::error::Result;
use std::ffi::{c_void, CString};

/// Преобразует строку в null-terminated строку для C
pub fn to_c_string(s: &str) -> Result<CString> {
    Ok(CString::new(s)?)
}

/// Символьное имя кода возврата OpenCL
pub fn status_name(code: cl_int) -> &'static str {
    match code {
        0 => "CL_SUCCESS",
        -1 => "CL_DEVICE_NOT_FOUND",
        -2 => "CL_DEVICE_NOT_AVAILABLE",
        -3 => "CL_COMPILER_NOT_AVAILABLE",
        -4 => "CL_MEM_OBJECT_ALLOCATION_FAILURE",
        -5 => "CL_OUT_OF_RESOURCES",
        -6 => "CL_OUT_OF_HOST_MEMORY",
        -7 => "CL_PROFILING_INFO_NOT_AVAILABLE",
        -8 => "CL_MEM_COPY_OVERLAP",
        -9 => "CL_IMAGE_FORMAT_MISMATCH",
        -10 => "CL_IMAGE_FORMAT_NOT_SUPPORTED",
        -11 => "CL_BUILD_PROGRAM_FAILURE",
        -12 => "CL_MAP_FAILURE",
        -30 => "CL_INVALID_VALUE",
        -31 => "CL_INVALID_DEVICE_TYPE",
        -32 => "CL_INVALID_PLATFORM",
        -33 => "CL_INVALID_DEVICE",
        -34 => "CL_INVALID_CONTEXT",
        -35 => "CL_INVALID_QUEUE_PROPERTIES",
        -36 => "CL_INVALID_COMMAND_QUEUE",
        -37 => "CL_INVALID_HOST_PTR",
        -38 => "CL_INVALID_MEM_OBJECT",
        -39 => "CL_INVALID_IMAGE_FORMAT_DESCRIPTOR",
        -40 => "CL_INVALID_IMAGE_SIZE",
        -42 => "CL_INVALID_BINARY",
        -43 => "CL_INVALID_BUILD_OPTIONS",
        -44 => "CL_INVALID_PROGRAM",
        -45 => "CL_INVALID_PROGRAM_EXECUTABLE",
        -46 => "CL_INVALID_KERNEL_NAME",
        -47 => "CL_INVALID_KERNEL_DEFINITION",
        -48 => "CL_INVALID_KERNEL",
        -49 => "CL_INVALID_ARG_INDEX",
        -50 => "CL_INVALID_ARG_VALUE",
        -51 => "CL_INVALID_ARG_SIZE",
        -52 => "CL_INVALID_KERNEL_ARGS",
        -53 => "CL_INVALID_WORK_DIMENSION",
        -54 => "CL_INVALID_WORK_GROUP_SIZE",
        -55 => "CL_INVALID_WORK_ITEM_SIZE",
        -56 => "CL_INVALID_GLOBAL_OFFSET",
        -59 => "CL_INVALID_OPERATION",
        -61 => "CL_INVALID_BUFFER_SIZE",
        -63 => "CL_INVALID_GLOBAL_WORK_SIZE",
        -65 => "CL_INVALID_IMAGE_DESCRIPTOR",
        -1001 => "CL_PLATFORM_NOT_FOUND_KHR",
        _ => "unknown status",
    }
}

/// Читает строковый параметр через пару вызовов "размер, затем данные".
///
/// `query` получает размер буфера, указатель на него и указатель для
/// возвращаемого размера, как все `clGet*Info`.
pub fn read_info_string<F>(mut query: F) -> std::result::Result<String, cl_int>
where
    F: FnMut(usize, *mut c_void, *mut usize) -> cl_int,
{
    let mut size = 0usize;
    let code = query(0, std::ptr::null_mut(), &mut size);
    if code != 0 {
        return Err(code);
    }

    let mut bytes = vec![0u8; size];
    if size > 0 {
        let code = query(size, bytes.as_mut_ptr() as *mut c_void, std::ptr::null_mut());
        if code != 0 {
            return Err(code);
        }
    }

    while bytes.last() == Some(&0) {
        bytes.pop();
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_and_unknown_status_names() {
        assert_eq!(status_name(-46), "CL_INVALID_KERNEL_NAME");
        assert_eq!(status_name(-1001), "CL_PLATFORM_NOT_FOUND_KHR");
        assert_eq!(status_name(-9999), "unknown status");
    }

    #[test]
    fn info_string_strips_terminator() {
        let source = b"Portable Computing Language\0";
        let text = read_info_string(|size, value, size_ret| {
            if !size_ret.is_null() {
                unsafe { *size_ret = source.len() };
            }
            if !value.is_null() {
                let len = size.min(source.len());
                unsafe {
                    std::ptr::copy_nonoverlapping(source.as_ptr(), value as *mut u8, len);
                }
            }
            0
        })
        .unwrap();
        assert_eq!(text, "Portable Computing Language");
    }

    #[test]
    fn info_string_propagates_status() {
        let err = read_info_string(|_, _, _| -33).unwrap_err();
        assert_eq!(err, -33);
    }

    #[test]
    fn c_string_rejects_interior_nul() {
        assert!(to_c_string("square").is_ok());
        assert!(to_c_string("sq\0uare").is_err());
    }
}
