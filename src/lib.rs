//! Тонкая обертка над OpenCL: буферы из массивов, скаляров и изображений,
//! программа с одним ядром и одноразовые функции запуска.
//!
//! ```no_run
//! use oclgpu::{DeviceSelector, HostArg};
//!
//! let source = r#"
//! __kernel void square(__global float* in, const unsigned int count, __global float* out) {
//!     int i = get_global_id(0);
//!     if (i < count) out[i] = in[i] * in[i];
//! }"#;
//! let input = [0.5f32, 1.5, 1.0, 2.0];
//! let out = oclgpu::execute(
//!     source,
//!     "square",
//!     &DeviceSelector::default(),
//!     &[HostArg::from(&input[..]), HostArg::from(input.len() as u32)],
//! )?;
//! assert_eq!(out, vec![0.25, 2.25, 1.0, 4.0]);
//! # Ok::<(), oclgpu::Error>(())
//! ```

// Реэкспортируем макросы на уровень крейта
#[macro_use]
mod macros {
    /// Макрос для обработки кодов возврата OpenCL
    #[macro_export]
    macro_rules! cl_check {
        ($stage:expr, $func:ident($($arg:expr),* $(,)?)) => {{
            let code = unsafe { $crate::opencl::bindings::$func($($arg),*) };
            if code != $crate::opencl::types::CL_SUCCESS {
                Err($crate::Error::Api {
                    stage: $stage,
                    call: stringify!($func),
                    code,
                })
            } else {
                Ok(())
            }
        }};
    }

    /// Макрос для функций OpenCL, возвращающих объект и код через `errcode_ret`
    #[macro_export]
    macro_rules! cl_create {
        ($stage:expr, $func:ident($($arg:expr),* $(,)?)) => {{
            let mut code: $crate::opencl::types::cl_int = $crate::opencl::types::CL_SUCCESS;
            let obj = unsafe { $crate::opencl::bindings::$func($($arg,)* &mut code) };
            if code != $crate::opencl::types::CL_SUCCESS || obj.is_null() {
                Err($crate::Error::Api {
                    stage: $stage,
                    call: stringify!($func),
                    code,
                })
            } else {
                Ok(obj)
            }
        }};
    }
}

pub mod buffer;
pub mod config;
pub mod constant;
pub mod device;
pub mod error;
pub mod image;
pub mod oneshot;
pub mod opencl;
pub mod program;
pub mod utils;
pub mod work_size;

// Реэкспорт основных типов для удобства
pub use buffer::{Buffer, Extent};
pub use config::DeviceSelector;
pub use constant::{Arg, Const, Scalar};
pub use device::{Device, DeviceType, Platform};
pub use error::{Error, Result, Stage};
pub use image::{PixelLayout, RawImage, RgbaImage};
pub use oneshot::{execute, execute_image, HostArg, ImageArg};
pub use program::Program;
