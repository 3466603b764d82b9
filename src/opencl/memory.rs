//! Объекты памяти OpenCL: буферы и 2D изображения

use super::bindings::clReleaseMemObject;
use super::context::{CommandQueue, Context};
use super::types::*;
use crate::error::{Error, Result, Stage};
use crate::image::RGBA_PIXEL_SIZE;
use std::ffi::c_void;
use std::ptr;

/// Объект памяти устройства; освобождается в `Drop` или через [`Mem::release`]
#[derive(Debug)]
pub struct Mem {
    raw: cl_mem,
}

impl Mem {
    /// Выделяет буфер без исходных данных
    pub fn buffer(context: &Context, flags: cl_mem_flags, size: usize) -> Result<Self> {
        let raw = cl_create!(Stage::Allocate, clCreateBuffer(
            context.raw(),
            flags,
            size,
            ptr::null_mut()
        ))?;
        Ok(Self { raw })
    }

    /// Создает 2D изображение RGBA (8 бит на канал).
    ///
    /// Если `pixels` задан, данные копируются при создании с шагом строки
    /// `row_pitch` (0 значит плотную упаковку); длина `pixels` проверяется.
    pub fn image_rgba8(
        context: &Context,
        flags: cl_mem_flags,
        width: usize,
        height: usize,
        row_pitch: usize,
        pixels: Option<&[u8]>,
    ) -> Result<Self> {
        let format = cl_image_format {
            image_channel_order: CL_RGBA,
            image_channel_data_type: CL_UNORM_INT8,
        };
        let (flags, row_pitch, host_ptr) = match pixels {
            Some(pixels) => {
                check_image_len(width, height, row_pitch, pixels.len())?;
                (
                    flags | CL_MEM_COPY_HOST_PTR,
                    row_pitch,
                    pixels.as_ptr() as *mut c_void,
                )
            }
            // Без данных хоста шаг строки должен быть нулевым
            None => (flags, 0, ptr::null_mut()),
        };
        let desc = cl_image_desc {
            image_type: CL_MEM_OBJECT_IMAGE2D,
            image_width: width,
            image_height: height,
            image_depth: 1,
            image_array_size: 1,
            image_row_pitch: row_pitch,
            image_slice_pitch: 0,
            num_mip_levels: 0,
            num_samples: 0,
            buffer: ptr::null_mut(),
        };
        let raw = cl_create!(Stage::Allocate, clCreateImage(
            context.raw(),
            flags,
            &format,
            &desc,
            host_ptr
        ))?;
        Ok(Self { raw })
    }

    /// Синхронно копирует байты хоста в начало буфера
    pub fn write(&self, queue: &CommandQueue, bytes: &[u8]) -> Result<()> {
        cl_check!(Stage::Transfer, clEnqueueWriteBuffer(
            queue.raw(),
            self.raw,
            CL_TRUE,
            0,
            bytes.len(),
            bytes.as_ptr() as *const c_void,
            0,
            ptr::null(),
            ptr::null_mut()
        ))
    }

    /// Синхронно читает `dst.len()` байт с начала буфера
    pub fn read(&self, queue: &CommandQueue, dst: &mut [u8]) -> Result<()> {
        cl_check!(Stage::Transfer, clEnqueueReadBuffer(
            queue.raw(),
            self.raw,
            CL_TRUE,
            0,
            dst.len(),
            dst.as_mut_ptr() as *mut c_void,
            0,
            ptr::null(),
            ptr::null_mut()
        ))
    }

    /// Синхронно читает изображение целиком в `dst` с шагом строки `row_pitch`.
    ///
    /// `dst` должен вмещать `height` строк; иначе `Error::SizeMismatch`.
    pub fn read_image(
        &self,
        queue: &CommandQueue,
        width: usize,
        height: usize,
        row_pitch: usize,
        dst: &mut [u8],
    ) -> Result<()> {
        check_image_len(width, height, row_pitch, dst.len())?;
        let origin = [0usize; 3];
        let region = [width, height, 1];
        cl_check!(Stage::Transfer, clEnqueueReadImage(
            queue.raw(),
            self.raw,
            CL_TRUE,
            origin.as_ptr(),
            region.as_ptr(),
            row_pitch,
            0,
            dst.as_mut_ptr() as *mut c_void,
            0,
            ptr::null(),
            ptr::null_mut()
        ))
    }

    /// Явно освобождает объект памяти и возвращает статус драйвера
    pub fn release(mut self) -> Result<()> {
        let raw = std::mem::replace(&mut self.raw, ptr::null_mut());
        let code = unsafe { clReleaseMemObject(raw) };
        if code != CL_SUCCESS {
            return Err(Error::api(Stage::Allocate, "clReleaseMemObject", code));
        }
        Ok(())
    }

    pub fn raw(&self) -> cl_mem {
        self.raw
    }
}

impl Drop for Mem {
    fn drop(&mut self) {
        if !self.raw.is_null() {
            unsafe {
                clReleaseMemObject(self.raw);
            }
        }
    }
}

/// Байт, которые занимают `height` строк RGBA8 с шагом `row_pitch`
/// (0 значит `4 * width`); последняя строка без выравнивания.
pub fn image_span(width: usize, height: usize, row_pitch: usize) -> Result<usize> {
    let row = width.checked_mul(RGBA_PIXEL_SIZE).ok_or_else(|| too_large(width, height))?;
    let pitch = if row_pitch == 0 { row } else { row_pitch };
    if pitch < row {
        return Err(Error::InvalidImage(format!(
            "row pitch {pitch} is shorter than a row of {width} RGBA pixels"
        )));
    }
    if height == 0 {
        return Ok(0);
    }
    pitch
        .checked_mul(height - 1)
        .and_then(|n| n.checked_add(row))
        .ok_or_else(|| too_large(width, height))
}

fn check_image_len(width: usize, height: usize, row_pitch: usize, actual: usize) -> Result<()> {
    let expected = image_span(width, height, row_pitch)?;
    if actual < expected {
        return Err(Error::SizeMismatch { expected, actual });
    }
    Ok(())
}

fn too_large(width: usize, height: usize) -> Error {
    Error::InvalidImage(format!("{width}x{height} image does not fit in memory"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_of_packed_and_padded_images() {
        assert_eq!(image_span(7, 7, 0).unwrap(), 7 * 7 * 4);
        assert_eq!(image_span(5, 4, 32).unwrap(), 32 * 3 + 20);
        assert_eq!(image_span(3, 0, 0).unwrap(), 0);
    }

    #[test]
    fn short_destination_is_rejected() {
        assert!(matches!(
            check_image_len(64, 64, 256, 4),
            Err(Error::SizeMismatch {
                expected: 16384,
                actual: 4
            })
        ));
        assert!(check_image_len(5, 4, 32, 116).is_ok());
        assert!(check_image_len(5, 4, 32, 115).is_err());
    }

    #[test]
    fn pitch_shorter_than_row_is_rejected() {
        assert!(matches!(image_span(8, 2, 16), Err(Error::InvalidImage(_))));
        assert!(matches!(
            image_span(usize::MAX, 2, 0),
            Err(Error::InvalidImage(_))
        ));
    }
}
