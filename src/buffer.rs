//! Буферы устройства: создание из массивов, скаляров и изображений и чтение обратно

use crate::error::{Error, Result};
use crate::image::{PixelLayout, RawImage, RgbaImage, RGBA_PIXEL_SIZE};
use crate::opencl::types::*;
use crate::opencl::Mem;
use crate::program::Program;
use bytemuck::{cast_slice, cast_slice_mut, Pod};
use std::ptr;

/// Форма буфера: массив элементов или 2D изображение
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extent {
    Elements { length: usize, element_size: usize },
    Image { width: usize, height: usize, stride: usize },
}

impl Extent {
    /// Размер данных на стороне хоста в байтах
    pub fn byte_len(&self) -> usize {
        match *self {
            Extent::Elements {
                length,
                element_size,
            } => length * element_size,
            Extent::Image { height, stride, .. } => height * stride,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Extent::Elements { .. } => "array",
            Extent::Image { .. } => "image",
        }
    }
}

/// Область памяти устройства, созданная через [`Program`].
///
/// Освобождается при удалении или явно через [`Buffer::cleanup`].
#[derive(Debug)]
pub struct Buffer<'p> {
    program: &'p Program,
    mem: Mem,
    extent: Extent,
}

impl<'p> Buffer<'p> {
    pub fn extent(&self) -> Extent {
        self.extent
    }

    /// Число элементов (для изображения: число пикселей)
    pub fn len(&self) -> usize {
        match self.extent {
            Extent::Elements { length, .. } => length,
            Extent::Image { width, height, .. } => width * height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn mem(&self) -> &Mem {
        &self.mem
    }

    pub(crate) fn belongs_to(&self, program: &Program) -> bool {
        ptr::eq(self.program, program)
    }

    /// Освобождает память устройства
    pub fn cleanup(self) -> Result<()> {
        self.mem.release()
    }

    /// Копирует весь буфер в `dst`; размер `dst` должен совпадать с буфером
    pub fn read_bytes_into(&self, dst: &mut [u8]) -> Result<()> {
        self.expect_elements()?;
        let expected = self.extent.byte_len();
        if dst.len() != expected {
            return Err(Error::SizeMismatch {
                expected,
                actual: dst.len(),
            });
        }
        self.mem.read(self.program.queue(), dst)
    }

    /// Копирует весь буфер в срез значений `T`
    pub fn read_into<T: Pod>(&self, dst: &mut [T]) -> Result<()> {
        self.read_bytes_into(cast_slice_mut(dst))
    }

    /// Читает буфер в новый вектор элементов `T`
    pub fn read_vec<T: Pod>(&self) -> Result<Vec<T>> {
        let length = self.expect_elements_of::<T>()?;
        let mut out = vec![T::zeroed(); length];
        self.read_into(&mut out)?;
        Ok(out)
    }

    pub fn read_f32_vec(&self) -> Result<Vec<f32>> {
        self.read_vec()
    }

    pub fn read_i32_vec(&self) -> Result<Vec<i32>> {
        self.read_vec()
    }

    /// Читает буфер из одного элемента
    pub fn read_scalar<T: Pod>(&self) -> Result<T> {
        let length = self.expect_elements_of::<T>()?;
        if length != 1 {
            return Err(Error::SizeMismatch {
                expected: length * std::mem::size_of::<T>(),
                actual: std::mem::size_of::<T>(),
            });
        }
        let mut out = [T::zeroed()];
        self.read_into(&mut out)?;
        Ok(out[0])
    }

    pub fn read_f32(&self) -> Result<f32> {
        self.read_scalar()
    }

    pub fn read_i32(&self) -> Result<i32> {
        self.read_scalar()
    }

    /// Читает изображение с исходными размерами и шагом строки
    pub fn read_image(&self) -> Result<RgbaImage> {
        let Extent::Image {
            width,
            height,
            stride,
        } = self.extent
        else {
            return Err(self.wrong_extent("image"));
        };
        let mut image = RgbaImage::with_stride(width, height, stride);
        self.read_image_into(&mut image)?;
        Ok(image)
    }

    /// Читает изображение в `dst` тех же размеров и с тем же шагом строки
    pub fn read_image_into(&self, dst: &mut RgbaImage) -> Result<()> {
        let Extent::Image {
            width,
            height,
            stride,
        } = self.extent
        else {
            return Err(self.wrong_extent("image"));
        };
        if dst.dimensions() != (width, height) {
            return Err(Error::ImageMismatch {
                expected: (width, height),
                actual: dst.dimensions(),
            });
        }
        if dst.stride() != stride {
            return Err(Error::SizeMismatch {
                expected: stride * height,
                actual: dst.stride() * dst.height(),
            });
        }
        self.mem
            .read_image(self.program.queue(), width, height, stride, dst.as_raw_mut())
    }

    fn expect_elements(&self) -> Result<()> {
        match self.extent {
            Extent::Elements { .. } => Ok(()),
            Extent::Image { .. } => Err(self.wrong_extent("array")),
        }
    }

    fn expect_elements_of<T>(&self) -> Result<usize> {
        match self.extent {
            Extent::Elements {
                length,
                element_size,
            } if element_size == std::mem::size_of::<T>() => Ok(length),
            Extent::Elements {
                length,
                element_size,
            } => Err(Error::SizeMismatch {
                expected: length * element_size,
                actual: length * std::mem::size_of::<T>(),
            }),
            Extent::Image { .. } => Err(self.wrong_extent("array")),
        }
    }

    fn wrong_extent(&self, expected: &'static str) -> Error {
        Error::WrongExtent {
            expected,
            actual: self.extent.kind(),
        }
    }
}

/// Размер `length` элементов по `element_size` байт; переполнение дает
/// `SizeMismatch` с `expected = usize::MAX` и длиной данных хоста `actual`.
fn byte_size(element_size: usize, length: usize, actual: usize) -> Result<usize> {
    element_size.checked_mul(length).ok_or(Error::SizeMismatch {
        expected: usize::MAX,
        actual,
    })
}

impl Program {
    fn upload(&self, flags: cl_mem_flags, bytes: &[u8], element_size: usize) -> Result<Buffer<'_>> {
        let mem = Mem::buffer(self.context(), flags, bytes.len())?;
        mem.write(self.queue(), bytes)?;
        Ok(Buffer {
            program: self,
            mem,
            extent: Extent::Elements {
                length: bytes.len() / element_size.max(1),
                element_size,
            },
        })
    }

    fn allocate(&self, flags: cl_mem_flags, length: usize, element_size: usize) -> Result<Buffer<'_>> {
        let mem = Mem::buffer(self.context(), flags, byte_size(element_size, length, 0)?)?;
        Ok(Buffer {
            program: self,
            mem,
            extent: Extent::Elements {
                length,
                element_size,
            },
        })
    }

    /// Буфер только для чтения ядром из `length` элементов по `element_size`
    /// байт; копирует ровно `element_size * length` байт из `bytes`.
    pub fn buffer_from_bytes(&self, bytes: &[u8], element_size: usize, length: usize) -> Result<Buffer<'_>> {
        let size = byte_size(element_size, length, bytes.len())?;
        if bytes.len() < size {
            return Err(Error::SizeMismatch {
                expected: size,
                actual: bytes.len(),
            });
        }
        self.upload(CL_MEM_READ_ONLY, &bytes[..size], element_size)
    }

    /// Буфер только для чтения из среза простых структур
    pub fn buffer_from_slice<T: Pod>(&self, data: &[T]) -> Result<Buffer<'_>> {
        self.buffer_from_bytes(cast_slice(data), std::mem::size_of::<T>(), data.len())
    }

    pub fn buffer_from_f32_slice(&self, data: &[f32]) -> Result<Buffer<'_>> {
        self.upload(CL_MEM_READ_WRITE, cast_slice(data), std::mem::size_of::<f32>())
    }

    pub fn buffer_from_i32_slice(&self, data: &[i32]) -> Result<Buffer<'_>> {
        self.upload(CL_MEM_READ_WRITE, cast_slice(data), std::mem::size_of::<i32>())
    }

    pub fn buffer_from_f32(&self, value: f32) -> Result<Buffer<'_>> {
        self.buffer_from_f32_slice(&[value])
    }

    pub fn buffer_from_i32(&self, value: i32) -> Result<Buffer<'_>> {
        self.buffer_from_i32_slice(&[value])
    }

    /// Пустой буфер для записи ядром
    pub fn empty_buffer<T: Pod>(&self, length: usize) -> Result<Buffer<'_>> {
        self.allocate(CL_MEM_READ_WRITE, length, std::mem::size_of::<T>())
    }

    pub fn empty_f32(&self, length: usize) -> Result<Buffer<'_>> {
        self.empty_buffer::<f32>(length)
    }

    pub fn empty_i32(&self, length: usize) -> Result<Buffer<'_>> {
        self.empty_buffer::<i32>(length)
    }

    /// Загружает изображение RGBA как 2D изображение OpenCL
    pub fn buffer_from_image(&self, image: &RgbaImage) -> Result<Buffer<'_>> {
        self.image_with_flags(CL_MEM_READ_WRITE, image)
    }

    /// Загружает пиксели в любой раскладке; не-RGBA данные сначала преобразуются
    pub fn buffer_from_raw_image(&self, image: &RawImage<'_>) -> Result<Buffer<'_>> {
        if image.layout == PixelLayout::Rgba8 && image.data.len() >= image.stride * image.height {
            image.validate()?;
            return self.upload_image(
                CL_MEM_READ_WRITE,
                image.width,
                image.height,
                image.stride,
                image.data,
            );
        }
        self.buffer_from_image(&image.to_rgba()?)
    }

    /// Пустое изображение для записи ядром
    pub fn empty_image(&self, width: usize, height: usize) -> Result<Buffer<'_>> {
        self.empty_image_with_flags(CL_MEM_READ_WRITE, width, height, width * RGBA_PIXEL_SIZE)
    }

    pub(crate) fn image_with_flags(&self, flags: cl_mem_flags, image: &RgbaImage) -> Result<Buffer<'_>> {
        let (width, height) = image.dimensions();
        self.upload_image(flags, width, height, image.stride(), image.as_raw())
    }

    fn upload_image(
        &self,
        flags: cl_mem_flags,
        width: usize,
        height: usize,
        stride: usize,
        pixels: &[u8],
    ) -> Result<Buffer<'_>> {
        let mem = Mem::image_rgba8(self.context(), flags, width, height, stride, Some(pixels))?;
        Ok(Buffer {
            program: self,
            mem,
            extent: Extent::Image {
                width,
                height,
                stride,
            },
        })
    }

    pub(crate) fn empty_image_with_flags(
        &self,
        flags: cl_mem_flags,
        width: usize,
        height: usize,
        stride: usize,
    ) -> Result<Buffer<'_>> {
        let mem = Mem::image_rgba8(self.context(), flags, width, height, 0, None)?;
        Ok(Buffer {
            program: self,
            mem,
            extent: Extent::Image {
                width,
                height,
                stride,
            },
        })
    }

    pub(crate) fn input_f32(&self, data: &[f32]) -> Result<Buffer<'_>> {
        self.upload(CL_MEM_READ_ONLY, cast_slice(data), std::mem::size_of::<f32>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extent_byte_len() {
        let array = Extent::Elements {
            length: 1024,
            element_size: 8,
        };
        assert_eq!(array.byte_len(), 8192);
        assert_eq!(array.kind(), "array");

        let image = Extent::Image {
            width: 7,
            height: 3,
            stride: 32,
        };
        assert_eq!(image.byte_len(), 96);
        assert_eq!(image.kind(), "image");
    }

    #[test]
    fn byte_size_rejects_overflow() {
        assert_eq!(byte_size(4, 3, 12).unwrap(), 12);
        assert_eq!(byte_size(0, usize::MAX, 0).unwrap(), 0);
        assert!(matches!(
            byte_size(8, usize::MAX / 4, 16),
            Err(Error::SizeMismatch {
                expected: usize::MAX,
                actual: 16
            })
        ));
    }
}
