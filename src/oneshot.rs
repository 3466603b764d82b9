//! Одноразовый запуск ядра: настройка, загрузка, запуск и чтение результата
//! за один вызов.
//!
//! Выходной буфер (или изображение) создается автоматически и передается
//! ядру последним аргументом. Число аргументов сверяется с ядром, типы нет.

use crate::buffer::Buffer;
use crate::config::DeviceSelector;
use crate::constant::{Arg, Scalar};
use crate::error::{Error, Result};
use crate::image::{RgbaImage, RGBA_PIXEL_SIZE};
use crate::opencl::types::{CL_MEM_READ_ONLY, CL_MEM_WRITE_ONLY};
use crate::program::Program;
use crate::work_size::{round_up, WorkSize};

/// Аргумент для [`execute`]: скаляр или массив `f32`
#[derive(Debug, Clone, Copy)]
pub enum HostArg<'a> {
    Scalar(Scalar),
    Array(&'a [f32]),
}

/// Аргумент для [`execute_image`]: скаляр или изображение
#[derive(Debug, Clone, Copy)]
pub enum ImageArg<'a> {
    Scalar(Scalar),
    Image(&'a RgbaImage),
}

macro_rules! impl_scalar_args {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for HostArg<'_> {
                fn from(value: $ty) -> Self {
                    HostArg::Scalar(Scalar::from(value))
                }
            }

            impl From<$ty> for ImageArg<'_> {
                fn from(value: $ty) -> Self {
                    ImageArg::Scalar(Scalar::from(value))
                }
            }
        )*
    };
}

impl_scalar_args!(i32, u32, f32, Scalar);

impl<'a> From<&'a [f32]> for HostArg<'a> {
    fn from(data: &'a [f32]) -> Self {
        HostArg::Array(data)
    }
}

impl<'a> From<&'a Vec<f32>> for HostArg<'a> {
    fn from(data: &'a Vec<f32>) -> Self {
        HostArg::Array(data)
    }
}

impl<'a> From<&'a RgbaImage> for ImageArg<'a> {
    fn from(image: &'a RgbaImage) -> Self {
        ImageArg::Image(image)
    }
}

/// Длина, общая для всех массивов
fn array_length(args: &[HostArg<'_>]) -> Result<usize> {
    let mut length = None;
    for arg in args {
        if let HostArg::Array(data) = arg {
            match length {
                None => length = Some(data.len()),
                Some(expected) if expected != data.len() => {
                    return Err(Error::LengthMismatch {
                        expected,
                        actual: data.len(),
                    })
                }
                Some(_) => {}
            }
        }
    }
    length.ok_or(Error::MissingData("array"))
}

/// Размеры и шаг строки первого изображения; остальные должны совпадать по размерам
fn image_shape(args: &[ImageArg<'_>]) -> Result<(usize, usize, usize)> {
    let mut shape: Option<(usize, usize, usize)> = None;
    for arg in args {
        if let ImageArg::Image(image) = arg {
            match shape {
                None => shape = Some((image.width(), image.height(), image.stride())),
                Some((w, h, _)) if (w, h) != image.dimensions() => {
                    return Err(Error::ImageMismatch {
                        expected: (w, h),
                        actual: image.dimensions(),
                    })
                }
                Some(_) => {}
            }
        }
    }
    shape.ok_or(Error::MissingData("image"))
}

enum Slot<'p> {
    Buffer(Buffer<'p>),
    Scalar(Scalar),
}

fn to_args<'a>(slots: &'a [Slot<'_>], output: &'a Buffer<'_>) -> Vec<Arg<'a>> {
    slots
        .iter()
        .map(|slot| match slot {
            Slot::Buffer(buffer) => Arg::from(buffer),
            Slot::Scalar(value) => Arg::from(*value),
        })
        .chain(std::iter::once(Arg::from(output)))
        .collect()
}

/// Компилирует ядро, загружает массивы и запускает его один раз.
///
/// Все массивы должны быть одной длины; выход той же длины добавляется
/// последним аргументом. Локальный размер равен максимуму рабочей группы ядра.
pub fn execute(
    source: &str,
    kernel_name: &str,
    selector: &DeviceSelector,
    args: &[HostArg<'_>],
) -> Result<Vec<f32>> {
    let length = array_length(args)?;

    let program = Program::new(source, kernel_name, selector)?;
    let slots = args
        .iter()
        .map(|arg| match arg {
            HostArg::Array(data) => program.input_f32(data).map(Slot::Buffer),
            HostArg::Scalar(value) => Ok(Slot::Scalar(*value)),
        })
        .collect::<Result<Vec<_>>>()?;
    let output = program.empty_f32(length)?;

    let local = program.max_work_group_size()?;
    let work = WorkSize::explicit(&[round_up(length, local)], &[local])?;
    program.dispatch(&work, &to_args(&slots, &output))?;

    output.read_f32_vec()
}

/// Как [`execute`], но для изображений RGBA; возвращает выходное изображение
/// тех же размеров и с тем же шагом строки, что и первое входное.
pub fn execute_image(
    source: &str,
    kernel_name: &str,
    selector: &DeviceSelector,
    args: &[ImageArg<'_>],
) -> Result<RgbaImage> {
    let (width, height, stride) = image_shape(args)?;

    let program = Program::new(source, kernel_name, selector)?;
    let slots = args
        .iter()
        .map(|arg| match arg {
            ImageArg::Image(image) => program.image_with_flags(CL_MEM_READ_ONLY, image).map(Slot::Buffer),
            ImageArg::Scalar(value) => Ok(Slot::Scalar(*value)),
        })
        .collect::<Result<Vec<_>>>()?;
    let output = program.empty_image_with_flags(
        CL_MEM_WRITE_ONLY,
        width,
        height,
        stride.max(width * RGBA_PIXEL_SIZE),
    )?;

    let work = WorkSize::for_image(
        width,
        height,
        program.preferred_work_group_size()?,
        program.max_work_group_size()?,
    )?;
    program.dispatch(&work, &to_args(&slots, &output))?;

    output.read_image()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrays_must_share_length() {
        let a = vec![1.0f32; 4];
        let b = vec![1.0f32; 3];
        let err = array_length(&[HostArg::from(&a), HostArg::from(&b), HostArg::from(4u32)])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::LengthMismatch {
                expected: 4,
                actual: 3
            }
        ));
        assert!(err.to_string().contains("lengths must match"));
    }

    #[test]
    fn length_comes_from_arrays_only() {
        let a = [0.5f32, 1.5];
        let len = array_length(&[HostArg::from(7i32), HostArg::from(&a[..]), HostArg::from(&a[..])])
            .unwrap();
        assert_eq!(len, 2);
    }

    #[test]
    fn scalars_alone_are_rejected() {
        assert!(matches!(
            array_length(&[HostArg::from(1.0f32)]),
            Err(Error::MissingData("array"))
        ));
        assert!(matches!(
            image_shape(&[ImageArg::from(3i32)]),
            Err(Error::MissingData("image"))
        ));
    }

    #[test]
    fn images_must_share_dimensions() {
        let a = RgbaImage::with_stride(7, 7, 32);
        let b = RgbaImage::new(7, 6);
        assert_eq!(
            image_shape(&[ImageArg::from(&a), ImageArg::from(7i32)]).unwrap(),
            (7, 7, 32)
        );
        assert!(matches!(
            image_shape(&[ImageArg::from(&a), ImageArg::from(&b)]),
            Err(Error::ImageMismatch { .. })
        ));
    }

    #[test]
    fn mismatch_fails_before_touching_a_device() {
        let err = execute(
            "__kernel void k() {}",
            "k",
            &DeviceSelector::new(usize::MAX, usize::MAX),
            &[HostArg::from(&[1.0f32, 2.0][..]), HostArg::from(&[1.0f32][..])],
        )
        .unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { .. }));
    }
}
