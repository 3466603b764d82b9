//! Растровые изображения RGBA (8 бит на канал)

use crate::error::{Error, Result};

/// Количество байт на пиксель RGBA
pub const RGBA_PIXEL_SIZE: usize = 4;

/// Упакованное изображение RGBA с явным шагом строки
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaImage {
    width: usize,
    height: usize,
    stride: usize,
    pix: Vec<u8>,
}

impl RgbaImage {
    /// Прозрачное черное изображение (все байты нулевые)
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_stride(width, height, width * RGBA_PIXEL_SIZE)
    }

    /// Пустое изображение с заданным шагом строки в байтах
    pub fn with_stride(width: usize, height: usize, stride: usize) -> Self {
        let stride = stride.max(width * RGBA_PIXEL_SIZE);
        Self {
            width,
            height,
            stride,
            pix: vec![0; stride * height],
        }
    }

    /// Оборачивает готовые пиксели, проверяя, что их хватает на все строки
    pub fn from_raw(width: usize, height: usize, stride: usize, pix: Vec<u8>) -> Result<Self> {
        let row = width * RGBA_PIXEL_SIZE;
        if stride < row {
            return Err(Error::InvalidImage(format!(
                "stride {stride} is shorter than a row of {width} pixels"
            )));
        }
        let needed = stride * height;
        if pix.len() < needed {
            return Err(Error::InvalidImage(format!(
                "{} bytes cannot hold {width}x{height} pixels with stride {stride}",
                pix.len()
            )));
        }
        Ok(Self {
            width,
            height,
            stride,
            pix,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.pix
    }

    pub fn as_raw_mut(&mut self) -> &mut [u8] {
        &mut self.pix
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.pix
    }

    fn offset(&self, x: usize, y: usize) -> usize {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        y * self.stride + x * RGBA_PIXEL_SIZE
    }

    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let i = self.offset(x, y);
        [self.pix[i], self.pix[i + 1], self.pix[i + 2], self.pix[i + 3]]
    }

    pub fn put_pixel(&mut self, x: usize, y: usize, rgba: [u8; 4]) {
        let i = self.offset(x, y);
        self.pix[i..i + RGBA_PIXEL_SIZE].copy_from_slice(&rgba);
    }

    /// Пиксели построчно
    pub fn pixels(&self) -> impl Iterator<Item = [u8; 4]> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| self.pixel(x, y)))
    }
}

/// Раскладка пикселей во входных данных
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    Rgba8,
    Bgra8,
    Rgb8,
    Gray8,
    GrayAlpha8,
}

impl PixelLayout {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelLayout::Rgba8 | PixelLayout::Bgra8 => 4,
            PixelLayout::Rgb8 => 3,
            PixelLayout::GrayAlpha8 => 2,
            PixelLayout::Gray8 => 1,
        }
    }

    fn to_rgba(self, px: &[u8]) -> [u8; 4] {
        match self {
            PixelLayout::Rgba8 => [px[0], px[1], px[2], px[3]],
            PixelLayout::Bgra8 => [px[2], px[1], px[0], px[3]],
            PixelLayout::Rgb8 => [px[0], px[1], px[2], u8::MAX],
            PixelLayout::Gray8 => [px[0], px[0], px[0], u8::MAX],
            PixelLayout::GrayAlpha8 => [px[0], px[0], px[0], px[1]],
        }
    }
}

/// Пиксели хоста в произвольной раскладке
#[derive(Debug, Clone, Copy)]
pub struct RawImage<'a> {
    pub width: usize,
    pub height: usize,
    pub stride: usize,
    pub layout: PixelLayout,
    pub data: &'a [u8],
}

impl<'a> RawImage<'a> {
    /// Плотно упакованные строки без выравнивания
    pub fn packed(width: usize, height: usize, layout: PixelLayout, data: &'a [u8]) -> Self {
        Self {
            width,
            height,
            stride: width * layout.bytes_per_pixel(),
            layout,
            data,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let row = self.width * self.layout.bytes_per_pixel();
        if self.stride < row {
            return Err(Error::InvalidImage(format!(
                "stride {} is shorter than a row of {} {:?} pixels",
                self.stride, self.width, self.layout
            )));
        }
        if self.height > 0 && self.data.len() < self.stride * (self.height - 1) + row {
            return Err(Error::InvalidImage(format!(
                "{} bytes cannot hold {}x{} {:?} pixels",
                self.data.len(),
                self.width,
                self.height,
                self.layout
            )));
        }
        Ok(())
    }

    /// Преобразует в упакованный RGBA с шагом `4 * width`
    pub fn to_rgba(&self) -> Result<RgbaImage> {
        self.validate()?;
        let bpp = self.layout.bytes_per_pixel();
        let mut out = RgbaImage::new(self.width, self.height);
        for y in 0..self.height {
            let row = &self.data[y * self.stride..];
            for x in 0..self.width {
                out.put_pixel(x, y, self.layout.to_rgba(&row[x * bpp..x * bpp + bpp]));
            }
        }
        Ok(out)
    }
}

impl<'a> From<&'a RgbaImage> for RawImage<'a> {
    fn from(image: &'a RgbaImage) -> Self {
        Self {
            width: image.width,
            height: image.height,
            stride: image.stride,
            layout: PixelLayout::Rgba8,
            data: &image.pix,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_image_is_transparent_black() {
        let img = RgbaImage::new(7, 5);
        assert_eq!(img.dimensions(), (7, 5));
        assert_eq!(img.stride(), 28);
        assert!(img.pixels().all(|p| p == [0, 0, 0, 0]));
        assert_eq!(img.pixels().count(), 35);
    }

    #[test]
    fn from_raw_checks_extent() {
        assert!(RgbaImage::from_raw(2, 2, 8, vec![0; 16]).is_ok());
        assert!(RgbaImage::from_raw(2, 2, 12, vec![0; 24]).is_ok());
        assert!(matches!(
            RgbaImage::from_raw(2, 2, 4, vec![0; 16]),
            Err(Error::InvalidImage(_))
        ));
        assert!(matches!(
            RgbaImage::from_raw(2, 2, 8, vec![0; 15]),
            Err(Error::InvalidImage(_))
        ));
    }

    #[test]
    fn padded_stride_keeps_pixels_apart() {
        let mut img = RgbaImage::with_stride(2, 2, 16);
        img.put_pixel(1, 1, [1, 2, 3, 4]);
        assert_eq!(&img.as_raw()[20..24], &[1, 2, 3, 4]);
        assert_eq!(img.pixel(1, 1), [1, 2, 3, 4]);
        assert_eq!(img.pixel(0, 1), [0, 0, 0, 0]);
    }

    #[test]
    fn converts_layouts_to_rgba() {
        let bgra = [10, 20, 30, 40];
        let img = RawImage::packed(1, 1, PixelLayout::Bgra8, &bgra).to_rgba().unwrap();
        assert_eq!(img.pixel(0, 0), [30, 20, 10, 40]);

        let rgb = [1, 2, 3, 4, 5, 6];
        let img = RawImage::packed(2, 1, PixelLayout::Rgb8, &rgb).to_rgba().unwrap();
        assert_eq!(img.pixel(1, 0), [4, 5, 6, 255]);

        let gray = [9, 0, 0, 0, 7];
        let raw = RawImage {
            width: 1,
            height: 2,
            stride: 4,
            layout: PixelLayout::Gray8,
            data: &gray,
        };
        let img = raw.to_rgba().unwrap();
        assert_eq!(img.pixel(0, 0), [9, 9, 9, 255]);
        assert_eq!(img.pixel(0, 1), [7, 7, 7, 255]);

        let ga = [50, 128];
        let img = RawImage::packed(1, 1, PixelLayout::GrayAlpha8, &ga).to_rgba().unwrap();
        assert_eq!(img.pixel(0, 0), [50, 50, 50, 128]);
    }

    #[test]
    fn rgba_conversion_drops_padding() {
        let mut padded = RgbaImage::with_stride(1, 2, 8);
        padded.put_pixel(0, 1, [1, 1, 1, 1]);
        let packed = RawImage::from(&padded).to_rgba().unwrap();
        assert_eq!(packed.stride(), 4);
        assert_eq!(packed.as_raw(), &[0, 0, 0, 0, 1, 1, 1, 1]);
    }

    #[test]
    fn short_raw_data_is_rejected() {
        let data = [0u8; 5];
        let raw = RawImage::packed(2, 1, PixelLayout::Rgb8, &data);
        assert!(matches!(raw.to_rgba(), Err(Error::InvalidImage(_))));
    }
}
