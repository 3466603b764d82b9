//! Инверсия цветов изображения на GPU

use anyhow::{bail, Context, Result};
use oclgpu::{DeviceSelector, ImageArg, RgbaImage};

const WIDTH: usize = 640;
const HEIGHT: usize = 480;

const INVERT_KERNEL: &str = r#"
__kernel void invert(
    __read_only image2d_t in,
    const int width,
    const int height,
    __write_only image2d_t out)
{
    const int2 pos = (int2)(get_global_id(0), get_global_id(1));
    if (pos.x < width && pos.y < height) {
        float4 pixel = read_imagef(in, pos);
        write_imagef(out, pos, (float4)(1) - pixel);
    }
}
"#;

/// Горизонтальный градиент красного и вертикальный зеленого
fn gradient(width: usize, height: usize) -> RgbaImage {
    let mut image = RgbaImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let r = (x * 255 / width.max(1)) as u8;
            let g = (y * 255 / height.max(1)) as u8;
            image.put_pixel(x, y, [r, g, 128, 255]);
        }
    }
    image
}

fn main() -> Result<()> {
    let selector = DeviceSelector::from_env()?;
    let input = gradient(WIDTH, HEIGHT);

    println!("Инверсия изображения {}x{}...", WIDTH, HEIGHT);
    let (output, duration) = oclgpu::utils::measure_time(|| {
        oclgpu::execute_image(
            INVERT_KERNEL,
            "invert",
            &selector,
            &[
                ImageArg::from(&input),
                ImageArg::from(WIDTH as i32),
                ImageArg::from(HEIGHT as i32),
            ],
        )
    });
    let output = output.context("Ошибка при выполнении ядра")?;
    println!("Готово за {:?}", duration);

    let mismatches = input
        .pixels()
        .zip(output.pixels())
        .filter(|(a, b)| a.iter().zip(b).any(|(x, y)| x.wrapping_add(*y) != u8::MAX))
        .count();
    if mismatches > 0 {
        bail!("Неверно инвертировано пикселей: {}", mismatches);
    }

    println!("Пиксель (0, 0): {:?} -> {:?}", input.pixel(0, 0), output.pixel(0, 0));
    println!("Все {} пикселей инвертированы верно", WIDTH * HEIGHT);
    Ok(())
}
