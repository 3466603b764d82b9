//! Общие помощники интеграционных тестов

#![allow(dead_code)]

use oclgpu::{DeviceSelector, DeviceType, Platform};

/// Селектор первого доступного устройства или `None`, если OpenCL недоступен.
///
/// Тесты, которым нужно устройство, пропускаются на машинах без платформы.
pub fn selector() -> Option<DeviceSelector> {
    let platforms = match Platform::all() {
        Ok(platforms) => platforms,
        Err(err) => {
            eprintln!("OpenCL недоступен, тест пропущен: {}", err);
            return None;
        }
    };
    let first = platforms.first()?;
    match first.devices(DeviceType::All) {
        Ok(devices) if !devices.is_empty() => Some(DeviceSelector::new(0, 0)),
        _ => {
            eprintln!("устройства OpenCL не найдены, тест пропущен");
            None
        }
    }
}

/// Возвращает из теста, если устройства нет
macro_rules! require_device {
    () => {
        match common::selector() {
            Some(selector) => selector,
            None => return,
        }
    };
}

pub const SQUARE: &str = r#"
__kernel void square(__global const float* in, const unsigned int count, __global float* out) {
    int i = get_global_id(0);
    if (i < count) out[i] = in[i] * in[i];
}
"#;

pub const ADD: &str = r#"
__kernel void add(__global const float* a, __global const float* b, const unsigned int count, __global float* out) {
    int i = get_global_id(0);
    if (i < count) out[i] = a[i] + b[i];
}
"#;

pub const INVERT: &str = r#"
__kernel void invert(__read_only image2d_t in, const int width, const int height, __write_only image2d_t out) {
    const int2 pos = (int2)(get_global_id(0), get_global_id(1));
    if (pos.x < width && pos.y < height) {
        write_imagef(out, pos, (float4)(1) - read_imagef(in, pos));
    }
}
"#;

pub fn assert_close(actual: &[f32], expected: &[f32]) {
    assert_eq!(actual.len(), expected.len());
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!((a - e).abs() <= 1e-5, "index {}: {} != {}", i, a, e);
    }
}
