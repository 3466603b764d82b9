//! Скалярные аргументы ядра

use crate::buffer::Buffer;
use crate::error::{Error, Result};
use std::any::{type_name, Any};

/// Скаляр в одном из трех представлений на устройстве.
///
/// 64-битные значения сужаются молча, без проверки переполнения.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Int(i32),
    UInt(u32),
    Float(f32),
}

impl Scalar {
    /// Размер значения при передаче в ядро
    pub const SIZE: usize = 4;

    pub fn to_ne_bytes(self) -> [u8; Self::SIZE] {
        match self {
            Scalar::Int(v) => v.to_ne_bytes(),
            Scalar::UInt(v) => v.to_ne_bytes(),
            Scalar::Float(v) => v.to_ne_bytes(),
        }
    }

    /// Нормализует значение произвольного типа, если тип числовой
    pub fn from_any(value: &dyn Any) -> Option<Scalar> {
        macro_rules! try_kinds {
            ($($ty:ty),*) => {
                $(
                    if let Some(v) = value.downcast_ref::<$ty>() {
                        return Some(Scalar::from(*v));
                    }
                )*
            };
        }
        try_kinds!(i32, u32, f32, i64, isize, i16, i8, u64, usize, u16, u8, f64);
        None
    }
}

macro_rules! impl_from_scalar {
    ($variant:ident($target:ty): $($ty:ty),*) => {
        $(
            impl From<$ty> for Scalar {
                fn from(value: $ty) -> Self {
                    Scalar::$variant(value as $target)
                }
            }
        )*
    };
}

impl_from_scalar!(Int(i32): i8, i16, i32, i64, isize);
impl_from_scalar!(UInt(u32): u8, u16, u32, u64, usize);
impl_from_scalar!(Float(f32): f32, f64);

/// Константный аргумент ядра, передается по значению
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Const {
    value: Scalar,
}

impl Const {
    pub fn new(value: impl Into<Scalar>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Для значений, тип которых известен только во время выполнения.
    ///
    /// Строки, булевы и составные типы дают [`Error::UnsupportedType`].
    pub fn try_new<T: Any>(value: T) -> Result<Self> {
        Ok(Self {
            value: normalize(&value)?,
        })
    }

    pub fn set_data(&mut self, value: impl Into<Scalar>) {
        self.value = value.into();
    }

    /// Заменяет значение; при ошибке прежнее значение сохраняется
    pub fn try_set_data<T: Any>(&mut self, value: T) -> Result<()> {
        self.value = normalize(&value)?;
        Ok(())
    }

    pub fn value(&self) -> Scalar {
        self.value
    }
}

impl From<Scalar> for Const {
    fn from(value: Scalar) -> Self {
        Self { value }
    }
}

fn normalize<T: Any>(value: &T) -> Result<Scalar> {
    Scalar::from_any(value).ok_or(Error::UnsupportedType(type_name::<T>()))
}

/// Позиционный аргумент ядра: буфер устройства или константа
#[derive(Debug, Clone, Copy)]
pub enum Arg<'a> {
    Buffer(&'a Buffer<'a>),
    Const(Const),
}

impl<'a, 'p: 'a> From<&'a Buffer<'p>> for Arg<'a> {
    fn from(buffer: &'a Buffer<'p>) -> Self {
        Arg::Buffer(buffer)
    }
}

impl From<Const> for Arg<'_> {
    fn from(value: Const) -> Self {
        Arg::Const(value)
    }
}

impl From<Scalar> for Arg<'_> {
    fn from(value: Scalar) -> Self {
        Arg::Const(Const::from(value))
    }
}
