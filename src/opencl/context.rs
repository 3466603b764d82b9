//! Контекст и очередь команд с гарантированным освобождением

use super::bindings::{clReleaseCommandQueue, clReleaseContext};
use super::callbacks::context_notify;
use super::types::*;
use crate::device::Device;
use crate::error::{Result, Stage};
use std::ptr;

/// Контекст OpenCL, привязанный к одному устройству
#[derive(Debug)]
pub struct Context {
    raw: cl_context,
}

impl Context {
    /// Создает контекст для одного устройства
    pub fn for_device(device: &Device) -> Result<Self> {
        let device = device.id();
        let raw = cl_create!(Stage::Context, clCreateContext(
            ptr::null(),
            1,
            &device,
            Some(context_notify),
            ptr::null_mut()
        ))?;
        Ok(Self { raw })
    }

    pub fn raw(&self) -> cl_context {
        self.raw
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        unsafe {
            clReleaseContext(self.raw);
        }
    }
}

/// Очередь команд (выполнение по порядку, без профилирования)
#[derive(Debug)]
pub struct CommandQueue {
    raw: cl_command_queue,
}

impl CommandQueue {
    pub fn new(context: &Context, device: &Device) -> Result<Self> {
        let raw = cl_create!(Stage::Queue, clCreateCommandQueue(
            context.raw(),
            device.id(),
            0
        ))?;
        Ok(Self { raw })
    }

    pub fn raw(&self) -> cl_command_queue {
        self.raw
    }

    /// Блокирует до завершения всех команд в очереди
    pub fn finish(&self) -> Result<()> {
        cl_check!(Stage::Dispatch, clFinish(self.raw))
    }
}

impl Drop for CommandQueue {
    fn drop(&mut self) {
        unsafe {
            clReleaseCommandQueue(self.raw);
        }
    }
}
