//! Программа OpenCL и ядро

use super::bindings::{clGetProgramBuildInfo, clReleaseKernel, clReleaseProgram};
use super::context::Context;
use super::types::*;
use super::utils::{read_info_string, to_c_string};
use crate::device::Device;
use crate::error::{Error, Result, Stage};
use std::ffi::c_void;
use std::ptr;

/// Скомпилированная (или компилируемая) программа OpenCL
#[derive(Debug)]
pub struct ProgramObject {
    raw: cl_program,
}

impl ProgramObject {
    pub fn with_source(context: &Context, source: &str) -> Result<Self> {
        let text = source.as_ptr() as *const std::ffi::c_char;
        let length = source.len();
        let raw = cl_create!(Stage::Compile, clCreateProgramWithSource(
            context.raw(),
            1,
            &text,
            &length
        ))?;
        Ok(Self { raw })
    }

    /// Компилирует программу без дополнительных опций.
    ///
    /// При ошибке возвращает лог компиляции для устройства.
    pub fn build(&self, device: &Device) -> Result<()> {
        let options = to_c_string("")?;
        let status = cl_check!(Stage::Compile, clBuildProgram(
            self.raw,
            1,
            &device.id(),
            options.as_ptr(),
            None,
            ptr::null_mut()
        ));

        if let Err(Error::Api { code, .. }) = status {
            let log = self.build_log(device).unwrap_or_default();
            return Err(Error::Build { code, log });
        }
        status
    }

    /// Лог компиляции для устройства
    pub fn build_log(&self, device: &Device) -> Result<String> {
        let raw = self.raw;
        let device = device.id();
        read_info_string(|size, value, size_ret| unsafe {
            clGetProgramBuildInfo(raw, device, CL_PROGRAM_BUILD_LOG, size, value, size_ret)
        })
        .map_err(|code| Error::api(Stage::Query, "clGetProgramBuildInfo", code))
    }

    pub fn raw(&self) -> cl_program {
        self.raw
    }
}

impl Drop for ProgramObject {
    fn drop(&mut self) {
        unsafe {
            clReleaseProgram(self.raw);
        }
    }
}

/// Точка входа ядра в собранной программе
#[derive(Debug)]
pub struct Kernel {
    raw: cl_kernel,
}

impl Kernel {
    pub fn new(program: &ProgramObject, name: &str) -> Result<Self> {
        let name = to_c_string(name)?;
        let raw = cl_create!(Stage::Kernel, clCreateKernel(program.raw(), name.as_ptr()))?;
        Ok(Self { raw })
    }

    /// Устанавливает аргумент ядра по индексу
    ///
    /// # Safety
    /// `value` должен указывать на `size` байт, которые ядро ожидает в этой позиции.
    pub unsafe fn set_arg(&self, index: u32, size: usize, value: *const c_void) -> Result<()> {
        cl_check!(Stage::Dispatch, clSetKernelArg(self.raw, index, size, value))
    }

    /// Число формальных параметров ядра
    pub fn num_args(&self) -> Result<usize> {
        let mut count: cl_uint = 0;
        cl_check!(Stage::Query, clGetKernelInfo(
            self.raw,
            CL_KERNEL_NUM_ARGS,
            std::mem::size_of::<cl_uint>(),
            &mut count as *mut _ as *mut c_void,
            ptr::null_mut()
        ))?;
        Ok(count as usize)
    }

    /// Максимальный размер рабочей группы для ядра на устройстве
    pub fn work_group_size(&self, device: &Device) -> Result<usize> {
        self.work_group_info(device, CL_KERNEL_WORK_GROUP_SIZE)
    }

    /// Предпочтительная кратность размера рабочей группы
    pub fn preferred_work_group_size_multiple(&self, device: &Device) -> Result<usize> {
        self.work_group_info(device, CL_KERNEL_PREFERRED_WORK_GROUP_SIZE_MULTIPLE)
    }

    fn work_group_info(&self, device: &Device, param: cl_kernel_work_group_info) -> Result<usize> {
        let mut value = 0usize;
        cl_check!(Stage::Query, clGetKernelWorkGroupInfo(
            self.raw,
            device.id(),
            param,
            std::mem::size_of::<usize>(),
            &mut value as *mut _ as *mut c_void,
            ptr::null_mut()
        ))?;
        Ok(value)
    }

    pub fn raw(&self) -> cl_kernel {
        self.raw
    }
}

impl Drop for Kernel {
    fn drop(&mut self) {
        unsafe {
            clReleaseKernel(self.raw);
        }
    }
}
