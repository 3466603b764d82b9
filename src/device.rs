//! Платформы и устройства OpenCL

use crate::error::{Error, Result, Stage};
use crate::opencl::bindings::{clGetDeviceInfo, clGetPlatformInfo};
use crate::opencl::types::*;
use crate::opencl::utils::read_info_string;
use serde::{Deserialize, Serialize};
use std::ffi::c_void;
use std::fmt;
use std::ptr;
use std::str::FromStr;

/// Фильтр типа устройства
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Default,
    Cpu,
    Gpu,
    Accelerator,
    #[default]
    All,
}

impl DeviceType {
    pub fn bits(self) -> cl_device_type {
        match self {
            DeviceType::Default => CL_DEVICE_TYPE_DEFAULT,
            DeviceType::Cpu => CL_DEVICE_TYPE_CPU,
            DeviceType::Gpu => CL_DEVICE_TYPE_GPU,
            DeviceType::Accelerator => CL_DEVICE_TYPE_ACCELERATOR,
            DeviceType::All => CL_DEVICE_TYPE_ALL,
        }
    }

    /// Тип по битам `CL_DEVICE_TYPE`, как их сообщает устройство
    pub fn from_bits(bits: cl_device_type) -> Self {
        if bits & CL_DEVICE_TYPE_GPU != 0 {
            DeviceType::Gpu
        } else if bits & CL_DEVICE_TYPE_CPU != 0 {
            DeviceType::Cpu
        } else if bits & CL_DEVICE_TYPE_ACCELERATOR != 0 {
            DeviceType::Accelerator
        } else {
            DeviceType::Default
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeviceType::Default => "default",
            DeviceType::Cpu => "cpu",
            DeviceType::Gpu => "gpu",
            DeviceType::Accelerator => "accelerator",
            DeviceType::All => "all",
        };
        f.write_str(name)
    }
}

impl FromStr for DeviceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(DeviceType::Default),
            "cpu" => Ok(DeviceType::Cpu),
            "gpu" => Ok(DeviceType::Gpu),
            "accelerator" => Ok(DeviceType::Accelerator),
            "all" => Ok(DeviceType::All),
            other => Err(Error::Config(format!("unknown device type `{other}`"))),
        }
    }
}

/// Платформа (стек драйверов одного производителя)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    id: cl_platform_id,
}

impl Platform {
    /// Все установленные платформы в порядке перечисления
    pub fn all() -> Result<Vec<Platform>> {
        let mut count: cl_uint = 0;
        let listed = cl_check!(Stage::Platform, clGetPlatformIDs(0, ptr::null_mut(), &mut count));
        if !found(listed, CL_PLATFORM_NOT_FOUND_KHR)? || count == 0 {
            return Ok(Vec::new());
        }

        let mut ids = vec![ptr::null_mut(); count as usize];
        cl_check!(Stage::Platform, clGetPlatformIDs(count, ids.as_mut_ptr(), ptr::null_mut()))?;
        Ok(ids.into_iter().map(|id| Platform { id }).collect())
    }

    /// Платформа по индексу перечисления
    pub fn get(index: usize) -> Result<Platform> {
        let platforms = Self::all()?;
        platforms.get(index).copied().ok_or(Error::PlatformNotFound {
            index,
            available: platforms.len(),
        })
    }

    /// Устройства платформы с учетом фильтра типа.
    ///
    /// Отсутствие устройств нужного типа дает пустой список.
    pub fn devices(&self, kind: DeviceType) -> Result<Vec<Device>> {
        let mut count: cl_uint = 0;
        let listed = cl_check!(Stage::Device, clGetDeviceIDs(
            self.id,
            kind.bits(),
            0,
            ptr::null_mut(),
            &mut count
        ));
        if !found(listed, CL_DEVICE_NOT_FOUND)? || count == 0 {
            return Ok(Vec::new());
        }

        let mut ids = vec![ptr::null_mut(); count as usize];
        cl_check!(Stage::Device, clGetDeviceIDs(
            self.id,
            kind.bits(),
            count,
            ids.as_mut_ptr(),
            ptr::null_mut()
        ))?;
        Ok(ids.into_iter().map(|id| Device { id }).collect())
    }

    pub fn name(&self) -> Result<String> {
        self.info_string(CL_PLATFORM_NAME)
    }

    pub fn vendor(&self) -> Result<String> {
        self.info_string(CL_PLATFORM_VENDOR)
    }

    pub fn version(&self) -> Result<String> {
        self.info_string(CL_PLATFORM_VERSION)
    }

    fn info_string(&self, param: cl_platform_info) -> Result<String> {
        let id = self.id;
        read_info_string(|size, value, size_ret| unsafe {
            clGetPlatformInfo(id, param, size, value, size_ret)
        })
        .map_err(|code| Error::api(Stage::Query, "clGetPlatformInfo", code))
    }

    pub fn id(&self) -> cl_platform_id {
        self.id
    }
}

/// `Ok(false)`, если драйвер сообщил о пустом списке кодом `empty`
fn found(listed: Result<()>, empty: cl_int) -> Result<bool> {
    match listed {
        Ok(()) => Ok(true),
        Err(Error::Api { code, .. }) if code == empty => Ok(false),
        Err(err) => Err(err),
    }
}

/// Вычислительное устройство (CPU, GPU, ускоритель)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Device {
    id: cl_device_id,
}

impl Device {
    pub fn name(&self) -> Result<String> {
        let id = self.id;
        read_info_string(|size, value, size_ret| unsafe {
            clGetDeviceInfo(id, CL_DEVICE_NAME, size, value, size_ret)
        })
        .map_err(|code| Error::api(Stage::Query, "clGetDeviceInfo", code))
    }

    pub fn device_type(&self) -> Result<DeviceType> {
        let bits: cl_device_type = self.info_scalar(CL_DEVICE_TYPE)?;
        Ok(DeviceType::from_bits(bits))
    }

    /// Максимальный размер рабочей группы устройства
    pub fn max_work_group_size(&self) -> Result<usize> {
        self.info_scalar(CL_DEVICE_MAX_WORK_GROUP_SIZE)
    }

    pub fn max_compute_units(&self) -> Result<u32> {
        self.info_scalar(CL_DEVICE_MAX_COMPUTE_UNITS)
    }

    /// Объем глобальной памяти в байтах
    pub fn global_mem_size(&self) -> Result<u64> {
        self.info_scalar(CL_DEVICE_GLOBAL_MEM_SIZE)
    }

    fn info_scalar<T: Default>(&self, param: cl_device_info) -> Result<T> {
        let mut value = T::default();
        cl_check!(Stage::Query, clGetDeviceInfo(
            self.id,
            param,
            std::mem::size_of::<T>(),
            &mut value as *mut T as *mut c_void,
            ptr::null_mut()
        ))?;
        Ok(value)
    }

    pub fn id(&self) -> cl_device_id {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_type_parses_case_insensitively() {
        assert_eq!("GPU".parse::<DeviceType>().unwrap(), DeviceType::Gpu);
        assert_eq!(" cpu ".parse::<DeviceType>().unwrap(), DeviceType::Cpu);
        assert!(matches!(
            "fpga".parse::<DeviceType>(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn device_type_bits_round_trip_for_concrete_kinds() {
        for kind in [DeviceType::Cpu, DeviceType::Gpu, DeviceType::Accelerator] {
            assert_eq!(DeviceType::from_bits(kind.bits()), kind);
        }
        // GPU важнее, если устройство сообщает несколько битов
        assert_eq!(
            DeviceType::from_bits(CL_DEVICE_TYPE_GPU | CL_DEVICE_TYPE_DEFAULT),
            DeviceType::Gpu
        );
    }

    #[test]
    fn device_type_serializes_lowercase() {
        let json = serde_json::to_string(&DeviceType::Accelerator).unwrap();
        assert_eq!(json, "\"accelerator\"");
        assert_eq!(DeviceType::default(), DeviceType::All);
    }

    #[test]
    fn empty_listing_codes_mean_no_entries() {
        let none = Err(Error::api(Stage::Platform, "clGetPlatformIDs", CL_PLATFORM_NOT_FOUND_KHR));
        assert!(!found(none, CL_PLATFORM_NOT_FOUND_KHR).unwrap());
        assert!(found(Ok(()), CL_PLATFORM_NOT_FOUND_KHR).unwrap());

        let none = Err(Error::api(Stage::Device, "clGetDeviceIDs", CL_DEVICE_NOT_FOUND));
        assert!(!found(none, CL_DEVICE_NOT_FOUND).unwrap());

        let broken = Err(Error::api(Stage::Platform, "clGetPlatformIDs", -30));
        assert!(matches!(
            found(broken, CL_PLATFORM_NOT_FOUND_KHR),
            Err(Error::Api { code: -30, .. })
        ));
    }
}
