//! Выбор платформы и устройства

use crate::device::{Device, DeviceType, Platform};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

pub const ENV_PLATFORM: &str = "OCLGPU_PLATFORM";
pub const ENV_DEVICE: &str = "OCLGPU_DEVICE";
pub const ENV_DEVICE_TYPE: &str = "OCLGPU_DEVICE_TYPE";

/// Позиция устройства в порядке перечисления драйверов.
///
/// Индексы не стабильны между машинами.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSelector {
    pub platform: usize,
    pub device: usize,
    pub device_type: DeviceType,
}

impl DeviceSelector {
    pub fn new(platform: usize, device: usize) -> Self {
        Self {
            platform,
            device,
            device_type: DeviceType::All,
        }
    }

    pub fn with_device_type(mut self, device_type: DeviceType) -> Self {
        self.device_type = device_type;
        self
    }

    /// Читает `OCLGPU_PLATFORM`, `OCLGPU_DEVICE` и `OCLGPU_DEVICE_TYPE`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Как [`DeviceSelector::from_env`], но с произвольным источником переменных
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut selector = Self::default();
        if let Some(value) = lookup(ENV_PLATFORM) {
            selector.platform = parse_index(ENV_PLATFORM, &value)?;
        }
        if let Some(value) = lookup(ENV_DEVICE) {
            selector.device = parse_index(ENV_DEVICE, &value)?;
        }
        if let Some(value) = lookup(ENV_DEVICE_TYPE) {
            selector.device_type = value.parse()?;
        }
        Ok(selector)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Находит платформу и устройство по индексам
    pub fn resolve(&self) -> Result<(Platform, Device)> {
        let platform = Platform::get(self.platform)?;
        let devices = platform.devices(self.device_type)?;
        let device = devices.get(self.device).copied().ok_or(Error::DeviceNotFound {
            index: self.device,
            available: devices.len(),
            kind: self.device_type,
        })?;
        Ok((platform, device))
    }
}

fn parse_index(key: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{key} must be a non-negative integer, got `{value}`")))
}
