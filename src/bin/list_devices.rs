//! Список платформ и устройств OpenCL

use anyhow::{Context, Result};
use oclgpu::{DeviceType, Platform};
use prettytable::{row, Table};

fn main() -> Result<()> {
    let platforms = Platform::all().context("Не удалось получить список платформ")?;
    if platforms.is_empty() {
        println!("Платформы OpenCL не найдены");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_titles(row![
        "Платформа",
        "Устройство",
        "Имя",
        "Тип",
        "Выч. блоки",
        "Макс. группа",
        "Память, МБ"
    ]);

    for (p, platform) in platforms.iter().enumerate() {
        let platform_name = platform.name().unwrap_or_default();
        let version = platform.version().unwrap_or_default();
        println!("[{}] {} ({}, {})", p, platform_name, platform.vendor().unwrap_or_default(), version);

        for (d, device) in platform.devices(DeviceType::All)?.iter().enumerate() {
            table.add_row(row![
                format!("{} {}", p, platform_name),
                d,
                device.name()?,
                device.device_type()?,
                device.max_compute_units()?,
                device.max_work_group_size()?,
                device.global_mem_size()? / (1024 * 1024)
            ]);
        }
    }

    println!();
    table.printstd();
    Ok(())
}
