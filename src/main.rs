//! Пример использования библиотеки: возведение вектора в квадрат на GPU

use anyhow::{Context, Result};
use oclgpu::{
    utils::{max_abs_diff, measure_time},
    Arg, Const, DeviceSelector, HostArg, Program,
};
use rand::Rng;

const VECTOR_LENGTH: usize = 1 << 20;

const SQUARE_KERNEL: &str = r#"
__kernel void square(
    __global const float* in,
    const unsigned int count,
    __global float* out)
{
    int i = get_global_id(0);
    if (i < count)
        out[i] = in[i] * in[i];
}
"#;

fn main() -> Result<()> {
    let selector = DeviceSelector::from_env().context("Неверная конфигурация устройства")?;

    println!("Возведение в квадрат вектора из {} элементов", VECTOR_LENGTH);
    println!(
        "Платформа {}, устройство {} (тип: {})",
        selector.platform, selector.device, selector.device_type
    );

    let mut rng = rand::thread_rng();
    let input: Vec<f32> = (0..VECTOR_LENGTH).map(|_| rng.gen_range(0.0..1.0)).collect();

    // Одноразовый запуск
    println!("\nОдноразовый запуск...");
    let (oneshot, oneshot_duration) = measure_time(|| {
        oclgpu::execute(
            SQUARE_KERNEL,
            "square",
            &selector,
            &[HostArg::from(&input), HostArg::from(input.len() as u32)],
        )
    });
    let oneshot = oneshot.context("Ошибка одноразового запуска")?;
    println!("Готово за {:?}", oneshot_duration);

    // Переиспользуемая программа
    println!("\nКомпиляция программы...");
    let program = Program::new(SQUARE_KERNEL, "square", &selector)
        .context("Ошибка при создании программы")?;
    let device_name = program.device().name().unwrap_or_else(|_| "неизвестно".into());
    println!("Устройство: {}", device_name);
    println!(
        "Размер рабочей группы: предпочтительный {}, максимум ядра {}, максимум устройства {}",
        program.preferred_work_group_size()?,
        program.max_work_group_size()?,
        program.device_work_group_size()?
    );

    let buffer = program.buffer_from_f32_slice(&input)?;
    let out = program.empty_f32(input.len())?;
    let length = Const::new(input.len());

    println!("Запуск ядра...");
    let (status, gpu_duration) = measure_time(|| {
        program.execute(&[input.len()], &[Arg::from(&buffer), Arg::from(length), Arg::from(&out)])
    });
    status.context("Ошибка при запуске ядра")?;
    let gpu = out.read_f32_vec().context("Ошибка при чтении результата")?;
    println!("GPU вычисления завершены за {:?}", gpu_duration);

    buffer.cleanup()?;
    out.cleanup()?;

    // CPU вычисления для сравнения
    let (cpu, cpu_duration) = measure_time(|| input.iter().map(|x| x * x).collect::<Vec<f32>>());

    let oneshot_diff = max_abs_diff(&oneshot, &cpu).unwrap_or(f32::INFINITY);
    let program_diff = max_abs_diff(&gpu, &cpu).unwrap_or(f32::INFINITY);

    println!("\nИтоговая статистика:");
    println!("Время выполнения на GPU: {:?}", gpu_duration);
    println!("Время выполнения на CPU: {:?}", cpu_duration);
    println!("Максимальное расхождение (одноразовый запуск): {}", oneshot_diff);
    println!("Максимальное расхождение (программа): {}", program_diff);
    println!(
        "Результаты GPU и CPU {}",
        if oneshot_diff <= 1e-6 && program_diff <= 1e-6 { "совпадают" } else { "различаются" }
    );

    Ok(())
}
