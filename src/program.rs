//! Программа с одним ядром, привязанная к одному устройству

use crate::config::DeviceSelector;
use crate::constant::Arg;
use crate::device::Device;
use crate::error::{Error, Result, Stage};
use crate::opencl::types::cl_mem;
use crate::opencl::{CommandQueue, Context, Kernel, ProgramObject};
use crate::work_size::WorkSize;
use std::ffi::c_void;
use std::ptr;

/// Скомпилированное ядро вместе с контекстом и очередью.
///
/// Все нативные объекты освобождаются при удалении программы. Буферы,
/// созданные программой, заимствуют ее и не могут ее пережить.
#[derive(Debug)]
pub struct Program {
    // Порядок полей задает порядок освобождения: ядро, программа, очередь, контекст
    kernel: Kernel,
    program: ProgramObject,
    queue: CommandQueue,
    context: Context,
    device: Device,
    kernel_name: String,
}

impl Program {
    /// Находит устройство, создает контекст, компилирует исходник, создает
    /// очередь и ядро. Ошибка любого шага прерывает создание.
    pub fn new(source: &str, kernel_name: &str, selector: &DeviceSelector) -> Result<Self> {
        let (_, device) = selector.resolve()?;
        log::debug!(
            "selected platform {} device {} ({}) for kernel `{}`",
            selector.platform,
            selector.device,
            device.name().unwrap_or_else(|_| "unknown".into()),
            kernel_name
        );

        let context = Context::for_device(&device)?;

        let program = ProgramObject::with_source(&context, source)?;
        program.build(&device)?;
        log::debug!("built program for kernel `{}`", kernel_name);

        let queue = CommandQueue::new(&context, &device)?;
        let kernel = Kernel::new(&program, kernel_name)?;

        Ok(Self {
            kernel,
            program,
            queue,
            context,
            device,
            kernel_name: kernel_name.to_string(),
        })
    }

    /// Запускает ядро над `global` (`[length]` для массива, `[width, height]`
    /// для изображения) с локальным размером из предпочтительной кратности ядра.
    pub fn execute(&self, global: &[usize], args: &[Arg<'_>]) -> Result<()> {
        let preferred = self.preferred_work_group_size()?;
        let work = WorkSize::from_preferred(global, preferred)?;
        self.dispatch(&work, args)
    }

    /// Запускает ядро с явным локальным размером; `global` не округляется.
    ///
    /// До OpenCL 2.0 каждое измерение `global` должно делиться на `local`.
    pub fn execute_with_local(&self, global: &[usize], local: &[usize], args: &[Arg<'_>]) -> Result<()> {
        let work = WorkSize::explicit(global, local)?;
        self.dispatch(&work, args)
    }

    /// Привязывает аргументы по порядку, ставит ядро в очередь и ждет завершения
    pub fn dispatch(&self, work: &WorkSize, args: &[Arg<'_>]) -> Result<()> {
        let expected = self.kernel.num_args()?;
        if expected != args.len() {
            return Err(Error::ArgumentCount {
                kernel: self.kernel_name.clone(),
                expected,
                actual: args.len(),
            });
        }

        for (index, arg) in args.iter().enumerate() {
            self.bind(index, arg)?;
        }

        log::debug!(
            "dispatching `{}` global={:?} local={:?}",
            self.kernel_name,
            work.global(),
            work.local()
        );
        cl_check!(Stage::Dispatch, clEnqueueNDRangeKernel(
            self.queue.raw(),
            self.kernel.raw(),
            work.dimensions() as u32,
            ptr::null(),
            work.global().as_ptr(),
            work.local().as_ptr(),
            0,
            ptr::null(),
            ptr::null_mut()
        ))?;
        self.queue.finish()
    }

    fn bind(&self, index: usize, arg: &Arg<'_>) -> Result<()> {
        match arg {
            Arg::Buffer(buffer) => {
                if !buffer.belongs_to(self) {
                    return Err(Error::ForeignBuffer(index));
                }
                let mem: cl_mem = buffer.mem().raw();
                unsafe {
                    self.kernel.set_arg(
                        index as u32,
                        std::mem::size_of::<cl_mem>(),
                        &mem as *const cl_mem as *const c_void,
                    )
                }
            }
            Arg::Const(value) => {
                let bytes = value.value().to_ne_bytes();
                unsafe {
                    self.kernel.set_arg(
                        index as u32,
                        bytes.len(),
                        bytes.as_ptr() as *const c_void,
                    )
                }
            }
        }
    }

    /// Предпочтительная кратность размера рабочей группы ядра
    pub fn preferred_work_group_size(&self) -> Result<usize> {
        self.kernel.preferred_work_group_size_multiple(&self.device)
    }

    /// Максимальный размер рабочей группы для ядра на этом устройстве
    pub fn max_work_group_size(&self) -> Result<usize> {
        self.kernel.work_group_size(&self.device)
    }

    /// Максимальный размер рабочей группы устройства
    pub fn device_work_group_size(&self) -> Result<usize> {
        self.device.max_work_group_size()
    }

    /// Лог компилятора (предупреждения) для устройства программы
    pub fn build_log(&self) -> Result<String> {
        self.program.build_log(&self.device)
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn kernel_name(&self) -> &str {
        &self.kernel_name
    }

    pub(crate) fn context(&self) -> &Context {
        &self.context
    }

    pub(crate) fn queue(&self) -> &CommandQueue {
        &self.queue
    }
}
