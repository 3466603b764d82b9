//! Модуль для работы с OpenCL
//!
//! Содержит низкоуровневые привязки и безопасные обертки для OpenCL

pub mod bindings;
pub mod callbacks;
pub mod context;
pub mod kernel;
pub mod memory;
pub mod types;
pub mod utils;

pub use context::{CommandQueue, Context};
pub use kernel::{Kernel, ProgramObject};
pub use memory::Mem;
