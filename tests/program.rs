#[macro_use]
mod common;

use oclgpu::{Arg, Const, Error, Program, Stage};

#[test]
fn compile_error_carries_build_log() {
    let selector = require_device!();
    let err = Program::new("__kernel void broken( {", "broken", &selector).unwrap_err();
    assert!(matches!(err, Error::Build { .. }));
    assert_eq!(err.stage(), Some(Stage::Compile));
}

#[test]
fn unknown_kernel_name_fails_resolution() {
    let selector = require_device!();
    let err = Program::new(common::SQUARE, "cube", &selector).unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Kernel));
}

#[test]
fn argument_count_is_checked() {
    let selector = require_device!();
    let program = Program::new(common::SQUARE, "square", &selector).unwrap();
    let input = program.buffer_from_f32_slice(&[1.0, 2.0]).unwrap();

    let err = program.execute(&[2], &[Arg::from(&input)]).unwrap_err();
    assert!(matches!(
        err,
        Error::ArgumentCount {
            expected: 3,
            actual: 1,
            ..
        }
    ));
}

#[test]
fn buffers_of_another_program_are_rejected() {
    let selector = require_device!();
    let first = Program::new(common::SQUARE, "square", &selector).unwrap();
    let second = Program::new(common::SQUARE, "square", &selector).unwrap();

    let input = first.buffer_from_f32_slice(&[1.0, 2.0]).unwrap();
    let out = second.empty_f32(2).unwrap();
    let err = second
        .execute(&[2], &[Arg::from(&input), Arg::from(Const::new(2u32)), Arg::from(&out)])
        .unwrap_err();
    assert!(matches!(err, Error::ForeignBuffer(0)));
}

#[test]
fn read_into_checks_destination_size() {
    let selector = require_device!();
    let program = Program::new(common::SQUARE, "square", &selector).unwrap();
    let buffer = program.buffer_from_f32_slice(&[1.0, 2.0, 3.0]).unwrap();

    let mut short = [0.0f32; 2];
    assert!(matches!(
        buffer.read_into(&mut short),
        Err(Error::SizeMismatch {
            expected: 12,
            actual: 8
        })
    ));
    assert!(matches!(buffer.read_image(), Err(Error::WrongExtent { .. })));
}

#[test]
fn explicit_local_size_covers_whole_range() {
    let selector = require_device!();
    let program = Program::new(common::SQUARE, "square", &selector).unwrap();
    let data: Vec<f32> = (0..100).map(|i| i as f32).collect();
    let input = program.buffer_from_f32_slice(&data).unwrap();
    let out = program.empty_f32(data.len()).unwrap();

    program
        .execute_with_local(
            &[data.len()],
            &[1],
            &[Arg::from(&input), Arg::from(Const::new(data.len())), Arg::from(&out)],
        )
        .unwrap();
    let expected: Vec<f32> = data.iter().map(|x| x * x).collect();
    common::assert_close(&out.read_f32_vec().unwrap(), &expected);
}

#[test]
fn work_group_queries() {
    let selector = require_device!();
    let program = Program::new(common::SQUARE, "square", &selector).unwrap();

    let preferred = program.preferred_work_group_size().unwrap();
    let kernel_max = program.max_work_group_size().unwrap();
    let device_max = program.device_work_group_size().unwrap();
    assert!(preferred >= 1);
    assert!(kernel_max >= 1 && kernel_max <= device_max);
    assert_eq!(program.kernel_name(), "square");
    assert!(!program.device().name().unwrap().is_empty());
    assert!(program.build_log().is_ok());
}
