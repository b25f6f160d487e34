//! Process entry: wires the stock board, loads a kernel image, runs the
//! power loop on a worker thread, and prints what the pin header
//! received on the UART track.
//!
//! Usage: `riscboard [kernel.elf] [run-millis]`

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use board_core::demo::{self, DemoBoard};
use board_core::devices::BoardDevice;
use board_core::draw::{Frame, InputState};
use board_core::loader;

const DEFAULT_RUN_MILLIS: u64 = 500;

fn main() -> ExitCode {
    env_logger::init();

    let kernel = env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from("kernel.elf"), PathBuf::from);
    let run_millis = env::args()
        .nth(2)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(DEFAULT_RUN_MILLIS);

    let DemoBoard {
        mut board,
        cpu,
        uart_header,
        ..
    } = demo::demo_board();

    let BoardDevice::Cpu(device) = board.device_mut(cpu) else {
        log::error!("demo board is missing its CPU");
        return ExitCode::FAILURE;
    };
    if let Err(err) = loader::load_elf(device.address_space_mut(), &kernel) {
        log::error!("cannot load {}: {err}", kernel.display());
        return ExitCode::FAILURE;
    }

    // The sweep loop runs on a worker so the board stays observable; the
    // switch cuts power cooperatively from this thread.
    let switch = board.power_switch();
    let worker = thread::spawn(move || {
        let outcome = board.power_up();
        (board, outcome)
    });

    thread::sleep(Duration::from_millis(run_millis));
    switch.power_down();

    let Ok((mut board, outcome)) = worker.join() else {
        log::error!("board worker panicked");
        return ExitCode::FAILURE;
    };
    log::info!("power loop finished: {outcome:?}");

    // Drain the console header the way the presentation layer would:
    // one byte per track per frame.
    let mut transcript = String::new();
    loop {
        let mut frame = Frame::new(InputState::default());
        board.draw(&mut frame);

        let BoardDevice::PinHeader(header) = board.device(uart_header) else {
            break;
        };
        let received = header.received(demo::UART_TRACK).unwrap_or("");
        if received.len() == transcript.len() {
            break;
        }
        transcript = received.to_owned();
    }

    if !transcript.is_empty() {
        println!("{transcript}");
    }
    ExitCode::SUCCESS
}
