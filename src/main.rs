use clap::Parser;
use log::{error, warn};
use std::process::ExitCode;

use uart_shell::config::Args;
use uart_shell::session::DeviceSession;
use uart_shell::shutdown::ShutdownSignal;
use uart_shell::term::{RawMode, StdinKeys};

fn main() -> ExitCode {
    env_logger::init();
    // bad arguments and a missing device end the process before any thread starts
    let args = Args::parse();

    let session = match DeviceSession::open(&args.port_settings(), args.session_options()) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    println!(
        "success to open {} serial port with baudrate {}.",
        args.device, args.baud
    );

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };
    runtime.block_on(run(session))
}

async fn run(session: DeviceSession) -> ExitCode {
    // handlers go in before raw mode, Ctrl-C must never find the default action
    let mut signals = match ShutdownSignal::install() {
        Ok(signals) => Some(signals),
        Err(e) => {
            error!("Failed to install signal handlers: {}", e);
            None
        }
    };

    let raw_mode = match RawMode::enable() {
        Ok(guard) => Some(guard),
        Err(e) => {
            warn!("{}, keeping line-buffered input", e);
            None
        }
    };

    let shutdown = session.shutdown_handle();
    let mut task = tokio::task::spawn_blocking(move || session.run(StdinKeys::new()));
    let signalled = async {
        match signals.as_mut() {
            Some(signals) => signals.recv().await,
            None => std::future::pending().await,
        }
    };
    let result = tokio::select! {
        result = &mut task => result,
        _ = signalled => {
            shutdown.trigger();
            task.await
        }
    };
    drop(raw_mode);

    match result {
        Ok(Ok(())) => {
            println!("successfully terminated");
            ExitCode::SUCCESS
        }
        Ok(Err(e)) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("session task failed: {}", e);
            eprintln!("session task failed: {e}");
            ExitCode::FAILURE
        }
    }
}
