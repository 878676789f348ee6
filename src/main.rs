use flexi_logger::{FileSpec, Logger, WriteMode};
use log::{error, info, warn};
use protoga::param::{self, Param};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

fn main() -> ExitCode {
    let param_file = std::env::args().nth(1);

    let param = match param_file {
        Some(ref path) => match param::get(path) {
            Ok(param) => param,
            Err(e) => {
                eprintln!("Cannot load parameters from {}: {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => {
            let mut param = Param::default();
            if let Err(e) = param::validate(&mut param) {
                eprintln!("{}", e);
                return ExitCode::FAILURE;
            }
            param
        }
    };

    let logger = Logger::try_with_env_or_str(&param.general.log_level).and_then(|logger| {
        if param.general.log_base.is_empty() {
            logger.start()
        } else {
            logger
                .log_to_file(
                    FileSpec::default()
                        .basename(&param.general.log_base)
                        .suffix(&param.general.log_suffix),
                )
                .write_mode(WriteMode::BufferAndFlush)
                .duplicate_to_stderr(flexi_logger::Duplicate::Warn)
                .start()
        }
    });
    let _logger = match logger {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Cannot start logger: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match param_file {
        Some(path) => info!("Parameters loaded from {}", path),
        None => info!("No parameter file given, using defaults"),
    }

    let running = Arc::new(AtomicBool::new(true));
    match Signals::new([SIGINT, SIGTERM]) {
        Ok(mut signals) => {
            let flag = Arc::clone(&running);
            thread::spawn(move || {
                for signal in signals.forever() {
                    warn!("Received signal {}, finishing current generation...", signal);
                    flag.store(false, Ordering::Relaxed);
                }
            });
        }
        Err(e) => warn!("Signal handling unavailable: {}", e),
    }

    let experiment = match protoga::run(&param, running) {
        Ok(experiment) => experiment,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    protoga::cinfo!(param.general.display_colorful, "\n{}", experiment.display());

    if !param.general.save_exp.is_empty() {
        match experiment.save_auto(&param.general.save_exp) {
            Ok(()) => info!("Experiment saved to {}", param.general.save_exp),
            Err(e) => {
                error!("Cannot save experiment to {}: {}", param.general.save_exp, e);
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}
