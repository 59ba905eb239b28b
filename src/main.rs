use std::os::fd::AsFd;

use clap::Parser;
use netping::args::Args;
use netping::session::{self, SessionState};
use netping::{reactor, report};
use tracing_subscriber::EnvFilter;

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            eprint!("{e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    std::process::exit(run(args));
}

fn run(args: Args) -> i32 {
    let count = args.count;
    let preload = args.preload_count();
    let timeout = args.timeout;

    let mut state = match SessionState::init(args) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("netping: {e:#}");
            return 1;
        }
    };

    let signal_read = match session::install_signal_handling() {
        Ok(fd) => fd,
        Err(e) => {
            eprintln!("netping: {e:#}");
            return 1;
        }
    };

    if let Some(count) = count {
        session::arm_alarm(count, preload, timeout);
    }

    report::print_opening(&state.args, &state.target);

    let disposition = reactor::run(&mut state, signal_read.as_fd());

    let code = match disposition {
        reactor::Disposition::Interrupted(signum) => {
            println!("Received signal {signum}, exiting...");
            report::print_summary(&state);
            0
        }
        reactor::Disposition::Alarm => {
            report::print_summary(&state);
            state.exit_code()
        }
        reactor::Disposition::Natural => {
            report::print_summary(&state);
            state.exit_code()
        }
    };

    // Teardown per spec §4.7: report already emitted above, drain the
    // in-flight table explicitly, then let `state` drop to close both
    // sockets exactly once.
    state.table.drain();
    code
}
