//! Human-readable print collaborator. All output here goes to stdout; the
//! rest of the crate logs to stderr via `tracing` instead.

use crate::args::Args;
use crate::codec::Family;
use crate::session::SessionState;

pub fn print_opening(args: &Args, target: &crate::resolve::ResolvedTarget) {
    match target.family {
        Family::V4 => {
            let total_with_ip = args.total_size() + 20;
            println!(
                "PING {} ({}) {}({}) bytes of data.",
                args.destination,
                target.addr_text,
                args.size,
                total_with_ip
            );
        }
        Family::V6 => {
            println!("PING {} ({}) {} data bytes", args.destination, target.addr_text, args.size);
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn print_reply(
    args: &Args,
    icmp_size: usize,
    addr_text: &str,
    sequence: u16,
    ttl: u8,
    identifier: u16,
    rtt_ms: Option<f64>,
) {
    match (args.verbose, rtt_ms) {
        (true, Some(rtt)) => println!(
            "{icmp_size} bytes from {addr_text}: icmp_seq={sequence} ident={identifier} ttl={ttl} time={rtt:.3} ms"
        ),
        (false, Some(rtt)) => {
            println!("{icmp_size} bytes from {addr_text}: icmp_seq={sequence} ttl={ttl} time={rtt:.3} ms")
        }
        (true, None) => {
            println!("{icmp_size} bytes from {addr_text}: icmp_seq={sequence} ident={identifier} ttl={ttl}")
        }
        (false, None) => println!("{icmp_size} bytes from {addr_text}: icmp_seq={sequence} ttl={ttl}"),
    }
}

pub fn print_error(addr_text: &str, sequence: u16, reason: &str) {
    println!("From {addr_text}: icmp_seq={sequence} {reason}");
}

pub fn print_summary(state: &SessionState) {
    let elapsed_ms = state.start_time.elapsed().as_secs_f64() * 1000.0;
    let transmitted = state.packets_sent;
    let received = state.packets_received;
    let loss_pct = if transmitted > 0 {
        (transmitted - received) as f64 / transmitted as f64 * 100.0
    } else {
        0.0
    };

    println!("\n--- {} ping statistics ---", state.args.destination);
    println!(
        "{} packets transmitted, {} received, {:.0}% packet loss, time {:.0}ms",
        transmitted, received, loss_pct, elapsed_ms
    );

    if state.rtt.count() > 0 {
        if let (Some(min), Some(avg), Some(max), Some(mdev)) =
            (state.rtt.min_ms(), state.rtt.avg_ms(), state.rtt.max_ms(), state.rtt.mdev_ms())
        {
            println!("rtt min/avg/max/mdev = {min:.3}/{avg:.3}/{max:.3}/{mdev:.3} ms");
        }
    }

    if state.errors > 0 {
        println!("{} errors", state.errors);
    }
}
