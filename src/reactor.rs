//! The outer loop: paces transmissions, polls both raw sockets and the
//! signal self-pipe, dispatches readable sockets to the receive path, and
//! expires timed-out entries. See spec §4.5 for the per-iteration contract.

use std::os::fd::{AsFd, BorrowedFd};
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};

use crate::codec::Family;
use crate::receive;
use crate::session::{self, SessionState};
use crate::table::ProbeEntry;

/// Why the reactor stopped.
#[derive(Debug)]
pub enum Disposition {
    /// Loop condition (¬transmission_complete ∨ table non-empty) went false.
    Natural,
    /// The session-wide alarm fired.
    Alarm,
    /// A terminating signal (INT/TERM/QUIT) arrived; carries its number for
    /// the "Received signal N, exiting..." message.
    Interrupted(i32),
}

pub fn run(state: &mut SessionState, signal_read: BorrowedFd<'_>) -> Disposition {
    loop {
        let now = Instant::now();

        if state.pacing.should_send(state.next_sequence as u32, state.args.count, now) {
            emit_probe(state, now);
        }

        if let Some(count) = state.args.count {
            if state.next_sequence as u32 > count {
                state.pacing.mark_transmission_complete();
            }
        }

        if state.pacing.transmission_complete() && state.table.is_empty() {
            return Disposition::Natural;
        }

        let timeout = state.pacing.poll_timeout(Instant::now());

        match poll_once(state, signal_read, timeout) {
            PollOutcome::Signal(sig) => {
                if sig == libc::SIGALRM {
                    return Disposition::Alarm;
                }
                return Disposition::Interrupted(sig);
            }
            PollOutcome::Readable(family) => {
                if let Err(e) = receive::process_one(state, family) {
                    tracing::warn!(error = %e, "recvfrom failed");
                }
            }
            PollOutcome::Timeout => {
                let expired = state.table.expire(Instant::now(), Duration::from_secs(state.args.timeout as u64));
                for ProbeEntry { sequence, .. } in expired {
                    tracing::debug!(seq = sequence, "probe timed out, counted as loss");
                }
            }
            PollOutcome::Interrupted => continue,
            PollOutcome::Fatal(e) => {
                tracing::warn!(error = %e, "poll failed");
                return Disposition::Natural;
            }
        }
    }
}

enum PollOutcome {
    Signal(i32),
    Readable(Family),
    Timeout,
    Interrupted,
    Fatal(Errno),
}

fn poll_once(state: &SessionState, signal_read: BorrowedFd<'_>, timeout: Duration) -> PollOutcome {
    let v4_fd = state.sockets.v4().as_fd();
    let v6_fd = state.sockets.v6().as_fd();

    let mut fds = [
        PollFd::new(v4_fd, PollFlags::POLLIN),
        PollFd::new(v6_fd, PollFlags::POLLIN),
        PollFd::new(signal_read, PollFlags::POLLIN),
    ];

    let millis = timeout.as_millis().min(u16::MAX as u128) as u16;
    match poll(&mut fds, PollTimeout::from(millis)) {
        Ok(0) => PollOutcome::Timeout,
        Ok(_) => {
            if readable(&fds[2]) {
                drain_self_pipe(signal_read);
                if let Some(sig) = session::take_pending_signal() {
                    return PollOutcome::Signal(sig);
                }
                // Woken spuriously; fall through to the data sockets.
            }
            if readable(&fds[0]) {
                return PollOutcome::Readable(Family::V4);
            }
            if readable(&fds[1]) {
                return PollOutcome::Readable(Family::V6);
            }
            PollOutcome::Timeout
        }
        Err(Errno::EINTR) => PollOutcome::Interrupted,
        Err(e) => PollOutcome::Fatal(e),
    }
}

fn readable(pfd: &PollFd) -> bool {
    pfd.revents().is_some_and(|r| r.contains(PollFlags::POLLIN))
}

fn drain_self_pipe(fd: BorrowedFd<'_>) {
    use std::os::fd::AsRawFd;
    let mut byte = [0u8; 1];
    loop {
        let n = unsafe { libc::read(fd.as_raw_fd(), byte.as_mut_ptr() as *mut libc::c_void, 1) };
        if n <= 0 {
            break;
        }
    }
}

fn emit_probe(state: &mut SessionState, now: Instant) {
    let seq = state.next_sequence;
    let family = state.target.family;
    let total_size = state.args.total_size();
    let bytes = crate::codec::build_echo_request(family, state.identifier, seq, total_size);

    if let Err(e) = state.table.insert(seq, bytes, now) {
        tracing::warn!(error = %e, seq, "not sending duplicate in-flight sequence");
        return;
    }

    let send_bytes = state.table.find(seq).expect("just inserted").bytes.clone();
    let dest = std::net::SocketAddr::new(state.target.ip, 0);

    match state.sockets.send_to(family, &send_bytes, dest) {
        Ok(n) if n == send_bytes.len() => {
            state.packets_sent += 1;
            state.pacing.record_send(now);
            state.advance_sequence();
            tracing::debug!(seq, family = ?family, "probe sent");
        }
        Ok(n) => {
            tracing::warn!(seq, sent = n, expected = send_bytes.len(), "sendto sent a short write");
            state.table.remove(seq);
        }
        Err(e) => {
            tracing::warn!(seq, error = %e, "sendto failed");
            state.table.remove(seq);
        }
    }
}
