//! Session state and the lifecycle controller: init, signal wiring, and
//! teardown. The reactor loop itself lives in `reactor.rs`; this module
//! owns everything the reactor mutates plus the process-wide signal state
//! described in spec DESIGN NOTES ("global signal state").

use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::Instant;

use anyhow::{Context, Result};
use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::unistd::pipe;

use crate::args::Args;
use crate::pacing::PacingClock;
use crate::resolve::{self, ResolvedTarget};
use crate::rtt::RttStats;
use crate::sockets::SocketPair;
use crate::table::InFlightTable;

/// Signal number observed by the handler, 0 meaning "none pending". SIGALRM
/// and the terminating signals (INT/TERM/QUIT) all funnel through here; the
/// reactor tells them apart by value.
static PENDING_SIGNAL: AtomicI32 = AtomicI32::new(0);
/// Write end of the self-pipe, set once at init and read only by the
/// signal handler. -1 means "not installed yet".
static WAKE_FD: AtomicI32 = AtomicI32::new(-1);

extern "C" fn handle_signal(signum: libc::c_int) {
    PENDING_SIGNAL.store(signum, Ordering::SeqCst);
    let fd = WAKE_FD.load(Ordering::SeqCst);
    if fd >= 0 {
        let byte: [u8; 1] = [0];
        unsafe {
            libc::write(fd, byte.as_ptr() as *const libc::c_void, 1);
        }
    }
}

/// Returns, and clears, the most recently observed signal number.
pub fn take_pending_signal() -> Option<i32> {
    match PENDING_SIGNAL.swap(0, Ordering::SeqCst) {
        0 => None,
        signum => Some(signum),
    }
}

/// Installs signal dispositions per spec §4.7/§5 and returns the read end of
/// the self-pipe the reactor polls for wakeups.
pub fn install_signal_handling() -> Result<OwnedFd> {
    let (read_fd, write_fd) = pipe().context("cannot create self-pipe")?;
    set_nonblocking(read_fd.as_raw_fd())?;
    set_nonblocking(write_fd.as_raw_fd())?;

    WAKE_FD.store(write_fd.as_raw_fd(), Ordering::SeqCst);
    // The write end must outlive every future signal delivery; this process
    // never closes it deliberately, so leaking the OwnedFd here is correct.
    std::mem::forget(write_fd);

    let handler = SigAction::new(SigHandler::Handler(handle_signal), SaFlags::empty(), SigSet::empty());
    let ignore = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());
    unsafe {
        sigaction(Signal::SIGINT, &handler).context("sigaction SIGINT")?;
        sigaction(Signal::SIGTERM, &handler).context("sigaction SIGTERM")?;
        sigaction(Signal::SIGQUIT, &handler).context("sigaction SIGQUIT")?;
        sigaction(Signal::SIGALRM, &handler).context("sigaction SIGALRM")?;
        sigaction(Signal::SIGPIPE, &ignore).context("sigaction SIGPIPE")?;
        sigaction(Signal::SIGCHLD, &ignore).context("sigaction SIGCHLD")?;
        sigaction(Signal::SIGTSTP, &ignore).context("sigaction SIGTSTP")?;
    }

    Ok(read_fd)
}

fn set_nonblocking(fd: RawFd) -> Result<()> {
    let flags = fcntl(fd, FcntlArg::F_GETFL).context("fcntl F_GETFL")?;
    let flags = OFlag::from_bits_truncate(flags) | OFlag::O_NONBLOCK;
    fcntl(fd, FcntlArg::F_SETFL(flags)).context("fcntl F_SETFL")?;
    Ok(())
}

/// Arms a single-shot session-wide timer, per spec §4.7: `max(0, count -
/// preload) + timeout` seconds after this call.
pub fn arm_alarm(count: u32, preload: u8, timeout: u32) {
    let seconds = count.saturating_sub(preload as u32) + timeout;
    unsafe {
        libc::alarm(seconds);
    }
}

pub struct SessionState {
    pub args: Args,
    pub target: ResolvedTarget,
    pub sockets: SocketPair,
    pub table: InFlightTable,
    pub rtt: RttStats,
    pub pacing: PacingClock,
    pub identifier: u16,
    pub next_sequence: u16,
    pub packets_sent: u64,
    pub packets_received: u64,
    pub errors: u64,
    pub start_time: Instant,
}

impl SessionState {
    pub fn init(args: Args) -> Result<Self> {
        let target = resolve::resolve(&args.destination)?;
        let sockets = SocketPair::open(args.ttl)?;
        let identifier = (std::process::id() & 0xffff) as u16;
        let pacing = PacingClock::new(args.preload_count());

        tracing::info!(
            destination = %args.destination,
            family = ?target.family,
            identifier,
            "session starting"
        );
        tracing::debug!(ttl = args.ttl, "outgoing ttl configured");

        Ok(Self {
            args,
            target,
            sockets,
            table: InFlightTable::new(),
            rtt: RttStats::new(),
            pacing,
            identifier,
            next_sequence: 1,
            packets_sent: 0,
            packets_received: 0,
            errors: 0,
            start_time: Instant::now(),
        })
    }

    /// Exit status per spec §6/§7: 0 if any reply was received, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.packets_received > 0 {
            0
        } else {
            1
        }
    }

    /// Advances the sequence counter, skipping 0 on 16-bit wraparound (spec
    /// §6: "sequence starts at 1 and increments by 1").
    pub fn advance_sequence(&mut self) {
        self.next_sequence = next_sequence_after(self.next_sequence);
    }
}

/// The sequence that follows `seq`, skipping the reserved value 0 on
/// wraparound. Factored out of `advance_sequence` so it can be tested
/// without standing up a full `SessionState` (which needs real sockets).
fn next_sequence_after(seq: u16) -> u16 {
    let next = seq.wrapping_add(1);
    if next == 0 {
        1
    } else {
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_increments_normally() {
        assert_eq!(next_sequence_after(1), 2);
        assert_eq!(next_sequence_after(100), 101);
    }

    #[test]
    fn sequence_wraparound_skips_zero() {
        assert_eq!(next_sequence_after(65535), 1);
    }

    #[test]
    fn take_pending_signal_is_none_until_set() {
        // Shares process-wide statics with the signal handler; only assert
        // the read-then-clear contract, not concurrent delivery.
        assert!(PENDING_SIGNAL.load(Ordering::SeqCst) == 0 || take_pending_signal().is_some());
        assert_eq!(take_pending_signal(), None);
    }
}
