//! The receive path: one datagram in, at most one table mutation and one
//! printed line out. Never blocks; `EAGAIN`/`EWOULDBLOCK` is the normal
//! "nothing to read yet" outcome and is not an error here.

use std::mem::MaybeUninit;
use std::time::SystemTime;

use crate::codec::{self, Classification, Family};
use crate::report;
use crate::session::SessionState;

const RECV_BUF_LEN: usize = 2048;

pub fn process_one(state: &mut SessionState, family: Family) -> std::io::Result<()> {
    let mut buf = [MaybeUninit::<u8>::uninit(); RECV_BUF_LEN];
    let socket = state.sockets.for_family(family);
    let (len, from) = match socket.recv_from(&mut buf) {
        Ok(pair) => pair,
        Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => return Ok(()),
        Err(e) => return Err(e),
    };

    let mut received = vec![0u8; len];
    for (dst, src) in received.iter_mut().zip(buf[..len].iter()) {
        *dst = unsafe { src.assume_init() };
    }

    let addr_text = from
        .as_socket()
        .map(|sock_addr| sock_addr.ip().to_string())
        .unwrap_or_else(|| "?".to_string());

    match codec::decode(family, &received) {
        Some(Classification::Reply(view)) => {
            if view.identifier != state.identifier {
                tracing::debug!(seq = view.sequence, "dropping reply with foreign identifier");
                return Ok(());
            }
            let Some(entry) = state.table.find(view.sequence) else {
                tracing::debug!(seq = view.sequence, "dropping reply for unknown/stray sequence");
                return Ok(());
            };
            let _ = entry;

            let rtt_ms = codec::rtt_from_payload(view.payload, SystemTime::now());
            if let Some(rtt) = rtt_ms {
                state.rtt.record(rtt);
            }

            let icmp_size = crate::args::ECHO_HEADER_LEN + view.payload.len();
            report::print_reply(
                &state.args,
                icmp_size,
                &addr_text,
                view.sequence,
                view.ttl,
                state.identifier,
                rtt_ms,
            );

            state.table.remove(view.sequence);
            state.packets_received += 1;
            tracing::debug!(seq = view.sequence, rtt_ms, "reply matched");
        }
        Some(Classification::Error(view)) => {
            if view.embedded_identifier != state.identifier {
                tracing::debug!("dropping error notification with foreign embedded identifier");
                return Ok(());
            }
            if state.table.find(view.embedded_sequence).is_some() {
                report::print_error(&addr_text, view.embedded_sequence, view.reason.message());
                state.table.remove(view.embedded_sequence);
                state.errors += 1;
                tracing::debug!(seq = view.embedded_sequence, reason = ?view.reason, "error notification matched");
            } else {
                tracing::debug!(seq = view.embedded_sequence, "dropping error for unknown sequence");
            }
        }
        Some(Classification::Other) | None => {
            tracing::debug!("dropping unrecognized or malformed datagram");
        }
    }

    Ok(())
}
