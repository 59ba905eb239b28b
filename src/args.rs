use clap::Parser;

/// Size of the ICMP/ICMPv6 echo header, independent of family.
pub const ECHO_HEADER_LEN: usize = 8;

#[derive(Parser, Debug, Clone)]
#[command(name = "netping")]
#[command(about = "Send ICMP/ICMPv6 echo requests to a destination and report loss and round-trip time")]
#[command(version)]
pub struct Args {
    /// Destination host name or numeric IPv4/IPv6 address
    pub destination: String,

    /// Verbose output (adds ident=<id> to reply lines)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Stop after sending this many probes
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u32).range(1..))]
    pub count: Option<u32>,

    /// Payload (data) size in bytes; total ICMP message size is this plus the echo header
    #[arg(short = 's', long, default_value_t = 56, value_parser = clap::value_parser!(u32).range(0..=65507))]
    pub size: u32,

    /// Burst this many packets at session start, ahead of the steady one-per-second pacing
    #[arg(short = 'l', long, value_parser = clap::value_parser!(u8).range(1..=3))]
    pub preload: Option<u8>,

    /// Per-probe timeout in seconds
    #[arg(short = 'W', long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=2_099_999))]
    pub timeout: u32,

    /// Outgoing TTL / hop limit
    #[arg(short = 't', long, default_value_t = 64, value_parser = clap::value_parser!(u16).range(1..=255))]
    pub ttl: u16,
}

impl Args {
    /// Total length of one ICMP message: the echo header plus the configured payload.
    pub fn total_size(&self) -> usize {
        self.size as usize + ECHO_HEADER_LEN
    }

    /// Preload count with the "no burst configured" default folded in.
    pub fn preload_count(&self) -> u8 {
        self.preload.unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_default_values() {
        let args = Args::try_parse_from(["netping", "example.com"]).unwrap();
        assert_eq!(args.destination, "example.com");
        assert_eq!(args.count, None);
        assert_eq!(args.size, 56);
        assert_eq!(args.preload, None);
        assert_eq!(args.timeout, 10);
        assert_eq!(args.ttl, 64);
        assert!(!args.verbose);
        assert_eq!(args.total_size(), 64);
        assert_eq!(args.preload_count(), 0);
    }

    #[test]
    fn test_args_custom_values() {
        let args = Args::try_parse_from([
            "netping",
            "--verbose",
            "--count",
            "20",
            "--size",
            "16",
            "--preload",
            "3",
            "--timeout",
            "5",
            "--ttl",
            "1",
            "198.51.100.1",
        ])
        .unwrap();

        assert_eq!(args.destination, "198.51.100.1");
        assert!(args.verbose);
        assert_eq!(args.count, Some(20));
        assert_eq!(args.size, 16);
        assert_eq!(args.preload, Some(3));
        assert_eq!(args.timeout, 5);
        assert_eq!(args.ttl, 1);
        assert_eq!(args.total_size(), 24);
    }

    #[test]
    fn test_args_short_flags() {
        let args = Args::try_parse_from([
            "netping", "-v", "-c", "15", "-s", "0", "-l", "2", "-W", "2", "-t", "32", "::1",
        ])
        .unwrap();

        assert_eq!(args.destination, "::1");
        assert!(args.verbose);
        assert_eq!(args.count, Some(15));
        assert_eq!(args.size, 0);
        assert_eq!(args.preload, Some(2));
        assert_eq!(args.timeout, 2);
        assert_eq!(args.ttl, 32);
        assert_eq!(args.total_size(), 8);
    }

    #[test]
    fn test_args_rejects_out_of_range_size() {
        let err = Args::try_parse_from(["netping", "-s", "65508", "example.com"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_args_rejects_zero_count() {
        let err = Args::try_parse_from(["netping", "-c", "0", "example.com"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_args_rejects_preload_above_three() {
        let err = Args::try_parse_from(["netping", "-l", "4", "example.com"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
