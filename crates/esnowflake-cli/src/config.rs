use std::net::Ipv4Addr;
use std::num::NonZeroUsize;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use esnowflake::{ClockPolicy, GeneratorOptions, MAX_POOL_CHUNKS, WorkerIdentity};

/// Runtime configuration for the `esnowflake` binary.
///
/// Worker identity and generator tunables are parsed from CLI arguments or
/// environment variables (a `.env` file is loaded first), so the same binary
/// can be dropped into a pod spec with `WORKER_IP` wired to the pod IP.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "esnowflake",
    version,
    about = "Generate and decode time-sortable, worker-tagged IDs"
)]
pub struct CliArgs {
    /// IPv4 address of this worker; its low three octets are embedded
    /// (masked) in every ID.
    ///
    /// Required for `generate`. `decode` only needs the mask.
    ///
    /// Environment variable: `WORKER_IP`
    #[arg(long, env = "WORKER_IP")]
    pub worker_ip: Option<String>,

    /// Three comma-separated mask bytes XORed into the address octets.
    ///
    /// Must match between the workers issuing IDs and whoever decodes them.
    ///
    /// Environment variable: `WORKER_MASK`
    #[arg(long, env = "WORKER_MASK", value_delimiter = ',', default_value = "0,0,0")]
    pub mask: Vec<u8>,

    /// IDs served per random-pool refill, between 1 and 1048576.
    ///
    /// Environment variable: `POOL_CHUNKS`
    #[arg(long, env = "POOL_CHUNKS", default_value_t = 64)]
    pub pool_chunks: usize,

    /// What sequence generation does when the clock steps backwards.
    ///
    /// Environment variable: `CLOCK_POLICY`
    #[arg(long, env = "CLOCK_POLICY", value_enum, default_value_t = ClockPolicyArg::Accept)]
    pub clock_policy: ClockPolicyArg,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Generate IDs and print one per line.
    Generate {
        /// Tail layout of the generated IDs.
        #[arg(long, value_enum, default_value_t = Mode::Random)]
        mode: Mode,

        /// Number of IDs to generate.
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,

        /// Threads sharing one generator. `0` uses every available CPU.
        #[arg(short, long, default_value_t = 1)]
        threads: usize,
    },
    /// Print the generation time and worker address of each ID.
    Decode {
        /// Encoded IDs (22-char URL-safe base64).
        #[arg(required = true)]
        ids: Vec<String>,

        /// Render times in the local time zone instead of UTC.
        #[arg(long, default_value_t = false)]
        local: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// 64 random bits after the worker identity.
    Random,
    /// 48 random bits plus a 16-bit per-millisecond sequence.
    Sequence,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockPolicyArg {
    Accept,
    Stall,
    Reject,
}

impl From<ClockPolicyArg> for ClockPolicy {
    fn from(arg: ClockPolicyArg) -> Self {
        match arg {
            ClockPolicyArg::Accept => ClockPolicy::Accept,
            ClockPolicyArg::Stall => ClockPolicy::Stall,
            ClockPolicyArg::Reject => ClockPolicy::Reject,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub identity: WorkerIdentity,
    pub options: GeneratorOptions,
    pub command: Command,
}

impl TryFrom<CliArgs> for CliConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let mask: [u8; 3] = match args.mask.as_slice() {
            &[m1, m2, m3] => [m1, m2, m3],
            other => bail!("WORKER_MASK needs exactly 3 bytes, got {}", other.len()),
        };

        let Some(pool_chunks) = NonZeroUsize::new(args.pool_chunks) else {
            bail!("POOL_CHUNKS must be greater than 0");
        };
        if pool_chunks > MAX_POOL_CHUNKS {
            bail!("POOL_CHUNKS must be at most {MAX_POOL_CHUNKS}");
        }

        let identity = match (&args.command, args.worker_ip.as_deref()) {
            (_, Some(ip)) => {
                WorkerIdentity::new(ip, mask[0], mask[1], mask[2]).context("WORKER_IP")?
            }
            // Decoding only reverses the mask; the address itself is unused.
            (Command::Decode { .. }, None) => WorkerIdentity::from_addr(Ipv4Addr::UNSPECIFIED, mask),
            (Command::Generate { .. }, None) => bail!("WORKER_IP is required to generate IDs"),
        };

        let command = match args.command {
            Command::Generate {
                mode,
                count,
                threads: 0,
            } => Command::Generate {
                mode,
                count,
                threads: num_cpus::get(),
            },
            command => command,
        };

        Ok(Self {
            identity,
            options: GeneratorOptions::default()
                .with_pool_chunks(pool_chunks)
                .with_clock_policy(args.clock_policy.into()),
            command,
        })
    }
}
