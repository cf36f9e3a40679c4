use core::fmt;
use std::net::{IpAddr, Ipv4Addr};

use crate::{Error, RawId, Result, WORKER_LEN};

/// Masked fragment of a worker's IPv4 address.
///
/// The three low-order octets are each XORed with an operator-supplied mask
/// byte; the top octet is discarded. The masked bytes are embedded in every
/// ID the worker issues, and the mask is kept so this identity can reverse
/// them when decoding.
///
/// Masking is obfuscation only. It behaves like a stream cipher with a fixed
/// key: anyone holding two known addresses and their IDs can recover the mask.
///
/// # Example
///
/// ```
/// use esnowflake::WorkerIdentity;
///
/// let worker = WorkerIdentity::new("192.168.1.2", 1, 2, 3).unwrap();
/// assert_eq!(worker.masked(), [168 ^ 1, 1 ^ 2, 2 ^ 3]);
/// assert_eq!(worker.unmask(worker.masked()), [168, 1, 2]);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkerIdentity {
    masked: [u8; WORKER_LEN],
    mask: [u8; WORKER_LEN],
}

impl WorkerIdentity {
    /// Parses `ip` and masks its three low-order octets.
    ///
    /// Accepts dotted-quad IPv4 and IPv4-mapped IPv6 (`::ffff:a.b.c.d`).
    /// Surrounding whitespace is not stripped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] for anything else. No identity is
    /// produced in that case.
    pub fn new(ip: &str, mask1: u8, mask2: u8, mask3: u8) -> Result<Self> {
        let addr = match ip.parse::<IpAddr>() {
            Ok(IpAddr::V4(addr)) => Some(addr),
            Ok(IpAddr::V6(addr)) => addr.to_ipv4_mapped(),
            Err(_) => None,
        };
        let addr = addr.ok_or_else(|| Error::InvalidAddress {
            input: ip.to_owned(),
        })?;
        Ok(Self::from_addr(addr, [mask1, mask2, mask3]))
    }

    /// Masks an already-parsed address.
    pub fn from_addr(addr: Ipv4Addr, mask: [u8; WORKER_LEN]) -> Self {
        let [_, o1, o2, o3] = addr.octets();
        Self {
            masked: xor([o1, o2, o3], mask),
            mask,
        }
    }

    /// The masked bytes embedded at offsets 5-7 of every ID.
    pub const fn masked(&self) -> [u8; WORKER_LEN] {
        self.masked
    }

    /// The mask triple supplied at construction.
    pub const fn mask(&self) -> [u8; WORKER_LEN] {
        self.mask
    }

    /// Reverses the masking of bytes taken from an ID.
    ///
    /// Only IDs issued under the same mask triple unmask to meaningful
    /// octets.
    pub fn unmask(&self, masked: [u8; WORKER_LEN]) -> [u8; WORKER_LEN] {
        xor(masked, self.mask)
    }

    /// Renders the worker fragment of `id` as `xxx.B.C.D`.
    ///
    /// The top octet was never stored and is always shown as `xxx`.
    pub fn reveal(&self, id: &RawId) -> String {
        let [o1, o2, o3] = self.unmask(id.masked_worker());
        format!("xxx.{o1}.{o2}.{o3}")
    }
}

fn xor(bytes: [u8; WORKER_LEN], mask: [u8; WORKER_LEN]) -> [u8; WORKER_LEN] {
    [bytes[0] ^ mask[0], bytes[1] ^ mask[1], bytes[2] ^ mask[2]]
}

impl fmt::Debug for WorkerIdentity {
    // The mask is a per-deployment secret; keep it out of logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerIdentity")
            .field("masked", &self.masked)
            .finish_non_exhaustive()
    }
}
