/// Custom epoch: Saturday, January 1, 2022 00:00:00 UTC
///
/// A 40-bit millisecond delta from this origin lasts about 34 years (until
/// 2056). Timestamps past that point wrap; this is not checked at runtime.
pub const EPOCH_MS: u64 = 1_640_995_200_000;

/// Bits below the timestamp in the leading 64-bit word, occupied by the masked
/// worker identity.
pub const WORKER_INFO_BITS: u32 = 24;

/// Width of the per-worker sequence counter.
pub const SEQUENCE_BITS: u32 = 16;

/// Largest sequence value before the counter wraps to zero.
pub const SEQUENCE_MASK: u16 = u16::MAX;

/// Size of a decoded identifier in bytes.
pub const ID_SIZE: usize = 16;

/// Length of an encoded identifier: 16 bytes as unpadded base64.
pub const ENCODED_LEN: usize = 22;

/// Bytes occupied by the timestamp delta (the top 40 bits of a `u64`).
pub const TIMESTAMP_LEN: usize = 5;

/// Bytes occupied by the masked worker identity.
pub const WORKER_LEN: usize = 3;

/// Random bytes in a pure-random tail.
pub const RANDOM_TAIL_LEN: usize = 8;

/// Random bytes in a sequence tail; the remaining 2 bytes hold the sequence.
pub const SEQUENCE_RANDOM_LEN: usize = 6;

pub(crate) const WORKER_OFFSET: usize = TIMESTAMP_LEN;
pub(crate) const TAIL_OFFSET: usize = WORKER_OFFSET + WORKER_LEN;
pub(crate) const SEQUENCE_OFFSET: usize = TAIL_OFFSET + SEQUENCE_RANDOM_LEN;

const _: () = assert!(TAIL_OFFSET + RANDOM_TAIL_LEN == ID_SIZE);
const _: () = assert!(SEQUENCE_OFFSET + (SEQUENCE_BITS as usize / 8) == ID_SIZE);
const _: () = assert!(WORKER_INFO_BITS as usize == WORKER_LEN * 8);
