use core::{fmt, str::FromStr};

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};

use crate::{
    DecodeError, ENCODED_LEN, EPOCH_MS, ID_SIZE, RANDOM_TAIL_LEN, SEQUENCE_RANDOM_LEN,
    WORKER_INFO_BITS, WORKER_LEN,
    id::layout::{SEQUENCE_OFFSET, TAIL_OFFSET, TIMESTAMP_LEN, WORKER_OFFSET},
};

/// A decoded 16-byte identifier.
///
/// ```text
///  0               5         8                                  16
///  +---------------+---------+-----------------------------------+
///  | ts delta (40) | wkr (24)| random (64) | random (48) + seq (16)
///  +---------------+---------+-----------------------------------+
/// ```
///
/// - Bytes 0-4: `(unix_ms - EPOCH_MS) << 24`, big-endian, top 5 bytes
/// - Bytes 5-7: masked worker identity
/// - Bytes 8-15: either 8 random bytes, or 6 random bytes followed by a
///   big-endian `u16` sequence
///
/// The textual form is unpadded URL-safe base64, always [`ENCODED_LEN`]
/// characters. Raw byte order sorts by time; the base64 alphabet is not
/// ASCII-ordered, so encoded strings do not.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawId([u8; ID_SIZE]);

impl RawId {
    /// Wraps a raw 16-byte record.
    pub const fn from_bytes(bytes: [u8; ID_SIZE]) -> Self {
        Self(bytes)
    }

    /// The raw 16-byte record.
    pub const fn as_bytes(&self) -> &[u8; ID_SIZE] {
        &self.0
    }

    /// Consumes the ID and returns the raw record.
    pub const fn into_bytes(self) -> [u8; ID_SIZE] {
        self.0
    }

    /// Builds an ID with a pure-random tail.
    pub fn with_random_tail(
        unix_ms: u64,
        worker: [u8; WORKER_LEN],
        random: &[u8; RANDOM_TAIL_LEN],
    ) -> Self {
        let mut buf = Self::header(unix_ms, worker);
        buf[TAIL_OFFSET..].copy_from_slice(random);
        Self(buf)
    }

    /// Builds an ID with a random + sequence tail.
    pub fn with_sequence_tail(
        unix_ms: u64,
        worker: [u8; WORKER_LEN],
        random: &[u8; SEQUENCE_RANDOM_LEN],
        sequence: u16,
    ) -> Self {
        let mut buf = Self::header(unix_ms, worker);
        buf[TAIL_OFFSET..SEQUENCE_OFFSET].copy_from_slice(random);
        buf[SEQUENCE_OFFSET..].copy_from_slice(&sequence.to_be_bytes());
        Self(buf)
    }

    fn header(unix_ms: u64, worker: [u8; WORKER_LEN]) -> [u8; ID_SIZE] {
        let mut buf = [0; ID_SIZE];
        // Bits above 40 are shifted out; the delta wraps rather than panics.
        let packed = unix_ms.wrapping_sub(EPOCH_MS) << WORKER_INFO_BITS;
        buf[..TIMESTAMP_LEN].copy_from_slice(&packed.to_be_bytes()[..TIMESTAMP_LEN]);
        buf[WORKER_OFFSET..TAIL_OFFSET].copy_from_slice(&worker);
        buf
    }

    /// Milliseconds since [`EPOCH_MS`].
    ///
    /// The leading 8 bytes are read as a signed big-endian word and
    /// arithmetically shifted, so a delta with bit 39 set decodes as negative.
    pub fn timestamp_delta(&self) -> i64 {
        let mut word = [0; 8];
        word.copy_from_slice(&self.0[..8]);
        i64::from_be_bytes(word) >> WORKER_INFO_BITS
    }

    /// Milliseconds since the Unix epoch.
    #[allow(clippy::cast_possible_wrap)]
    pub fn unix_millis(&self) -> i64 {
        self.timestamp_delta() + EPOCH_MS as i64
    }

    /// The embedded time, truncated to whole seconds.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::TimestampOutOfRange`] if the time cannot be
    /// represented by `chrono`.
    pub fn datetime(&self) -> Result<DateTime<Utc>, DecodeError> {
        let millis = self.unix_millis();
        DateTime::from_timestamp(millis.div_euclid(1000), 0)
            .ok_or(DecodeError::TimestampOutOfRange { millis })
    }

    /// The masked worker identity bytes.
    pub fn masked_worker(&self) -> [u8; WORKER_LEN] {
        let mut worker = [0; WORKER_LEN];
        worker.copy_from_slice(&self.0[WORKER_OFFSET..TAIL_OFFSET]);
        worker
    }

    /// The 8-byte uniqueness tail.
    pub fn tail(&self) -> [u8; RANDOM_TAIL_LEN] {
        let mut tail = [0; RANDOM_TAIL_LEN];
        tail.copy_from_slice(&self.0[TAIL_OFFSET..]);
        tail
    }

    /// The sequence counter from the last two bytes.
    ///
    /// Only meaningful for IDs produced by the sequence variant; for
    /// pure-random IDs this is just random data.
    pub fn sequence(&self) -> u16 {
        u16::from_be_bytes([self.0[SEQUENCE_OFFSET], self.0[SEQUENCE_OFFSET + 1]])
    }

    /// Renders the ID as unpadded URL-safe base64.
    pub fn encode(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.0)
    }

    /// Parses an ID produced by [`RawId::encode`].
    ///
    /// This is a structural decode only: there is no checksum, so any 22-char
    /// string of the right alphabet is accepted.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::InvalidLength`] if the input is not 22 characters
    /// - [`DecodeError::InvalidBase64`] if it contains characters outside the
    ///   URL-safe alphabet or non-canonical trailing bits
    pub fn decode(s: &str) -> Result<Self, DecodeError> {
        if s.len() != ENCODED_LEN {
            return Err(DecodeError::InvalidLength { len: s.len() });
        }
        let bytes = URL_SAFE_NO_PAD
            .decode(s)
            .map_err(|e| DecodeError::InvalidBase64 {
                reason: e.to_string(),
            })?;
        let bytes: [u8; ID_SIZE] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| DecodeError::InvalidLength { len: bytes.len() })?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl fmt::Debug for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawId")
            .field("unix_millis", &self.unix_millis())
            .field("masked_worker", &self.masked_worker())
            .field("tail", &self.tail())
            .finish()
    }
}

impl FromStr for RawId {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl From<[u8; ID_SIZE]> for RawId {
    fn from(bytes: [u8; ID_SIZE]) -> Self {
        Self(bytes)
    }
}

impl From<RawId> for [u8; ID_SIZE] {
    fn from(id: RawId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORKER: [u8; 3] = [169, 3, 1];

    #[test]
    fn header_packs_delta_into_top_five_bytes() {
        let id = RawId::with_random_tail(EPOCH_MS + 0x01_0203_0405, WORKER, &[0xAA; 8]);
        assert_eq!(
            id.as_bytes(),
            &[1, 2, 3, 4, 5, 169, 3, 1, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA]
        );
        assert_eq!(id.timestamp_delta(), 0x01_0203_0405);
        assert_eq!(id.unix_millis(), (EPOCH_MS + 0x01_0203_0405) as i64);
        assert_eq!(id.masked_worker(), WORKER);
    }

    #[test]
    fn sequence_tail_is_big_endian() {
        let id = RawId::with_sequence_tail(EPOCH_MS + 42, WORKER, &[7; 6], 0x1234);
        assert_eq!(&id.as_bytes()[8..], &[7, 7, 7, 7, 7, 7, 0x12, 0x34]);
        assert_eq!(id.sequence(), 0x1234);
        assert_eq!(id.timestamp_delta(), 42);
    }

    #[test]
    fn delta_with_top_bit_set_decodes_negative() {
        let id = RawId::with_random_tail(EPOCH_MS + (1 << 39), WORKER, &[0; 8]);
        assert_eq!(id.timestamp_delta(), -(1 << 39));
    }

    #[test]
    fn encode_is_22_url_safe_chars() {
        let id = RawId::from_bytes([0xFF; ID_SIZE]);
        let encoded = id.encode();
        assert_eq!(encoded.len(), ENCODED_LEN);
        assert_eq!(encoded, "_____________________w");
        assert_eq!(RawId::decode(&encoded), Ok(id));
        assert_eq!(encoded.parse::<RawId>(), Ok(id));
        assert_eq!(id.to_string(), encoded);
    }

    #[test]
    fn decode_rejects_wrong_length() {
        assert_eq!(
            RawId::decode("abc"),
            Err(DecodeError::InvalidLength { len: 3 })
        );
        assert_eq!(
            RawId::decode(&"A".repeat(24)),
            Err(DecodeError::InvalidLength { len: 24 })
        );
        assert_eq!(RawId::decode(""), Err(DecodeError::InvalidLength { len: 0 }));
    }

    #[test]
    fn decode_rejects_bad_alphabet() {
        // `+` and `/` belong to the standard alphabet, not the URL-safe one.
        let err = RawId::decode("++++++++++++++++++++++").unwrap_err();
        assert!(matches!(err, DecodeError::InvalidBase64 { .. }));
        let err = RawId::decode("AAAAAAAAAAAAAAAAAAAA==").unwrap_err();
        assert!(matches!(err, DecodeError::InvalidBase64 { .. }));
    }

    #[test]
    fn datetime_truncates_to_seconds() {
        let id = RawId::with_random_tail(EPOCH_MS + 1_999, WORKER, &[0; 8]);
        let dt = id.datetime().unwrap();
        assert_eq!(dt.timestamp(), (EPOCH_MS / 1000 + 1) as i64);
        assert_eq!(dt.format("%Y-%m-%d %H:%M:%S").to_string(), "2022-01-01 00:00:01");
    }
}
