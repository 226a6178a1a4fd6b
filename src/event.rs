//! Capture events, their expanded bulk records, and the fixed-size wire form read by the
//! device glue.

use crate::error::InvalidSource;

/// Number of derived values carried by each [`EventBulkRecord`].
pub const PAYLOAD_LEN: usize = 10;

/// Size of one encoded [`EventBulkRecord`]: `i32` source, 4 bytes padding, `u64` sequence,
/// then the payload. Matches the driver's C struct layout.
pub const RECORD_SIZE: usize = 4 + 4 + 8 + 8 * PAYLOAD_LEN;

/// The physical stimulus that fired. Discriminants are the board's button numbers.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceId {
    Button5 = 0,
    Button6 = 1,
    RockerDown = 2,
    RockerNorth = 3,
    RockerSouth = 4,
    RockerEast = 6,
    RockerWest = 7,
}

impl SourceId {
    pub const ALL: [SourceId; 7] = [
        SourceId::Button5,
        SourceId::Button6,
        SourceId::RockerDown,
        SourceId::RockerNorth,
        SourceId::RockerSouth,
        SourceId::RockerEast,
        SourceId::RockerWest,
    ];

    #[inline]
    pub const fn raw(self) -> u8 {
        self as u8
    }

    pub const fn description(self) -> &'static str {
        match self {
            SourceId::Button5 => "oled button 5",
            SourceId::Button6 => "oled button 6",
            SourceId::RockerDown => "oled rocker down",
            SourceId::RockerNorth => "oled rocker north",
            SourceId::RockerSouth => "oled rocker south",
            SourceId::RockerEast => "oled rocker east",
            SourceId::RockerWest => "oled rocker west",
        }
    }
}

impl TryFrom<u32> for SourceId {
    type Error = InvalidSource;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        SourceId::ALL
            .into_iter()
            .find(|source| u32::from(source.raw()) == raw)
            .ok_or(InvalidSource(raw))
    }
}

impl TryFrom<u8> for SourceId {
    type Error = InvalidSource;

    #[inline]
    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        SourceId::try_from(u32::from(raw))
    }
}

impl From<SourceId> for u8 {
    #[inline]
    fn from(source: SourceId) -> Self {
        source.raw()
    }
}

/// What the interrupt handler knows: which source fired, and when in sequence.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CaptureEvent {
    source: SourceId,
    sequence: u64,
}

impl CaptureEvent {
    #[inline]
    pub const fn new(source: SourceId, sequence: u64) -> Self {
        Self { source, sequence }
    }

    #[inline]
    pub const fn source(&self) -> SourceId {
        self.source
    }

    #[inline]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// A capture event plus the values derived from it off the interrupt path.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct EventBulkRecord {
    capture: CaptureEvent,
    payload: [u64; PAYLOAD_LEN],
}

impl EventBulkRecord {
    /// `payload[i] = sequence + i`, wrapping.
    pub fn expand(capture: CaptureEvent) -> Self {
        let payload = core::array::from_fn(|i| capture.sequence().wrapping_add(i as u64));
        Self { capture, payload }
    }

    #[inline]
    pub const fn capture(&self) -> &CaptureEvent {
        &self.capture
    }

    #[inline]
    pub const fn source(&self) -> SourceId {
        self.capture.source
    }

    #[inline]
    pub const fn sequence(&self) -> u64 {
        self.capture.sequence
    }

    #[inline]
    pub const fn payload(&self) -> &[u64; PAYLOAD_LEN] {
        &self.payload
    }

    pub fn to_le_bytes(&self) -> [u8; RECORD_SIZE] {
        let mut bytes = [0u8; RECORD_SIZE];
        bytes[0..4].copy_from_slice(&u32::from(self.source().raw()).to_le_bytes());
        bytes[8..16].copy_from_slice(&self.sequence().to_le_bytes());
        for (chunk, value) in bytes[16..].chunks_exact_mut(8).zip(self.payload) {
            chunk.copy_from_slice(&value.to_le_bytes());
        }
        bytes
    }

    /// Decode the wire form. Padding bytes are ignored; the payload is taken as stored.
    pub fn from_le_bytes(bytes: &[u8; RECORD_SIZE]) -> Result<Self, InvalidSource> {
        let source = SourceId::try_from(u32::from_le_bytes(le_array(&bytes[0..4])))?;
        let sequence = u64::from_le_bytes(le_array(&bytes[8..16]));
        let mut payload = [0u64; PAYLOAD_LEN];
        for (value, chunk) in payload.iter_mut().zip(bytes[16..].chunks_exact(8)) {
            *value = u64::from_le_bytes(le_array(chunk));
        }
        Ok(Self {
            capture: CaptureEvent::new(source, sequence),
            payload,
        })
    }
}

#[inline]
fn le_array<const W: usize>(chunk: &[u8]) -> [u8; W] {
    let mut out = [0u8; W];
    out.copy_from_slice(chunk);
    out
}

/// How many whole records a read of `len` bytes asks for.
/// `None` when `len` is zero or not a multiple of [`RECORD_SIZE`].
#[inline]
pub const fn records_in(len: usize) -> Option<usize> {
    if len == 0 || len % RECORD_SIZE != 0 {
        None
    } else {
        Some(len / RECORD_SIZE)
    }
}
