//! Detection of the vendor trailer appended to ethernet-framed records
//!
//! The producer can append a 32-byte trailer (`magic`, `uid`, 20 bytes of
//! application name, `fcs`) after each record, in which case records are
//! wrapped in a fake ethernet header. Looking for the magic at a fixed offset
//! from the end of the record is only a heuristic: records shorter than the
//! trailer never match, and a payload may contain the magic bytes by chance.

/// Trailer magic `0x01072021`, as written on the wire (network byte order)
pub const TRAILER_MAGIC: [u8; 4] = [0x01, 0x07, 0x20, 0x21];

/// Size of the trailer
pub const TRAILER_LEN: usize = 32;

/// Test if a capture record ends with the vendor trailer
pub fn has_trailer(record: &[u8]) -> bool {
    if record.len() < TRAILER_LEN {
        return false;
    }
    let offset = record.len() - TRAILER_LEN;
    record[offset..offset + TRAILER_MAGIC.len()] == TRAILER_MAGIC
}
