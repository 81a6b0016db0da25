//! Buffer-layout-aware COBS+CRC framer state machine
// (c) Bakelite Contributors

use crate::model::CrcKind;

use super::cobs::{self, Status as CobsStatus};
use super::crc;

/// The result of one [`Framer::send`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendResult {
    /// the frame was encoded successfully; it occupies `buffer[0..len]`
    Ok {
        /// length of the encoded frame, including the terminator
        len: usize,
    },
    /// the COBS encoder reported a non-zero status
    Failure,
}

/// The result of one [`Framer::feed`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedResult {
    /// a complete, valid frame is available at `message_offset`
    Ok {
        /// length of the decoded payload (message id + struct encoding), excluding CRC
        len: usize,
    },
    /// the byte was consumed but did not complete a frame
    NotReady,
    /// a terminator was seen but the accumulated bytes did not form a valid COBS frame
    Failure,
    /// a terminator was seen and the frame decoded, but its CRC did not match
    CrcFailure,
    /// the accumulation buffer filled before a terminator was seen
    BufferOverrun,
}

/// A COBS/CRC framer over a caller-owned buffer.
///
/// The buffer is laid out as `[ cobs-overhead prefix | payload area (max_length bytes) |
/// crc area (crc_width bytes) | 1-byte terminator ]`. [`Framer::message_offset`] is the
/// offset at which generated code should place an outbound message (starting with its
/// message-id byte) before calling [`Framer::send`].
#[derive(Debug)]
pub struct Framer<'a> {
    buffer: &'a mut [u8],
    max_length: usize,
    crc: CrcKind,
    message_offset: usize,
    read_pos: usize,
}

impl<'a> Framer<'a> {
    /// The number of bytes a buffer must have to back a framer for the given
    /// `max_length`/CRC combination.
    #[must_use]
    pub fn required_buffer_len(max_length: usize, crc: CrcKind) -> usize {
        let overhead = cobs::cobs_overhead(max_length + crc.width() as usize);
        overhead + max_length + crc.width() as usize + 1
    }

    /// Wraps `buffer`, which must be at least [`Framer::required_buffer_len`] bytes.
    ///
    /// # Panics
    /// Panics if `buffer` is smaller than required; this is a construction-time
    /// programming error, not a runtime condition.
    #[must_use]
    pub fn new(buffer: &'a mut [u8], max_length: usize, crc: CrcKind) -> Self {
        let required = Self::required_buffer_len(max_length, crc);
        assert!(
            buffer.len() >= required,
            "framer buffer too small: need {required}, have {}",
            buffer.len()
        );
        let message_offset = cobs::cobs_overhead(max_length + crc.width() as usize);
        Self {
            buffer,
            max_length,
            crc,
            message_offset,
            read_pos: 0,
        }
    }

    /// The offset at which an outbound message (message-id byte first) must be placed
    /// before calling [`Framer::send`].
    #[must_use]
    pub fn message_offset(&self) -> usize {
        self.message_offset
    }

    fn crc_of(&self, region: &[u8]) -> Vec<u8> {
        match self.crc {
            CrcKind::None => Vec::new(),
            CrcKind::Crc8 => vec![crc::crc8(region)],
            CrcKind::Crc16 => crc::crc16(region).to_le_bytes().to_vec(),
            CrcKind::Crc32 => crc::crc32(region).to_le_bytes().to_vec(),
        }
    }

    /// Encodes the `len`-byte message (message id + payload) already written at
    /// [`Framer::message_offset`], appending the CRC (if configured), COBS-encoding, and
    /// appending the terminator. Returns the encoded frame's length; the frame itself is
    /// left at `buffer[0..len]`.
    pub fn send(&mut self, len: usize) -> SendResult {
        let offset = self.message_offset;
        let trailer = self.crc_of(&self.buffer[offset..offset + len]);
        self.buffer[offset + len..offset + len + trailer.len()].copy_from_slice(&trailer);
        let body_len = len + trailer.len();

        let (src, dst) = self.buffer.split_at_mut(offset);
        let (encoded_len, status) = cobs::encode(&dst[..body_len], src);
        if !status.is_ok() {
            return SendResult::Failure;
        }
        self.buffer[encoded_len] = 0x00;
        SendResult::Ok { len: encoded_len + 1 }
    }

    /// Feeds one received byte into the state machine.
    pub fn feed(&mut self, byte: u8) -> FeedResult {
        if byte != 0x00 {
            if self.read_pos >= self.message_offset {
                self.read_pos = 0;
                return FeedResult::BufferOverrun;
            }
            self.buffer[self.read_pos] = byte;
            self.read_pos += 1;
            return FeedResult::NotReady;
        }

        if self.read_pos == 0 {
            return FeedResult::Failure;
        }
        let acc_len = self.read_pos;
        self.read_pos = 0;

        let (out_len, status) = cobs::decode_in_place(&mut self.buffer[..acc_len]);
        if !status.is_ok() {
            return FeedResult::Failure;
        }

        let crc_width = self.crc.width() as usize;
        if out_len < crc_width {
            return FeedResult::Failure;
        }
        let payload_len = out_len - crc_width;
        if crc_width > 0 {
            let expected = &self.buffer[payload_len..out_len];
            let actual = self.crc_of(&self.buffer[..payload_len]);
            if expected != actual.as_slice() {
                return FeedResult::CrcFailure;
            }
        }

        self.buffer.copy_within(0..payload_len, self.message_offset);
        FeedResult::Ok { len: payload_len }
    }

    /// The payload area of a successfully decoded frame, valid until the next `feed`.
    #[must_use]
    pub fn payload(&self, len: usize) -> &[u8] {
        &self.buffer[self.message_offset..self.message_offset + len]
    }

    /// Reports the configured maximum payload length (excluding CRC/framing overhead)
    #[must_use]
    pub fn max_length(&self) -> usize {
        self.max_length
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn framer(max_length: usize, crc: CrcKind, storage: &mut Vec<u8>) -> Framer<'_> {
        *storage = vec![0u8; Framer::required_buffer_len(max_length, crc)];
        Framer::new(storage, max_length, crc)
    }

    #[test]
    fn ack_scenario_encodes_expected_bytes() {
        let mut storage = Vec::new();
        let mut f = framer(8, CrcKind::Crc8, &mut storage);
        let off = f.message_offset();
        storage_write(&mut f, off, &[0x02, 0x22]);
        match f.send(2) {
            SendResult::Ok { len } => {
                assert_eq!(&storage[..len], &[0x04, 0x02, 0x22, 0xC4, 0x00]);
            }
            SendResult::Failure => panic!("expected send to succeed"),
        }
    }

    fn storage_write(f: &mut Framer<'_>, off: usize, bytes: &[u8]) {
        let buf = raw_buffer(f);
        buf[off..off + bytes.len()].copy_from_slice(bytes);
    }

    fn raw_buffer<'a, 'b>(f: &'a mut Framer<'b>) -> &'a mut [u8] {
        f.buffer
    }

    #[test]
    fn round_trips_through_send_and_feed() {
        let mut storage = Vec::new();
        let mut f = framer(8, CrcKind::Crc8, &mut storage);
        let off = f.message_offset();
        storage_write(&mut f, off, &[0x02, 0x22]);
        let (len, frame) = match f.send(2) {
            SendResult::Ok { len } => (len, storage[..len].to_vec()),
            SendResult::Failure => panic!("send failed"),
        };

        let mut rx_storage = vec![0u8; Framer::required_buffer_len(8, CrcKind::Crc8)];
        let mut rx = Framer::new(&mut rx_storage, 8, CrcKind::Crc8);
        let mut result = FeedResult::NotReady;
        for &b in &frame[..len] {
            result = rx.feed(b);
        }
        match result {
            FeedResult::Ok { len } => {
                assert_eq!(rx.payload(len), &[0x02, 0x22]);
            }
            other => panic!("expected Ok, got {other:?}"),
        }
    }

    #[test]
    fn truncated_frame_stays_not_ready_then_completes() {
        let mut storage = Vec::new();
        let mut f = framer(8, CrcKind::Crc8, &mut storage);
        let off = f.message_offset();
        storage_write(&mut f, off, &[0x02, 0x22]);
        let (len, frame) = match f.send(2) {
            SendResult::Ok { len } => (len, storage[..len].to_vec()),
            SendResult::Failure => panic!("send failed"),
        };

        let mut rx_storage = vec![0u8; Framer::required_buffer_len(8, CrcKind::Crc8)];
        let mut rx = Framer::new(&mut rx_storage, 8, CrcKind::Crc8);
        for &b in &frame[..len - 1] {
            assert_eq!(rx.feed(b), FeedResult::NotReady);
        }
        match rx.feed(frame[len - 1]) {
            FeedResult::Ok { len } => assert_eq!(rx.payload(len), &[0x02, 0x22]),
            other => panic!("expected Ok, got {other:?}"),
        }
    }

    #[test]
    fn corrupted_crc_is_rejected_and_framer_recovers() {
        let mut storage = Vec::new();
        let mut f = framer(8, CrcKind::Crc8, &mut storage);
        let off = f.message_offset();
        storage_write(&mut f, off, &[0x02, 0x22]);
        let (len, mut frame) = match f.send(2) {
            SendResult::Ok { len } => (len, storage[..len].to_vec()),
            SendResult::Failure => panic!("send failed"),
        };
        frame[1] ^= 0x01;

        let mut rx_storage = vec![0u8; Framer::required_buffer_len(8, CrcKind::Crc8)];
        let mut rx = Framer::new(&mut rx_storage, 8, CrcKind::Crc8);
        let mut result = FeedResult::NotReady;
        for &b in &frame[..len] {
            result = rx.feed(b);
        }
        assert_eq!(result, FeedResult::CrcFailure);

        // framer recovers: a subsequent good frame still decodes
        let mut storage2 = Vec::new();
        let mut f2 = framer(8, CrcKind::Crc8, &mut storage2);
        let off2 = f2.message_offset();
        storage_write(&mut f2, off2, &[0x02, 0x22]);
        let (len2, frame2) = match f2.send(2) {
            SendResult::Ok { len } => (len, storage2[..len].to_vec()),
            SendResult::Failure => panic!("send failed"),
        };
        let mut last = FeedResult::NotReady;
        for &b in &frame2[..len2] {
            last = rx.feed(b);
        }
        assert!(matches!(last, FeedResult::Ok { .. }));
    }

    #[test]
    fn overrun_resets_read_position() {
        // max_length = 2, no CRC: message_offset = cobs_overhead(2) = 3, so the fourth
        // non-zero byte overruns the accumulation area, matching the concrete scenario.
        let mut storage = Vec::new();
        let mut rx = framer(2, CrcKind::None, &mut storage);
        let mut last = FeedResult::NotReady;
        for _ in 0..4 {
            last = rx.feed(0xAB);
        }
        assert_eq!(last, FeedResult::BufferOverrun);
        assert_eq!(rx.read_pos, 0);
    }
}
