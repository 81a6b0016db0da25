//! Consistent Overhead Byte Stuffing
// (c) Bakelite Contributors
//!
//! A byte-exact implementation of standard COBS. `encode`/`decode` return an `(out_len,
//! status)` pair where `status` is an OR of [`Status`] flags, mirroring the status codes
//! the generated C/C++ runtimes expose. `NULL_POINTER` never fires from safe Rust slices;
//! it is kept so the flag values line up with the non-Rust backends.

/// Status flags returned alongside an encode/decode operation's output length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Status(u8);

impl Status {
    /// The operation completed successfully
    pub const OK: Status = Status(0);
    /// Reserved for parity with the C/C++ runtimes; never set by this implementation
    pub const NULL_POINTER: Status = Status(1);
    /// The destination region was too small to hold the result
    pub const OUT_BUFFER_OVERFLOW: Status = Status(2);
    /// Decode only: the input contained an embedded `0x00` byte
    pub const ZERO_BYTE_IN_INPUT: Status = Status(4);
    /// Decode only: a length code ran past the end of the input
    pub const INPUT_TOO_SHORT: Status = Status(8);

    /// True if no flag is set
    #[must_use]
    pub fn is_ok(self) -> bool {
        self.0 == 0
    }

    /// True if `flag` is set
    #[must_use]
    pub fn contains(self, flag: Status) -> bool {
        self.0 & flag.0 == flag.0
    }
}

impl std::ops::BitOr for Status {
    type Output = Status;
    fn bitor(self, rhs: Status) -> Status {
        Status(self.0 | rhs.0)
    }
}

/// The exact size of the COBS-encoded form of a `len`-byte source region: `len + ceil((len
/// + 253) / 254)`.
#[must_use]
pub fn cobs_overhead(len: usize) -> usize {
    len + (len + 253) / 254
}

/// Encodes `src` into `dst`. Never emits a `0x00` byte. Returns the number of bytes
/// written to `dst` and a [`Status`].
#[must_use]
pub fn encode(src: &[u8], dst: &mut [u8]) -> (usize, Status) {
    if dst.len() < cobs_overhead(src.len()) {
        return (0, Status::OUT_BUFFER_OVERFLOW);
    }
    let mut read = 0;
    let mut write = 1;
    let mut code_index = 0;
    let mut code: u8 = 1;

    while read < src.len() {
        if src[read] == 0 {
            dst[code_index] = code;
            code = 1;
            code_index = write;
            write += 1;
        } else {
            dst[write] = src[read];
            write += 1;
            code += 1;
            if code == 0xFF {
                dst[code_index] = code;
                code = 1;
                code_index = write;
                write += 1;
            }
        }
        read += 1;
    }
    dst[code_index] = code;
    (write, Status::OK)
}

/// Decodes `src` into `dst`, which must not overlap `src`. Returns the number of bytes
/// written to `dst` and a [`Status`]. For the in-place path used by the framer, see
/// [`decode_in_place`].
#[must_use]
pub fn decode(src: &[u8], dst: &mut [u8]) -> (usize, Status) {
    let mut scratch = src.to_vec();
    let (len, status) = decode_in_place(&mut scratch);
    if !status.is_ok() {
        return (0, status);
    }
    if len > dst.len() {
        return (0, Status::OUT_BUFFER_OVERFLOW);
    }
    dst[..len].copy_from_slice(&scratch[..len]);
    (len, status)
}

/// Decodes `buf[..len]` in place, overwriting it with the decoded payload starting at
/// index 0. Returns the number of decoded bytes and a [`Status`]. This is the canonical
/// path used by the [framer](super::framer), since the decoded output is always no
/// longer than the encoded input.
#[must_use]
pub fn decode_in_place(buf: &mut [u8]) -> (usize, Status) {
    let len = buf.len();
    let mut read = 0;
    let mut write = 0;

    while read < len {
        let code = usize::from(buf[read]);
        if code == 0 {
            return (write, Status::ZERO_BYTE_IN_INPUT);
        }
        if read + code > len {
            return (write, Status::INPUT_TOO_SHORT);
        }
        read += 1;
        for _ in 1..code {
            buf[write] = buf[read];
            write += 1;
            read += 1;
        }
        if code != 0xFF && read < len {
            buf[write] = 0;
            write += 1;
        }
    }
    (write, Status::OK)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(src: &[u8]) -> Vec<u8> {
        let mut dst = vec![0u8; cobs_overhead(src.len())];
        let (n, status) = encode(src, &mut dst);
        assert!(status.is_ok());
        dst.truncate(n);
        assert!(!dst.contains(&0));
        let mut decoded = dst.clone();
        let (out_len, status) = decode_in_place(&mut decoded);
        assert!(status.is_ok());
        decoded.truncate(out_len);
        decoded
    }

    #[test]
    fn empty_round_trips() {
        assert_eq!(roundtrip(&[]), Vec::<u8>::new());
    }

    #[test]
    fn single_zero_round_trips() {
        assert_eq!(roundtrip(&[0]), vec![0]);
    }

    #[test]
    fn no_zeros_round_trips() {
        let src = vec![1u8, 2, 3, 4, 5];
        assert_eq!(roundtrip(&src), src);
    }

    #[test]
    fn two_hundred_fifty_four_byte_block_boundary() {
        let src = vec![0xEEu8; 254];
        let mut dst = vec![0u8; cobs_overhead(src.len())];
        let (n, status) = encode(&src, &mut dst);
        assert!(status.is_ok());
        assert_eq!(n, 256);
        assert_eq!(dst[0], 0xFF);
        assert_eq!(dst[255], 0x01);
        assert_eq!(roundtrip(&src), src);
    }

    #[test]
    fn detects_embedded_zero_on_decode() {
        let mut buf = vec![2u8, 0u8];
        let (_, status) = decode_in_place(&mut buf);
        assert!(status.contains(Status::ZERO_BYTE_IN_INPUT));
    }

    #[test]
    fn detects_truncated_input() {
        let mut buf = vec![5u8, 1, 2];
        let (_, status) = decode_in_place(&mut buf);
        assert!(status.contains(Status::INPUT_TOO_SHORT));
    }

    #[test]
    fn reports_overflow_when_destination_too_small() {
        let src = vec![1u8, 2, 3];
        let mut dst = vec![0u8; 1];
        let (_, status) = encode(&src, &mut dst);
        assert!(status.contains(Status::OUT_BUFFER_OVERFLOW));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn encode_never_emits_a_zero_byte(src in proptest::collection::vec(any::<u8>(), 0..1024)) {
            let mut dst = vec![0u8; cobs_overhead(src.len())];
            let (n, status) = encode(&src, &mut dst);
            prop_assert!(status.is_ok());
            prop_assert!(!dst[..n].contains(&0));
        }

        #[test]
        fn decode_is_the_inverse_of_encode(src in proptest::collection::vec(any::<u8>(), 0..1024)) {
            let mut dst = vec![0u8; cobs_overhead(src.len())];
            let (n, status) = encode(&src, &mut dst);
            prop_assert!(status.is_ok());
            let mut decoded = dst[..n].to_vec();
            let (out_len, status) = decode_in_place(&mut decoded);
            prop_assert!(status.is_ok());
            prop_assert_eq!(&decoded[..out_len], &src[..]);
        }
    }
}
