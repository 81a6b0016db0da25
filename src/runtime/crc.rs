//! Table-driven CRC-8, CRC-16/ARC and CRC-32/IEEE 802.3
// (c) Bakelite Contributors

use std::sync::OnceLock;

/// The CRC-8 lookup table, exposed so the tiny backends can emit it as a literal `const`
/// array in generated source rather than reimplementing the bit-twiddling independently.
pub(crate) fn crc8_table() -> &'static [u8; 256] {
    static TABLE: OnceLock<[u8; 256]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [0u8; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = i as u8;
            let mut bit = 0;
            while bit < 8 {
                crc = if crc & 0x80 != 0 { (crc << 1) ^ 0x07 } else { crc << 1 };
                bit += 1;
            }
            table[i] = crc;
            i += 1;
        }
        table
    })
}

/// The CRC-16/ARC lookup table, exposed for the same reason as [`crc8_table`].
pub(crate) fn crc16_table() -> &'static [u16; 256] {
    static TABLE: OnceLock<[u16; 256]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [0u16; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = i as u16;
            let mut bit = 0;
            while bit < 8 {
                crc = if crc & 1 != 0 { (crc >> 1) ^ 0xA001 } else { crc >> 1 };
                bit += 1;
            }
            table[i] = crc;
            i += 1;
        }
        table
    })
}

/// The CRC-32/IEEE 802.3 lookup table, exposed for the same reason as [`crc8_table`].
pub(crate) fn crc32_table() -> &'static [u32; 256] {
    static TABLE: OnceLock<[u32; 256]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [0u32; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = i as u32;
            let mut bit = 0;
            while bit < 8 {
                crc = if crc & 1 != 0 {
                    (crc >> 1) ^ 0xEDB8_8320
                } else {
                    crc >> 1
                };
                bit += 1;
            }
            table[i] = crc;
            i += 1;
        }
        table
    })
}

/// CRC-8, polynomial `0x107`, initial value `0x00`, non-reflected
#[must_use]
pub fn crc8(data: &[u8]) -> u8 {
    let table = crc8_table();
    let mut crc: u8 = 0x00;
    for &byte in data {
        crc = table[usize::from(crc ^ byte)];
    }
    crc
}

/// CRC-16/ARC, polynomial `0x18005` reflected (`0xA001`), initial value `0x0000`
#[must_use]
pub fn crc16(data: &[u8]) -> u16 {
    let table = crc16_table();
    let mut crc: u16 = 0x0000;
    for &byte in data {
        let index = usize::from((crc as u8) ^ byte);
        crc = (crc >> 8) ^ table[index];
    }
    crc
}

/// CRC-32/IEEE 802.3, polynomial `0x104C11DB7` reflected, initial value `0xFFFFFFFF`,
/// final XOR `0xFFFFFFFF`
#[must_use]
pub fn crc32(data: &[u8]) -> u32 {
    let table = crc32_table();
    let mut crc: u32 = 0xFFFF_FFFF;
    for &byte in data {
        let index = usize::from((crc as u8) ^ byte);
        crc = (crc >> 8) ^ table[index];
    }
    crc ^ 0xFFFF_FFFF
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc8_ack_scenario() {
        // struct Ack { code: uint8 } id=2, payload `02 22` -> CRC8 `c4` per spec scenario 1
        assert_eq!(crc8(&[0x02, 0x22]), 0xC4);
    }

    #[test]
    fn crc8_of_empty_is_zero() {
        assert_eq!(crc8(&[]), 0);
    }

    #[test]
    fn crc16_known_vector() {
        // CRC-16/ARC("123456789") = 0xBB3D
        assert_eq!(crc16(b"123456789"), 0xBB3D);
    }

    #[test]
    fn crc32_known_vector() {
        // CRC-32/IEEE 802.3("123456789") = 0xCBF43926
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
    }
}
