//! Table packing.
//!
//! `byte`: one decision per byte. `two-bit`: four decisions per byte, the
//! earliest-enumerated entry of each group in bits 7..6, trailing pad slots
//! zero. The reader extracts entry `i` as
//! `(blob[i >> 2] >> (6 - 2 * (i & 3))) & 3`.

use serde::{Deserialize, Serialize};

use crate::error::{LutError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Packing {
    Byte,
    TwoBit,
}

impl Packing {
    pub fn bits(self) -> u32 {
        match self {
            Packing::Byte => 8,
            Packing::TwoBit => 2,
        }
    }

    pub fn per_byte(self) -> usize {
        (8 / self.bits()) as usize
    }

    /// Blob length for a number of entries.
    pub fn packed_len(self, entries: usize) -> usize {
        entries.div_ceil(self.per_byte())
    }

    pub fn name(self) -> &'static str {
        match self {
            Packing::Byte => "byte",
            Packing::TwoBit => "two-bit",
        }
    }
}

impl std::fmt::Display for Packing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Pack decision codes. Fails on any code wider than the slot.
pub fn pack(codes: &[u8], packing: Packing) -> Result<Vec<u8>> {
    let bits = packing.bits();
    let limit = if bits >= 8 { u8::MAX } else { (1u8 << bits) - 1 };
    if let Some(&code) = codes.iter().find(|&&c| c > limit) {
        return Err(LutError::PackOverflow { code, bits });
    }
    match packing {
        Packing::Byte => Ok(codes.to_vec()),
        Packing::TwoBit => Ok(codes
            .chunks(4)
            .map(|group| {
                group
                    .iter()
                    .enumerate()
                    .fold(0u8, |byte, (slot, &code)| byte | (code << (6 - 2 * slot)))
            })
            .collect()),
    }
}

/// Read entry `index` the way the embedded reader does. `None` past the end.
#[inline]
pub fn unpack_at(blob: &[u8], index: usize, packing: Packing) -> Option<u8> {
    match packing {
        Packing::Byte => blob.get(index).copied(),
        Packing::TwoBit => {
            let byte = *blob.get(index >> 2)?;
            Some((byte >> (6 - 2 * (index & 3))) & 3)
        }
    }
}

/// Unpack the first `entries` decisions.
pub fn unpack(blob: &[u8], entries: usize, packing: Packing) -> Result<Vec<u8>> {
    let expected = packing.packed_len(entries);
    if blob.len() != expected {
        return Err(LutError::Length {
            expected,
            found: blob.len(),
        });
    }
    Ok((0..entries)
        .filter_map(|i| unpack_at(blob, i, packing))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_lengths() {
        assert_eq!(Packing::Byte.packed_len(10), 10);
        assert_eq!(Packing::TwoBit.packed_len(8), 2);
        assert_eq!(Packing::TwoBit.packed_len(9), 3);
        assert_eq!(Packing::TwoBit.packed_len(108_864), 27_216);
        assert_eq!(Packing::TwoBit.packed_len(0), 0);
    }

    #[test]
    fn high_bits_hold_earliest_entry() {
        assert_eq!(pack(&[1, 0, 0, 0], Packing::TwoBit).unwrap(), vec![0b01_00_00_00]);
        assert_eq!(pack(&[0, 0, 0, 2], Packing::TwoBit).unwrap(), vec![0b00_00_00_10]);
        assert_eq!(pack(&[1, 1, 1, 1], Packing::TwoBit).unwrap(), vec![85]);
        assert_eq!(pack(&[1, 1, 2, 2], Packing::TwoBit).unwrap(), vec![90]);
        assert_eq!(pack(&[2, 2, 2, 2], Packing::TwoBit).unwrap(), vec![170]);
    }

    #[test]
    fn trailing_slots_are_zero() {
        assert_eq!(pack(&[2, 1, 2, 1, 2], Packing::TwoBit).unwrap(), vec![0b10_01_10_01, 0b10_00_00_00]);
    }

    #[test]
    fn wide_code_fails_loudly() {
        let err = pack(&[0, 1, 4], Packing::TwoBit).unwrap_err();
        assert!(matches!(err, LutError::PackOverflow { code: 4, bits: 2 }));
        assert!(pack(&[255], Packing::Byte).is_ok());
    }

    #[test]
    fn two_bit_roundtrip_embedded_style() {
        let codes: Vec<u8> = (0..1001u32).map(|i| ((i * 7 + i / 3) % 3) as u8).collect();
        let blob = pack(&codes, Packing::TwoBit).unwrap();
        assert_eq!(blob.len(), 251);
        for (i, &c) in codes.iter().enumerate() {
            assert_eq!(unpack_at(&blob, i, Packing::TwoBit), Some(c), "entry {}", i);
        }
        assert_eq!(unpack(&blob, codes.len(), Packing::TwoBit).unwrap(), codes);
    }

    #[test]
    fn unpack_checks_length() {
        let err = unpack(&[0u8; 3], 16, Packing::TwoBit).unwrap_err();
        assert!(matches!(err, LutError::Length { expected: 4, found: 3 }));
        assert_eq!(unpack_at(&[7], 1, Packing::Byte), None);
    }

    #[test]
    fn serde_names() {
        assert_eq!(serde_json::to_string(&Packing::TwoBit).unwrap(), "\"two-bit\"");
        assert_eq!(Packing::Byte.to_string(), "byte");
    }
}
