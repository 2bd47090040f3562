//! 16-byte fingerprints of decoded instances and tours.
//!
//! A fingerprint starts with a short readable header and is filled up with a truncated
//! content hash:
//!
//! ```text
//! instance: [problem code] [weight type code] [floor(log2(dimension))] [13 hash bytes]
//! tour:     [number of nodes, u32 big-endian]                          [12 hash bytes]
//! ```
//!
//! Both render as 32 lowercase hex digits and (de)serialize as such a string.

use itertools::Itertools;
use serde::de::{Error as _, Unexpected};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Display, Formatter};
use std::marker::PhantomData;
use std::str::FromStr;
use thiserror::Error;

use crate::format::{EdgeWeightType, ProblemType};

pub const FINGERPRINT_BYTES: usize = 16;

#[derive(Debug, Error, PartialEq)]
pub enum DigestError {
    #[error("expected {expected} hex digits, found {0}", expected = 2 * FINGERPRINT_BYTES)]
    InvalidLength(usize),

    #[error("`{0}` is not a hex digit")]
    InvalidChar(char),

    #[error("unknown problem code {0:#04x}")]
    UnknownProblemCode(u8),

    #[error("unknown edge weight type code {0:#04x}")]
    UnknownWeightTypeCode(u8),
}

/// What a fingerprint was computed from; decides which headers are valid.
pub trait FingerprintKind {
    fn check_header(bytes: &[u8; FINGERPRINT_BYTES]) -> Result<(), DigestError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InstanceContent {}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TourContent {}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint<K> {
    bytes: [u8; FINGERPRINT_BYTES],
    kind: PhantomData<K>,
}

pub type InstanceDigest = Fingerprint<InstanceContent>;
pub type TourDigest = Fingerprint<TourContent>;

/// Problem types by their header code.
const PROBLEM_CODES: [Option<ProblemType>; 7] = [
    None,
    Some(ProblemType::Tsp),
    Some(ProblemType::Atsp),
    Some(ProblemType::Sop),
    Some(ProblemType::Hcp),
    Some(ProblemType::Cvrp),
    Some(ProblemType::Tour),
];

pub(crate) fn problem_code(problem_type: Option<ProblemType>) -> u8 {
    PROBLEM_CODES
        .iter()
        .position(|&p| p == problem_type)
        .unwrap_or(0) as u8
}

/// `0` for an unset weight type, otherwise its position in [`EdgeWeightType::ALL`] plus one.
pub(crate) fn weight_type_code(weight_type: Option<EdgeWeightType>) -> u8 {
    weight_type
        .and_then(|t| EdgeWeightType::ALL.iter().position(|&w| w == t))
        .map_or(0, |i| i as u8 + 1)
}

impl<K> Fingerprint<K> {
    /// Concatenates `header` and as much of `hash` as fits.
    ///
    /// # Panics
    /// If `header` and `hash` together are shorter than a fingerprint.
    pub(crate) fn assemble(header: &[u8], hash: &[u8]) -> Self {
        let mut bytes = [0u8; FINGERPRINT_BYTES];
        let (head, tail) = bytes.split_at_mut(header.len());
        head.copy_from_slice(header);
        tail.copy_from_slice(&hash[..tail.len()]);

        Self {
            bytes,
            kind: PhantomData,
        }
    }

    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_BYTES] {
        &self.bytes
    }
}

impl InstanceDigest {
    pub fn problem_type(&self) -> Option<ProblemType> {
        PROBLEM_CODES
            .get(self.bytes[0] as usize)
            .copied()
            .flatten()
    }

    pub fn edge_weight_type(&self) -> Option<EdgeWeightType> {
        (self.bytes[1] as usize)
            .checked_sub(1)
            .and_then(|i| EdgeWeightType::ALL.get(i))
            .copied()
    }

    /// `floor(log2(dimension))`, and `0` for instances with at most one node.
    pub fn dimension_class(&self) -> u8 {
        self.bytes[2]
    }
}

impl TourDigest {
    /// Number of nodes of the tour, saturated at `u32::MAX`.
    pub fn tour_len(&self) -> u32 {
        let [a, b, c, d, ..] = self.bytes;
        u32::from_be_bytes([a, b, c, d])
    }
}

impl FingerprintKind for InstanceContent {
    fn check_header(bytes: &[u8; FINGERPRINT_BYTES]) -> Result<(), DigestError> {
        if bytes[0] as usize >= PROBLEM_CODES.len() {
            return Err(DigestError::UnknownProblemCode(bytes[0]));
        }
        if bytes[1] as usize > EdgeWeightType::ALL.len() {
            return Err(DigestError::UnknownWeightTypeCode(bytes[1]));
        }
        Ok(())
    }
}

impl FingerprintKind for TourContent {
    fn check_header(_: &[u8; FINGERPRINT_BYTES]) -> Result<(), DigestError> {
        Ok(())
    }
}

impl<K: FingerprintKind> TryFrom<[u8; FINGERPRINT_BYTES]> for Fingerprint<K> {
    type Error = DigestError;

    fn try_from(bytes: [u8; FINGERPRINT_BYTES]) -> Result<Self, Self::Error> {
        K::check_header(&bytes)?;
        Ok(Self {
            bytes,
            kind: PhantomData,
        })
    }
}

impl<K> Display for Fingerprint<K> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}", self.bytes.iter().format(""))
    }
}

impl<K: FingerprintKind> FromStr for Fingerprint<K> {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(c) = s.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(DigestError::InvalidChar(c));
        }
        if s.len() != 2 * FINGERPRINT_BYTES {
            return Err(DigestError::InvalidLength(s.len()));
        }

        let mut bytes = [0u8; FINGERPRINT_BYTES];
        for (byte, (hi, lo)) in bytes.iter_mut().zip(s.bytes().tuples()) {
            *byte = (hex_value(hi) << 4) | hex_value(lo);
        }

        Self::try_from(bytes)
    }
}

fn hex_value(digit: u8) -> u8 {
    char::from(digit).to_digit(16).map_or(0, |d| d as u8)
}

impl<K> Serialize for Fingerprint<K> {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        ser.collect_str(self)
    }
}

impl<'de, K: FingerprintKind> Deserialize<'de> for Fingerprint<K> {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        let s = String::deserialize(de)?;

        s.parse().map_err(|e| match e {
            DigestError::InvalidLength(len) => D::Error::invalid_length(len, &"32 hex digits"),
            _ => D::Error::invalid_value(Unexpected::Str(&s), &"a hex fingerprint"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EUC_TSP: &str = "010210000102030405060708090a0b0c";

    #[test]
    fn instance_header() {
        let digest: InstanceDigest = EUC_TSP.parse().unwrap();

        assert_eq!(digest.problem_type(), Some(ProblemType::Tsp));
        assert_eq!(digest.edge_weight_type(), Some(EdgeWeightType::Euc2d));
        assert_eq!(digest.dimension_class(), 16);
        assert_eq!(digest.to_string(), EUC_TSP);

        assert_eq!(problem_code(Some(ProblemType::Tsp)), 1);
        assert_eq!(problem_code(None), 0);
        assert_eq!(weight_type_code(Some(EdgeWeightType::Euc2d)), 2);
        assert_eq!(weight_type_code(None), 0);
    }

    #[test]
    fn header_codes_roundtrip() {
        for &t in ProblemType::ALL {
            let digest = InstanceDigest::assemble(&[problem_code(Some(t)), 0, 0], &[0; 13]);
            assert_eq!(digest.problem_type(), Some(t));
        }
        for &t in EdgeWeightType::ALL {
            let digest = InstanceDigest::assemble(&[0, weight_type_code(Some(t)), 0], &[0; 13]);
            assert_eq!(digest.edge_weight_type(), Some(t));
        }
    }

    #[test]
    fn tour_header() {
        let digest = TourDigest::assemble(&70_000u32.to_be_bytes(), &[0xff; 32]);
        assert_eq!(digest.tour_len(), 70_000);
        assert_eq!(digest.to_string(), "00011170ffffffffffffffffffffffff");
    }

    #[test]
    fn parse_errors() {
        assert_eq!(
            "0102".parse::<TourDigest>(),
            Err(DigestError::InvalidLength(4))
        );
        assert_eq!(
            "0g".parse::<TourDigest>(),
            Err(DigestError::InvalidChar('g'))
        );
        assert_eq!(
            "090210000102030405060708090a0b0c".parse::<InstanceDigest>(),
            Err(DigestError::UnknownProblemCode(9))
        );
        assert_eq!(
            "01ff10000102030405060708090a0b0c".parse::<InstanceDigest>(),
            Err(DigestError::UnknownWeightTypeCode(0xff))
        );

        // tours carry no codes
        assert!("090210000102030405060708090a0b0c".parse::<TourDigest>().is_ok());
    }

    #[test]
    fn uppercase_is_accepted() {
        let digest: InstanceDigest = EUC_TSP.to_ascii_uppercase().parse().unwrap();
        assert_eq!(digest.to_string(), EUC_TSP);
    }

    #[test]
    fn serde_as_hex_string() {
        let digest: InstanceDigest = EUC_TSP.parse().unwrap();

        let json = serde_json::to_string(&digest).unwrap();
        assert_eq!(json, format!("\"{EUC_TSP}\""));
        assert_eq!(serde_json::from_str::<InstanceDigest>(&json).unwrap(), digest);

        assert!(serde_json::from_str::<InstanceDigest>("\"0102\"").is_err());
        assert!(serde_json::from_str::<InstanceDigest>("\"zz0210000102030405060708090a0b0c\"").is_err());
        assert!(serde_json::from_str::<InstanceDigest>("\"090210000102030405060708090a0b0c\"").is_err());
    }
}
