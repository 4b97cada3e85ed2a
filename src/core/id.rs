//! Overlay identifier types.

use std::fmt;

#[cfg(feature = "codec")]
use bincode::{Decode, Encode};
use rand::{thread_rng, Rng};

use crate::core::{
    config::Config,
    error::{Error, Result},
};

/// A fixed-length identifier made of digits in base `2^b`.
///
/// Digits are written as lowercase hexadecimal characters, so an identifier's textual form and
/// its digit sequence order the same way. Two identifiers built from the same [`Config`] always
/// have the same length.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "codec", derive(Encode, Decode))]
pub struct Id {
    digits: Vec<u8>,
}

impl Id {
    /// Parses an identifier, checking its length and that every digit fits in base `2^b`.
    pub fn parse(text: &str, config: &Config) -> Result<Self> {
        if text.len() != config.id_len {
            return Err(Error::InvalidId(format!(
                "expected {} digits, got {}",
                config.id_len,
                text.len()
            )));
        }

        let base = config.cols();
        let digits = text
            .chars()
            .map(|c| match c.to_digit(16) {
                Some(d) if (d as usize) < base && !c.is_ascii_uppercase() => Ok(d as u8),
                _ => Err(Error::InvalidId(format!(
                    "{c:?} is not a base-{base} digit in {text:?}"
                ))),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { digits })
    }

    /// Generates a random identifier for the supplied configuration.
    pub fn random(config: &Config) -> Self {
        let mut rng = thread_rng();
        let base = config.cols() as u8;
        let digits = (0..config.id_len).map(|_| rng.gen_range(0..base)).collect();

        Self { digits }
    }

    /// The number of digits in the identifier.
    pub fn len(&self) -> usize {
        self.digits.len()
    }

    /// Returns `true` for an identifier with no digits, which no valid configuration produces.
    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    /// Returns the digit at `index`, if the identifier is long enough.
    pub fn digit(&self, index: usize) -> Option<u8> {
        self.digits.get(index).copied()
    }

    /// The digit values, most significant first.
    pub fn digits(&self) -> &[u8] {
        &self.digits
    }

    /// Returns `true` if the identifier has the configured length and every digit is in range.
    ///
    /// Identifiers decoded from the wire bypass [`Id::parse`] and are checked with this instead.
    pub fn fits(&self, config: &Config) -> bool {
        self.digits.len() == config.id_len
            && self.digits.iter().all(|&d| (d as usize) < config.cols())
    }

    /// The length of the longest common prefix shared with `other`.
    pub fn prefix_match_len(&self, other: &Id) -> usize {
        self.digits
            .iter()
            .zip(other.digits.iter())
            .take_while(|(a, b)| a == b)
            .count()
    }

    /// Interprets the identifier as an unsigned integer in base `2^bits`.
    ///
    /// [`Config::validate`] guarantees `len * bits <= 128`, so the value can't overflow for
    /// identifiers built from a valid configuration.
    pub fn numeric(&self, bits: u8) -> u128 {
        self.digits
            .iter()
            .fold(0u128, |acc, &d| (acc << bits) | u128::from(d))
    }

    /// Absolute numeric difference between two identifiers.
    pub fn distance(&self, other: &Id, bits: u8) -> u128 {
        self.numeric(bits).abs_diff(other.numeric(bits))
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &d in &self.digits {
            // Decoded identifiers aren't checked, so out-of-base digits must still print.
            match char::from_digit(u32::from(d), 16) {
                Some(c) => write!(f, "{c}")?,
                None => write!(f, "[{d}]")?,
            }
        }

        Ok(())
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({self})")
    }
}
