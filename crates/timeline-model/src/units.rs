//! Decimal file-size and bitrate units.
//!
//! All "kilo" multipliers are decimal: 1 KB = 1,000 bytes and
//! 1 Kbit = 1,000 bits. One byte is 8 bits.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const BITS_PER_BYTE: f64 = 8.0;
pub const KILO: f64 = 1_000.0;
pub const MEGA: f64 = 1_000_000.0;
pub const GIGA: f64 = 1_000_000_000.0;

/// An amount of data, stored in bits.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct FileSize {
    bits: f64,
}

impl FileSize {
    pub const ZERO: FileSize = FileSize { bits: 0.0 };

    pub fn from_bits(bits: f64) -> Self {
        Self { bits }
    }

    pub fn from_bytes(bytes: f64) -> Self {
        Self::from_bits(bytes * BITS_PER_BYTE)
    }

    pub fn from_kilobytes(value: f64) -> Self {
        Self::from_bytes(value * KILO)
    }

    pub fn from_megabytes(value: f64) -> Self {
        Self::from_bytes(value * MEGA)
    }

    pub fn from_gigabytes(value: f64) -> Self {
        Self::from_bytes(value * GIGA)
    }

    pub fn from_kilobits(value: f64) -> Self {
        Self::from_bits(value * KILO)
    }

    pub fn bits(&self) -> f64 {
        self.bits
    }

    pub fn bytes(&self) -> f64 {
        self.bits / BITS_PER_BYTE
    }

    pub fn to_kilobytes(&self) -> f64 {
        self.bytes() / KILO
    }

    pub fn to_megabytes(&self) -> f64 {
        self.bytes() / MEGA
    }

    pub fn to_gigabytes(&self) -> f64 {
        self.bytes() / GIGA
    }

    pub fn to_kilobits(&self) -> f64 {
        self.bits / KILO
    }

    pub fn to_megabits(&self) -> f64 {
        self.bits / MEGA
    }

    /// Data produced by a stream of `kbps` kilobits per second over `secs`.
    pub fn from_bitrate(kbps: f64, secs: f64) -> Self {
        Self::from_kilobits(kbps * secs)
    }
}

impl fmt::Display for FileSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.bytes();
        if bytes.abs() >= GIGA {
            write!(f, "{:.2} GB", self.to_gigabytes())
        } else if bytes.abs() >= MEGA {
            write!(f, "{:.2} MB", self.to_megabytes())
        } else if bytes.abs() >= KILO {
            write!(f, "{:.2} KB", self.to_kilobytes())
        } else {
            write!(f, "{bytes:.0} B")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_megabytes_to_kilobits() {
        // 8 MB = 8,000,000 bytes = 64,000,000 bits = 64,000 kbit
        assert_eq!(FileSize::from_megabytes(8.0).to_kilobits(), 64_000.0);
    }

    #[test]
    fn test_kilobits_to_bytes() {
        assert_eq!(FileSize::from_kilobits(6400.0).bytes(), 800_000.0);
    }

    #[test]
    fn test_bitrate_over_time() {
        let size = FileSize::from_bitrate(6400.0, 10.0);
        assert_eq!(size.bytes(), 8_000_000.0);
        assert_eq!(size.to_megabytes(), 8.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(FileSize::from_megabytes(8.0).to_string(), "8.00 MB");
        assert_eq!(FileSize::from_kilobytes(1.5).to_string(), "1.50 KB");
        assert_eq!(FileSize::from_bytes(12.0).to_string(), "12 B");
    }
}
