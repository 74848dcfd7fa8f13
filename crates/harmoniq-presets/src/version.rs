//! Ordering of dotted version strings stored in preset headers.

use std::fmt;

/// Packed `major.minor.micro.nano` value used to decide which preset layer is
/// newer. Each component keeps its low 8 bits.
///
/// This is an ordering key only, not a semantic version: anything with fewer
/// than two readable components sorts as the oldest possible version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct VersionOrdinal(u64);

impl VersionOrdinal {
    pub const OLDEST: VersionOrdinal = VersionOrdinal(0);

    pub fn parse(version: &str) -> Self {
        let mut components = [0u64; 4];
        let mut count = 0;
        let mut rest = version.trim_start();

        while count < components.len() {
            let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
            if digits == 0 {
                break;
            }
            // Leading digits always parse; overflow saturates before masking.
            let value = rest[..digits].parse::<u64>().unwrap_or(u64::MAX);
            components[count] = value & 0xff;
            count += 1;
            rest = &rest[digits..];
            match rest.strip_prefix('.') {
                Some(next) => rest = next,
                None => break,
            }
        }

        if count < 2 {
            return Self::OLDEST;
        }
        let packed = components
            .iter()
            .fold(0u64, |packed, component| (packed << 8) | component);
        VersionOrdinal(packed)
    }

    pub fn parse_opt(version: Option<&str>) -> Self {
        version.map(Self::parse).unwrap_or(Self::OLDEST)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for VersionOrdinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [_, _, _, _, major, minor, micro, nano] = self.0.to_be_bytes();
        write!(f, "{major}.{minor}.{micro}.{nano}")
    }
}
