//! Station codes, platform labels and the integer node keys derived from them.
//!
//! A station node key is a 13 digit decimal number laid out as
//! `1 CC CC CC G L PP SS`:
//!
//! - `1` discriminates station keys from OSM node ids, which are far smaller
//! - `CC CC CC` are the ordinals of the three CRS letters (`A` = 01 .. `Z` = 26)
//! - `G` is 1 when a platform is given, 0 otherwise
//! - `L` is 1 when the platform is a single letter
//! - `PP` is the platform number, or the ordinal of the platform letter
//! - `SS` is the ordinal of a platform suffix letter, `00` when there is none
//!
//! A station without a platform encodes its platform fields as `000000`.

use std::fmt;

use crate::{Error, NodeKey};

const STATION_KEY_BASE: NodeKey = 1_000_000_000_000;
const CRS_FACTOR: NodeKey = 1_000_000;
const PLATFORM_GIVEN: NodeKey = 100_000;
const PLATFORM_IS_LETTER: NodeKey = 10_000;
const MAX_PLATFORM_NUMBER: u32 = 99;

/// A valid 3-letter CRS station code.
///
/// Always three ASCII uppercase letters; any `Crs` value is valid by
/// construction.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Crs([u8; 3]);

impl Crs {
    /// Parse a CRS code. The input must be exactly 3 uppercase ASCII letters.
    pub fn parse(s: &str) -> Result<Self, Error> {
        let bytes = s.as_bytes();

        if bytes.len() != 3 {
            return Err(Error::Encoding(format!(
                "station code {s:?} must be exactly 3 characters"
            )));
        }
        if !bytes.iter().all(u8::is_ascii_uppercase) {
            return Err(Error::Encoding(format!(
                "station code {s:?} must be uppercase ASCII letters A-Z"
            )));
        }

        Ok(Crs([bytes[0], bytes[1], bytes[2]]))
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or_default()
    }

    fn ordinals(self) -> NodeKey {
        self.0
            .iter()
            .fold(0, |acc, &letter| acc * 100 + letter_ordinal(letter))
    }
}

impl fmt::Debug for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Crs({})", self.as_str())
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A platform label.
///
/// Only [`Platform::parse`] builds one, so every value fits the key layout.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Platform(Label);

/// Letters are stored as ASCII uppercase bytes, numbers are at most 99.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Label {
    /// `"4"`, `"12"`, or with a suffix letter `"9A"`
    Numbered { number: u8, suffix: Option<u8> },
    /// A single letter, `"A"`
    Lettered(u8),
}

impl Platform {
    /// Parse a platform label.
    ///
    /// Accepts purely numeric labels up to 99, numeric labels with a single
    /// trailing uppercase letter, and a single uppercase letter. Leading
    /// zeros are dropped, so `"09"` and `"9"` are the same platform.
    pub fn parse(s: &str) -> Result<Self, Error> {
        let bytes = s.as_bytes();
        let invalid = || Error::Encoding(format!("unsupported platform label {s:?}"));

        let label = match bytes {
            [] => return Err(invalid()),
            [letter] if letter.is_ascii_uppercase() => Label::Lettered(*letter),
            [digits @ .., last] if last.is_ascii_uppercase() => Label::Numbered {
                number: parse_platform_number(digits).ok_or_else(invalid)?,
                suffix: Some(*last),
            },
            digits => Label::Numbered {
                number: parse_platform_number(digits).ok_or_else(invalid)?,
                suffix: None,
            },
        };
        Ok(Platform(label))
    }

    /// The platform number, `None` for a lettered platform
    pub fn number(&self) -> Option<u8> {
        match self.0 {
            Label::Numbered { number, .. } => Some(number),
            Label::Lettered(_) => None,
        }
    }

    /// The suffix letter of a numbered platform such as `"9A"`
    pub fn suffix(&self) -> Option<char> {
        match self.0 {
            Label::Numbered { suffix, .. } => suffix.map(char::from),
            Label::Lettered(_) => None,
        }
    }

    /// The letter of a lettered platform
    pub fn letter(&self) -> Option<char> {
        match self.0 {
            Label::Lettered(letter) => Some(char::from(letter)),
            Label::Numbered { .. } => None,
        }
    }

    /// The six platform digits `G L PP SS` of a node key.
    fn fields(self) -> NodeKey {
        match self.0 {
            Label::Numbered { number, suffix } => {
                PLATFORM_GIVEN
                    + NodeKey::from(number) * 100
                    + suffix.map_or(0, letter_ordinal)
            }
            Label::Lettered(letter) => {
                PLATFORM_GIVEN + PLATFORM_IS_LETTER + letter_ordinal(letter) * 100
            }
        }
    }
}

impl fmt::Debug for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Platform({self})")
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Label::Numbered { number, suffix } => {
                write!(f, "{number}")?;
                if let Some(letter) = suffix {
                    write!(f, "{}", char::from(letter))?;
                }
                Ok(())
            }
            Label::Lettered(letter) => write!(f, "{}", char::from(letter)),
        }
    }
}

fn parse_platform_number(digits: &[u8]) -> Option<u8> {
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let number = digits.iter().try_fold(0u32, |acc, &d| {
        let value = acc * 10 + u32::from(d - b'0');
        (value <= MAX_PLATFORM_NUMBER).then_some(value)
    })?;
    u8::try_from(number).ok()
}

fn letter_ordinal(letter: u8) -> NodeKey {
    NodeKey::from(letter - b'A' + 1)
}

fn letter_from_ordinal(ordinal: NodeKey) -> Option<u8> {
    (1..=26)
        .contains(&ordinal)
        .then(|| b'A' + u8::try_from(ordinal - 1).unwrap_or_default())
}

/// A (station, platform) pair identifying a station node in the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StationNodeId {
    pub crs: Crs,
    pub platform: Option<Platform>,
}

impl StationNodeId {
    pub fn new(crs: Crs, platform: Option<Platform>) -> Self {
        Self { crs, platform }
    }

    /// Encode into a node key.
    pub fn key(&self) -> NodeKey {
        STATION_KEY_BASE
            + self.crs.ordinals() * CRS_FACTOR
            + self.platform.map_or(0, Platform::fields)
    }

    /// Decode a node key produced by [`StationNodeId::key`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] if the key is not a well-formed station key.
    pub fn from_key(key: NodeKey) -> Result<Self, Error> {
        let invalid = || Error::Encoding(format!("{key} is not a station node key"));

        if !is_station_key(key) {
            return Err(invalid());
        }
        let body = key - STATION_KEY_BASE;
        let crs_part = body / CRS_FACTOR;
        let platform_part = body % CRS_FACTOR;

        let letters = [crs_part / 10_000, (crs_part / 100) % 100, crs_part % 100]
            .map(letter_from_ordinal);
        let [Some(first), Some(second), Some(third)] = letters else {
            return Err(invalid());
        };
        let crs = Crs([first, second, third]);

        let given = platform_part / PLATFORM_GIVEN;
        let is_letter = (platform_part / PLATFORM_IS_LETTER) % 10;
        let value = (platform_part / 100) % 100;
        let suffix = platform_part % 100;

        let platform = match (given, is_letter) {
            (0, _) if platform_part == 0 => None,
            (1, 0) => {
                let suffix = match suffix {
                    0 => None,
                    ordinal => Some(letter_from_ordinal(ordinal).ok_or_else(invalid)?),
                };
                Some(Platform(Label::Numbered {
                    number: u8::try_from(value).map_err(|_| invalid())?,
                    suffix,
                }))
            }
            (1, 1) if suffix == 0 => Some(Platform(Label::Lettered(
                letter_from_ordinal(value).ok_or_else(invalid)?,
            ))),
            _ => return Err(invalid()),
        };

        Ok(Self { crs, platform })
    }
}

impl fmt::Display for StationNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.platform {
            Some(platform) => write!(f, "{} platform {platform}", self.crs),
            None => write!(f, "{}", self.crs),
        }
    }
}

/// Whether a key lies in the station key range rather than the OSM id range
pub fn is_station_key(key: NodeKey) -> bool {
    (STATION_KEY_BASE..2 * STATION_KEY_BASE).contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crs(s: &str) -> Crs {
        Crs::parse(s).unwrap()
    }

    #[test]
    fn station_without_platform() {
        let id = StationNodeId::new(crs("KGX"), None);
        assert_eq!(id.key(), 1_110_724_000_000);
        assert_eq!(StationNodeId::from_key(id.key()).unwrap(), id);
    }

    #[test]
    fn numbered_and_suffixed_platforms_differ() {
        let nine = StationNodeId::new(crs("KGX"), Some(Platform::parse("9").unwrap()));
        let nine_a = StationNodeId::new(crs("KGX"), Some(Platform::parse("9A").unwrap()));

        assert_eq!(nine.key(), 1_110_724_100_900);
        assert_eq!(nine_a.key(), 1_110_724_100_901);
        assert_ne!(nine.key(), nine_a.key());

        let decoded = StationNodeId::from_key(nine_a.key()).unwrap();
        assert_eq!(decoded.crs.as_str(), "KGX");
        assert_eq!(decoded.platform.unwrap().to_string(), "9A");
    }

    #[test]
    fn lettered_platform() {
        let id = StationNodeId::new(crs("EUS"), Some(Platform::parse("B").unwrap()));
        assert_eq!(id.key() % 1_000_000, 110_200);
        assert_eq!(StationNodeId::from_key(id.key()).unwrap(), id);
    }

    #[test]
    fn platform_zero_is_not_no_platform() {
        let zero = StationNodeId::new(crs("PAD"), Some(Platform::parse("0").unwrap()));
        let none = StationNodeId::new(crs("PAD"), None);
        assert_ne!(zero.key(), none.key());
        assert_eq!(StationNodeId::from_key(zero.key()).unwrap(), zero);
    }

    #[test]
    fn leading_zeros_are_normalised() {
        assert_eq!(Platform::parse("09").unwrap(), Platform::parse("9").unwrap());
        assert_eq!(Platform::parse("09").unwrap().to_string(), "9");
    }

    #[test]
    fn reject_bad_station_codes() {
        assert!(Crs::parse("KG").is_err());
        assert!(Crs::parse("KGXX").is_err());
        assert!(Crs::parse("kgx").is_err());
        assert!(Crs::parse("K1X").is_err());
    }

    #[test]
    fn reject_unsupported_platforms() {
        for label in ["", "AB", "9AB", "100", "a", "9a", "-1", "1 A", "A1"] {
            assert!(Platform::parse(label).is_err(), "accepted {label:?}");
        }
    }

    #[test]
    fn reject_malformed_keys() {
        // OSM sized id
        assert!(StationNodeId::from_key(4_567_890).is_err());
        // letter ordinal 27
        assert!(StationNodeId::from_key(1_270_101_000_000).is_err());
        // platform fields without the given flag
        assert!(StationNodeId::from_key(1_010_101_000_900).is_err());
        // lettered platform carrying a suffix
        assert!(StationNodeId::from_key(1_010_101_110_101).is_err());
        // given flag out of range
        assert!(StationNodeId::from_key(1_010_101_200_000).is_err());
    }

    #[test]
    fn every_platform_has_its_own_key() {
        let labels = (0..=99)
            .flat_map(|number| {
                std::iter::once(number.to_string())
                    .chain(('A'..='Z').map(move |letter| format!("{number}{letter}")))
            })
            .chain(('A'..='Z').map(String::from));

        let mut keys = std::collections::HashSet::new();
        for label in labels {
            let platform = Platform::parse(&label).unwrap();
            let id = StationNodeId::new(crs("KGX"), Some(platform));
            let key = id.key();
            assert!(is_station_key(key), "{label} -> {key}");
            assert_eq!(key / 1_000_000, 1_110_724, "{label} spilled into the station code");
            assert!(keys.insert(key), "{label} shares key {key}");
            assert_eq!(StationNodeId::from_key(key).unwrap(), id);
        }
        assert_eq!(keys.len(), 100 * 27 + 26);

        // The two labels whose keys collided when platform fields were open
        let ten_plus = StationNodeId::new(crs("KGX"), Some(Platform::parse("J").unwrap()));
        assert_eq!(ten_plus.key(), 1_110_724_111_000);
        assert!(Platform::parse("110").is_err());
    }

    #[test]
    fn platform_accessors() {
        let nine_a = Platform::parse("9A").unwrap();
        assert_eq!((nine_a.number(), nine_a.suffix(), nine_a.letter()), (Some(9), Some('A'), None));
        let b = Platform::parse("B").unwrap();
        assert_eq!((b.number(), b.suffix(), b.letter()), (None, None, Some('B')));
        assert_eq!(format!("{nine_a:?}"), "Platform(9A)");
    }

    #[test]
    fn display() {
        let id = StationNodeId::new(crs("KGX"), Some(Platform::parse("9A").unwrap()));
        assert_eq!(id.to_string(), "KGX platform 9A");
        assert_eq!(format!("{:?}", crs("EUS")), "Crs(EUS)");
    }
}
