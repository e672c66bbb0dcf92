use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// A `major.minor` version number.
///
/// Ordering is lexicographic: `major` first, then `minor`. A freshly created
/// object starts at [`Version::INITIAL`] (`1.0`).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
}

impl Version {
    /// The version assigned to every new object.
    pub const INITIAL: Self = Self { major: 1, minor: 0 };

    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// The first version of the given major line (`major.0`).
    pub const fn major_only(major: u32) -> Self {
        Self { major, minor: 0 }
    }
}

impl fmt::Debug for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Version({}.{})", self.major, self.minor)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for Version {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (major, minor) = s
            .split_once('.')
            .ok_or_else(|| TypeError::InvalidVersion(s.to_string()))?;
        let major: u32 = major
            .parse()
            .map_err(|_| TypeError::InvalidVersion(s.to_string()))?;
        let minor: u32 = minor
            .parse()
            .map_err(|_| TypeError::InvalidVersion(s.to_string()))?;
        if major == 0 {
            return Err(TypeError::InvalidVersion(s.to_string()));
        }
        Ok(Self { major, minor })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn ordering_major_first() {
        assert!(Version::new(1, 9) < Version::new(2, 0));
        assert!(Version::new(2, 0) < Version::new(2, 1));
    }

    #[test]
    fn parse_and_display() {
        let v: Version = "3.14".parse().unwrap();
        assert_eq!(v, Version::new(3, 14));
        assert_eq!(v.to_string(), "3.14");
    }

    #[test]
    fn parse_rejects_major_zero() {
        assert!("0.1".parse::<Version>().is_err());
        assert!("1".parse::<Version>().is_err());
        assert!("a.b".parse::<Version>().is_err());
    }

    proptest! {
        #[test]
        fn display_parse_is_identity(major in 1u32..10_000, minor in 0u32..10_000) {
            let v = Version::new(major, minor);
            prop_assert_eq!(v.to_string().parse::<Version>().unwrap(), v);
        }
    }
}
