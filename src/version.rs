use crate::{api::ChangeType, error::Error};
use std::{fmt::Display, str::FromStr};

/// Semantic version of a process definition revision: `major.minor.patch`.
///
/// Ordering is lexicographic over the three components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    major: u64,
    minor: u64,
    patch: u64,
}

impl Version {
    /// Version given to the first revision of a process.
    pub const INITIAL: Version = Version::new(1, 0, 0);

    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    pub fn major(&self) -> u64 {
        self.major
    }

    pub fn minor(&self) -> u64 {
        self.minor
    }

    pub fn patch(&self) -> u64 {
        self.patch
    }

    pub fn bump_major(&self) -> Result<Self, Error> {
        Ok(Self::new(self.next(self.major)?, 0, 0))
    }

    pub fn bump_minor(&self) -> Result<Self, Error> {
        Ok(Self::new(self.major, self.next(self.minor)?, 0))
    }

    pub fn bump_patch(&self) -> Result<Self, Error> {
        Ok(Self::new(self.major, self.minor, self.next(self.patch)?))
    }

    /// Next version for a change of the given weight. A created process bumps like a major change.
    pub fn bump(&self, change: ChangeType) -> Result<Self, Error> {
        match change {
            ChangeType::Created | ChangeType::Major => self.bump_major(),
            ChangeType::Minor => self.bump_minor(),
            ChangeType::Patch => self.bump_patch(),
        }
    }

    fn next(&self, component: u64) -> Result<u64, Error> {
        component
            .checked_add(1)
            .ok_or_else(|| Error::VersionFormat(format!("{self} cannot be bumped")))
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('.');
        let (Some(major), Some(minor), Some(patch), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(Error::VersionFormat(s.into()));
        };
        Ok(Self::new(
            component(s, major)?,
            component(s, minor)?,
            component(s, patch)?,
        ))
    }
}

impl TryFrom<&str> for Version {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// Digits only, no sign and no leading zero unless the component is "0".
fn component(input: &str, part: &str) -> Result<u64, Error> {
    if part.is_empty()
        || !part.bytes().all(|b| b.is_ascii_digit())
        || (part.len() > 1 && part.starts_with('0'))
    {
        return Err(Error::VersionFormat(input.into()));
    }
    part.parse()
        .map_err(|_| Error::VersionFormat(input.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;

    #[test]
    fn parse_and_render() -> Result<(), Box<dyn std::error::Error>> {
        for input in ["0.0.0", "1.0.0", "10.20.30", "0.1.9"] {
            let version: Version = input.parse()?;
            assert_eq!(version.to_string(), input);
            assert_eq!(version.to_string().parse::<Version>()?, version);
        }
        Ok(())
    }

    #[test]
    fn reject_malformed() {
        for input in [
            "", "1", "1.0", "1.0.0.0", "01.0.0", "1.00.0", "1.0.-1", "+1.0.0", "a.b.c", "1..0",
            " 1.0.0", "1.0.0-rc1", "99999999999999999999.0.0",
        ] {
            let result = input.parse::<Version>();
            assert!(
                matches!(result, Err(Error::VersionFormat(_))),
                "{input} should not parse"
            );
        }
    }

    #[test]
    fn bumps_reset_lower_components() -> Result<(), Box<dyn std::error::Error>> {
        let version = Version::new(2, 5, 7);
        assert_eq!(version.bump_major()?, Version::new(3, 0, 0));
        assert_eq!(version.bump_minor()?, Version::new(2, 6, 0));
        assert_eq!(version.bump_patch()?, Version::new(2, 5, 8));
        assert_eq!(version.bump(ChangeType::Created)?, Version::new(3, 0, 0));
        assert_eq!(version.bump(ChangeType::Minor)?, Version::new(2, 6, 0));
        Ok(())
    }

    #[test]
    fn bump_overflow() {
        let version = Version::new(u64::MAX, u64::MAX, u64::MAX);
        for change in [ChangeType::Major, ChangeType::Minor, ChangeType::Patch] {
            assert!(matches!(version.bump(change), Err(Error::VersionFormat(_))));
        }
        assert_eq!(
            Version::new(1, u64::MAX, 3).bump_major().ok(),
            Some(Version::new(2, 0, 0))
        );
    }

    #[test]
    fn ordering_is_antisymmetric() -> Result<(), Box<dyn std::error::Error>> {
        let versions: Vec<Version> = ["0.0.1", "0.1.0", "1.0.0", "1.0.10", "1.2.0", "2.0.0"]
            .into_iter()
            .map(str::parse)
            .collect::<Result<_, _>>()?;
        for a in &versions {
            assert_eq!(a.cmp(a), Ordering::Equal);
            for b in &versions {
                assert_eq!(a.cmp(b), b.cmp(a).reverse());
            }
        }
        assert!(versions.windows(2).all(|pair| pair[0] < pair[1]));
        Ok(())
    }
}
