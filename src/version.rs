//! Version ordering and the closeness rule.
//!
//! Kernel versions are compared component by component as integers, with
//! trailing zero components ignored (`6.2` == `6.2.0`). A component carrying a
//! non-numeric suffix (`0rc3`) is a pre-release and sorts before the same
//! number without a suffix.

use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Component {
    number: u64,
    suffix: String,
}

impl Component {
    fn parse(raw: &str) -> Self {
        let split = raw
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(raw.len());
        let (digits, suffix) = raw.split_at(split);
        Self {
            number: digits.parse().unwrap_or(0),
            suffix: suffix.to_ascii_lowercase(),
        }
    }

    fn zero() -> Self {
        Self {
            number: 0,
            suffix: String::new(),
        }
    }
}

impl Ord for Component {
    fn cmp(&self, other: &Self) -> Ordering {
        self.number.cmp(&other.number).then_with(|| {
            match (self.suffix.is_empty(), other.suffix.is_empty()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => compare_suffix(&self.suffix, &other.suffix),
            }
        })
    }
}

impl PartialOrd for Component {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// `rc10` must sort after `rc9`, so split the suffix into its alphabetic
/// label and trailing number.
fn compare_suffix(a: &str, b: &str) -> Ordering {
    fn split(s: &str) -> (&str, u64) {
        let idx = s
            .rfind(|c: char| !c.is_ascii_digit())
            .map(|i| i + 1)
            .unwrap_or(0);
        let (label, digits) = s.split_at(idx);
        (label, digits.parse().unwrap_or(0))
    }
    split(a).cmp(&split(b))
}

/// A parsed dotted-numeric version.
#[derive(Debug, Clone)]
pub struct DottedVersion {
    components: Vec<Component>,
}

impl DottedVersion {
    pub fn parse(raw: &str) -> Self {
        let mut components: Vec<Component> = raw.trim().split('.').map(Component::parse).collect();
        while components.len() > 1 && components.last() == Some(&Component::zero()) {
            components.pop();
        }
        Self { components }
    }
}

impl Ord for DottedVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        let zero = Component::zero();
        for i in 0..len {
            let a = self.components.get(i).unwrap_or(&zero);
            let b = other.components.get(i).unwrap_or(&zero);
            match a.cmp(b) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for DottedVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for DottedVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DottedVersion {}

/// Split a strictly two-component `major.minor` version.
fn major_minor(version: &str) -> Option<(&str, u64)> {
    let mut parts = version.split('.');
    let major = parts.next()?;
    let minor = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some((major, minor.parse().ok()?))
}

/// Whether `candidate` may seed a config for a `target` kernel.
///
/// Both must be exactly `major.minor`, share the major, and the candidate's
/// minor must be the target's or one above it.
pub fn is_close(target: &str, candidate: &str) -> bool {
    let (Some((target_major, target_minor)), Some((cand_major, cand_minor))) =
        (major_minor(target), major_minor(candidate))
    else {
        return false;
    };
    target_major == cand_major && matches!(cand_minor.checked_sub(target_minor), Some(0 | 1))
}
