//! Distinguished-name grammar for controller objects.
//!
//! ```text
//! dn    := rn ( "/" rn )*
//! rn    := prefix [ "-" value ]
//! value := any text; "[...]" sections may contain "/" and nest
//! ```
//!
//! Example: `uni/infra/accportprof-LF1102_INTPROF/hports-ISEL-1.10-typ-range`
//! parses into four relative names; the owning profile is the value of the
//! `accportprof` relative name.

use std::fmt;

/// Relative-name prefix that introduces an interface profile.
pub const PROFILE_RN_PREFIX: &str = "accportprof";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DnError {
    Empty,
    /// Two separators in a row, or a leading/trailing separator.
    EmptyRn { position: usize },
    UnbalancedBrackets,
}

impl fmt::Display for DnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DnError::Empty => write!(f, "dn is empty"),
            DnError::EmptyRn { position } => {
                write!(f, "dn has an empty relative name at index {position}")
            }
            DnError::UnbalancedBrackets => write!(f, "dn has unbalanced brackets"),
        }
    }
}

impl std::error::Error for DnError {}

/// One relative name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rn {
    pub prefix: String,
    pub value: Option<String>,
}

impl Rn {
    fn parse(raw: &str) -> Self {
        match raw.split_once('-') {
            Some((prefix, value)) if !prefix.contains('[') => Rn {
                prefix: prefix.to_string(),
                value: Some(value.to_string()),
            },
            _ => Rn {
                prefix: raw.to_string(),
                value: None,
            },
        }
    }
}

impl fmt::Display for Rn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => write!(f, "{}-{}", self.prefix, v),
            None => f.write_str(&self.prefix),
        }
    }
}

/// A parsed distinguished name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dn {
    rns: Vec<Rn>,
}

impl Dn {
    pub fn parse(raw: &str) -> Result<Self, DnError> {
        if raw.is_empty() {
            return Err(DnError::Empty);
        }

        let mut segments: Vec<&str> = Vec::new();
        let mut depth: usize = 0;
        let mut start = 0;
        for (i, c) in raw.char_indices() {
            match c {
                '[' => depth += 1,
                ']' => {
                    depth = depth.checked_sub(1).ok_or(DnError::UnbalancedBrackets)?;
                }
                '/' if depth == 0 => {
                    segments.push(&raw[start..i]);
                    start = i + 1;
                }
                _ => {}
            }
        }
        if depth != 0 {
            return Err(DnError::UnbalancedBrackets);
        }
        segments.push(&raw[start..]);

        let mut rns = Vec::with_capacity(segments.len());
        for (position, seg) in segments.into_iter().enumerate() {
            if seg.is_empty() {
                return Err(DnError::EmptyRn { position });
            }
            rns.push(Rn::parse(seg));
        }
        Ok(Dn { rns })
    }

    pub fn rns(&self) -> &[Rn] {
        &self.rns
    }

    /// First relative name with the given prefix.
    pub fn find(&self, prefix: &str) -> Option<&Rn> {
        self.rns.iter().find(|rn| rn.prefix == prefix)
    }
}

impl fmt::Display for Dn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, rn) in self.rns.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{rn}")?;
        }
        Ok(())
    }
}

/// Who owns a selector object, judged from its DN.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectorOwner {
    Profile(String),
    /// Not under an interface profile (or not parseable); not ours to track.
    Foreign,
}

pub fn classify_selector_dn(raw: &str) -> SelectorOwner {
    let Ok(dn) = Dn::parse(raw) else {
        return SelectorOwner::Foreign;
    };
    match dn.find(PROFILE_RN_PREFIX).and_then(|rn| rn.value.as_deref()) {
        Some(profile) if !profile.is_empty() => SelectorOwner::Profile(profile.to_string()),
        _ => SelectorOwner::Foreign,
    }
}
