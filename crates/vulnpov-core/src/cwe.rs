use std::fmt;
use std::str::FromStr;

/// One of the CWE classes this system knows how to reason about. Every
/// TestGen run is driven by exactly one of these, picked from the
/// project's advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CweClass {
    /// CWE-22: path traversal.
    PathTraversal,
    /// CWE-78: OS command injection.
    CommandInjection,
    /// CWE-79: cross-site scripting.
    Xss,
    /// CWE-94: code injection.
    CodeInjection,
}

impl CweClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PathTraversal => "CWE-22",
            Self::CommandInjection => "CWE-78",
            Self::Xss => "CWE-79",
            Self::CodeInjection => "CWE-94",
        }
    }

    pub fn cwe_number(&self) -> u32 {
        match self {
            Self::PathTraversal => 22,
            Self::CommandInjection => 78,
            Self::Xss => 79,
            Self::CodeInjection => 94,
        }
    }

    /// The essence of the instruction injected into the TestGen prompt for this class.
    pub fn instruction_essence(&self) -> &'static str {
        match self {
            Self::PathTraversal => {
                "externally exercise the project's API so that it reads from or writes to a path \
                 outside the project directory"
            }
            Self::CommandInjection => {
                "externally exercise the project's API so that it executes an unintended shell \
                 command"
            }
            Self::Xss => {
                "pass a scripting payload through the project's API so that it is emitted \
                 unsanitized into output"
            }
            Self::CodeInjection => {
                "externally exercise the project's API so that it executes unintended code"
            }
        }
    }

    /// Parses a CWE identifier of the form `CWE-22`, `cwe-22`, or bare `22`, returning `None`
    /// for any class this system does not know how to handle.
    pub fn from_identifier(id: &str) -> Option<Self> {
        let digits = id.trim().trim_start_matches(['C', 'c']).trim_start_matches(['W', 'w']).trim_start_matches(['E', 'e']).trim_start_matches('-');
        match digits {
            "22" => Some(Self::PathTraversal),
            "78" => Some(Self::CommandInjection),
            "79" => Some(Self::Xss),
            "94" => Some(Self::CodeInjection),
            _ => None,
        }
    }

    /// Picks the class this system should target from an advisory's ordered CWE list: the
    /// first identifier that maps to a known class.
    pub fn first_known(cwe_ids: &[String]) -> Option<Self> {
        cwe_ids.iter().find_map(|id| Self::from_identifier(id))
    }
}

impl fmt::Display for CweClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CweClass {
    type Err = UnknownCweError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_identifier(s).ok_or_else(|| UnknownCweError(s.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown or unsupported CWE identifier '{0}'")]
pub struct UnknownCweError(pub String);
