//! Shell language variants

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A shell language variant to use when quoting and parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LangVariant {
    /// GNU Bash
    #[default]
    Bash,
    /// POSIX Shell
    #[serde(alias = "sh")]
    Posix,
    /// The MirBSD Korn Shell
    Mksh,
    /// Bash Automated Testing System, a small extension of Bash
    Bats,
    /// Pick a variant from the input; parses like Bash
    Auto,
}

impl LangVariant {
    /// Every concrete variant, in declaration order
    pub const CONCRETE: [LangVariant; 4] = [
        LangVariant::Bash,
        LangVariant::Posix,
        LangVariant::Mksh,
        LangVariant::Bats,
    ];

    /// Lowercase name of the variant
    pub fn name(&self) -> &'static str {
        match self {
            LangVariant::Bash => "bash",
            LangVariant::Posix => "posix",
            LangVariant::Mksh => "mksh",
            LangVariant::Bats => "bats",
            LangVariant::Auto => "auto",
        }
    }

    /// Whether the variant has the Korn shell extensions shared by Bash and
    /// mksh, such as `function` and `$'...'`
    pub fn has_ksh_extensions(&self) -> bool {
        !matches!(self, LangVariant::Posix)
    }
}

impl fmt::Display for LangVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error for an unrecognised variant name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown shell variant '{0}'")]
pub struct UnknownVariant(pub String);

impl FromStr for LangVariant {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bash" => Ok(LangVariant::Bash),
            "posix" | "sh" => Ok(LangVariant::Posix),
            "mksh" => Ok(LangVariant::Mksh),
            "bats" => Ok(LangVariant::Bats),
            "auto" => Ok(LangVariant::Auto),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_names_roundtrip() {
        for variant in LangVariant::CONCRETE {
            assert_eq!(variant.name().parse::<LangVariant>(), Ok(variant));
        }
        assert_eq!("auto".parse::<LangVariant>(), Ok(LangVariant::Auto));
        assert_eq!("SH".parse::<LangVariant>(), Ok(LangVariant::Posix));
    }

    #[test]
    fn test_unknown_variant() {
        let err = "zsh".parse::<LangVariant>().unwrap_err();
        assert_eq!(err.to_string(), "unknown shell variant 'zsh'");
    }

    #[test]
    fn test_default_is_bash() {
        assert_eq!(LangVariant::default(), LangVariant::Bash);
    }
}
