//! Single-string regular expressions matched against whole token values.
//!
//! Patterns are implicitly anchored at both ends. `.*` and `.+` are
//! recognised up front and never reach the regex engine.

use std::borrow::Cow;
use std::fmt;

use regex_automata::meta::Regex;
use regex_automata::util::syntax;

/// Errors from compiling a token regex.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid regular expression `{pattern}`: {message}")]
pub struct RegexError {
    pub pattern: String,
    pub message: String,
}

/// Matching flags, written `%c`, `%d`, `%l` in the query language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RegexFlags {
    /// `%c`: case-insensitive.
    pub ignore_case: bool,
    /// `%d`: ignore diacritics on both pattern and subject.
    pub ignore_diacritics: bool,
    /// `%l`: the pattern is a literal string.
    pub literal: bool,
}

impl RegexFlags {
    pub const NONE: Self = Self {
        ignore_case: false,
        ignore_diacritics: false,
        literal: false,
    };

    /// Parse a flag suffix such as `%cd`. Unknown letters yield `None`.
    pub fn parse(spec: &str) -> Option<Self> {
        let spec = spec.strip_prefix('%').unwrap_or(spec);
        let mut flags = Self::NONE;
        for c in spec.chars() {
            match c {
                'c' => flags.ignore_case = true,
                'd' => flags.ignore_diacritics = true,
                'l' => flags.literal = true,
                _ => return None,
            }
        }
        Some(flags)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }
}

impl fmt::Display for RegexFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return Ok(());
        }
        f.write_str("%")?;
        if self.ignore_case {
            f.write_str("c")?;
        }
        if self.ignore_diacritics {
            f.write_str("d")?;
        }
        if self.literal {
            f.write_str("l")?;
        }
        Ok(())
    }
}

#[derive(Clone)]
enum Matcher {
    /// `.*`: every value, including the empty string.
    Any,
    /// `.+`: every non-empty value.
    NonEmpty,
    /// Plain string comparison (literal without case folding).
    Exact(String),
    Engine(Regex),
}

/// A compiled single-string regex.
#[derive(Clone)]
pub struct TokenRegex {
    source: String,
    flags: RegexFlags,
    matcher: Matcher,
}

impl TokenRegex {
    pub fn new(pattern: &str, flags: RegexFlags) -> Result<Self, RegexError> {
        let matcher = if flags.literal {
            if flags.ignore_case {
                Self::build_engine(&regex_syntax::escape(&fold_pattern(pattern, flags)), flags)?
            } else {
                Matcher::Exact(fold_pattern(pattern, flags).into_owned())
            }
        } else {
            match pattern {
                ".*" => Matcher::Any,
                ".+" => Matcher::NonEmpty,
                _ => Self::build_engine(&fold_pattern(pattern, flags), flags)?,
            }
        };

        Ok(Self {
            source: pattern.to_owned(),
            flags,
            matcher,
        })
    }

    fn build_engine(pattern: &str, flags: RegexFlags) -> Result<Matcher, RegexError> {
        let anchored = format!("^(?:{pattern})$");
        Regex::builder()
            .syntax(syntax::Config::new().case_insensitive(flags.ignore_case))
            .build(&anchored)
            .map(Matcher::Engine)
            .map_err(|e| RegexError {
                pattern: pattern.to_owned(),
                message: e.to_string(),
            })
    }

    /// Pattern as written by the user.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn flags(&self) -> RegexFlags {
        self.flags
    }

    /// `.*`: matches everything.
    pub fn matches_everything(&self) -> bool {
        matches!(self.matcher, Matcher::Any)
    }

    /// `.+`: matches everything but the empty string.
    pub fn matches_non_empty(&self) -> bool {
        matches!(self.matcher, Matcher::NonEmpty)
    }

    pub fn is_match(&self, value: &str) -> bool {
        match &self.matcher {
            Matcher::Any => true,
            Matcher::NonEmpty => !value.is_empty(),
            Matcher::Exact(s) => {
                if self.flags.ignore_diacritics {
                    fold_diacritics(value) == s.as_str()
                } else {
                    value == s
                }
            }
            Matcher::Engine(re) => {
                if self.flags.ignore_diacritics {
                    re.is_match(fold_diacritics(value).as_ref())
                } else {
                    re.is_match(value)
                }
            }
        }
    }
}

impl fmt::Debug for TokenRegex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenRegex({:?}{})", self.source, self.flags)
    }
}

fn fold_pattern(pattern: &str, flags: RegexFlags) -> Cow<'_, str> {
    if flags.ignore_diacritics {
        fold_diacritics(pattern)
    } else {
        Cow::Borrowed(pattern)
    }
}

/// Strip diacritics from Latin letters (`é` -> `e`, `Ø` -> `O`, `ß` -> `ss`).
///
/// Characters outside the Latin-1 and Latin Extended-A blocks pass through.
pub fn fold_diacritics(s: &str) -> Cow<'_, str> {
    if s.is_ascii() {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match base_letter(c) {
            Some(base) => out.push_str(base),
            None => out.push(c),
        }
    }
    Cow::Owned(out)
}

fn base_letter(c: char) -> Option<&'static str> {
    let base = match c {
        'À'..='Å' | 'Ā' | 'Ă' | 'Ą' => "A",
        'à'..='å' | 'ā' | 'ă' | 'ą' => "a",
        'Ç' | 'Ć' | 'Ĉ' | 'Ċ' | 'Č' => "C",
        'ç' | 'ć' | 'ĉ' | 'ċ' | 'č' => "c",
        'Ď' | 'Đ' => "D",
        'ď' | 'đ' => "d",
        'È'..='Ë' | 'Ē' | 'Ĕ' | 'Ė' | 'Ę' | 'Ě' => "E",
        'è'..='ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => "e",
        'Ĝ' | 'Ğ' | 'Ġ' | 'Ģ' => "G",
        'ĝ' | 'ğ' | 'ġ' | 'ģ' => "g",
        'Ĥ' | 'Ħ' => "H",
        'ĥ' | 'ħ' => "h",
        'Ì'..='Ï' | 'Ĩ' | 'Ī' | 'Ĭ' | 'Į' | 'İ' => "I",
        'ì'..='ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' | 'ı' => "i",
        'Ĵ' => "J",
        'ĵ' => "j",
        'Ķ' => "K",
        'ķ' => "k",
        'Ĺ' | 'Ļ' | 'Ľ' | 'Ŀ' | 'Ł' => "L",
        'ĺ' | 'ļ' | 'ľ' | 'ŀ' | 'ł' => "l",
        'Ñ' | 'Ń' | 'Ņ' | 'Ň' => "N",
        'ñ' | 'ń' | 'ņ' | 'ň' => "n",
        'Ò'..='Ö' | 'Ø' | 'Ō' | 'Ŏ' | 'Ő' => "O",
        'ò'..='ö' | 'ø' | 'ō' | 'ŏ' | 'ő' => "o",
        'Ŕ' | 'Ŗ' | 'Ř' => "R",
        'ŕ' | 'ŗ' | 'ř' => "r",
        'Ś' | 'Ŝ' | 'Ş' | 'Š' => "S",
        'ś' | 'ŝ' | 'ş' | 'š' => "s",
        'ß' => "ss",
        'Ţ' | 'Ť' | 'Ŧ' => "T",
        'ţ' | 'ť' | 'ŧ' => "t",
        'Ù'..='Ü' | 'Ũ' | 'Ū' | 'Ŭ' | 'Ů' | 'Ű' | 'Ų' => "U",
        'ù'..='ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => "u",
        'Ŵ' => "W",
        'ŵ' => "w",
        'Ý' | 'Ŷ' | 'Ÿ' => "Y",
        'ý' | 'ÿ' | 'ŷ' => "y",
        'Ź' | 'Ż' | 'Ž' => "Z",
        'ź' | 'ż' | 'ž' => "z",
        _ => return None,
    };
    Some(base)
}
