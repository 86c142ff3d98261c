//! Shell pattern matching for `${name#pattern}` and friends
//!
//! Patterns are translated to anchored regular expressions; `*`, `?` and
//! bracket expressions keep their shell meaning and everything else matches
//! itself.

use regex::Regex;

/// Which end of the value a pattern is removed from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Trim {
    SmallestPrefix,
    LargestPrefix,
    SmallestSuffix,
    LargestSuffix,
}

pub(super) fn remove(value: &str, pattern: &str, trim: Trim) -> String {
    let Some(re) = compile(pattern) else {
        return value.to_string();
    };
    let mut cuts: Vec<usize> = value
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(value.len()))
        .collect();
    // order the cut points so the first match is the one wanted
    match trim {
        Trim::SmallestPrefix | Trim::LargestSuffix => {}
        Trim::LargestPrefix | Trim::SmallestSuffix => cuts.reverse(),
    }
    for cut in cuts {
        let (matched, rest) = match trim {
            Trim::SmallestPrefix | Trim::LargestPrefix => (&value[..cut], &value[cut..]),
            Trim::SmallestSuffix | Trim::LargestSuffix => (&value[cut..], &value[..cut]),
        };
        if re.is_match(matched) {
            return rest.to_string();
        }
    }
    value.to_string()
}

/// `None` only for patterns past the regex size limit, which match nothing
fn compile(pattern: &str) -> Option<Regex> {
    Regex::new(&format!("^(?s:{})$", translate(pattern)))
        .or_else(|_| Regex::new(&format!("^{}$", regex::escape(pattern))))
        .ok()
}

fn translate(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '\\' => match chars.next() {
                Some(next) => out.push_str(&regex::escape(&next.to_string())),
                None => out.push_str("\\\\"),
            },
            '[' => {
                let mut class = String::new();
                let mut closed = false;
                if matches!(chars.peek(), Some('!' | '^')) {
                    chars.next();
                    class.push('^');
                }
                if chars.peek() == Some(&']') {
                    chars.next();
                    class.push_str("\\]");
                }
                for c in chars.by_ref() {
                    match c {
                        ']' => {
                            closed = true;
                            break;
                        }
                        '\\' | '[' | '&' | '~' => {
                            class.push('\\');
                            class.push(c);
                        }
                        _ => class.push(c),
                    }
                }
                if closed {
                    out.push('[');
                    out.push_str(&class);
                    out.push(']');
                } else {
                    out.push_str("\\[");
                    out.push_str(&regex::escape(&class));
                }
            }
            _ => out.push_str(&regex::escape(&c.to_string())),
        }
    }
    out
}
