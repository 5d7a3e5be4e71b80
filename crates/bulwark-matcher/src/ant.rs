//! Ant-style path patterns.
//!
//! | Token | Matches |
//! |-------|---------|
//! | `?` | one character |
//! | `*` | zero or more characters within a segment |
//! | `**` | zero or more whole segments |
//! | `{name}` | a segment part, captured as `name` |
//! | `{name:regex}` | a segment part matching `regex`, captured as `name` |
//!
//! Patterns are compiled once. Segments without wildcards are compared as
//! plain strings; the others become anchored regular expressions.

use bulwark_core::{BulwarkError, BulwarkResult};
use bulwark_router::Params;
use regex::Regex;

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    Pattern { regex: Regex, names: Vec<String> },
    AnyDirs,
}

impl Segment {
    fn matches(&self, part: &str, case_sensitive: bool, vars: &mut Params) -> bool {
        match self {
            Self::Literal(literal) if case_sensitive => literal == part,
            Self::Literal(literal) => *literal == part.to_lowercase(),
            Self::Pattern { regex, names } => match regex.captures(part) {
                Some(captures) => {
                    for (index, name) in names.iter().enumerate() {
                        let value = captures.get(index + 1).map_or("", |m| m.as_str());
                        vars.push(name.clone(), value);
                    }
                    true
                }
                None => false,
            },
            Self::AnyDirs => true,
        }
    }
}

/// A compiled Ant-style pattern.
///
/// ```
/// use bulwark_matcher::AntPattern;
///
/// let pattern = AntPattern::new("/orders/{id:\\d+}/**").unwrap();
/// let vars = pattern.match_path("/orders/42/items/7").unwrap();
/// assert_eq!(vars.get("id"), Some("42"));
/// assert!(!pattern.matches("/orders/abc"));
/// ```
#[derive(Debug, Clone)]
pub struct AntPattern {
    source: String,
    segments: Vec<Segment>,
    case_sensitive: bool,
    match_all: bool,
}

impl AntPattern {
    /// Compiles a case-sensitive pattern.
    pub fn new(pattern: &str) -> BulwarkResult<Self> {
        Self::with_case_sensitivity(pattern, true)
    }

    /// Compiles a pattern with the given case sensitivity.
    ///
    /// Fails with a configuration error when a `{` is unclosed, a variable
    /// has no name, or a custom regex does not compile or contains its own
    /// capturing groups.
    pub fn with_case_sensitivity(pattern: &str, case_sensitive: bool) -> BulwarkResult<Self> {
        let mut segments: Vec<Segment> = Vec::new();
        for part in split_path(pattern) {
            let segment = compile_segment(part, case_sensitive, pattern)?;
            let repeated = matches!(
                (segments.last(), &segment),
                (Some(Segment::AnyDirs), Segment::AnyDirs)
            );
            if !repeated {
                segments.push(segment);
            }
        }

        Ok(Self {
            source: pattern.to_string(),
            segments,
            case_sensitive,
            match_all: pattern == "**" || pattern == "/**",
        })
    }

    /// Returns the pattern text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns true if literal segments are compared case-sensitively.
    #[must_use]
    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Returns true if the path matches.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.match_path(path).is_some()
    }

    /// Matches a path, returning the captured variables on success.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<Params> {
        if self.match_all {
            return Some(Params::new());
        }
        if self.source.starts_with('/') != path.starts_with('/') {
            return None;
        }
        let ends_with_any_dirs = matches!(self.segments.last(), Some(Segment::AnyDirs));
        if !ends_with_any_dirs && self.source.ends_with('/') != path.ends_with('/') {
            return None;
        }

        let parts: Vec<&str> = split_path(path).collect();
        let mut vars = Params::new();
        self.match_from(0, &parts, 0, &mut vars).then_some(vars)
    }

    fn match_from(&self, index: usize, parts: &[&str], at: usize, vars: &mut Params) -> bool {
        let Some(segment) = self.segments.get(index) else {
            return at == parts.len();
        };

        if let Segment::AnyDirs = segment {
            for next in at..=parts.len() {
                let mark = vars.len();
                if self.match_from(index + 1, parts, next, vars) {
                    return true;
                }
                vars.truncate(mark);
            }
            return false;
        }

        let Some(part) = parts.get(at) else {
            return false;
        };
        let mark = vars.len();
        if segment.matches(part, self.case_sensitive, vars)
            && self.match_from(index + 1, parts, at + 1, vars)
        {
            return true;
        }
        vars.truncate(mark);
        false
    }
}

impl std::fmt::Display for AntPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn compile_segment(segment: &str, case_sensitive: bool, pattern: &str) -> BulwarkResult<Segment> {
    if segment == "**" {
        return Ok(Segment::AnyDirs);
    }
    if !segment.contains(['*', '?', '{']) {
        let literal = if case_sensitive {
            segment.to_string()
        } else {
            segment.to_lowercase()
        };
        return Ok(Segment::Literal(literal));
    }

    let mut source = String::from(if case_sensitive { "^" } else { "(?i)^" });
    let mut names = Vec::new();
    let mut literal = String::new();
    let mut chars = segment.chars();

    while let Some(c) = chars.next() {
        match c {
            '*' | '?' | '{' => {
                source.push_str(&regex::escape(&literal));
                literal.clear();
            }
            _ => {
                literal.push(c);
                continue;
            }
        }
        match c {
            '*' => source.push_str(".*"),
            '?' => source.push('.'),
            _ => {
                let body = take_braced(&mut chars).ok_or_else(|| {
                    BulwarkError::configuration(format!("Unclosed '{{' in pattern '{pattern}'"))
                })?;
                let (name, custom) = match body.split_once(':') {
                    Some((name, custom)) => (name.trim(), Some(custom)),
                    None => (body.trim(), None),
                };
                if name.is_empty() {
                    return Err(BulwarkError::configuration(format!(
                        "Unnamed variable in pattern '{pattern}'"
                    )));
                }
                source.push('(');
                source.push_str(custom.unwrap_or(".*"));
                source.push(')');
                names.push(name.to_string());
            }
        }
    }
    source.push_str(&regex::escape(&literal));
    source.push('$');

    let regex = Regex::new(&source).map_err(|e| {
        BulwarkError::configuration(format!("Invalid pattern '{pattern}': {e}"))
    })?;
    if regex.captures_len() - 1 != names.len() {
        return Err(BulwarkError::configuration(format!(
            "Segment '{segment}' of pattern '{pattern}' declares {} variables but its regex has {} capturing groups; use non-capturing groups (?:...)",
            names.len(),
            regex.captures_len() - 1
        )));
    }

    Ok(Segment::Pattern { regex, names })
}

/// Consumes up to the `}` closing an already-consumed `{`, honoring nested
/// braces inside custom regexes.
fn take_braced(chars: &mut std::str::Chars<'_>) -> Option<String> {
    let mut depth = 1usize;
    let mut body = String::new();
    for c in chars.by_ref() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(body);
                }
            }
            _ => {}
        }
        body.push(c);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(pattern: &str, path: &str) -> bool {
        AntPattern::new(pattern).unwrap().matches(path)
    }

    #[test]
    fn test_literal_pattern() {
        assert!(matches("/orders", "/orders"));
        assert!(!matches("/orders", "/orders/1"));
        assert!(!matches("/orders", "/Orders"));
    }

    #[test]
    fn test_single_star_stays_within_segment() {
        assert!(matches("/orders/*", "/orders/42"));
        assert!(!matches("/orders/*", "/orders/42/items"));
        assert!(!matches("/orders/*", "/orders"));
        assert!(matches("/files/*.txt", "/files/notes.txt"));
        assert!(!matches("/files/*.txt", "/files/notes.md"));
    }

    #[test]
    fn test_double_star_spans_segments() {
        assert!(matches("/orders/**", "/orders"));
        assert!(matches("/orders/**", "/orders/42/items"));
        assert!(matches("/a/**/z", "/a/z"));
        assert!(matches("/a/**/z", "/a/b/c/z"));
        assert!(!matches("/a/**/z", "/a/b"));
        assert!(matches("/a/**/**/z", "/a/b/z"));
    }

    #[test]
    fn test_match_all() {
        assert!(matches("/**", "/"));
        assert!(matches("/**", "/anything/at/all"));
        assert!(matches("**", "/x"));
    }

    #[test]
    fn test_question_mark() {
        assert!(matches("/file?.txt", "/file1.txt"));
        assert!(!matches("/file?.txt", "/file10.txt"));
    }

    #[test]
    fn test_leading_and_trailing_slash() {
        assert!(!matches("orders", "/orders"));
        assert!(!matches("/orders", "/orders/"));
        assert!(matches("/orders/", "/orders/"));
        assert!(matches("/orders/**", "/orders/"));
        assert!(matches("/", "/"));
    }

    #[test]
    fn test_variables() {
        let pattern = AntPattern::new("/users/{id}/posts/{post}").unwrap();
        let vars = pattern.match_path("/users/7/posts/hello").unwrap();
        assert_eq!(vars.get("id"), Some("7"));
        assert_eq!(vars.get("post"), Some("hello"));
        assert!(pattern.match_path("/users/7").is_none());
    }

    #[test]
    fn test_variables_within_segment() {
        let pattern = AntPattern::new("/img/{name}.{ext}").unwrap();
        let vars = pattern.match_path("/img/logo.png").unwrap();
        assert_eq!(vars.get("name"), Some("logo"));
        assert_eq!(vars.get("ext"), Some("png"));
    }

    #[test]
    fn test_custom_regex_variable() {
        let pattern = AntPattern::new("/users/{id:\\d+}").unwrap();
        assert_eq!(pattern.match_path("/users/12").unwrap().get("id"), Some("12"));
        assert!(!pattern.matches("/users/ab"));

        let pattern = AntPattern::new("/codes/{code:[A-Z]{2}}").unwrap();
        assert!(pattern.matches("/codes/GB"));
        assert!(!pattern.matches("/codes/GBR"));
    }

    #[test]
    fn test_variables_reset_when_backtracking() {
        let pattern = AntPattern::new("/**/{last}/end").unwrap();
        let vars = pattern.match_path("/a/b/c/end").unwrap();
        assert_eq!(vars.len(), 1);
        assert_eq!(vars.get("last"), Some("c"));
    }

    #[test]
    fn test_case_insensitive() {
        let pattern = AntPattern::with_case_sensitivity("/Admin/*.HTML", false).unwrap();
        assert!(pattern.matches("/admin/index.html"));
        assert!(pattern.matches("/ADMIN/INDEX.html"));
        assert!(!pattern.is_case_sensitive());
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(AntPattern::new("/users/{id").unwrap_err().is_configuration());
        assert!(AntPattern::new("/users/{}").unwrap_err().is_configuration());
        assert!(AntPattern::new("/users/{id:[}").unwrap_err().is_configuration());
        assert!(AntPattern::new("/users/{id:(a|b)}").unwrap_err().is_configuration());
        assert!(AntPattern::new("/users/{id:(?:a|b)}").is_ok());
    }

    #[test]
    fn test_literal_characters_are_escaped() {
        assert!(matches("/a.b/*", "/a.b/x"));
        assert!(!matches("/a.b*", "/aXb"));
    }

    #[test]
    fn test_display() {
        assert_eq!(AntPattern::new("/x/**").unwrap().to_string(), "/x/**");
    }
}
