//! Ant-style glob path matching.
//!
//! Supported pattern elements, per path segment:
//!
//! - `?` matches exactly one character
//! - `*` matches zero or more characters within a segment
//! - `**` matches zero or more whole segments (may appear multiple times)
//! - `{name}` matches exactly one segment and binds it as a path variable
//!
//! Matching is total: no pattern, however malformed, makes it panic.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A successful glob match with extracted path variables.
///
/// `variables` holds one entry per `{name}` segment in the pattern, in
/// left-to-right order of appearance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathMatchResult {
    pub pattern: String,
    pub path: String,
    variables: Vec<(String, String)>,
}

impl PathMatchResult {
    /// All extracted variables, in pattern order.
    pub fn variables(&self) -> &[(String, String)] {
        &self.variables
    }

    /// Looks up a variable by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.variables
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Segment-wise glob matcher with a configurable separator.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    separator: String,
}

impl Default for PathMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl PathMatcher {
    /// Creates a matcher with the default `/` separator.
    pub fn new() -> Self {
        Self::with_separator("/")
    }

    /// Creates a matcher with a custom separator. An empty separator falls
    /// back to `/`.
    pub fn with_separator(separator: impl Into<String>) -> Self {
        let separator = separator.into();
        let separator = if separator.is_empty() {
            "/".to_string()
        } else {
            separator
        };
        Self { separator }
    }

    /// Checks whether `path` matches `pattern`.
    pub fn matches(&self, pattern: &str, path: &str) -> bool {
        self.do_match(pattern, path, None)
    }

    /// Matches and extracts `{name}` path variables.
    ///
    /// Returns `None` on any mismatch; partial bindings are never surfaced.
    pub fn match_and_extract(&self, pattern: &str, path: &str) -> Option<PathMatchResult> {
        let mut bindings = HashMap::new();
        if !self.do_match(pattern, path, Some(&mut bindings)) {
            return None;
        }

        // Re-walk the pattern so the variable list comes out in
        // left-to-right pattern order regardless of match order.
        let mut variables = Vec::new();
        for segment in self.tokenize(pattern) {
            if let Some(name) = capture_name(segment)
                && let Some(value) = bindings.get(name)
            {
                variables.push((name.to_string(), value.clone()));
            }
        }

        Some(PathMatchResult {
            pattern: pattern.to_string(),
            path: path.to_string(),
            variables,
        })
    }

    /// Two-pointer match: anchor literal runs from both ends, then greedily
    /// place the segment runs between consecutive `**` wildcards.
    fn do_match(
        &self,
        pattern: &str,
        path: &str,
        mut variables: Option<&mut HashMap<String, String>>,
    ) -> bool {
        let patt_dirs = self.tokenize(pattern);
        let path_dirs = self.tokenize(path);

        let mut patt_start: isize = 0;
        let mut patt_end: isize = patt_dirs.len() as isize - 1;
        let mut path_start: isize = 0;
        let mut path_end: isize = path_dirs.len() as isize - 1;

        // Consume matching segments up to the first `**`.
        while patt_start <= patt_end && path_start <= path_end {
            let pat_dir = patt_dirs[patt_start as usize];
            if pat_dir == "**" {
                break;
            }
            if !match_segment(pat_dir, path_dirs[path_start as usize], &mut variables) {
                return false;
            }
            patt_start += 1;
            path_start += 1;
        }

        if path_start > path_end {
            // Path exhausted: every leftover pattern segment must be `**`.
            return (patt_start..=patt_end).all(|i| patt_dirs[i as usize] == "**");
        }

        if patt_start > patt_end {
            // Pattern exhausted but path segments remain.
            return false;
        }

        // Consume matching segments backward up to the last `**`.
        while patt_start <= patt_end && path_start <= path_end {
            let pat_dir = patt_dirs[patt_end as usize];
            if pat_dir == "**" {
                break;
            }
            if !match_segment(pat_dir, path_dirs[path_end as usize], &mut variables) {
                return false;
            }
            patt_end -= 1;
            path_end -= 1;
        }

        if path_start > path_end {
            return (patt_start..=patt_end).all(|i| patt_dirs[i as usize] == "**");
        }

        // Place the literal runs between consecutive `**` segments.
        while patt_start != patt_end && path_start <= path_end {
            let mut next_star: isize = -1;
            for i in (patt_start + 1)..=patt_end {
                if patt_dirs[i as usize] == "**" {
                    next_star = i;
                    break;
                }
            }
            if next_star == patt_start + 1 {
                // Consecutive `**`: skip.
                patt_start += 1;
                continue;
            }

            let run_len = next_star - patt_start - 1;
            let path_len = path_end - path_start + 1;
            let mut found: isize = -1;

            'outer: for offset in 0..=(path_len - run_len) {
                for j in 0..run_len {
                    let sub_pat = patt_dirs[(patt_start + j + 1) as usize];
                    let sub_str = path_dirs[(path_start + offset + j) as usize];
                    if !match_segment(sub_pat, sub_str, &mut variables) {
                        continue 'outer;
                    }
                }
                found = path_start + offset;
                break;
            }

            if found == -1 {
                return false;
            }

            patt_start = next_star;
            path_start = found + run_len;
        }

        (patt_start..=patt_end).all(|i| patt_dirs[i as usize] == "**")
    }

    /// Splits into segments, stripping one leading and one trailing
    /// separator. An empty input tokenizes to a single empty segment.
    fn tokenize<'a>(&self, path: &'a str) -> Vec<&'a str> {
        let sep = self.separator.as_str();
        let mut trimmed = path;
        if let Some(rest) = trimmed.strip_prefix(sep) {
            trimmed = rest;
        }
        if let Some(rest) = trimmed.strip_suffix(sep) {
            trimmed = rest;
        }
        if trimmed.is_empty() {
            return vec![""];
        }
        trimmed.split(sep).collect()
    }
}

/// Returns the capture name if the segment is a `{name}` binding.
fn capture_name(segment: &str) -> Option<&str> {
    if segment.len() >= 2 && segment.starts_with('{') && segment.ends_with('}') {
        Some(&segment[1..segment.len() - 1])
    } else {
        None
    }
}

/// Matches a single path segment against a single pattern segment.
///
/// `{name}` segments match unconditionally and record a binding. `*` and `?`
/// use classic backtracking wildcard matching: on mismatch, fall back to the
/// most recent `*` and retry one character further along.
fn match_segment(
    pattern: &str,
    segment: &str,
    variables: &mut Option<&mut HashMap<String, String>>,
) -> bool {
    if let Some(name) = capture_name(pattern) {
        if let Some(vars) = variables.as_deref_mut() {
            vars.insert(name.to_string(), segment.to_string());
        }
        return true;
    }

    let pat: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = segment.chars().collect();

    let mut p = 0usize;
    let mut t = 0usize;
    let mut star: Option<usize> = None;
    let mut star_text = 0usize;

    while t < text.len() {
        if p < pat.len() && (pat[p] == '?' || pat[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pat.len() && pat[p] == '*' {
            star = Some(p);
            p += 1;
            star_text = t;
        } else if let Some(star_pos) = star {
            p = star_pos + 1;
            star_text += 1;
            t = star_text;
        } else {
            return false;
        }
    }

    while p < pat.len() && pat[p] == '*' {
        p += 1;
    }

    p == pat.len()
}
