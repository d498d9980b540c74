//! `src:dst` mapping parsing and the planner-level overlap check (spec
//! sections 3 and 4.1).

use std::fmt;

/// One `{source, destination}` path pair, normalized per spec section 3:
/// `.` and `/` collapse to empty, leading/trailing separators stripped,
/// internal separators preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMapping {
    pub source: String,
    pub destination: String,
}

impl fmt::Display for PathMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", display_path(&self.source), display_path(&self.destination))
    }
}

fn display_path(p: &str) -> &str {
    if p.is_empty() { "." } else { p }
}

/// Strips `.`, leading/trailing slashes; `.` and `/` alone normalize to "".
pub fn normalize_path(raw: &str) -> String {
    let trimmed = raw.trim_matches('/');
    if trimmed.is_empty() || trimmed == "." {
        return String::new();
    }
    trimmed.to_string()
}

/// Parses a single `src:dst` mapping string. The separator is the first
/// *unescaped* colon; `\:` anywhere de-escapes to a literal `:`. Zero or
/// more than one unescaped colon is a parse error.
pub fn parse_mapping(raw: &str) -> Result<PathMapping, String> {
    let mut halves: Vec<String> = vec![String::new()];
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&':') => {
                chars.next();
                halves.last_mut().unwrap().push(':');
            }
            ':' => halves.push(String::new()),
            other => halves.last_mut().unwrap().push(other),
        }
    }

    if halves.len() != 2 {
        return Err(format!(
            "mapping `{raw}` must contain exactly one unescaped `:` separator, found {}",
            halves.len() - 1
        ));
    }

    Ok(PathMapping {
        source: normalize_path(&halves[0]),
        destination: normalize_path(&halves[1]),
    })
}

/// Parses every `-m` occurrence into an ordered mapping list.
pub fn parse_mappings<'a>(raw: impl IntoIterator<Item = &'a str>) -> Result<Vec<PathMapping>, String> {
    raw.into_iter().map(parse_mapping).collect()
}

/// True if `a` and `b` collide under the prefix-or-equal relation used by
/// the Mapping Planner: equal paths, or one is an ancestor directory of the
/// other. Two empty (repo-root) destinations always collide.
pub fn destinations_overlap(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    if a.is_empty() || b.is_empty() {
        return true;
    }
    let a_prefix = format!("{a}/");
    let b_prefix = format!("{b}/");
    b.starts_with(&a_prefix) || a.starts_with(&b_prefix)
}

/// Validates pairwise non-overlap across all mappings' destinations,
/// returning the first colliding pair found.
pub fn check_no_overlap(mappings: &[PathMapping]) -> Result<(), (String, String)> {
    for i in 0..mappings.len() {
        for j in (i + 1)..mappings.len() {
            let a = &mappings[i].destination;
            let b = &mappings[j].destination;
            if destinations_overlap(a, b) {
                return Err((a.clone(), b.clone()));
            }
        }
    }
    Ok(())
}
