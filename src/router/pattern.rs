//! Pathname patterns with ordered parameter capture.

use std::fmt;

use regex::Regex;

/// An anchored matcher over a URL pathname.
///
/// Capture groups become the view's parameters, in group order.
#[derive(Clone)]
pub struct PathPattern {
    regex: Regex,
}

impl PathPattern {
    /// Compile `pattern`, anchoring it at both ends if it is not already.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let mut anchored = String::with_capacity(pattern.len() + 2);
        if !pattern.starts_with('^') {
            anchored.push('^');
        }
        anchored.push_str(pattern);
        if !pattern.ends_with('$') {
            anchored.push('$');
        }
        Ok(Self {
            regex: Regex::new(&anchored)?,
        })
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Captured parameters if `path` matches, `None` otherwise.
    ///
    /// Unmatched optional groups capture as the empty string so parameter
    /// positions stay stable.
    pub fn captures(&self, path: &str) -> Option<Vec<String>> {
        let caps = self.regex.captures(path)?;
        Some(
            caps.iter()
                .skip(1)
                .map(|group| group.map_or_else(String::new, |m| m.as_str().to_string()))
                .collect(),
        )
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl fmt::Debug for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PathPattern").field(&self.regex.as_str()).finish()
    }
}
