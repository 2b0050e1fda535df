use std::fmt;

/// A draw.io style string: an ordered list of bare flags (`text;`,
/// `swimlane;`) and `key=value;` pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style {
    entries: Vec<(String, Option<String>)>,
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a literal style string such as `"rounded=1;whiteSpace=wrap;"`.
    pub fn parse(raw: &str) -> Self {
        let mut style = Self::new();
        for part in raw.split(';') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            match part.split_once('=') {
                Some((key, value)) => style.insert(key.trim(), Some(value.trim().to_string())),
                None => style.insert(part, None),
            }
        }
        style
    }

    #[must_use]
    pub fn set(mut self, key: &str, value: impl ToString) -> Self {
        self.insert(key, Some(value.to_string()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn has(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    fn insert(&mut self, key: &str, value: Option<String>) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key.to_string(), value));
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.entries {
            match value {
                Some(value) => write!(f, "{key}={value};")?,
                None => write!(f, "{key};")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_declaration_order_and_overrides_in_place() {
        let style = Style::parse("text;html=1;align=left;")
            .set("align", "center")
            .set("fontSize", 12);
        assert_eq!(style.to_string(), "text;html=1;align=center;fontSize=12;");
        assert_eq!(style.get("fontSize"), Some("12"));
        assert!(style.has("text"));
    }
}
