//! Section/key=value files in the layout config.ini uses.
//!
//! Only whole lines starting with `#` or `;` are comments. Inside a value `#` is kept and
//! `;` starts a comment only after whitespace, so passwords and keys survive untouched.

use {
    crate::errors::{Error, Result},
    std::io::Write,
};

#[derive(Debug, Clone, PartialEq)]
pub struct IniSection {
    pub name: String,
    entries: Vec<(String, String)>,
}

impl IniSection {
    fn new(name: &str) -> Self {
        return IniSection {
            name: name.to_string(),
            entries: Vec::new(),
        };
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        return self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()));
    }

    fn position(&self, key: &str) -> Option<usize> {
        return self
            .entries
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(key));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        return self.position(key).map(|pos| self.entries[pos].1.as_str());
    }

    /// Overwrites an existing key in place, keeping its spelling.
    fn set(&mut self, key: &str, value: String) {
        match self.position(key) {
            Some(pos) => self.entries[pos].1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    fn remove(&mut self, key: &str) -> Option<String> {
        let pos = self.position(key)?;
        return Some(self.entries.remove(pos).1);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IniDocument {
    sections: Vec<IniSection>,
}

impl IniDocument {
    pub fn parse(text: &str) -> Result<Self> {
        let mut doc = IniDocument::default();
        let mut current: Option<usize> = None;
        // Key of the last entry, continuation lines are appended to it.
        let mut last_key: Option<String> = None;
        for (index, line) in text.lines().enumerate() {
            let number = index + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }
            if line.starts_with(|c: char| c.is_whitespace()) {
                if let (Some(pos), Some(key)) = (current, &last_key) {
                    let section = &mut doc.sections[pos];
                    let mut value = section.get(key).unwrap_or_default().to_string();
                    value.push('\n');
                    value.push_str(&strip_inline_comment(trimmed));
                    section.set(key, value);
                    continue;
                }
            }
            if trimmed.starts_with('[') {
                let name = match trimmed.find(']') {
                    Some(end) => trimmed[1..end].trim(),
                    None => return Err(parse_error(number, "unterminated section header")),
                };
                current = Some(doc.section_index(name));
                last_key = None;
                continue;
            }
            let split = match trimmed.find(|c: char| c == '=' || c == ':') {
                Some(split) if split > 0 => split,
                _ => return Err(parse_error(number, "expected key = value")),
            };
            let pos = match current {
                Some(pos) => pos,
                None => return Err(parse_error(number, "key outside of any section")),
            };
            let key = trimmed[..split].trim();
            let value = strip_inline_comment(trimmed[split + 1..].trim());
            doc.sections[pos].set(key, value);
            last_key = Some(key.to_string());
        }
        return Ok(doc);
    }

    /// Index of the named section, appended when missing.
    fn section_index(&mut self, name: &str) -> usize {
        match self
            .sections
            .iter()
            .position(|s| s.name.eq_ignore_ascii_case(name))
        {
            Some(pos) => pos,
            None => {
                self.sections.push(IniSection::new(name));
                self.sections.len() - 1
            }
        }
    }

    pub fn sections(&self) -> impl Iterator<Item = &IniSection> {
        return self.sections.iter();
    }

    pub fn section(&self, name: &str) -> Option<&IniSection> {
        return self
            .sections
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name));
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        return self.section(section)?.get(key);
    }

    /// Creates the section when it doesn't exist yet.
    pub fn set(&mut self, section: &str, key: &str, value: String) {
        let pos = self.section_index(section);
        self.sections[pos].set(key, value);
    }

    pub fn remove(&mut self, section: &str, key: &str) -> Option<String> {
        return self
            .sections
            .iter_mut()
            .find(|s| s.name.eq_ignore_ascii_case(section))?
            .remove(key);
    }

    /// Values are written verbatim, multi-line values as indented continuation lines.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        for section in &self.sections {
            writeln!(writer, "[{}]", section.name)?;
            for (key, value) in &section.entries {
                writeln!(writer, "{} = {}", key, value.replace('\n', "\n\t"))?;
            }
            writeln!(writer)?;
        }
        return Ok(());
    }
}

/// `;` opens a comment only when whitespace precedes it.
fn strip_inline_comment(value: &str) -> String {
    let mut prev_space = false;
    for (pos, c) in value.char_indices() {
        if c == ';' && prev_space {
            return value[..pos].trim_end().to_string();
        }
        prev_space = c.is_whitespace();
    }
    return value.to_string();
}

fn parse_error(line: usize, reason: &str) -> Error {
    return Error::IniError(format!("line {}: {}", line, reason));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_semicolon_inside_values_are_kept() {
        let doc = IniDocument::parse(
            "# comment\n[SMTP]\npassword = p4ss#word;x\\y\nuser = u ; who sends\n; other\n",
        )
        .unwrap();
        assert_eq!(doc.get("SMTP", "password"), Some("p4ss#word;x\\y"));
        assert_eq!(doc.get("smtp", "USER"), Some("u"));
    }

    #[test]
    fn colon_separator_and_continuation_lines() {
        let doc = IniDocument::parse("[Quota]\nwhitelist: a@x.se,\n  b@x.se\nratio=90\n").unwrap();
        assert_eq!(doc.get("Quota", "whitelist"), Some("a@x.se,\nb@x.se"));
        assert_eq!(doc.get("Quota", "ratio"), Some("90"));
    }

    #[test]
    fn malformed_lines_are_reported_with_line_number() {
        match IniDocument::parse("[API]\njust words\n") {
            Err(Error::IniError(reason)) => assert!(reason.starts_with("line 2")),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(IniDocument::parse("key = value\n").is_err());
        assert!(IniDocument::parse("[API\n").is_err());
    }

    #[test]
    fn set_keeps_key_spelling_and_order() {
        let mut doc = IniDocument::parse("[API]\nurl = https://a/\nuser = u\n").unwrap();
        doc.set("API", "URL", "https://b/".to_string());
        doc.set("Other", "debug", "True".to_string());
        assert_eq!(doc.remove("API", "user"), Some("u".to_string()));

        let mut buf = Vec::new();
        doc.write_to(&mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "[API]\nurl = https://b/\n\n[Other]\ndebug = True\n\n"
        );
    }

    #[test]
    fn written_values_read_back_verbatim() {
        let mut doc = IniDocument::default();
        doc.set("API", "key", "ab#cd;ef\\gh".to_string());
        doc.set("Quota", "whitelist", "a@x.se,\nb@x.se".to_string());
        let mut buf = Vec::new();
        doc.write_to(&mut buf).unwrap();
        let reloaded = IniDocument::parse(&String::from_utf8(buf).unwrap()).unwrap();
        assert_eq!(reloaded, doc);
    }
}
