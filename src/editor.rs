//! Config file editing, kept free of terminal I/O except for [`prompt_edits`].

use {
    crate::{
        config::{self, EXAMPLE_CONFIG_INI},
        errors::{Error, Result},
        ini_file::IniDocument,
    },
    std::{
        fs,
        io::{self, BufRead, Write},
        path::Path,
    },
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Text,
    /// Text that always ends with `/`.
    Url,
    Number,
    Flag,
    /// Comma separated values.
    List,
    Secret,
    Port,
}

#[derive(Debug, PartialEq)]
pub struct Field {
    pub section: &'static str,
    pub key: &'static str,
    pub kind: FieldKind,
    /// Shown when the key is missing from the file.
    pub placeholder: &'static str,
}

macro_rules! field {
    ($section:expr, $key:expr, $kind:ident, $placeholder:expr) => {
        Field {
            section: $section,
            key: $key,
            kind: FieldKind::$kind,
            placeholder: $placeholder,
        }
    };
}

pub const SECTIONS: &[&str] = &["API", "Quota", "SMTP", "Other"];

pub const FIELDS: &[Field] = &[
    field!("API", "URL", Url, "https://api.glesys.com/email/"),
    field!("API", "user", Text, "N/A"),
    field!("API", "key", Secret, "the generated key"),
    field!("Quota", "domainname", List, "example.com, example.se"),
    field!("Quota", "ratio", Number, "84.9"),
    field!("Quota", "whitelist", List, ""),
    field!("SMTP", "enabled", Flag, "False"),
    field!("SMTP", "server", Text, "mail.glesys.com"),
    field!("SMTP", "port", Port, "25"),
    field!("SMTP", "TLS", Flag, "True"),
    field!("SMTP", "user", Text, "u@example.com"),
    field!("SMTP", "password", Secret, "NotMyRealPassword!"),
    field!("SMTP", "sender", Text, "someone@example.com"),
    field!("Other", "debug", Flag, "False"),
    field!("Other", "verbose", Flag, "False"),
    field!("Other", "log_format", Text, "lines"),
];

#[derive(Debug, Clone, PartialEq)]
pub enum EditMode {
    Show,
    All,
    /// `key` or `Section.key`, case-insensitive.
    One(String),
}

pub fn fields_to_edit(mode: &EditMode) -> Result<Vec<&'static Field>> {
    match mode {
        EditMode::Show => Ok(Vec::new()),
        EditMode::All => Ok(FIELDS.iter().collect()),
        EditMode::One(name) => {
            let name = name.trim();
            let (section, key) = match name.find('.') {
                Some(pos) => (Some(&name[..pos]), &name[pos + 1..]),
                None => (None, name),
            };
            let res: Vec<&'static Field> = FIELDS
                .iter()
                .filter(|field| field.key.eq_ignore_ascii_case(key))
                .filter(|field| section.map_or(true, |s| field.section.eq_ignore_ascii_case(s)))
                .collect();
            if res.is_empty() {
                return Err(Error::UnknownSetting(name.to_string()));
            }
            Ok(res)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Set(String),
    /// Drop the key so the reporter falls back to its default.
    Remove,
}

#[derive(Debug, PartialEq)]
pub struct Edit {
    pub field: &'static Field,
    pub change: Change,
}

/// Turns one line of user input into a change. `Ok(None)` keeps the current value.
pub fn normalize_answer(field: &Field, input: &str) -> std::result::Result<Option<Change>, String> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    if input.eq_ignore_ascii_case("skip") {
        return Ok(Some(Change::Remove));
    }
    if input.contains(" ;") || input.contains("\t;") {
        return Err("A ; after whitespace starts a comment, remove the space".to_string());
    }
    let value = match field.kind {
        FieldKind::Text | FieldKind::Secret => input.to_string(),
        FieldKind::Port => match input.parse::<u16>() {
            Ok(port) if port > 0 => port.to_string(),
            _ => return Err(format!("{} is not a port number", input)),
        },
        FieldKind::Url => config::normalize_url(input),
        FieldKind::Number => match config::parse_ratio(input) {
            Some(ratio) => ratio.to_string(),
            None => return Err(format!("{} is not a number", input)),
        },
        FieldKind::Flag => match input.to_lowercase().as_str() {
            "y" | "yes" | "true" => "True".to_string(),
            "n" | "no" | "false" => "False".to_string(),
            _ => return Err("Answer y or n".to_string()),
        },
        FieldKind::List => config::split_list(input).join(", "),
    };
    return Ok(Some(Change::Set(value)));
}

pub struct ConfigDocument {
    doc: IniDocument,
}

impl ConfigDocument {
    pub fn from_ini_str(text: &str) -> Result<Self> {
        return Ok(ConfigDocument {
            doc: IniDocument::parse(text)?,
        });
    }

    /// Reads `path`, or the bundled example when the file doesn't exist yet.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return ConfigDocument::from_ini_str(EXAMPLE_CONFIG_INI);
        }
        return ConfigDocument::from_ini_str(&fs::read_to_string(path)?);
    }

    pub fn has_section(&self, section: &str) -> bool {
        return self.doc.section(section).is_some();
    }

    pub fn stored(&self, field: &Field) -> Option<&str> {
        return self.doc.get(field.section, field.key);
    }

    /// The stored value, or the placeholder when absent.
    pub fn current(&self, field: &Field) -> String {
        let value = self.stored(field).unwrap_or(field.placeholder);
        if field.kind == FieldKind::Url {
            return config::normalize_url(value);
        }
        return value.to_string();
    }

    /// Applies the edits, creating sections as needed.
    pub fn apply(mut self, edits: Vec<Edit>) -> Self {
        for edit in edits {
            let (section, key) = (edit.field.section, edit.field.key);
            match edit.change {
                Change::Set(value) => self.doc.set(section, key, value),
                Change::Remove => {
                    self.doc.remove(section, key);
                }
            }
        }
        return self;
    }

    pub fn summary(&self) -> String {
        let mut res = String::new();
        for section in SECTIONS {
            if !self.has_section(section) {
                res.push_str(&format!("Section {} missing in config file.\n\n", section));
                continue;
            }
            res.push_str(&format!("Current settings for {}\n", section));
            for field in FIELDS.iter().filter(|field| field.section == *section) {
                let value = match field.kind {
                    FieldKind::Secret if self.stored(field).is_some() => "********".to_string(),
                    _ => self.current(field),
                };
                res.push_str(&format!("    {}: {}\n", field.key, value));
            }
            res.push('\n');
        }
        return res;
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        return self.doc.write_to(writer);
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut writer = fs::File::create(path)?;
        return self.write_to(&mut writer);
    }
}

/// Asks for a new value of every field. End of input keeps the remaining values.
pub fn prompt_edits<R: BufRead, W: Write>(
    doc: &ConfigDocument,
    fields: &[&'static Field],
    input: &mut R,
    out: &mut W,
) -> Result<Vec<Edit>> {
    let mut edits = Vec::new();
    'fields: for &field in fields {
        writeln!(
            out,
            "Updating {} in {}, current value: {}",
            field.key,
            field.section,
            doc.current(field)
        )?;
        loop {
            if field.kind == FieldKind::Flag {
                write!(out, "Set to True? (y/n, empty keeps current) ")?;
            } else {
                writeln!(out, "Empty to use current value or 'skip' to omit.")?;
                write!(out, "New value: ")?;
            }
            out.flush()?;
            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                writeln!(out)?;
                break 'fields;
            }
            match normalize_answer(field, &line) {
                Ok(Some(change)) => {
                    edits.push(Edit { field, change });
                    break;
                }
                Ok(None) => break,
                Err(reason) => writeln!(out, "{}", reason)?,
            }
        }
    }
    return Ok(edits);
}

pub fn stdin_edits(doc: &ConfigDocument, fields: &[&'static Field]) -> Result<Vec<Edit>> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    return prompt_edits(doc, fields, &mut input, &mut out);
}
