use {
    crate::{
        errors::{Error, Result},
        ini_file::IniDocument,
    },
    serde_derive::Deserialize,
    slog::Level,
    std::{collections::HashSet, fs, path::Path},
};

pub const EXAMPLE_CONFIG_INI: &str = include_str!("../config.ini.example");

pub const DEFAULT_RATIO: f64 = 84.9;

/// Plain SMTP port, STARTTLS is negotiated on it when TLS is on.
pub const DEFAULT_SMTP_PORT: u16 = 25;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogFormat {
    Lines,
    Compact,
}

/// Values as they are written in the file, before defaults and type parsing.
/// Section and key names are lowercased on the way in.
#[derive(Debug, Default, Deserialize)]
struct RawSettings {
    #[serde(default)]
    api: RawApi,
    #[serde(default)]
    quota: RawQuota,
    #[serde(default)]
    smtp: RawSmtp,
    #[serde(default)]
    other: RawOther,
}

#[derive(Debug, Default, Deserialize)]
struct RawApi {
    url: Option<String>,
    user: Option<String>,
    key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawQuota {
    domainname: Option<String>,
    ratio: Option<String>,
    whitelist: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSmtp {
    enabled: Option<String>,
    server: Option<String>,
    tls: Option<String>,
    port: Option<String>,
    user: Option<String>,
    password: Option<String>,
    sender: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawOther {
    debug: Option<String>,
    verbose: Option<String>,
    log_format: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApiSettings {
    /// Always ends with `/`.
    pub url: String,
    pub user: String,
    pub key: String,
}

#[derive(Debug, Clone)]
pub struct QuotaSettings {
    pub domains: Vec<String>,
    pub ratio: f64,
    whitelist: HashSet<String>,
}

impl QuotaSettings {
    pub fn is_whitelisted(&self, address: &str) -> bool {
        return self.whitelist.contains(&address.trim().to_lowercase());
    }
}

#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub server: String,
    pub port: u16,
    pub tls: bool,
    pub user: String,
    pub password: String,
    pub sender: String,
}

#[derive(Debug, Clone)]
pub struct OtherSettings {
    pub debug: bool,
    pub verbose: bool,
    pub log_format: LogFormat,
}

/// Resolved configuration, built once at startup and passed by reference.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api: ApiSettings,
    pub quota: QuotaSettings,
    /// `None` when SMTP is disabled and warnings go to stdout.
    pub smtp: Option<SmtpSettings>,
    pub other: OtherSettings,
}

impl Settings {
    pub fn from_file(fname: &str) -> Result<Self> {
        if !Path::new(fname).is_file() {
            return Err(Error::ConfigFileMissing(fname.to_string()));
        }
        return Settings::from_ini_str(&fs::read_to_string(fname)?);
    }

    pub fn from_ini_str(text: &str) -> Result<Self> {
        return Settings::from_document(&IniDocument::parse(text)?);
    }

    pub fn from_document(doc: &IniDocument) -> Result<Self> {
        let mut cfg = ::config::Config::new();
        for section in doc.sections().filter(|s| is_plain_name(&s.name)) {
            for (key, value) in section.entries().filter(|(key, _)| is_plain_name(key)) {
                let path = format!("{}.{}", section.name.to_lowercase(), key.to_lowercase());
                cfg.set(&path, value.to_string())?;
            }
        }
        return Settings::resolve(cfg.try_into()?);
    }

    fn resolve(raw: RawSettings) -> Result<Self> {
        let api = ApiSettings {
            url: normalize_url(&required(raw.api.url, "API", "URL")?),
            user: required(raw.api.user, "API", "user")?,
            key: required(raw.api.key, "API", "key")?,
        };

        let domains = split_list(&required(raw.quota.domainname, "Quota", "domainname")?);
        if domains.is_empty() {
            return Err(Error::ConfigIncomplete {
                section: "Quota",
                key: "domainname",
            });
        }
        let quota = QuotaSettings {
            domains,
            ratio: raw
                .quota
                .ratio
                .as_deref()
                .and_then(parse_ratio)
                .unwrap_or(DEFAULT_RATIO),
            whitelist: raw
                .quota
                .whitelist
                .as_deref()
                .map(split_list)
                .unwrap_or_default()
                .into_iter()
                .map(|address| address.to_lowercase())
                .collect(),
        };

        let smtp_enabled = flag(raw.smtp.enabled.as_deref(), false);
        let smtp = if smtp_enabled {
            Some(SmtpSettings {
                server: required(raw.smtp.server, "SMTP", "server")?,
                port: raw
                    .smtp
                    .port
                    .as_deref()
                    .and_then(|port| port.trim().parse().ok())
                    .unwrap_or(DEFAULT_SMTP_PORT),
                // Unparsable value keeps encryption on.
                tls: flag(raw.smtp.tls.as_deref(), true),
                user: required(raw.smtp.user, "SMTP", "user")?,
                password: required(raw.smtp.password, "SMTP", "password")?,
                sender: required(raw.smtp.sender, "SMTP", "sender")?,
            })
        } else {
            None
        };

        let other = OtherSettings {
            debug: flag(raw.other.debug.as_deref(), false),
            verbose: flag(raw.other.verbose.as_deref(), false),
            log_format: match raw.other.log_format.as_deref().map(str::trim) {
                Some(format) if format.eq_ignore_ascii_case("compact") => LogFormat::Compact,
                _ => LogFormat::Lines,
            },
        };

        return Ok(Settings {
            api,
            quota,
            smtp,
            other,
        });
    }

    pub fn is_talkative(&self) -> bool {
        return self.other.verbose || self.other.debug;
    }

    pub fn log_level(&self) -> Level {
        if self.other.debug {
            Level::Debug
        } else if self.other.verbose {
            Level::Info
        } else {
            Level::Critical
        }
    }
}

/// Names the `config` crate can address as a path segment; other keys are never read.
fn is_plain_name(name: &str) -> bool {
    return !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
}

fn required(value: Option<String>, section: &'static str, key: &'static str) -> Result<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(Error::ConfigIncomplete { section, key }),
    }
}

pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    if url.ends_with('/') {
        return url.to_string();
    }
    return format!("{}/", url);
}

pub fn split_list(value: &str) -> Vec<String> {
    return value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect();
}

/// Accepts both `.` and `,` as decimal separator.
pub fn parse_ratio(value: &str) -> Option<f64> {
    return value
        .trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|ratio| ratio.is_finite());
}

pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "yes" | "true" | "on" => Some(true),
        "0" | "no" | "false" | "off" => Some(false),
        _ => None,
    }
}

fn flag(value: Option<&str>, default: bool) -> bool {
    return value.and_then(parse_bool).unwrap_or(default);
}
