use std::fmt::Display;

pub type Result<T> = std::result::Result<T, Error>;

/// Exit status when the configuration file does not exist.
pub const EXIT_CONFIG_MISSING: i32 = 1;
/// Exit status when talking to the account API failed.
pub const EXIT_TRANSPORT: i32 = 2;
/// Exit status for a malformed or incomplete configuration.
pub const EXIT_CONFIG_INVALID: i32 = 3;
pub const EXIT_IO: i32 = 4;
pub const EXIT_OTHER: i32 = 5;

#[derive(Debug)]
pub enum Error {
    ConfigFileMissing(String),
    ConfigIncomplete {
        section: &'static str,
        key: &'static str,
    },
    ConfigError(::config::ConfigError),
    IniError(String),
    IoError(std::io::Error),
    ApiTransport {
        url: String,
        source: reqwest::Error,
    },
    ApiAuthentication {
        url: String,
        status: u16,
    },
    ApiRejected {
        url: String,
        code: u16,
        text: String,
    },
    MalformedResponse {
        url: String,
        reason: String,
    },
    ZeroQuota {
        account: String,
    },
    UnknownSetting(String),
    LettreEmailError(lettre_email::error::Error),
    LettreSmtpError(lettre::smtp::error::Error),
    TlsError(native_tls::Error),
}

use Error::*;

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            ConfigFileMissing(_) => EXIT_CONFIG_MISSING,
            ConfigIncomplete { .. } | ConfigError(_) | IniError(_) | UnknownSetting(_) => {
                EXIT_CONFIG_INVALID
            }
            ApiTransport { .. }
            | ApiAuthentication { .. }
            | ApiRejected { .. }
            | MalformedResponse { .. } => EXIT_TRANSPORT,
            IoError(_) => EXIT_IO,
            ZeroQuota { .. } | LettreEmailError(_) | LettreSmtpError(_) | TlsError(_) => {
                EXIT_OTHER
            }
        }
    }

    /// Failures talking to the account API abort the whole run.
    pub fn is_transport(&self) -> bool {
        return self.exit_code() == EXIT_TRANSPORT;
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigFileMissing(fname) => write!(
                f,
                "No configuration file found at {}. Copy config.ini.example to config.ini and edit it, or run quota-config.",
                fname
            ),
            ConfigIncomplete { section, key } => write!(
                f,
                "Configuration section {} is incomplete: {} is missing or empty",
                section, key
            ),
            ConfigError(err) => Display::fmt(err, f),
            IniError(err) => write!(f, "Can't parse configuration file: {}", err),
            IoError(err) => Display::fmt(err, f),
            ApiTransport { url, source } => write!(f, "No connection to {}: {}", url, source),
            ApiAuthentication { url, status } => {
                write!(f, "API refused credentials at {} (status {})", url, status)
            }
            ApiRejected { url, code, text } => {
                write!(f, "API request to {} failed with {}: {}", url, code, text)
            }
            MalformedResponse { url, reason } => {
                write!(f, "Malformed response from {}: {}", url, reason)
            }
            ZeroQuota { account } => write!(f, "Account {} has a quota of zero bytes", account),
            UnknownSetting(name) => write!(f, "Unknown setting: {}", name),
            LettreEmailError(err) => Display::fmt(err, f),
            LettreSmtpError(err) => Display::fmt(err, f),
            TlsError(err) => Display::fmt(err, f),
        }
    }
}

impl From<::config::ConfigError> for Error {
    fn from(err: ::config::ConfigError) -> Error {
        ConfigError(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        IoError(err)
    }
}

impl From<lettre::smtp::error::Error> for Error {
    fn from(err: lettre::smtp::error::Error) -> Self {
        LettreSmtpError(err)
    }
}

impl From<native_tls::Error> for Error {
    fn from(err: native_tls::Error) -> Self {
        TlsError(err)
    }
}

impl From<lettre_email::error::Error> for Error {
    fn from(err: lettre_email::error::Error) -> Self {
        LettreEmailError(err)
    }
}
