use {
    crate::{
        config::SmtpSettings,
        errors::Result,
        message,
        quota_checker::Notice,
    },
    lettre::{
        smtp::{authentication::Credentials, ClientSecurity},
        ClientTlsParameters, SmtpClient, Transport,
    },
    native_tls::TlsConnector,
    slog::{debug, info, o, Level},
    slog_unwraps::ResultExt,
    std::io,
};

/// Delivers one over-threshold warning.
pub trait Notifier {
    /// Called before the accounts of `domain` are evaluated.
    fn begin_domain(&mut self, _domain: &str) -> Result<()> {
        return Ok(());
    }

    fn notify(&mut self, log: &slog::Logger, notice: &Notice) -> Result<()>;
}

/// Prints `<address>: <usage>` lines, used when SMTP is disabled.
pub struct ConsoleNotifier<W: io::Write> {
    out: W,
}

impl ConsoleNotifier<io::Stdout> {
    pub fn stdout() -> Self {
        return ConsoleNotifier { out: io::stdout() };
    }
}

impl<W: io::Write> ConsoleNotifier<W> {
    pub fn new(out: W) -> Self {
        return ConsoleNotifier { out };
    }

    pub fn into_inner(self) -> W {
        return self.out;
    }
}

impl<W: io::Write> Notifier for ConsoleNotifier<W> {
    fn begin_domain(&mut self, domain: &str) -> Result<()> {
        writeln!(self.out, "Checking {}...", domain)?;
        return Ok(());
    }

    fn notify(&mut self, _log: &slog::Logger, notice: &Notice) -> Result<()> {
        writeln!(self.out, "{}: {}", notice.address, notice.usage)?;
        return Ok(());
    }
}

pub struct SmtpMailer {
    cfg: SmtpSettings,
    threshold: f64,
    date: String,
}

impl SmtpMailer {
    /// `date` is printed in the subject, formatted `YYYY-MM-DD`.
    pub fn new(cfg: &SmtpSettings, threshold: f64, date: String) -> SmtpMailer {
        return SmtpMailer {
            cfg: cfg.clone(),
            threshold,
            date,
        };
    }

    fn create_email(&self, notice: &Notice) -> lettre_email::EmailBuilder {
        return lettre_email::Email::builder()
            .from(self.cfg.sender.as_str())
            .to(notice.address.as_str())
            .subject(message::subject(&self.date))
            .text(message::body(&notice.usage, self.threshold));
    }

    fn client(&self) -> Result<SmtpClient> {
        let addr = (self.cfg.server.as_str(), self.cfg.port);
        if self.cfg.tls {
            // STARTTLS on the same port, refusing to continue in plain text.
            let tls = ClientTlsParameters::new(self.cfg.server.clone(), TlsConnector::new()?);
            return Ok(SmtpClient::new(addr, ClientSecurity::Required(tls))?);
        }
        return Ok(SmtpClient::new(addr, ClientSecurity::None)?);
    }
}

impl Notifier for SmtpMailer {
    fn notify(&mut self, log: &slog::Logger, notice: &Notice) -> Result<()> {
        let log = &log.new(o!(
            "server"=>self.cfg.server.clone(),
            "port"=>self.cfg.port,
            "tls"=>self.cfg.tls
        ));
        let email = self
            .create_email(notice)
            .build()
            .log(log, Level::Error)?;
        let mut transport = self
            .client()
            .log(log, Level::Error)?
            .credentials(Credentials::new(
                self.cfg.user.clone(),
                self.cfg.password.clone(),
            ))
            .transport();
        debug!(log, "Send warning");
        let res = transport.send(email.into());
        transport.close();
        let res = res.log(log, Level::Error)?;
        info!(log, "Email sent"; "code"=>format!("{:?}", res.code), "res-message"=>format!("{:?}", res.message));
        return Ok(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::discard;
    use std::{io::Write, net::TcpListener, thread};

    fn smtp() -> SmtpSettings {
        return SmtpSettings {
            server: "127.0.0.1".to_string(),
            port: 25,
            tls: false,
            user: "u@example.com".to_string(),
            password: "secret".to_string(),
            sender: "kaos@example.com".to_string(),
        };
    }

    fn notice() -> Notice {
        return Notice {
            address: "anna@example.com".to_string(),
            usage: "85.0 av 100.0 (85.0%)".to_string(),
        };
    }

    #[test]
    fn console_prints_address_and_usage() {
        let mut notifier = ConsoleNotifier::new(Vec::new());
        notifier.begin_domain("example.com").unwrap();
        notifier.notify(&discard(), &notice()).unwrap();
        let out = String::from_utf8(notifier.into_inner()).unwrap();
        assert_eq!(
            out,
            "Checking example.com...\nanna@example.com: 85.0 av 100.0 (85.0%)\n"
        );
    }

    #[test]
    fn email_envelope_has_sender_and_recipient() {
        let mailer = SmtpMailer::new(&smtp(), 84.9, "2024-03-01".to_string());
        let email: lettre::SendableEmail = mailer.create_email(&notice()).build().unwrap().into();
        let envelope = format!("{:?}", email.envelope());
        assert!(envelope.contains("anna@example.com"));
        assert!(envelope.contains("kaos@example.com"));
    }

    #[test]
    fn refused_session_is_an_error_on_configured_port() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            stream.write_all(b"554 no service here\r\n").unwrap();
        });

        let mut cfg = smtp();
        cfg.port = port;
        let mut mailer = SmtpMailer::new(&cfg, 84.9, "2024-03-01".to_string());
        assert!(mailer.notify(&discard(), &notice()).is_err());
        server.join().unwrap();
    }
}
