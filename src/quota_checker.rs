use {
    crate::{
        api_client::AccountApi,
        config::{QuotaSettings, Settings},
        errors::{Error, Result},
        mailer::Notifier,
        message,
    },
    slog::{debug, error, info, o, Level},
    slog_unwraps::ResultExt,
};

/// Storage numbers of one mailbox, in bytes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccountQuota {
    pub used: f64,
    pub max: f64,
}

impl AccountQuota {
    /// Percentage of the quota in use, rounded to two decimals.
    pub fn ratio(&self, account: &str) -> Result<f64> {
        if self.max == 0.0 {
            return Err(Error::ZeroQuota {
                account: account.to_string(),
            });
        }
        return Ok((self.used / self.max * 100.0 * 100.0).round() / 100.0);
    }

    /// `"<used> av <max> (<ratio>%)"`
    pub fn usage_text(&self, ratio: f64) -> String {
        return format!(
            "{} av {} ({}%)",
            message::number(self.used),
            message::number(self.max),
            message::number(ratio)
        );
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub address: String,
    pub usage: String,
}

#[derive(Debug)]
pub enum Evaluation {
    Whitelisted { usage: String },
    UnderThreshold { usage: String },
    OverThreshold(Notice),
    Failed(Error),
}

pub fn evaluate(cfg: &QuotaSettings, account: &str, quota: &AccountQuota) -> Evaluation {
    use Evaluation::*;

    let ratio = match quota.ratio(account) {
        Ok(ratio) => ratio,
        Err(err) => return Failed(err),
    };
    let usage = quota.usage_text(ratio);
    if cfg.is_whitelisted(account) {
        return Whitelisted { usage };
    }
    if ratio > cfg.ratio {
        return OverThreshold(Notice {
            address: account.to_string(),
            usage,
        });
    }
    return UnderThreshold { usage };
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub checked: usize,
    pub notified: usize,
    pub undelivered: usize,
    pub whitelisted: usize,
    pub failed: usize,
}

pub struct QuotaChecker<'a, A: AccountApi, N: Notifier> {
    cfg: &'a Settings,
    api: A,
    notifier: N,
}

impl<'a, A: AccountApi, N: Notifier> QuotaChecker<'a, A, N> {
    pub fn new(cfg: &'a Settings, api: A, notifier: N) -> Self {
        return QuotaChecker { cfg, api, notifier };
    }

    /// Checks every configured domain. The first API failure aborts the run.
    pub fn run(&mut self, log: &slog::Logger) -> Result<RunSummary> {
        let cfg = self.cfg;
        let mut summary = RunSummary::default();
        for domain in &cfg.quota.domains {
            let log = &log.new(o!("domain"=>domain.clone()));
            self.check_domain(log, domain, &mut summary)?;
        }
        info!(log, "Check finished";
            "checked"=>summary.checked,
            "notified"=>summary.notified,
            "undelivered"=>summary.undelivered,
            "whitelisted"=>summary.whitelisted,
            "failed"=>summary.failed
        );
        return Ok(summary);
    }

    fn check_domain(
        &mut self,
        log: &slog::Logger,
        domain: &str,
        summary: &mut RunSummary,
    ) -> Result<()> {
        self.notifier.begin_domain(domain)?;
        debug!(log, "Get account list");
        let accounts = self.api.list_accounts(domain).log(log, Level::Error)?;
        debug!(log, "Accounts"; "count"=>accounts.len());
        for account in &accounts {
            let log = &log.new(o!("account"=>account.clone()));
            let quota = self.api.get_quota(account).log(log, Level::Error)?;
            debug!(log, "Quota"; "used"=>quota.used, "max"=>quota.max);
            summary.checked += 1;
            match evaluate(&self.cfg.quota, account, &quota) {
                Evaluation::Whitelisted { usage } => {
                    summary.whitelisted += 1;
                    info!(log, "Whitelisted. Skip warning."; "usage"=>usage);
                }
                Evaluation::UnderThreshold { usage } => {
                    info!(log, "Below threshold"; "usage"=>usage);
                }
                Evaluation::OverThreshold(notice) => {
                    info!(log, "Over threshold"; "usage"=>&notice.usage);
                    match self.notifier.notify(log, &notice) {
                        Ok(()) => summary.notified += 1,
                        Err(err) => {
                            summary.undelivered += 1;
                            error!(log, "Warning not delivered"; "error"=>err.to_string());
                        }
                    }
                }
                Evaluation::Failed(err) => {
                    summary.failed += 1;
                    error!(log, "Can't evaluate account"; "error"=>err.to_string());
                }
            }
        }
        return Ok(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{capture, discard};
    use std::collections::{HashMap, HashSet};

    const CONFIG: &str = "[API]\nURL = https://api.example.com/email/\nuser = u\nkey = k\n\
        [Quota]\ndomainname = one.se, two.se\nwhitelist = boss@one.se\n";

    #[derive(Default)]
    struct FakeApi {
        accounts: HashMap<String, Vec<String>>,
        quotas: HashMap<String, AccountQuota>,
    }

    impl FakeApi {
        fn with(mut self, domain: &str, account: &str, used: f64, max: f64) -> Self {
            self.accounts
                .entry(domain.to_string())
                .or_insert_with(Vec::new)
                .push(account.to_string());
            self.quotas
                .insert(account.to_string(), AccountQuota { used, max });
            return self;
        }
    }

    impl AccountApi for FakeApi {
        fn list_accounts(&self, domain: &str) -> Result<Vec<String>> {
            return Ok(self.accounts.get(domain).cloned().unwrap_or_default());
        }

        fn get_quota(&self, account: &str) -> Result<AccountQuota> {
            return self.quotas.get(account).copied().ok_or_else(|| Error::MalformedResponse {
                url: "https://api.example.com/email/quota".to_string(),
                reason: format!("no quota for {}", account),
            });
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Vec<Notice>,
        domains: Vec<String>,
        fail_for: HashSet<String>,
    }

    impl Notifier for RecordingNotifier {
        fn begin_domain(&mut self, domain: &str) -> Result<()> {
            self.domains.push(domain.to_string());
            return Ok(());
        }

        fn notify(&mut self, _log: &slog::Logger, notice: &Notice) -> Result<()> {
            if self.fail_for.contains(&notice.address) {
                return Err(Error::IoError(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "smtp down",
                )));
            }
            self.sent.push(notice.clone());
            return Ok(());
        }
    }

    fn settings() -> Settings {
        return Settings::from_ini_str(CONFIG).unwrap();
    }

    #[test]
    fn ratio_is_rounded_percentage() {
        let quota = AccountQuota {
            used: 40.0,
            max: 50.0,
        };
        assert_eq!(quota.ratio("a@one.se").unwrap(), 80.0);
        let quota = AccountQuota {
            used: 1.0,
            max: 3.0,
        };
        assert_eq!(quota.ratio("a@one.se").unwrap(), 33.33);
    }

    #[test]
    fn zero_max_is_an_error() {
        let quota = AccountQuota { used: 1.0, max: 0.0 };
        match quota.ratio("a@one.se") {
            Err(Error::ZeroQuota { account }) => assert_eq!(account, "a@one.se"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn over_default_threshold_notifies() {
        let cfg = settings();
        let quota = AccountQuota {
            used: 85.0,
            max: 100.0,
        };
        match evaluate(&cfg.quota, "anna@one.se", &quota) {
            Evaluation::OverThreshold(notice) => {
                assert_eq!(notice.address, "anna@one.se");
                assert_eq!(notice.usage, "85.0 av 100.0 (85.0%)");
            }
            other => panic!("unexpected evaluation: {:?}", other),
        }
    }

    #[test]
    fn threshold_itself_is_not_exceeded() {
        let mut cfg = settings();
        cfg.quota.ratio = 80.0;
        let quota = AccountQuota {
            used: 40.0,
            max: 50.0,
        };
        match evaluate(&cfg.quota, "anna@one.se", &quota) {
            Evaluation::UnderThreshold { usage } => assert_eq!(usage, "40.0 av 50.0 (80.0%)"),
            other => panic!("unexpected evaluation: {:?}", other),
        }
    }

    #[test]
    fn whitelisted_never_notifies() {
        let cfg = settings();
        let quota = AccountQuota {
            used: 99.0,
            max: 100.0,
        };
        match evaluate(&cfg.quota, "boss@one.se", &quota) {
            Evaluation::Whitelisted { .. } => {}
            other => panic!("unexpected evaluation: {:?}", other),
        }
    }

    #[test]
    fn run_notifies_each_violator_once() {
        let cfg = settings();
        let api = FakeApi::default()
            .with("one.se", "anna@one.se", 90.0, 100.0)
            .with("one.se", "boss@one.se", 99.0, 100.0)
            .with("one.se", "bo@one.se", 10.0, 100.0)
            .with("two.se", "cecilia@two.se", 95.0, 100.0);
        let mut checker = QuotaChecker::new(&cfg, api, RecordingNotifier::default());
        let summary = checker.run(&discard()).unwrap();

        assert_eq!(checker.notifier.domains, vec!["one.se", "two.se"]);
        let sent: Vec<&str> = checker
            .notifier
            .sent
            .iter()
            .map(|notice| notice.address.as_str())
            .collect();
        assert_eq!(sent, vec!["anna@one.se", "cecilia@two.se"]);
        assert_eq!(summary.checked, 4);
        assert_eq!(summary.notified, 2);
        assert_eq!(summary.whitelisted, 1);
    }

    #[test]
    fn zero_quota_does_not_stop_run() {
        let cfg = settings();
        let api = FakeApi::default()
            .with("one.se", "empty@one.se", 0.0, 0.0)
            .with("one.se", "anna@one.se", 90.0, 100.0);
        let mut checker = QuotaChecker::new(&cfg, api, RecordingNotifier::default());
        let summary = checker.run(&discard()).unwrap();
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.notified, 1);
        assert_eq!(checker.notifier.sent[0].address, "anna@one.se");
    }

    #[test]
    fn undelivered_warning_does_not_stop_run() {
        let cfg = settings();
        let api = FakeApi::default()
            .with("one.se", "anna@one.se", 90.0, 100.0)
            .with("one.se", "bo@one.se", 91.0, 100.0)
            .with("two.se", "cecilia@two.se", 95.0, 100.0);
        let mut notifier = RecordingNotifier::default();
        notifier.fail_for.insert("anna@one.se".to_string());
        let mut checker = QuotaChecker::new(&cfg, api, notifier);
        let summary = checker.run(&discard()).unwrap();
        assert_eq!(summary.undelivered, 1);
        assert_eq!(summary.notified, 2);
        assert_eq!(checker.notifier.sent.len(), 2);
    }

    #[test]
    fn api_failure_aborts_run() {
        let cfg = settings();
        let mut api = FakeApi::default()
            .with("one.se", "anna@one.se", 90.0, 100.0)
            .with("two.se", "cecilia@two.se", 95.0, 100.0);
        api.accounts
            .get_mut("one.se")
            .unwrap()
            .insert(0, "ghost@one.se".to_string());
        let mut checker = QuotaChecker::new(&cfg, api, RecordingNotifier::default());
        let err = checker.run(&discard()).unwrap_err();
        assert!(err.is_transport());
        assert!(checker.notifier.sent.is_empty());
        assert_eq!(checker.notifier.domains, vec!["one.se"]);
    }

    #[test]
    fn verbose_run_logs_each_account() {
        let cfg = Settings::from_ini_str(&format!("{}[Other]\nverbose = true\n", CONFIG)).unwrap();
        let api = FakeApi::default().with("one.se", "bo@one.se", 10.0, 100.0);
        let (log, buf) = capture(&cfg);
        QuotaChecker::new(&cfg, api, RecordingNotifier::default())
            .run(&log)
            .unwrap();

        let line = buf
            .text()
            .lines()
            .find(|line| line.contains("Below threshold"))
            .map(str::to_string)
            .unwrap_or_else(|| panic!("no account record in:\n{}", buf.text()));
        assert!(line.contains("INFO"), "{}", line);
        assert!(line.contains("bo@one.se"), "{}", line);
        assert!(line.contains("10.0 av 100.0 (10.0%)"), "{}", line);
    }

    #[test]
    fn quiet_run_logs_nothing() {
        let cfg = settings();
        assert!(!cfg.is_talkative());
        let api = FakeApi::default()
            .with("one.se", "bo@one.se", 10.0, 100.0)
            .with("one.se", "anna@one.se", 90.0, 100.0);
        let (log, buf) = capture(&cfg);
        QuotaChecker::new(&cfg, api, RecordingNotifier::default())
            .run(&log)
            .unwrap();
        assert_eq!(buf.text(), "");
    }
}
