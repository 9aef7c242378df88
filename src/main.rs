use {
    quota_warning::{
        api_client::ApiClient,
        config::{Settings, EXAMPLE_CONFIG_INI},
        errors::Result,
        flags::ReporterFlags,
        logging::create_logger,
        mailer::{ConsoleNotifier, SmtpMailer},
        quota_checker::{QuotaChecker, RunSummary},
    },
    slog::{debug, info},
    std::process,
};

fn main() {
    let opt = ReporterFlags::args();

    if opt.print_example_config {
        println!("{}", EXAMPLE_CONFIG_INI);
        return;
    }

    if let Err(err) = run(&opt.config) {
        eprintln!("Abort: {}", err);
        process::exit(err.exit_code());
    }
}

fn run(config_file: &str) -> Result<RunSummary> {
    let cfg = Settings::from_file(config_file)?;

    let log = &create_logger(&cfg);
    debug!(log, "Config loaded"; "file"=>config_file, "domains"=>cfg.quota.domains.len(), "ratio"=>cfg.quota.ratio);

    let api = ApiClient::new(&cfg.api);
    match &cfg.smtp {
        Some(smtp) => {
            info!(log, "Send warnings by email"; "server"=>&smtp.server);
            let date = chrono::Local::now().format("%Y-%m-%d").to_string();
            let mailer = SmtpMailer::new(smtp, cfg.quota.ratio, date);
            return QuotaChecker::new(&cfg, api, mailer).run(log);
        }
        None => {
            debug!(log, "SMTP disabled. Print warnings.");
            return QuotaChecker::new(&cfg, api, ConsoleNotifier::stdout()).run(log);
        }
    }
}
