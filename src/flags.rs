use {crate::editor::EditMode, structopt::StructOpt};

#[derive(StructOpt, Debug)]
#[structopt(name = "quota-warning")]
/// Warns about mailboxes that use too much of their storage quota.
pub struct ReporterFlags {
    #[structopt(short = "c", long = "config", default_value = "config.ini")]
    /// Path to config file
    pub config: String,

    #[structopt(long = "print-example-config")]
    /// Print an example config file and exit.
    pub print_example_config: bool,
}

impl ReporterFlags {
    pub fn args() -> Self {
        ReporterFlags::from_args()
    }
}

#[derive(StructOpt, Debug)]
#[structopt(name = "quota-config")]
/// Edits the quota-warning config file. Without options the current settings are shown.
pub struct EditorFlags {
    #[structopt(short = "a", long = "all", conflicts_with = "edit")]
    /// Edit all settings.
    pub all: bool,

    #[structopt(short = "e", long = "edit")]
    /// Edit one specific setting, as `key` or `Section.key`.
    pub edit: Option<String>,

    #[structopt(short = "c", long = "config", default_value = "config.ini")]
    /// Path to config file
    pub config: String,
}

impl EditorFlags {
    pub fn args() -> Self {
        EditorFlags::from_args()
    }

    pub fn mode(&self) -> EditMode {
        if self.all {
            return EditMode::All;
        }
        match &self.edit {
            Some(name) => EditMode::One(name.clone()),
            None => EditMode::Show,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editor_defaults_to_show() {
        let flags = EditorFlags::from_iter(vec!["quota-config"]);
        assert_eq!(flags.mode(), EditMode::Show);
        assert_eq!(flags.config, "config.ini");
    }

    #[test]
    fn editor_edit_one() {
        let flags = EditorFlags::from_iter(vec!["quota-config", "-e", "ratio", "-c", "/tmp/q.ini"]);
        assert_eq!(flags.mode(), EditMode::One("ratio".to_string()));
        assert_eq!(flags.config, "/tmp/q.ini");
    }

    #[test]
    fn editor_all_conflicts_with_edit() {
        let res = EditorFlags::from_iter_safe(vec!["quota-config", "-a", "-e", "ratio"]);
        assert!(res.is_err());
    }

    #[test]
    fn reporter_config_path() {
        let flags = ReporterFlags::from_iter(vec!["quota-warning", "--config", "other.ini"]);
        assert_eq!(flags.config, "other.ini");
        assert!(!flags.print_example_config);
    }
}
