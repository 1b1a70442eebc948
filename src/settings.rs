use std::path::PathBuf;

pub const STORE_FILE: &str = "client_data.csv";
pub const CHART_FILE: &str = "carbon_trends.png";
pub const REPORTS_DIR: &str = "Reports";

/// File locations used by a session.
#[derive(Debug, Clone)]
pub struct Settings {
    pub store_path: PathBuf,
    pub chart_path: PathBuf,
    pub reports_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            store_path: PathBuf::from(STORE_FILE),
            chart_path: PathBuf::from(CHART_FILE),
            reports_dir: PathBuf::from(REPORTS_DIR),
        }
    }
}

impl Settings {
    /// Same file names as the defaults, placed under `root`.
    #[cfg(test)]
    pub fn rooted_at(root: &std::path::Path) -> Self {
        Settings {
            store_path: root.join(STORE_FILE),
            chart_path: root.join(CHART_FILE),
            reports_dir: root.join(REPORTS_DIR),
        }
    }

    /// Location of the report for `client`. Path separators in the name are
    /// replaced so the file always lands directly inside `reports_dir`.
    pub fn report_path(&self, client: &str) -> PathBuf {
        let file_stem: String = client
            .chars()
            .map(|c| if c == '/' || c == '\\' { '_' } else { c })
            .collect();
        self.reports_dir.join(format!("{}_report.pdf", file_stem))
    }
}
