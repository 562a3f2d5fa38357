use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::ReportError;
use crate::model::Report;

/// Paths of the three report files written for one run.
#[derive(Debug, Clone)]
pub struct SavedReports {
    pub html_path: PathBuf,
    pub json_path: PathBuf,
    pub text_path: PathBuf,
}

/// Write the HTML, JSON, and text reports under `out_dir`.
///
/// File names share a timestamped base (`report_YYYYMMDD_HHMMSS.*`). The
/// directory is created if missing. Any write failure is fatal to the run.
pub async fn save_reports(
    report: &Report,
    out_dir: impl AsRef<Path>,
    generated_at: DateTime<Utc>,
) -> Result<SavedReports, ReportError> {
    let out_dir = out_dir.as_ref();
    tokio::fs::create_dir_all(out_dir).await?;

    let base = format!("report_{}", generated_at.format("%Y%m%d_%H%M%S"));
    let html_path = out_dir.join(format!("{base}.html"));
    let json_path = out_dir.join(format!("{base}.json"));
    let text_path = out_dir.join(format!("{base}.txt"));

    tokio::fs::write(&html_path, &report.html).await?;
    tokio::fs::write(&json_path, serde_json::to_string_pretty(&report.json)?).await?;
    tokio::fs::write(&text_path, &report.text).await?;

    tracing::info!("reports saved under {}", out_dir.display());

    Ok(SavedReports {
        html_path,
        json_path,
        text_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn make_report() -> Report {
        Report {
            html: "<html><body>report</body></html>".to_string(),
            json: json!({"overall": {"count": 3}}),
            text: "Transaction table".to_string(),
        }
    }

    fn stamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 45).unwrap()
    }

    #[tokio::test]
    async fn save_reports_writes_three_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let saved = save_reports(&make_report(), dir.path(), stamp())
            .await
            .expect("save should succeed");

        assert!(saved.html_path.exists());
        assert!(saved.json_path.exists());
        assert!(saved.text_path.exists());
    }

    #[tokio::test]
    async fn save_reports_uses_timestamped_base_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let saved = save_reports(&make_report(), dir.path(), stamp())
            .await
            .expect("save should succeed");
        let name = saved.html_path.file_name().unwrap().to_string_lossy();
        assert_eq!(name, "report_20240501_123045.html");
    }

    #[tokio::test]
    async fn save_reports_creates_missing_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("a").join("b");
        let saved = save_reports(&make_report(), &nested, stamp())
            .await
            .expect("save should succeed");
        assert!(saved.json_path.exists());
    }

    #[tokio::test]
    async fn save_reports_json_is_pretty_printed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let saved = save_reports(&make_report(), dir.path(), stamp())
            .await
            .expect("save should succeed");
        let content = tokio::fs::read_to_string(&saved.json_path)
            .await
            .expect("file should be readable");
        assert!(content.contains('\n'));
        let parsed: serde_json::Value =
            serde_json::from_str(&content).expect("should be valid JSON");
        assert_eq!(parsed["overall"]["count"], 3);
    }

    #[tokio::test]
    async fn save_reports_unwritable_target_is_an_error() {
        // A file in place of the output directory forces create_dir_all to fail.
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("blocked");
        tokio::fs::write(&blocker, b"file").await.expect("write");
        let result = save_reports(&make_report(), &blocker, stamp()).await;
        assert!(result.is_err());
    }
}
