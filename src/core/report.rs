use crate::domain::experts::clean_group_name;
use crate::domain::model::AnalysisState;
use crate::domain::ports::Storage;
use crate::utils::error::Result;
use std::io::Write;
use std::sync::Mutex;
use zip::write::{SimpleFileOptions, ZipWriter};

pub const ARCHIVE_NAME: &str = "investment_strategies.zip";
pub const FINAL_REPORT_FILE: &str = "final_investment_strategy.txt";

/// 報告輸出；記錄已寫入的檔案以便最後打包
pub struct ReportWriter<S: Storage> {
    storage: S,
    save_expert_responses: bool,
    written: Mutex<Vec<String>>,
}

impl<S: Storage> ReportWriter<S> {
    pub fn new(storage: S, save_expert_responses: bool) -> Self {
        Self {
            storage,
            save_expert_responses,
            written: Mutex::new(Vec::new()),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn written_files(&self) -> Vec<String> {
        self.written
            .lock()
            .map(|files| files.clone())
            .unwrap_or_default()
    }

    async fn write(&self, path: String, content: &[u8]) -> Result<String> {
        self.storage.write_file(&path, content).await?;
        if let Ok(mut files) = self.written.lock() {
            if !files.contains(&path) {
                files.push(path.clone());
            }
        }
        Ok(path)
    }

    pub async fn save_expert_analysis(
        &self,
        expert: &str,
        question: &str,
        analysis: &str,
    ) -> Result<Option<String>> {
        if !self.save_expert_responses {
            return Ok(None);
        }

        let content = format!(
            "=== ANALYSIS FROM {} ===\n\nQuestion: {}\n\n{}",
            expert.to_uppercase(),
            question,
            analysis
        );
        let path = self
            .write(format!("expert_responses/{}.txt", expert), content.as_bytes())
            .await?;
        tracing::info!("💾 [{}] Analysis saved to {}", expert, path);
        Ok(Some(path))
    }

    pub async fn save_group_summary(
        &self,
        group_name: &str,
        question: &str,
        summary: &str,
    ) -> Result<String> {
        let clean = clean_group_name(group_name);
        let content = format!(
            "=== GROUP SUMMARY: {} ===\n\nQuestion: {}\n\n{}",
            clean.to_uppercase(),
            question,
            summary
        );
        self.write(format!("group_responses/{}.txt", clean), content.as_bytes())
            .await
    }

    pub async fn save_final_report(&self, question: &str, report: &str) -> Result<String> {
        let content = format!(
            "=== OPTIMAL INVESTMENT STRATEGY ===\n\nQuestion: {}\n\n{}",
            question, report
        );
        let path = self
            .write(FINAL_REPORT_FILE.to_string(), content.as_bytes())
            .await?;
        tracing::info!("💾 Final investment strategy saved to {}", path);
        Ok(path)
    }

    pub async fn save_state(&self, file_name: &str, state: &AnalysisState) -> Result<String> {
        let json = serde_json::to_string_pretty(state)?;
        self.write(file_name.to_string(), json.as_bytes()).await
    }

    /// 將所有已寫入的報告打包成 ZIP
    pub async fn archive(&self) -> Result<String> {
        let files = self.written_files();
        tracing::debug!("Creating ZIP archive with {} files", files.len());

        let mut contents = Vec::with_capacity(files.len());
        for file in &files {
            contents.push((file.clone(), self.storage.read_file(file).await?));
        }

        let zip_data = {
            let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
            for (name, data) in &contents {
                zip.start_file(name.as_str(), SimpleFileOptions::default())?;
                zip.write_all(data)?;
            }
            zip.finish()?.into_inner()
        };

        tracing::debug!("Writing ZIP archive ({} bytes) to storage", zip_data.len());
        self.storage.write_file(ARCHIVE_NAME, &zip_data).await?;
        Ok(ARCHIVE_NAME.to_string())
    }
}
