use crate::utils::error::{FinError, Result};
use std::path::Path;

/// 附加的 CSV 資料，轉成供批評與修正提示使用的表格描述
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub file_name: String,
    pub columns: Vec<String>,
    pub total_rows: usize,
    pub description: String,
}

pub async fn load_dataset(path: impl AsRef<Path>, max_rows: usize) -> Result<Dataset> {
    let path = path.as_ref();
    let data = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let dataset = describe_csv(&data, &file_name, max_rows)?;
    tracing::info!(
        "📄 Loaded {} ({} rows, {} columns)",
        dataset.file_name,
        dataset.total_rows,
        dataset.columns.len()
    );
    Ok(dataset)
}

pub fn describe_csv(data: &[u8], file_name: &str, max_rows: usize) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if columns.iter().all(|c| c.is_empty()) {
        return Err(FinError::ValidationError {
            message: format!("{} has no header row", file_name),
        });
    }

    let mut lines = vec![
        format!("| {} |", columns.join(" | ")),
        format!("|{}", " --- |".repeat(columns.len())),
    ];
    let mut total_rows = 0;
    for record in reader.records() {
        let record = record?;
        total_rows += 1;
        if total_rows <= max_rows {
            let cells: Vec<String> = record.iter().map(|c| c.replace('|', "\\|")).collect();
            lines.push(format!("| {} |", cells.join(" | ")));
        }
    }

    let mut description = format!(
        "File: {}\nColumns: {}\nRows: {}\n\n{}",
        file_name,
        columns.join(", "),
        total_rows,
        lines.join("\n")
    );
    if total_rows > max_rows {
        description.push_str(&format!(
            "\n\n... {} more rows omitted",
            total_rows - max_rows
        ));
    }

    Ok(Dataset {
        file_name: file_name.to_string(),
        columns,
        total_rows,
        description,
    })
}
