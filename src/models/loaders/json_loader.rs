use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tokio::fs;

use crate::error::{AppResult, FileError};
use crate::models::unit::Document;

/// 从 JSON 文件加载题目文档
pub async fn load_document(path: &Path) -> AppResult<Document> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| FileError::read_failed(path.display().to_string(), e))?;

    let document = serde_json::from_str(&content).map_err(|source| FileError::JsonParseFailed {
        path: path.display().to_string(),
        source,
    })?;

    Ok(document)
}

/// 以 4 空格缩进写回题目文档
pub async fn save_document(path: &Path, document: &Document) -> AppResult<()> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    document
        .serialize(&mut ser)
        .map_err(|source| FileError::JsonParseFailed {
            path: path.display().to_string(),
            source,
        })?;

    fs::write(path, buf)
        .await
        .map_err(|e| FileError::write_failed(path.display().to_string(), e))?;

    Ok(())
}

/// 未指定输出路径时的默认值：`week-4.json` → `week-4-fixed.json`
pub fn derive_output_path(input: &Path) -> PathBuf {
    let file_name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let fixed_name = match file_name.strip_suffix(".json") {
        Some(stem) => format!("{}-fixed.json", stem),
        None => format!("{}-fixed.json", file_name),
    };

    input.with_file_name(fixed_name)
}
