//! アップロード対象のPDFファイル
//!
//! 送信前にクライアント側で拡張子・サイズをチェックする。
//! 上限はバックエンドの制限（50MB）に合わせている。

use crate::error::{ClientError, Result};
use bytes::Bytes;
use std::path::Path;

pub const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

pub const PDF_MIME_TYPE: &str = "application/pdf";

#[derive(Debug, Clone)]
pub struct PdfFile {
    pub file_name: String,
    pub data: Bytes,
}

impl PdfFile {
    pub fn new(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            data: data.into(),
        }
    }

    /// ファイルを読み込む（検証は `validate` で行う）
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(ClientError::FileNotFound(path.display().to_string()));
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let data = std::fs::read(path)?;

        Ok(Self::new(file_name, data))
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// 送信可能かチェックし、不可の場合は理由を返す
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !has_pdf_extension(&self.file_name) {
            return Err(format!("Only PDF files are supported: {}", self.file_name));
        }
        if self.data.is_empty() {
            return Err(format!("The file is empty: {}", self.file_name));
        }
        if self.size() > MAX_FILE_SIZE {
            return Err(format!(
                "The file is too large. Maximum size: {}MB",
                MAX_FILE_SIZE / (1024 * 1024)
            ));
        }
        Ok(())
    }
}

fn has_pdf_extension(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}
