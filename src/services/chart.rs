use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::models::chart::UploadedChart;
use crate::utils::chart_parser::validate_bytes;
use crate::utils::chart_serializer::serialize;
use crate::utils::crypto::calculate_md5;
use crate::utils::error::{AppError, AppResult};

/// 文件存储。返回 (访问地址, 内容校验和)
pub trait FileStorage {
    fn upload(&self, name: &str, bytes: &[u8], extension: &str) -> AppResult<(String, String)>;
}

/// 存放在本地目录的文件存储
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FileStorage for LocalFileStorage {
    fn upload(&self, name: &str, bytes: &[u8], extension: &str) -> AppResult<(String, String)> {
        fs::create_dir_all(&self.root)?;
        let path = self.root.join(format!("{name}.{extension}"));
        fs::write(&path, bytes)?;
        log::debug!("文件已写入: {}", path.display());
        Ok((path.to_string_lossy().into_owned(), calculate_md5(bytes)))
    }
}

// 谱面上传服务
pub struct ChartService<S: FileStorage> {
    storage: S,
}

impl<S: FileStorage> ChartService<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// 处理一次谱面上传：校验并规范化后保存规范化的副本
    ///
    /// 校验失败时不会写入任何内容
    pub fn process_upload(&self, file_name: &str, bytes: &[u8]) -> AppResult<UploadedChart> {
        let chart = validate_bytes(bytes).map_err(|e| {
            log::warn!("谱面 '{file_name}' 被拒绝: {e}");
            AppError::from(e)
        })?;

        let content = serialize(&chart.document)?;
        let checksum = calculate_md5(content.as_bytes());
        let extension = chart.format.extension();
        let name = Uuid::new_v4().to_string();

        let (url, stored_checksum) = self.storage.upload(&name, content.as_bytes(), extension)?;
        if stored_checksum != checksum {
            return Err(AppError::Storage(format!(
                "校验和不一致: 期望 {checksum}, 存储返回 {stored_checksum}"
            )));
        }

        log::info!(
            "谱面 '{file_name}' 已保存为 {name}.{extension} ({}, {} 个音符)",
            chart.format,
            chart.note_count
        );
        Ok(UploadedChart {
            storage_key: format!("{name}.{extension}"),
            url,
            checksum,
            format: chart.format,
            note_count: chart.note_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chart::ChartFormat;
    use crate::utils::chart_parser::validate;

    const PEC: &str = "0\nbp 0 120\nn1 0 4 0 1 0\n# 1.0\n& 1.0\nn2 0 2 3 100 1 0\n# 1.0\n& 1.0\n";

    #[test]
    fn upload_stores_normalized_copy() {
        let dir = tempfile::tempdir().unwrap();
        let service = ChartService::new(LocalFileStorage::new(dir.path()));

        let uploaded = service.process_upload("test.pec", PEC.as_bytes()).unwrap();
        assert_eq!(uploaded.format, ChartFormat::Pec);
        assert_eq!(uploaded.note_count, 2);
        assert!(uploaded.storage_key.ends_with(".pec"));

        let stored = fs::read(dir.path().join(&uploaded.storage_key)).unwrap();
        assert_eq!(calculate_md5(&stored), uploaded.checksum);

        // 保存的副本按时间排序，且与原谱面解析结果一致
        let text = String::from_utf8(stored).unwrap();
        assert_eq!(validate(&text).unwrap().document, validate(PEC).unwrap().document);
    }

    #[test]
    fn rejected_upload_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let service = ChartService::new(LocalFileStorage::new(dir.path().join("charts")));

        let result = service.process_upload("bad.txt", b"not a chart");
        assert!(matches!(result, Err(AppError::Parse(_))));
        assert!(!dir.path().join("charts").exists());
    }

    struct FailingStorage;

    impl FileStorage for FailingStorage {
        fn upload(&self, _: &str, _: &[u8], _: &str) -> AppResult<(String, String)> {
            Err(AppError::Storage("磁盘已满".to_string()))
        }
    }

    #[test]
    fn storage_failure_propagates() {
        let service = ChartService::new(FailingStorage);
        assert!(matches!(
            service.process_upload("test.pec", PEC.as_bytes()),
            Err(AppError::Storage(_))
        ));
    }
}
