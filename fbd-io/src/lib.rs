use std::fs;
use std::path::Path;

use fbd_core::record::EntityRecord;
use thiserror::Error;
use tracing::debug;

pub mod dxf;
pub mod fbd;

pub use dxf::extract_records;
pub use fbd::{DEFAULT_SCALE, FbdEmitter};

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write file {path:?}: {source}")]
    WriteError {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid document structure: {0}")]
    InvalidDocument(String),
}

/// 从文件读取实体记录。
pub trait RecordLoader {
    fn load(&self, path: &Path) -> Result<Vec<EntityRecord>, IoError>;
}

pub struct DxfFacade;

impl DxfFacade {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DxfFacade {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordLoader for DxfFacade {
    fn load(&self, path: &Path) -> Result<Vec<EntityRecord>, IoError> {
        let bytes = fs::read(path).map_err(|source| IoError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        // 旧版 DXF 常以 cp1252 保存，非 UTF-8 字节按替换字符处理，不影响数值字段。
        let data = String::from_utf8_lossy(&bytes);
        let records = extract_records(&data)?;
        debug!(path = %path.display(), records = records.len(), "已读取 DXF 实体记录");
        Ok(records)
    }
}
