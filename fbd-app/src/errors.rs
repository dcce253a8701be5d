use std::path::PathBuf;

use fbd_core::CoreError;
use fbd_io::IoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("无法打开文件 “{path}”: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: IoError,
    },
    #[error(transparent)]
    Document(IoError),
    #[error(transparent)]
    Convert(#[from] CoreError),
    #[error("未找到任何点")]
    NoPoints,
    #[error(transparent)]
    Write(IoError),
    #[error("写入标准输出失败: {0}")]
    Stdout(#[source] std::io::Error),
}

impl AppError {
    /// 进程退出码：2 表示输入文件无法读取，3 表示没有可输出的点，其余失败为 1。
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Open { .. } => 2,
            AppError::NoPoints => 3,
            _ => 1,
        }
    }
}
