use thiserror::Error;
use viewtag_core::document::DocumentError;
use viewtag_io::IoError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Io(#[from] IoError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("视图 `{0}` 不存在")]
    ViewNotFound(String),
    #[error("文档没有活动视图，请使用 `--view` 指定")]
    NoActiveView,
    #[error("命令 `{command}` 执行失败: {message}")]
    CommandFailed { command: String, message: String },
}
