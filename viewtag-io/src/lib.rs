use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use viewtag_core::document::Document;

/// 当前写出的项目文件版本。
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write file {path:?}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode document: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("invalid document structure: {0}")]
    InvalidDocument(String),
}

pub trait DocumentLoader {
    fn load(&self, path: &Path) -> Result<Document, IoError>;
}

pub trait DocumentSaver {
    fn save(&self, document: &Document, path: &Path) -> Result<(), IoError>;
}

/// 项目文件外层结构，携带版本号以便后续演进。
#[derive(Debug, Serialize, Deserialize)]
struct ProjectFile {
    format_version: u32,
    document: Document,
}

/// 以 JSON 读写文档。
#[derive(Debug, Clone, Copy)]
pub struct JsonFacade {
    pretty: bool,
}

impl JsonFacade {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn compact() -> Self {
        Self { pretty: false }
    }

    /// 从字符串解析文档，`origin` 仅用于错误信息。
    pub fn parse(&self, data: &str, origin: &Path) -> Result<Document, IoError> {
        let file: ProjectFile = serde_json::from_str(data).map_err(|source| IoError::Decode {
            path: origin.to_path_buf(),
            source,
        })?;
        if file.format_version != FORMAT_VERSION {
            return Err(IoError::UnsupportedFeature(format!(
                "project format version {}",
                file.format_version
            )));
        }
        validate(&file.document)?;
        Ok(file.document)
    }

    pub fn encode(&self, document: &Document) -> Result<String, IoError> {
        let file = ProjectFile {
            format_version: FORMAT_VERSION,
            document: document.clone(),
        };
        if self.pretty {
            serde_json::to_string_pretty(&file)
        } else {
            serde_json::to_string(&file)
        }
        .map_err(IoError::Encode)
    }
}

impl Default for JsonFacade {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentLoader for JsonFacade {
    fn load(&self, path: &Path) -> Result<Document, IoError> {
        let data = fs::read_to_string(path).map_err(|source| IoError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let document = self.parse(&data, path)?;
        debug!(
            path = %path.display(),
            elements = document.elements().count(),
            tags = document.tags().count(),
            "已读取项目文件"
        );
        Ok(document)
    }
}

impl DocumentSaver for JsonFacade {
    fn save(&self, document: &Document, path: &Path) -> Result<(), IoError> {
        if document.transaction_name().is_some() {
            return Err(IoError::InvalidDocument(
                "document has an open transaction".to_string(),
            ));
        }
        let data = self.encode(document)?;
        fs::write(path, data).map_err(|source| IoError::WriteError {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// 按扩展名选择读取器，目前只支持 `.json`。
pub fn load_document(path: &Path) -> Result<Document, IoError> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => JsonFacade::new().load(path),
        other => Err(IoError::UnsupportedFeature(format!(
            "document extension {:?}",
            other.unwrap_or("")
        ))),
    }
}

/// 检查文档内部引用：活动视图、元素所在视图、类型引用以及标记引用都必须存在。
/// ID 在各集合之间不得重复，且 ID 计数器必须大于所有已分配的 ID。
pub fn validate(document: &Document) -> Result<(), IoError> {
    let mut seen = HashSet::new();
    for id in document.allocated_ids() {
        if !seen.insert(id) {
            return Err(IoError::InvalidDocument(format!(
                "id {} is assigned more than once",
                id.get()
            )));
        }
    }
    if let Some(max) = seen.iter().max() {
        let next = document.next_free_id();
        if next <= *max {
            return Err(IoError::InvalidDocument(format!(
                "next_id {} does not exceed allocated id {}",
                next.get(),
                max.get()
            )));
        }
    }

    if let Some(view) = document.active_view() {
        if document.view(view).is_none() {
            return Err(IoError::InvalidDocument(format!(
                "active view {} does not exist",
                view.get()
            )));
        }
    }

    for (id, element) in document.elements() {
        if let Some(view) = element.views.iter().find(|view| document.view(**view).is_none()) {
            return Err(IoError::InvalidDocument(format!(
                "element {} is visible in missing view {}",
                id.get(),
                view.get()
            )));
        }
        if let Some(type_id) = element.type_id {
            if document.element(type_id).is_none() {
                return Err(IoError::InvalidDocument(format!(
                    "element {} references missing type {}",
                    id.get(),
                    type_id.get()
                )));
            }
        }
    }

    for (id, tag) in document.tags() {
        if document.view(tag.view).is_none() {
            return Err(IoError::InvalidDocument(format!(
                "tag {} is placed in missing view {}",
                id.get(),
                tag.view.get()
            )));
        }
        if document.tag_type(tag.tag_type).is_none() {
            return Err(IoError::InvalidDocument(format!(
                "tag {} uses missing tag type {}",
                id.get(),
                tag.tag_type.get()
            )));
        }
        if let Some(missing) = tag.tagged.iter().find(|e| document.element(**e).is_none()) {
            return Err(IoError::InvalidDocument(format!(
                "tag {} references missing element {}",
                id.get(),
                missing.get()
            )));
        }
    }

    Ok(())
}
