use std::path::PathBuf;

use tracing::info;
use viewtag_config::ProjectConfig;
use viewtag_core::document::{Document, ElementId};
use viewtag_engine::demo::populate_demo;
use viewtag_io::load_document;

use crate::errors::AppError;

/// 文档来源，便于前端呈现加载信息。
#[derive(Debug, Clone)]
pub enum DocumentSource {
    File(PathBuf),
    Demo,
}

/// 统一封装加载后的文档与元信息。
#[derive(Debug)]
pub struct LoadedProject {
    pub document: Document,
    pub source: DocumentSource,
}

/// 读取配置中的项目文件；未指定时构建内置演示项目。
pub fn load_project(config: &ProjectConfig) -> Result<LoadedProject, AppError> {
    if let Some(path) = &config.input {
        let document = load_document(path)?;
        info!(path = %path.display(), "从项目文件加载文档成功");
        return Ok(LoadedProject {
            document,
            source: DocumentSource::File(path.clone()),
        });
    }

    let mut document = Document::new();
    let demo = populate_demo(&mut document)?;
    info!(view = demo.view.get(), "未指定项目文件，使用内置演示项目");
    Ok(LoadedProject {
        document,
        source: DocumentSource::Demo,
    })
}

/// 按名称查找视图，未指定名称时使用活动视图。
pub fn resolve_view(document: &Document, name: Option<&str>) -> Result<ElementId, AppError> {
    match name {
        Some(name) => document
            .view_by_name(name)
            .ok_or_else(|| AppError::ViewNotFound(name.to_string())),
        None => document.active_view().ok_or(AppError::NoActiveView),
    }
}
