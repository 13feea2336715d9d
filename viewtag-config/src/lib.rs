use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use viewtag_core::document::{Category, TagOrientation};

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub tagging: TaggingConfig,
    #[serde(default)]
    pub project: ProjectConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 自动发现配置文件：优先读取环境变量 `VIEWTAG_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os("VIEWTAG_CONFIG") {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// 重复标记检测策略。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateStrategy {
    /// 运行开始时一次性收集视图中已标记的元素 ID。
    #[default]
    Indexed,
    /// 每个候选元素都重新扫描视图中的全部标记。
    Scan,
}

/// 自动标记的行为配置。
#[derive(Debug, Clone, Deserialize)]
pub struct TaggingConfig {
    #[serde(default = "TaggingConfig::default_categories")]
    pub categories: Vec<Category>,
    /// 类别名 -> 标记族名。
    #[serde(default = "TaggingConfig::default_templates")]
    pub templates: BTreeMap<String, String>,
    #[serde(default)]
    pub duplicate_strategy: DuplicateStrategy,
    #[serde(default)]
    pub orientation: TagOrientation,
    #[serde(default)]
    pub add_leader: bool,
    #[serde(default = "TaggingConfig::default_notify")]
    pub notify_curtain_walls: bool,
    #[serde(default = "TaggingConfig::default_notify")]
    pub notify_area_plans: bool,
}

impl TaggingConfig {
    fn default_categories() -> Vec<Category> {
        vec![
            Category::Rooms,
            Category::Doors,
            Category::Walls,
            Category::Areas,
        ]
    }

    fn default_templates() -> BTreeMap<String, String> {
        [
            (Category::Doors, "Door Tag"),
            (Category::Rooms, "Room Tag"),
            (Category::Walls, "Wall Tag"),
        ]
        .into_iter()
        .map(|(category, family)| (category.name().to_string(), family.to_string()))
        .collect()
    }

    fn default_notify() -> bool {
        true
    }

    /// 将模板表解析为 `(类别, 族名)` 列表，类别名必须能精确匹配。
    pub fn template_bindings(&self) -> Result<Vec<(Category, String)>, ConfigError> {
        self.templates
            .iter()
            .map(|(name, family)| {
                Category::from_name(name)
                    .map(|category| (category, family.clone()))
                    .ok_or_else(|| ConfigError::UnknownCategory(name.clone()))
            })
            .collect()
    }
}

impl Default for TaggingConfig {
    fn default() -> Self {
        Self {
            categories: Self::default_categories(),
            templates: Self::default_templates(),
            duplicate_strategy: DuplicateStrategy::default(),
            orientation: TagOrientation::default(),
            add_leader: false,
            notify_curtain_walls: true,
            notify_area_plans: true,
        }
    }
}

/// CLI 运行时使用的项目参数。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub view: Option<String>,
    #[serde(default)]
    pub input: Option<PathBuf>,
    #[serde(default)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
    #[error("未知的元素类别: {0}")]
    UnknownCategory(String),
}
