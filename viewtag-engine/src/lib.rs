pub mod classifier;
pub mod command;
pub mod demo;
pub mod detector;
pub mod host;
pub mod observer;
pub mod placement;
pub mod resolver;

pub mod errors {
    use thiserror::Error;
    use viewtag_config::ConfigError;
    use viewtag_core::document::{Category, DocumentError};

    #[derive(Debug, Error)]
    pub enum TagError {
        #[error("annotation template `{family}` for {category} not found in document")]
        MissingTemplate { category: Category, family: String },
        #[error("element {element} has category {category} with no bound tag template")]
        UnmappedCategory { element: u64, category: Category },
        #[error("view {0} not found")]
        ViewNotFound(u64),
        #[error("invalid tagging configuration: {0}")]
        Config(#[from] ConfigError),
        #[error(transparent)]
        Document(#[from] DocumentError),
    }
}

pub use errors::TagError;
pub use placement::{AutoTagger, PlacementReport};
