use std::collections::HashMap;

use viewtag_config::TaggingConfig;
use viewtag_core::document::{Document, ElementId};

use crate::detector;
use crate::observer::Notifier;
use crate::placement::AutoTagger;

#[derive(Debug, Clone)]
pub struct CommandRequest {
    pub name: String,
}

impl CommandRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone)]
pub struct CommandResponse {
    pub success: bool,
    pub message: Option<String>,
}

impl CommandResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

pub trait CommandHandler: Send + Sync {
    fn name(&self) -> &'static str;
    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse;
}

pub struct CommandContext<'a> {
    pub document: &'a mut Document,
    pub view: ElementId,
    pub tagging: &'a TaggingConfig,
    pub notifier: &'a mut dyn Notifier,
}

pub struct CommandBus {
    handlers: HashMap<&'static str, Box<dyn CommandHandler>>,
}

impl CommandBus {
    pub fn new() -> Self {
        let mut bus = Self {
            handlers: HashMap::new(),
        };
        bus.register(AutoTagCommand);
        bus.register(TagStatusCommand);
        bus
    }

    pub fn register<H: CommandHandler + 'static>(&mut self, handler: H) {
        self.handlers.insert(handler.name(), Box::new(handler));
    }

    pub fn dispatch(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        if let Some(handler) = self.handlers.get(request.name.as_str()) {
            handler.execute(request, context)
        } else {
            CommandResponse::err(format!("未知命令: {}", request.name))
        }
    }

    pub fn available_commands(&self) -> impl Iterator<Item = &&'static str> {
        self.handlers.keys()
    }
}

impl Default for CommandBus {
    fn default() -> Self {
        Self::new()
    }
}

struct AutoTagCommand;

impl CommandHandler for AutoTagCommand {
    fn name(&self) -> &'static str {
        "auto_tag"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let mut tagger = match AutoTagger::new(context.tagging) {
            Ok(tagger) => tagger,
            Err(err) => return CommandResponse::err(err.to_string()),
        };
        match tagger.run(&mut *context.document, context.view, &mut *context.notifier) {
            Ok(report) => CommandResponse::ok(format!(
                "已放置 {} 个标记（跳过已标记 {}，无定位 {}）",
                report.placed_count(),
                report.skipped_tagged,
                report.skipped_unplaced
            )),
            Err(err) => CommandResponse::err(err.to_string()),
        }
    }
}

struct TagStatusCommand;

impl CommandHandler for TagStatusCommand {
    fn name(&self) -> &'static str {
        "tag_status"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        if context.document.view(context.view).is_none() {
            return CommandResponse::err(format!("视图 {} 不存在", context.view.get()));
        }
        let status = detector::survey(
            &*context.document,
            context.view,
            &context.tagging.categories,
        );
        CommandResponse::ok(format!(
            "已标记 {}，未标记 {}，无定位 {}",
            status.tagged, status.untagged, status.unplaced
        ))
    }
}
