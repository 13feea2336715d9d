use tracing::info;
use viewtag_config::AppConfig;
use viewtag_core::document::{Document, ElementId};
use viewtag_engine::command::{CommandBus, CommandContext, CommandRequest, CommandResponse};
use viewtag_engine::observer::{Notice, Notifier};
use viewtag_io::{DocumentSaver, JsonFacade};

use crate::errors::AppError;
use crate::loader::{DocumentSource, load_project, resolve_view};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Tag,
    StatusOnly,
}

/// 终端提示：相当于宿主中的消息对话框，同时写入日志。
#[derive(Debug, Default)]
pub struct ConsoleNotifier {
    shown: usize,
}

impl Notifier for ConsoleNotifier {
    fn notify(&mut self, notice: Notice) {
        self.shown += 1;
        info!(title = %notice.title, "{}", notice.message);
        println!("[{}] {}", notice.title, notice.message);
    }
}

/// 加载项目、在目标视图上执行自动标记并按需保存。
pub fn run(config: &AppConfig, mode: RunMode) -> Result<(), AppError> {
    let loaded = load_project(&config.project)?;
    let mut document = loaded.document;
    let view = resolve_view(&document, config.project.view.as_deref())?;

    match &loaded.source {
        DocumentSource::File(path) => {
            println!("已从项目文件加载文档：{}", path.display())
        }
        DocumentSource::Demo => println!("已构建内置演示项目"),
    }
    if let Some(view_info) = document.view(view) {
        println!("目标视图：{} (#{})", view_info.name, view.get());
    }

    let bus = CommandBus::new();
    let mut notifier = ConsoleNotifier::default();
    let mut context = CommandContext {
        document: &mut document,
        view,
        tagging: &config.tagging,
        notifier: &mut notifier,
    };

    let status = dispatch(&bus, "tag_status", &mut context)?;
    println!("标记前：{}", status.message.unwrap_or_default());
    if mode == RunMode::StatusOnly {
        return Ok(());
    }

    let tagged = dispatch(&bus, "auto_tag", &mut context)?;
    println!("{}", tagged.message.unwrap_or_default());
    let status = dispatch(&bus, "tag_status", &mut context)?;
    println!("标记后：{}", status.message.unwrap_or_default());

    print_tags(&document, view);
    info!(notices = notifier.shown, "自动标记运行结束");

    if let Some(path) = &config.project.output {
        JsonFacade::new().save(&document, path)?;
        info!(path = %path.display(), "已保存标记后的项目文件");
        println!("已保存：{}", path.display());
    }
    Ok(())
}

fn dispatch(
    bus: &CommandBus,
    command: &str,
    context: &mut CommandContext<'_>,
) -> Result<CommandResponse, AppError> {
    let response = bus.dispatch(&CommandRequest::new(command), context);
    if response.success {
        Ok(response)
    } else {
        Err(AppError::CommandFailed {
            command: command.to_string(),
            message: response.message.unwrap_or_default(),
        })
    }
}

fn print_tags(document: &Document, view: ElementId) {
    println!("视图中的标记：");
    for (id, tag) in document.tags_in_view(view) {
        let family = document
            .tag_type(tag.tag_type)
            .map(|tag_type| tag_type.family_name.as_str())
            .unwrap_or("?");
        let targets: Vec<String> = tag.tagged.iter().map(|id| id.get().to_string()).collect();
        println!(
            "  - 标记 #{}, 类型={}, 元素={}, 位置=({:.2}, {:.2}, {:.2})",
            id.get(),
            family,
            targets.join(", "),
            tag.head.x(),
            tag.head.y(),
            tag.head.z()
        );
    }
}
