use tracing::info;
use viewtag_core::document::{Category, Element, ElementId, View, ViewKind, WallKind};

/// 面向用户的提示消息。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

/// 提示消息的接收端，只用于观察，不影响放置流程。
pub trait Notifier {
    fn notify(&mut self, notice: Notice);
}

/// 在内存中收集提示，供 CLI 汇总或测试断言。
#[derive(Debug, Clone, Default)]
pub struct NoticeLog {
    notices: Vec<Notice>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn with_title<'a>(&'a self, title: &'a str) -> impl Iterator<Item = &'a Notice> {
        self.notices.iter().filter(move |notice| notice.title == title)
    }
}

impl Notifier for NoticeLog {
    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}

/// 直接写入日志。
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&mut self, notice: Notice) {
        info!(title = %notice.title, "{}", notice.message);
    }
}

/// 每个被处理元素的只读上下文。
#[derive(Debug, Clone, Copy)]
pub struct ElementContext<'a> {
    pub id: ElementId,
    pub element: &'a Element,
    pub element_type: Option<&'a Element>,
}

impl ElementContext<'_> {
    /// 实例自身的墙类型优先，否则取其类型定义上的值。
    pub fn wall_kind(&self) -> Option<WallKind> {
        self.element
            .wall_kind
            .or_else(|| self.element_type.and_then(|ty| ty.wall_kind))
    }
}

/// 放置过程的旁路观察者。每次运行收到一次视图回调，之后每个有定位的元素回调一次。
pub trait PlacementObserver {
    fn name(&self) -> &'static str;

    fn on_view(&mut self, _view: &View, _notifier: &mut dyn Notifier) {}

    fn on_element(&mut self, _context: &ElementContext<'_>, _notifier: &mut dyn Notifier) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CurtainWallObserver;

impl PlacementObserver for CurtainWallObserver {
    fn name(&self) -> &'static str {
        "curtain_wall"
    }

    fn on_element(&mut self, context: &ElementContext<'_>, notifier: &mut dyn Notifier) {
        if context.element.category == Category::Walls
            && context.wall_kind() == Some(WallKind::Curtain)
        {
            notifier.notify(Notice::new(
                "Curtain wall",
                format!("Found a curtain wall! (element {})", context.id.get()),
            ));
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AreaPlanObserver;

impl PlacementObserver for AreaPlanObserver {
    fn name(&self) -> &'static str {
        "area_plan"
    }

    fn on_view(&mut self, view: &View, notifier: &mut dyn Notifier) {
        if view.kind == ViewKind::AreaPlan {
            notifier.notify(Notice::new(
                "Area plan",
                format!("{} is an area plan!", view.name),
            ));
        }
    }
}
