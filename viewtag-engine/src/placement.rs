use tracing::{debug, info, warn};
use viewtag_config::{DuplicateStrategy, TaggingConfig};
use viewtag_core::document::{
    Category, DocumentError, ElementFilter, ElementId, NewTag, TagOrientation,
};

use crate::classifier::TemplateMap;
use crate::detector::DuplicateDetector;
use crate::errors::TagError;
use crate::host::{TagHost, Transaction};
use crate::observer::{
    AreaPlanObserver, CurtainWallObserver, ElementContext, Notice, Notifier, PlacementObserver,
};
use crate::resolver;

/// 放置批次使用的事务名称。
pub const BATCH_NAME: &str = "Insert tags";

/// 一次自动标记运行的结果。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlacementReport {
    pub candidates: usize,
    /// 新建的标记 ID。
    pub tags: Vec<ElementId>,
    /// 本次被标记的元素 ID，与 `tags` 一一对应。
    pub tagged_elements: Vec<ElementId>,
    pub skipped_unplaced: usize,
    pub skipped_tagged: usize,
}

impl PlacementReport {
    #[inline]
    pub fn placed_count(&self) -> usize {
        self.tags.len()
    }
}

/// 自动标记器：收集候选元素、解析模板与插入点、跳过已标记元素，
/// 所有创建操作在同一个事务中完成，任何致命错误都会整体回滚。
pub struct AutoTagger {
    categories: Vec<Category>,
    bindings: Vec<(Category, String)>,
    strategy: DuplicateStrategy,
    orientation: TagOrientation,
    has_leader: bool,
    observers: Vec<Box<dyn PlacementObserver>>,
}

impl AutoTagger {
    pub fn new(config: &TaggingConfig) -> Result<Self, TagError> {
        let bindings = config.template_bindings()?;
        let mut tagger = Self {
            categories: config.categories.clone(),
            bindings,
            strategy: config.duplicate_strategy,
            orientation: config.orientation,
            has_leader: config.add_leader,
            observers: Vec::new(),
        };
        if config.notify_curtain_walls {
            tagger.add_observer(CurtainWallObserver);
        }
        if config.notify_area_plans {
            tagger.add_observer(AreaPlanObserver);
        }
        Ok(tagger)
    }

    pub fn add_observer(&mut self, observer: impl PlacementObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn observer_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.observers.iter().map(|observer| observer.name())
    }

    /// 在指定视图中执行一次自动标记。成功时向 `notifier` 汇报新增标记数。
    pub fn run<H: TagHost>(
        &mut self,
        host: &mut H,
        view: ElementId,
        notifier: &mut dyn Notifier,
    ) -> Result<PlacementReport, TagError> {
        let view_info = host
            .view(view)
            .cloned()
            .ok_or(TagError::ViewNotFound(view.get()))?;
        let templates = TemplateMap::resolve(&*host, &self.bindings)?;

        let filter = ElementFilter::in_view(view)
            .with_categories(self.categories.iter().copied())
            .instances_only();
        let candidates = host.collect_elements(&filter);
        info!(
            view = view.get(),
            view_name = %view_info.name,
            candidates = candidates.len(),
            "开始自动标记"
        );

        for observer in &mut self.observers {
            observer.on_view(&view_info, notifier);
        }

        let mut batch = Batch {
            view,
            templates: &templates,
            detector: DuplicateDetector::build(self.strategy, &*host, view),
            orientation: self.orientation,
            has_leader: self.has_leader,
            report: PlacementReport {
                candidates: candidates.len(),
                ..PlacementReport::default()
            },
        };

        let mut transaction = Transaction::start(host, BATCH_NAME)?;
        for element in candidates {
            let placed = batch.place(&mut transaction, &mut self.observers, element, notifier);
            if let Err(err) = placed {
                warn!(element = element.get(), error = %err, "自动标记失败，放弃整个批次");
                transaction.rollback();
                return Err(err);
            }
        }
        transaction.commit()?;

        let report = batch.report;
        info!(
            placed = report.placed_count(),
            skipped_tagged = report.skipped_tagged,
            skipped_unplaced = report.skipped_unplaced,
            "自动标记完成"
        );
        notifier.notify(Notice::new(
            "Complete",
            format!("Tagged {} elements.", report.placed_count()),
        ));
        Ok(report)
    }
}

/// 单次运行内的放置状态。
struct Batch<'a> {
    view: ElementId,
    templates: &'a TemplateMap,
    detector: DuplicateDetector,
    orientation: TagOrientation,
    has_leader: bool,
    report: PlacementReport,
}

impl Batch<'_> {
    fn place<H: TagHost>(
        &mut self,
        transaction: &mut Transaction<'_, H>,
        observers: &mut [Box<dyn PlacementObserver>],
        id: ElementId,
        notifier: &mut dyn Notifier,
    ) -> Result<(), TagError> {
        let host = transaction.host();
        let element = host
            .element(id)
            .ok_or(DocumentError::ElementNotFound(id.get()))?;

        let Some(head) = resolver::insertion_point(element.location.as_ref()) else {
            debug!(element = id.get(), "元素没有定位，跳过");
            self.report.skipped_unplaced += 1;
            return Ok(());
        };

        let tag_type = self.templates.template_for(id, element.category)?;

        let context = ElementContext {
            id,
            element,
            element_type: element.type_id.and_then(|type_id| host.element(type_id)),
        };
        for observer in observers.iter_mut() {
            observer.on_element(&context, notifier);
        }

        if self.detector.is_tagged(host, self.view, id) {
            debug!(element = id.get(), "元素已有标记，跳过");
            self.report.skipped_tagged += 1;
            return Ok(());
        }

        let tag = transaction.host_mut().create_tag(NewTag {
            tag_type,
            view: self.view,
            element: id,
            head,
            orientation: self.orientation,
            has_leader: self.has_leader,
        })?;
        self.detector.record(id);
        debug!(
            element = id.get(),
            tag = tag.get(),
            x = head.x(),
            y = head.y(),
            z = head.z(),
            "已放置标记"
        );
        self.report.tags.push(tag);
        self.report.tagged_elements.push(id);
        Ok(())
    }
}
