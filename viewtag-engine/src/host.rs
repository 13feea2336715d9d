use tracing::{debug, warn};
use viewtag_core::document::{
    Document, DocumentError, Element, ElementFilter, ElementId, NewTag, TagInstance, TagType, View,
};

/// 放置算法对宿主文档的全部依赖：查询、创建标记与事务边界。
pub trait TagHost {
    fn view(&self, id: ElementId) -> Option<&View>;
    fn element(&self, id: ElementId) -> Option<&Element>;
    fn collect_elements(&self, filter: &ElementFilter) -> Vec<ElementId>;
    fn tag_types(&self) -> Vec<(ElementId, &TagType)>;
    fn tags_in_view(&self, view: ElementId) -> Vec<&TagInstance>;
    fn create_tag(&mut self, request: NewTag) -> Result<ElementId, DocumentError>;
    fn start_transaction(&mut self, name: &str) -> Result<(), DocumentError>;
    fn commit_transaction(&mut self) -> Result<(), DocumentError>;
    fn rollback_transaction(&mut self);
}

impl TagHost for Document {
    fn view(&self, id: ElementId) -> Option<&View> {
        Document::view(self, id)
    }

    fn element(&self, id: ElementId) -> Option<&Element> {
        Document::element(self, id)
    }

    fn collect_elements(&self, filter: &ElementFilter) -> Vec<ElementId> {
        Document::collect(self, filter)
    }

    fn tag_types(&self) -> Vec<(ElementId, &TagType)> {
        Document::tag_types(self).collect()
    }

    fn tags_in_view(&self, view: ElementId) -> Vec<&TagInstance> {
        Document::tags_in_view(self, view)
            .map(|(_, tag)| tag)
            .collect()
    }

    fn create_tag(&mut self, request: NewTag) -> Result<ElementId, DocumentError> {
        Document::create_tag(self, request)
    }

    fn start_transaction(&mut self, name: &str) -> Result<(), DocumentError> {
        Document::start_transaction(self, name)
    }

    fn commit_transaction(&mut self) -> Result<(), DocumentError> {
        Document::commit_transaction(self)
    }

    fn rollback_transaction(&mut self) {
        Document::rollback_transaction(self)
    }
}

/// 事务守卫。未显式提交便被丢弃时自动回滚。
pub struct Transaction<'h, H: TagHost> {
    host: &'h mut H,
    name: String,
    finished: bool,
}

impl<'h, H: TagHost> Transaction<'h, H> {
    pub fn start(host: &'h mut H, name: &str) -> Result<Self, DocumentError> {
        host.start_transaction(name)?;
        debug!(transaction = name, "事务已开始");
        Ok(Self {
            host,
            name: name.to_string(),
            finished: false,
        })
    }

    #[inline]
    pub fn host(&self) -> &H {
        &*self.host
    }

    #[inline]
    pub fn host_mut(&mut self) -> &mut H {
        &mut *self.host
    }

    /// 提交事务。提交失败时同样回滚，保证不留下半成品。
    pub fn commit(mut self) -> Result<(), DocumentError> {
        self.finished = true;
        match self.host.commit_transaction() {
            Ok(()) => {
                debug!(transaction = %self.name, "事务已提交");
                Ok(())
            }
            Err(err) => {
                self.host.rollback_transaction();
                Err(err)
            }
        }
    }

    pub fn rollback(mut self) {
        self.finished = true;
        self.host.rollback_transaction();
        debug!(transaction = %self.name, "事务已回滚");
    }
}

impl<H: TagHost> Drop for Transaction<'_, H> {
    fn drop(&mut self) {
        if !self.finished {
            warn!(transaction = %self.name, "事务未提交，执行回滚");
            self.host.rollback_transaction();
        }
    }
}
