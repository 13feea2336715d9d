pub mod geometry {
    use glam::DVec3;
    use serde::{Deserialize, Serialize};

    /// 三维点，内部以 `glam::DVec3` 表示，与宿主模型的双精度坐标保持一致。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point3(pub DVec3);

    impl Point3 {
        #[inline]
        pub fn new(x: f64, y: f64, z: f64) -> Self {
            Self(DVec3::new(x, y, z))
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn z(self) -> f64 {
            self.0.z
        }

        /// 两点的逐轴算术中点：`(a + b) / 2`。
        #[inline]
        pub fn midpoint(self, other: Point3) -> Point3 {
            Self((self.0 + other.0) / 2.0)
        }
    }

    /// 定位曲线。放置逻辑只关心两个端点，弧线等形状同样以端点描述。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Curve3 {
        pub start: Point3,
        pub end: Point3,
    }

    impl Curve3 {
        #[inline]
        pub fn new(start: Point3, end: Point3) -> Self {
            Self { start, end }
        }
    }
}

pub mod document {
    use std::fmt;

    use serde::{Deserialize, Serialize};
    use thiserror::Error;

    use crate::geometry::{Curve3, Point3};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    pub struct ElementId(u64);

    impl ElementId {
        #[inline]
        pub fn new(raw: u64) -> Self {
            Self(raw)
        }

        /// 提供原始数值，便于序列化或日志输出。
        #[inline]
        pub fn get(self) -> u64 {
            self.0
        }
    }

    /// 元素类别。名称与宿主中的类别名一致（复数形式）。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    pub enum Category {
        Rooms,
        Doors,
        Walls,
        Areas,
        Windows,
        Furniture,
        #[serde(rename = "Generic Models")]
        Generic,
    }

    impl Category {
        pub const ALL: [Category; 7] = [
            Category::Rooms,
            Category::Doors,
            Category::Walls,
            Category::Areas,
            Category::Windows,
            Category::Furniture,
            Category::Generic,
        ];

        #[inline]
        pub fn name(self) -> &'static str {
            match self {
                Category::Rooms => "Rooms",
                Category::Doors => "Doors",
                Category::Walls => "Walls",
                Category::Areas => "Areas",
                Category::Windows => "Windows",
                Category::Furniture => "Furniture",
                Category::Generic => "Generic Models",
            }
        }

        /// 按类别名精确匹配。
        pub fn from_name(name: &str) -> Option<Self> {
            Self::ALL.into_iter().find(|category| category.name() == name)
        }
    }

    impl fmt::Display for Category {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.name())
        }
    }

    /// 元素定位：点定位（门、房间）或曲线定位（墙）。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub enum Location {
        Point(Point3),
        Curve(Curve3),
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum WallKind {
        Basic,
        Curtain,
        Stacked,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ViewKind {
        FloorPlan,
        CeilingPlan,
        AreaPlan,
        Section,
        Elevation,
        ThreeD,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum TagOrientation {
        #[default]
        Horizontal,
        Vertical,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct View {
        pub name: String,
        pub kind: ViewKind,
    }

    impl View {
        #[inline]
        pub fn new(name: impl Into<String>, kind: ViewKind) -> Self {
            Self {
                name: name.into(),
                kind,
            }
        }
    }

    /// 模型元素。`is_type` 为真时表示类型定义（如墙类型），不会出现在候选集中。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Element {
        pub name: String,
        pub category: Category,
        #[serde(default)]
        pub location: Option<Location>,
        #[serde(default)]
        pub is_type: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub type_id: Option<ElementId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub wall_kind: Option<WallKind>,
        #[serde(default)]
        pub views: Vec<ElementId>,
    }

    impl Element {
        pub fn instance(category: Category, name: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                category,
                location: None,
                is_type: false,
                type_id: None,
                wall_kind: None,
                views: Vec::new(),
            }
        }

        pub fn type_definition(category: Category, name: impl Into<String>) -> Self {
            Self {
                is_type: true,
                ..Self::instance(category, name)
            }
        }

        pub fn with_location(mut self, location: Location) -> Self {
            self.location = Some(location);
            self
        }

        pub fn with_type(mut self, type_id: ElementId) -> Self {
            self.type_id = Some(type_id);
            self
        }

        pub fn visible_in(mut self, view: ElementId) -> Self {
            if !self.views.contains(&view) {
                self.views.push(view);
            }
            self
        }

        #[inline]
        pub fn is_visible_in(&self, view: ElementId) -> bool {
            self.views.contains(&view)
        }
    }

    /// 标记类型（注释模板），通过族名查找。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct TagType {
        pub family_name: String,
        pub type_name: String,
        pub category: Category,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct TagInstance {
        pub tag_type: ElementId,
        pub view: ElementId,
        pub tagged: Vec<ElementId>,
        pub head: Point3,
        pub orientation: TagOrientation,
        pub has_leader: bool,
    }

    impl TagInstance {
        #[inline]
        pub fn references(&self, element: ElementId) -> bool {
            self.tagged.contains(&element)
        }
    }

    /// 创建标记所需的参数。
    #[derive(Debug, Clone, Copy)]
    pub struct NewTag {
        pub tag_type: ElementId,
        pub view: ElementId,
        pub element: ElementId,
        pub head: Point3,
        pub orientation: TagOrientation,
        pub has_leader: bool,
    }

    /// 元素过滤条件，对应宿主中的“按视图 + 多类别 + 排除类型”收集器。
    #[derive(Debug, Clone, Default)]
    pub struct ElementFilter {
        pub view: Option<ElementId>,
        pub categories: Vec<Category>,
        pub exclude_types: bool,
    }

    impl ElementFilter {
        pub fn in_view(view: ElementId) -> Self {
            Self {
                view: Some(view),
                ..Self::default()
            }
        }

        pub fn with_categories(mut self, categories: impl IntoIterator<Item = Category>) -> Self {
            self.categories.extend(categories);
            self
        }

        pub fn instances_only(mut self) -> Self {
            self.exclude_types = true;
            self
        }

        pub fn matches(&self, element: &Element) -> bool {
            if self.exclude_types && element.is_type {
                return false;
            }
            if let Some(view) = self.view {
                if !element.is_visible_in(view) {
                    return false;
                }
            }
            self.categories.is_empty() || self.categories.contains(&element.category)
        }
    }

    #[derive(Debug, Error)]
    pub enum DocumentError {
        #[error("view {0} not found")]
        ViewNotFound(u64),
        #[error("element {0} not found")]
        ElementNotFound(u64),
        #[error("tag type {0} not found")]
        TagTypeNotFound(u64),
        #[error("element {0} is a type definition and cannot be tagged")]
        TypeNotTaggable(u64),
        #[error("tag type {tag_type} is bound to {expected}, element {element} is {found}")]
        CategoryMismatch {
            tag_type: u64,
            element: u64,
            expected: Category,
            found: Category,
        },
        #[error("transaction `{0}` is already open")]
        TransactionAlreadyOpen(String),
        #[error("no active transaction")]
        NoActiveTransaction,
    }

    /// 事务开始时记录的快照，回滚时整体恢复。
    #[derive(Debug, Clone)]
    struct TransactionState {
        name: String,
        next_id: u64,
        views: Vec<(ElementId, View)>,
        elements: Vec<(ElementId, Element)>,
        tag_types: Vec<(ElementId, TagType)>,
        tags: Vec<(ElementId, TagInstance)>,
        active_view: Option<ElementId>,
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Document {
        views: Vec<(ElementId, View)>,
        active_view: Option<ElementId>,
        elements: Vec<(ElementId, Element)>,
        tag_types: Vec<(ElementId, TagType)>,
        tags: Vec<(ElementId, TagInstance)>,
        next_id: u64,
        #[serde(skip)]
        transaction: Option<TransactionState>,
    }

    impl Document {
        pub fn new() -> Self {
            Self::default()
        }

        /// 添加视图；首个视图自动成为活动视图。
        pub fn add_view(&mut self, name: impl Into<String>, kind: ViewKind) -> ElementId {
            let id = self.next_id();
            self.views.push((id, View::new(name, kind)));
            if self.active_view.is_none() {
                self.active_view = Some(id);
            }
            id
        }

        pub fn set_active_view(&mut self, view: ElementId) -> Result<(), DocumentError> {
            if self.view(view).is_none() {
                return Err(DocumentError::ViewNotFound(view.get()));
            }
            self.active_view = Some(view);
            Ok(())
        }

        pub fn add_tag_type(
            &mut self,
            family_name: impl Into<String>,
            type_name: impl Into<String>,
            category: Category,
        ) -> ElementId {
            let id = self.next_id();
            self.tag_types.push((
                id,
                TagType {
                    family_name: family_name.into(),
                    type_name: type_name.into(),
                    category,
                },
            ));
            id
        }

        pub fn add_wall_type(&mut self, name: impl Into<String>, kind: WallKind) -> ElementId {
            let mut wall_type = Element::type_definition(Category::Walls, name);
            wall_type.wall_kind = Some(kind);
            self.add_element(wall_type)
        }

        pub fn add_element(&mut self, element: Element) -> ElementId {
            let id = self.next_id();
            self.elements.push((id, element));
            id
        }

        pub fn add_door(&mut self, view: ElementId, point: Point3) -> ElementId {
            self.add_point_instance(Category::Doors, "Door", view, point)
        }

        pub fn add_room(&mut self, view: ElementId, point: Point3) -> ElementId {
            self.add_point_instance(Category::Rooms, "Room", view, point)
        }

        pub fn add_area(&mut self, view: ElementId, point: Point3) -> ElementId {
            self.add_point_instance(Category::Areas, "Area", view, point)
        }

        pub fn add_wall(
            &mut self,
            view: ElementId,
            start: Point3,
            end: Point3,
            wall_type: ElementId,
        ) -> ElementId {
            let element = Element::instance(Category::Walls, "Wall")
                .with_location(Location::Curve(Curve3::new(start, end)))
                .with_type(wall_type)
                .visible_in(view);
            self.add_element(element)
        }

        /// 让已有元素在指定视图中可见。
        pub fn show_in_view(
            &mut self,
            element: ElementId,
            view: ElementId,
        ) -> Result<(), DocumentError> {
            if self.view(view).is_none() {
                return Err(DocumentError::ViewNotFound(view.get()));
            }
            let (_, entry) = self
                .elements
                .iter_mut()
                .find(|(id, _)| *id == element)
                .ok_or(DocumentError::ElementNotFound(element.get()))?;
            if !entry.is_visible_in(view) {
                entry.views.push(view);
            }
            Ok(())
        }

        fn add_point_instance(
            &mut self,
            category: Category,
            name: &str,
            view: ElementId,
            point: Point3,
        ) -> ElementId {
            let element = Element::instance(category, name)
                .with_location(Location::Point(point))
                .visible_in(view);
            self.add_element(element)
        }

        pub fn element(&self, id: ElementId) -> Option<&Element> {
            self.elements
                .iter()
                .find(|(entry_id, _)| *entry_id == id)
                .map(|(_, element)| element)
        }

        pub fn elements(&self) -> impl Iterator<Item = (ElementId, &Element)> {
            self.elements.iter().map(|(id, element)| (*id, element))
        }

        pub fn view(&self, id: ElementId) -> Option<&View> {
            self.views
                .iter()
                .find(|(entry_id, _)| *entry_id == id)
                .map(|(_, view)| view)
        }

        pub fn view_by_name(&self, name: &str) -> Option<ElementId> {
            self.views
                .iter()
                .find(|(_, view)| view.name == name)
                .map(|(id, _)| *id)
        }

        pub fn views(&self) -> impl Iterator<Item = (ElementId, &View)> {
            self.views.iter().map(|(id, view)| (*id, view))
        }

        #[inline]
        pub fn active_view(&self) -> Option<ElementId> {
            self.active_view
        }

        pub fn tag_type(&self, id: ElementId) -> Option<&TagType> {
            self.tag_types
                .iter()
                .find(|(entry_id, _)| *entry_id == id)
                .map(|(_, tag_type)| tag_type)
        }

        pub fn tag_types(&self) -> impl Iterator<Item = (ElementId, &TagType)> {
            self.tag_types.iter().map(|(id, tag_type)| (*id, tag_type))
        }

        pub fn tags(&self) -> impl Iterator<Item = (ElementId, &TagInstance)> {
            self.tags.iter().map(|(id, tag)| (*id, tag))
        }

        /// 下一个待分配的 ID。
        pub fn next_free_id(&self) -> ElementId {
            ElementId::new(self.next_id)
        }

        /// 文档中所有已分配的 ID：视图、元素、标记类型与标记共用同一 ID 空间。
        pub fn allocated_ids(&self) -> impl Iterator<Item = ElementId> + '_ {
            self.views
                .iter()
                .map(|(id, _)| *id)
                .chain(self.elements.iter().map(|(id, _)| *id))
                .chain(self.tag_types.iter().map(|(id, _)| *id))
                .chain(self.tags.iter().map(|(id, _)| *id))
        }

        pub fn tags_in_view(
            &self,
            view: ElementId,
        ) -> impl Iterator<Item = (ElementId, &TagInstance)> {
            self.tags().filter(move |(_, tag)| tag.view == view)
        }

        /// 按过滤条件收集元素 ID，保持文档中的插入顺序。
        pub fn collect(&self, filter: &ElementFilter) -> Vec<ElementId> {
            self.elements
                .iter()
                .filter(|(_, element)| filter.matches(element))
                .map(|(id, _)| *id)
                .collect()
        }

        /// 创建标记实例。必须处于事务中，且视图、标记类型与被标记元素均需存在。
        pub fn create_tag(&mut self, request: NewTag) -> Result<ElementId, DocumentError> {
            if self.transaction.is_none() {
                return Err(DocumentError::NoActiveTransaction);
            }
            if self.view(request.view).is_none() {
                return Err(DocumentError::ViewNotFound(request.view.get()));
            }
            let tag_type = self
                .tag_type(request.tag_type)
                .ok_or(DocumentError::TagTypeNotFound(request.tag_type.get()))?;
            let element = self
                .element(request.element)
                .ok_or(DocumentError::ElementNotFound(request.element.get()))?;
            if element.is_type {
                return Err(DocumentError::TypeNotTaggable(request.element.get()));
            }
            if tag_type.category != element.category {
                return Err(DocumentError::CategoryMismatch {
                    tag_type: request.tag_type.get(),
                    element: request.element.get(),
                    expected: tag_type.category,
                    found: element.category,
                });
            }

            let id = self.next_id();
            self.tags.push((
                id,
                TagInstance {
                    tag_type: request.tag_type,
                    view: request.view,
                    tagged: vec![request.element],
                    head: request.head,
                    orientation: request.orientation,
                    has_leader: request.has_leader,
                },
            ));
            Ok(id)
        }

        pub fn start_transaction(&mut self, name: impl Into<String>) -> Result<(), DocumentError> {
            if let Some(open) = &self.transaction {
                return Err(DocumentError::TransactionAlreadyOpen(open.name.clone()));
            }
            self.transaction = Some(TransactionState {
                name: name.into(),
                next_id: self.next_id,
                views: self.views.clone(),
                elements: self.elements.clone(),
                tag_types: self.tag_types.clone(),
                tags: self.tags.clone(),
                active_view: self.active_view,
            });
            Ok(())
        }

        pub fn commit_transaction(&mut self) -> Result<(), DocumentError> {
            self.transaction
                .take()
                .map(|_| ())
                .ok_or(DocumentError::NoActiveTransaction)
        }

        /// 丢弃事务期间的全部修改。没有打开的事务时不做任何事。
        pub fn rollback_transaction(&mut self) {
            let Some(state) = self.transaction.take() else {
                return;
            };
            self.views = state.views;
            self.elements = state.elements;
            self.tag_types = state.tag_types;
            self.tags = state.tags;
            self.next_id = state.next_id;
            self.active_view = state.active_view;
        }

        #[inline]
        pub fn transaction_name(&self) -> Option<&str> {
            self.transaction.as_ref().map(|state| state.name.as_str())
        }

        fn next_id(&mut self) -> ElementId {
            let id = ElementId::new(self.next_id);
            self.next_id += 1;
            id
        }
    }

}
