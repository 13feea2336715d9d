use std::collections::HashSet;

use tracing::debug;
use viewtag_config::DuplicateStrategy;
use viewtag_core::document::{Category, ElementFilter, ElementId};

use crate::host::TagHost;
use crate::resolver;

/// 逐个扫描视图中的标记，判断元素是否已被标记。
pub fn is_element_tagged<H: TagHost>(host: &H, view: ElementId, element: ElementId) -> bool {
    host.tags_in_view(view)
        .into_iter()
        .any(|tag| tag.references(element))
}

/// 视图中所有已被标记的元素 ID。
pub fn tagged_elements<H: TagHost>(host: &H, view: ElementId) -> HashSet<ElementId> {
    host.tags_in_view(view)
        .into_iter()
        .flat_map(|tag| tag.tagged.iter().copied())
        .collect()
}

/// 重复标记检测器。两种策略的判定结果一致，差别只在查询开销。
#[derive(Debug, Clone)]
pub enum DuplicateDetector {
    Indexed(HashSet<ElementId>),
    Scan,
}

impl DuplicateDetector {
    pub fn build<H: TagHost>(strategy: DuplicateStrategy, host: &H, view: ElementId) -> Self {
        match strategy {
            DuplicateStrategy::Indexed => {
                let tagged = tagged_elements(host, view);
                debug!(view = view.get(), tagged = tagged.len(), "已建立标记索引");
                Self::Indexed(tagged)
            }
            DuplicateStrategy::Scan => Self::Scan,
        }
    }

    pub fn is_tagged<H: TagHost>(&self, host: &H, view: ElementId, element: ElementId) -> bool {
        match self {
            Self::Indexed(tagged) => tagged.contains(&element),
            Self::Scan => is_element_tagged(host, view, element),
        }
    }

    /// 记录本次运行新建的标记，扫描策略直接从宿主读取，无需记录。
    pub fn record(&mut self, element: ElementId) {
        if let Self::Indexed(tagged) = self {
            tagged.insert(element);
        }
    }
}

/// 视图中候选元素的标记情况。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagStatus {
    pub tagged: usize,
    pub untagged: usize,
    pub unplaced: usize,
}

/// 只读统计，不创建任何标记。
pub fn survey<H: TagHost>(host: &H, view: ElementId, categories: &[Category]) -> TagStatus {
    let filter = ElementFilter::in_view(view)
        .with_categories(categories.iter().copied())
        .instances_only();
    let tagged = tagged_elements(host, view);
    let mut status = TagStatus::default();
    for id in host.collect_elements(&filter) {
        let Some(element) = host.element(id) else {
            continue;
        };
        if resolver::insertion_point(element.location.as_ref()).is_none() {
            status.unplaced += 1;
        } else if tagged.contains(&id) {
            status.tagged += 1;
        } else {
            status.untagged += 1;
        }
    }
    status
}

#[cfg(test)]
mod tests {
    use viewtag_core::document::{Document, NewTag, TagOrientation, ViewKind};
    use viewtag_core::geometry::Point3;

    use super::*;

    struct Fixture {
        doc: Document,
        plan: ElementId,
        other: ElementId,
        tagged_door: ElementId,
        free_door: ElementId,
        other_door: ElementId,
    }

    fn fixture() -> Fixture {
        let mut doc = Document::new();
        let plan = doc.add_view("Level 1", ViewKind::FloorPlan);
        let other = doc.add_view("Level 2", ViewKind::FloorPlan);
        let door_tag = doc.add_tag_type("Door Tag", "Standard", Category::Doors);
        let tagged_door = doc.add_door(plan, Point3::new(0.0, 0.0, 0.0));
        let free_door = doc.add_door(plan, Point3::new(4.0, 0.0, 0.0));
        let other_door = doc.add_door(other, Point3::new(8.0, 0.0, 0.0));

        doc.start_transaction("seed").unwrap();
        for (view, element) in [(plan, tagged_door), (plan, other_door)] {
            doc.create_tag(NewTag {
                tag_type: door_tag,
                view,
                element,
                head: Point3::new(0.0, 0.0, 0.0),
                orientation: TagOrientation::Horizontal,
                has_leader: false,
            })
            .unwrap();
        }
        doc.commit_transaction().unwrap();

        Fixture {
            doc,
            plan,
            other,
            tagged_door,
            free_door,
            other_door,
        }
    }

    #[test]
    fn scan_and_index_agree() {
        let f = fixture();
        let indexed = DuplicateDetector::build(DuplicateStrategy::Indexed, &f.doc, f.plan);
        let scan = DuplicateDetector::build(DuplicateStrategy::Scan, &f.doc, f.plan);
        assert!(matches!(indexed, DuplicateDetector::Indexed(_)));
        assert!(matches!(scan, DuplicateDetector::Scan));

        for element in [f.tagged_door, f.free_door, f.other_door] {
            assert_eq!(
                indexed.is_tagged(&f.doc, f.plan, element),
                scan.is_tagged(&f.doc, f.plan, element),
            );
        }
        assert!(indexed.is_tagged(&f.doc, f.plan, f.tagged_door));
        assert!(!indexed.is_tagged(&f.doc, f.plan, f.free_door));
    }

    #[test]
    fn tags_are_scoped_to_their_view() {
        let f = fixture();
        // other_door 的标记放在 Level 1，所以在 Level 2 中仍视为未标记。
        assert!(is_element_tagged(&f.doc, f.plan, f.other_door));
        assert!(!is_element_tagged(&f.doc, f.other, f.other_door));
        assert!(tagged_elements(&f.doc, f.other).is_empty());
    }

    #[test]
    fn recording_updates_index_only() {
        let f = fixture();
        let mut indexed = DuplicateDetector::build(DuplicateStrategy::Indexed, &f.doc, f.plan);
        indexed.record(f.free_door);
        assert!(indexed.is_tagged(&f.doc, f.plan, f.free_door));

        let mut scan = DuplicateDetector::Scan;
        scan.record(f.free_door);
        assert!(!scan.is_tagged(&f.doc, f.plan, f.free_door));
    }

    #[test]
    fn survey_counts_candidates() {
        let mut f = fixture();
        f.doc.add_element(
            viewtag_core::document::Element::instance(Category::Rooms, "Unplaced room")
                .visible_in(f.plan),
        );
        let status = survey(&f.doc, f.plan, &[Category::Doors, Category::Rooms]);
        assert_eq!(
            status,
            TagStatus {
                tagged: 1,
                untagged: 1,
                unplaced: 1,
            }
        );
    }
}
