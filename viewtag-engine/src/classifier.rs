use std::collections::HashMap;

use tracing::debug;
use viewtag_core::document::{Category, ElementId};

use crate::errors::TagError;
use crate::host::TagHost;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundTemplate {
    pub tag_type: ElementId,
    pub family_name: String,
}

/// 类别 -> 标记模板映射，每次运行开始时构建一次。
#[derive(Debug, Clone, Default)]
pub struct TemplateMap {
    templates: HashMap<Category, BoundTemplate>,
}

impl TemplateMap {
    /// 按族名在文档中查找每个绑定的模板，同名时取第一个。
    /// 任一模板缺失即返回 [`TagError::MissingTemplate`]。
    pub fn resolve<H: TagHost>(
        host: &H,
        bindings: &[(Category, String)],
    ) -> Result<Self, TagError> {
        let tag_types = host.tag_types();
        let mut templates = HashMap::with_capacity(bindings.len());
        for (category, family) in bindings {
            let (tag_type, _) = tag_types
                .iter()
                .find(|(_, tag_type)| tag_type.family_name == *family)
                .ok_or_else(|| TagError::MissingTemplate {
                    category: *category,
                    family: family.clone(),
                })?;
            debug!(
                category = %category,
                family = family.as_str(),
                tag_type = tag_type.get(),
                "已绑定标记模板"
            );
            templates.insert(
                *category,
                BoundTemplate {
                    tag_type: *tag_type,
                    family_name: family.clone(),
                },
            );
        }
        Ok(Self { templates })
    }

    /// 返回元素类别对应的模板。类别未绑定属于前置条件错误。
    pub fn template_for(
        &self,
        element: ElementId,
        category: Category,
    ) -> Result<ElementId, TagError> {
        self.templates
            .get(&category)
            .map(|bound| bound.tag_type)
            .ok_or(TagError::UnmappedCategory {
                element: element.get(),
                category,
            })
    }

    pub fn get(&self, category: Category) -> Option<&BoundTemplate> {
        self.templates.get(&category)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use viewtag_core::document::Document;

    use super::*;

    fn default_bindings() -> Vec<(Category, String)> {
        vec![
            (Category::Doors, "Door Tag".to_string()),
            (Category::Rooms, "Room Tag".to_string()),
            (Category::Walls, "Wall Tag".to_string()),
        ]
    }

    #[test]
    fn categories_route_to_named_templates() {
        let mut doc = Document::new();
        let door_tag = doc.add_tag_type("Door Tag", "Standard", Category::Doors);
        let room_tag = doc.add_tag_type("Room Tag", "Name Only", Category::Rooms);
        let wall_tag = doc.add_tag_type("Wall Tag", "Type Mark", Category::Walls);

        let map = TemplateMap::resolve(&doc, &default_bindings()).expect("resolve templates");
        assert_eq!(map.len(), 3);
        let element = ElementId::new(100);
        assert_eq!(map.template_for(element, Category::Doors).unwrap(), door_tag);
        assert_eq!(map.template_for(element, Category::Rooms).unwrap(), room_tag);
        assert_eq!(map.template_for(element, Category::Walls).unwrap(), wall_tag);
        assert_eq!(map.get(Category::Doors).unwrap().family_name, "Door Tag");
    }

    #[test]
    fn first_template_with_matching_family_wins() {
        let mut doc = Document::new();
        let first = doc.add_tag_type("Door Tag", "Standard", Category::Doors);
        doc.add_tag_type("Door Tag", "Large", Category::Doors);
        doc.add_tag_type("Room Tag", "Standard", Category::Rooms);
        doc.add_tag_type("Wall Tag", "Standard", Category::Walls);

        let map = TemplateMap::resolve(&doc, &default_bindings()).unwrap();
        assert_eq!(map.template_for(ElementId::new(1), Category::Doors).unwrap(), first);
    }

    #[test]
    fn missing_template_is_a_configuration_error() {
        let mut doc = Document::new();
        doc.add_tag_type("Door Tag", "Standard", Category::Doors);
        doc.add_tag_type("Wall Tag", "Standard", Category::Walls);

        let err = TemplateMap::resolve(&doc, &default_bindings()).unwrap_err();
        match err {
            TagError::MissingTemplate { category, family } => {
                assert_eq!(category, Category::Rooms);
                assert_eq!(family, "Room Tag");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unmapped_category_is_reported_with_element() {
        let map = TemplateMap::default();
        assert!(map.is_empty());
        let err = map
            .template_for(ElementId::new(42), Category::Areas)
            .unwrap_err();
        assert!(matches!(
            err,
            TagError::UnmappedCategory {
                element: 42,
                category: Category::Areas
            }
        ));
    }
}
