use tracing::debug;
use viewtag_core::document::{
    Category, Document, DocumentError, Element, ElementId, NewTag, TagOrientation, ViewKind,
    WallKind,
};
use viewtag_core::geometry::Point3;

/// 演示项目中的关键元素 ID。
#[derive(Debug, Clone, Copy)]
pub struct DemoProject {
    pub view: ElementId,
    pub door_tag: ElementId,
    pub room_tag: ElementId,
    pub wall_tag: ElementId,
    pub wall_type: ElementId,
    pub doors: [ElementId; 3],
    pub rooms: [ElementId; 2],
    pub tagged_wall: ElementId,
    pub unplaced_room: ElementId,
}

/// 为 CLI / 快速验证填充一个平面视图：三扇门、两个房间、一面已标记的墙、
/// 一个墙类型定义以及一个未放置的房间。自动标记后应新增 5 个标记。
pub fn populate_demo(document: &mut Document) -> Result<DemoProject, DocumentError> {
    let view = document.add_view("Level 1", ViewKind::FloorPlan);
    let door_tag = document.add_tag_type("Door Tag", "Standard", Category::Doors);
    let room_tag = document.add_tag_type("Room Tag", "Name and Number", Category::Rooms);
    let wall_tag = document.add_tag_type("Wall Tag", "Type Mark", Category::Walls);

    let wall_type = document.add_wall_type("Generic - 200mm", WallKind::Basic);
    // 类型定义同样出现在视图里，由过滤器排除。
    document.show_in_view(wall_type, view)?;

    let doors = [
        document.add_door(view, Point3::new(2.0, 0.0, 0.0)),
        document.add_door(view, Point3::new(8.0, 0.0, 0.0)),
        document.add_door(view, Point3::new(14.0, 6.0, 0.0)),
    ];
    let rooms = [
        document.add_room(view, Point3::new(4.0, 3.0, 0.0)),
        document.add_room(view, Point3::new(12.0, 3.0, 0.0)),
    ];
    let tagged_wall = document.add_wall(
        view,
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(16.0, 0.0, 0.0),
        wall_type,
    );
    let unplaced_room =
        document.add_element(Element::instance(Category::Rooms, "Unplaced Room").visible_in(view));

    document.start_transaction("Seed tags")?;
    let seeded = document.create_tag(NewTag {
        tag_type: wall_tag,
        view,
        element: tagged_wall,
        head: Point3::new(8.0, 0.0, 0.0),
        orientation: TagOrientation::Horizontal,
        has_leader: false,
    });
    match seeded {
        Ok(_) => document.commit_transaction()?,
        Err(err) => {
            document.rollback_transaction();
            return Err(err);
        }
    }

    let project = DemoProject {
        view,
        door_tag,
        room_tag,
        wall_tag,
        wall_type,
        doors,
        rooms,
        tagged_wall,
        unplaced_room,
    };

    debug!(
        view = project.view.get(),
        tagged_wall = project.tagged_wall.get(),
        unplaced_room = project.unplaced_room.get(),
        "已创建演示项目"
    );

    Ok(project)
}
