use viewtag_core::document::Location;
use viewtag_core::geometry::{Curve3, Point3};

/// 由元素定位推导标记插入点：点定位原样返回，曲线定位取两端点中点。
/// 没有定位的元素返回 `None`，调用方静默跳过。
pub fn insertion_point(location: Option<&Location>) -> Option<Point3> {
    match location? {
        Location::Point(point) => Some(*point),
        Location::Curve(curve) => Some(curve_midpoint(curve)),
    }
}

#[inline]
pub fn curve_midpoint(curve: &Curve3) -> Point3 {
    curve.start.midpoint(curve.end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_location_is_returned_unchanged() {
        let point = Point3::new(12.25, -3.5, 7.0);
        assert_eq!(insertion_point(Some(&Location::Point(point))), Some(point));
    }

    #[test]
    fn curve_location_uses_endpoint_midpoint() {
        let curve = Curve3::new(Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 4.0, 0.0));
        assert_eq!(
            insertion_point(Some(&Location::Curve(curve))),
            Some(Point3::new(5.0, 2.0, 0.0))
        );

        let sloped = Curve3::new(Point3::new(-2.0, 1.0, 3.0), Point3::new(4.0, 5.0, -1.0));
        let mid = insertion_point(Some(&Location::Curve(sloped))).expect("midpoint");
        assert!((mid.x() - 1.0).abs() < 1e-12);
        assert!((mid.y() - 3.0).abs() < 1e-12);
        assert!((mid.z() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn reversed_curve_has_same_midpoint() {
        let start = Point3::new(1.0, 2.0, 0.0);
        let end = Point3::new(7.0, -4.0, 2.0);
        assert_eq!(
            curve_midpoint(&Curve3::new(start, end)),
            curve_midpoint(&Curve3::new(end, start))
        );
        assert_eq!(curve_midpoint(&Curve3::new(start, end)), Point3::new(4.0, -1.0, 1.0));
    }

    #[test]
    fn missing_location_yields_no_point() {
        assert_eq!(insertion_point(None), None);
    }
}
