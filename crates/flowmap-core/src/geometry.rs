//! Geometric primitives for diagram layout and edge routing.
//!
//! # Overview
//!
//! - [`Point`] - A 2D coordinate (or vector) in diagram space
//! - [`Size`] - Width and height dimensions
//! - [`Bounds`] - An axis-aligned box defined by minimum and maximum coordinates
//! - [`Insets`] - Padding values for four sides
//! - [`is_partly_contained`] - Overlap test for two center-anchored boxes
//!
//! # Coordinate System
//!
//! Flowmap uses the SVG coordinate system:
//!
//! ```text
//!   (0,0) ────────► +X   (ranks grow left to right)
//!     │
//!     ▼
//!    +Y
//! ```
//!
//! Every positioned item is anchored at its center unless stated otherwise.

/// A 2D point representing a position (or a displacement) in diagram space.
///
/// # Examples
///
/// ```
/// # use flowmap_core::geometry::Point;
/// let a = Point::new(10.0, 20.0);
/// let b = Point::new(30.0, 0.0);
///
/// assert_eq!(a.add_point(b), Point::new(40.0, 20.0));
/// assert_eq!(a.midpoint(b), Point::new(20.0, 10.0));
/// assert_eq!(Point::new(3.0, 4.0).hypot(), 5.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> f32 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> f32 {
        self.y
    }

    /// Creates a new point with the specified x-coordinate
    pub fn with_x(mut self, x: f32) -> Self {
        self.x = x;
        self
    }

    /// Creates a new point with the specified y-coordinate
    pub fn with_y(mut self, y: f32) -> Self {
        self.y = y;
        self
    }

    /// Component-wise sum of two points.
    pub fn add_point(self, other: Point) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    /// Component-wise difference `self - other`.
    pub fn sub_point(self, other: Point) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    /// Calculates the midpoint between this point and another point
    pub fn midpoint(self, other: Point) -> Self {
        Self {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }

    /// Length of the vector from the origin to this point.
    pub fn hypot(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Euclidean distance between two points.
    pub fn distance(self, other: Point) -> f32 {
        self.sub_point(other).hypot()
    }

    /// Multiplies both coordinates by the given factor.
    pub fn scale(self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    /// Returns a new point with absolute values of both coordinates
    pub fn abs(self) -> Self {
        Self {
            x: self.x.abs(),
            y: self.y.abs(),
        }
    }

    /// Coordinate-wise arithmetic mean of a set of points.
    ///
    /// Returns `None` for an empty set.
    ///
    /// ```
    /// # use flowmap_core::geometry::Point;
    /// let points = [Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(5.0, 30.0)];
    /// assert_eq!(Point::average(points), Some(Point::new(5.0, 10.0)));
    /// assert_eq!(Point::average(Vec::<Point>::new()), None);
    /// ```
    pub fn average(points: impl IntoIterator<Item = Point>) -> Option<Point> {
        let (sum, count) = points
            .into_iter()
            .fold((Point::default(), 0usize), |(sum, count), point| {
                (sum.add_point(point), count + 1)
            });
        (count > 0).then(|| Point::new(sum.x / count as f32, sum.y / count as f32))
    }

    /// Converts a point and size into a bounds rectangle centered on the point.
    pub fn to_bounds(self, size: Size) -> Bounds {
        Bounds::new_from_center(self, size)
    }
}

/// Represents the dimensions of an element with width and height
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    width: f32,
    height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Returns the width dimension of this size
    pub fn width(self) -> f32 {
        self.width
    }

    /// Returns the height dimension of this size
    pub fn height(self) -> f32 {
        self.height
    }

    /// Returns a new Size with the maximum width and height between this size and another
    pub fn max(self, other: Size) -> Self {
        Self {
            width: self.width.max(other.width),
            height: self.height.max(other.height),
        }
    }

    /// Returns a new Size with the given padding added to both dimensions
    pub fn add_padding(self, insets: Insets) -> Self {
        Self {
            width: self.width + insets.horizontal_sum(),
            height: self.height + insets.vertical_sum(),
        }
    }

    /// Multiplies both dimensions by the given factor
    pub fn scale(self, factor: f32) -> Self {
        Self {
            width: self.width * factor,
            height: self.height * factor,
        }
    }

    /// Returns true if both width and height are zero
    pub fn is_zero(self) -> bool {
        self.width == 0.0 && self.height == 0.0
    }
}

/// Returns true iff the two axis-aligned boxes, each given by its center and
/// size, overlap at all. Touching boundaries count as overlap.
///
/// ```
/// # use flowmap_core::geometry::{is_partly_contained, Point, Size};
/// let size = Size::new(10.0, 10.0);
/// // Touching along the x axis.
/// assert!(is_partly_contained(Point::new(0.0, 0.0), size, Point::new(10.0, 0.0), size));
/// // Separated by a hair.
/// assert!(!is_partly_contained(Point::new(0.0, 0.0), size, Point::new(10.1, 0.0), size));
/// ```
pub fn is_partly_contained(center_a: Point, size_a: Size, center_b: Point, size_b: Size) -> bool {
    let delta = center_a.sub_point(center_b).abs();
    delta.x <= (size_a.width + size_b.width) / 2.0
        && delta.y <= (size_a.height + size_b.height) / 2.0
}

/// Represents a rectangular bounding box with minimum and maximum coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Bounds {
    /// Creates a new bounds from a center point and a size
    pub fn new_from_center(center: Point, size: Size) -> Self {
        let half_width = size.width / 2.0;
        let half_height = size.height / 2.0;
        Self {
            min_x: center.x - half_width,
            min_y: center.y - half_height,
            max_x: center.x + half_width,
            max_y: center.y + half_height,
        }
    }

    /// Creates a new bounds from a top-left point and a size
    pub fn new_from_top_left(top_left: Point, size: Size) -> Self {
        Self {
            min_x: top_left.x,
            min_y: top_left.y,
            max_x: top_left.x + size.width,
            max_y: top_left.y + size.height,
        }
    }

    /// Smallest bounds containing every point, or `None` for an empty set.
    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        points.into_iter().fold(None, |acc: Option<Bounds>, point| {
            let single = Bounds {
                min_x: point.x,
                min_y: point.y,
                max_x: point.x,
                max_y: point.y,
            };
            Some(acc.map_or(single, |bounds| bounds.merge(&single)))
        })
    }

    /// Returns the minimum x-coordinate of the bounds
    pub fn min_x(self) -> f32 {
        self.min_x
    }

    /// Returns the minimum y-coordinate of the bounds
    pub fn min_y(self) -> f32 {
        self.min_y
    }

    /// Returns the maximum x-coordinate of the bounds
    pub fn max_x(self) -> f32 {
        self.max_x
    }

    /// Returns the maximum y-coordinate of the bounds
    pub fn max_y(self) -> f32 {
        self.max_y
    }

    /// Returns the center point of the bounds
    pub fn center(self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Returns the width of the bounds
    pub fn width(self) -> f32 {
        self.max_x - self.min_x
    }

    /// Returns the height of the bounds
    pub fn height(self) -> f32 {
        self.max_y - self.min_y
    }

    /// Returns the top-left corner as a Point
    pub fn min_point(self) -> Point {
        Point::new(self.min_x, self.min_y)
    }

    /// Converts bounds to a Size object
    pub fn to_size(self) -> Size {
        Size::new(self.width(), self.height())
    }

    /// Merges two bounds into the smallest bounds containing both.
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Grows the bounds by `amount` on every side.
    pub fn inflate(&self, amount: f32) -> Self {
        Self {
            min_x: self.min_x - amount,
            min_y: self.min_y - amount,
            max_x: self.max_x + amount,
            max_y: self.max_y + amount,
        }
    }

    /// Moves the bounds by the specified offset.
    pub fn translate(&self, offset: Point) -> Self {
        Self {
            min_x: self.min_x + offset.x,
            min_y: self.min_y + offset.y,
            max_x: self.max_x + offset.x,
            max_y: self.max_y + offset.y,
        }
    }

    /// Returns new bounds with padding applied on each side.
    pub fn add_padding(&self, insets: Insets) -> Self {
        Self {
            min_x: self.min_x - insets.left,
            min_y: self.min_y - insets.top,
            max_x: self.max_x + insets.right,
            max_y: self.max_y + insets.bottom,
        }
    }
}

/// Padding or margin values for the four sides of a box.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Insets {
    top: f32,
    right: f32,
    bottom: f32,
    left: f32,
}

impl Insets {
    /// Creates insets in CSS order: top, right, bottom, left.
    pub fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Creates insets with the same value on all four sides.
    pub fn uniform(value: f32) -> Self {
        Self::new(value, value, value, value)
    }

    pub fn top(self) -> f32 {
        self.top
    }

    pub fn right(self) -> f32 {
        self.right
    }

    pub fn bottom(self) -> f32 {
        self.bottom
    }

    pub fn left(self) -> f32 {
        self.left
    }

    /// Sum of left and right insets.
    pub fn horizontal_sum(self) -> f32 {
        self.left + self.right
    }

    /// Sum of top and bottom insets.
    pub fn vertical_sum(self) -> f32 {
        self.top + self.bottom
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_point_arithmetic() {
        let a = Point::new(1.0, 2.0);
        let b = Point::new(4.0, 6.0);

        assert_eq!(a.add_point(b), Point::new(5.0, 8.0));
        assert_eq!(b.sub_point(a), Point::new(3.0, 4.0));
        assert_eq!(a.scale(3.0), Point::new(3.0, 6.0));
        assert_eq!(a.midpoint(b), Point::new(2.5, 4.0));
    }

    #[test]
    fn test_point_length_and_distance() {
        assert_approx_eq!(f32, Point::new(3.0, 4.0).hypot(), 5.0);
        assert_approx_eq!(f32, Point::new(1.0, 1.0).distance(Point::new(4.0, 5.0)), 5.0);
        assert_approx_eq!(f32, Point::default().hypot(), 0.0);
    }

    #[test]
    fn test_point_average() {
        let avg = Point::average([Point::new(0.0, 10.0), Point::new(20.0, 30.0)])
            .expect("non-empty set");
        assert_approx_eq!(f32, avg.x(), 10.0);
        assert_approx_eq!(f32, avg.y(), 20.0);

        let single = Point::average([Point::new(7.0, -3.0)]).expect("non-empty set");
        assert_eq!(single, Point::new(7.0, -3.0));

        assert!(Point::average(std::iter::empty::<Point>()).is_none());
    }

    #[test]
    fn test_is_partly_contained_overlap() {
        let size = Size::new(10.0, 4.0);
        assert!(is_partly_contained(
            Point::new(0.0, 0.0),
            size,
            Point::new(3.0, 1.0),
            size
        ));
    }

    #[test]
    fn test_is_partly_contained_touching_is_inclusive() {
        let size = Size::new(10.0, 4.0);
        assert!(is_partly_contained(
            Point::new(0.0, 0.0),
            size,
            Point::new(0.0, 4.0),
            size
        ));
        assert!(is_partly_contained(
            Point::new(0.0, 0.0),
            size,
            Point::new(10.0, 4.0),
            size
        ));
    }

    #[test]
    fn test_is_partly_contained_disjoint() {
        let size = Size::new(10.0, 4.0);
        assert!(!is_partly_contained(
            Point::new(0.0, 0.0),
            size,
            Point::new(0.0, 4.5),
            size
        ));
        assert!(!is_partly_contained(
            Point::new(0.0, 0.0),
            size,
            Point::new(-11.0, 0.0),
            size
        ));
    }

    #[test]
    fn test_is_partly_contained_zero_size_point() {
        let size = Size::new(10.0, 10.0);
        // A zero-size box on the border of another counts as contained.
        assert!(is_partly_contained(
            Point::new(5.0, 0.0),
            Size::default(),
            Point::new(0.0, 0.0),
            size
        ));
    }

    #[test]
    fn test_bounds_from_center_and_top_left() {
        let bounds = Bounds::new_from_center(Point::new(10.0, 10.0), Size::new(4.0, 6.0));
        assert_eq!(bounds.min_point(), Point::new(8.0, 7.0));
        assert_approx_eq!(f32, bounds.max_x(), 12.0);
        assert_approx_eq!(f32, bounds.max_y(), 13.0);

        let same = Bounds::new_from_top_left(Point::new(8.0, 7.0), Size::new(4.0, 6.0));
        assert_eq!(bounds, same);
        assert_eq!(same.center(), Point::new(10.0, 10.0));
        assert_eq!(same.to_size(), Size::new(4.0, 6.0));
    }

    #[test]
    fn test_bounds_from_points() {
        let bounds = Bounds::from_points([
            Point::new(3.0, 9.0),
            Point::new(-1.0, 2.0),
            Point::new(5.0, 4.0),
        ])
        .expect("non-empty set");

        assert_eq!(bounds.min_point(), Point::new(-1.0, 2.0));
        assert_approx_eq!(f32, bounds.max_x(), 5.0);
        assert_approx_eq!(f32, bounds.max_y(), 9.0);
        assert!(Bounds::from_points(std::iter::empty::<Point>()).is_none());
    }

    #[test]
    fn test_bounds_inflate_and_translate() {
        let bounds = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(10.0, 10.0));
        let inflated = bounds.inflate(2.0);
        assert_eq!(inflated.min_point(), Point::new(-2.0, -2.0));
        assert_eq!(inflated.to_size(), Size::new(14.0, 14.0));

        let moved = bounds.translate(Point::new(5.0, -5.0));
        assert_eq!(moved.min_point(), Point::new(5.0, -5.0));
        assert_eq!(moved.to_size(), bounds.to_size());
    }

    #[test]
    fn test_size_padding_and_max() {
        let size = Size::new(10.0, 20.0).add_padding(Insets::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(size, Size::new(16.0, 24.0));
        assert_eq!(
            Size::new(1.0, 9.0).max(Size::new(5.0, 2.0)),
            Size::new(5.0, 9.0)
        );
        assert!(Size::default().is_zero());
    }
}

#[cfg(test)]
mod proptest_tests {
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    use super::*;

    fn point_strategy() -> impl Strategy<Value = Point> {
        (-1000.0f32..1000.0, -1000.0f32..1000.0).prop_map(|(x, y)| Point::new(x, y))
    }

    fn size_strategy() -> impl Strategy<Value = Size> {
        (0.0f32..500.0, 0.0f32..500.0).prop_map(|(w, h)| Size::new(w, h))
    }

    proptest! {
        #[test]
        fn partly_contained_is_symmetric(
            a in point_strategy(),
            sa in size_strategy(),
            b in point_strategy(),
            sb in size_strategy(),
        ) {
            prop_assert_eq!(
                is_partly_contained(a, sa, b, sb),
                is_partly_contained(b, sb, a, sa)
            );
        }

        #[test]
        fn box_contains_its_own_center(a in point_strategy(), sa in size_strategy()) {
            prop_assert!(is_partly_contained(a, sa, a, Size::default()));
        }

        #[test]
        fn average_lies_within_bounds(points in prop::collection::vec(point_strategy(), 1..16)) {
            let avg = Point::average(points.iter().copied()).unwrap();
            let bounds = Bounds::from_points(points.iter().copied()).unwrap().inflate(0.01);
            prop_assert!(avg.x() >= bounds.min_x() && avg.x() <= bounds.max_x());
            prop_assert!(avg.y() >= bounds.min_y() && avg.y() <= bounds.max_y());
        }

        #[test]
        fn distance_is_symmetric(a in point_strategy(), b in point_strategy()) {
            prop_assert!(approx_eq!(f32, a.distance(b), b.distance(a), epsilon = 0.001));
        }
    }
}
