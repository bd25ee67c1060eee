//! Planar polyline helpers: projection of a point, splitting and merging.
//! All inputs are in the planar frame; lengths and distances come from geo's
//! [`Euclidean`] metric space.

use geo::{Coord, Distance, Euclidean, Length, LineLocatePoint, LineString, Point};

use crate::Error;

/// Endpoints closer than this are treated as the same point when merging
pub const MERGE_TOLERANCE: f64 = 0.001;

/// Closest point of a polyline to a query point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineProjection {
    /// The point on the line
    pub point: Coord<f64>,
    /// Index of the segment holding the point
    pub segment: usize,
    /// Distance from the query to the line
    pub offset: f64,
    /// Distance along the line from its start
    pub along: f64,
}

/// Project a point onto a polyline. `None` for lines without segments or a
/// query that cannot be located.
///
/// A point that projects onto a vertex returns that vertex exactly, so callers
/// can compare it against the line's own coordinates.
pub fn project_onto_line(line: &LineString<f64>, query: Coord<f64>) -> Option<LineProjection> {
    let query_point = Point::from(query);
    let mut best: Option<LineProjection> = None;
    let mut travelled = 0.0;

    for (index, segment) in line.lines().enumerate() {
        let length = Euclidean.length(&segment);
        // Clamped to [0, 1], so the ends come back as the exact vertices
        let fraction = segment.line_locate_point(&query_point)?;
        let point = match fraction {
            f if f <= 0.0 => segment.start,
            f if f >= 1.0 => segment.end,
            f => segment.start + segment.delta() * f,
        };

        let offset = Euclidean.distance(point, query);
        if best.is_none_or(|b| offset < b.offset) {
            best = Some(LineProjection {
                point,
                segment: index,
                offset,
                along: travelled + length * fraction,
            });
        }
        travelled += length;
    }

    best
}

/// Split a polyline at a projected point into two contiguous parts, the first
/// ending and the second starting exactly at the point.
///
/// # Errors
///
/// [`Error::GeometrySnap`] if either part would be degenerate or the parts do
/// not add up to the original length within `tolerance`.
pub fn split_line_at(
    line: &LineString<f64>,
    at: &LineProjection,
    tolerance: f64,
) -> Result<(LineString<f64>, LineString<f64>), Error> {
    let coords = &line.0;
    if at.segment + 1 >= coords.len() {
        return Err(Error::GeometrySnap(format!(
            "segment {} is outside a line of {} points",
            at.segment,
            coords.len()
        )));
    }

    let mut first: Vec<Coord<f64>> = coords[..=at.segment].to_vec();
    if first.last() != Some(&at.point) {
        first.push(at.point);
    }

    let mut second = Vec::with_capacity(coords.len() - at.segment);
    if coords[at.segment + 1] != at.point {
        second.push(at.point);
    }
    second.extend_from_slice(&coords[at.segment + 1..]);

    if first.len() < 2 || second.len() < 2 {
        return Err(Error::GeometrySnap(
            "split point coincides with a line endpoint".to_string(),
        ));
    }

    let (first, second) = (LineString::new(first), LineString::new(second));
    let difference =
        Euclidean.length(&first) + Euclidean.length(&second) - Euclidean.length(line);
    if difference.abs() > tolerance {
        return Err(Error::GeometrySnap(format!(
            "split point is {difference:.4} m off the line"
        )));
    }

    Ok((first, second))
}

/// Reverse a polyline
pub fn reversed(line: &LineString<f64>) -> LineString<f64> {
    LineString::new(line.0.iter().rev().copied().collect())
}

/// Merge an ordered sequence of polylines into a single polyline.
///
/// Each line must start or end where the merged line so far ends; a line
/// touching at its end is appended reversed. The very first line may also be
/// flipped to meet the second.
///
/// # Errors
///
/// [`Error::NotContiguous`] if the sequence is empty or has a gap.
pub fn merge_lines<'a, I>(lines: I) -> Result<LineString<f64>, Error>
where
    I: IntoIterator<Item = &'a LineString<f64>>,
{
    let mut lines = lines.into_iter();
    let mut coords = lines.next().ok_or(Error::NotContiguous)?.0.clone();
    let close = |a: Coord<f64>, b: Coord<f64>| Euclidean.distance(a, b) <= MERGE_TOLERANCE;

    for (position, line) in lines.enumerate() {
        let (Some(&start), Some(&end), Some(&next_start), Some(&next_end)) =
            (coords.first(), coords.last(), line.0.first(), line.0.last())
        else {
            return Err(Error::NotContiguous);
        };

        if position == 0 && !close(end, next_start) && !close(end, next_end) {
            if close(start, next_start) || close(start, next_end) {
                coords.reverse();
            } else {
                return Err(Error::NotContiguous);
            }
        }

        let end = coords.last().copied().unwrap_or(end);
        if close(end, next_start) {
            coords.extend(line.0.iter().skip(1));
        } else if close(end, next_end) {
            coords.extend(line.0.iter().rev().skip(1));
        } else {
            return Err(Error::NotContiguous);
        }
    }

    Ok(LineString::new(coords))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::line_string;

    fn zigzag() -> LineString<f64> {
        line_string![(x: 0.0, y: 0.0), (x: 100.0, y: 0.0), (x: 100.0, y: 100.0)]
    }

    #[test]
    fn projects_onto_nearest_segment() {
        let projection = project_onto_line(&zigzag(), Coord { x: 150.0, y: 40.0 }).unwrap();
        assert_eq!(projection.segment, 1);
        assert_eq!(projection.point, Coord { x: 100.0, y: 40.0 });
        assert!((projection.offset - 50.0).abs() < 1e-9);
        assert!((projection.along - 140.0).abs() < 1e-9);
    }

    #[test]
    fn projection_past_the_end_snaps_to_vertex() {
        let projection = project_onto_line(&zigzag(), Coord { x: -20.0, y: -5.0 }).unwrap();
        assert_eq!(projection.point, Coord { x: 0.0, y: 0.0 });
        assert_eq!(projection.along, 0.0);
    }

    #[test]
    fn split_conserves_length() {
        let line = zigzag();
        let at = project_onto_line(&line, Coord { x: 30.0, y: 50.0 }).unwrap();
        let (first, second) = split_line_at(&line, &at, 0.01).unwrap();

        assert_eq!(first.0.last(), Some(&Coord { x: 30.0, y: 0.0 }));
        assert_eq!(second.0.first(), Some(&Coord { x: 30.0, y: 0.0 }));
        assert_eq!(second.0.len(), 3);
        let total = Euclidean.length(&first) + Euclidean.length(&second);
        assert!((total - Euclidean.length(&line)).abs() < 1e-9);
    }

    #[test]
    fn split_at_inner_vertex_does_not_duplicate_it() {
        let line = zigzag();
        let at = project_onto_line(&line, Coord { x: 120.0, y: -20.0 }).unwrap();
        let (first, second) = split_line_at(&line, &at, 0.01).unwrap();
        assert_eq!(first.0.len(), 2);
        assert_eq!(second.0.len(), 2);
    }

    #[test]
    fn split_at_endpoint_is_rejected() {
        let line = zigzag();
        let at = project_onto_line(&line, Coord { x: -1.0, y: 0.0 }).unwrap();
        assert!(matches!(
            split_line_at(&line, &at, 0.01),
            Err(Error::GeometrySnap(_))
        ));
    }

    #[test]
    fn merges_in_sequence_and_reversed() {
        let a = line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)];
        let b = line_string![(x: 2.0, y: 0.0), (x: 1.0, y: 0.0)];
        let c = line_string![(x: 2.0, y: 0.0), (x: 3.0, y: 1.0)];
        let merged = merge_lines([&a, &b, &c]).unwrap();
        assert_eq!(
            merged,
            line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 2.0, y: 0.0), (x: 3.0, y: 1.0)]
        );
    }

    #[test]
    fn first_line_may_be_flipped() {
        let a = line_string![(x: 1.0, y: 0.0), (x: 0.0, y: 0.0)];
        let b = line_string![(x: 1.0, y: 0.0), (x: 2.0, y: 0.0)];
        let merged = merge_lines([&a, &b]).unwrap();
        assert_eq!(merged.0.first(), Some(&Coord { x: 0.0, y: 0.0 }));
        assert_eq!(merged.0.last(), Some(&Coord { x: 2.0, y: 0.0 }));
    }

    #[test]
    fn gap_is_not_contiguous() {
        let a = line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)];
        let b = line_string![(x: 5.0, y: 0.0), (x: 6.0, y: 0.0)];
        assert!(matches!(merge_lines([&a, &b]), Err(Error::NotContiguous)));
        assert!(matches!(
            merge_lines(std::iter::empty::<&LineString<f64>>()),
            Err(Error::NotContiguous)
        ));
    }
}
