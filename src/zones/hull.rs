use glam::Vec2;

/// Gift-wrapping (Jarvis march) convex hull on the ground plane. The walk
/// starts at the minimum-x point and repeatedly takes the candidate no other
/// point lies counter-clockwise of, so the result is a simple polygon in
/// rotational order. Fewer than three points are returned unchanged.
pub(super) fn convex_hull(points: &[Vec2]) -> Vec<Vec2> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut start = 0usize;
    for (index, point) in points.iter().enumerate() {
        let best = points[start];
        if point.x < best.x || (point.x == best.x && point.y < best.y) {
            start = index;
        }
    }

    let mut hull = Vec::new();
    let mut current = start;
    loop {
        hull.push(points[current]);

        let mut candidate = (current + 1) % points.len();
        for (index, point) in points.iter().enumerate() {
            if index == current || index == candidate {
                continue;
            }
            let edge = points[candidate] - points[current];
            let offset = *point - points[current];
            let cross = edge.perp_dot(offset);
            // collinear ties go to the farther point so duplicates and
            // midpoints never stall the walk
            let farther = cross == 0.0 && offset.length_squared() > edge.length_squared();
            if cross > 0.0 || farther {
                candidate = index;
            }
        }

        current = candidate;
        if current == start || hull.len() > points.len() {
            break;
        }
    }

    hull
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec2;

    #[test]
    fn unit_square_hull_is_the_four_corners_in_rotational_order() {
        let points = vec![
            vec2(0.0, 0.0),
            vec2(10.0, 0.0),
            vec2(10.0, 10.0),
            vec2(0.0, 10.0),
        ];
        let hull = convex_hull(&points);

        assert_eq!(
            hull,
            vec![
                vec2(0.0, 0.0),
                vec2(0.0, 10.0),
                vec2(10.0, 10.0),
                vec2(10.0, 0.0),
            ]
        );
    }

    #[test]
    fn interior_points_are_excluded() {
        let points = vec![
            vec2(0.0, 0.0),
            vec2(10.0, 0.0),
            vec2(5.0, 5.0),
            vec2(10.0, 10.0),
            vec2(0.0, 10.0),
            vec2(3.0, 7.0),
        ];
        let hull = convex_hull(&points);

        assert_eq!(hull.len(), 4);
        assert!(!hull.contains(&vec2(5.0, 5.0)));
        assert!(!hull.contains(&vec2(3.0, 7.0)));
    }

    #[test]
    fn collinear_input_keeps_only_the_extremes() {
        let points = vec![
            vec2(0.0, 0.0),
            vec2(4.0, 4.0),
            vec2(8.0, 8.0),
            vec2(2.0, 2.0),
        ];
        let hull = convex_hull(&points);

        assert!(hull.contains(&vec2(0.0, 0.0)));
        assert!(hull.contains(&vec2(8.0, 8.0)));
        assert!(hull.len() <= 3);
    }

    #[test]
    fn tiny_inputs_pass_through() {
        assert!(convex_hull(&[]).is_empty());
        assert_eq!(convex_hull(&[vec2(1.0, 2.0)]), vec![vec2(1.0, 2.0)]);
        assert_eq!(
            convex_hull(&[vec2(1.0, 2.0), vec2(3.0, 4.0)]),
            vec![vec2(1.0, 2.0), vec2(3.0, 4.0)]
        );
    }
}
