// THEORY:
// The `contour` module is the geometry layer between a cleaned mask and a `Blob`.
// A region is described by its outer border polygon, and everything we need is
// computed from that polygon alone:
//
// 1.  **Area and centroid** come from the polygon's zeroth and first order moments
//     (Green's theorem over the border). A degenerate border (a line or a single
//     pixel) has zero area and therefore no centroid.
// 2.  **Size** is the radius of the minimum enclosing circle. Only convex hull
//     vertices can touch that circle, so the hull is computed first and the
//     incremental circle search runs on a handful of points instead of the whole
//     border.
// 3.  **External only**: borders of holes and of regions nested inside holes are
//     skipped. A marker with a glare spot in the middle is still one region.
//     "Top level" means "no parent". The border tracer never starts a border on a
//     frame edge, so the mask is traced inside a one-pixel background frame: a
//     region touching (or filling) the image is still an ordinary outer region.

pub mod contour {
    use image::{GrayImage, imageops};
    use imageproc::contours::find_contours;

    const CIRCLE_EPSILON: f64 = 1e-7;

    /// The outer border of one connected foreground region, as pixel coordinates.
    #[derive(Debug, Clone, PartialEq)]
    pub struct OuterContour {
        pub points: Vec<(f64, f64)>,
    }

    /// Raw spatial moments of a closed polygon.
    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    pub struct Moments {
        pub m00: f64,
        pub m10: f64,
        pub m01: f64,
    }

    impl Moments {
        /// Centroid `(m10 / m00, m01 / m00)`, or `None` for a zero-area polygon.
        pub fn centroid(&self) -> Option<(f64, f64)> {
            if self.m00 <= 0.0 {
                return None;
            }
            Some((self.m10 / self.m00, self.m01 / self.m00))
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct Circle {
        pub center: (f64, f64),
        pub radius: f64,
    }

    impl Circle {
        fn contains(&self, point: (f64, f64)) -> bool {
            distance(self.center, point) <= self.radius * (1.0 + CIRCLE_EPSILON) + CIRCLE_EPSILON
        }
    }

    /// Outer contours of every top-level foreground region, in scan order.
    pub fn outer_contours(mask: &GrayImage) -> Vec<OuterContour> {
        let mut padded = GrayImage::new(mask.width() + 2, mask.height() + 2);
        imageops::replace(&mut padded, mask, 1, 1);

        find_contours::<i32>(&padded)
            .into_iter()
            .filter(|c| c.parent.is_none())
            .map(|c| OuterContour {
                points: c
                    .points
                    .iter()
                    .map(|p| ((p.x - 1) as f64, (p.y - 1) as f64))
                    .collect(),
            })
            .collect()
    }

    impl OuterContour {
        /// Polygon moments, sign-normalised so a non-degenerate border has `m00 > 0`
        /// regardless of its winding direction.
        pub fn moments(&self) -> Moments {
            let n = self.points.len();
            if n < 3 {
                return Moments::default();
            }
            let mut moments = Moments::default();
            for i in 0..n {
                let (x0, y0) = self.points[i];
                let (x1, y1) = self.points[(i + 1) % n];
                let cross = x0 * y1 - x1 * y0;
                moments.m00 += cross;
                moments.m10 += (x0 + x1) * cross;
                moments.m01 += (y0 + y1) * cross;
            }
            moments.m00 /= 2.0;
            moments.m10 /= 6.0;
            moments.m01 /= 6.0;
            if moments.m00 < 0.0 {
                moments.m00 = -moments.m00;
                moments.m10 = -moments.m10;
                moments.m01 = -moments.m01;
            }
            moments
        }

        pub fn area(&self) -> f64 {
            self.moments().m00
        }

        pub fn min_enclosing_circle(&self) -> Option<Circle> {
            min_enclosing_circle(&self.points)
        }
    }

    /// Picks the contour with the largest area. Exact ties keep the earliest one.
    pub fn largest_by_area(contours: &[OuterContour]) -> Option<&OuterContour> {
        let mut best: Option<(&OuterContour, f64)> = None;
        for contour in contours {
            let area = contour.area();
            match best {
                Some((_, best_area)) if area <= best_area => {}
                _ => best = Some((contour, area)),
            }
        }
        best.map(|(contour, _)| contour)
    }

    /// Andrew's monotone chain. Returns hull vertices counter-clockwise, without
    /// collinear points.
    pub fn convex_hull(points: &[(f64, f64)]) -> Vec<(f64, f64)> {
        let mut sorted = points.to_vec();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
        sorted.dedup();
        if sorted.len() < 3 {
            return sorted;
        }

        let mut lower: Vec<(f64, f64)> = Vec::with_capacity(sorted.len());
        for &p in &sorted {
            while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
                lower.pop();
            }
            lower.push(p);
        }
        let mut upper: Vec<(f64, f64)> = Vec::with_capacity(sorted.len());
        for &p in sorted.iter().rev() {
            while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
                upper.pop();
            }
            upper.push(p);
        }
        lower.pop();
        upper.pop();
        lower.extend(upper);
        lower
    }

    /// Smallest circle containing every point.
    pub fn min_enclosing_circle(points: &[(f64, f64)]) -> Option<Circle> {
        let hull = convex_hull(points);
        let first = *hull.first()?;

        let mut circle = Circle { center: first, radius: 0.0 };
        for i in 1..hull.len() {
            if circle.contains(hull[i]) {
                continue;
            }
            circle = Circle { center: hull[i], radius: 0.0 };
            for j in 0..i {
                if circle.contains(hull[j]) {
                    continue;
                }
                circle = circle_from_two(hull[i], hull[j]);
                for k in 0..j {
                    if !circle.contains(hull[k]) {
                        circle = circle_from_three(hull[i], hull[j], hull[k]);
                    }
                }
            }
        }
        Some(circle)
    }

    fn cross(o: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
        (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
    }

    fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
        ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
    }

    fn circle_from_two(a: (f64, f64), b: (f64, f64)) -> Circle {
        let center = ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0);
        Circle { center, radius: distance(a, b) / 2.0 }
    }

    fn circle_from_three(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> Circle {
        let d = 2.0 * (a.0 * (b.1 - c.1) + b.0 * (c.1 - a.1) + c.0 * (a.1 - b.1));
        if d.abs() < 1e-12 {
            // Collinear: the two farthest-apart points span the circle.
            let candidates = [circle_from_two(a, b), circle_from_two(a, c), circle_from_two(b, c)];
            return candidates
                .into_iter()
                .fold(candidates[0], |widest, candidate| {
                    if candidate.radius > widest.radius { candidate } else { widest }
                });
        }
        let a2 = a.0 * a.0 + a.1 * a.1;
        let b2 = b.0 * b.0 + b.1 * b.1;
        let c2 = c.0 * c.0 + c.1 * c.1;
        let ux = (a2 * (b.1 - c.1) + b2 * (c.1 - a.1) + c2 * (a.1 - b.1)) / d;
        let uy = (a2 * (c.0 - b.0) + b2 * (a.0 - c.0) + c2 * (b.0 - a.0)) / d;
        let center = (ux, uy);
        Circle { center, radius: distance(center, a) }
    }

}
