//! The continuum: a sorted array of ring points with a flat bucket index.
//!
//! Each entry pairs a 32-bit position with the index of the server anchored
//! there. Lookup resolves a hashed item to the *nearest* point in circular
//! distance, considering both neighbors of the insertion position rather
//! than only the clockwise successor; that two-way rule is part of the
//! library's contract and what makes fallback iteration reproducible.
//!
//! A 4097-entry bucket array partitions the 32-bit space so a lookup binary
//! searches only the one-in-4096 slice covering the probed position.

const BUCKET_LOG: u32 = 12;
const BUCKET_COUNT: usize = (1 << BUCKET_LOG) + 1;
const BUCKET_SHIFT: u32 = 32 - BUCKET_LOG;
const BUCKET_SPAN: u32 = 1 << BUCKET_SHIFT;
const INITIAL_POINT_CAPACITY: usize = 4 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Point {
    pub(crate) point: u32,
    pub(crate) server: u32,
}

impl Point {
    /// Continuum ordering: position ascending, ties by server index.
    #[inline]
    fn in_order(a: Point, b: Point) -> bool {
        a.point < b.point || (a.point == b.point && a.server <= b.server)
    }
}

pub(crate) struct Continuum {
    points: Vec<Point>,
    sorted: bool,
    /// `buckets[i]` is the index of the first point at or above
    /// `i * BUCKET_SPAN`; `buckets[0] = 0` and the last entry is the point
    /// count.
    buckets: Vec<u32>,
}

impl Continuum {
    pub(crate) fn new() -> Continuum {
        Continuum {
            points: Vec::with_capacity(INITIAL_POINT_CAPACITY),
            sorted: false,
            buckets: vec![0; BUCKET_COUNT],
        }
    }

    pub(crate) fn clear(&mut self) {
        self.points.clear();
        self.sorted = false;
    }

    pub(crate) fn len(&self) -> usize {
        self.points.len()
    }

    /// Appends `points` for one server; the continuum is unsorted until the
    /// next [`sort`](Continuum::sort).
    pub(crate) fn add_server(&mut self, server: u32, points: &[u32]) {
        self.points
            .extend(points.iter().map(|&point| Point { point, server }));
        self.sorted = false;
    }

    /// Sorts the points and rebuilds the bucket index. Must run after the
    /// last `add_server` of a rebuild; lookups assume it has.
    pub(crate) fn sort(&mut self) {
        if !self.points.is_empty() {
            sort_points(&mut self.points, 1 << 31, 1 << 30);
            self.sorted = true;
            self.fill_buckets();
        }
    }

    fn fill_buckets(&mut self) {
        let count = self.points.len() as u32;
        self.buckets[0] = 0;
        self.buckets[BUCKET_COUNT - 1] = count;

        let step = count / (BUCKET_COUNT as u32 - 1) + 1;
        let mut left = 0u32;
        let mut boundary = BUCKET_SPAN;
        for i in 1..BUCKET_COUNT - 1 {
            // Gallop ahead in fixed strides, then binary search the gap.
            let mut right = left + step;
            while right < count && self.points[right as usize].point < boundary {
                left = right;
                right += step;
            }
            if right > count {
                right = count;
            }
            left = first_at_or_above(&self.points, boundary, left, right);
            self.buckets[i] = left;
            boundary = boundary.wrapping_add(BUCKET_SPAN);
        }
    }

    /// Returns the server owning the point nearest to `point`, or `None` on
    /// an empty continuum. Equidistant neighbors resolve to the lower side.
    pub(crate) fn find(&self, point: u32) -> Option<u32> {
        if self.points.is_empty() {
            return None;
        }
        debug_assert!(self.sorted, "lookup on an unsorted continuum");

        let count = self.points.len() as u32;
        let bucket = (point >> BUCKET_SHIFT) as usize;
        let left = self.buckets[bucket];
        let right = self.buckets[bucket + 1];
        let at_or_above = if left == right {
            right
        } else {
            first_at_or_above(&self.points, point, left, right)
        };

        let lesser = (if at_or_above == 0 { count } else { at_or_above }) - 1;
        let greater = at_or_above % count;

        let dist_greater = circular_distance(point, self.points[greater as usize].point);
        let dist_lesser = circular_distance(point, self.points[lesser as usize].point);
        let nearest = if dist_greater < dist_lesser {
            greater
        } else {
            lesser
        };
        Some(self.points[nearest as usize].server)
    }

    #[cfg(test)]
    pub(crate) fn points(&self) -> &[Point] {
        &self.points
    }

    #[cfg(test)]
    pub(crate) fn buckets(&self) -> &[u32] {
        &self.buckets
    }
}

/// Index of the first point with position `>= point` within `[left, right)`.
fn first_at_or_above(points: &[Point], point: u32, mut left: u32, mut right: u32) -> u32 {
    while left < right {
        let mid = left + (right - left) / 2;
        if points[mid as usize].point < point {
            left = mid + 1;
        } else {
            right = mid;
        }
    }
    left
}

/// Distance between two ring positions with wrap-around.
#[inline]
fn circular_distance(a: u32, b: u32) -> u32 {
    let dist = a.wrapping_sub(b);
    if dist & (1 << 31) == 0 {
        dist
    } else {
        dist.wrapping_neg()
    }
}

/// Hybrid sort tuned for ring points: insertion sort on short runs,
/// otherwise quicksort with the pivot taken from a geometric estimate of the
/// slice's median position (`median`, refined by `delta` per level). When the
/// points are clustered too tightly for the estimate to split them
/// (`delta <= 1024`), the pivot falls back to the median of the first four
/// elements.
fn sort_points(points: &mut [Point], median: u32, delta: u32) {
    let n = points.len();
    if n < 7 {
        insertion_sort(points);
        return;
    }

    let mut pivot = Point {
        point: median,
        server: 0,
    };
    let mut start = 0;
    if delta <= 1024 && Point::in_order(pivot, points[0]) == Point::in_order(pivot, points[1]) {
        insertion_sort(&mut points[..4]);
        pivot = points[2];
        start = 3;
    }

    let mut left = start;
    while left < n && !Point::in_order(pivot, points[left]) {
        left += 1;
    }
    if left < n {
        for now in (left + 1)..n {
            if !Point::in_order(pivot, points[now]) {
                points.swap(now, left);
                left += 1;
            }
        }
    }

    let (below, at_or_above) = points.split_at_mut(left);
    sort_points(below, median.wrapping_sub(delta), delta / 2);
    sort_points(at_or_above, median.wrapping_add(delta), delta / 2);
}

fn insertion_sort(points: &mut [Point]) {
    for i in 1..points.len() {
        if !Point::in_order(points[i - 1], points[i]) {
            let moved = points[i];
            points[i] = points[i - 1];
            let mut j = i - 1;
            while j > 0 && !Point::in_order(points[j - 1], moved) {
                points[j] = points[j - 1];
                j -= 1;
            }
            points[j] = moved;
        }
    }
}
