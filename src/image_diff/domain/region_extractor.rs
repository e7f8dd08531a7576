use image::GrayImage;
use imageproc::contours::{find_contours, Contour};
use imageproc::point::Point;

use crate::domain::error::DomainError;
use crate::domain::image::{ColorMode, Image};
use crate::domain::region::Region;

pub const DEFAULT_THRESHOLD: u8 = 60;

/// Fraction of a contour's perimeter used as the simplification tolerance.
const APPROX_EPSILON_RATIO: f64 = 0.02;

const FOREGROUND: u8 = 255;

/// Splits a difference image into rectangular regions of change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionExtractor {
    threshold: u8,
}

impl Default for RegionExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl RegionExtractor {
    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Returns one region per traced contour, outer borders and hole
    /// borders alike, in the order the tracer discovered them.
    pub fn extract(&self, difference: &Image) -> Result<Vec<Region>, DomainError> {
        let mask = binarize(difference, self.threshold)?;
        let contours = find_contours::<u32>(&mask);

        Ok(contours
            .iter()
            .filter_map(|contour| {
                let simplified = simplify_contour(contour);
                bounding_rect(&simplified)
            })
            .collect())
    }
}

/// Foreground (255) where intensity is strictly above `threshold`, 0 elsewhere.
/// Color images are reduced to luma first.
pub fn binarize(image: &Image, threshold: u8) -> Result<GrayImage, DomainError> {
    let gray = image.convert_to(ColorMode::Gray);
    let (width, height) = gray.dimensions();
    let samples = gray
        .data()
        .iter()
        .map(|&v| if v > threshold { FOREGROUND } else { 0 })
        .collect();
    GrayImage::from_raw(width, height, samples)
        .ok_or_else(|| DomainError::InvalidInput("mask buffer does not match image size".to_string()))
}

fn simplify_contour(contour: &Contour<u32>) -> Vec<Point<u32>> {
    let epsilon = APPROX_EPSILON_RATIO * closed_arc_length(&contour.points);
    approx_poly_dp_closed(&contour.points, epsilon)
}

pub fn closed_arc_length(points: &[Point<u32>]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| distance(a, b))
        .sum()
}

/// Douglas-Peucker simplification of a closed polyline.
///
/// The ring is split at its first point and the point farthest from it; both
/// halves are simplified as open polylines and joined back together.
pub fn approx_poly_dp_closed(points: &[Point<u32>], epsilon: f64) -> Vec<Point<u32>> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let first = points[0];
    let (split, split_dist) = points
        .iter()
        .enumerate()
        .map(|(i, p)| (i, distance(&first, p)))
        .fold((0, 0.0), |best, cur| if cur.1 > best.1 { cur } else { best });
    if split_dist == 0.0 {
        return vec![first];
    }

    // 末尾に始点を足して閉じたリングとして扱う
    let ring: Vec<Point<u32>> = points.iter().copied().chain(std::iter::once(first)).collect();
    let last = ring.len() - 1;

    let mut keep = vec![false; ring.len()];
    keep[0] = true;
    keep[split] = true;
    douglas_peucker(&ring, 0, split, epsilon, &mut keep);
    douglas_peucker(&ring, split, last, epsilon, &mut keep);

    ring[..last]
        .iter()
        .zip(&keep[..last])
        .filter(|(_, &k)| k)
        .map(|(p, _)| *p)
        .collect()
}

fn douglas_peucker(points: &[Point<u32>], start: usize, end: usize, epsilon: f64, keep: &mut [bool]) {
    let mut stack = vec![(start, end)];

    while let Some((start, end)) = stack.pop() {
        if end <= start + 1 {
            continue;
        }

        let mut max_dist = 0.0;
        let mut max_index = start;
        for i in (start + 1)..end {
            let dist = point_to_line_distance(&points[i], &points[start], &points[end]);
            if dist > max_dist {
                max_dist = dist;
                max_index = i;
            }
        }

        if max_dist > epsilon {
            keep[max_index] = true;
            stack.push((start, max_index));
            stack.push((max_index, end));
        }
    }
}

fn distance(a: &Point<u32>, b: &Point<u32>) -> f64 {
    let dx = a.x as f64 - b.x as f64;
    let dy = a.y as f64 - b.y as f64;
    (dx * dx + dy * dy).sqrt()
}

fn point_to_line_distance(p: &Point<u32>, a: &Point<u32>, b: &Point<u32>) -> f64 {
    let length = distance(a, b);
    if length == 0.0 {
        return distance(p, a);
    }
    let (px, py) = (p.x as f64, p.y as f64);
    let (ax, ay) = (a.x as f64, a.y as f64);
    let (bx, by) = (b.x as f64, b.y as f64);
    ((bx - ax) * (ay - py) - (ax - px) * (by - ay)).abs() / length
}

/// Inclusive axis-aligned bounds of `points`.
pub fn bounding_rect(points: &[Point<u32>]) -> Option<Region> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &points[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(Region::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
}
