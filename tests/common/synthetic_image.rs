use snake_tracker::geometry::Vec2;
use snake_tracker::image::GrayImageU8;

/// Bright disks on a dark background.
pub fn disks_u8(
    width: usize,
    height: usize,
    disks: &[(Vec2, f64)],
    inside: u8,
    outside: u8,
) -> GrayImageU8 {
    assert!(width > 0 && height > 0, "image dimensions must be positive");

    let mut img = vec![outside; width * height];
    for y in 0..height {
        for x in 0..width {
            let p = Vec2::new(x as f64, y as f64);
            if disks.iter().any(|(c, r)| (p - c).norm() <= *r) {
                img[y * width + x] = inside;
            }
        }
    }
    GrayImageU8::new(width, height, img)
}

/// A single bright disk.
pub fn disk_u8(width: usize, height: usize, center: Vec2, radius: f64) -> GrayImageU8 {
    disks_u8(width, height, &[(center, radius)], 200, 20)
}

/// Points on a circle, counter-clockwise.
pub fn circle_points(center: Vec2, radius: f64, count: usize) -> Vec<Vec2> {
    (0..count)
        .map(|i| {
            let a = std::f64::consts::TAU * i as f64 / count as f64;
            center + Vec2::new(radius * a.cos(), radius * a.sin())
        })
        .collect()
}

pub fn mean_radius(points: &[Vec2], center: Vec2) -> f64 {
    points.iter().map(|p| (p - center).norm()).sum::<f64>() / points.len() as f64
}
