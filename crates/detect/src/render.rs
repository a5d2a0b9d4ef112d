use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_cross_mut, draw_line_segment_mut};

use crate::types::{DetectedObject, FrameReport, OrientedRect};

pub const RECT_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const CENTER_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

pub fn draw_oriented_rect(canvas: &mut RgbImage, rect: &OrientedRect, color: Rgb<u8>) {
    for i in 0..4 {
        let [x0, y0] = rect.corners[i];
        let [x1, y1] = rect.corners[(i + 1) % 4];
        draw_line_segment_mut(canvas, (x0 as f32, y0 as f32), (x1 as f32, y1 as f32), color);
    }
}

fn draw_object(canvas: &mut RgbImage, object: &DetectedObject) {
    if let Some(rect) = &object.oriented_rect {
        draw_oriented_rect(canvas, rect, RECT_COLOR);
    }
    let [x, y] = object.center;
    draw_cross_mut(canvas, CENTER_COLOR, x.round() as i32, y.round() as i32);
}

/// Black canvas with every contour rectangle and each object's centroid
pub fn draw_min_rects(
    width: u32,
    height: u32,
    rects: &[OrientedRect],
    objects: &[DetectedObject],
) -> RgbImage {
    let mut canvas = RgbImage::new(width, height);
    for rect in rects {
        draw_oriented_rect(&mut canvas, rect, RECT_COLOR);
    }
    for object in objects {
        draw_object(&mut canvas, object);
    }
    canvas
}

/// Copy of the frame with every reported object marked
pub fn annotate_frame(frame: &RgbImage, report: &FrameReport) -> RgbImage {
    let mut canvas = frame.clone();
    for object in report.filters.iter().flat_map(|f| &f.objects) {
        draw_object(&mut canvas, object);
    }
    canvas
}
