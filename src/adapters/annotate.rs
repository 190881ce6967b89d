use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::domain::detection::Detection;

const BOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const OUTLINE_WIDTH: u32 = 2;

/// Copia de la imagen con las cajas de detección dibujadas, para la salida
/// de depuración. Las cajas degeneradas se saltan.
pub fn draw_detections(image: &RgbImage, detections: &[Detection]) -> RgbImage {
    let mut img = image.clone();
    for det in detections {
        for t in 0..OUTLINE_WIDTH {
            let w = det.width().saturating_sub(2 * t);
            let h = det.height().saturating_sub(2 * t);
            if w == 0 || h == 0 {
                break;
            }
            let rect = Rect::at((det.x1 + t) as i32, (det.y1 + t) as i32).of_size(w, h);
            draw_hollow_rect_mut(&mut img, rect, BOX_COLOR);
        }
    }
    img
}
