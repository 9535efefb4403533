//! Pure frame annotation: detection boxes, labels, and the info overlay
//!
//! Nothing here touches shared state or I/O; the input frame is never
//! mutated and every call returns a fresh buffer.

use crate::types::{Detection, PixelBox};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

const BOX_COLOR: Rgb<u8> = Rgb([0, 128, 0]);
const LABEL_TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const COUNTER_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const TIME_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const MAX_COLOR: Rgb<u8> = Rgb([255, 0, 255]);

const BOX_THICKNESS: i32 = 2;
const LABEL_PAD: i32 = 2;

/// Annotate one frame with its detections and the current aggregate
/// snapshot. `max_people` and `elapsed_secs` readouts are omitted while
/// zero; the people counter is always shown.
pub fn annotate_frame(
    frame: &RgbImage,
    detections: &[Detection],
    people_count: u32,
    max_people: u32,
    elapsed_secs: f64,
) -> RgbImage {
    let mut out = frame.clone();

    for det in detections {
        draw_box(&mut out, &det.bbox, BOX_COLOR, BOX_THICKNESS);

        let label = format!("{} {:.2}", det.class_name(), det.confidence);
        let rect = label_box(&det.bbox, &label);
        draw_filled_rect_mut(&mut out, rect, BOX_COLOR);
        draw_text(
            &mut out,
            &label,
            rect.left() + LABEL_PAD,
            rect.top() + LABEL_PAD,
            LABEL_TEXT_COLOR,
        );
    }

    draw_info_overlay(&mut out, people_count, max_people, elapsed_secs);
    out
}

/// Label background geometry: directly above the box top edge, clamped to
/// start at y = 0 when the box begins at the frame's top edge.
pub fn label_box(bbox: &PixelBox, text: &str) -> Rect {
    let w = text_width(text) + 2 * LABEL_PAD;
    let h = GLYPH_HEIGHT + 2 * LABEL_PAD;
    let top = (bbox.y1 - h).max(0);
    Rect::at(bbox.x1, top).of_size(w.max(1) as u32, h as u32)
}

fn draw_info_overlay(frame: &mut RgbImage, people_count: u32, max_people: u32, elapsed_secs: f64) {
    draw_text(
        frame,
        &format!("PEOPLE: {}", people_count),
        10,
        12,
        COUNTER_COLOR,
    );
    if elapsed_secs > 0.0 {
        draw_text(
            frame,
            &format!("TIME: {:.1}S", elapsed_secs),
            10,
            26,
            TIME_COLOR,
        );
    }
    if max_people > 0 {
        draw_text(frame, &format!("MAX: {}", max_people), 10, 40, MAX_COLOR);
    }
}

/// Hollow rectangle with a pixel thickness, expanding outwards
fn draw_box(img: &mut RgbImage, bbox: &PixelBox, color: Rgb<u8>, thickness: i32) {
    if !bbox.is_valid() {
        return;
    }
    let rect = Rect::at(bbox.x1, bbox.y1).of_size(bbox.width(), bbox.height());
    for offset in 0..thickness {
        let expanded = Rect::at(rect.left() - offset, rect.top() - offset).of_size(
            rect.width() + (offset * 2) as u32,
            rect.height() + (offset * 2) as u32,
        );
        draw_hollow_rect_mut(img, expanded, color);
    }
}

const GLYPH_WIDTH: i32 = 5;
const GLYPH_HEIGHT: i32 = 7;
const GLYPH_ADVANCE: i32 = GLYPH_WIDTH + 1;

fn text_width(text: &str) -> i32 {
    text.chars().count() as i32 * GLYPH_ADVANCE
}

/// Draw text with the built-in 5x7 bitmap font. Input is uppercased; the
/// font covers A-Z, digits, and the punctuation the overlay uses.
fn draw_text(img: &mut RgbImage, text: &str, x: i32, y: i32, color: Rgb<u8>) {
    for (i, ch) in text.to_uppercase().chars().enumerate() {
        let origin_x = x + i as i32 * GLYPH_ADVANCE;
        let pattern = glyph(ch);
        for (row, &bits) in pattern.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if (bits >> (GLYPH_WIDTH - 1 - col)) & 1 == 1 {
                    let px = origin_x + col;
                    let py = y + row as i32;
                    if px >= 0 && py >= 0 && (px as u32) < img.width() && (py as u32) < img.height()
                    {
                        img.put_pixel(px as u32, py as u32, color);
                    }
                }
            }
        }
    }
}

/// 5x7 glyph rows, top to bottom, 5 bits per row read left to right
fn glyph(ch: char) -> [u8; 7] {
    match ch {
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'B' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11100, 0b10010, 0b10001, 0b10001, 0b10001, 0b10010, 0b11100],
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'F' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000],
        'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111],
        'H' => [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'I' => [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'J' => [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100],
        'K' => [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
        'N' => [0b10001, 0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'Q' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'V' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        'W' => [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010],
        'X' => [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001],
        'Y' => [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100],
        'Z' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111],
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        '.' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b01100],
        ':' => [0b00000, 0b01100, 0b01100, 0b00000, 0b01100, 0b01100, 0b00000],
        '-' => [0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000],
        ' ' => [0b00000; 7],
        // Box for unknown chars
        _ => [0b11111, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11111],
    }
}
