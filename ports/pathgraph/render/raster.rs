/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! PNG export.
//!
//! Edges are thin grey lines labelled with their weight, nodes are filled
//! discs labelled with their id. Nodes and edges on the highlighted path are
//! drawn in red, path edges with a wide stroke.

use euclid::default::Point2D;
use image::{Rgb, RgbImage};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::RenderError;
use crate::graph::{Graph, NodeId};
use crate::layout::Positions;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const EDGE_COLOR: Rgb<u8> = Rgb([128, 128, 128]);
const NODE_COLOR: Rgb<u8> = Rgb([31, 120, 180]);
const PATH_COLOR: Rgb<u8> = Rgb([220, 20, 20]);
const LABEL_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

const PATH_EDGE_WIDTH: f64 = 5.0;

/// Glyph rows for the digits 0-9, three bits per row, most significant bit leftmost
const DIGITS: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111],
    [0b010, 0b110, 0b010, 0b010, 0b111],
    [0b111, 0b001, 0b111, 0b100, 0b111],
    [0b111, 0b001, 0b111, 0b001, 0b111],
    [0b101, 0b101, 0b111, 0b001, 0b001],
    [0b111, 0b100, 0b111, 0b001, 0b111],
    [0b111, 0b100, 0b111, 0b101, 0b111],
    [0b111, 0b001, 0b001, 0b001, 0b001],
    [0b111, 0b101, 0b111, 0b101, 0b111],
    [0b111, 0b101, 0b111, 0b001, 0b111],
];
const GLYPH_WIDTH: i64 = 3;
const GLYPH_HEIGHT: i64 = 5;

/// Image export settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSettings {
    pub width: u32,
    pub height: u32,
    pub node_radius: u32,

    /// Blank border kept around the drawing
    pub margin: u32,

    /// Pixel size of one font cell
    pub label_scale: u32,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            node_radius: 14,
            margin: 40,
            label_scale: 2,
        }
    }
}

/// Draw `graph` at `positions`, highlighting the walk through `highlight`
pub fn render_image(
    graph: &Graph,
    positions: &Positions,
    highlight: &[NodeId],
    settings: &ImageSettings,
) -> Result<RgbImage, RenderError> {
    let width = settings.width.max(1);
    let height = settings.height.max(1);
    let mut canvas = Canvas {
        image: RgbImage::from_pixel(width, height, BACKGROUND),
    };

    let mut points = Vec::with_capacity(graph.node_count());
    for id in graph.node_ids() {
        let point = positions
            .get(&id)
            .copied()
            .ok_or(RenderError::MissingPosition(id))?;
        points.push((id, point));
    }
    let frame = Frame::fit(points.iter().map(|(_, p)| *p), settings);
    let screen: std::collections::HashMap<NodeId, Point2D<f64>> = points
        .iter()
        .map(|(id, p)| (*id, frame.apply(*p)))
        .collect();

    let path_nodes: HashSet<NodeId> = highlight.iter().copied().collect();
    let path_edges: HashSet<(NodeId, NodeId)> = highlight
        .windows(2)
        .map(|pair| (pair[0].min(pair[1]), pair[0].max(pair[1])))
        .collect();

    let edges = graph.edges();
    for edge in &edges {
        let (from, to) = (screen[&edge.a], screen[&edge.b]);
        if path_edges.contains(&(edge.a.min(edge.b), edge.a.max(edge.b))) {
            canvas.thick_line(from, to, PATH_EDGE_WIDTH, PATH_COLOR);
        } else {
            canvas.line(from, to, EDGE_COLOR);
        }
    }

    let scale = settings.label_scale.max(1) as i64;
    for edge in &edges {
        let mid = (screen[&edge.a] + screen[&edge.b].to_vector()) / 2.0;
        canvas.label(&edge.weight.to_string(), mid, scale, LABEL_COLOR, Some(BACKGROUND));
    }

    let radius = settings.node_radius as f64;
    for (id, point) in &points {
        let point = frame.apply(*point);
        let color = if path_nodes.contains(id) {
            PATH_COLOR
        } else {
            NODE_COLOR
        };
        canvas.disc(point, radius, color);
        canvas.label(&id.to_string(), point, scale, LABEL_COLOR, None);
    }

    Ok(canvas.image)
}

/// Draw the graph and write it as a PNG to `file`, creating parent directories
pub fn export_png(
    graph: &Graph,
    positions: &Positions,
    highlight: &[NodeId],
    settings: &ImageSettings,
    file: &std::path::Path,
) -> Result<(), RenderError> {
    let image = render_image(graph, positions, highlight, settings)?;
    if let Some(parent) = file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    image.save_with_format(file, image::ImageFormat::Png)?;
    debug!(
        "Wrote {}x{} image to {}",
        image.width(),
        image.height(),
        file.display()
    );
    Ok(())
}

/// Uniform mapping from layout space into the image, y axis pointing up
struct Frame {
    scale: f64,
    source_center: Point2D<f64>,
    target_center: Point2D<f64>,
}

impl Frame {
    fn fit(points: impl Iterator<Item = Point2D<f64>>, settings: &ImageSettings) -> Self {
        let (mut min, mut max) = (
            Point2D::new(f64::INFINITY, f64::INFINITY),
            Point2D::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        );
        for p in points {
            min = min.min(p);
            max = max.max(p);
        }

        let target_center = Point2D::new(settings.width as f64 / 2.0, settings.height as f64 / 2.0);
        if !min.x.is_finite() {
            return Self {
                scale: 1.0,
                source_center: Point2D::origin(),
                target_center,
            };
        }

        let margin = settings.margin as f64 + settings.node_radius as f64;
        let usable_w = (settings.width as f64 - 2.0 * margin).max(1.0);
        let usable_h = (settings.height as f64 - 2.0 * margin).max(1.0);
        let span = max - min;
        let scale = match (span.x > f64::EPSILON, span.y > f64::EPSILON) {
            (true, true) => (usable_w / span.x).min(usable_h / span.y),
            (true, false) => usable_w / span.x,
            (false, true) => usable_h / span.y,
            (false, false) => 1.0,
        };

        Self {
            scale,
            source_center: min.lerp(max, 0.5),
            target_center,
        }
    }

    fn apply(&self, p: Point2D<f64>) -> Point2D<f64> {
        let offset = (p - self.source_center) * self.scale;
        Point2D::new(
            self.target_center.x + offset.x,
            self.target_center.y - offset.y,
        )
    }
}

struct Canvas {
    image: RgbImage,
}

impl Canvas {
    fn put(&mut self, x: i64, y: i64, color: Rgb<u8>) {
        if x >= 0 && y >= 0 && x < self.image.width() as i64 && y < self.image.height() as i64 {
            self.image.put_pixel(x as u32, y as u32, color);
        }
    }

    /// One-pixel line (Bresenham)
    fn line(&mut self, from: Point2D<f64>, to: Point2D<f64>, color: Rgb<u8>) {
        let (mut x0, mut y0) = (from.x.round() as i64, from.y.round() as i64);
        let (x1, y1) = (to.x.round() as i64, to.y.round() as i64);
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.put(x0, y0, color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    /// Wide line stamped as discs along the segment
    fn thick_line(&mut self, from: Point2D<f64>, to: Point2D<f64>, width: f64, color: Rgb<u8>) {
        let steps = ((to - from).length() * 2.0).ceil().max(1.0) as usize;
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            self.disc(from.lerp(to, t), width / 2.0, color);
        }
    }

    fn disc(&mut self, center: Point2D<f64>, radius: f64, color: Rgb<u8>) {
        let r = radius.ceil() as i64;
        let (cx, cy) = (center.x.round() as i64, center.y.round() as i64);
        let limit = radius * radius;
        for dy in -r..=r {
            for dx in -r..=r {
                if ((dx * dx + dy * dy) as f64) <= limit {
                    self.put(cx + dx, cy + dy, color);
                }
            }
        }
    }

    /// Digits centred on `center`. Other characters leave a blank cell.
    fn label(
        &mut self,
        text: &str,
        center: Point2D<f64>,
        scale: i64,
        color: Rgb<u8>,
        background: Option<Rgb<u8>>,
    ) {
        let count = text.chars().count() as i64;
        if count == 0 {
            return;
        }
        let advance = (GLYPH_WIDTH + 1) * scale;
        let text_w = count * advance - scale;
        let text_h = GLYPH_HEIGHT * scale;
        let left = center.x.round() as i64 - text_w / 2;
        let top = center.y.round() as i64 - text_h / 2;

        if let Some(fill) = background {
            for y in top - 1..=top + text_h {
                for x in left - 1..=left + text_w {
                    self.put(x, y, fill);
                }
            }
        }

        for (i, c) in text.chars().enumerate() {
            let Some(glyph) = c.to_digit(10).map(|d| DIGITS[d as usize]) else {
                continue;
            };
            let origin_x = left + i as i64 * advance;
            for (row, bits) in glyph.iter().enumerate() {
                for col in 0..GLYPH_WIDTH {
                    if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                        continue;
                    }
                    for sy in 0..scale {
                        for sx in 0..scale {
                            self.put(
                                origin_x + col * scale + sx,
                                top + row as i64 * scale + sy,
                                color,
                            );
                        }
                    }
                }
            }
        }
    }
}
