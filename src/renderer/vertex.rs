//! Vertex types and quad batching for sprite rendering

use std::ops::Range;

use bytemuck::{Pod, Zeroable};

use crate::assets::Sprite;
use crate::sim::DrawCommand;

/// 2D vertex with texture coordinates, position already in NDC
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct SpriteVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
}

impl SpriteVertex {
    pub const fn new(x: f32, y: f32, u: f32, v: f32) -> Self {
        Self {
            position: [x, y],
            uv: [u, v],
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SpriteVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// Convert canvas pixels (origin top-left, y down) to NDC
pub fn pixel_to_ndc(x: f32, y: f32, width: f32, height: f32) -> (f32, f32) {
    (x / width * 2.0 - 1.0, 1.0 - y / height * 2.0)
}

/// Two triangles covering the rectangle, texture stretched to fit
pub fn quad(x: f32, y: f32, w: f32, h: f32, screen: (f32, f32)) -> [SpriteVertex; 6] {
    let (left, top) = pixel_to_ndc(x, y, screen.0, screen.1);
    let (right, bottom) = pixel_to_ndc(x + w, y + h, screen.0, screen.1);
    let tl = SpriteVertex::new(left, top, 0.0, 0.0);
    let tr = SpriteVertex::new(right, top, 1.0, 0.0);
    let bl = SpriteVertex::new(left, bottom, 0.0, 1.0);
    let br = SpriteVertex::new(right, bottom, 1.0, 1.0);
    [tl, bl, tr, tr, bl, br]
}

/// Run of consecutive vertices sharing one texture
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub sprite: Sprite,
    pub vertices: Range<u32>,
}

/// Turn a frame's draw list into vertices and texture batches
///
/// Painter's order is kept: only neighbouring quads with the same sprite are
/// merged. A `Clear` discards everything queued before it.
pub fn build_batches(draws: &[DrawCommand], screen: (f32, f32)) -> (Vec<SpriteVertex>, Vec<Batch>) {
    let mut vertices: Vec<SpriteVertex> = Vec::with_capacity(draws.len() * 6);
    let mut batches: Vec<Batch> = Vec::new();

    for draw in draws {
        match *draw {
            DrawCommand::Clear => {
                vertices.clear();
                batches.clear();
            }
            DrawCommand::Sprite {
                sprite,
                x,
                y,
                width,
                height,
            } => {
                let start = vertices.len() as u32;
                vertices.extend_from_slice(&quad(x, y, width, height, screen));
                let end = vertices.len() as u32;
                match batches.last_mut() {
                    Some(last) if last.sprite == sprite => last.vertices.end = end,
                    _ => batches.push(Batch {
                        sprite,
                        vertices: start..end,
                    }),
                }
            }
        }
    }

    (vertices, batches)
}
