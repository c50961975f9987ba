use crate::config::{MapConfig, OutputConfig};
use crate::layers::{LayerVisibility, MapSurface};
use crate::style::style_for;
use crate::types::{BaseLayer, ClaimFeature, Overlay};
use anyhow::{Context, Result};
use geo::algorithm::bounding_rect::BoundingRect;
use geo::algorithm::contains::Contains;
use geo::{Coord, LineString, Point, Polygon};
use image::{ImageBuffer, Rgba, RgbaImage};
use rayon::prelude::*;
use std::f64::consts::PI;
use std::fs;

// Web Mercator world size at zoom 0
const TILE_SIZE: u32 = 256;

/// Raster backend: composites the visible map contents into RGBA images.
/// Same layer semantics as the scene backend, different output medium.
pub struct RasterSurface {
    visibility: LayerVisibility,
    claims: Vec<RasterClaim>,
    center: Coord<f64>, // x = lon, y = lat
    zoom: u8,
}

struct RasterClaim {
    polygon: Polygon<f64>,
    ring: Vec<Coord<f64>>,
    stroke: Rgba<u8>,
    fill: Rgba<u8>,
    fill_opacity: f64,
    weight: u32,
}

impl RasterSurface {
    pub fn new(map: &MapConfig) -> Self {
        RasterSurface {
            visibility: LayerVisibility::new(&map.base_layers),
            claims: Vec::new(),
            center: Coord {
                x: map.center[1],
                y: map.center[0],
            },
            zoom: map.zoom,
        }
    }

    pub fn visibility(&self) -> &LayerVisibility {
        &self.visibility
    }

    pub fn claim_count(&self) -> usize {
        self.claims.len()
    }

    pub fn camera(&self) -> (Coord<f64>, u8) {
        (self.center, self.zoom)
    }

    pub fn render(&self, width: u32, height: u32) -> RgbaImage {
        self.render_frame(width, height, self.zoom)
    }

    /// Renders one frame of the current map contents at the given zoom.
    pub fn render_frame(&self, width: u32, height: u32, zoom: u8) -> RgbaImage {
        let mut img: RgbaImage = ImageBuffer::from_pixel(width, height, self.base_wash());

        if !self.visibility.overlay_visible(Overlay::ForestRights) {
            return img;
        }

        let (cx, cy) = lat_lon_to_world_pixel(self.center.y, self.center.x, zoom);
        let origin_x = cx - width as f64 / 2.0;
        let origin_y = cy - height as f64 / 2.0;

        for claim in &self.claims {
            self.draw_fill(&mut img, claim, origin_x, origin_y, zoom);
            self.draw_stroke(&mut img, claim, origin_x, origin_y, zoom);
        }

        img
    }

    /// Writes one PNG per zoom level under `output.snapshot_dir`.
    pub fn write_snapshots(&self, output: &OutputConfig) -> Result<()> {
        fs::create_dir_all(&output.snapshot_dir)
            .context("Failed to create snapshot directory")?;

        (output.min_zoom..=output.max_zoom)
            .into_par_iter()
            .try_for_each(|zoom| -> Result<()> {
                let img = self.render_frame(output.width, output.height, zoom);
                let path = output.snapshot_dir.join(format!("map-z{}.png", zoom));
                img.save(&path)
                    .with_context(|| format!("Failed to save snapshot {:?}", path))?;
                Ok(())
            })
    }

    fn base_wash(&self) -> Rgba<u8> {
        // Placeholder washes standing in for remote imagery; the claim
        // geometry is the payload of a snapshot.
        match self.visibility.active_base() {
            Some(BaseLayer::Street) => Rgba([229, 231, 235, 255]),
            Some(BaseLayer::Satellite) => Rgba([31, 41, 55, 255]),
            Some(BaseLayer::Topo) => Rgba([236, 253, 245, 255]),
            None => Rgba([255, 255, 255, 255]),
        }
    }

    fn draw_fill(
        &self,
        img: &mut RgbaImage,
        claim: &RasterClaim,
        origin_x: f64,
        origin_y: f64,
        zoom: u8,
    ) {
        let bbox = match claim.polygon.bounding_rect() {
            Some(b) => b,
            None => return,
        };
        // Degenerate (collinear) boundaries have an empty interior and fall
        // through to the stroke pass, rendering as a zero-area shape.
        let (min_x, max_y) = lat_lon_to_world_pixel(bbox.min().y, bbox.min().x, zoom);
        let (max_x, min_y) = lat_lon_to_world_pixel(bbox.max().y, bbox.max().x, zoom);

        let px_min = ((min_x - origin_x).floor().max(0.0)) as i64;
        let px_max = ((max_x - origin_x).ceil().min(img.width() as f64 - 1.0)) as i64;
        let py_min = ((min_y - origin_y).floor().max(0.0)) as i64;
        let py_max = ((max_y - origin_y).ceil().min(img.height() as f64 - 1.0)) as i64;

        for py in py_min..=py_max {
            for px in px_min..=px_max {
                let (lat, lon) =
                    world_pixel_to_lat_lon(origin_x + px as f64, origin_y + py as f64, zoom);
                if claim.polygon.contains(&Point::new(lon, lat)) {
                    let dst = img.get_pixel_mut(px as u32, py as u32);
                    *dst = blend(*dst, claim.fill, claim.fill_opacity);
                }
            }
        }
    }

    fn draw_stroke(
        &self,
        img: &mut RgbaImage,
        claim: &RasterClaim,
        origin_x: f64,
        origin_y: f64,
        zoom: u8,
    ) {
        let n = claim.ring.len();
        for i in 0..n {
            let a = claim.ring[i];
            let b = claim.ring[(i + 1) % n];
            let (ax, ay) = lat_lon_to_world_pixel(a.y, a.x, zoom);
            let (bx, by) = lat_lon_to_world_pixel(b.y, b.x, zoom);
            draw_segment(
                img,
                (ax - origin_x, ay - origin_y),
                (bx - origin_x, by - origin_y),
                claim.stroke,
                claim.weight,
            );
        }
    }
}

impl MapSurface for RasterSurface {
    fn set_base_layer(&mut self, kind: BaseLayer) {
        self.visibility.set_base_layer(kind);
    }

    fn set_overlay_visible(&mut self, overlay: Overlay, visible: bool) {
        self.visibility.set_overlay_visible(overlay, visible);
    }

    fn rebuild_claim_layer(&mut self, features: &[ClaimFeature]) {
        self.claims.clear();
        for feature in features {
            let style = style_for(feature.status);
            self.claims.push(RasterClaim {
                polygon: Polygon::new(LineString::from(feature.boundary.clone()), vec![]),
                ring: feature.boundary.clone(),
                stroke: hex_to_rgba(style.stroke),
                fill: hex_to_rgba(style.fill),
                fill_opacity: style.fill_opacity,
                weight: style.weight,
            });
        }
    }

    fn fly_to(&mut self, center: Coord<f64>, zoom: u8, _duration_secs: f64) {
        // No animation in a raster compositor; the camera jumps.
        self.center = center;
        self.zoom = zoom;
    }
}

fn blend(dst: Rgba<u8>, src: Rgba<u8>, alpha: f64) -> Rgba<u8> {
    let mix = |d: u8, s: u8| (d as f64 * (1.0 - alpha) + s as f64 * alpha).round() as u8;
    Rgba([
        mix(dst[0], src[0]),
        mix(dst[1], src[1]),
        mix(dst[2], src[2]),
        255,
    ])
}

fn draw_segment(img: &mut RgbaImage, a: (f64, f64), b: (f64, f64), color: Rgba<u8>, weight: u32) {
    let steps = ((b.0 - a.0).abs().max((b.1 - a.1).abs()).ceil() as usize).max(1);
    let half = weight as i64 / 2;
    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        let x = a.0 + (b.0 - a.0) * t;
        let y = a.1 + (b.1 - a.1) * t;
        for dy in -half..=half {
            for dx in -half..=half {
                let px = x.round() as i64 + dx;
                let py = y.round() as i64 + dy;
                if px >= 0 && py >= 0 && (px as u32) < img.width() && (py as u32) < img.height() {
                    img.put_pixel(px as u32, py as u32, color);
                }
            }
        }
    }
}

fn hex_to_rgba(hex: &str) -> Rgba<u8> {
    let hex = hex.trim_start_matches('#');
    let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(0);
    let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(0);
    let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(0);
    Rgba([r, g, b, 255])
}

// Coordinate conversions (Web Mercator, global pixel space)
fn lat_lon_to_world_pixel(lat: f64, lon: f64, zoom: u8) -> (f64, f64) {
    let n = 2.0_f64.powi(zoom as i32);
    let x = (lon + 180.0) / 360.0 * n;
    let lat_rad = lat.to_radians();
    let y = (1.0 - (lat_rad.tan() + (1.0 / lat_rad.cos())).ln() / PI) / 2.0 * n;
    (x * TILE_SIZE as f64, y * TILE_SIZE as f64)
}

fn world_pixel_to_lat_lon(x: f64, y: f64, zoom: u8) -> (f64, f64) {
    let n = 2.0_f64.powi(zoom as i32) * TILE_SIZE as f64;
    let lon = x / n * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * y / n)).sinh().atan().to_degrees();
    (lat, lon)
}
