//! Procedural renderer for the tabletop scene
//!
//! Orthographic views only: the front and left-shoulder cameras look at the
//! table from the side, the wrist camera looks straight down from the
//! gripper. Good enough to tell scenes, variations and arm poses apart.

use super::scene::{ObjectShape, Scene, SceneObject};
use crate::types::{RgbFrame, Viewpoint};

const WALL_TOP: [u8; 3] = [200, 210, 225];
const WALL_BOTTOM: [u8; 3] = [160, 170, 185];
const TABLE: [u8; 3] = [150, 111, 70];
const ARM: [u8; 3] = [90, 90, 95];
const GRIPPER_OPEN: [u8; 3] = [60, 160, 60];
const GRIPPER_CLOSED: [u8; 3] = [180, 60, 60];
const FINGER: [u8; 3] = [40, 40, 45];
const LABEL: [u8; 3] = [250, 250, 250];

/// RGB canvas over a `(height, width, 3)` frame
struct Canvas {
    frame: RgbFrame,
    width: usize,
    height: usize,
}

impl Canvas {
    fn new(width: usize, height: usize) -> Self {
        Self {
            frame: RgbFrame::zeros((height, width, 3)),
            width,
            height,
        }
    }

    fn put(&mut self, x: i64, y: i64, color: [u8; 3]) {
        let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y)) else {
            return;
        };
        if x >= self.width || y >= self.height {
            return;
        }
        for (channel, value) in color.into_iter().enumerate() {
            if let Some(px) = self.frame.get_mut([y, x, channel]) {
                *px = value;
            }
        }
    }

    /// Rows `from..to` blended from `top` to `bottom`
    fn gradient(&mut self, from: usize, to: usize, top: [u8; 3], bottom: [u8; 3]) {
        let to = to.min(self.height);
        let span = to.saturating_sub(from).max(1) as f64;
        for y in from..to {
            let t = (y - from) as f64 / span;
            let color = blend(top, bottom, t);
            for x in 0..self.width {
                self.put(x as i64, y as i64, color);
            }
        }
    }

    fn fill(&mut self, color: [u8; 3]) {
        self.gradient(0, self.height, color, color);
    }

    fn fill_rect(&mut self, cx: f64, cy: f64, half_w: f64, half_h: f64, color: [u8; 3]) {
        let x0 = (cx - half_w).floor() as i64;
        let x1 = (cx + half_w).ceil() as i64;
        let y0 = (cy - half_h).floor() as i64;
        let y1 = (cy + half_h).ceil() as i64;
        for y in y0.max(0)..y1.min(self.height as i64) {
            for x in x0.max(0)..x1.min(self.width as i64) {
                self.put(x, y, color);
            }
        }
    }

    fn fill_disc(&mut self, cx: f64, cy: f64, radius: f64, color: [u8; 3]) {
        let r2 = radius * radius;
        let x0 = (cx - radius).floor() as i64;
        let x1 = (cx + radius).ceil() as i64;
        let y0 = (cy - radius).floor() as i64;
        let y1 = (cy + radius).ceil() as i64;
        for y in y0.max(0)..y1.min(self.height as i64) {
            for x in x0.max(0)..x1.min(self.width as i64) {
                let dx = x as f64 + 0.5 - cx;
                let dy = y as f64 + 0.5 - cy;
                if dx * dx + dy * dy <= r2 {
                    self.put(x, y, color);
                }
            }
        }
    }

    fn line(&mut self, from: (f64, f64), to: (f64, f64), thickness: f64, color: [u8; 3]) {
        let length = (to.0 - from.0).hypot(to.1 - from.1);
        let samples = (length * 2.0).ceil().max(1.0) as usize;
        for i in 0..=samples {
            let t = i as f64 / samples as f64;
            let x = from.0 + (to.0 - from.0) * t;
            let y = from.1 + (to.1 - from.1) * t;
            self.fill_disc(x, y, thickness / 2.0, color);
        }
    }
}

fn blend(a: [u8; 3], b: [u8; 3], t: f64) -> [u8; 3] {
    let mut out = [0u8; 3];
    for ((o, x), y) in out.iter_mut().zip(a).zip(b) {
        *o = (f64::from(x) + (f64::from(y) - f64::from(x)) * t).round() as u8;
    }
    out
}

fn shade(color: [u8; 3], factor: f64) -> [u8; 3] {
    color.map(|c| (f64::from(c) * factor).clamp(0.0, 255.0) as u8)
}

/// World-to-pixel mapping of one camera
struct Projection {
    h_range: (f64, f64),
    v_range: (f64, f64),
    width: f64,
    height: f64,
}

impl Projection {
    fn for_viewpoint(viewpoint: Viewpoint, width: usize, height: usize, gripper: [f64; 3]) -> Self {
        let (h_range, v_range) = match viewpoint {
            Viewpoint::Front => ((-0.6, 0.6), (-0.1, 1.0)),
            Viewpoint::LeftShoulder => ((-0.1, 1.0), (-0.1, 1.0)),
            Viewpoint::Wrist => {
                // Field of view widens with height above the table
                let half = 0.08 + gripper[2].max(0.0) * 0.4;
                ((-half, half), (-half, half))
            },
        };
        Self {
            h_range,
            v_range,
            width: width as f64,
            height: height as f64,
        }
    }

    fn pixels_per_metre(&self) -> (f64, f64) {
        (
            self.width / (self.h_range.1 - self.h_range.0),
            self.height / (self.v_range.1 - self.v_range.0),
        )
    }

    fn to_pixel(&self, h: f64, v: f64) -> (f64, f64) {
        let (sx, sy) = self.pixels_per_metre();
        ((h - self.h_range.0) * sx, self.height - (v - self.v_range.0) * sy)
    }
}

/// Image-plane coordinates and depth (larger is closer) of a world point
fn view_coords(viewpoint: Viewpoint, point: [f64; 3], gripper: [f64; 3]) -> (f64, f64, f64) {
    match viewpoint {
        Viewpoint::Front => (point[1], point[2], point[0]),
        Viewpoint::LeftShoulder => (point[0], point[2], point[1]),
        Viewpoint::Wrist => (point[1] - gripper[1], point[0] - gripper[0], point[2]),
    }
}

/// Render one camera view of the scene
pub(crate) fn render(
    viewpoint: Viewpoint,
    (width, height): (u32, u32),
    scene: &Scene,
    arm: &[[f64; 3]],
    gripper_open: bool,
) -> RgbFrame {
    let (width, height) = (width as usize, height as usize);
    let gripper = arm.last().copied().unwrap_or([0.0, 0.0, 0.0]);
    let projection = Projection::for_viewpoint(viewpoint, width, height, gripper);
    let mut canvas = Canvas::new(width, height);

    match viewpoint {
        Viewpoint::Front | Viewpoint::LeftShoulder => {
            let (_, table_y) = projection.to_pixel(0.0, 0.0);
            let table_row = table_y.clamp(0.0, height as f64) as usize;
            canvas.gradient(0, table_row, WALL_TOP, WALL_BOTTOM);
            canvas.gradient(table_row, height, shade(TABLE, 1.1), shade(TABLE, 0.8));
        },
        Viewpoint::Wrist => {
            let factor = (1.1 - gripper[2] * 0.5).clamp(0.6, 1.1);
            canvas.fill(shade(TABLE, factor));
        },
    }

    let mut objects: Vec<&SceneObject> = scene.objects.iter().collect();
    objects.sort_by(|a, b| {
        let da = view_coords(viewpoint, a.position, gripper).2;
        let db = view_coords(viewpoint, b.position, gripper).2;
        da.total_cmp(&db)
    });
    for object in objects {
        draw_object(&mut canvas, &projection, viewpoint, object, gripper);
    }

    match viewpoint {
        Viewpoint::Front | Viewpoint::LeftShoulder => {
            draw_arm(&mut canvas, &projection, viewpoint, arm, gripper_open);
        },
        Viewpoint::Wrist => draw_fingers(&mut canvas, gripper_open),
    }

    canvas.frame
}

fn draw_object(
    canvas: &mut Canvas,
    projection: &Projection,
    viewpoint: Viewpoint,
    object: &SceneObject,
    gripper: [f64; 3],
) {
    let (h, v, _) = view_coords(viewpoint, object.position, gripper);
    let (cx, cy) = projection.to_pixel(h, v);
    let (sx, sy) = projection.pixels_per_metre();
    let half_w = object.half_extent * sx;
    let half_h = object.half_extent * sy;
    let top_down = viewpoint == Viewpoint::Wrist;

    match (object.shape, top_down) {
        (ObjectShape::Block, _) => {
            canvas.fill_rect(cx, cy, half_w, half_h, object.color);
        },
        (ObjectShape::Cup, false) => {
            canvas.fill_rect(cx, cy, half_w * 0.85, half_h, object.color);
            canvas.fill_rect(cx, cy - half_h, half_w, half_h * 0.15, shade(object.color, 0.7));
        },
        (ObjectShape::Cup, true) => {
            canvas.fill_disc(cx, cy, half_w, object.color);
            canvas.fill_disc(cx, cy, half_w * 0.75, shade(object.color, 0.6));
        },
        (ObjectShape::Marker, _) => {
            canvas.fill_disc(cx, cy, half_w, object.color);
        },
    }

    if let Some(label) = object.label {
        // One pip per number
        let pip = (half_w / 4.0).max(1.0);
        let spacing = pip * 2.5;
        let start = cx - spacing * f64::from(label.saturating_sub(1)) / 2.0;
        for i in 0..label {
            canvas.fill_rect(start + spacing * f64::from(i), cy, pip / 2.0, pip / 2.0, LABEL);
        }
    }
}

fn draw_arm(
    canvas: &mut Canvas,
    projection: &Projection,
    viewpoint: Viewpoint,
    arm: &[[f64; 3]],
    gripper_open: bool,
) {
    let thickness = (canvas.width as f64 / 160.0).max(2.0);
    let pixels: Vec<(f64, f64)> = arm
        .iter()
        .map(|point| {
            let (h, v, _) = view_coords(viewpoint, *point, [0.0; 3]);
            projection.to_pixel(h, v)
        })
        .collect();
    for pair in pixels.windows(2) {
        if let [from, to] = pair {
            canvas.line(*from, *to, thickness, ARM);
        }
    }
    if let Some(&(x, y)) = pixels.last() {
        let color = if gripper_open { GRIPPER_OPEN } else { GRIPPER_CLOSED };
        canvas.fill_disc(x, y, thickness * 1.5, color);
    }
}

fn draw_fingers(canvas: &mut Canvas, gripper_open: bool) {
    let w = canvas.width as f64;
    let h = canvas.height as f64;
    let gap = if gripper_open { 0.3 } else { 0.08 };
    let half_w = w * 0.04;
    let half_h = h * 0.12;
    canvas.fill_rect(w * (0.5 - gap / 2.0), h - half_h, half_w, half_h, FINGER);
    canvas.fill_rect(w * (0.5 + gap / 2.0), h - half_h, half_w, half_h, FINGER);
}
