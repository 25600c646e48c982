/// Character framebuffer with a depth buffer, and the rasterizers that fill it
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Character luminosity ramp for shading (darkest to lightest)
pub const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// How cell colours are written to the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorMode {
    /// 24-bit colour per cell
    #[default]
    TrueColor,
    /// The 16-colour palette, picked from the cell's character
    Ansi,
}

/// A projected vertex: pixel coordinates plus NDC depth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
    pub depth: f32,
}

/// One shaded fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragment {
    pub character: char,
    pub rgb: [u8; 3],
}

const BLANK: Fragment = Fragment {
    character: ' ',
    rgb: [0, 0, 0],
};

pub struct Framebuffer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    cells: Vec<Fragment>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            cells: vec![BLANK; size],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self::new(width, height);
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.cells.fill(BLANK);
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<Fragment> {
        (x < self.width && y < self.height).then(|| self.cells[y * self.width + x])
    }

    pub fn depth(&self, x: usize, y: usize) -> Option<f32> {
        (x < self.width && y < self.height).then(|| self.depth_buffer[y * self.width + x])
    }

    /// Depth-tested write; fragments outside `[-1, 1]` depth are clipped.
    fn plot(&mut self, x: i32, y: i32, depth: f32, fragment: Fragment) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        if !(-1.0..=1.0).contains(&depth) {
            return;
        }

        let idx = y as usize * self.width + x as usize;
        if depth < self.depth_buffer[idx] {
            self.depth_buffer[idx] = depth;
            self.cells[idx] = fragment;
        }
    }

    /// Fill a triangle. `shade` receives the barycentric weights of each
    /// covered cell centre.
    pub fn fill_triangle<F>(&mut self, corners: [ScreenPoint; 3], mut shade: F)
    where
        F: FnMut([f32; 3]) -> Fragment,
    {
        let [v0, v1, v2] = corners;

        // Bounding box
        let min_x = v0.x.min(v1.x).min(v2.x).floor() as i32;
        let max_x = v0.x.max(v1.x).max(v2.x).ceil() as i32;
        let min_y = v0.y.min(v1.y).min(v2.y).floor() as i32;
        let max_y = v0.y.max(v1.y).max(v2.y).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                if let Some(weights) = barycentric(&v0, &v1, &v2, (px, py)) {
                    if weights.iter().all(|w| *w >= 0.0) {
                        let depth =
                            weights[0] * v0.depth + weights[1] * v1.depth + weights[2] * v2.depth;
                        let fragment = shade(weights);
                        self.plot(x, y, depth, fragment);
                    }
                }
            }
        }
    }

    /// Draw a depth-interpolated line with a slope-dependent character.
    pub fn draw_line(&mut self, from: ScreenPoint, to: ScreenPoint, rgb: [u8; 3]) {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as i32;
        let character = line_character(dx, dy);

        for step in 0..=steps {
            let t = step as f32 / steps as f32;
            let x = (from.x + dx * t).floor() as i32;
            let y = (from.y + dy * t).floor() as i32;
            let depth = from.depth + (to.depth - from.depth) * t;
            self.plot(x, y, depth, Fragment { character, rgb });
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W, mode: ColorMode) -> std::io::Result<()> {
        let mut current: Option<Color> = None;
        for y in 0..self.height {
            for x in 0..self.width {
                let cell = self.cells[y * self.width + x];
                let color = match mode {
                    ColorMode::TrueColor => Color::Rgb {
                        r: cell.rgb[0],
                        g: cell.rgb[1],
                        b: cell.rgb[2],
                    },
                    ColorMode::Ansi => palette_color(cell.character),
                };

                if current != Some(color) {
                    writer.queue(SetForegroundColor(color))?;
                    current = Some(color);
                }
                writer.queue(Print(cell.character))?;
            }
            if y + 1 < self.height {
                writer.queue(Print("\r\n"))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

/// Pick a ramp character for an intensity in `[0, 1]`.
pub fn ramp_character(intensity: f32) -> char {
    let char_index = (intensity.clamp(0.0, 1.0) * (LUMINOSITY_RAMP.len() - 1) as f32) as usize;
    LUMINOSITY_RAMP[char_index.min(LUMINOSITY_RAMP.len() - 1)]
}

/// Colour based on character intensity
fn palette_color(c: char) -> Color {
    match c {
        ' ' | '.' | ':' => Color::DarkGrey,
        '-' | '=' => Color::Grey,
        '+' | '*' => Color::White,
        '#' | '%' | '@' => Color::Cyan,
        _ => Color::Yellow,
    }
}

fn line_character(dx: f32, dy: f32) -> char {
    if dx.abs() > 2.0 * dy.abs() {
        '-'
    } else if dy.abs() > 2.0 * dx.abs() {
        '|'
    } else if (dx > 0.0) == (dy > 0.0) {
        // Screen y grows downwards.
        '\\'
    } else {
        '/'
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: &ScreenPoint,
    v1: &ScreenPoint,
    v2: &ScreenPoint,
    p: (f32, f32),
) -> Option<[f32; 3]> {
    let denom = (v1.y - v2.y) * (v0.x - v2.x) + (v2.x - v1.x) * (v0.y - v2.y);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.y - v2.y) * (p.0 - v2.x) + (v2.x - v1.x) * (p.1 - v2.y)) / denom;
    let w1 = ((v2.y - v0.y) * (p.0 - v2.x) + (v0.x - v2.x) * (p.1 - v2.y)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some([w0, w1, w2])
}
