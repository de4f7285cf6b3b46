//! Rendering surface and landmark overlay.
//!
//! Overlays are drawn straight into the RGB frame before it is presented.
//! The surface also delivers at most one key event per iteration, which the
//! game loop checks against the quit key.

use std::thread;
use std::time::Duration;

use image::{Rgb, RgbImage};

use crate::detection::{HandLandmarks, HAND_CONNECTIONS};
use crate::error::DisplayError;

const LANDMARK_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const CONNECTION_COLOR: Rgb<u8> = Rgb([224, 224, 224]);
const LANDMARK_RADIUS: i32 = 2;

/// Something that happened on the surface during the key wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    Key(char),
    Closed,
}

pub trait RenderSurface {
    /// Show the frame
    fn present(&mut self, image: &RgbImage) -> Result<(), DisplayError>;

    /// Wait up to `timeout` for a key press or close request
    fn wait_event(&mut self, timeout: Duration) -> Option<SurfaceEvent>;

    /// Release window resources
    fn close(&mut self) {}

    /// Get surface name (for logging)
    fn name(&self) -> &'static str;
}

/// Holds the first event seen since it was last taken.
///
/// A windowing event loop reports a key as pressed only until its next
/// pass, so events are latched after every pass and handed out once per
/// key wait. A close request replaces a pending key.
#[derive(Debug, Default)]
pub struct EventLatch {
    pending: Option<SurfaceEvent>,
}

impl EventLatch {
    pub fn latch(&mut self, event: SurfaceEvent) {
        match (self.pending, event) {
            (_, SurfaceEvent::Closed) | (None, _) => self.pending = Some(event),
            _ => {}
        }
    }

    pub fn take(&mut self) -> Option<SurfaceEvent> {
        self.pending.take()
    }
}

/// Surface without a window: frames are dropped and the key wait is a
/// plain sleep. Quit comes from Ctrl+C.
#[derive(Debug, Default)]
pub struct HeadlessSurface;

impl RenderSurface for HeadlessSurface {
    fn present(&mut self, _image: &RgbImage) -> Result<(), DisplayError> {
        Ok(())
    }

    fn wait_event(&mut self, timeout: Duration) -> Option<SurfaceEvent> {
        thread::sleep(timeout);
        None
    }

    fn name(&self) -> &'static str {
        "HeadlessSurface"
    }
}

/// Draw bones and joints of one hand onto the frame
pub fn draw_landmarks(image: &mut RgbImage, hand: &HandLandmarks) {
    let (width, height) = image.dimensions();
    let points: Vec<(i32, i32)> = hand
        .to_pixels(width, height)
        .into_iter()
        .map(|(x, y)| (x.round() as i32, y.round() as i32))
        .collect();

    for &(a, b) in HAND_CONNECTIONS.iter() {
        draw_line(image, points[a], points[b], CONNECTION_COLOR);
    }
    for &point in &points {
        fill_circle(image, point, LANDMARK_RADIUS, LANDMARK_COLOR);
    }
}

fn set_pixel(image: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < image.width() && (y as u32) < image.height() {
        image.put_pixel(x as u32, y as u32, color);
    }
}

/// Bresenham line, clipped to the image
fn draw_line(image: &mut RgbImage, from: (i32, i32), to: (i32, i32), color: Rgb<u8>) {
    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = -(to.1 - y).abs();
    let sx = if x < to.0 { 1 } else { -1 };
    let sy = if y < to.1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        set_pixel(image, x, y, color);
        if x == to.0 && y == to.1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

fn fill_circle(image: &mut RgbImage, center: (i32, i32), radius: i32, color: Rgb<u8>) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                set_pixel(image, center.0 + dx, center.1 + dy, color);
            }
        }
    }
}

#[cfg(feature = "window")]
pub use window::WindowSurface;

#[cfg(feature = "window")]
mod window {
    use std::thread;
    use std::time::Duration;

    use image::RgbImage;
    use minifb::{Key, KeyRepeat, Scale, Window, WindowOptions};

    use super::{EventLatch, RenderSurface, SurfaceEvent};
    use crate::error::DisplayError;

    /// Software-rendered window using `minifb`
    pub struct WindowSurface {
        window: Option<Window>,
        buffer: Vec<u32>,
        events: EventLatch,
        /// Whether the event loop ran since the last key wait
        pumped: bool,
    }

    impl WindowSurface {
        pub fn open(title: &str, width: u32, height: u32) -> Result<Self, DisplayError> {
            let window = Window::new(
                title,
                width as usize,
                height as usize,
                WindowOptions {
                    resize: true,
                    scale: Scale::X2,
                    ..WindowOptions::default()
                },
            )
            .map_err(|e| DisplayError::Init(Box::new(e)))?;

            Ok(Self {
                window: Some(window),
                buffer: Vec::new(),
                events: EventLatch::default(),
                pumped: false,
            })
        }

        /// Latch what the last event-loop pass saw
        fn collect_events(&mut self) {
            let Some(window) = self.window.as_ref() else {
                return;
            };
            if !window.is_open() {
                self.events.latch(SurfaceEvent::Closed);
                return;
            }
            if let Some(c) = window
                .get_keys_pressed(KeyRepeat::No)
                .into_iter()
                .find_map(key_to_char)
            {
                self.events.latch(SurfaceEvent::Key(c));
            }
        }
    }

    impl RenderSurface for WindowSurface {
        fn present(&mut self, image: &RgbImage) -> Result<(), DisplayError> {
            let Some(window) = self.window.as_mut() else {
                return Ok(());
            };

            self.buffer.clear();
            self.buffer.extend(image.pixels().map(|p| {
                let [r, g, b] = p.0;
                (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
            }));

            let result = window
                .update_with_buffer(&self.buffer, image.width() as usize, image.height() as usize)
                .map_err(|e| DisplayError::Update(Box::new(e)));
            self.pumped = true;
            self.collect_events();
            result
        }

        fn wait_event(&mut self, timeout: Duration) -> Option<SurfaceEvent> {
            thread::sleep(timeout);

            // No frame was presented this iteration: pump events here so the
            // window stays responsive
            if !std::mem::take(&mut self.pumped) {
                if let Some(window) = self.window.as_mut() {
                    window.update();
                }
                self.collect_events();
            }
            self.events.take()
        }

        fn close(&mut self) {
            self.window.take();
        }

        fn name(&self) -> &'static str {
            "WindowSurface"
        }
    }

    fn key_to_char(key: Key) -> Option<char> {
        let c = match key {
            Key::A => 'a',
            Key::B => 'b',
            Key::C => 'c',
            Key::D => 'd',
            Key::E => 'e',
            Key::F => 'f',
            Key::G => 'g',
            Key::H => 'h',
            Key::I => 'i',
            Key::J => 'j',
            Key::K => 'k',
            Key::L => 'l',
            Key::M => 'm',
            Key::N => 'n',
            Key::O => 'o',
            Key::P => 'p',
            Key::Q => 'q',
            Key::R => 'r',
            Key::S => 's',
            Key::T => 't',
            Key::U => 'u',
            Key::V => 'v',
            Key::W => 'w',
            Key::X => 'x',
            Key::Y => 'y',
            Key::Z => 'z',
            Key::Space => ' ',
            Key::Escape => '\u{1b}',
            _ => return None,
        };
        Some(c)
    }
}
