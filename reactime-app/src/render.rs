use reactime_core::Stage;
use tiny_skia::{Color, Paint, Pixmap, Rect, Transform};

/// Everything the window shows for one frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct View {
    pub stage: Stage,
    pub completed: usize,
    pub total: usize,
    pub calibrating: bool,
    /// Live gesture score and the threshold it is compared with.
    pub score: Option<(f32, f32)>,
}

pub struct StageRenderer {
    pixmap: Pixmap,
}

fn stage_color(stage: Stage) -> Color {
    match stage {
        Stage::Waiting => Color::from_rgba8(245, 158, 11, 255),
        Stage::Go => Color::from_rgba8(6, 182, 212, 255),
        Stage::TooSoon => Color::from_rgba8(244, 63, 94, 255),
        Stage::Idle | Stage::Done => Color::from_rgba8(51, 65, 85, 255),
    }
}

fn paint(r: u8, g: u8, b: u8) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, 255);
    paint
}

impl StageRenderer {
    pub fn new(width: u32, height: u32) -> Option<Self> {
        Some(Self {
            pixmap: Pixmap::new(width, height)?,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if let Some(pixmap) = Pixmap::new(width, height) {
            self.pixmap = pixmap;
        }
    }

    pub fn draw(&mut self, view: &View) {
        let background = if view.calibrating {
            Color::from_rgba8(79, 70, 229, 255)
        } else {
            stage_color(view.stage)
        };
        self.pixmap.fill(background);

        let width = self.pixmap.width() as f32;
        let height = self.pixmap.height() as f32;
        let margin = 24.0;
        let bar_height = 12.0;
        let bar_width = width - 2.0 * margin;

        // Trial progress along the top edge.
        if view.total > 0 {
            let done = view.completed.min(view.total) as f32 / view.total as f32;
            self.fill(margin, margin, bar_width, bar_height, &paint(15, 23, 42));
            self.fill(margin, margin, bar_width * done, bar_height, &paint(241, 245, 249));
        }

        // Gesture score with a threshold marker along the bottom edge.
        if let Some((score, threshold)) = view.score {
            let y = height - margin - bar_height;
            self.fill(margin, y, bar_width, bar_height, &paint(15, 23, 42));
            self.fill(margin, y, bar_width * score.clamp(0.0, 1.0), bar_height, &paint(34, 197, 94));
            let x = margin + bar_width * threshold.clamp(0.0, 1.0);
            self.fill(x - 1.0, y - 4.0, 2.0, bar_height + 8.0, &paint(248, 250, 252));
        }
    }

    fn fill(&mut self, x: f32, y: f32, w: f32, h: f32, paint: &Paint) {
        if let Some(rect) = Rect::from_xywh(x, y, w, h) {
            self.pixmap.fill_rect(rect, paint, Transform::identity(), None);
        }
    }

    /// Copies into an RGBA8 frame of the same dimensions.
    pub fn copy_into(&self, frame: &mut [u8]) {
        let data = self.pixmap.data();
        if frame.len() == data.len() {
            frame.copy_from_slice(data);
        }
    }
}
