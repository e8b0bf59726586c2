use iced::mouse::{self, Cursor};
use iced::touch;
use iced::widget::canvas::{self, Path, Program};
use iced::widget::image::Handle;
use iced::{Color, Pixels, Point, Rectangle, Renderer, Size, Theme};

use crate::state::data::ImageData;

/// Horizontal distance from the divider (px) that still grabs it
pub const GRAB_RADIUS: f32 = 24.0;

const HANDLE_RADIUS: f32 = 16.0;

/// Reveal ratio and drag flag of a before/after widget
///
/// Knows nothing about images; it only turns pointer offsets into a
/// position in [0, 100]. Every operation is O(1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComparisonSlider {
    position: f32,
    dragging: bool,
}

impl Default for ComparisonSlider {
    fn default() -> Self {
        Self {
            position: 50.0,
            dragging: false,
        }
    }
}

impl ComparisonSlider {
    pub fn position(&self) -> f32 {
        self.position
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Divider x coordinate within a widget of `width`
    pub fn divider_x(&self, width: f32) -> f32 {
        width * self.position() / 100.0
    }

    /// Pointer down at `offset` px from the widget's left edge.
    /// Starts a drag only when the pointer is on the divider.
    pub fn press(&mut self, offset: f32, width: f32) -> bool {
        if (offset - self.divider_x(width)).abs() <= GRAB_RADIUS {
            self.dragging = true;
        }
        self.dragging
    }

    /// Pointer moved; recomputes the position while dragging
    pub fn drag_to(&mut self, offset: f32, width: f32) -> bool {
        if !self.dragging || width <= 0.0 || offset.is_nan() {
            return false;
        }
        self.position = (offset / width * 100.0).clamp(0.0, 100.0);
        true
    }

    /// Pointer up, leave, or touch end
    pub fn release(&mut self) {
        self.dragging = false;
    }
}

/// Before/after canvas: `before` fully visible, `after` revealed left of the divider
#[derive(Debug, Clone)]
pub struct Comparison {
    before: Handle,
    before_size: (u32, u32),
    after: Handle,
    after_size: (u32, u32),
}

impl Comparison {
    pub fn new(before: &ImageData, after: &ImageData) -> Self {
        Self {
            before: before.handle().clone(),
            before_size: before.dimensions(),
            after: after.handle().clone(),
            after_size: after.dimensions(),
        }
    }
}

impl<Message> Program<Message> for Comparison {
    type State = ComparisonSlider;

    fn update(
        &self,
        state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        let captured = (canvas::event::Status::Captured, None);

        match event {
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                if let Some(pos) = cursor.position_in(bounds) {
                    if state.press(pos.x, bounds.width) {
                        return captured;
                    }
                }
            }

            canvas::Event::Mouse(mouse::Event::CursorMoved { .. }) if state.is_dragging() => {
                // Leaving the widget ends the drag
                match cursor.position_in(bounds) {
                    Some(pos) => {
                        state.drag_to(pos.x, bounds.width);
                    }
                    None => state.release(),
                }
                return captured;
            }

            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left))
            | canvas::Event::Mouse(mouse::Event::CursorLeft) => {
                if state.is_dragging() {
                    state.release();
                    return captured;
                }
            }

            canvas::Event::Touch(touch::Event::FingerPressed { position, .. }) => {
                if bounds.contains(position) && state.press(position.x - bounds.x, bounds.width) {
                    return captured;
                }
            }

            canvas::Event::Touch(touch::Event::FingerMoved { position, .. }) if state.is_dragging() => {
                state.drag_to(position.x - bounds.x, bounds.width);
                return captured;
            }

            canvas::Event::Touch(touch::Event::FingerLifted { .. })
            | canvas::Event::Touch(touch::Event::FingerLost { .. }) => {
                if state.is_dragging() {
                    state.release();
                    return captured;
                }
            }

            _ => {}
        }

        (canvas::event::Status::Ignored, None)
    }

    fn draw(
        &self,
        state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());
        let area = bounds.size();
        let split = state.divider_x(area.width);

        frame.fill_rectangle(Point::ORIGIN, area, Color::BLACK);
        frame.draw_image(fit(self.before_size, area), canvas::Image::new(self.before.clone()));

        let after_rect = fit(self.after_size, area);
        frame.with_clip(Rectangle::new(Point::ORIGIN, Size::new(split, area.height)), |frame| {
            frame.draw_image(after_rect, canvas::Image::new(self.after.clone()));
        });

        // Divider and grab handle
        frame.fill_rectangle(Point::new(split - 1.0, 0.0), Size::new(2.0, area.height), Color::WHITE);
        let center = Point::new(split, area.height / 2.0);
        frame.fill(&Path::circle(center, HANDLE_RADIUS), Color::WHITE);
        frame.fill(&Path::circle(center, HANDLE_RADIUS / 3.0), Color::from_rgb8(0x33, 0x33, 0x33));

        for (label, x) in [("After", 12.0), ("Before", area.width - 60.0)] {
            frame.fill_text(canvas::Text {
                content: label.to_string(),
                position: Point::new(x, 12.0),
                color: Color::WHITE,
                size: Pixels(14.0),
                ..canvas::Text::default()
            });
        }

        vec![frame.into_geometry()]
    }

    fn mouse_interaction(&self, state: &Self::State, bounds: Rectangle, cursor: Cursor) -> mouse::Interaction {
        let on_divider = cursor
            .position_in(bounds)
            .map(|pos| (pos.x - state.divider_x(bounds.width)).abs() <= GRAB_RADIUS)
            .unwrap_or(false);

        if state.is_dragging() || on_divider {
            mouse::Interaction::ResizingHorizontally
        } else {
            mouse::Interaction::default()
        }
    }
}

/// Largest rectangle with the image's aspect ratio, centered in `area`
fn fit(image: (u32, u32), area: Size) -> Rectangle {
    let (width, height) = (image.0 as f32, image.1 as f32);
    if width <= 0.0 || height <= 0.0 {
        return Rectangle::new(Point::ORIGIN, area);
    }

    let scale = (area.width / width).min(area.height / height);
    let size = Size::new(width * scale, height * scale);
    Rectangle::new(
        Point::new((area.width - size.width) / 2.0, (area.height - size.height) / 2.0),
        size,
    )
}
