use iced::mouse::{self, Cursor};
use iced::widget::canvas::{self, Frame, Path, Program};
use iced::{Color, Point, Rectangle, Renderer, Theme};

use crate::viewer::Scene;
use crate::Message;

/// Canvas that paints an active preview scene.
/// Left-drag orbits the camera, the wheel zooms.
pub struct MeshCanvas<'a> {
    pub scene: &'a Scene,
}

impl Program<Message> for MeshCanvas<'_> {
    type State = DragState;

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());

        let [r, g, b] = self.scene.background;
        frame.fill_rectangle(Point::ORIGIN, bounds.size(), Color::from_rgb(r, g, b));

        // The scene projects into its own viewport; stretch that onto the
        // canvas in case a resize hasn't reached it yet
        let viewport = self.scene.viewport();
        let scale_x = bounds.width / viewport.width.max(1.0);
        let scale_y = bounds.height / viewport.height.max(1.0);

        for triangle in self.scene.rasterize() {
            let [a, b, c] = triangle
                .points
                .map(|[x, y]| Point::new(x * scale_x, y * scale_y));
            let path = Path::new(|builder| {
                builder.move_to(a);
                builder.line_to(b);
                builder.line_to(c);
                builder.close();
            });

            let [r, g, b] = triangle.color;
            frame.fill(&path, Color::from_rgb(r, g, b));
        }

        vec![frame.into_geometry()]
    }

    fn update(
        &self,
        state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        match event {
            canvas::Event::Mouse(mouse::Event::WheelScrolled { delta }) => {
                if cursor.is_over(bounds) {
                    let steps = match delta {
                        mouse::ScrollDelta::Lines { y, .. } => y,
                        mouse::ScrollDelta::Pixels { y, .. } => y / 50.0,
                    };
                    return (canvas::event::Status::Captured, Some(Message::Zoom(steps)));
                }
            }

            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                if let Some(pos) = cursor.position_over(bounds) {
                    state.is_dragging = true;
                    state.last_position = Some(pos);
                    return (canvas::event::Status::Captured, None);
                }
            }

            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                if state.is_dragging {
                    state.is_dragging = false;
                    state.last_position = None;
                    return (canvas::event::Status::Captured, None);
                }
            }

            canvas::Event::Mouse(mouse::Event::CursorMoved { position }) => {
                if state.is_dragging {
                    if let Some(last) = state.last_position {
                        state.last_position = Some(position);
                        return (
                            canvas::event::Status::Captured,
                            Some(Message::Orbit(position.x - last.x, position.y - last.y)),
                        );
                    }
                }
            }

            _ => {}
        }

        (canvas::event::Status::Ignored, None)
    }

    fn mouse_interaction(
        &self,
        state: &Self::State,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> mouse::Interaction {
        if state.is_dragging {
            mouse::Interaction::Grabbing
        } else if cursor.is_over(bounds) {
            mouse::Interaction::Grab
        } else {
            mouse::Interaction::default()
        }
    }
}

/// State for drag interactions
#[derive(Debug, Clone, Default)]
pub struct DragState {
    pub is_dragging: bool,
    pub last_position: Option<Point>,
}
