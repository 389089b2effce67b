use iced::widget::image::Handle;
use iced::widget::{
    button, canvas, center, column, container, horizontal_space, image, row, scrollable, text,
    Column, Row,
};
use iced::{ContentFit, Element, Length, Size};

use crate::present::Detail;
use crate::ui::viewer::MeshCanvas;
use crate::viewer::{PreviewLifecycle, PreviewState, Viewport};
use crate::Message;

/// Widest the detail modal gets
pub const MODAL_MAX_WIDTH: f32 = 900.0;

/// Height of the 3D preview mount point
pub const VIEWER_HEIGHT: f32 = 400.0;

/// Space kept between the modal and the window edges
const MODAL_MARGIN: f32 = 40.0;
const MODAL_PADDING: f32 = 24.0;

/// Size of the preview mount point for a given window size
pub fn mount_viewport(window: Size) -> Viewport {
    let modal_width = (window.width - 2.0 * MODAL_MARGIN).clamp(0.0, MODAL_MAX_WIDTH);
    Viewport::new((modal_width - 2.0 * MODAL_PADDING).max(1.0), VIEWER_HEIGHT)
}

fn section<'a>(title: &'a str, body: impl Into<Element<'a, Message>>) -> Column<'a, Message> {
    column![text(title).size(18), body.into()].spacing(6)
}

/// The detail modal body for one coin
pub fn view<'a>(
    detail: Detail<'a>,
    images: &'a [Handle],
    preview: &'a PreviewLifecycle,
    window: Size,
) -> Element<'a, Message> {
    let header = row![
        column![text(detail.name).size(28), text(detail.date).size(16)].spacing(4),
        horizontal_space(),
        button("Close")
            .style(button::secondary)
            .on_press(Message::CloseDetail),
    ];

    let mut body = Column::new().spacing(20).push(header);

    if !images.is_empty() {
        let gallery = images.iter().fold(Row::new().spacing(10), |row, handle| {
            row.push(
                image(handle.clone())
                    .height(Length::Fixed(260.0))
                    .content_fit(ContentFit::Contain),
            )
        });
        body = body.push(scrollable(gallery).direction(scrollable::Direction::Horizontal(
            scrollable::Scrollbar::default(),
        )));
    }

    let details = detail
        .physical_details()
        .into_iter()
        .fold(Column::new().spacing(4), |rows, (label, value)| {
            rows.push(row![
                text(label).width(Length::Fixed(100.0)),
                text(value)
            ])
        });
    body = body.push(section("Physical details", details));

    if let Some(description) = detail.description {
        body = body.push(section("Description", text(description)));
    }

    for (label, face) in detail.faces() {
        body = body.push(section(label, text(face)));
    }

    if detail.model.is_some() {
        body = body.push(section("3D model", preview_mount(preview)));
    }

    let width = mount_viewport(window).width + 2.0 * MODAL_PADDING;
    container(scrollable(body.padding(MODAL_PADDING)))
        .width(Length::Fixed(width))
        .max_height(window.height - 2.0 * MODAL_MARGIN)
        .style(container::rounded_box)
        .into()
}

/// Whatever the current preview session has to show
fn preview_mount(preview: &PreviewLifecycle) -> Element<'_, Message> {
    match preview.state() {
        PreviewState::Active { scene, .. } => {
            let mount = canvas(MeshCanvas { scene: &**scene })
                .width(Length::Fill)
                .height(Length::Fixed(VIEWER_HEIGHT));

            if scene.mesh().is_some() {
                mount.into()
            } else {
                column![mount, text("This model could not be displayed.").size(12)]
                    .spacing(4)
                    .into()
            }
        }
        PreviewState::FallbackActive { panel, .. } => center(
            column![
                text(&panel.filename).size(18),
                text(panel.explanation),
                button("Download model").on_press(Message::DownloadModel),
            ]
            .spacing(12)
            .align_x(iced::Alignment::Center),
        )
        .height(Length::Fixed(VIEWER_HEIGHT))
        .into(),
        PreviewState::Initializing { .. } => center(text("Loading 3D model..."))
            .height(Length::Fixed(VIEWER_HEIGHT))
            .into(),
        PreviewState::Closed => center(text("3D preview unavailable"))
            .height(Length::Fixed(VIEWER_HEIGHT))
            .into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mount_viewport_is_capped() {
        let viewport = mount_viewport(Size::new(1920.0, 1080.0));
        assert_eq!(viewport, Viewport::new(852.0, 400.0));
    }

    #[test]
    fn test_mount_viewport_follows_small_windows() {
        let viewport = mount_viewport(Size::new(600.0, 500.0));
        assert_eq!(viewport, Viewport::new(472.0, 400.0));

        let tiny = mount_viewport(Size::new(50.0, 50.0));
        assert_eq!(tiny.width, 1.0);
    }
}
