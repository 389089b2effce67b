//! Overlay dialogs
//!
//! The detail view and the delete confirmation are both drawn on top of the
//! grid. Clicking the dimmed backdrop sends `on_blur`.

use iced::widget::{button, center, column, container, mouse_area, opaque, row, stack, text};
use iced::{Color, Element, Length};

use crate::state::collection::DeleteRequest;
use crate::Message;

/// Layer `content` over `base` on a dimmed backdrop
pub fn modal<'a, M>(
    base: impl Into<Element<'a, M>>,
    content: impl Into<Element<'a, M>>,
    on_blur: M,
) -> Element<'a, M>
where
    M: Clone + 'a,
{
    stack![
        base.into(),
        opaque(
            mouse_area(center(opaque(content)).style(|_theme| {
                container::Style {
                    background: Some(
                        Color {
                            a: 0.8,
                            ..Color::BLACK
                        }
                        .into(),
                    ),
                    ..container::Style::default()
                }
            }))
            .on_press(on_blur)
        )
    ]
    .into()
}

/// "Are you sure?" box for a pending deletion
pub fn confirm_delete(request: &DeleteRequest) -> Element<'_, Message> {
    let body = column![
        text("Delete coin").size(22),
        text(format!(
            "Are you sure you want to delete \"{}\"? This cannot be undone.",
            request.name()
        )),
        row![
            button("Cancel")
                .style(button::secondary)
                .on_press(Message::CancelDelete),
            button("Delete")
                .style(button::danger)
                .on_press(Message::ConfirmDelete),
        ]
        .spacing(10),
    ]
    .spacing(16);

    container(body)
        .width(Length::Fixed(420.0))
        .padding(24)
        .style(container::rounded_box)
        .into()
}
