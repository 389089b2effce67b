use iced::widget::{button, center, column, container, image, row, scrollable, text, Row};
use iced::{ContentFit, Element, Length};
use iced_aw::Wrap;

use crate::media::thumbnail::ThumbnailCache;
use crate::present::{Card, Gallery};
use crate::Message;

const CARD_WIDTH: f32 = 220.0;
const GAP: f32 = 16.0;

/// The coin grid, or the empty state when nothing is displayed
pub fn view<'a>(
    gallery: &Gallery<'a>,
    thumbnails: &'a ThumbnailCache,
    searching: bool,
) -> Element<'a, Message> {
    match gallery {
        Gallery::Empty => {
            let message = if searching {
                "No coins match your search."
            } else {
                "No coins in your collection yet. Add your first coin!"
            };
            center(text(message).size(18)).into()
        }
        Gallery::Cards(cards) => {
            let cards: Vec<Element<'a, Message>> = cards
                .iter()
                .map(|card| card_view(card, thumbnails))
                .collect();

            scrollable(
                container(Wrap::with_elements(cards).spacing(GAP).line_spacing(GAP))
                    .width(Length::Fill)
                    .padding(GAP),
            )
            .height(Length::Fill)
            .into()
        }
    }
}

fn badge(label: String) -> Element<'static, Message> {
    container(text(label).size(12))
        .padding([2, 6])
        .style(container::rounded_box)
        .into()
}

fn card_view<'a>(card: &Card<'a>, thumbnails: &'a ThumbnailCache) -> Element<'a, Message> {
    let mut badges = Row::new().spacing(4);
    if let Some(count) = card.image_count {
        badges = badges.push(badge(format!("{} images", count)));
    }
    if card.has_model {
        badges = badges.push(badge("3D".to_string()));
    }

    let content = column![
        image(thumbnails.get(card.id).clone())
            .width(Length::Fill)
            .height(Length::Fixed(CARD_WIDTH - 24.0))
            .content_fit(ContentFit::Cover),
        badges,
        text(card.name).size(18),
        text(card.date).size(14),
        text(format!("Origin: {}", card.origin)).size(12),
        text(format!("Ruler: {}", card.ruler)).size(12),
        row![
            button("View").on_press(Message::ViewCoin(card.id)),
            button("Delete")
                .style(button::danger)
                .on_press(Message::RequestDelete(card.id)),
        ]
        .spacing(8),
    ]
    .spacing(6);

    container(content)
        .width(Length::Fixed(CARD_WIDTH))
        .padding(12)
        .style(container::rounded_box)
        .into()
}
