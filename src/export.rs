//! Standalone HTML export of the catalog
//!
//! Renders the same projections the application shows. Every piece of
//! user-supplied text goes through [`escape_html`] before it is placed in
//! markup; data URLs are escaped too since they end up inside attributes.

use chrono::{DateTime, Utc};

use crate::present::{Card, Detail, Gallery, Thumbnail};
use crate::state::data::Coin;

/// Grey card with a bronze disc, matching the in-app placeholder
pub const PLACEHOLDER_SVG: &str = "data:image/svg+xml;utf8,\
%3Csvg xmlns='http://www.w3.org/2000/svg' width='256' height='256'%3E\
%3Crect width='256' height='256' fill='%23dddddd'/%3E\
%3Ccircle cx='128' cy='128' r='86' fill='%23b88d4f' stroke='%238c6a3a' stroke-width='8'/%3E\
%3C/svg%3E";

const EMPTY_MESSAGE: &str = "No coins in your collection yet.";

const STYLE: &str = "\
body{font-family:sans-serif;margin:2rem;background:#fafafa;color:#222}\
.grid{display:grid;grid-template-columns:repeat(auto-fill,minmax(220px,1fr));gap:1rem}\
.card{background:#fff;border-radius:8px;padding:.75rem;box-shadow:0 1px 3px #0002}\
.card img{width:100%;aspect-ratio:1;object-fit:cover;border-radius:4px}\
.badge{display:inline-block;margin-right:.25rem;padding:0 .4rem;border-radius:4px;background:#8c6a3a;color:#fff;font-size:.8rem}\
.detail{background:#fff;border-radius:8px;padding:1rem;margin-top:2rem}\
.images img{max-width:300px;margin-right:.5rem}\
.empty{color:#777}";

/// Escape `& < > " '` so text can be placed in element content or attributes
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn render_card(card: &Card) -> String {
    let src = match card.thumbnail {
        Thumbnail::Image(url) => escape_html(url),
        Thumbnail::Placeholder => PLACEHOLDER_SVG.to_string(),
    };

    let mut badges = String::new();
    if let Some(count) = card.image_count {
        badges.push_str(&format!("<span class=\"badge\">{} images</span>", count));
    }
    if card.has_model {
        badges.push_str("<span class=\"badge\">3D</span>");
    }

    format!(
        "<div class=\"card\" id=\"coin-{id}\">\
<img src=\"{src}\" alt=\"{name}\">\
<div class=\"badges\">{badges}</div>\
<h3>{name}</h3>\
<p>{date}</p>\
<p>Origin: {origin}</p>\
<p>Ruler: {ruler}</p>\
</div>",
        id = card.id,
        src = src,
        name = escape_html(card.name),
        badges = badges,
        date = escape_html(card.date),
        origin = escape_html(card.origin),
        ruler = escape_html(card.ruler),
    )
}

pub fn render_gallery(gallery: &Gallery) -> String {
    match gallery {
        Gallery::Empty => format!("<p class=\"empty\">{}</p>", EMPTY_MESSAGE),
        Gallery::Cards(cards) => {
            let cards: String = cards.iter().map(render_card).collect();
            format!("<div class=\"grid\">{}</div>", cards)
        }
    }
}

pub fn render_detail(detail: &Detail) -> String {
    let mut html = format!(
        "<section class=\"detail\" id=\"detail-{}\"><h2>{}</h2><p>{}</p>",
        detail.id,
        escape_html(detail.name),
        escape_html(detail.date)
    );

    if !detail.images.is_empty() {
        html.push_str("<div class=\"images\">");
        for (i, url) in detail.images.iter().enumerate() {
            html.push_str(&format!(
                "<img src=\"{}\" alt=\"{} image {}\">",
                escape_html(url),
                escape_html(detail.name),
                i + 1
            ));
        }
        html.push_str("</div>");
    }

    html.push_str("<h3>Physical details</h3><dl>");
    for (label, value) in detail.physical_details() {
        html.push_str(&format!("<dt>{}</dt><dd>{}</dd>", label, escape_html(value)));
    }
    html.push_str("</dl>");

    if let Some(description) = detail.description {
        html.push_str(&format!(
            "<h3>Description</h3><p>{}</p>",
            escape_html(description)
        ));
    }

    for (label, text) in detail.faces() {
        html.push_str(&format!("<h3>{}</h3><p>{}</p>", label, escape_html(text)));
    }

    if let Some(model) = detail.model {
        html.push_str(&format!(
            "<h3>3D model</h3><div class=\"viewer-3d\" data-model=\"{name}\">\
<a href=\"{data}\" download=\"{name}\">Download {name}</a></div>",
            name = escape_html(&model.name),
            data = escape_html(&model.data),
        ));
    }

    html.push_str("</section>");
    html
}

/// A complete page: the grid followed by every coin's detail section
pub fn render_catalog_page(coins: &[&Coin], exported_at: DateTime<Utc>) -> String {
    let gallery = render_gallery(&Gallery::project(coins));
    let details: String = coins
        .iter()
        .map(|coin| render_detail(&Detail::project(coin)))
        .collect();

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\"><head><meta charset=\"utf-8\">\
<title>Coin Collection</title><style>{style}</style></head>\
<body><h1>Coin Collection</h1>\
<p>{count} coins, exported {exported}</p>\
{gallery}{details}</body></html>\n",
        style = STYLE,
        count = coins.len(),
        exported = exported_at.format("%Y-%m-%d %H:%M UTC"),
        gallery = gallery,
        details = details,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::{MeshPayload, NewCoin};
    use chrono::TimeZone;

    fn coin(name: &str) -> Coin {
        NewCoin {
            name: name.to_string(),
            date: "44 BC".to_string(),
            ..Default::default()
        }
        .into_coin(7, Utc::now())
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
        assert_eq!(escape_html("Denarius"), "Denarius");
    }

    #[test]
    fn test_card_escapes_user_text() {
        let mut coin = coin("<script>alert(1)</script>");
        coin.origin = "Rome \"Caput Mundi\"".to_string();

        let html = render_card(&Card::project(&coin));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(html.contains("Rome &quot;Caput Mundi&quot;"));
        assert!(html.contains(PLACEHOLDER_SVG));
    }

    #[test]
    fn test_empty_gallery_message() {
        assert_eq!(
            render_gallery(&Gallery::Empty),
            format!("<p class=\"empty\">{}</p>", EMPTY_MESSAGE)
        );
    }

    #[test]
    fn test_detail_sections() {
        let mut coin = coin("Denarius");
        coin.description = "Silver & worn".to_string();
        coin.reverse = "Elephant".to_string();
        coin.model_3d = Some(MeshPayload::from_bytes("elephant\".obj", "model/obj", b"v 0 0 0"));

        let html = render_detail(&Detail::project(&coin));
        assert!(html.contains("<dt>Material</dt><dd>Unknown</dd>"));
        assert!(html.contains("<h3>Description</h3><p>Silver &amp; worn</p>"));
        assert!(html.contains("<h3>Reverse</h3><p>Elephant</p>"));
        assert!(!html.contains("Obverse"));
        assert!(html.contains("download=\"elephant&quot;.obj\""));
    }

    #[test]
    fn test_catalog_page() {
        let first = coin("Aureus");
        let second = coin("Solidus");
        let exported = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();

        let page = render_catalog_page(&[&first, &second], exported);
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("2 coins, exported 2024-03-01 12:30 UTC"));
        assert_eq!(page.matches("class=\"card\"").count(), 2);
        assert_eq!(page.matches("class=\"detail\"").count(), 2);

        let empty = render_catalog_page(&[], exported);
        assert!(empty.contains(EMPTY_MESSAGE));
    }
}
