/// Result screen: before/after comparison plus follow-up actions

use chrono::Local;
use iced::widget::{button, canvas, column, row, text};
use iced::{Alignment, Element, Length};

use super::comparison::Comparison;
use crate::state::data::Transformation;
use crate::Message;

/// Height of the comparison canvas
const COMPARISON_HEIGHT: f32 = 560.0;

pub fn view(transformation: &Transformation) -> Element<'_, Message> {
    let comparison = canvas(Comparison::new(&transformation.original_image, &transformation.result_image))
        .width(Length::Fill)
        .height(Length::Fixed(COMPARISON_HEIGHT));

    column![
        text("Transformation Complete!").size(36),
        text(format!(
            "You've been transformed into {}. Created {}.",
            transformation.costume.name,
            transformation.created_at.with_timezone(&Local).format("%H:%M")
        ))
        .size(16),
        comparison,
        row![
            button("Download").on_press(Message::DownloadResult).style(button::secondary),
            button("Create Another").on_press(Message::StartNew).style(button::primary),
        ]
        .spacing(12),
    ]
    .spacing(20)
    .align_x(Alignment::Center)
    .into()
}

/// Suggested file name for saving a result, e.g. `cosplay-batman-suit.png`
pub fn download_name(transformation: &Transformation) -> String {
    let slug: String = transformation
        .costume
        .name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    format!("cosplay-{}.{}", slug, transformation.result_image.extension())
}
