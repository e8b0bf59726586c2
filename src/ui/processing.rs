/// "Creating your cosplay" screen shown while the remote call is in flight

use iced::widget::image::Handle;
use iced::widget::{column, image, text};
use iced::{Alignment, ContentFit, Element, Length};
use std::collections::HashMap;

use crate::state::data::Costume;
use crate::Message;

/// How often the status line advances
pub const MESSAGE_INTERVAL_MS: u64 = 2500;

pub const MESSAGES: [&str; 5] = [
    "Warming up the AI transformation engine...",
    "Analyzing facial features for preservation...",
    "Stitching digital threads of your costume...",
    "Applying realistic lighting and shadows...",
    "Adding final touches of magic...",
];

/// Status line for the `tick`-th interval; wraps around
pub fn message(tick: usize) -> &'static str {
    MESSAGES[tick % MESSAGES.len()]
}

/// Artwork for the costume being rendered: the upload for custom costumes,
/// the downloaded catalog thumbnail otherwise
pub fn artwork<'a>(costume: &'a Costume, thumbnails: &'a HashMap<String, Handle>) -> Option<&'a Handle> {
    match costume.reference_image() {
        Some(reference) => Some(reference.handle()),
        None => thumbnails.get(&costume.id),
    }
}

pub fn view<'a>(
    costume: Option<&'a Costume>,
    thumbnails: &'a HashMap<String, Handle>,
    tick: usize,
) -> Element<'a, Message> {
    let mut content = column![].spacing(16).align_x(Alignment::Center);

    if let Some(handle) = costume.and_then(|c| artwork(c, thumbnails)) {
        content = content.push(
            image(handle.clone())
                .width(Length::Fixed(128.0))
                .height(Length::Fixed(128.0))
                .content_fit(ContentFit::Cover),
        );
    }

    let name = costume.map(|c| c.name.as_str()).unwrap_or("your costume");

    content
        .push(text("Creating Your Cosplay").size(32))
        .push(text(format!("Please wait a moment. Our AI is crafting your transformation into a {}.", name)).size(16))
        .push(text(message(tick)).size(16))
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::catalog;
    use crate::state::data::fixtures;
    use crate::state::ids::SessionIds;

    #[test]
    fn test_artwork_for_catalog_costume() {
        let costume = catalog::find("c3").unwrap();
        let mut thumbnails = HashMap::new();
        assert!(artwork(&costume, &thumbnails).is_none());

        let handle = Handle::from_bytes(fixtures::png(2, 2, 9));
        thumbnails.insert("c3".to_string(), handle.clone());
        assert_eq!(artwork(&costume, &thumbnails), Some(&handle));
    }

    #[test]
    fn test_artwork_for_custom_costume() {
        let reference = fixtures::image(5);
        let costume = catalog::custom_costume("armor.png", reference.clone(), &mut SessionIds::default());
        assert_eq!(artwork(&costume, &HashMap::new()), Some(reference.handle()));
    }

    #[test]
    fn test_messages_rotate() {
        assert_eq!(message(0), MESSAGES[0]);
        assert_eq!(message(4), MESSAGES[4]);
        assert_eq!(message(5), MESSAGES[0]);
        assert_eq!(message(12), MESSAGES[2]);
    }
}
