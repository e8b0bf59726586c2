/// Costume selection screen: photo panel on the left, costume grid on the right

use iced::widget::image::Handle;
use iced::widget::{button, column, container, image, mouse_area, row, scrollable, text};
use iced::{Alignment, ContentFit, Element, Length};
use iced_aw::Wrap;
use std::collections::HashMap;

use crate::state::catalog;
use crate::state::data::{Costume, CostumeCategory};
use crate::state::workflow::Workflow;
use crate::Message;

const CARD_WIDTH: f32 = 150.0;
const CARD_HEIGHT: f32 = 225.0;

/// Costume highlighted in the selector but not yet submitted
///
/// Lives only as long as the selector is on screen; a custom upload simply
/// replaces whatever was highlighted before.
#[derive(Debug, Default)]
pub struct CostumePicker {
    selected: Option<Costume>,
}

impl CostumePicker {
    pub fn select(&mut self, costume: Costume) {
        self.selected = Some(costume);
    }

    pub fn selected(&self) -> Option<&Costume> {
        self.selected.as_ref()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.as_ref().is_some_and(|costume| costume.id == id)
    }

    /// The custom costume, if that is what's highlighted
    pub fn custom(&self) -> Option<&Costume> {
        self.selected.as_ref().filter(|costume| costume.is_custom())
    }

    pub fn reset(&mut self) {
        self.selected = None;
    }
}

/// Caption of the transform button
pub fn transform_label(has_photo: bool, has_costume: bool, busy: bool) -> &'static str {
    if busy {
        "Transforming..."
    } else if !has_photo {
        "Upload a Photo"
    } else if !has_costume {
        "Select a Costume"
    } else {
        "Transform Now"
    }
}

/// Everything the selector needs besides the workflow
pub struct SelectorContext<'a> {
    pub picker: &'a CostumePicker,
    pub thumbnails: &'a HashMap<String, Handle>,
    pub camera_frame: Option<&'a Handle>,
    pub camera_open: bool,
    pub drop_hover: bool,
}

pub fn view<'a>(workflow: &'a Workflow, ctx: SelectorContext<'a>) -> Element<'a, Message> {
    let photo_panel = photo_panel(workflow, &ctx);

    let mut grid = column![
        text("Choose a Costume").size(28),
        text("Select a style or upload your own to begin the transformation.").size(14),
    ]
    .spacing(8);

    let custom_card = custom_card(ctx.picker);
    grid = grid.push(Wrap::with_elements(vec![custom_card]).spacing(12.0));

    for category in CostumeCategory::CATALOG {
        let cards: Vec<Element<'a, Message>> = catalog::by_category(category)
            .into_iter()
            .map(|costume| costume_card(costume, ctx.picker, ctx.thumbnails))
            .collect();

        grid = grid
            .push(text(category.label()).size(20))
            .push(Wrap::with_elements(cards).spacing(12.0).line_spacing(12.0));
    }

    row![
        container(photo_panel).width(Length::FillPortion(1)),
        scrollable(grid.spacing(16).padding(8)).width(Length::FillPortion(3)),
    ]
    .spacing(32)
    .into()
}

fn photo_panel<'a>(workflow: &'a Workflow, ctx: &SelectorContext<'a>) -> Element<'a, Message> {
    let preview: Element<'a, Message> = if ctx.camera_open {
        let live: Element<'a, Message> = match ctx.camera_frame {
            Some(frame) => image(frame.clone()).content_fit(ContentFit::Cover).into(),
            None => text("Starting camera...").into(),
        };
        column![
            container(live).width(Length::Fill).height(Length::Fixed(360.0)).center_x(Length::Fill),
            row![
                button("Capture")
                    .on_press_maybe(ctx.camera_frame.is_some().then_some(Message::CapturePhoto))
                    .style(button::primary),
                button("Cancel").on_press(Message::CancelCamera).style(button::secondary),
            ]
            .spacing(10),
        ]
        .spacing(10)
        .align_x(Alignment::Center)
        .into()
    } else if let Some(photo) = workflow.photo() {
        column![
            image(photo.handle().clone())
                .width(Length::Fill)
                .height(Length::Fixed(360.0))
                .content_fit(ContentFit::Cover),
            button("Change Photo").on_press_maybe((!workflow.is_busy()).then_some(Message::ClearPhoto)),
        ]
        .spacing(10)
        .align_x(Alignment::Center)
        .into()
    } else {
        let hint = if ctx.drop_hover { "Release to upload" } else { "Drag & Drop Image" };
        container(
            column![
                text(hint).size(18),
                text("or").size(14),
                row![
                    button("Browse Files").on_press(Message::BrowsePhoto),
                    button("Use Camera").on_press(Message::OpenCamera).style(button::secondary),
                ]
                .spacing(10),
                text("JPG, PNG, WEBP, HEIC. Max 10MB.").size(12),
            ]
            .spacing(10)
            .align_x(Alignment::Center),
        )
        .width(Length::Fill)
        .height(Length::Fixed(360.0))
        .center_x(Length::Fill)
        .center_y(Length::Fixed(360.0))
        .style(container::bordered_box)
        .into()
    };

    let has_photo = workflow.photo().is_some();
    let has_costume = ctx.picker.selected().is_some();
    let ready = has_photo && has_costume && !workflow.is_busy();

    let transform = button(
        container(text(transform_label(has_photo, has_costume, workflow.is_busy())).size(16)).center_x(Length::Fill),
    )
    .width(Length::Fill)
    .padding(14)
    .on_press_maybe(ready.then_some(Message::Transform));

    column![text("Your Photo").size(28), preview, transform]
        .spacing(16)
        .into()
}

fn custom_card(picker: &CostumePicker) -> Element<'_, Message> {
    let body: Element<'_, Message> = match picker.custom().and_then(|costume| costume.reference_image()) {
        Some(reference) => column![
            image(reference.handle().clone())
                .width(Length::Fixed(CARD_WIDTH))
                .height(Length::Fixed(CARD_HEIGHT - 30.0))
                .content_fit(ContentFit::Cover),
            text("Change Costume").size(14),
        ]
        .spacing(6)
        .align_x(Alignment::Center)
        .into(),
        None => column![
            text("Upload Custom Costume").size(16),
            text("Drag & drop or click").size(12),
        ]
        .spacing(6)
        .align_x(Alignment::Center)
        .into(),
    };

    mouse_area(
        container(body)
            .width(Length::Fixed(CARD_WIDTH))
            .height(Length::Fixed(CARD_HEIGHT))
            .center_x(Length::Fixed(CARD_WIDTH))
            .center_y(Length::Fixed(CARD_HEIGHT))
            .style(container::bordered_box),
    )
    .on_press(Message::BrowseCustomCostume)
    .into()
}

fn costume_card<'a>(
    costume: Costume,
    picker: &CostumePicker,
    thumbnails: &HashMap<String, Handle>,
) -> Element<'a, Message> {
    let artwork: Element<'a, Message> = match thumbnails.get(&costume.id) {
        Some(handle) => image(handle.clone())
            .width(Length::Fixed(CARD_WIDTH))
            .height(Length::Fixed(CARD_HEIGHT - 50.0))
            .content_fit(ContentFit::Cover)
            .into(),
        None => container(text("…"))
            .width(Length::Fixed(CARD_WIDTH))
            .height(Length::Fixed(CARD_HEIGHT - 50.0))
            .center_x(Length::Fixed(CARD_WIDTH))
            .center_y(Length::Fixed(CARD_HEIGHT - 50.0))
            .into(),
    };

    let selected = picker.is_selected(&costume.id);
    let name = if selected { format!("✨ {}", costume.name) } else { costume.name.clone() };

    let card = container(
        column![artwork, text(name).size(14), text(costume.category.label()).size(11)]
            .spacing(4)
            .width(Length::Fixed(CARD_WIDTH)),
    )
    .padding(4);

    let card = if selected {
        card.style(container::rounded_box)
    } else {
        card
    };

    mouse_area(card)
        .on_press(Message::SelectCostume(costume.id.clone()))
        .into()
}
