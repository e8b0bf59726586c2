use iced::widget::image::Handle;
use iced::widget::{button, column, container, row, text, Space};
use iced::{event, time, window, Event, Subscription};
use iced::{Alignment, Element, Length, Task, Theme};
use rfd::{FileDialog, MessageDialog, MessageLevel};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

mod ingest;
mod service;
mod state;
mod ui;

use ingest::camera::{CameraSession, NativeCamera};
use ingest::{DropTarget, IngestError, Ingested, RawFile};
use service::{GeminiService, ThumbnailError, TransformationService};
use state::catalog;
use state::data::Thumbnail;
use state::settings::{Settings, ThemeChoice};
use state::workflow::{TransformOutcome, Workflow, WorkflowStep};
use ui::selector::{CostumePicker, SelectorContext};

/// Live camera preview refresh rate
const CAMERA_FRAME_INTERVAL: Duration = Duration::from_millis(66);

/// Main application state
struct CosplayStudio {
    /// Settings loaded at startup; only `ToggleTheme` mutates them
    settings: Settings,
    /// The transformation state machine
    workflow: Workflow,
    /// Costume highlighted in the selector
    picker: CostumePicker,
    /// Remote transformation backend
    service: Arc<dyn TransformationService>,
    /// Downloaded catalog artwork by costume id
    thumbnails: HashMap<String, Handle>,
    /// Open camera, if the capture view is showing
    camera: Option<CameraSession>,
    /// Latest live preview frame
    camera_frame: Option<Handle>,
    /// A file is being dragged over the window
    drop_hover: bool,
    /// Rotating status line index on the processing screen
    processing_tick: usize,
    /// Status message to display to the user
    status: String,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    /// User clicked "Browse Files" for their photo
    BrowsePhoto,
    /// User clicked the custom costume card
    BrowseCustomCostume,
    /// A file was dropped anywhere on the window
    FileDropped(PathBuf),
    FileHovered,
    FileHoverLeft,
    /// Background ingestion finished
    Ingested(DropTarget, Result<Ingested, IngestError>),
    ClearPhoto,
    /// Highlight a catalog costume by id
    SelectCostume(String),
    /// Submit photo + highlighted costume
    Transform,
    /// Remote call finished
    TransformFinished(TransformOutcome),
    StartNew,
    DismissError,
    OpenCamera,
    CameraTick,
    CapturePhoto,
    CancelCamera,
    ThumbnailLoaded(String, Result<Vec<u8>, ThumbnailError>),
    ProcessingTick,
    DownloadResult,
    Downloaded(Result<PathBuf, String>),
    ToggleTheme,
}

impl CosplayStudio {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        let settings = Settings::load_or_default();
        let http = reqwest::Client::new();

        let api_key = Settings::api_key();
        if api_key.is_none() {
            tracing::warn!("⚠️  GEMINI_API_KEY is not set; transformations will fail");
        }
        let service: Arc<dyn TransformationService> = Arc::new(GeminiService::new(http.clone(), &settings, api_key));

        // Fetch catalog artwork in the background
        let thumbnails = Task::batch(catalog::catalog().into_iter().filter_map(|costume| match costume.thumbnail {
            Thumbnail::Remote(url) => {
                let id = costume.id;
                Some(Task::perform(service::fetch_thumbnail(http.clone(), url), move |result| {
                    Message::ThumbnailLoaded(id.clone(), result)
                }))
            }
            Thumbnail::Embedded(_) => None,
        }));

        tracing::info!("🎭 Cosplay Studio initialized (model {})", settings.model);

        (
            CosplayStudio {
                settings,
                workflow: Workflow::new(),
                picker: CostumePicker::default(),
                service,
                thumbnails: HashMap::new(),
                camera: None,
                camera_frame: None,
                drop_hover: false,
                processing_tick: 0,
                status: "Ready. Upload a photo to begin.".to_string(),
            },
            thumbnails,
        )
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::BrowsePhoto => self.browse(DropTarget::Photo),
            Message::BrowseCustomCostume => self.browse(DropTarget::CustomCostume),
            Message::FileDropped(path) => {
                self.drop_hover = false;
                if self.workflow.step() != WorkflowStep::SelectCostume || self.camera.is_some() {
                    return Task::none();
                }
                let file_name = path.file_name().unwrap_or_default().to_string_lossy().to_string();
                let target = DropTarget::resolve(self.workflow.photo().is_some(), &file_name);
                self.ingest_path(path, target)
            }
            Message::FileHovered => {
                self.drop_hover = true;
                Task::none()
            }
            Message::FileHoverLeft => {
                self.drop_hover = false;
                Task::none()
            }
            Message::Ingested(target, Ok(ingested)) => {
                match target {
                    DropTarget::Photo => {
                        if self.workflow.upload_photo(ingested.image) {
                            self.status = format!("Photo loaded: {}", ingested.file_name);
                        }
                    }
                    DropTarget::CustomCostume => {
                        // The selector may have been left while decoding
                        if self.workflow.step() == WorkflowStep::SelectCostume {
                            let costume =
                                catalog::custom_costume(&ingested.file_name, ingested.image, self.workflow.ids_mut());
                            self.status = format!("Custom costume: {}", costume.name);
                            self.picker.select(costume);
                        }
                    }
                }
                Task::none()
            }
            Message::Ingested(_, Err(e)) => {
                let title = if e.is_validation() { "Upload rejected" } else { "Upload failed" };
                self.notify(title, &e.to_string());
                Task::none()
            }
            Message::ClearPhoto => {
                self.workflow.clear_photo();
                self.picker.reset();
                Task::none()
            }
            Message::SelectCostume(id) => {
                if let Some(costume) = catalog::find(&id) {
                    self.picker.select(costume);
                }
                Task::none()
            }
            Message::Transform => {
                let Some(costume) = self.picker.selected().cloned() else {
                    return Task::none();
                };
                match self.workflow.select_costume_and_transform(costume) {
                    Some(request) => {
                        self.close_camera();
                        self.picker.reset();
                        self.processing_tick = 0;
                        self.status = format!("Transforming into {}...", request.costume.name);
                        Task::perform(request.execute(self.service.clone()), Message::TransformFinished)
                    }
                    None => Task::none(),
                }
            }
            Message::TransformFinished(outcome) => {
                if self.workflow.finish(outcome) {
                    self.status = match self.workflow.error() {
                        Some(error) => format!("Transformation failed: {}", error),
                        None => "✅ Transformation complete!".to_string(),
                    };
                }
                Task::none()
            }
            Message::StartNew => {
                self.workflow.start_new();
                self.picker.reset();
                self.status = "Ready. Upload a photo to begin.".to_string();
                Task::none()
            }
            Message::DismissError => {
                self.workflow.dismiss_error();
                Task::none()
            }
            Message::OpenCamera => {
                if self.camera.is_none() {
                    match CameraSession::open(&NativeCamera) {
                        Ok(session) => self.camera = Some(session),
                        Err(e) => self.notify("Camera unavailable", &e.to_string()),
                    }
                }
                Task::none()
            }
            Message::CameraTick => {
                if let Some(session) = self.camera.as_mut() {
                    match session.preview() {
                        Ok(Some(frame)) => self.camera_frame = Some(frame),
                        Ok(None) => {}
                        Err(e) => {
                            self.close_camera();
                            self.notify("Camera unavailable", &e.to_string());
                        }
                    }
                }
                Task::none()
            }
            Message::CapturePhoto => {
                self.camera_frame = None;
                if let Some(session) = self.camera.take() {
                    match session.capture() {
                        Ok(still) => {
                            if self.workflow.upload_photo(still) {
                                self.status = "Photo captured from camera".to_string();
                            }
                        }
                        Err(e) => self.notify("Capture failed", &e.to_string()),
                    }
                }
                Task::none()
            }
            Message::CancelCamera => {
                self.close_camera();
                Task::none()
            }
            Message::ThumbnailLoaded(id, Ok(bytes)) => {
                self.thumbnails.insert(id, Handle::from_bytes(bytes));
                Task::none()
            }
            Message::ThumbnailLoaded(id, Err(e)) => {
                tracing::debug!("No artwork for {}: {}", id, e);
                Task::none()
            }
            Message::ProcessingTick => {
                self.processing_tick = self.processing_tick.wrapping_add(1);
                Task::none()
            }
            Message::DownloadResult => {
                let Some(transformation) = self.workflow.last_transformation() else {
                    return Task::none();
                };
                let file = FileDialog::new()
                    .set_title("Save Transformation")
                    .set_file_name(ui::result::download_name(transformation))
                    .save_file();

                match file {
                    Some(path) => {
                        let bytes = transformation.result_image.bytes().to_vec();
                        Task::perform(save_result(path, bytes), Message::Downloaded)
                    }
                    None => Task::none(),
                }
            }
            Message::Downloaded(Ok(path)) => {
                self.status = format!("💾 Saved to {}", path.display());
                Task::none()
            }
            Message::Downloaded(Err(e)) => {
                self.notify("Save failed", &e);
                Task::none()
            }
            Message::ToggleTheme => {
                if let Err(e) = self.settings.toggle_theme() {
                    tracing::warn!("⚠️  Could not persist theme: {}", e);
                }
                Task::none()
            }
        }
    }

    /// Show the native picker and ingest the chosen file
    fn browse(&mut self, target: DropTarget) -> Task<Message> {
        let title = match target {
            DropTarget::Photo => "Select Your Photo",
            DropTarget::CustomCostume => "Select a Costume Image",
        };
        let file = FileDialog::new()
            .set_title(title)
            .add_filter("Images", &ingest::PICKER_EXTENSIONS)
            .pick_file();

        match file {
            Some(path) => self.ingest_path(path, target),
            None => Task::none(),
        }
    }

    fn ingest_path(&mut self, path: PathBuf, target: DropTarget) -> Task<Message> {
        let raw = match RawFile::from_path(&path) {
            Ok(raw) => raw,
            Err(e) => {
                self.notify("Upload failed", &e.to_string());
                return Task::none();
            }
        };

        // Reject before reading anything
        if let Err(e) = ingest::validate(&raw) {
            self.notify("Upload rejected", &e.to_string());
            return Task::none();
        }

        self.status = format!("Loading {}...", raw.name);
        Task::perform(ingest::ingest(raw), move |result| Message::Ingested(target, result))
    }

    fn close_camera(&mut self) {
        if let Some(session) = self.camera.take() {
            session.cancel();
        }
        self.camera_frame = None;
    }

    /// Transient user-facing alert
    fn notify(&mut self, title: &str, message: &str) {
        tracing::warn!("{}: {}", title, message);
        self.status = message.to_string();
        let _ = MessageDialog::new()
            .set_level(MessageLevel::Warning)
            .set_title(title)
            .set_description(message)
            .show();
    }

    /// Build the user interface
    fn view(&self) -> Element<'_, Message> {
        let theme_label = match self.settings.theme {
            ThemeChoice::Dark => "☀ Light",
            ThemeChoice::Light => "☾ Dark",
        };

        let header = row![
            text("Cosplay Studio").size(28),
            Space::with_width(Length::Fill),
            button(theme_label).on_press(Message::ToggleTheme).style(button::secondary),
        ]
        .align_y(Alignment::Center);

        let mut content = column![header].spacing(20).padding(24);

        if let Some(error) = self.workflow.error() {
            let banner = container(
                row![
                    text(format!("Error: {}", error)).size(15),
                    Space::with_width(Length::Fill),
                    button("Dismiss").on_press(Message::DismissError).style(button::danger),
                ]
                .align_y(Alignment::Center)
                .spacing(12),
            )
            .padding(12)
            .width(Length::Fill)
            .style(container::rounded_box);
            content = content.push(banner);
        }

        let body: Element<Message> = match self.workflow.step() {
            // Upload never becomes active; the selector hosts uploading
            WorkflowStep::Upload | WorkflowStep::SelectCostume => ui::selector::view(
                &self.workflow,
                SelectorContext {
                    picker: &self.picker,
                    thumbnails: &self.thumbnails,
                    camera_frame: self.camera_frame.as_ref(),
                    camera_open: self.camera.as_ref().is_some_and(CameraSession::is_open),
                    drop_hover: self.drop_hover,
                },
            ),
            WorkflowStep::Processing => {
                ui::processing::view(self.workflow.selected_costume(), &self.thumbnails, self.processing_tick)
            }
            WorkflowStep::Result => match self.workflow.last_transformation() {
                Some(transformation) => ui::result::view(transformation),
                None => text("Nothing to show yet.").into(),
            },
        };

        content = content
            .push(container(body).width(Length::Fill).height(Length::Fill).center_x(Length::Fill))
            .push(text(&self.status).size(13));

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn subscription(&self) -> Subscription<Message> {
        let mut subscriptions = vec![event::listen_with(window_event)];

        if self.camera.is_some() {
            subscriptions.push(time::every(CAMERA_FRAME_INTERVAL).map(|_| Message::CameraTick));
        }
        if self.workflow.step() == WorkflowStep::Processing {
            subscriptions.push(
                time::every(Duration::from_millis(ui::processing::MESSAGE_INTERVAL_MS)).map(|_| Message::ProcessingTick),
            );
        }

        Subscription::batch(subscriptions)
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        match self.settings.theme {
            ThemeChoice::Dark => Theme::Dark,
            ThemeChoice::Light => Theme::Light,
        }
    }
}

/// Window-level drag and drop
fn window_event(event: Event, _status: event::Status, _window: window::Id) -> Option<Message> {
    match event {
        Event::Window(window::Event::FileDropped(path)) => Some(Message::FileDropped(path)),
        Event::Window(window::Event::FileHovered(_)) => Some(Message::FileHovered),
        Event::Window(window::Event::FilesHoveredLeft) => Some(Message::FileHoverLeft),
        _ => None,
    }
}

/// Write a result image to the path the user picked
async fn save_result(path: PathBuf, bytes: Vec<u8>) -> Result<PathBuf, String> {
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
    Ok(path)
}

fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn main() -> iced::Result {
    init_tracing();

    iced::application("Cosplay Studio", CosplayStudio::update, CosplayStudio::view)
        .theme(CosplayStudio::theme)
        .subscription(CosplayStudio::subscription)
        .centered()
        .run_with(CosplayStudio::new)
}
