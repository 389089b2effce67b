use chrono::Utc;
use iced::widget::image::Handle;
use iced::widget::{button, column, container, pick_list, row, text, text_input};
use iced::{window, Alignment, Element, Length, Size, Subscription, Task, Theme};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod export;
mod media;
mod present;
mod state;
mod ui;
mod viewer;

use config::Config;
use media::embed;
use media::thumbnail::{full_image_handle, ThumbnailCache};
use present::{Detail, Gallery};
use state::collection::{Collection, DeleteRequest, SortOrder};
use state::data::{CoinId, NewCoin};
use state::library::Library;
use ui::form::{AddForm, FormAction, FormMessage};
use viewer::{select_backend, PreviewLifecycle, SessionHandle};

/// Initial window size
const WINDOW_SIZE: Size = Size::new(1200.0, 800.0);

/// Time given to the detail modal to lay out before the preview is built
const PREVIEW_START_DELAY: Duration = Duration::from_millis(50);

/// Window events the preview session listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PreviewEvent {
    Frames,
    Resizes,
}

/// Frames and resizes are only delivered while a scene is rendering
fn preview_events(preview: &PreviewLifecycle) -> &'static [PreviewEvent] {
    if preview.is_rendering() {
        &[PreviewEvent::Frames, PreviewEvent::Resizes]
    } else {
        &[]
    }
}

/// The open detail view
struct DetailState {
    coin_id: CoinId,
    /// Full-size photographs, decoded when the view opened
    images: Vec<Handle>,
    /// Session for the coin's 3D model, if it has one
    preview: Option<SessionHandle>,
}

/// Main application state
struct CoinCabinet {
    collection: Collection,
    thumbnails: ThumbnailCache,
    preview: PreviewLifecycle,
    form: AddForm,
    form_visible: bool,
    search: String,
    detail: Option<DetailState>,
    pending_delete: Option<DeleteRequest>,
    window_size: Size,
    /// Status message to display to the user
    status: String,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    ToggleForm,
    Form(FormMessage),
    /// Attachments finished embedding
    CoinEmbedded(Result<NewCoin, String>),
    SearchChanged(String),
    SortSelected(SortOrder),
    ViewCoin(CoinId),
    CloseDetail,
    RequestDelete(CoinId),
    ConfirmDelete,
    CancelDelete,
    /// The deferred preview start fired
    PreviewMount(SessionHandle),
    PreviewMeasured(SessionHandle, Size),
    Frame(Instant),
    WindowResized(Size),
    Orbit(f32, f32),
    Zoom(f32),
    DownloadModel,
    ModelDownloaded(Result<Option<PathBuf>, String>),
    ExportCatalog,
    CatalogExported(Result<Option<PathBuf>, String>),
}

impl CoinCabinet {
    fn new(config: Config) -> (Self, Task<Message>) {
        // The app cannot function without its database
        let library = Library::open(&config.db_path)
            .expect("Failed to open the collection database. Check permissions and disk space.");
        let collection =
            Collection::load(library).expect("Failed to read the collection database.");

        if let Some(path) = collection.library().path() {
            info!("📚 Library at {}", path.display());
        }

        let thumbnails = ThumbnailCache::for_coins(collection.iter());
        let preview = PreviewLifecycle::new(select_backend(config.disable_3d));

        info!(
            "🪙 Coin Cabinet initialized with {} coins, {} thumbnails ({} preview)",
            collection.len(),
            thumbnails.len(),
            preview.backend_name()
        );
        let status = format!("Ready. {} coins in the collection.", collection.len());

        (
            CoinCabinet {
                collection,
                thumbnails,
                preview,
                form: AddForm::default(),
                form_visible: false,
                search: String::new(),
                detail: None,
                pending_delete: None,
                window_size: WINDOW_SIZE,
                status,
            },
            Task::none(),
        )
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::ToggleForm => {
                self.form_visible = !self.form_visible;
                Task::none()
            }
            Message::Form(message) => match self.form.update(message) {
                FormAction::None => Task::none(),
                FormAction::Run(task) => task.map(Message::Form),
                FormAction::Submit(new_coin, attachments) => {
                    self.status = "Saving coin...".to_string();
                    Task::perform(
                        embed::embed_submission(new_coin, attachments),
                        Message::CoinEmbedded,
                    )
                }
                FormAction::Close => {
                    self.form_visible = false;
                    Task::none()
                }
            },
            Message::CoinEmbedded(Ok(new_coin)) => {
                match self.collection.add(new_coin) {
                    Ok(coin) => {
                        self.thumbnails.insert(coin);
                        self.status = format!("✅ Added {}.", coin.name);
                        self.form.reset();
                        self.form_visible = false;
                    }
                    Err(e) => {
                        warn!("⚠️  Failed to add coin: {}", e);
                        self.status = format!("⚠️  {}", e);
                        self.form.set_error(e.to_string());
                    }
                }
                Task::none()
            }
            Message::CoinEmbedded(Err(e)) => {
                warn!("⚠️  Failed to embed attachments: {}", e);
                self.form.set_error(e);
                Task::none()
            }
            Message::SearchChanged(search) => {
                self.search = search;
                Task::none()
            }
            Message::SortSelected(order) => {
                self.collection.sort(order);
                Task::none()
            }
            Message::ViewCoin(id) => self.open_detail(id),
            Message::CloseDetail => {
                self.close_detail();
                Task::none()
            }
            Message::RequestDelete(id) => {
                self.pending_delete = self.collection.request_delete(id);
                Task::none()
            }
            Message::ConfirmDelete => {
                let Some(request) = self.pending_delete.take() else {
                    return Task::none();
                };
                let id = request.id();

                match self.collection.confirm_delete(request) {
                    Ok(Some(coin)) => {
                        self.thumbnails.remove(id);
                        if self.detail.as_ref().is_some_and(|d| d.coin_id == id) {
                            self.close_detail();
                        }
                        self.status = format!("🗑️  Deleted {}.", coin.name);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!("⚠️  Failed to delete coin {}: {}", id, e);
                        self.status = format!("⚠️  {}", e);
                    }
                }
                Task::none()
            }
            Message::CancelDelete => {
                self.pending_delete = None;
                Task::none()
            }
            Message::PreviewMount(handle) => {
                if !handle.is_live() {
                    return Task::none();
                }
                debug!("Mounting preview session {}", handle.id());
                window::get_latest()
                    .and_then(window::get_size)
                    .map(move |size| Message::PreviewMeasured(handle.clone(), size))
            }
            Message::PreviewMeasured(handle, size) => {
                self.window_size = size;
                if let Err(e) = self
                    .preview
                    .activate(&handle, ui::detail::mount_viewport(size))
                {
                    debug!("Ignoring preview activation: {}", e);
                }
                Task::none()
            }
            Message::Frame(now) => {
                if let Some(handle) = self.preview_handle() {
                    self.preview.tick(&handle, now);
                }
                Task::none()
            }
            Message::WindowResized(size) => {
                self.window_size = size;
                if let Some(handle) = self.preview_handle() {
                    self.preview
                        .resize(&handle, ui::detail::mount_viewport(size));
                }
                Task::none()
            }
            Message::Orbit(dx, dy) => {
                self.preview.orbit(dx, dy);
                Task::none()
            }
            Message::Zoom(steps) => {
                self.preview.zoom(steps);
                Task::none()
            }
            Message::DownloadModel => {
                let Some(panel) = self.preview.fallback().cloned() else {
                    return Task::none();
                };

                Task::perform(
                    async move {
                        let Some(dir) = embed::pick_folder("Save 3D Model To").await else {
                            return Ok(None);
                        };
                        panel
                            .download_into(&dir)
                            .map(Some)
                            .map_err(|e| format!("Failed to save {}: {}", panel.filename, e))
                    },
                    Message::ModelDownloaded,
                )
            }
            Message::ModelDownloaded(result) | Message::CatalogExported(result) => {
                match result {
                    Ok(Some(path)) => self.status = format!("💾 Saved to {}", path.display()),
                    Ok(None) => {}
                    Err(e) => {
                        warn!("⚠️  {}", e);
                        self.status = format!("⚠️  {}", e);
                    }
                }
                Task::none()
            }
            Message::ExportCatalog => {
                let coins = self.collection.filter(&self.search);
                let html = export::render_catalog_page(&coins, Utc::now());
                info!("Exporting {} coins as HTML", coins.len());

                Task::perform(
                    embed::save_with_dialog("coin-collection.html".to_string(), html.into_bytes()),
                    Message::CatalogExported,
                )
            }
        }
    }

    /// Open the detail view, starting a preview session when the coin has a model
    fn open_detail(&mut self, id: CoinId) -> Task<Message> {
        self.close_detail();

        let Some(coin) = self.collection.get(id) else {
            return Task::none();
        };

        let images = coin
            .images
            .iter()
            .filter_map(|url| match full_image_handle(url) {
                Ok(handle) => Some(handle),
                Err(e) => {
                    warn!("⚠️  Skipping unreadable photo of {}: {}", coin.name, e);
                    None
                }
            })
            .collect();

        let mut detail = DetailState {
            coin_id: id,
            images,
            preview: None,
        };

        let mut task = Task::none();
        if let Some(model) = &coin.model_3d {
            match self.preview.start(model.clone()) {
                Ok(handle) => {
                    detail.preview = Some(handle.clone());
                    task = Task::perform(tokio::time::sleep(PREVIEW_START_DELAY), move |_| {
                        Message::PreviewMount(handle.clone())
                    });
                }
                Err(e) => warn!("⚠️  Could not start the 3D preview: {}", e),
            }
        }

        self.detail = Some(detail);
        task
    }

    /// Close the detail view and tear down its preview session
    fn close_detail(&mut self) {
        if let Some(detail) = self.detail.take() {
            if let Some(handle) = detail.preview {
                self.preview.stop(handle);
            }
        }
    }

    fn preview_handle(&self) -> Option<SessionHandle> {
        self.detail.as_ref().and_then(|detail| detail.preview.clone())
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let displayed = self.collection.filter(&self.search);
        let gallery = Gallery::project(&displayed);

        let header = row![
            text("Coin Cabinet").size(32),
            text(format!("{} coins", self.collection.len())).size(16),
        ]
        .spacing(16)
        .align_y(Alignment::Center);

        let toolbar = row![
            button(if self.form_visible { "Hide form" } else { "Add coin" })
                .on_press(Message::ToggleForm),
            text_input("Search coins...", &self.search)
                .on_input(Message::SearchChanged)
                .width(Length::Fill),
            pick_list(SortOrder::ALL, self.collection.sort_order(), Message::SortSelected).placeholder("Sort by..."),
            button("Export HTML")
                .style(button::secondary)
                .on_press(Message::ExportCatalog),
        ]
        .spacing(10)
        .align_y(Alignment::Center);

        let mut content = column![header, toolbar].spacing(16);
        if self.form_visible {
            content = content.push(self.form.view().map(Message::Form));
        }
        content = content
            .push(ui::grid::view(
                &gallery,
                &self.thumbnails,
                !self.search.is_empty() && !self.collection.is_empty(),
            ))
            .push(text(&self.status).size(14));

        let mut root: Element<Message> = container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .padding(20)
            .into();

        if let Some(detail) = &self.detail {
            if let Some(coin) = self.collection.get(detail.coin_id) {
                root = ui::modal::modal(
                    root,
                    ui::detail::view(
                        Detail::project(coin),
                        &detail.images,
                        &self.preview,
                        self.window_size,
                    ),
                    Message::CloseDetail,
                );
            }
        }

        if let Some(request) = &self.pending_delete {
            root = ui::modal::modal(
                root,
                ui::modal::confirm_delete(request),
                Message::CancelDelete,
            );
        }

        root
    }

    fn subscription(&self) -> Subscription<Message> {
        Subscription::batch(preview_events(&self.preview).iter().map(|event| match event {
            PreviewEvent::Frames => window::frames().map(Message::Frame),
            PreviewEvent::Resizes => {
                window::resize_events().map(|(_id, size)| Message::WindowResized(size))
            }
        }))
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn main() -> iced::Result {
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Coin Cabinet v{}", env!("CARGO_PKG_VERSION"));

    iced::application("Coin Cabinet", CoinCabinet::update, CoinCabinet::view)
        .theme(CoinCabinet::theme)
        .subscription(CoinCabinet::subscription)
        .window_size(WINDOW_SIZE)
        .centered()
        .run_with(move || CoinCabinet::new(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::MeshPayload;
    use crate::viewer::backend::{FallbackBackend, SceneBackend};
    use std::sync::Arc;

    fn triangle() -> MeshPayload {
        MeshPayload::from_bytes("coin.obj", "model/obj", b"v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n")
    }

    #[test]
    fn test_window_events_follow_the_active_session() {
        let mut preview = PreviewLifecycle::new(Arc::new(SceneBackend));
        assert!(preview_events(&preview).is_empty());

        let handle = preview.start(triangle()).unwrap();
        assert!(preview_events(&preview).is_empty());

        preview
            .activate(&handle, ui::detail::mount_viewport(WINDOW_SIZE))
            .unwrap();
        assert_eq!(
            preview_events(&preview),
            &[PreviewEvent::Frames, PreviewEvent::Resizes]
        );

        preview.stop(handle);
        assert!(preview_events(&preview).is_empty());
    }

    #[test]
    fn test_fallback_session_gets_no_window_events() {
        let mut preview = PreviewLifecycle::new(Arc::new(FallbackBackend));
        let handle = preview.start(triangle()).unwrap();
        preview
            .activate(&handle, ui::detail::mount_viewport(WINDOW_SIZE))
            .unwrap();

        assert!(preview.fallback().is_some());
        assert!(preview_events(&preview).is_empty());
    }
}
