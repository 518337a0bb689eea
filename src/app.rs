use crate::api::{Credentials, SaveRequest, SavedPlot};
use crate::client::Backend;
use crate::config::Config;
use crate::error::{InputError, RenderError};
use crate::evaluator::MathEvaluator;
use crate::graph::{ImageFormat, Plot, PlotLayout, RenderOptions, Renderer, Trace};
use crate::i18n::{Language, Translations};
use crate::keyboard::ExpressionField;
use crate::plot_input::PlotRequest;
use crate::sampler::build_series;
use log::{debug, error, info, warn};

/// Messages shown to the user once an operation finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alert {
    ExpressionRequired,
    Saved,
    SaveFailed,
    SaveError,
    CredentialsRequired,
    Registered,
    RegisterFailed,
    LoggedIn,
    LoginFailed,
    LogoutFailed,
}

impl Alert {
    /// Translation key of the message
    pub fn key(&self) -> &'static str {
        match self {
            Alert::ExpressionRequired => "alert.expression_required",
            Alert::Saved => "alert.saved",
            Alert::SaveFailed => "alert.save_failed",
            Alert::SaveError => "alert.save_error",
            Alert::CredentialsRequired => "alert.credentials_required",
            Alert::Registered => "alert.registered",
            Alert::RegisterFailed => "alert.register_failed",
            Alert::LoggedIn => "alert.logged_in",
            Alert::LoginFailed => "alert.login_failed",
            Alert::LogoutFailed => "alert.logout_failed",
        }
    }

    /// Text used when no translation is loaded
    pub fn fallback(&self) -> &'static str {
        match self {
            Alert::ExpressionRequired => "Expression required",
            Alert::Saved => "Saved",
            Alert::SaveFailed => "Save failed",
            Alert::SaveError => "Save error",
            Alert::CredentialsRequired => "username/password required",
            Alert::Registered => "registered",
            Alert::RegisterFailed => "register failed",
            Alert::LoggedIn => "logged in",
            Alert::LoginFailed => "login failed",
            Alert::LogoutFailed => "logout failed",
        }
    }
}

/// What the session panel shows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionView {
    #[default]
    LoggedOut,
    LoggedIn { username: String },
}

/// The plotting page: form state plus the handlers bound to its buttons.
///
/// Pinned expressions are drawn over every later plot, on the same domain
/// as the expression field. Sampling is delegated to [`build_series`], drawing to a [`Renderer`] and
/// every server call to a [`Backend`]. Handlers run one at a time and await
/// each request before the next, so a later refresh always reflects the
/// outcome of the call before it.
pub struct PlotApp<B: Backend, R: Renderer> {
    backend: B,
    renderer: R,
    evaluator: MathEvaluator,
    translations: Translations,
    config: Config,
    layout: PlotLayout,

    pub expression: ExpressionField,
    pub xmin: String,
    pub xmax: String,
    pub samples: String,
    pub username: String,
    pub password: String,

    language: Language,
    session: SessionView,
    saved: Vec<SavedPlot>,
    pinned: Vec<String>,
    plot: Option<Plot>,
}

impl<B: Backend, R: Renderer> PlotApp<B, R> {
    /// Creates the page with the configured initial expression and empty
    /// bound fields (so the defaults apply). Nothing is plotted or fetched
    /// until [`PlotApp::startup`].
    pub fn new(backend: B, renderer: R, translations: Translations, config: Config) -> Self {
        let expression = ExpressionField::new(&config.initial_expression);
        let language = config.language;
        PlotApp {
            backend,
            renderer,
            evaluator: MathEvaluator,
            translations,
            config,
            layout: PlotLayout::default(),
            expression,
            xmin: String::new(),
            xmax: String::new(),
            samples: String::new(),
            username: String::new(),
            password: String::new(),
            language,
            session: SessionView::default(),
            saved: Vec::new(),
            pinned: Vec::new(),
            plot: None,
        }
    }

    /// Replaces the layout used for every later plot
    pub fn with_layout(mut self, layout: PlotLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Plots the initial expression and loads the session and saved list.
    pub async fn startup(&mut self) -> Option<Alert> {
        let alert = self.plot();
        self.refresh_current_user().await;
        self.refresh_saved().await;
        alert
    }

    /// Samples the expression field, then every pinned expression, over the
    /// requested domain and renders them together.
    pub fn plot(&mut self) -> Option<Alert> {
        let request = match PlotRequest::from_fields(
            self.expression.value(),
            &self.xmin,
            &self.xmax,
            &self.samples,
            &self.config.defaults,
        ) {
            Ok(request) => request,
            Err(e) => {
                debug!("plot request rejected: {}", e);
                return Some(Alert::ExpressionRequired);
            }
        };

        let expressions = std::iter::once(&request.expression)
            .chain(self.pinned.iter().filter(|pin| **pin != request.expression));
        let traces: Vec<Trace> = expressions
            .enumerate()
            .map(|(index, expression)| {
                let series = build_series(
                    &self.evaluator,
                    expression,
                    request.xmin,
                    request.xmax,
                    request.samples,
                );
                debug!(
                    "sampled '{}' over [{}, {}]: {} points, {} unplottable",
                    expression,
                    request.xmin,
                    request.xmax,
                    series.len(),
                    series.unplottable_count()
                );
                Trace::nth(series, index)
            })
            .collect();

        match self.renderer.render(
            traces,
            self.layout.clone(),
            RenderOptions::default(),
        ) {
            Ok(plot) => self.plot = Some(plot),
            Err(e) => error!("failed to render '{}': {}", request.expression, e),
        }
        None
    }

    /// Keeps the expression field's text on the plot and replots.
    ///
    /// Pinning an expression twice has no further effect.
    pub fn pin(&mut self) -> Option<Alert> {
        let expr = self.expression.value().trim();
        if expr.is_empty() {
            return Some(Alert::ExpressionRequired);
        }
        if !self.pinned.iter().any(|pin| pin == expr) {
            info!("pinned '{}'", expr);
            self.pinned.push(expr.to_string());
        }
        self.plot()
    }

    /// Drops every pinned expression and replots the field alone
    pub fn clear_pins(&mut self) -> Option<Alert> {
        self.pinned.clear();
        self.plot()
    }

    /// Pinned expressions numbered from `F1`, in pinning order
    pub fn pinned_lines(&self) -> Vec<String> {
        self.pinned
            .iter()
            .enumerate()
            .map(|(i, expr)| format!("F{}: {}", i + 1, expr))
            .collect()
    }

    pub fn pinned(&self) -> &[String] {
        &self.pinned
    }

    /// Exports the current plot and stores it on the server under the
    /// expression field's text.
    pub async fn save(&mut self) -> Alert {
        let expr = self.expression.value().trim().to_string();
        if expr.is_empty() {
            return Alert::ExpressionRequired;
        }

        let image = match self.export_current(ImageFormat::Png) {
            Ok(image) => image,
            Err(e) => {
                error!("failed to export plot: {}", e);
                return Alert::SaveError;
            }
        };

        match self.backend.save(&SaveRequest { expr, image }).await {
            Ok(ack) if ack.ok => {
                info!("plot saved");
                self.refresh_saved().await;
                Alert::Saved
            }
            Ok(ack) => {
                warn!("save rejected: {}", ack.error.as_deref().unwrap_or("no reason given"));
                Alert::SaveFailed
            }
            Err(e) => {
                error!("save request failed: {}", e);
                Alert::SaveError
            }
        }
    }

    pub async fn register(&mut self) -> Alert {
        let credentials = match self.credentials() {
            Ok(credentials) => credentials,
            Err(_) => return Alert::CredentialsRequired,
        };

        match self.backend.register(&credentials).await {
            Ok(ack) if ack.ok => {
                info!("registered '{}'", credentials.username);
                Alert::Registered
            }
            Ok(ack) => {
                warn!("registration rejected: {}", ack.error.as_deref().unwrap_or("no reason given"));
                Alert::RegisterFailed
            }
            Err(e) => {
                error!("register request failed: {}", e);
                Alert::RegisterFailed
            }
        }
    }

    /// Logs in and, on success, reloads the session panel and saved list.
    pub async fn login(&mut self) -> Alert {
        let credentials = match self.credentials() {
            Ok(credentials) => credentials,
            Err(_) => return Alert::CredentialsRequired,
        };

        match self.backend.login(&credentials).await {
            Ok(ack) if ack.ok => {
                info!("logged in as '{}'", credentials.username);
                self.refresh_current_user().await;
                self.refresh_saved().await;
                Alert::LoggedIn
            }
            Ok(ack) => {
                warn!("login rejected: {}", ack.error.as_deref().unwrap_or("no reason given"));
                Alert::LoginFailed
            }
            Err(e) => {
                error!("login request failed: {}", e);
                Alert::LoginFailed
            }
        }
    }

    pub async fn logout(&mut self) -> Option<Alert> {
        if let Err(e) = self.backend.logout().await {
            error!("logout request failed: {}", e);
            return Some(Alert::LogoutFailed);
        }
        self.refresh_current_user().await;
        self.refresh_saved().await;
        None
    }

    pub async fn refresh_current_user(&mut self) {
        match self.backend.current_user().await {
            Ok(user) => {
                self.session = match user.username.filter(|name| !name.is_empty()) {
                    Some(username) => SessionView::LoggedIn { username },
                    None => SessionView::LoggedOut,
                };
            }
            Err(e) => warn!("could not refresh current user: {}", e),
        }
    }

    pub async fn refresh_saved(&mut self) {
        match self.backend.list_saved().await {
            Ok(saved) => self.saved = saved,
            Err(e) => warn!("could not refresh saved plots: {}", e),
        }
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    /// Inserts the text of virtual key `index` into the expression field
    pub fn press_key(&mut self, index: usize) -> bool {
        self.expression.press_key(index)
    }

    /// Draws the current plot at the configured export size
    pub fn export_current(&self, format: ImageFormat) -> Result<String, RenderError> {
        let plot = self.plot.as_ref().ok_or_else(|| RenderError::Draw("nothing plotted yet".to_string()))?;
        self.renderer
            .export_image(plot, format, self.config.export_width, self.config.export_height)
    }

    /// Encoded image of the current plot at the configured export size
    pub fn rasterize_current(&self, format: ImageFormat) -> Result<Vec<u8>, RenderError> {
        let plot = self.plot.as_ref().ok_or_else(|| RenderError::Draw("nothing plotted yet".to_string()))?;
        self.renderer
            .rasterize(plot, format, self.config.export_width, self.config.export_height)
    }

    /// UI text for `key` in the selected language
    pub fn label<'a>(&'a self, key: &str, fallback: &'a str) -> &'a str {
        self.translations.text(self.language, key, fallback)
    }

    pub fn alert_text(&self, alert: Alert) -> &str {
        self.translations.text(self.language, alert.key(), alert.fallback())
    }

    /// Saved plots formatted one per line, as listed on the page
    pub fn saved_lines(&self) -> Vec<String> {
        self.saved.iter().map(ToString::to_string).collect()
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn session(&self) -> &SessionView {
        &self.session
    }

    pub fn saved(&self) -> &[SavedPlot] {
        &self.saved
    }

    pub fn current_plot(&self) -> Option<&Plot> {
        self.plot.as_ref()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn credentials(&self) -> Result<Credentials, InputError> {
        let username = self.username.trim();
        if username.is_empty() || self.password.is_empty() {
            return Err(InputError::MissingCredentials);
        }
        Ok(Credentials {
            username: username.to_string(),
            password: self.password.clone(),
        })
    }
}
