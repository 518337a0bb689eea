/*!
# Function Plotter Client

Samples mathematical expressions over an interval and plots them, with
per-user persistence of plots on a remote server.

## Overview

The core is a deterministic sampler: given an expression in `x`, a domain
and a sample count, it evaluates the expression at evenly spaced points and
returns an ordered series. Samples the expression cannot be evaluated at are
kept as NaN, so the series always has the requested length and the plotted
line shows a gap there.

Everything else is thin glue around that core:

- a small arithmetic evaluator for the expression language,
- the substitution rules that turn raw form fields into a plot request,
- a plotters-based renderer that draws a series and exports it as PNG/JPEG,
- an HTTP client for the plot server (session, saved plots, translations),
- a virtual keyboard that inserts function shortcuts at the cursor,
- a UI adapter wiring the page's buttons to the above.

## Modules

- **evaluator**: Expression parsing and evaluation (functions, constants, `^`)
- **sampler**: Uniform sampling of an expression into a series
- **plot_input**: Default substitution for bounds and sample count
- **config**: Environment-driven client configuration
- **i18n**: Languages and translation dictionaries
- **keyboard**: Virtual keyboard shortcuts and an editable expression field
- **api**: Request and response bodies of the plot server
- **client**: Backend trait and its HTTP implementation (`web` feature)
- **graph**: Plot rendering and image export (`web` feature)
- **app**: The plotting page's event handlers (`web` feature)

## Server endpoints used

- `GET /api/current_user`, `POST /api/register`, `POST /api/login`,
  `POST /api/logout` - session
- `GET /api/list`, `POST /save` - saved plots
- `GET /static/js/i18n_<lang>.json` - translation dictionaries
*/

pub mod api;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod i18n;
pub mod keyboard;
pub mod plot_input;
pub mod sampler;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod client;
#[cfg(feature = "web")]
pub mod graph;

pub use config::Config;
pub use error::{EvalError, InputError, RenderError};
pub use evaluator::{Evaluator, MathEvaluator};
pub use i18n::{Language, Translations};
pub use plot_input::PlotRequest;
pub use sampler::{Series, SeriesPoint, build_series};

#[cfg(feature = "web")]
pub use app::{Alert, PlotApp, SessionView};
#[cfg(feature = "web")]
pub use client::{Backend, HttpBackend};
#[cfg(feature = "web")]
pub use error::ClientError;
#[cfg(feature = "web")]
pub use graph::{ImageFormat, PlottersRenderer, Renderer};
