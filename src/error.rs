use thiserror::Error;

/// Errors raised while parsing or evaluating an expression.
///
/// The sampler never propagates these: a failing sample becomes NaN.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("empty expression")]
    Empty,

    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("unexpected token '{found}' at position {pos}")]
    UnexpectedToken { found: String, pos: usize },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("undefined symbol '{0}'")]
    UndefinedSymbol(String),

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("function '{name}' expects {expected} argument(s), got {found}")]
    Arity {
        name: String,
        expected: &'static str,
        found: usize,
    },

    #[error("domain error: {0}")]
    Domain(&'static str),

    #[error("expression nested deeper than {0} levels")]
    TooDeep(usize),
}

/// Errors raised while turning form fields into a plot request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("expression required")]
    EmptyExpression,

    #[error("username and password required")]
    MissingCredentials,
}

/// Errors raised by a plot renderer.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid image size: {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    #[error("drawing failed: {0}")]
    Draw(String),

    #[cfg(feature = "web")]
    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Errors raised while talking to the plot server.
#[cfg(feature = "web")]
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid server url '{0}'")]
    InvalidUrl(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed response from {endpoint}: {source}")]
    Malformed {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}
