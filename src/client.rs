use crate::api::{
    Ack, CURRENT_USER_PATH, Credentials, CurrentUser, LIST_PATH, LOGIN_PATH, LOGOUT_PATH,
    REGISTER_PATH, SAVE_PATH, SaveRequest, SavedPlot,
};
use crate::error::ClientError;
use crate::i18n::{Dictionary, Language, Translations};
use log::{debug, warn};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// The plot server as seen by the client.
///
/// Every call is a single request; nothing is retried. Error statuses that
/// still carry a JSON body (a rejected login, say) are decoded normally and
/// only transport or decoding problems surface as `ClientError`.
#[allow(async_fn_in_trait)]
pub trait Backend {
    async fn dictionary(&self, language: Language) -> Result<Dictionary, ClientError>;

    async fn current_user(&self) -> Result<CurrentUser, ClientError>;

    async fn register(&self, credentials: &Credentials) -> Result<Ack, ClientError>;

    async fn login(&self, credentials: &Credentials) -> Result<Ack, ClientError>;

    async fn logout(&self) -> Result<(), ClientError>;

    async fn list_saved(&self) -> Result<Vec<SavedPlot>, ClientError>;

    async fn save(&self, request: &SaveRequest) -> Result<Ack, ClientError>;
}

/// HTTP implementation of [`Backend`].
///
/// The session lives in a cookie store owned by the inner client, so a
/// successful login is visible to every later request made through the same
/// `HttpBackend`.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base: Url,
    http: Client,
}

impl HttpBackend {
    /// Creates a client for the server at `base_url` (e.g. `http://127.0.0.1:5000`).
    ///
    /// A path in `base_url` is a mount point: `http://host/plots` and
    /// `http://host/plots/` both send logins to `http://host/plots/api/login`.
    ///
    /// # Errors
    /// * `ClientError::InvalidUrl` if `base_url` is not an absolute URL
    /// * `ClientError::Http` if the HTTP client cannot be built
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let mut base =
            Url::parse(base_url).map_err(|_| ClientError::InvalidUrl(base_url.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }
        if !base.path().ends_with('/') {
            let mount = format!("{}/", base.path());
            base.set_path(&mount);
        }
        let http = Client::builder().cookie_store(true).build()?;
        Ok(Self { base, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        // Joined as a relative reference so the mount point is kept
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|_| ClientError::InvalidUrl(format!("{}{}", self.base, path)))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = self.endpoint(path)?;
        debug!("GET {}", url);
        let response = self.http.get(url).send().await?;
        decode(path, response).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        debug!("POST {}", url);
        let response = self.http.post(url).json(body).send().await?;
        decode(path, response).await
    }
}

async fn decode<T: DeserializeOwned>(endpoint: &str, response: Response) -> Result<T, ClientError> {
    let status = response.status();
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|source| {
        warn!("{} answered {} with an undecodable body", endpoint, status);
        ClientError::Malformed {
            endpoint: endpoint.to_string(),
            source,
        }
    })
}

impl Backend for HttpBackend {
    async fn dictionary(&self, language: Language) -> Result<Dictionary, ClientError> {
        let path = language.dictionary_path();
        let url = self.endpoint(&path)?;
        debug!("GET {}", url);
        // A missing dictionary is an error here, not an empty body to decode
        let response = self.http.get(url).send().await?.error_for_status()?;
        decode(&path, response).await
    }

    async fn current_user(&self) -> Result<CurrentUser, ClientError> {
        self.get_json(CURRENT_USER_PATH).await
    }

    async fn register(&self, credentials: &Credentials) -> Result<Ack, ClientError> {
        self.post_json(REGISTER_PATH, credentials).await
    }

    async fn login(&self, credentials: &Credentials) -> Result<Ack, ClientError> {
        self.post_json(LOGIN_PATH, credentials).await
    }

    async fn logout(&self) -> Result<(), ClientError> {
        let url = self.endpoint(LOGOUT_PATH)?;
        debug!("POST {}", url);
        self.http.post(url).send().await?;
        Ok(())
    }

    async fn list_saved(&self) -> Result<Vec<SavedPlot>, ClientError> {
        self.get_json(LIST_PATH).await
    }

    async fn save(&self, request: &SaveRequest) -> Result<Ack, ClientError> {
        self.post_json(SAVE_PATH, request).await
    }
}

/// Fetches the dictionary of every supported language.
///
/// A language whose dictionary cannot be fetched gets an empty one, so the
/// UI falls back to its built-in text for it.
pub async fn load_translations<B: Backend>(backend: &B) -> Translations {
    let mut dictionaries = HashMap::new();

    for language in Language::ALL {
        let dictionary = match backend.dictionary(language).await {
            Ok(dictionary) => dictionary,
            Err(e) => {
                warn!("no translations for '{}': {}", language, e);
                Dictionary::new()
            }
        };
        dictionaries.insert(language, dictionary);
    }

    Translations::new(dictionaries)
}
