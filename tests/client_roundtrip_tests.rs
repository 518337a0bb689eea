#![cfg(feature = "web")]

mod common;

use funcplot::api::{Credentials, SaveRequest};
use funcplot::client::{Backend, HttpBackend, load_translations};
use funcplot::error::ClientError;
use funcplot::i18n::Language;

fn credentials(username: &str, password: &str) -> Credentials {
    Credentials {
        username: username.to_string(),
        password: password.to_string(),
    }
}

const TINY_PNG: &str = "data:image/png;base64,iVBORw0KGgo=";

#[tokio::test]
async fn save_then_list_round_trip() {
    let server = common::spawn_server().await;
    let backend = HttpBackend::new(&server.url).unwrap();
    let ana = credentials("ana", "secret");

    assert!(backend.register(&ana).await.unwrap().ok);
    assert!(backend.login(&ana).await.unwrap().ok);
    assert_eq!(
        backend.current_user().await.unwrap().username.as_deref(),
        Some("ana")
    );

    let ack = backend
        .save(&SaveRequest {
            expr: "sin(x)/x".to_string(),
            image: TINY_PNG.to_string(),
        })
        .await
        .unwrap();
    assert!(ack.ok);

    let saved = backend.list_saved().await.unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].expr, "sin(x)/x");
    assert_eq!(server.images_of("ana"), vec![TINY_PNG.to_string()]);
}

#[tokio::test]
async fn logout_clears_session_and_list() {
    let server = common::spawn_server().await;
    let backend = HttpBackend::new(&server.url).unwrap();
    let bia = credentials("bia", "pw");

    backend.register(&bia).await.unwrap();
    backend.login(&bia).await.unwrap();
    backend
        .save(&SaveRequest {
            expr: "x".to_string(),
            image: TINY_PNG.to_string(),
        })
        .await
        .unwrap();

    backend.logout().await.unwrap();
    assert_eq!(backend.current_user().await.unwrap().username, None);
    assert!(backend.list_saved().await.unwrap().is_empty());
}

#[tokio::test]
async fn rejections_decode_as_failed_acks() {
    let server = common::spawn_server().await;
    let backend = HttpBackend::new(&server.url).unwrap();

    let ack = backend.login(&credentials("nobody", "x")).await.unwrap();
    assert!(!ack.ok);
    assert_eq!(ack.error.as_deref(), Some("invalid"));

    backend.register(&credentials("ana", "one")).await.unwrap();
    let again = backend.register(&credentials("ana", "two")).await.unwrap();
    assert!(!again.ok);

    let save = backend
        .save(&SaveRequest {
            expr: "x".to_string(),
            image: TINY_PNG.to_string(),
        })
        .await
        .unwrap();
    assert!(!save.ok);
}

#[tokio::test]
async fn sessions_are_per_client() {
    let server = common::spawn_server().await;
    let first = HttpBackend::new(&server.url).unwrap();
    let second = HttpBackend::new(&server.url).unwrap();
    let ana = credentials("ana", "secret");

    first.register(&ana).await.unwrap();
    first.login(&ana).await.unwrap();

    assert_eq!(second.current_user().await.unwrap().username, None);
}

#[tokio::test]
async fn translations_are_loaded_for_every_language() {
    let server = common::spawn_server().await;
    let backend = HttpBackend::new(&server.url).unwrap();

    let translations = load_translations(&backend).await;
    for language in Language::ALL {
        assert!(translations.has_language(language), "language = {}", language);
    }
    assert_eq!(translations.text(Language::Pt, "plot", "Plot"), "Plotar");
    assert_eq!(translations.text(Language::En, "alert.saved", "?"), "Saved");
}

#[tokio::test]
async fn server_under_path_prefix() {
    let server = common::spawn_server_at("/plots").await;
    for url in [server.url.clone(), format!("{}/", server.url)] {
        let backend = HttpBackend::new(&url).unwrap();
        let ana = credentials("ana", "secret");

        backend.register(&ana).await.unwrap();
        assert!(backend.login(&ana).await.unwrap().ok);
        assert_eq!(
            backend.current_user().await.unwrap().username.as_deref(),
            Some("ana")
        );

        let translations = load_translations(&backend).await;
        assert_eq!(translations.text(Language::Pt, "plot", "Plot"), "Plotar");
    }
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    // Bind then drop a listener so the port is known to be closed
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let backend = HttpBackend::new(&url).unwrap();
    assert!(matches!(
        backend.current_user().await,
        Err(ClientError::Http(_))
    ));

    let translations = load_translations(&backend).await;
    assert!(!translations.has_language(Language::Pt));
    assert_eq!(translations.text(Language::Pt, "plot", "Plot"), "Plot");
}
