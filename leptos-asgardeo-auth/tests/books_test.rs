use assertr::prelude::*;
use leptos::prelude::Get;
use leptos_asgardeo_auth::url::Url;
use leptos_asgardeo_auth::{
    ApiError, ApiGateway, BookApi, BookDraft, BookStore, Credentials, GatewayContext, RetryPolicy,
    SharedEpoch,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

mod backend;
use backend::{MockBackend, VALID_TOKEN};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

struct TestGateway {
    gateway: ApiGateway,
    epoch: SharedEpoch,
    unauthorized_reports: Arc<AtomicU32>,
}

fn gateway_with_token(api_base: Url, token: &'static str) -> TestGateway {
    let epoch = SharedEpoch::default();
    let unauthorized_reports = Arc::new(AtomicU32::new(0));
    let reports = unauthorized_reports.clone();
    let ctx = GatewayContext {
        api_base,
        credentials: Credentials::Bearer(Arc::new(move || Some(token.to_owned()))),
        epoch: epoch.clone(),
        on_unauthorized: Arc::new(move || {
            reports.fetch_add(1, Ordering::SeqCst);
        }),
    };
    TestGateway {
        gateway: ApiGateway::new(leptos_asgardeo_auth::reqwest::Client::new(), ctx),
        epoch,
        unauthorized_reports,
    }
}

fn draft(title: &str, author: &str) -> BookDraft {
    BookDraft {
        title: title.to_owned(),
        author: author.to_owned(),
        isbn: None,
    }
}

#[tokio::test]
async fn books_crud_reflects_backend_state() -> anyhow::Result<()> {
    init_tracing();
    let backend = MockBackend::start().await;
    let tg = gateway_with_token(backend.url.clone(), VALID_TOKEN);
    let api = BookApi::new(tg.gateway);

    assert_that(api.list().await?).is_empty();

    let dune = api.create(&draft("Dune", "Frank Herbert")).await?;
    assert_that(dune.id.as_str()).is_not_empty();
    assert_that(dune.title.as_str()).is_equal_to("Dune");

    let hobbit = api.create(&draft("The Hobbit", "J.R.R. Tolkien")).await?;

    let mut titles = api
        .list()
        .await?
        .into_iter()
        .map(|it| it.title)
        .collect::<Vec<_>>();
    titles.sort();
    assert_that(titles).is_equal_to(vec!["Dune".to_owned(), "The Hobbit".to_owned()]);

    api.delete(&dune.id).await?;
    let remaining = api.list().await?;
    assert_that(remaining.len()).is_equal_to(1);
    assert_that(remaining[0].id.as_str()).is_equal_to(hobbit.id.as_str());

    assert_that(tg.unauthorized_reports.load(Ordering::SeqCst)).is_equal_to(0);
    Ok(())
}

#[tokio::test]
async fn deleting_a_missing_book_surfaces_the_server_message() -> anyhow::Result<()> {
    init_tracing();
    let backend = MockBackend::start().await;
    backend.seed("Dune", "Frank Herbert");
    let tg = gateway_with_token(backend.url.clone(), VALID_TOKEN);
    let api = BookApi::new(tg.gateway);

    let result = api.delete("no-such-id").await;
    match result {
        Err(ApiError::RequestFailed { status, message }) => {
            assert_that(status.as_u16()).is_equal_to(404);
            assert_that(message).is_equal_to(Some("Book not found".to_owned()));
        }
        other => panic!("Expected RequestFailed, got {other:?}"),
    }

    // The failed delete must not have changed anything.
    assert_that(backend.titles()).is_equal_to(vec!["Dune".to_owned()]);
    Ok(())
}

#[tokio::test]
async fn concurrent_unauthorized_responses_report_exactly_once() {
    init_tracing();
    let backend = MockBackend::start().await;
    let tg = gateway_with_token(backend.url.clone(), "expired-token");
    let api = BookApi::new(tg.gateway);

    let (a, b) = tokio::join!(api.list(), api.list());

    assert_that(matches!(a, Err(ApiError::AuthRequired))).is_true();
    assert_that(matches!(b, Err(ApiError::AuthRequired))).is_true();
    assert_that(tg.unauthorized_reports.load(Ordering::SeqCst)).is_equal_to(1);

    // The epoch moved on, so a request from the NEW session may report again.
    let c = api.list().await;
    assert_that(matches!(c, Err(ApiError::AuthRequired))).is_true();
    assert_that(tg.unauthorized_reports.load(Ordering::SeqCst)).is_equal_to(2);
}

#[tokio::test]
async fn retry_policy_recovers_from_transient_server_errors() -> anyhow::Result<()> {
    init_tracing();
    let backend = MockBackend::start().await;
    backend.set_flaky_failures(2);
    let tg = gateway_with_token(backend.url.clone(), VALID_TOKEN);
    let gateway = tg.gateway;

    let policy = RetryPolicy::new(3, Duration::from_millis(1));
    let value: serde_json::Value = policy
        .run(tokio::time::sleep, || gateway.get("flaky"))
        .await?;
    assert_that(value["ok"].as_bool()).is_equal_to(Some(true));
    Ok(())
}

#[tokio::test]
async fn retry_policy_gives_up_after_the_attempt_budget() {
    init_tracing();
    let backend = MockBackend::start().await;
    backend.set_flaky_failures(10);
    let tg = gateway_with_token(backend.url.clone(), VALID_TOKEN);
    let gateway = tg.gateway;

    let policy = RetryPolicy::new(2, Duration::from_millis(1));
    let result: Result<serde_json::Value, _> =
        policy.run(tokio::time::sleep, || gateway.get("flaky")).await;
    match result {
        Err(ApiError::RequestFailed { status, .. }) => {
            assert_that(status.as_u16()).is_equal_to(502);
        }
        other => panic!("Expected RequestFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    init_tracing();
    // Nothing listens here.
    let tg = gateway_with_token(Url::parse("http://127.0.0.1:9").unwrap(), VALID_TOKEN);
    let api = BookApi::new(tg.gateway);

    let result = api.list().await;
    match result {
        Err(err @ ApiError::Network { .. }) => {
            assert_that(err.is_transient()).is_true();
        }
        other => panic!("Expected Network, got {other:?}"),
    }
    assert_that(tg.unauthorized_reports.load(Ordering::SeqCst)).is_equal_to(0);
}

#[tokio::test]
async fn book_store_round_trip() -> anyhow::Result<()> {
    init_tracing();
    let backend = MockBackend::start().await;
    let tg = gateway_with_token(backend.url.clone(), VALID_TOKEN);
    let api = BookApi::new(tg.gateway);
    let store = BookStore::new(tg.epoch.clone());

    store.refresh(&api).await;
    assert_that(store.books().get()).is_equal_to(Some(Vec::new()));
    assert_that(store.busy().get()).is_false();

    store.create(&api, draft("Dune", "Frank Herbert")).await;
    let books = store.books().get().unwrap();
    assert_that(books.len()).is_equal_to(1);
    assert_that(books[0].title.as_str()).is_equal_to("Dune");
    assert_that(books[0].id.as_str()).is_not_empty();
    assert_that(store.notice().get()).is_equal_to(Some("Added 'Dune'.".to_owned()));

    store.delete(&api, &books[0].id).await;
    assert_that(store.books().get()).is_equal_to(Some(Vec::new()));
    assert_that(store.last_error().get()).is_equal_to(None);
    Ok(())
}

#[tokio::test]
async fn book_store_keeps_list_on_failed_mutation() {
    init_tracing();
    let backend = MockBackend::start().await;
    backend.seed("Dune", "Frank Herbert");
    let tg = gateway_with_token(backend.url.clone(), VALID_TOKEN);
    let api = BookApi::new(tg.gateway);
    let store = BookStore::new(tg.epoch.clone());

    store.refresh(&api).await;
    let before = store.books().get();
    assert_that(before.as_ref().map(Vec::len)).is_equal_to(Some(1));

    store.delete(&api, "no-such-id").await;
    assert_that(store.books().get()).is_equal_to(before);
    assert_that(store.last_error().get()).is_equal_to(Some("Book not found".to_owned()));
    assert_that(store.busy().get()).is_false();
}

#[tokio::test]
async fn book_store_clears_cache_on_failed_refresh() {
    init_tracing();
    let backend = MockBackend::start().await;
    backend.seed("Dune", "Frank Herbert");
    let tg = gateway_with_token(backend.url.clone(), VALID_TOKEN);
    let api = BookApi::new(tg.gateway);
    let store = BookStore::new(tg.epoch.clone());

    store.refresh(&api).await;
    assert_that(store.books().get().is_some()).is_true();

    // The backend goes away; the next refresh must not keep showing the stale list.
    drop(backend);
    store.refresh(&api).await;
    assert_that(store.books().get()).is_equal_to(None);
    assert_that(store.last_error().get().is_some()).is_true();
    assert_that(store.busy().get()).is_false();
}

#[tokio::test]
async fn signing_out_discards_an_in_flight_refresh() -> anyhow::Result<()> {
    init_tracing();
    let backend = MockBackend::start().await;
    backend.seed("Dune", "Frank Herbert");
    backend.set_list_delay(Duration::from_millis(200));
    let tg = gateway_with_token(backend.url.clone(), VALID_TOKEN);
    let api = BookApi::new(tg.gateway);
    let store = BookStore::new(tg.epoch.clone());

    let refresh = {
        let store = store.clone();
        let api = api.clone();
        tokio::spawn(async move { store.refresh(&api).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    // The user signs out while the refresh is still in flight.
    tg.epoch.advance();
    refresh.await?;

    // The response arrived under the old epoch and must not leak into the new session.
    assert_that(store.books().get()).is_equal_to(None);
    assert_that(store.last_error().get()).is_equal_to(None);
    assert_that(store.busy().get()).is_false();

    // A refresh under the NEW epoch applies normally.
    backend.set_list_delay(Duration::ZERO);
    store.refresh(&api).await;
    assert_that(store.books().get().map(|it| it.len())).is_equal_to(Some(1));
    Ok(())
}

#[tokio::test]
async fn health_probe_round_trips() -> anyhow::Result<()> {
    init_tracing();
    let backend = MockBackend::start().await;
    let tg = gateway_with_token(backend.url.clone(), VALID_TOKEN);

    let value = tg.gateway.health().await?;
    assert_that(value["status"].as_str()).is_equal_to(Some("ok"));
    Ok(())
}

#[tokio::test]
async fn book_store_goes_quiet_when_the_session_ends() {
    init_tracing();
    let backend = MockBackend::start().await;
    backend.seed("Dune", "Frank Herbert");
    let tg = gateway_with_token(backend.url.clone(), "expired-token");
    let api = BookApi::new(tg.gateway);
    let store = BookStore::new(tg.epoch.clone());

    store.refresh(&api).await;

    // AuthRequired clears the cache but leaves messaging to the session manager.
    assert_that(store.books().get()).is_equal_to(None);
    assert_that(store.last_error().get()).is_equal_to(None);
    assert_that(tg.unauthorized_reports.load(Ordering::SeqCst)).is_equal_to(1);
}
