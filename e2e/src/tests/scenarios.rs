use pdsls_redirect::{
    Did, Endpoints, Error, IdentityResolver, MemorySettingsStore, Outcome, PatternTable,
    RecordStore, RedirectHttpClient, Settings, Translator, patterns::GENERIC,
};
use serde_json::json;

use super::Upstream;

const POST_URL: &str = "https://bsky.app/profile/alice.example/post/3k2x";

#[tokio::test]
async fn bsky_post_to_viewer() {
    let up = Upstream::start(Settings::default());
    let resolve = up.handle("alice.example", "did:plc:xyz");

    assert_eq!(
        up.open(POST_URL).await.as_deref(),
        Some("https://pdsls.dev/at/did:plc:xyz/app.bsky.feed.post/3k2x")
    );
    resolve.assert();
}

#[tokio::test]
async fn bsky_post_to_thread_fetch() {
    let settings = Settings {
        get_post_thread: true,
        reply_count: 2,
        parent_count: 1,
        ..Settings::default()
    };
    let up = Upstream::start(settings.clone());
    up.handle("alice.example", "did:plc:xyz");

    assert_eq!(
        up.open(POST_URL).await,
        Some(format!(
            "{}/xrpc/app.bsky.feed.getPostThread?uri=at://did:plc:xyz/app.bsky.feed.post/3k2x&depth=2&parentHeight=1",
            up.base()
        ))
    );

    // Production endpoints, DID in the path so no lookup happens.
    let translator = Translator::with_client(
        &RedirectHttpClient::new().unwrap(),
        std::sync::Arc::new(MemorySettingsStore::new(settings)),
    );
    assert_eq!(
        translator
            .translate(Some("https://bsky.app/profile/did:plc:xyz/post/3k2x"))
            .await
            .url(),
        Some(
            "https://public.api.bsky.app/xrpc/app.bsky.feed.getPostThread?uri=at://did:plc:xyz/app.bsky.feed.post/3k2x&depth=2&parentHeight=1"
        )
    );
}

#[tokio::test]
async fn did_inputs_never_hit_the_network() {
    let up = Upstream::start(Settings::default());
    let any = up.server.mock(|when, then| {
        when.any_request();
        then.status(500);
    });
    let client = RedirectHttpClient::builder()
        .endpoints(
            Endpoints::new(&up.base(), &up.base(), "https://pdsls.dev").unwrap(),
        )
        .build()
        .unwrap();
    let identity = IdentityResolver::with_client(&client);

    for did in [
        "did:plc:xyz",
        "did:web:example.com",
        "did%3Aplc%3Axyz",
        "did:example:abc",
    ] {
        let resolved = identity.resolve_did(did).await.unwrap();
        assert!(resolved.as_str().starts_with("did:"), "{did}");
    }
    assert_eq!(
        identity.resolve_did("did:plc:xyz").await.unwrap().as_str(),
        "did:plc:xyz"
    );
    any.assert_hits(0);
}

#[tokio::test]
async fn empty_handle_is_absent_without_lookup() {
    let up = Upstream::start(Settings {
        always_open: false,
        ..Settings::default()
    });
    let any = up.server.mock(|when, then| {
        when.any_request();
        then.status(500);
    });

    assert!(matches!(
        IdentityResolver::with_client(&RedirectHttpClient::new().unwrap())
            .resolve_did("@")
            .await,
        Err(Error::InvalidHandle(_))
    ));
    assert_eq!(
        up.translator
            .translate(Some("at://@/app.bsky.feed.post/3k2x"))
            .await,
        Outcome::Stay
    );
    any.assert_hits(0);
}

#[tokio::test]
async fn same_input_same_output() {
    let up = Upstream::start(Settings::default());
    up.handle("alice.example", "did:plc:xyz");

    let first = up.open(POST_URL).await;
    let second = up.open(POST_URL).await;
    assert!(first.is_some());
    assert_eq!(first, second);
}

#[tokio::test]
async fn specific_entries_beat_the_fallback() {
    let table = PatternTable::global();
    let names: Vec<_> = table.entries().map(|p| p.name()).collect();
    assert_eq!(names.last(), Some(&GENERIC));

    let up = Upstream::start(Settings::default());
    up.handle("alice.example", "did:plc:xyz");
    for url in [
        POST_URL,
        "https://linkat.blue/alice.example",
        "https://smokesignal.events/alice.example",
    ] {
        let dispatched = up.translator.resolve(url, &Settings::default()).await.unwrap();
        assert_ne!(dispatched.entry, GENERIC, "{url}");
    }
}

#[tokio::test]
async fn locator_survives_viewer_round_trip() {
    let up = Upstream::start(Settings::default());
    let at = "at://did:example:abc/com.example.col/xyz123";

    let viewer = up.open(at).await.unwrap();
    assert_eq!(viewer, "https://pdsls.dev/at/did:example:abc/com.example.col/xyz123");

    // Feeding the viewer URL back reproduces the locator.
    assert_eq!(up.translator.at_uri(&viewer).await.as_deref(), Some(at));
    assert_eq!(up.open(&viewer).await, Some(viewer));
}

#[tokio::test]
async fn pds_fallback_toggles_generic_entry() {
    let up = Upstream::start(Settings::default());
    let url = "https://example.org/nothing";

    assert_eq!(
        up.open(url).await.as_deref(),
        Some("https://pdsls.dev/example.org")
    );

    up.store
        .apply_changes(json!({ "pdsFallback": false }).as_object().unwrap());
    assert_eq!(up.open(url).await.as_deref(), Some("https://pdsls.dev"));

    up.store.apply_changes(json!({ "alwaysOpen": false }).as_object().unwrap());
    assert_eq!(up.translator.translate(Some(url)).await, Outcome::Stay);
}

#[tokio::test]
async fn title_search_exhausts_three_pages() {
    let up = Upstream::start(Settings::default());

    let entry = |rkey: &str, title: &str| {
        json!({
            "uri": format!("at://did:plc:xyz/com.whtwnd.blog.entry/{rkey}"),
            "cid": "bafy",
            "value": { "title": title }
        })
    };
    let first = up.server.mock(|when, then| {
        when.path("/xrpc/com.atproto.repo.listRecords")
            .query_param_missing("cursor");
        then.status(200)
            .json_body(json!({ "records": [entry("1", "One")], "cursor": "c1" }));
    });
    let second = up.server.mock(|when, then| {
        when.path("/xrpc/com.atproto.repo.listRecords")
            .query_param("cursor", "c1");
        then.status(200)
            .json_body(json!({ "records": [entry("2", "Two")], "cursor": "c2" }));
    });
    let third = up.server.mock(|when, then| {
        when.path("/xrpc/com.atproto.repo.listRecords")
            .query_param("cursor", "c2");
        then.status(200)
            .json_body(json!({ "records": [entry("3", "Three")] }));
    });

    let did: Did = "did:plc:xyz".parse().unwrap();
    let pds = url::Url::parse(&up.base()).unwrap();
    let store = RecordStore::with_client(
        &RedirectHttpClient::builder()
            .endpoints(Endpoints::new(&up.base(), &up.base(), "https://pdsls.dev").unwrap())
            .build()
            .unwrap(),
    );
    assert!(matches!(
        store
            .find_record_by_title(&did, &pds, "com.whtwnd.blog.entry", "Missing")
            .await,
        Err(Error::NoRecordFound { .. })
    ));
    first.assert();
    second.assert();
    third.assert();
}
