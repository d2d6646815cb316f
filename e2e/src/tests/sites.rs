use pdsls_redirect::{Outcome, Settings};
use serde_json::json;

use super::Upstream;

#[tokio::test]
async fn whtwnd_entry_found_by_title() {
    let up = Upstream::start(Settings::default());
    up.handle("writer.example", "did:plc:writer");
    up.did_document("did:plc:writer");
    let pages = up.server.mock(|when, then| {
        when.path("/xrpc/com.atproto.repo.listRecords")
            .query_param("repo", "did:plc:writer")
            .query_param("collection", "com.whtwnd.blog.entry");
        then.status(200).json_body(json!({
            "records": [
                {
                    "uri": "at://did:plc:writer/com.whtwnd.blog.entry/3aaa",
                    "value": { "title": "Something else" }
                },
                {
                    "uri": "at://did:plc:writer/com.whtwnd.blog.entry/3bbb",
                    "value": { "title": "Hello, AT Protocol" }
                }
            ]
        }));
    });

    assert_eq!(
        up.open("https://whtwnd.com/writer.example/entries/Hello%2C%20AT%20Protocol")
            .await
            .as_deref(),
        Some("https://pdsls.dev/at/did:plc:writer/com.whtwnd.blog.entry/3bbb")
    );
    pages.assert();

    // Unknown titles still land on the author's entries.
    assert_eq!(
        up.open("https://whtwnd.com/writer.example/entries/Gone")
            .await
            .as_deref(),
        Some("https://pdsls.dev/at/did:plc:writer/com.whtwnd.blog.entry")
    );
}

#[tokio::test]
async fn frontpage_comment_opens_submission() {
    let up = Upstream::start(Settings::default());
    up.handle("commenter.example", "did:plc:commenter");
    up.did_document("did:plc:commenter");
    up.server.mock(|when, then| {
        when.path("/xrpc/com.atproto.repo.getRecord")
            .query_param("collection", "fyi.unravel.frontpage.comment")
            .query_param("rkey", "3com");
        then.status(200).json_body(json!({
            "uri": "at://did:plc:commenter/fyi.unravel.frontpage.comment/3com",
            "cid": "bafycomment",
            "value": {
                "$type": "fyi.unravel.frontpage.comment",
                "content": "nice",
                "post": {
                    "cid": "bafypost",
                    "uri": "at://did:plc:author/fyi.unravel.frontpage.post/3sub"
                }
            }
        }));
    });

    assert_eq!(
        up.open("https://frontpage.fyi/comment/commenter.example/3com")
            .await
            .as_deref(),
        Some("https://pdsls.dev/at/did:plc:author/fyi.unravel.frontpage.post/3sub")
    );
}

#[tokio::test]
async fn skyview_unwraps_once_and_only_to_known_sites() {
    let up = Upstream::start(Settings::default());
    up.handle("alice.example", "did:plc:xyz");

    assert_eq!(
        up.open("https://skyview.social/?url=https%3A%2F%2Fbsky.app%2Fprofile%2Falice.example%2Fpost%2F3k2x")
            .await
            .as_deref(),
        Some("https://pdsls.dev/at/did:plc:xyz/app.bsky.feed.post/3k2x")
    );

    // Wrapped unknown host: the catch-all is not consulted, default page instead.
    assert_eq!(
        up.open("https://skyview.social/?url=https%3A%2F%2Fexample.org%2Fx")
            .await
            .as_deref(),
        Some("https://pdsls.dev")
    );

    // Two wrappers unwrap fine, a third exceeds the nesting limit.
    let twice = "https://skyview.social/?url=https%3A%2F%2Fskyview.social%2F%3Furl%3Dhttps%253A%252F%252Fbsky.app%252Fprofile%252Falice.example";
    assert_eq!(
        up.open(twice).await.as_deref(),
        Some("https://pdsls.dev/at/did:plc:xyz")
    );
    let thrice = "https://skyview.social/?url=https%3A%2F%2Fskyview.social%2F%3Furl%3Dhttps%253A%252F%252Fskyview.social%252F%253Furl%253Dhttps%25253A%25252F%25252Fbsky.app%25252Fprofile%25252Falice.example";
    let no_default = Settings {
        always_open: false,
        ..Settings::default()
    };
    assert_eq!(
        up.translator.translate_with(Some(thrice), &no_default).await,
        Outcome::Stay
    );
}

#[tokio::test]
async fn klearsky_and_camp_sites() {
    let up = Upstream::start(Settings::default());
    up.handle("alice.example", "did:plc:xyz");

    let cases = [
        (
            "https://klearsky.pages.dev/#/profile/feed-generators?account=alice.example",
            "https://pdsls.dev/at/did:plc:xyz/app.bsky.feed.generator",
        ),
        (
            "https://klearsky.pages.dev/#/post?uri=at://did:plc:xyz/app.bsky.feed.post/3k2x",
            "https://pdsls.dev/at/did:plc:xyz/app.bsky.feed.post/3k2x",
        ),
        (
            "https://atproto.camp/alice.example/3badge",
            "https://pdsls.dev/at/did:plc:xyz/blue.badge.collection/3badge",
        ),
        (
            "https://internect.info/did/did:plc:other",
            "https://pdsls.dev/at/did:plc:other",
        ),
    ];
    for (input, expected) in cases {
        assert_eq!(up.open(input).await.as_deref(), Some(expected), "{input}");
    }
}
