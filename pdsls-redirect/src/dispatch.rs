//! Dispatch engine: pattern table walk plus the per-site handlers.
//!
//! [`dispatch`] recognizes the URL, then runs the handler for the matched
//! [`SiteMatch`] variant. Handlers only build a [`Resolution`]; viewer vs. API
//! rendering and the no-match fallback belong to the output stage.

use serde_json::Value;

use crate::{
    constants::{Endpoints, nsid},
    cross_log,
    errors::{Error, Result},
    identity::{Did, IdentityResolver},
    locator::ResourceLocator,
    output::{Resolution, thread_url},
    patterns::{BskyPrefix, BskySuffix, PatternTable, SiteMatch},
    records::RecordStore,
    settings::Settings,
    util::decode_component,
};

/// How many times a wrapped URL may be unwrapped and dispatched again.
pub const MAX_DELEGATION_DEPTH: u8 = 2;

/// Everything a handler may consult during one translation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Context<'a> {
    pub identity: &'a IdentityResolver,
    pub records: &'a RecordStore,
    pub endpoints: &'a Endpoints,
    pub settings: &'a Settings,
}

/// Result of a successful dispatch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dispatched {
    /// Name of the pattern table entry that produced the result.
    pub entry: &'static str,
    /// What the URL resolved to.
    pub resolution: Resolution,
}

/// Recognize `url` and run the matching handler.
///
/// Nested dispatches (`depth > 0`) skip the catch-all entry: a wrapped URL
/// must belong to a supported site.
pub(crate) async fn dispatch(ctx: Context<'_>, url: &str, depth: u8) -> Result<Dispatched> {
    let table = PatternTable::global();
    let recognized = if depth == 0 {
        table.recognize(url)
    } else {
        table.recognize_specific(url)
    }
    .ok_or(Error::NoPatternMatch)?;

    cross_log!(info, "Match: {}", recognized.entry);
    let resolution = handle(ctx, recognized.entry, recognized.site, depth).await?;

    Ok(Dispatched {
        entry: recognized.entry,
        resolution,
    })
}

async fn handle(
    ctx: Context<'_>,
    entry: &'static str,
    site: SiteMatch,
    depth: u8,
) -> Result<Resolution> {
    match site {
        SiteMatch::AtUri {
            id,
            collection,
            rkey,
        }
        | SiteMatch::Viewer {
            id,
            collection,
            rkey,
        } => viewer(ctx, &id, collection.as_deref(), rkey.as_deref()).await,
        SiteMatch::ViewerPds { host } => Ok(Resolution::Pds(host)),
        SiteMatch::Bsky {
            prefix,
            handle,
            suffix,
            rkey,
        } => bsky(ctx, prefix, &handle, suffix, rkey).await,
        SiteMatch::Klearsky { kind, uri, account } => {
            klearsky(ctx, kind.as_deref(), uri.as_deref(), account.as_deref()).await
        }
        SiteMatch::WhiteWind {
            handle,
            title,
            rkey,
        } => whtwnd(ctx, &handle, title.as_deref(), rkey).await,
        SiteMatch::AtprotoBrowser { handle, rest } => {
            let did = ctx.identity.resolve_did(&handle).await?;
            let rest = rest.as_deref().map(decode_component).unwrap_or_default();
            let locator: ResourceLocator = format!("{did}/{rest}").parse()?;
            Ok(Resolution::Locator(locator))
        }
        SiteMatch::Clearsky { handle, kind } => {
            let did = ctx.identity.resolve_did(&handle).await?;
            Ok(Resolution::Locator(match kind.as_deref() {
                Some("history") => ResourceLocator::collection(did, nsid::POST),
                Some("blocking") => ResourceLocator::collection(did, nsid::BLOCK),
                _ => ResourceLocator::repo(did),
            }))
        }
        SiteMatch::Post { handle, rkey } => {
            let did = ctx.identity.resolve_did(&handle).await?;
            Ok(Resolution::Locator(ResourceLocator::record(
                did,
                nsid::POST,
                rkey,
            )))
        }
        SiteMatch::Skyview { url } => {
            if depth >= MAX_DELEGATION_DEPTH {
                return Err(Error::declined(entry, "wrapped URLs nested too deep"));
            }
            let inner = decode_component(&url);
            cross_log!(debug, "Passing '{inner}' back to the pattern table");
            let dispatched = Box::pin(dispatch(ctx, &inner, depth + 1)).await?;
            Ok(dispatched.resolution)
        }
        SiteMatch::SmokeSignal { handle, rkey } => {
            let did = ctx.identity.resolve_did(&handle).await?;
            Ok(Resolution::Locator(match rkey {
                Some(rkey) => ResourceLocator::record(did, nsid::SMOKESIGNAL_EVENT, rkey),
                None => ResourceLocator::record(did, nsid::SMOKESIGNAL_PROFILE, "self"),
            }))
        }
        SiteMatch::AtprotoCamp { handle, rkey } => {
            let did = ctx.identity.resolve_did(&handle).await?;
            Ok(Resolution::Locator(ResourceLocator::from_parts(
                did,
                Some(nsid::BADGE_COLLECTION),
                rkey.as_deref(),
            )?))
        }
        SiteMatch::EmbeddedUri { uri } => Ok(Resolution::Locator(embedded(ctx, &uri).await?)),
        SiteMatch::Linkat { handle } => {
            let did = ctx.identity.resolve_did(&handle).await?;
            Ok(Resolution::Locator(ResourceLocator::record(
                did,
                nsid::LINKAT_BOARD,
                "self",
            )))
        }
        SiteMatch::Internect { did } => {
            let did: Did = decode_component(&did).parse()?;
            Ok(Resolution::Locator(ResourceLocator::repo(did)))
        }
        SiteMatch::Frontpage { post, comment } => frontpage(ctx, entry, post, comment).await,
        SiteMatch::Generic { host } => {
            if !ctx.settings.pds_fallback {
                return Err(Error::declined(
                    entry,
                    "PDS fallback matching is set to false",
                ));
            }
            Ok(Resolution::Pds(host))
        }
    }
}

/// Wrap a post locator, honouring thread-fetch mode.
fn post(ctx: Context<'_>, locator: ResourceLocator) -> Resolution {
    if ctx.settings.get_post_thread {
        return Resolution::Url(thread_url(ctx.endpoints, &locator, ctx.settings));
    }
    Resolution::Locator(locator)
}

/// Viewer-style `<id>[/<collection>[/<rkey>]]`, where `id` may be a handle.
async fn viewer(
    ctx: Context<'_>,
    id: &str,
    collection: Option<&str>,
    rkey: Option<&str>,
) -> Result<Resolution> {
    let did = ctx.identity.resolve_did(id).await?;
    if collection == Some("blobs") && rkey.is_none() {
        return Ok(Resolution::Blobs(did));
    }
    Ok(Resolution::Locator(ResourceLocator::from_parts(
        did, collection, rkey,
    )?))
}

/// A locator carried verbatim (possibly percent-encoded, possibly with
/// `at://`) inside another URL. DIDs pass through without network calls.
async fn embedded(ctx: Context<'_>, raw: &str) -> Result<ResourceLocator> {
    let decoded = decode_component(raw);
    let rest = decoded.strip_prefix("at://").unwrap_or(&decoded);
    let (id, path) = rest.split_once('/').unwrap_or((rest, ""));
    let did = ctx.identity.resolve_did(id).await?;
    format!("{did}/{path}").parse()
}

async fn bsky(
    ctx: Context<'_>,
    prefix: BskyPrefix,
    handle: &str,
    suffix: Option<BskySuffix>,
    rkey: Option<String>,
) -> Result<Resolution> {
    let did = ctx.identity.resolve_did(handle).await?;

    let Some(rkey) = rkey else {
        return Ok(Resolution::Locator(ResourceLocator::repo(did)));
    };

    let locator = match (prefix, suffix) {
        (BskyPrefix::StarterPack, _) => ResourceLocator::record(did, nsid::STARTER_PACK, rkey),
        (BskyPrefix::Profile, Some(BskySuffix::Post)) => {
            return Ok(post(ctx, ResourceLocator::record(did, nsid::POST, rkey)));
        }
        (BskyPrefix::Profile, Some(BskySuffix::Feed)) => {
            ResourceLocator::record(did, nsid::FEED_GENERATOR, rkey)
        }
        (BskyPrefix::Profile, Some(BskySuffix::Lists)) => {
            ResourceLocator::record(did, nsid::LIST, rkey)
        }
        (BskyPrefix::Profile, None) => {
            return Err(Error::declined("bsky", "unsupported profile sub-page"));
        }
    };
    Ok(Resolution::Locator(locator))
}

async fn klearsky(
    ctx: Context<'_>,
    kind: Option<&str>,
    uri: Option<&str>,
    account: Option<&str>,
) -> Result<Resolution> {
    if let Some(uri) = uri {
        let locator = embedded(ctx, uri).await?;
        if kind == Some("post") {
            return Ok(post(ctx, locator));
        }
        return Ok(Resolution::Locator(locator));
    }

    let account = account.ok_or_else(|| Error::declined("klearsky", "no uri or account"))?;
    let did = ctx.identity.resolve_did(account).await?;
    Ok(Resolution::Locator(match kind {
        Some("starterPacks") => ResourceLocator::collection(did, nsid::STARTER_PACK),
        Some("feed-generators") => ResourceLocator::collection(did, nsid::FEED_GENERATOR),
        Some("list") => ResourceLocator::collection(did, nsid::LIST),
        _ => ResourceLocator::repo(did),
    }))
}

/// WhiteWind entries by rkey, else by title.
///
/// A failed title search still lands on the author's entry listing.
async fn whtwnd(
    ctx: Context<'_>,
    handle: &str,
    title: Option<&str>,
    rkey: Option<String>,
) -> Result<Resolution> {
    let did = ctx.identity.resolve_did(handle).await?;

    if let Some(rkey) = rkey {
        return Ok(Resolution::Locator(ResourceLocator::record(
            did,
            nsid::WHTWND_ENTRY,
            rkey,
        )));
    }

    if let Some(title) = title {
        let found = async {
            let service = ctx.identity.resolve_service_endpoint(&did).await?;
            ctx.records
                .find_record_by_title(&did, &service, nsid::WHTWND_ENTRY, title)
                .await
        }
        .await;
        match found {
            Ok(locator) => return Ok(Resolution::Locator(locator)),
            Err(e) => cross_log!(warn, "WhiteWind title search failed: {e}"),
        }
    }

    Ok(Resolution::Locator(ResourceLocator::collection(
        did,
        nsid::WHTWND_ENTRY,
    )))
}

/// Frontpage links resolve to the submission.
///
/// Comment links without the submission in the path recover it from the
/// comment record's `post.uri`.
async fn frontpage(
    ctx: Context<'_>,
    entry: &'static str,
    post: Option<(String, String)>,
    comment: Option<(String, String)>,
) -> Result<Resolution> {
    if let Some((handle, rkey)) = post {
        let did = ctx.identity.resolve_did(&handle).await?;
        return Ok(Resolution::Locator(ResourceLocator::record(
            did,
            nsid::FRONTPAGE_POST,
            rkey,
        )));
    }

    let (comment_handle, comment_rkey) =
        comment.ok_or_else(|| Error::declined(entry, "neither post nor comment present"))?;
    let commenter = ctx.identity.resolve_did(&comment_handle).await?;
    let record = ctx
        .records
        .get_record(&commenter, nsid::FRONTPAGE_COMMENT, &comment_rkey, None)
        .await?;

    let parent_uri = record
        .value
        .pointer("/post/uri")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::declined(entry, "comment record has no post.uri"))?;
    let parent: ResourceLocator = parent_uri.parse()?;

    // Re-resolve through the parent's own identity.
    let parent_did = ctx.identity.resolve_did(parent.did().as_str()).await?;
    Ok(Resolution::Locator(parent.with_did(parent_did)))
}
