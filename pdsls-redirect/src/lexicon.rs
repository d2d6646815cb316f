//! Public viewers for well-known record types.
//!
//! Maps a collection NSID to the site that renders it for humans, as opposed
//! to the raw record view every locator gets by default.

use crate::{constants::nsid, locator::ResourceLocator};

fn bsky_profile(did: &str) -> String {
    format!("https://bsky.app/profile/{did}")
}

/// Human-facing page for `locator`, if its record type has one.
///
/// Repositories without a collection go to the Bluesky profile.
pub fn public_url(locator: &ResourceLocator) -> Option<String> {
    let did = locator.did().as_str();
    let Some(collection) = locator.collection_nsid() else {
        return Some(bsky_profile(did));
    };
    let rkey = locator.rkey();

    let url = match collection {
        nsid::PROFILE => bsky_profile(did),
        nsid::POST => format!("{}/post/{}", bsky_profile(did), rkey?),
        nsid::FEED_GENERATOR => format!("{}/feed/{}", bsky_profile(did), rkey?),
        nsid::LIST => format!("{}/lists/{}", bsky_profile(did), rkey?),
        nsid::STARTER_PACK => format!("https://bsky.app/starter-pack/{did}/{}", rkey?),
        nsid::WHTWND_ENTRY => match rkey {
            Some(rkey) => format!("https://whtwnd.com/{did}/{rkey}"),
            None => format!("https://whtwnd.com/{did}"),
        },
        nsid::SMOKESIGNAL_EVENT => format!("https://smokesignal.events/{did}/{}", rkey?),
        nsid::SMOKESIGNAL_PROFILE => format!("https://smokesignal.events/{did}"),
        nsid::LINKAT_BOARD => format!("https://linkat.blue/{did}"),
        nsid::FRONTPAGE_POST => format!("https://frontpage.fyi/post/{did}/{}", rkey?),
        _ => return None,
    };
    Some(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Option<String> {
        public_url(&s.parse().unwrap())
    }

    #[test]
    fn known_collections() {
        assert_eq!(
            url("did:plc:xyz/app.bsky.feed.post/3k2x").as_deref(),
            Some("https://bsky.app/profile/did:plc:xyz/post/3k2x")
        );
        assert_eq!(
            url("did:plc:xyz").as_deref(),
            Some("https://bsky.app/profile/did:plc:xyz")
        );
        assert_eq!(
            url("did:plc:xyz/com.whtwnd.blog.entry").as_deref(),
            Some("https://whtwnd.com/did:plc:xyz")
        );
    }

    #[test]
    fn unknown_or_partial() {
        assert_eq!(url("did:plc:xyz/com.example.thing/1"), None);
        assert_eq!(url("did:plc:xyz/app.bsky.feed.post"), None);
    }
}
