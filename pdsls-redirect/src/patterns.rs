//! The ordered table of supported sites.
//!
//! Each entry pairs a compiled recognizer with an extractor that turns the
//! regex captures into a typed [`SiteMatch`]. The table is built once per
//! process and never mutated.
//!
//! Entries are tried in declaration order and the first match wins, so more
//! specific entries come first and the catch-all [`GENERIC`] entry is always
//! last.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Name of the catch-all entry.
pub const GENERIC: &str = "generic";
/// Names of the entries for the canonical viewer itself.
pub const VIEWER_ENTRIES: [&str; 2] = ["pdsls", "pdsls-pds"];

/// Path prefix of the four Bluesky clients sharing one URL scheme.
const BSKY_CLIENTS: &str =
    r"(?:bsky\.app|main\.bsky\.dev|langit\.pages\.dev/u/[\w.:%-]+|tokimekibluesky\.vercel\.app)";

/// What a recognized URL addresses, with exactly the fields its site encodes.
///
/// `handle` fields hold whatever the site put in the URL: a handle, possibly
/// `@`-prefixed or percent-encoded, or a DID.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SiteMatch {
    /// Raw `at://` URI, e.g. selected text.
    AtUri {
        /// Handle or DID after `at://`.
        id: String,
        /// Collection NSID.
        collection: Option<String>,
        /// Record key.
        rkey: Option<String>,
    },
    /// A page of the canonical viewer, `/at/<id>/...`.
    Viewer {
        /// Handle or DID after `/at/`.
        id: String,
        /// Collection NSID.
        collection: Option<String>,
        /// Record key.
        rkey: Option<String>,
    },
    /// The canonical viewer's page for a PDS host.
    ViewerPds {
        /// PDS host name.
        host: String,
    },
    /// Bluesky-style clients.
    Bsky {
        /// `profile` or `starter-pack`.
        prefix: BskyPrefix,
        /// Account segment.
        handle: String,
        /// Sub-resource of a profile page.
        suffix: Option<BskySuffix>,
        /// Record key following the prefix or suffix.
        rkey: Option<String>,
    },
    /// Klearsky: either an embedded `at://` URI or an account plus page type.
    Klearsky {
        /// Page type (`post`, `starterPacks`, `feed-generators`, `list`).
        kind: Option<String>,
        /// Percent-encoded `at://` URI from the `uri` parameter.
        uri: Option<String>,
        /// DID or handle from the `account` parameter.
        account: Option<String>,
    },
    /// WhiteWind blog entries, by rkey or by title.
    WhiteWind {
        /// Author segment.
        handle: String,
        /// Percent-encoded entry title.
        title: Option<String>,
        /// Entry record key, for `/entries/<rkey>` URLs.
        rkey: Option<String>,
    },
    /// atproto-browser style `/at/<handle>/<rest>` pages.
    AtprotoBrowser {
        /// Account segment.
        handle: String,
        /// `<collection>[/<rkey>]`, unsplit.
        rest: Option<String>,
    },
    /// Clearsky profile pages.
    Clearsky {
        /// Account segment.
        handle: String,
        /// Page type (`history`, `blocking`).
        kind: Option<String>,
    },
    /// Sites addressing one post by author and rkey in the query.
    Post {
        /// Post author.
        handle: String,
        /// Post record key.
        rkey: String,
    },
    /// Skyview wraps another site's URL in `?url=`.
    Skyview {
        /// The wrapped URL, still percent-encoded.
        url: String,
    },
    /// Smoke Signal events and profiles.
    SmokeSignal {
        /// Organizer segment.
        handle: String,
        /// Event record key.
        rkey: Option<String>,
    },
    /// atproto.camp badges.
    AtprotoCamp {
        /// Badge holder.
        handle: String,
        /// Badge record key.
        rkey: Option<String>,
    },
    /// A percent-encoded or raw `at://` URI carried in a query parameter.
    EmbeddedUri {
        /// Parameter value.
        uri: String,
    },
    /// Linkat boards.
    Linkat {
        /// Board owner.
        handle: String,
    },
    /// Internect, addressed by DID directly.
    Internect {
        /// Account DID.
        did: String,
    },
    /// Frontpage submissions and comments.
    Frontpage {
        /// Submission author and rkey, when the URL carries them.
        post: Option<(String, String)>,
        /// Comment author and rkey, when the URL points at a comment.
        comment: Option<(String, String)>,
    },
    /// Anything else served over https.
    Generic {
        /// Host name, treated as a PDS.
        host: String,
    },
}

/// First path segment of Bluesky-style URLs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BskyPrefix {
    /// `/profile/<handle>`.
    Profile,
    /// `/starter-pack/<handle>/<rkey>`.
    StarterPack,
}

/// Sub-resource segment of Bluesky-style profile URLs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BskySuffix {
    /// `/post/<rkey>`.
    Post,
    /// `/lists/<rkey>`.
    Lists,
    /// `/feed/<rkey>`.
    Feed,
}

type Extractor = fn(&Captures<'_>) -> Option<SiteMatch>;

/// One table entry: recognizer plus field extractor.
#[derive(Debug)]
pub struct Pattern {
    name: &'static str,
    regex: Regex,
    extract: Extractor,
}

impl Pattern {
    fn new(name: &'static str, regex: &str, extract: Extractor) -> Self {
        Self {
            name,
            regex: Regex::new(regex).expect("pattern table regexes are valid"),
            extract,
        }
    }

    /// Entry name, used in logs.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Match `url` against this entry alone.
    pub fn recognize(&self, url: &str) -> Option<SiteMatch> {
        let captures = self.regex.captures(url)?;
        (self.extract)(&captures)
    }
}

/// A successful recognition: which entry matched and what it extracted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Recognized {
    /// Name of the matching entry.
    pub entry: &'static str,
    /// Extracted fields.
    pub site: SiteMatch,
}

/// The process-wide pattern table.
#[derive(Debug)]
pub struct PatternTable {
    entries: Vec<Pattern>,
}

static PATTERN_TABLE: LazyLock<PatternTable> = LazyLock::new(PatternTable::build);

impl PatternTable {
    /// Shared table, compiled on first use.
    pub fn global() -> &'static PatternTable {
        &PATTERN_TABLE
    }

    /// Entries in match order.
    pub fn entries(&self) -> impl Iterator<Item = &Pattern> {
        self.entries.iter()
    }

    /// First entry matching `url`.
    pub fn recognize(&self, url: &str) -> Option<Recognized> {
        self.recognize_in(self.entries.iter(), url)
    }

    /// Like [`Self::recognize`] but never falls through to the catch-all.
    pub fn recognize_specific(&self, url: &str) -> Option<Recognized> {
        self.recognize_in(self.entries.iter().filter(|p| p.name != GENERIC), url)
    }

    fn recognize_in<'a>(
        &self,
        mut entries: impl Iterator<Item = &'a Pattern>,
        url: &str,
    ) -> Option<Recognized> {
        entries.find_map(|pattern| {
            pattern.recognize(url).map(|site| Recognized {
                entry: pattern.name,
                site,
            })
        })
    }

    fn build() -> Self {
        let entries = vec![
            Pattern::new(
                "at-uri",
                r"^at://(?<id>[^/?#\s]+)(?:/(?<collection>[^/?#\s]+))?(?:/(?<rkey>[^/?#\s]+))?/?$",
                |c| {
                    Some(SiteMatch::AtUri {
                        id: req(c, "id")?,
                        collection: opt(c, "collection"),
                        rkey: opt(c, "rkey"),
                    })
                },
            ),
            Pattern::new(
                "pdsls",
                r"^https://pdsls\.dev/at/(?<id>[\w.:%-]+)(?:/(?<collection>[\w.:%-]+))?(?:/(?<rkey>[\w.:%~-]+))?/?(?:[?#].*)?$",
                |c| {
                    Some(SiteMatch::Viewer {
                        id: req(c, "id")?,
                        collection: opt(c, "collection"),
                        rkey: opt(c, "rkey"),
                    })
                },
            ),
            Pattern::new(
                "pdsls-pds",
                r"^https://pdsls\.dev/(?<host>[\w-]+(?:\.[\w-]+)+(?::\d+)?)/?(?:[?#].*)?$",
                |c| {
                    Some(SiteMatch::ViewerPds {
                        host: req(c, "host")?,
                    })
                },
            ),
            Pattern::new(
                "bsky",
                &format!(
                    r"^https://{BSKY_CLIENTS}/(?<prefix>profile|starter-pack)/(?<handle>[\w.:%-]+)(?:/(?<suffix>post|lists|feed))?/?(?<rkey>[\w.:%-]+)?(?:\?.*)?$"
                ),
                |c| {
                    let prefix = match c.name("prefix")?.as_str() {
                        "profile" => BskyPrefix::Profile,
                        _ => BskyPrefix::StarterPack,
                    };
                    let suffix = c.name("suffix").map(|s| match s.as_str() {
                        "post" => BskySuffix::Post,
                        "lists" => BskySuffix::Lists,
                        _ => BskySuffix::Feed,
                    });
                    Some(SiteMatch::Bsky {
                        prefix,
                        handle: req(c, "handle")?,
                        suffix,
                        rkey: opt(c, "rkey"),
                    })
                },
            ),
            Pattern::new(
                "klearsky",
                r"^https://klearsky\.pages\.dev/#/(?:[^/?]+/)?(?<kind>[^/?]+)?(?:\?(?:[\w.-]+=(?:at://|at%3A%2F%2F)(?<uri>[\w.:%/-]+)|account=(?<account>[\w.:/-]+)))?(?:&.*)?$",
                |c| {
                    Some(SiteMatch::Klearsky {
                        kind: opt(c, "kind"),
                        uri: opt(c, "uri"),
                        account: opt(c, "account"),
                    })
                },
            ),
            Pattern::new(
                "whtwnd",
                r"^https://whtwnd\.com/(?<handle>[\w.:%-]+)/(?:entries/(?<title>[\w.:%-]+)(?:\?rkey=(?<rkey>[\w.:%-]+))?|(?<post_id>[\w.:%-]+))$",
                |c| {
                    Some(SiteMatch::WhiteWind {
                        handle: req(c, "handle")?,
                        title: opt(c, "title"),
                        rkey: opt(c, "rkey").or_else(|| opt(c, "post_id")),
                    })
                },
            ),
            Pattern::new(
                "atproto-browser",
                r"^https://(?:atproto-browser\.vercel\.app|at\.syu\.is)/at/(?<handle>[\w.:%-]+)(?:/(?<rest>[^?]*))?(?:\?.*)?$",
                |c| {
                    Some(SiteMatch::AtprotoBrowser {
                        handle: req(c, "handle")?,
                        rest: opt(c, "rest"),
                    })
                },
            ),
            Pattern::new(
                "clearsky",
                r"^https://clearsky\.app/(?<handle>[\w.:%-]+)(?:/(?<kind>[\w.:%-]+))?(?:\?.*)?$",
                |c| {
                    Some(SiteMatch::Clearsky {
                        handle: req(c, "handle")?,
                        kind: opt(c, "kind"),
                    })
                },
            ),
            Pattern::new(
                "blueviewer",
                r"^https://blueviewer\.pages\.dev/view\?actor=(?<handle>[\w.:%-]+)&rkey=(?<rkey>[\w.:%-]+)$",
                post_fields,
            ),
            Pattern::new(
                "skythread",
                r"^https://blue\.mackuba\.eu/skythread/\?author=(?<handle>[\w.:%-]+)&post=(?<rkey>[\w.:%-]+)$",
                post_fields,
            ),
            Pattern::new("skyview", r"^https://skyview\.social/\?url=(?<url>[^&]+)", |c| {
                Some(SiteMatch::Skyview {
                    url: req(c, "url")?,
                })
            }),
            Pattern::new(
                "smokesignal",
                r"^https://smokesignal\.events/(?<handle>[\w.:%-]+)(?:/(?<rkey>[\w.:%-]+))?(?:\?.*)?$",
                |c| {
                    Some(SiteMatch::SmokeSignal {
                        handle: req(c, "handle")?,
                        rkey: opt(c, "rkey"),
                    })
                },
            ),
            Pattern::new(
                "atproto-camp",
                r"^https://atproto\.camp/(?<handle>[\w.:%-]+)(?:/(?<rkey>[\w.:%-]+))?(?:\?.*)?$",
                |c| {
                    Some(SiteMatch::AtprotoCamp {
                        handle: req(c, "handle")?,
                        rkey: opt(c, "rkey"),
                    })
                },
            ),
            Pattern::new(
                "badge-blue",
                r"^https://badge\.blue/verify\?uri=(?:at://|at%3A%2F%2F)(?<uri>.+)$",
                |c| {
                    Some(SiteMatch::EmbeddedUri {
                        uri: req(c, "uri")?,
                    })
                },
            ),
            Pattern::new(
                "linkat",
                r"^https://linkat\.blue/(?<handle>[\w.:%-]+)(?:\?.*)?$",
                |c| {
                    Some(SiteMatch::Linkat {
                        handle: req(c, "handle")?,
                    })
                },
            ),
            Pattern::new(
                "internect",
                r"^https://internect\.info/did/(?<did>[\w.:%-]+)(?:\?.*)?$",
                |c| {
                    Some(SiteMatch::Internect {
                        did: req(c, "did")?,
                    })
                },
            ),
            Pattern::new(
                "frontpage",
                r"^https://frontpage\.fyi/post/(?<handle>[\w.:%-]+)/(?<rkey>[\w.:%~-]+)(?:/(?<comment_handle>[\w.:%-]+)/(?<comment_rkey>[\w.:%~-]+))?/?(?:\?.*)?$",
                |c| {
                    Some(SiteMatch::Frontpage {
                        post: Some((req(c, "handle")?, req(c, "rkey")?)),
                        comment: opt(c, "comment_handle").zip(opt(c, "comment_rkey")),
                    })
                },
            ),
            Pattern::new(
                "frontpage-comment",
                r"^https://frontpage\.fyi/comment/(?<comment_handle>[\w.:%-]+)/(?<comment_rkey>[\w.:%~-]+)/?(?:\?.*)?$",
                |c| {
                    Some(SiteMatch::Frontpage {
                        post: None,
                        comment: Some((req(c, "comment_handle")?, req(c, "comment_rkey")?)),
                    })
                },
            ),
            Pattern::new(GENERIC, r"^https://(?<host>[^/?#:@\s]+)(?::\d+)?(?:[/?#].*)?$", |c| {
                Some(SiteMatch::Generic {
                    host: req(c, "host")?,
                })
            }),
        ];

        Self { entries }
    }
}

fn post_fields(c: &Captures<'_>) -> Option<SiteMatch> {
    Some(SiteMatch::Post {
        handle: req(c, "handle")?,
        rkey: req(c, "rkey")?,
    })
}

/// Optional group; empty matches count as absent.
fn opt(c: &Captures<'_>, name: &str) -> Option<String> {
    c.name(name)
        .map(|m| m.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Group the entry cannot do without.
fn req(c: &Captures<'_>, name: &str) -> Option<String> {
    opt(c, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recognize(url: &str) -> Recognized {
        PatternTable::global()
            .recognize(url)
            .unwrap_or_else(|| panic!("no entry for {url}"))
    }

    #[test]
    fn generic_entry_is_last_and_unique() {
        let names: Vec<_> = PatternTable::global().entries().map(Pattern::name).collect();
        assert_eq!(names.last(), Some(&GENERIC));
        assert_eq!(names.iter().filter(|n| **n == GENERIC).count(), 1);
    }

    #[test]
    fn every_specific_url_also_matches_generic_but_loses() {
        let generic = PatternTable::global()
            .entries()
            .find(|p| p.name() == GENERIC)
            .unwrap();
        for url in [
            "https://bsky.app/profile/alice.example/post/3k2x",
            "https://pdsls.dev/at/did:plc:xyz",
            "https://whtwnd.com/alice.example/3abc",
            "https://clearsky.app/alice.example/history",
            "https://linkat.blue/alice.example",
            "https://frontpage.fyi/comment/bob.example/3c",
        ] {
            assert!(generic.recognize(url).is_some(), "{url}");
            assert_ne!(recognize(url).entry, GENERIC, "{url}");
        }
    }

    #[test]
    fn bsky_fields() {
        let r = recognize("https://bsky.app/profile/alice.example/post/3k2x");
        assert_eq!(
            r.site,
            SiteMatch::Bsky {
                prefix: BskyPrefix::Profile,
                handle: "alice.example".into(),
                suffix: Some(BskySuffix::Post),
                rkey: Some("3k2x".into()),
            }
        );

        let r = recognize("https://langit.pages.dev/u/me.example/profile/bob.example");
        assert!(matches!(
            r.site,
            SiteMatch::Bsky { suffix: None, rkey: None, ref handle, .. } if handle == "bob.example"
        ));

        let r = recognize("https://main.bsky.dev/starter-pack/alice.example/3sp");
        assert!(matches!(
            r.site,
            SiteMatch::Bsky { prefix: BskyPrefix::StarterPack, suffix: None, rkey: Some(ref k), .. } if k == "3sp"
        ));
    }

    #[test]
    fn whtwnd_title_and_rkey() {
        let r = recognize("https://whtwnd.com/alice.example/entries/My%20Post?rkey=3abc");
        assert_eq!(
            r.site,
            SiteMatch::WhiteWind {
                handle: "alice.example".into(),
                title: Some("My%20Post".into()),
                rkey: Some("3abc".into()),
            }
        );
        let r = recognize("https://whtwnd.com/alice.example/3def");
        assert!(matches!(r.site, SiteMatch::WhiteWind { title: None, rkey: Some(ref k), .. } if k == "3def"));
    }

    #[test]
    fn klearsky_variants() {
        let r = recognize(
            "https://klearsky.pages.dev/#/post?uri=at://did:plc:xyz/app.bsky.feed.post/3k2x",
        );
        assert_eq!(
            r.site,
            SiteMatch::Klearsky {
                kind: Some("post".into()),
                uri: Some("did:plc:xyz/app.bsky.feed.post/3k2x".into()),
                account: None,
            }
        );
        let r = recognize("https://klearsky.pages.dev/#/profile/feed-generators?account=did:plc:xyz");
        assert_eq!(
            r.site,
            SiteMatch::Klearsky {
                kind: Some("feed-generators".into()),
                uri: None,
                account: Some("did:plc:xyz".into()),
            }
        );
    }

    #[test]
    fn viewer_and_generic_hosts() {
        assert_eq!(
            recognize("https://pdsls.dev/at/did:plc:xyz/app.bsky.feed.post/3k2x").site,
            SiteMatch::Viewer {
                id: "did:plc:xyz".into(),
                collection: Some("app.bsky.feed.post".into()),
                rkey: Some("3k2x".into()),
            }
        );
        assert_eq!(
            recognize("https://pdsls.dev/pds.example.com").site,
            SiteMatch::ViewerPds {
                host: "pds.example.com".into()
            }
        );
        let r = recognize("https://example.org/nothing?x=1");
        assert_eq!(r.entry, GENERIC);
        assert_eq!(
            r.site,
            SiteMatch::Generic {
                host: "example.org".into()
            }
        );
    }

    #[test]
    fn frontpage_forms() {
        let r = recognize("https://frontpage.fyi/post/alice.example/3p/bob.example/3c");
        assert_eq!(
            r.site,
            SiteMatch::Frontpage {
                post: Some(("alice.example".into(), "3p".into())),
                comment: Some(("bob.example".into(), "3c".into())),
            }
        );
        let r = recognize("https://frontpage.fyi/comment/bob.example/3c");
        assert_eq!(r.entry, "frontpage-comment");
    }

    #[test]
    fn non_https_is_unrecognized() {
        assert!(PatternTable::global().recognize("http://example.org/").is_none());
        assert!(PatternTable::global().recognize("ftp://example.org").is_none());
        assert!(PatternTable::global()
            .recognize_specific("https://example.org/")
            .is_none());
    }
}
