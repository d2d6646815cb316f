//! Read-only access to repository records on a personal data server.

use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::{
    IdentityResolver, RedirectHttpClient,
    constants::LIST_PAGE_SIZE,
    cross_log,
    errors::{Error, Result},
    identity::Did,
    locator::ResourceLocator,
    util::{check_http_status, decode_component},
};

/// One record as returned by `listRecords` / `getRecord`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Record {
    /// `at://` URI of the record.
    pub uri: String,
    /// Content hash, when the server reports it.
    #[serde(default)]
    pub cid: Option<String>,
    /// Record body.
    #[serde(default)]
    pub value: Value,
}

impl Record {
    /// The record's address.
    pub fn locator(&self) -> Result<ResourceLocator> {
        self.uri.parse()
    }
}

/// One page of a `listRecords` call.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct RecordPage {
    /// Records of this page, possibly empty.
    #[serde(default)]
    pub records: Vec<Record>,
    /// Token for the next page; absent once the collection is exhausted.
    #[serde(default)]
    pub cursor: Option<String>,
}

/// Record reader bound to one client.
#[derive(Debug, Clone)]
pub struct RecordStore {
    client: RedirectHttpClient,
}

impl RecordStore {
    /// Record store on a specific client.
    pub fn with_client(client: &RedirectHttpClient) -> Self {
        Self {
            client: client.clone(),
        }
    }

    /// Start a `com.atproto.repo.listRecords` query against `service`.
    ///
    /// # Example
    /// ```no_run
    /// # async fn example(store: pdsls_redirect::RecordStore, did: pdsls_redirect::Did, pds: url::Url) -> pdsls_redirect::Result<()> {
    /// let page = store
    ///     .list_records(&did, &pds, "com.whtwnd.blog.entry")
    ///     .limit(50)
    ///     .send()
    ///     .await?;
    /// for record in page.records { println!("{}", record.uri); }
    /// # Ok(()) }
    /// ```
    pub fn list_records<'a>(
        &'a self,
        did: &'a Did,
        service: &'a Url,
        collection: &'a str,
    ) -> ListRecordsBuilder<'a> {
        ListRecordsBuilder {
            store: self,
            did,
            service,
            collection,
            limit: None,
            cursor: None,
            reverse: false,
        }
    }

    /// Fetch a single record. Resolves the service endpoint when not supplied.
    pub async fn get_record(
        &self,
        did: &Did,
        collection: &str,
        rkey: &str,
        service: Option<&Url>,
    ) -> Result<Record> {
        let resolved;
        let service = match service {
            Some(service) => service,
            None => {
                resolved = IdentityResolver::with_client(&self.client)
                    .resolve_service_endpoint(did)
                    .await?;
                &resolved
            }
        };

        let mut url = xrpc_url(service, "com.atproto.repo.getRecord")?;
        url.query_pairs_mut()
            .append_pair("repo", did.as_str())
            .append_pair("collection", collection)
            .append_pair("rkey", rkey);

        let response = self.client.request(Method::GET, url).send().await?;
        let response = check_http_status(response).await?;
        Ok(response.json().await?)
    }

    /// Scan `collection` page by page for a record whose `title` equals the
    /// percent-decoded `title`.
    ///
    /// Stops at the first match, at an empty page, when the server stops
    /// handing out a cursor, or after the client's page cap, whichever comes
    /// first. Everything but a match is [`Error::NoRecordFound`].
    pub async fn find_record_by_title(
        &self,
        did: &Did,
        service: &Url,
        collection: &str,
        title: &str,
    ) -> Result<ResourceLocator> {
        let title = decode_component(title);
        let max_pages = self.client.title_search_max_pages();
        let mut cursor: Option<String> = None;

        for page_no in 1..=max_pages {
            let mut query = self
                .list_records(did, service, collection)
                .limit(LIST_PAGE_SIZE);
            if let Some(cursor) = &cursor {
                query = query.cursor(cursor);
            }
            let page = query.send().await?;

            if page.records.is_empty() {
                break;
            }
            if let Some(record) = page
                .records
                .iter()
                .find(|r| r.value.get("title").and_then(Value::as_str) == Some(title.as_ref()))
            {
                return record.locator();
            }

            match page.cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
            if page_no == max_pages {
                cross_log!(
                    warn,
                    "Title search in '{collection}' stopped after {max_pages} pages"
                );
            }
        }

        Err(Error::NoRecordFound {
            collection: collection.to_string(),
            title: title.into_owned(),
        })
    }
}

/// Builder for one `listRecords` page.
///
/// Built via [`RecordStore::list_records`]; configure `limit`, `cursor` and
/// `reverse`, then [`send`](Self::send).
#[derive(Debug)]
#[must_use]
pub struct ListRecordsBuilder<'a> {
    store: &'a RecordStore,
    did: &'a Did,
    service: &'a Url,
    collection: &'a str,
    limit: Option<u16>,
    cursor: Option<String>,
    reverse: bool,
}

impl ListRecordsBuilder<'_> {
    /// Maximum number of records to return (the server may cap).
    pub fn limit(mut self, limit: u16) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Resume listing from a previous `cursor` token.
    pub fn cursor(mut self, cursor: &str) -> Self {
        self.cursor = Some(cursor.to_string());
        self
    }

    /// List oldest-first instead of newest-first.
    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    /// Execute the request.
    pub async fn send(self) -> Result<RecordPage> {
        let mut url = xrpc_url(self.service, "com.atproto.repo.listRecords")?;
        {
            let mut q = url.query_pairs_mut();
            q.append_pair("repo", self.did.as_str());
            q.append_pair("collection", self.collection);
            if let Some(limit) = self.limit {
                q.append_pair("limit", &limit.to_string());
            }
            if let Some(cursor) = &self.cursor {
                q.append_pair("cursor", cursor);
            }
            if self.reverse {
                q.append_pair("reverse", "true");
            }
        }

        let response = self
            .store
            .client
            .request(Method::GET, url)
            .send()
            .await?;
        let response = check_http_status(response).await?;
        Ok(response.json().await?)
    }
}

/// `<service>/xrpc/<method>`, tolerating a trailing slash on the service URL.
pub(crate) fn xrpc_url(service: &Url, method: &str) -> Result<Url> {
    Ok(Url::parse(&format!(
        "{}/xrpc/{method}",
        service.as_str().trim_end_matches('/')
    ))?)
}
