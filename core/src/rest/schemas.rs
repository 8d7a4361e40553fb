// CRUDKit
// Copyright 2024 The CRUDKit Authors
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Response envelopes shared by the CRUD conventions.

use serde::{Deserialize, Serialize};
use url::Url;

/// A hyperlink inside a `Links` object.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Href {
    /// The absolute URL of the link target.
    pub href: String,
}

impl From<Url> for Href {
    fn from(url: Url) -> Self {
        Href { href: url.into() }
    }
}

/// Pagination links of a search page.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Links {
    /// The page itself.
    #[serde(rename = "self")]
    pub self_: Href,

    /// The previous page, when the current page has a predecessor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<Href>,

    /// The next page, when more matches exist past the current page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<Href>,
}

/// Appends `offset`/`limit` pagination parameters to `url`.
fn with_page_query(url: &Url, offset: u64, limit: u64) -> Url {
    let mut url = url.clone();
    url.query_pairs_mut()
        .append_pair("offset", &offset.to_string())
        .append_pair("limit", &limit.to_string());
    url
}

impl Links {
    /// Computes the pagination links for the page at `offset`/`limit` out of `count` total
    /// matches.  `url` is the absolute URL of the search operation, without pagination
    /// parameters.
    pub fn paginated(url: &Url, offset: u64, limit: u64, count: i64) -> Links {
        let prev = if offset > 0 {
            Some(Href::from(with_page_query(url, offset.saturating_sub(limit), limit)))
        } else {
            None
        };
        let next = if limit > 0 && i64::try_from(offset + limit).unwrap_or(i64::MAX) < count {
            Some(Href::from(with_page_query(url, offset + limit, limit)))
        } else {
            None
        };
        Links { self_: Href::from(with_page_query(url, offset, limit)), prev, next }
    }
}

/// The envelope of a search response: one page of items plus the total match count and the
/// pagination bounds that produced the page.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SearchPage<T> {
    /// The items of the current page.
    pub items: Vec<T>,

    /// Total number of matches, ignoring pagination.
    pub count: i64,

    /// The offset that produced this page.
    pub offset: u64,

    /// The limit that produced this page.  Zero means no limit was applied.
    pub limit: u64,

    /// Pagination links, when the service knows its own base URL.
    #[serde(rename = "_links", skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
}

impl<T> SearchPage<T> {
    /// Creates a page without links.
    pub fn new(items: Vec<T>, count: i64, offset: Option<u64>, limit: Option<u64>) -> Self {
        SearchPage {
            items,
            count,
            offset: offset.unwrap_or(0),
            limit: limit.unwrap_or(0),
            links: None,
        }
    }

    /// Attaches pagination links computed against the search operation's absolute `url`.
    pub fn with_links(mut self, url: &Url) -> Self {
        self.links = Some(Links::paginated(url, self.offset, self.limit, self.count));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Shorthand to parse an absolute URL.
    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_links_first_page() {
        let links = Links::paginated(&url("http://example.com/api/v1/person"), 0, 10, 25);
        assert_eq!("http://example.com/api/v1/person?offset=0&limit=10", links.self_.href);
        assert_eq!(None, links.prev);
        assert_eq!(
            Some(Href { href: "http://example.com/api/v1/person?offset=10&limit=10".to_owned() }),
            links.next
        );
    }

    #[test]
    fn test_links_middle_page() {
        let links = Links::paginated(&url("http://example.com/api/v1/person"), 10, 10, 25);
        assert!(links.prev.is_some());
        assert!(links.next.is_some());
        assert_eq!(
            "http://example.com/api/v1/person?offset=0&limit=10",
            links.prev.unwrap().href
        );
    }

    #[test]
    fn test_links_last_page() {
        let links = Links::paginated(&url("http://example.com/api/v1/person"), 20, 10, 25);
        assert!(links.prev.is_some());
        assert_eq!(None, links.next);
    }

    #[test]
    fn test_links_no_limit_has_no_next() {
        let links = Links::paginated(&url("http://example.com/api/v1/person"), 0, 0, 25);
        assert_eq!(None, links.prev);
        assert_eq!(None, links.next);
    }

    #[test]
    fn test_search_page_serialization_omits_missing_links() {
        let page = SearchPage::new(vec![1, 2, 3], 3, None, None);
        let value = serde_json::to_value(&page).unwrap();
        assert_eq!(
            serde_json::json!({"items": [1, 2, 3], "count": 3, "offset": 0, "limit": 0}),
            value
        );
    }

    #[test]
    fn test_search_page_serialization_with_links() {
        let page = SearchPage::new(vec![1], 5, Some(2), Some(1))
            .with_links(&url("http://example.com/api/v1/num"));
        let value = serde_json::to_value(&page).unwrap();
        let links = value.get("_links").unwrap();
        assert_eq!(
            "http://example.com/api/v1/num?offset=2&limit=1",
            links.get("self").unwrap().get("href").unwrap().as_str().unwrap()
        );
        assert!(links.get("prev").is_some());
        assert!(links.get("next").is_some());
    }
}
