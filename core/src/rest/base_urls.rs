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

//! The `BaseUrls` type.

use crate::env::get_required_var;
use url::Url;

/// Common error message for URLs built via hardcoded values.
const URL_MUST_BE_VALID: &str = "URLs built in-process must be valid";

/// Checks if `base` has the right format to be a base URL and returns an error if it is not.
fn ensure_valid_base(base: &Url) -> Result<(), String> {
    if !base.join("x").unwrap().as_str().starts_with(base.as_str()) {
        return Err(format!("URL '{}' cannot be a base: missing trailing slash", base));
    }
    Ok(())
}

/// The absolute base URL under which the service is reachable, used to build the URLs that the
/// service hands out (search page links, operation URLs).
#[cfg_attr(test, derive(Debug, Eq, PartialEq))]
pub struct BaseUrls {
    /// The base URL to the service.
    base: Url,
}

impl BaseUrls {
    /// Creates a set of base URLs from an already-parsed URL.
    pub fn new(base: Url) -> Result<Self, String> {
        ensure_valid_base(&base)?;
        Ok(Self { base })
    }

    /// Creates a set of base URLs from environment variables whose name is prefixed with the
    /// given `prefix`.
    ///
    /// This will use the `<prefix>_BASE_URL` variable.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        let base = get_required_var::<Url>(prefix, "BASE_URL")?;
        Self::new(base)
    }

    /// Creates a set of base URLs from a fixed string, which must represent a valid base URL.
    #[cfg(any(test, feature = "testutils"))]
    pub fn from_str(base: &'static str) -> Self {
        Self::new(Url::parse(base).unwrap()).unwrap()
    }

    /// Generates an absolute URL given a `path`, which must be relative.  The `path` can be
    /// empty to obtain a reference to the root.
    pub fn make_url(&self, path: &str) -> Url {
        assert!(!path.starts_with('/'));
        self.base.join(path).expect(URL_MUST_BE_VALID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Constructs a URL from a valid raw string for testing purposes.
    fn url(s: &'static str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_ensure_valid_base() {
        ensure_valid_base(&url("http://example.com")).unwrap();
        ensure_valid_base(&url("http://example.com/")).unwrap();
        ensure_valid_base(&url("http://example.com:1234")).unwrap();
        ensure_valid_base(&url("http://example.com/foo/")).unwrap();

        ensure_valid_base(&url("http://example.com:1234/foo")).unwrap_err();
    }

    #[test]
    fn test_new_validates_base() {
        assert!(
            BaseUrls::new(url("http://example.com/bad"))
                .unwrap_err()
                .contains("/bad' cannot be a base")
        );
    }

    #[test]
    fn test_from_env_present() {
        temp_env::with_var("TEST_BASE_URL", Some("https://svc.example.com/api/"), || {
            let base_urls = BaseUrls::from_env("TEST").unwrap();
            assert_eq!(BaseUrls { base: url("https://svc.example.com/api/") }, base_urls);
        });
    }

    #[test]
    fn test_from_env_missing() {
        temp_env::with_var_unset("TEST_BASE_URL", || {
            let err = BaseUrls::from_env("TEST").unwrap_err();
            assert!(err.contains("TEST_BASE_URL not present"));
        });
    }

    #[test]
    fn test_from_env_calls_new_for_validation() {
        temp_env::with_var("TEST_BASE_URL", Some("https://example.com/api"), || {
            assert!(BaseUrls::from_env("TEST").unwrap_err().contains("missing trailing slash"));
        });
    }

    #[test]
    fn test_make_url() {
        let base_urls = BaseUrls::from_str("http://svc.example.com/");

        assert_eq!(url("http://svc.example.com/"), base_urls.make_url(""));
        assert_eq!(url("http://svc.example.com/foo"), base_urls.make_url("foo"));
        assert_eq!(url("http://svc.example.com/api/v1/x"), base_urls.make_url("api/v1/x"));
    }
}
