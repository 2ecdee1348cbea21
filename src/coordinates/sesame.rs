//! Name resolution through the CDS Sesame service.
//!
//! Sesame answers a plain text document in which the line starting with `%J` holds the
//! ICRS position in decimal degrees:
//!
//! ```text
//! %@ 503952
//! %I.0 M  42
//! %J 083.82208 -05.39111 = 05:35:17.30 -05:23:28.0
//! ```
//!
//! The request itself is asynchronous (`reqwest`); the resolver owns a current-thread
//! `tokio` runtime and blocks on it, so callers see a plain synchronous call whose
//! latency is bounded by the configured timeout.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use tokio::runtime::{Builder, Runtime};

use crate::{
    coordinates::{Coordinate, CoordinateResolver},
    scheduler_errors::SchedulerError,
};

static SESAME_POSITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^%J\s+([+-]?\d+(?:\.\d*)?)\s+([+-]?\d+(?:\.\d*)?)")
        .expect("sesame regex is valid")
});

#[derive(Debug)]
pub struct SesameResolver {
    client: reqwest::Client,
    runtime: Runtime,
    base_url: Url,
}

impl SesameResolver {
    /// Create a resolver querying `base_url`.
    ///
    /// Arguments
    /// -----------------
    /// * `base_url`: the Sesame endpoint, the object name is appended as a path segment
    /// * `timeout`: upper bound of a single resolution
    ///
    /// Return
    /// ----------
    /// * the resolver, or an error if the URL is malformed or the runtime/client cannot be built
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SchedulerError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| SchedulerError::InvalidUrl(format!("{base_url}: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(SchedulerError::InvalidUrl(base_url.to_string()));
        }

        let runtime = Builder::new_current_thread().enable_all().build()?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(SesameResolver {
            client,
            runtime,
            base_url,
        })
    }

    /// URL of the Sesame query for `name`, with the name percent-encoded.
    pub(crate) fn query_url(&self, name: &str) -> Url {
        let mut url = self.base_url.clone();
        // checked in `new`
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(name);
        }
        url
    }

    async fn fetch(&self, url: Url) -> Result<String, SchedulerError> {
        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(body)
    }
}

impl CoordinateResolver for SesameResolver {
    fn resolve(&self, name: &str) -> Result<Coordinate, SchedulerError> {
        let url = self.query_url(name);
        log::debug!("Querying Sesame: {url}");
        let body = self.runtime.block_on(self.fetch(url))?;
        parse_sesame_response(name, &body)
    }
}

/// Extract the ICRS position from a Sesame text answer.
pub(crate) fn parse_sesame_response(name: &str, body: &str) -> Result<Coordinate, SchedulerError> {
    let failed = |reason: &str| SchedulerError::ResolutionFailed {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let captures = SESAME_POSITION
        .captures(body)
        .ok_or_else(|| failed("no position in answer"))?;

    let ra: f64 = captures[1].parse().map_err(|_| failed("bad right ascension"))?;
    let dec: f64 = captures[2].parse().map_err(|_| failed("bad declination"))?;

    Coordinate::icrs(ra, dec)
}

#[cfg(test)]
mod sesame_test {
    use super::*;
    use approx::assert_relative_eq;

    const M42_ANSWER: &str = "# M42\t#Q22345\n\
        #=S=Simbad (via url):    1\n\
        %@ 503952\n\
        %I.0 M  42\n\
        %C.0 HII\n\
        %J 083.82208 -05.39111 = 05:35:17.30 -05:23:28.0\n\
        %J.E [20000.00 20000.00 0] D 2003yCat.2246....0C\n";

    #[test]
    fn test_parse_sesame_response() {
        let coord = parse_sesame_response("M42", M42_ANSWER).unwrap();
        assert_relative_eq!(coord.lon, 83.82208);
        assert_relative_eq!(coord.lat, -5.39111);
    }

    #[test]
    fn test_parse_sesame_unknown_name() {
        let answer = "# NonexistentObject123\t#Q22346\n#! *** Nothing found *** \n";
        assert_eq!(
            parse_sesame_response("NonexistentObject123", answer),
            Err(SchedulerError::ResolutionFailed {
                name: "NonexistentObject123".into(),
                reason: "no position in answer".into()
            })
        );
    }

    #[test]
    fn test_query_url_encodes_name() {
        let resolver =
            SesameResolver::new("https://example.org/sesame/-oI/A", Duration::from_secs(1))
                .unwrap();
        assert_eq!(
            resolver.query_url("Wasp 33").as_str(),
            "https://example.org/sesame/-oI/A/Wasp%2033"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            SesameResolver::new("not a url", Duration::from_secs(1)),
            Err(SchedulerError::InvalidUrl(_))
        ));
    }
}
