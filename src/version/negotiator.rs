//! Server probe and version pinning.

use http::{Method, StatusCode};

use super::{Version, VersionRange, VersionSpec, MAX_VERSION_HEADER, MIN_VERSION_HEADER};
use crate::error::{InspectorError, Result};
use crate::transport::{HttpRequest, Transport};

/// Get the API version range supported by the server at `url`.
///
/// The probe is unauthenticated. A 404 is a valid answer from servers that
/// predate version negotiation, as are missing headers; both mean `1.0`.
pub fn server_api_versions(transport: &dyn Transport, url: &str) -> Result<VersionRange> {
    let url = url.trim_end_matches('/');
    let response = transport.send(HttpRequest::new(Method::GET, url))?;

    if !response.is_success() && response.status != StatusCode::NOT_FOUND {
        return Err(InspectorError::from_response(response.status, &response.body));
    }

    let parse = |header: &str| -> Result<Version> {
        match response.header(header) {
            Some(value) => value.parse().map_err(|_| {
                InspectorError::InvalidResponse(format!(
                    "Cannot parse {header} value {value:?} returned by {url}"
                ))
            }),
            None => Ok(super::DEFAULT_SERVER_VERSION),
        }
    };

    let range = VersionRange::new(parse(MIN_VERSION_HEADER)?, parse(MAX_VERSION_HEADER)?);
    tracing::debug!("Supported API version range for {} is [{}]", url, range);
    Ok(range)
}

/// Resolves a [`VersionSpec`] against what a server advertises.
pub struct Negotiator<'a> {
    transport: &'a dyn Transport,
    url: &'a str,
}

impl<'a> Negotiator<'a> {
    /// Create a negotiator probing `url` through `transport`.
    pub fn new(transport: &'a dyn Transport, url: &'a str) -> Self {
        Self { transport, url }
    }

    /// Probe the server's supported range.
    pub fn server_api_versions(&self) -> Result<VersionRange> {
        server_api_versions(self.transport, self.url)
    }

    /// Negotiate the version to pin.
    ///
    /// A malformed specifier fails before the probe is sent.
    pub fn negotiate(&self, spec: &VersionSpec) -> Result<Version> {
        let requested = spec.requested()?;
        let range = self.server_api_versions()?;
        let version = range.check(requested.resolve(&range))?;

        tracing::debug!("Negotiated API version {} (requested {})", version, spec);
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;
    use crate::transport::HttpResponse;
    use proptest::prelude::*;

    fn negotiate(transport: &MockTransport, spec: impl Into<VersionSpec>) -> Result<Version> {
        Negotiator::new(transport, "http://inspector:5050").negotiate(&spec.into())
    }

    #[test]
    fn test_scenario_range_1_0_to_1_9() {
        let transport = MockTransport::with_versions("1.0", "1.9");
        assert_eq!(negotiate(&transport, "1.5").unwrap(), Version::new(1, 5));

        transport.push_versions("1.0", "1.9");
        match negotiate(&transport, "2.0") {
            Err(InspectorError::VersionNotSupported {
                requested,
                supported,
            }) => {
                assert_eq!(requested, Version::new(2, 0));
                assert_eq!(supported.min, Version::new(1, 0));
                assert_eq!(supported.max, Version::new(1, 9));
            },
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_latest_pins_server_max() {
        let transport = MockTransport::with_versions("1.0", "1.9");
        assert_eq!(negotiate(&transport, VersionSpec::Latest).unwrap(), Version::new(1, 9));
    }

    #[test]
    fn test_major_pins_server_max_minor() {
        let transport = MockTransport::with_versions("1.1", "1.42");
        assert_eq!(negotiate(&transport, 1u32).unwrap(), Version::new(1, 42));

        transport.push_versions("1.1", "1.42");
        assert_eq!(negotiate(&transport, "1").unwrap(), Version::new(1, 42));
    }

    #[test]
    fn test_other_major_rejected() {
        let transport = MockTransport::with_versions("1.0", "1.9");
        assert!(matches!(
            negotiate(&transport, 2u32),
            Err(InspectorError::VersionNotSupported { .. })
        ));
    }

    #[test]
    fn test_malformed_spec_sends_nothing() {
        let transport = MockTransport::with_versions("1.0", "1.9");
        for bad in ["a.b", "1.2.3", "foo"] {
            assert!(matches!(
                negotiate(&transport, bad),
                Err(InspectorError::InvalidInput(_))
            ));
        }
        assert_eq!(transport.request_count(), 0);
    }

    #[test]
    fn test_probe_is_unauthenticated_get_on_base_url() {
        let transport = MockTransport::with_versions("1.0", "1.0");
        Negotiator::new(&*transport, "http://inspector:5050/")
            .negotiate(&VersionSpec::Latest)
            .unwrap();

        let probe = transport.last_request();
        assert_eq!(probe.method, Method::GET);
        assert_eq!(probe.url, "http://inspector:5050");
        assert!(probe.header("x-auth-token").is_none());
    }

    #[test]
    fn test_no_headers_defaults_to_1_0() {
        let transport = MockTransport::new();
        let range = server_api_versions(&*transport, "http://inspector:5050").unwrap();
        assert_eq!(range, VersionRange::new(Version::new(1, 0), Version::new(1, 0)));
    }

    #[test]
    fn test_404_is_legacy_server() {
        let transport = MockTransport::new();
        transport.push(Ok(HttpResponse::new(StatusCode::NOT_FOUND, "")));
        let range = server_api_versions(&*transport, "http://inspector:5050").unwrap();
        assert_eq!(range, VersionRange::default());
    }

    #[test]
    fn test_server_error_propagates() {
        let transport = MockTransport::new();
        transport.push(Ok(HttpResponse::new(StatusCode::INTERNAL_SERVER_ERROR, "oops")));
        let err = server_api_versions(&*transport, "http://inspector:5050").unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[test]
    fn test_transport_failure_propagates_unchanged() {
        let transport = MockTransport::new();
        transport.push(Err(InspectorError::Transport {
            status: None,
            message: "connection refused".to_string(),
            body: None,
        }));
        match negotiate(&transport, VersionSpec::Latest) {
            Err(InspectorError::Transport { message, .. }) => {
                assert_eq!(message, "connection refused");
            },
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(transport.request_count(), 1);
    }

    #[test]
    fn test_bad_header_is_invalid_response() {
        let transport = MockTransport::with_versions("1.0", "one.nine");
        assert!(matches!(
            negotiate(&transport, VersionSpec::Latest),
            Err(InspectorError::InvalidResponse(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_in_range_versions_are_pinned(min in 0u32..20, span in 0u32..20, pick in 0u32..40) {
            let max = min + span;
            let minor = min + pick % (span + 1);
            let transport = MockTransport::with_versions(&format!("1.{min}"), &format!("1.{max}"));
            prop_assert_eq!(negotiate(&transport, (1u32, minor)).unwrap(), Version::new(1, minor));
        }

        #[test]
        fn prop_out_of_range_versions_are_rejected(
            major in 0u32..4,
            minor in 0u32..40,
            min in 0u32..20,
            span in 0u32..20,
        ) {
            let max = min + span;
            prop_assume!(major != 1 || minor < min || minor > max);
            let transport = MockTransport::with_versions(&format!("1.{min}"), &format!("1.{max}"));
            let is_unsupported = matches!(
                negotiate(&transport, (major, minor)),
                Err(InspectorError::VersionNotSupported { .. })
            );
            prop_assert!(is_unsupported);
        }
    }
}
