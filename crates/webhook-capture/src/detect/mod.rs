//! Provider detector registry (C6): identifies a capture's provider
//! from its headers, path, and body.

pub mod github;

use webhook_core::HeaderPair;

/// What a detector sees when inspecting an inbound request.
#[derive(Debug, Clone)]
pub struct DetectionContext<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub headers: &'a [HeaderPair],
    pub body: &'a [u8],
}

impl<'a> DetectionContext<'a> {
    /// Case-insensitive header lookup, returning the first match in
    /// received order.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.key.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }
}

/// A detector's verdict: the provider it recognises and its confidence
/// in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub provider: String,
    pub confidence: f32,
}

/// Inspects a request and optionally names its provider.
pub trait ProviderDetector: Send + Sync {
    fn detect(&self, ctx: &DetectionContext<'_>) -> Option<Detection>;
}

/// Ordered collection of detectors. The first detector to return a
/// match with `confidence > 0` wins, in registration order — not by
/// highest confidence.
pub struct DetectorRegistry {
    detectors: Vec<Box<dyn ProviderDetector>>,
}

impl DetectorRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            detectors: Vec::new(),
        }
    }

    /// The default registry shipped with better-webhook: currently just
    /// the GitHub detector.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(github::GitHubDetector);
        registry
    }

    pub fn register(&mut self, detector: impl ProviderDetector + 'static) -> &mut Self {
        self.detectors.push(Box::new(detector));
        self
    }

    /// Returns the provider name of the first matching detector, or
    /// `"unknown"` if none match.
    #[must_use]
    pub fn identify(&self, ctx: &DetectionContext<'_>) -> String {
        self.detectors
            .iter()
            .find_map(|d| d.detect(ctx).filter(|hit| hit.confidence > 0.0))
            .map(|hit| hit.provider)
            .unwrap_or_else(|| "unknown".to_string())
    }
}

impl Default for DetectorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysMatch(&'static str, f32);
    impl ProviderDetector for AlwaysMatch {
        fn detect(&self, _ctx: &DetectionContext<'_>) -> Option<Detection> {
            Some(Detection {
                provider: self.0.to_string(),
                confidence: self.1,
            })
        }
    }

    struct NeverMatch;
    impl ProviderDetector for NeverMatch {
        fn detect(&self, _ctx: &DetectionContext<'_>) -> Option<Detection> {
            None
        }
    }

    fn empty_ctx<'a>() -> DetectionContext<'a> {
        DetectionContext {
            method: "POST",
            path: "/",
            headers: &[],
            body: &[],
        }
    }

    #[test]
    fn unknown_when_nothing_matches() {
        let mut registry = DetectorRegistry::new();
        registry.register(NeverMatch);
        assert_eq!(registry.identify(&empty_ctx()), "unknown");
    }

    #[test]
    fn first_registered_match_wins_over_a_later_higher_confidence_one() {
        let mut registry = DetectorRegistry::new();
        registry.register(AlwaysMatch("first", 0.5));
        registry.register(AlwaysMatch("second", 1.0));
        assert_eq!(registry.identify(&empty_ctx()), "first");
    }
}
