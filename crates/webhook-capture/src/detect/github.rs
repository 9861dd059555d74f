//! GitHub provider detector: identifies inbound GitHub webhook deliveries
//! from their signature/event headers, falling back to the delivery
//! user agent.

use super::{Detection, DetectionContext, ProviderDetector};

const PROVIDER: &str = "github";
const HOOKSHOT_USER_AGENT_PREFIX: &str = "GitHub-Hookshot/";

pub struct GitHubDetector;

impl ProviderDetector for GitHubDetector {
    fn detect(&self, ctx: &DetectionContext<'_>) -> Option<Detection> {
        if ctx.header("X-GitHub-Event").is_some() || ctx.header("X-Hub-Signature-256").is_some() {
            return Some(Detection {
                provider: PROVIDER.to_string(),
                confidence: 1.0,
            });
        }
        if ctx
            .header("User-Agent")
            .is_some_and(|ua| ua.starts_with(HOOKSHOT_USER_AGENT_PREFIX))
        {
            return Some(Detection {
                provider: PROVIDER.to_string(),
                confidence: 0.8,
            });
        }
        None
    }
}
