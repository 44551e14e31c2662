//! Robots.txt rules for one host

use robotstxt::DefaultMatcher;

/// Parsed robots.txt data for one origin
///
/// An empty body, or a robots.txt that could not be fetched, allows
/// everything.
#[derive(Debug, Clone, Default)]
pub struct ParsedRobots {
    content: Option<String>,
}

impl ParsedRobots {
    pub fn from_content(content: &str) -> Self {
        let trimmed = content.trim();
        Self {
            content: (!trimmed.is_empty()).then(|| content.to_string()),
        }
    }

    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Checks if `url` (absolute) may be fetched by `user_agent`
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        match &self.content {
            None => true,
            Some(content) => {
                let mut matcher = DefaultMatcher::default();
                matcher.one_agent_allowed_by_robots(content, product_token(user_agent), url)
            }
        }
    }

    /// `Crawl-delay` in seconds for `user_agent`, falling back to the `*` group
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        let content = self.content.as_ref()?;
        let agent = product_token(user_agent).to_lowercase();

        let mut group: Vec<String> = Vec::new();
        let mut in_rules = false;
        let mut for_agent = None;
        let mut for_wildcard = None;

        for line in content.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();

            match key.trim().to_lowercase().as_str() {
                "user-agent" => {
                    if in_rules {
                        group.clear();
                        in_rules = false;
                    }
                    group.push(value.to_lowercase());
                }
                "crawl-delay" => {
                    in_rules = true;
                    let Ok(delay) = value.parse::<f64>() else {
                        continue;
                    };
                    if group.iter().any(|ua| ua == "*") {
                        for_wildcard = for_wildcard.or(Some(delay));
                    }
                    if group.iter().any(|ua| ua != "*" && agent.contains(ua.as_str())) {
                        for_agent = for_agent.or(Some(delay));
                    }
                }
                _ => in_rules = true,
            }
        }

        for_agent.or(for_wildcard)
    }
}

/// `Mozilla/5.0 (X11; ...)` matches robots groups as `Mozilla`
fn product_token(user_agent: &str) -> &str {
    user_agent
        .split(|c: char| c == '/' || c.is_whitespace())
        .find(|s| !s.is_empty())
        .unwrap_or("*")
}
