//! Robots.txt parser implementation
//!
//! Rule matching is delegated to the robotstxt crate; `Sitemap:` and
//! `Crawl-delay:` lines are read directly since the matcher ignores them.

use robotstxt::DefaultMatcher;

/// Parsed robots.txt data
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    /// Raw robots.txt content (empty string means allow all)
    content: String,
    allow_all: bool,
}

impl ParsedRobots {
    /// Creates a new ParsedRobots from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
        }
    }

    /// Creates a permissive ParsedRobots that allows everything
    ///
    /// This is used when robots.txt cannot be fetched.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
        }
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// # Arguments
    ///
    /// * `url` - The absolute URL to check
    /// * `user_agent` - The user agent string
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.allow_all || self.content.is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }

    /// Returns the URLs of every `Sitemap:` line, in file order
    ///
    /// Sitemap lines are global, so they are collected regardless of the
    /// user-agent group they appear in.
    pub fn sitemaps(&self) -> Vec<String> {
        self.directives()
            .filter(|(key, _)| key == "sitemap")
            .map(|(_, value)| value.to_string())
            .filter(|value| !value.is_empty())
            .collect()
    }

    /// Gets the crawl delay in seconds for a specific user agent
    ///
    /// A group naming the agent wins over the `*` group.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        let agent = user_agent.to_lowercase();
        let mut group: Vec<String> = Vec::new();
        let mut in_agents = false;
        let mut wildcard = None;
        let mut specific = None;

        for (key, value) in self.directives() {
            match key.as_str() {
                "user-agent" => {
                    if !in_agents {
                        group.clear();
                    }
                    in_agents = true;
                    group.push(value.to_lowercase());
                }
                "crawl-delay" => {
                    in_agents = false;
                    let Ok(delay) = value.parse::<f64>() else {
                        continue;
                    };
                    if group.iter().any(|ua| ua != "*" && agent.contains(ua.as_str())) {
                        specific = Some(delay);
                    } else if group.iter().any(|ua| ua == "*") {
                        wildcard = Some(delay);
                    }
                }
                _ => in_agents = false,
            }
        }

        specific.or(wildcard)
    }

    /// Yields `(lowercased key, trimmed value)` for each directive line
    fn directives(&self) -> impl Iterator<Item = (String, &str)> {
        self.content.lines().filter_map(|line| {
            let line = line.split('#').next().unwrap_or_default().trim();
            let (key, value) = line.split_once(':')?;
            Some((key.trim().to_lowercase(), value.trim()))
        })
    }
}
