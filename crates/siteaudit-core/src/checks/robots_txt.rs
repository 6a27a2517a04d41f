//! Robots.txt parser and analyzer
//!
//! Parses robots.txt files into per-agent rule groups and works out how
//! known AI crawlers (GPTBot, ClaudeBot, etc.) are treated.

use std::collections::HashMap;

/// Known AI crawler user agents
pub const AI_CRAWLERS: &[&str] = &[
    "GPTBot",             // OpenAI training
    "ChatGPT-User",       // OpenAI ChatGPT browsing
    "OAI-SearchBot",      // OpenAI search
    "ClaudeBot",          // Anthropic Claude
    "Claude-Web",         // Anthropic Claude web
    "anthropic-ai",       // Anthropic general
    "Google-Extended",    // Google Gemini
    "Applebot-Extended",  // Apple Intelligence
    "PerplexityBot",      // Perplexity AI
    "CCBot",              // Common Crawl
    "Bytespider",         // ByteDance
    "YouBot",             // You.com AI
];

/// Results from parsing robots.txt
#[derive(Debug, Clone, Default)]
pub struct RobotsTxtAnalysis {
    /// Sitemap URLs found
    pub sitemaps: Vec<String>,

    /// Rules per user agent, keyed by the agent as written
    pub agent_rules: HashMap<String, AgentRules>,

    /// AI crawler analysis
    pub ai_crawler_status: Vec<AiCrawlerStatus>,
}

/// Rules for a specific user agent
#[derive(Debug, Clone, Default)]
pub struct AgentRules {
    /// User agent name
    pub user_agent: String,

    /// Disallowed paths
    pub disallow: Vec<String>,

    /// Explicitly allowed paths
    pub allow: Vec<String>,

    /// Crawl delay in seconds
    pub crawl_delay: Option<u32>,

    /// Whether this blocks the entire site (`Disallow: /`)
    pub blocks_all: bool,
}

impl AgentRules {
    fn for_agent(user_agent: &str) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            ..Self::default()
        }
    }

    fn merge(&mut self, other: &AgentRules) {
        self.disallow.extend(other.disallow.iter().cloned());
        self.allow.extend(other.allow.iter().cloned());
        self.crawl_delay = other.crawl_delay.or(self.crawl_delay);
        self.blocks_all |= other.blocks_all;
    }
}

/// Status for a specific AI crawler
#[derive(Debug, Clone)]
pub struct AiCrawlerStatus {
    /// Crawler name
    pub name: String,

    /// Access level
    pub access: AccessLevel,

    /// Whether the crawler has its own `User-agent` group
    pub explicit: bool,
}

/// Access level for a crawler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLevel {
    /// Full access to site
    Allowed,

    /// Partially blocked (some paths disallowed)
    Partial,

    /// Fully blocked
    Blocked,

    /// No specific rules (inherits from *)
    Default,
}

impl RobotsTxtAnalysis {
    /// Rules of the `*` group, if any
    pub fn wildcard(&self) -> Option<&AgentRules> {
        self.agent_rules.get("*")
    }

    /// Whether every crawler is shut out with a bare `Disallow: /`
    pub fn blocks_all_crawlers(&self) -> bool {
        self.wildcard().is_some_and(|rules| rules.blocks_all)
    }

    /// AI crawlers whose own group disallows the whole site
    pub fn blocked_ai_crawlers(&self) -> Vec<&str> {
        self.ai_crawler_status
            .iter()
            .filter(|status| status.explicit && status.access == AccessLevel::Blocked)
            .map(|status| status.name.as_str())
            .collect()
    }
}

/// Parse robots.txt content
///
/// Consecutive `User-agent` lines share one group. Rules that appear before
/// any `User-agent` line are attributed to `*`.
pub fn parse_robots_txt(content: &str) -> RobotsTxtAnalysis {
    let mut analysis = RobotsTxtAnalysis::default();

    let mut current_agents: Vec<String> = Vec::new();
    let mut current_rules = AgentRules::for_agent("*");
    let mut group_has_rules = false;

    for line in content.lines() {
        // Drop trailing comments
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        // Split on first colon
        let Some((directive, value)) = line.split_once(':') else {
            continue;
        };
        let directive = directive.trim().to_ascii_lowercase();
        let value = value.trim();

        match directive.as_str() {
            "user-agent" => {
                if group_has_rules || current_agents.is_empty() {
                    // A new group starts; store the previous one
                    store_group(&mut analysis, &current_agents, &current_rules);
                    current_agents.clear();
                    current_rules = AgentRules::for_agent(value);
                    group_has_rules = false;
                }
                current_agents.push(value.to_string());
            }
            "disallow" => {
                group_has_rules = true;
                if !value.is_empty() {
                    current_rules.disallow.push(value.to_string());
                    if value == "/" {
                        current_rules.blocks_all = true;
                    }
                }
            }
            "allow" => {
                group_has_rules = true;
                if !value.is_empty() {
                    current_rules.allow.push(value.to_string());
                }
            }
            "crawl-delay" => {
                group_has_rules = true;
                if let Ok(delay) = value.parse::<u32>() {
                    current_rules.crawl_delay = Some(delay);
                }
            }
            "sitemap" => {
                if !value.is_empty() {
                    analysis.sitemaps.push(value.to_string());
                }
            }
            _ => {}
        }
    }

    store_group(&mut analysis, &current_agents, &current_rules);
    analysis.ai_crawler_status = analyze_ai_crawlers(&analysis.agent_rules);
    analysis
}

fn store_group(analysis: &mut RobotsTxtAnalysis, agents: &[String], rules: &AgentRules) {
    let orphan = ["*".to_string()];
    let agents = if agents.is_empty() {
        // Rules before the first User-agent line
        if rules.disallow.is_empty() && rules.allow.is_empty() && rules.crawl_delay.is_none() {
            return;
        }
        &orphan[..]
    } else {
        agents
    };

    for agent in agents {
        analysis
            .agent_rules
            .entry(agent.clone())
            .and_modify(|existing| existing.merge(rules))
            .or_insert_with(|| AgentRules {
                user_agent: agent.clone(),
                ..rules.clone()
            });
    }
}

/// Analyze access for known AI crawlers
fn analyze_ai_crawlers(agent_rules: &HashMap<String, AgentRules>) -> Vec<AiCrawlerStatus> {
    AI_CRAWLERS
        .iter()
        .map(|crawler| {
            let own = find_agent(crawler, agent_rules);
            let access = match own.or_else(|| agent_rules.get("*")) {
                Some(rules) => access_for(rules, own.is_some()),
                None => AccessLevel::Default,
            };
            AiCrawlerStatus {
                name: crawler.to_string(),
                access,
                explicit: own.is_some(),
            }
        })
        .collect()
}

/// Case-insensitive lookup of an agent's own group
fn find_agent<'a>(
    crawler: &str,
    agent_rules: &'a HashMap<String, AgentRules>,
) -> Option<&'a AgentRules> {
    agent_rules.get(crawler).or_else(|| {
        agent_rules
            .iter()
            .find(|(agent, _)| agent.eq_ignore_ascii_case(crawler))
            .map(|(_, rules)| rules)
    })
}

fn access_for(rules: &AgentRules, explicit: bool) -> AccessLevel {
    if rules.blocks_all {
        AccessLevel::Blocked
    } else if !rules.disallow.is_empty() {
        AccessLevel::Partial
    } else if explicit {
        AccessLevel::Allowed
    } else {
        AccessLevel::Default
    }
}
