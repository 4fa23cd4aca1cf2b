//! Robots.txt parser implementation
//!
//! Tokenizing is done by the robotstxt crate; only `User-agent` and
//! `Disallow` are interpreted. Rules are plain path prefixes; `Allow`,
//! wildcards and `Crawl-delay` are ignored.

use robotstxt::{parse_robotstxt, RobotsParseHandler};
use std::collections::BTreeSet;

/// Disallowed path prefixes that apply to this crawler on one host
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RobotsRules {
    disallowed: BTreeSet<String>,
}

/// Collects `Disallow` values from the groups that name this crawler
struct GroupCollector<'a> {
    agent: &'a str,
    disallowed: BTreeSet<String>,
    group_applies: bool,
    in_agent_lines: bool,
}

impl<'a> GroupCollector<'a> {
    fn new(agent: &'a str) -> Self {
        Self {
            agent,
            disallowed: BTreeSet::new(),
            group_applies: false,
            in_agent_lines: false,
        }
    }
}

impl RobotsParseHandler for GroupCollector<'_> {
    fn handle_robots_start(&mut self) {}

    fn handle_robots_end(&mut self) {}

    fn handle_user_agent(&mut self, _line_num: u32, user_agent: &str) {
        // A user-agent line after any rule opens a new group
        if !self.in_agent_lines {
            self.group_applies = false;
            self.in_agent_lines = true;
        }
        self.group_applies |= agent_matches(user_agent, self.agent);
    }

    fn handle_allow(&mut self, _line_num: u32, _value: &str) {
        self.in_agent_lines = false;
    }

    fn handle_disallow(&mut self, _line_num: u32, value: &str) {
        self.in_agent_lines = false;
        if self.group_applies && !value.is_empty() {
            self.disallowed.insert(value.to_string());
        }
    }

    fn handle_sitemap(&mut self, _line_num: u32, _value: &str) {
        self.in_agent_lines = false;
    }

    fn handle_unknown_action(&mut self, _line_num: u32, _action: &str, _value: &str) {
        self.in_agent_lines = false;
    }
}

/// Tests a `User-agent` value against the crawler name
///
/// `*` matches everyone. Otherwise the product token (text before the first
/// `/` or whitespace) must equal `agent`, ignoring ASCII case.
fn agent_matches(user_agent: &str, agent: &str) -> bool {
    let user_agent = user_agent.trim();
    if user_agent == "*" || user_agent.starts_with("* ") || user_agent.starts_with("*\t") {
        return true;
    }

    let product = user_agent
        .split(|c: char| c == '/' || c.is_whitespace())
        .next()
        .unwrap_or_default();
    !product.is_empty() && product.eq_ignore_ascii_case(agent.trim())
}

impl RobotsRules {
    /// Creates a permissive rule set that allows everything
    ///
    /// This is recorded when robots.txt cannot be fetched.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Parses robots.txt content for the given crawler identity
    ///
    /// Consecutive `User-agent` lines form one group. A group applies when any
    /// of its lines is `*` or names `agent` as its product token.
    /// `Disallow` lines of applying groups are collected; empty values are
    /// skipped since they allow everything.
    ///
    /// # Example
    ///
    /// ```
    /// use focus_crawl::robots::RobotsRules;
    ///
    /// let rules = RobotsRules::parse("User-agent: *\nDisallow: /private", "FocusCrawl");
    /// assert!(!rules.is_allowed("/private/x"));
    /// assert!(rules.is_allowed("/public"));
    /// ```
    pub fn parse(content: &str, agent: &str) -> Self {
        let mut collector = GroupCollector::new(agent);
        parse_robotstxt(content, &mut collector);

        Self {
            disallowed: collector.disallowed,
        }
    }

    /// Checks whether a URL path is allowed
    ///
    /// A path is disallowed when it starts with any collected prefix.
    pub fn is_allowed(&self, path: &str) -> bool {
        !self
            .disallowed
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Number of disallowed prefixes
    pub fn len(&self) -> usize {
        self.disallowed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.disallowed.is_empty()
    }
}
