//! # Inline Roles
//!
//! A role is an inline markup handler: the generator calls it with the
//! text between the backquotes of ``:name:`text` `` and splices the
//! returned nodes into the document.
//!
//! - [`BattmoReferenceRole`] — ``:battmo:`runBatteryP2D#42` `` becomes a
//!   [`ReferenceNode`] linking to the located source line.
//! - [`ClassRole`] — wraps its text in an [`InlineNode`] carrying a CSS
//!   class (``:todo:`check units` ``).
//!
//! Roles live in a [`RoleRegistry`] owned by the host; nothing is
//! registered until the host calls [`crate::setup`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use battmo_core::SourceConfig;

use crate::error::DocsError;
use crate::link::{SourceLinkBuilder, SourceReference};
use crate::locate::SourceLocator;

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

/// External hyperlink produced by a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceNode {
    /// The complete markup the node was produced from.
    pub rawsource: String,
    /// Display text.
    pub text: String,
    /// Absolute link target.
    pub refuri: String,
    pub classes: Vec<String>,
}

/// Inline text carrying CSS classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineNode {
    pub rawsource: String,
    pub text: String,
    pub classes: Vec<String>,
}

/// A node returned by a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Reference(ReferenceNode),
    Inline(InlineNode),
}

/// Output markup for [`Node::render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderFormat {
    /// reStructuredText; links become anonymous external hyperlinks.
    #[default]
    Rst,
    Html,
    Markdown,
}

impl Node {
    /// Render the node as markup in `format`.
    pub fn render(&self, format: RenderFormat) -> String {
        match (self, format) {
            (Node::Reference(r), RenderFormat::Rst) => {
                format!("`{} <{}>`__", escape_rst(&r.text), r.refuri)
            }
            (Node::Reference(r), RenderFormat::Html) => format!(
                "<a class=\"{}\" href=\"{}\">{}</a>",
                class_attr("reference external", &r.classes),
                escape_html(&r.refuri),
                escape_html(&r.text)
            ),
            (Node::Reference(r), RenderFormat::Markdown) => {
                format!("[{}]({})", r.text.replace(']', "\\]"), r.refuri)
            }
            // The generator understands the role itself; leave it in place.
            (Node::Inline(n), RenderFormat::Rst) => n.rawsource.clone(),
            (Node::Inline(n), RenderFormat::Html | RenderFormat::Markdown) => format!(
                "<span class=\"{}\">{}</span>",
                class_attr("", &n.classes),
                escape_html(&n.text)
            ),
        }
    }
}

fn class_attr(base: &str, classes: &[String]) -> String {
    let mut parts: Vec<&str> = base.split_whitespace().collect();
    parts.extend(classes.iter().map(String::as_str));
    escape_html(&parts.join(" "))
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_rst(text: &str) -> String {
    text.replace('\\', "\\\\").replace('<', "\\<").replace('`', "\\`")
}

// ---------------------------------------------------------------------------
// Role trait and registry
// ---------------------------------------------------------------------------

/// Options given to a role invocation (`class` and friends).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleOptions {
    options: BTreeMap<String, String>,
}

impl RoleOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    /// The `class` option split into class names (the generator's
    /// `classes` normalization).
    pub fn classes(&self) -> Vec<String> {
        self.get("class")
            .map(|c| c.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

/// One call of a role.
#[derive(Debug, Clone, Copy)]
pub struct RoleInvocation<'a> {
    /// Role name as written in the markup.
    pub name: &'a str,
    /// The complete markup, e.g. ``:battmo:`f#3` ``.
    pub rawtext: &'a str,
    /// Text between the backquotes, still escaped.
    pub text: &'a str,
    /// 1-based line of the markup.
    pub lineno: usize,
    pub options: &'a RoleOptions,
}

/// An inline markup handler.
pub trait Role: Send + Sync {
    /// Expand one occurrence into nodes.
    fn run(&self, invocation: &RoleInvocation<'_>) -> Result<Vec<Node>, DocsError>;
}

/// Roles known to the host, by name.
#[derive(Default)]
pub struct RoleRegistry {
    roles: BTreeMap<String, Box<dyn Role>>,
}

impl fmt::Debug for RoleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoleRegistry")
            .field("roles", &self.names())
            .finish()
    }
}

impl RoleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `role` under `name`, replacing any role of that name.
    pub fn register(&mut self, name: impl Into<String>, role: impl Role + 'static) {
        let name = name.into();
        if self.roles.insert(name.clone(), Box::new(role)).is_some() {
            tracing::warn!(role = %name, "replaced previously registered role");
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Role> {
        self.roles.get(name).map(|r| r.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.roles.contains_key(name)
    }

    /// Registered role names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.roles.keys().map(String::as_str).collect()
    }

    /// Run the role named in `invocation`.
    pub fn invoke(&self, invocation: &RoleInvocation<'_>) -> Result<Vec<Node>, DocsError> {
        let role = self.get(invocation.name).ok_or_else(|| DocsError::UnknownRole {
            name: invocation.name.to_string(),
        })?;
        role.run(invocation)
    }
}

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

/// Remove backslash escapes from role text.
///
/// An escaped whitespace character disappears together with its
/// backslash; any other escaped character is kept literally.
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(next) if next.is_whitespace() => {}
            Some(next) => out.push(next),
            None => out.push('\\'),
        }
    }
    out
}

/// The `:battmo:` role: link to a MATLAB source file, optionally to a line.
#[derive(Debug, Clone)]
pub struct BattmoReferenceRole {
    locator: SourceLocator,
    links: SourceLinkBuilder,
}

impl BattmoReferenceRole {
    pub fn new(locator: SourceLocator, links: SourceLinkBuilder) -> Self {
        Self { locator, links }
    }

    /// Build the role from the `source` section of the configuration.
    pub fn from_config(source_root: &Path, source: &SourceConfig) -> Result<Self, DocsError> {
        let locator = SourceLocator::new(
            source_root,
            source.ignored_dirs.iter().cloned(),
            source.extension.clone(),
        );
        let links = SourceLinkBuilder::new(&source.repo_url, source.branch.clone())?;
        Ok(Self::new(locator, links))
    }

    pub fn locator(&self) -> &SourceLocator {
        &self.locator
    }

    /// Resolve a reference text to its link.
    pub fn resolve(&self, text: &str) -> Result<(SourceReference, url::Url), DocsError> {
        let reference: SourceReference = unescape(text).parse()?;
        let path = self.locator.locate_identifier(&reference.identifier)?;
        let url = self.links.link(&path, reference.line);
        Ok((reference, url))
    }
}

impl Role for BattmoReferenceRole {
    fn run(&self, invocation: &RoleInvocation<'_>) -> Result<Vec<Node>, DocsError> {
        let (reference, url) = self.resolve(invocation.text)?;
        Ok(vec![Node::Reference(ReferenceNode {
            rawsource: invocation.rawtext.to_string(),
            text: reference.identifier,
            refuri: url.into(),
            classes: invocation.options.classes(),
        })])
    }
}

/// A role that only attaches a CSS class to its text.
#[derive(Debug, Clone)]
pub struct ClassRole {
    class: String,
}

impl ClassRole {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
        }
    }
}

impl Role for ClassRole {
    fn run(&self, invocation: &RoleInvocation<'_>) -> Result<Vec<Node>, DocsError> {
        let mut classes = vec![self.class.clone()];
        classes.extend(invocation.options.classes());
        Ok(vec![Node::Inline(InlineNode {
            rawsource: invocation.rawtext.to_string(),
            text: unescape(invocation.text),
            classes,
        })])
    }
}
