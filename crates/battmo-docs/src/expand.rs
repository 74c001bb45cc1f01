//! # Role Expansion
//!
//! Rewrites every ``:name:`text` `` occurrence of a registered role in a
//! document into rendered markup. Occurrences of roles that are not
//! registered are copied through unchanged.
//!
//! A role only starts where inline markup may start: at the beginning of
//! the text or after a character that is not alphanumeric. Inside the
//! backquotes a backslash escapes the next character, including a
//! backquote.

use crate::error::DocsError;
use crate::role::{RenderFormat, RoleInvocation, RoleOptions, RoleRegistry};

/// A role occurrence found in the source text. Offsets are byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RoleMarkup<'a> {
    name: &'a str,
    text: &'a str,
    start: usize,
    end: usize,
}

/// Expand registered roles in `source`.
///
/// # Errors
///
/// - `DocsError::UnterminatedRole` if a role's backquoted text never closes.
/// - `DocsError::RoleFailed` wrapping the first role failure, with its line.
pub fn expand_roles(
    source: &str,
    registry: &RoleRegistry,
    format: RenderFormat,
) -> Result<String, DocsError> {
    let options = RoleOptions::new();
    let mut out = String::with_capacity(source.len());
    let mut copied = 0;
    let mut search = 0;
    let mut expanded = 0usize;

    while let Some(offset) = source[search..].find(':') {
        let start = search + offset;
        let Some(markup) = parse_role_at(source, start)? else {
            search = start + 1;
            continue;
        };

        out.push_str(&source[copied..markup.start]);
        let rawtext = &source[markup.start..markup.end];

        if registry.contains(markup.name) {
            let lineno = line_of(source, markup.start);
            let invocation = RoleInvocation {
                name: markup.name,
                rawtext,
                text: markup.text,
                lineno,
                options: &options,
            };
            let nodes = registry
                .invoke(&invocation)
                .map_err(|e| DocsError::RoleFailed {
                    name: markup.name.to_string(),
                    line: lineno,
                    source: Box::new(e),
                })?;
            for node in &nodes {
                out.push_str(&node.render(format));
            }
            expanded += 1;
        } else {
            out.push_str(rawtext);
        }

        copied = markup.end;
        search = markup.end;
    }

    out.push_str(&source[copied..]);
    tracing::debug!(expanded, "expanded roles");
    Ok(out)
}

/// Try to read a role starting at the `:` at byte `start`.
fn parse_role_at(source: &str, start: usize) -> Result<Option<RoleMarkup<'_>>, DocsError> {
    let bytes = source.as_bytes();

    if start > 0 && bytes[start - 1].is_ascii_alphanumeric() {
        return Ok(None);
    }

    let name_start = start + 1;
    let name_len = bytes[name_start..]
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'+'))
        .count();
    let name_end = name_start + name_len;
    if name_len == 0 || bytes.get(name_end) != Some(&b':') || bytes.get(name_end + 1) != Some(&b'`')
    {
        return Ok(None);
    }
    let name = &source[name_start..name_end];

    let text_start = name_end + 2;
    let mut i = text_start;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'`' => {
                return Ok(Some(RoleMarkup {
                    name,
                    text: &source[text_start..i],
                    start,
                    end: i + 1,
                }))
            }
            _ => i += 1,
        }
    }

    Err(DocsError::UnterminatedRole {
        name: name.to_string(),
        line: line_of(source, start),
    })
}

fn line_of(source: &str, offset: usize) -> usize {
    source[..offset].bytes().filter(|&b| b == b'\n').count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::ClassRole;

    fn registry() -> RoleRegistry {
        let mut registry = RoleRegistry::new();
        registry.register("todo", ClassRole::new("todo"));
        registry
    }

    #[test]
    fn finds_simple_role() {
        let markup = parse_role_at("x :todo:`a b` y", 2).unwrap().unwrap();
        assert_eq!(markup.name, "todo");
        assert_eq!(markup.text, "a b");
        assert_eq!((markup.start, markup.end), (2, 13));
    }

    #[test]
    fn escaped_backquote_does_not_close() {
        let source = r":todo:`a\`b` rest";
        let markup = parse_role_at(source, 0).unwrap().unwrap();
        assert_eq!(markup.text, r"a\`b");
    }

    #[test]
    fn not_a_role() {
        for source in ["Example::", "a:todo:`x`", "time 12:30", ":todo: `x`", ":`x`"] {
            let start = source.find(':').unwrap();
            assert!(parse_role_at(source, start).unwrap().is_none(), "{source}");
        }
    }

    #[test]
    fn unterminated_role_reports_line() {
        let err = expand_roles("ok\nsee :todo:`never closed", &registry(), RenderFormat::Html)
            .unwrap_err();
        match err {
            DocsError::UnterminatedRole { name, line } => {
                assert_eq!(name, "todo");
                assert_eq!(line, 2);
            }
            other => panic!("expected UnterminatedRole, got {other}"),
        }
    }

    #[test]
    fn expands_registered_and_keeps_unknown() {
        let source = "Note :todo:`fix` and :math:`x^2`.\n";
        let out = expand_roles(source, &registry(), RenderFormat::Html).unwrap();
        assert_eq!(
            out,
            "Note <span class=\"todo\">fix</span> and :math:`x^2`.\n"
        );
    }

    #[test]
    fn text_without_roles_is_unchanged() {
        let source = "Plain text: with colons, `literals` and ü.\n";
        let out = expand_roles(source, &registry(), RenderFormat::Rst).unwrap();
        assert_eq!(out, source);
    }

    #[test]
    fn role_failure_carries_line() {
        struct Failing;
        impl crate::role::Role for Failing {
            fn run(&self, _: &RoleInvocation<'_>) -> Result<Vec<crate::role::Node>, DocsError> {
                Err(DocsError::UnknownRole { name: "inner".into() })
            }
        }
        let mut registry = RoleRegistry::new();
        registry.register("bad", Failing);
        let err = expand_roles("\n\n:bad:`x`", &registry, RenderFormat::Rst).unwrap_err();
        assert!(matches!(err, DocsError::RoleFailed { line: 3, .. }), "got {err}");
    }
}
