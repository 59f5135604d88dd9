//! SPDX-License-Identifier: GPL-3.0-or-later
//!
//! Filename-template rendering (spec §4.1). Every template is rendered to a
//! regex: `{{osToken}}`/`{{archToken}}` expand to a case-insensitive
//! alternation of the canonical token and its aliases, everything else is
//! substituted and regex-escaped.

use regex::Regex;

use crate::platform::Platform;

pub struct TemplateContext<'a> {
    pub binary_name: &'a str,
    pub platform: Platform,
    pub asset_name: Option<&'a str>,
    pub base: Option<&'a str>,
}

/// `{{base}}` is `{{asset}}` with the longest matching suffix from
/// `archive_extensions` removed (case-insensitive, longest-suffix-wins).
pub fn compute_base(asset_name: &str, archive_extensions: &[String]) -> String {
    let lower = asset_name.to_ascii_lowercase();
    let mut best: Option<&str> = None;
    for ext in archive_extensions {
        let ext_lower = ext.to_ascii_lowercase();
        if lower.ends_with(&ext_lower) {
            match best {
                Some(b) if b.len() >= ext.len() => {}
                _ => best = Some(ext.as_str()),
            }
        }
    }
    match best {
        Some(ext) => asset_name[..asset_name.len() - ext.len()].to_string(),
        None => asset_name.to_string(),
    }
}

fn alternation(canonical: &str, aliases: &[&str]) -> String {
    let mut parts = vec![regex::escape(canonical)];
    parts.extend(aliases.iter().map(|a| regex::escape(a)));
    format!("(?i:{})", parts.join("|"))
}

fn titlecase(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Renders `template` into a regex pattern string given `ctx`.
pub fn render_template(template: &str, ctx: &TemplateContext) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&regex::escape(&rest[..start]));
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            // Unterminated token: emit the rest verbatim (escaped) and stop.
            out.push_str(&regex::escape(&rest[start..]));
            rest = "";
            break;
        };
        let token = &after[..end];
        out.push_str(&render_token(token, ctx));
        rest = &after[end + 2..];
    }
    out.push_str(&regex::escape(rest));
    out
}

fn render_token(token: &str, ctx: &TemplateContext) -> String {
    match token {
        "binary" => regex::escape(ctx.binary_name),
        "asset" => regex::escape(ctx.asset_name.unwrap_or_default()),
        "base" => regex::escape(ctx.base.unwrap_or_default()),
        "osToken" => alternation(ctx.platform.os.canonical(), ctx.platform.os.aliases()),
        "archToken" => alternation(ctx.platform.arch.canonical(), ctx.platform.arch.aliases()),
        "goos" => regex::escape(ctx.platform.os.from_go_os()),
        "GOOS" => regex::escape(&ctx.platform.os.from_go_os().to_ascii_uppercase()),
        "Goos" => regex::escape(&titlecase(ctx.platform.os.from_go_os())),
        "goarch" => regex::escape(ctx.platform.arch.from_go_arch()),
        "GOARCH" => regex::escape(&ctx.platform.arch.from_go_arch().to_ascii_uppercase()),
        "Goarch" => regex::escape(&titlecase(ctx.platform.arch.from_go_arch())),
        // Unknown token: preserve literally so an operator notices a typo
        // rather than having it silently vanish.
        other => regex::escape(&format!("{{{{{other}}}}}")),
    }
}

/// Compiles a rendered template as a case-insensitive regex.
pub fn compile_pattern(template: &str, ctx: &TemplateContext) -> Result<Regex, regex::Error> {
    let rendered = render_template(template, ctx);
    Regex::new(&format!("(?i){rendered}"))
}

/// Compiles a rendered template anchored for a whole-string match, used by
/// supplemental discovery's "exactly matches a rendered template" rule.
pub fn compile_exact(template: &str, ctx: &TemplateContext) -> Result<Regex, regex::Error> {
    let rendered = render_template(template, ctx);
    Regex::new(&format!("(?i)^(?:{rendered})$"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{ArchToken, OsToken};

    fn ctx() -> TemplateContext<'static> {
        TemplateContext {
            binary_name: "tool",
            platform: Platform {
                os: OsToken::Linux,
                arch: ArchToken::Amd64,
            },
            asset_name: Some("tool_linux_amd64.tar.gz"),
            base: Some("tool_linux_amd64"),
        }
    }

    #[test]
    fn renders_os_and_arch_alternation() {
        let re = compile_pattern("{{binary}}_{{osToken}}_{{archToken}}", &ctx()).unwrap();
        assert!(re.is_match("tool_linux_amd64"));
        assert!(re.is_match("tool_linux_x86_64"));
        assert!(!re.is_match("tool_windows_amd64"));
    }

    #[test]
    fn base_strips_longest_suffix() {
        let exts = vec![".tar.gz".to_string(), ".gz".to_string()];
        assert_eq!(compute_base("tool.tar.gz", &exts), "tool");
    }

    #[test]
    fn renders_asset_and_base_tokens() {
        let rendered = render_template("{{base}}.sha256", &ctx());
        assert_eq!(rendered, format!("{}\\.sha256", regex::escape("tool_linux_amd64")));
    }

    #[test]
    fn escapes_literal_text_preceding_a_token() {
        let re = compile_pattern("v1.0+{{archToken}}", &ctx()).unwrap();
        assert!(re.is_match("v1.0+amd64"));
        // Without escaping, the `.` would match any character and `+` would be
        // an invalid quantifier with nothing to repeat.
        assert!(!re.is_match("v1X0+amd64"));
    }
}
