//! Placeholder substitution on parsed YAML.
//!
//! The template is parsed first and placeholders are filled scalar by
//! scalar, so substituted values never change the document's structure. A
//! scalar that is exactly one placeholder takes the variable's value with
//! its type (string, number, bool, list or record). A placeholder embedded
//! in a longer scalar is replaced by the value's text inside that string.

use std::sync::LazyLock;

use regex::Regex;
use serde_yaml::Value as YamlValue;
use tracing::debug;

use crate::error::{TemplateError, TemplateResult};
use crate::renderer::{
    count_lines, parse_path, resolve, substitute, text_value, TemplateRenderer, PLACEHOLDER,
};
use crate::vars::Variables;

/// A serialized scalar that a YAML 1.1 reader takes as a boolean.
static YAML11_BOOLEAN_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(\s*(?:- )*(?:(?:'[^']*'|"[^"]*"|[^\s'"][^:]*): )?)((?i:y|yes|n|no|on|off))$"#)
        .expect("boolean pattern is valid")
});

/// A line opening a literal or folded block scalar.
static BLOCK_SCALAR_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^\s*|: |- )[|>][0-9]?[+-]?[0-9]?$").expect("block scalar pattern is valid")
});

impl TemplateRenderer {
    /// Parse `template` as YAML and fill its placeholders in the tree.
    pub fn render_yaml(
        &self,
        name: &str,
        template: &str,
        variables: &Variables,
    ) -> TemplateResult<YamlValue> {
        // Resolve everything up front so errors keep their line numbers.
        let (_, substitutions) = substitute(name, template, variables, |_| Some(String::new()))?;

        if is_blank_document(template) {
            return Ok(YamlValue::Null);
        }

        let mut document: YamlValue =
            serde_yaml::from_str(template).map_err(|source| TemplateError::Yaml {
                template: name.to_string(),
                source,
            })?;

        let filler = TreeFiller {
            name,
            template,
            variables,
        };
        filler.fill(&mut document)?;

        debug!("Rendered YAML template {} ({} substitutions)", name, substitutions);
        Ok(document)
    }
}

/// Whether `text` holds only comments, blank lines or document markers.
pub fn is_blank_document(text: &str) -> bool {
    text.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with('#') || line == "---")
}

struct TreeFiller<'a> {
    name: &'a str,
    template: &'a str,
    variables: &'a Variables,
}

impl TreeFiller<'_> {
    fn fill(&self, node: &mut YamlValue) -> TemplateResult<()> {
        match node {
            YamlValue::String(text) => {
                if let Some(filled) = self.fill_scalar(text)? {
                    *node = filled;
                }
            }
            YamlValue::Sequence(items) => {
                for item in items {
                    self.fill(item)?;
                }
            }
            YamlValue::Mapping(mapping) => {
                for (mut key, mut value) in std::mem::take(mapping) {
                    self.fill(&mut key)?;
                    self.fill(&mut value)?;
                    mapping.insert(key, value);
                }
            }
            YamlValue::Tagged(tagged) => self.fill(&mut tagged.value)?,
            YamlValue::Null | YamlValue::Bool(_) | YamlValue::Number(_) => {}
        }
        Ok(())
    }

    fn fill_scalar(&self, text: &str) -> TemplateResult<Option<YamlValue>> {
        let Some(first) = PLACEHOLDER.find(text) else {
            return Ok(None);
        };

        if first.start() == 0 && first.end() == text.len() {
            let line = self.line_of(first.as_str());
            let expr = PLACEHOLDER
                .captures(text)
                .and_then(|caps| caps.get(1))
                .map_or("", |m| m.as_str());
            let path = parse_path(self.name, expr, line)?;
            let value = resolve(self.name, &path, self.variables, line)?;
            let typed = serde_yaml::to_value(value).map_err(|source| TemplateError::Yaml {
                template: self.name.to_string(),
                source,
            })?;
            return Ok(Some(typed));
        }

        let mut output = String::with_capacity(text.len());
        let mut last = 0;
        for caps in PLACEHOLDER.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            let line = self.line_of(whole.as_str());
            let expr = caps.get(1).map_or("", |m| m.as_str());
            let path = parse_path(self.name, expr, line)?;
            let value = resolve(self.name, &path, self.variables, line)?;
            let rendered = text_value(value).ok_or_else(|| TemplateError::NotScalar {
                template: self.name.to_string(),
                path: path.to_string(),
                line,
            })?;

            output.push_str(&text[last..whole.start()]);
            output.push_str(&rendered);
            last = whole.end();
        }
        output.push_str(&text[last..]);

        Ok(Some(YamlValue::String(output)))
    }

    fn line_of(&self, placeholder: &str) -> usize {
        self.template
            .find(placeholder)
            .map_or(1, |offset| count_lines(&self.template[..offset]) + 1)
    }
}

/// Serialize `document` as YAML text.
///
/// Strings such as `yes` or `off` are written quoted, since the director
/// reads YAML 1.1 where those plain words are booleans.
pub fn to_yaml_string(document: &YamlValue) -> Result<String, serde_yaml::Error> {
    let text = serde_yaml::to_string(document)?;
    Ok(quote_yaml11_booleans(&text))
}

fn quote_yaml11_booleans(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut block_parent: Option<usize> = None;

    for line in text.split_inclusive('\n') {
        let content = line.trim_end_matches('\n');
        let indent = content.len() - content.trim_start().len();

        if let Some(parent) = block_parent {
            if content.trim().is_empty() || indent > parent {
                output.push_str(line);
                continue;
            }
            block_parent = None;
        }

        if BLOCK_SCALAR_LINE.is_match(content) {
            block_parent = Some(indent);
            output.push_str(line);
            continue;
        }

        match YAML11_BOOLEAN_LINE.captures(content) {
            Some(caps) => {
                output.push_str(&caps[1]);
                output.push('\'');
                output.push_str(&caps[2]);
                output.push('\'');
                if line.ends_with('\n') {
                    output.push('\n');
                }
            }
            None => output.push_str(line),
        }
    }

    output
}
