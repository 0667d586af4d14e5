// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prompt template rendering.
//!
//! Implements the `{{ ... }}` substitution language used by Task prompts and
//! TaskSpawner item templates. The data root is a single map:
//!
//! - `.Deps` — dependency outputs, addressed as
//!   `{{ index .Deps "name" "Outputs" 0 }}` or `{{ .Deps.name.Name }}`
//! - bare fields — per-item values for spawned prompts, e.g. `{{ .Title }}`
//!
//! Rendering is strict: an unknown dependency, field, or out-of-range index
//! is an error. Callers fall back to the raw prompt on error.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use thiserror::Error;

/// Regex matching a `{{ ... }}` placeholder (non-greedy inner expression).
// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^{}]*)\}\}").expect("constant regex pattern is valid"));

/// One dependency's rendered view: its name and captured output lines.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DepOutputs {
    pub name: String,
    pub outputs: Vec<String>,
}

/// Root data for a render pass.
#[derive(Debug, Clone, Default)]
pub struct TemplateData {
    deps: BTreeMap<String, DepOutputs>,
    fields: BTreeMap<String, String>,
}

impl TemplateData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dependency under `.Deps`.
    pub fn with_dep(mut self, name: impl Into<String>, outputs: Vec<String>) -> Self {
        let name = name.into();
        self.deps.insert(name.clone(), DepOutputs { name, outputs });
        self
    }

    /// Register a bare field, addressed as `{{ .Field }}`.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

/// Rendering failure. Any variant makes the caller keep the raw prompt.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("malformed template expression: {0}")]
    Syntax(String),
    #[error("unknown dependency {0:?}")]
    UnknownDependency(String),
    #[error("unknown field {0:?}")]
    UnknownField(String),
    #[error("dependency {dep:?} attribute {attr:?} is not addressable")]
    UnknownAttribute { dep: String, attr: String },
    #[error("output index {index} out of range for dependency {dep:?} ({len} outputs)")]
    IndexOutOfRange { dep: String, index: usize, len: usize },
}

/// Render `template` against `data`, strictly.
pub fn render(template: &str, data: &TemplateData) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    for caps in PLACEHOLDER.captures_iter(template) {
        // Allow indexing: get(0) always exists for a match
        #[allow(clippy::expect_used)]
        let whole = caps.get(0).expect("match group 0 is always present");
        out.push_str(&template[last..whole.start()]);
        let expr = caps[1].trim().to_string();
        out.push_str(&eval(&expr, data)?);
        last = whole.end();
    }
    out.push_str(&template[last..]);
    Ok(out)
}

/// Evaluate a single placeholder expression.
fn eval(expr: &str, data: &TemplateData) -> Result<String, TemplateError> {
    let tokens = tokenize(expr)?;
    match tokens.split_first() {
        Some((Token::Ident(head), rest)) if head == "index" => eval_index(expr, rest, data),
        Some((Token::Path(segments), [])) => eval_path(expr, segments, data),
        _ => Err(TemplateError::Syntax(expr.to_string())),
    }
}

/// `index .Deps "name" "Outputs" i` and `index .Deps "name" "Name"`.
fn eval_index(expr: &str, args: &[Token], data: &TemplateData) -> Result<String, TemplateError> {
    let [Token::Path(root), rest @ ..] = args else {
        return Err(TemplateError::Syntax(expr.to_string()));
    };
    if root.as_slice() != ["Deps"] {
        return Err(TemplateError::Syntax(expr.to_string()));
    }
    let (name, attr, index) = match rest {
        [Token::Str(name), Token::Str(attr)] => (name, attr, None),
        [Token::Str(name), Token::Str(attr), Token::Int(i)] => (name, attr, Some(*i)),
        _ => return Err(TemplateError::Syntax(expr.to_string())),
    };
    let dep = data
        .deps
        .get(name.as_str())
        .ok_or_else(|| TemplateError::UnknownDependency(name.clone()))?;
    dep_attr(dep, attr, index)
}

/// Dotted lookups: `.Deps.name.Name`, `.Field`.
fn eval_path(expr: &str, segments: &[String], data: &TemplateData) -> Result<String, TemplateError> {
    match segments {
        [field] => data
            .fields
            .get(field)
            .cloned()
            .ok_or_else(|| TemplateError::UnknownField(field.clone())),
        [root, name, attr] if root == "Deps" => {
            let dep = data
                .deps
                .get(name)
                .ok_or_else(|| TemplateError::UnknownDependency(name.clone()))?;
            dep_attr(dep, attr, None)
        }
        _ => Err(TemplateError::Syntax(expr.to_string())),
    }
}

fn dep_attr(dep: &DepOutputs, attr: &str, index: Option<usize>) -> Result<String, TemplateError> {
    match (attr, index) {
        ("Name", None) => Ok(dep.name.clone()),
        ("Outputs", Some(i)) => dep.outputs.get(i).cloned().ok_or(TemplateError::IndexOutOfRange {
            dep: dep.name.clone(),
            index: i,
            len: dep.outputs.len(),
        }),
        // A bare Outputs lookup renders all lines joined by newlines.
        ("Outputs", None) => Ok(dep.outputs.join("\n")),
        _ => Err(TemplateError::UnknownAttribute { dep: dep.name.clone(), attr: attr.to_string() }),
    }
}

/// Expression token.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    /// Bare word, e.g. `index`.
    Ident(String),
    /// Dotted path with the leading dot stripped, e.g. `.Deps.A` → `["Deps", "A"]`.
    Path(Vec<String>),
    /// Double-quoted string literal.
    Str(String),
    /// Non-negative integer literal.
    Int(usize),
}

/// Quote-aware whitespace tokenizer.
fn tokenize(expr: &str) -> Result<Vec<Token>, TemplateError> {
    let mut tokens = Vec::new();
    let mut chars = expr.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == '"' {
            chars.next();
            let mut lit = String::new();
            loop {
                match chars.next() {
                    Some('"') => break,
                    Some(ch) => lit.push(ch),
                    None => return Err(TemplateError::Syntax(expr.to_string())),
                }
            }
            tokens.push(Token::Str(lit));
        } else {
            let mut word = String::new();
            while let Some(&ch) = chars.peek() {
                if ch.is_whitespace() {
                    break;
                }
                word.push(ch);
                chars.next();
            }
            tokens.push(classify(expr, word)?);
        }
    }
    Ok(tokens)
}

fn classify(expr: &str, word: String) -> Result<Token, TemplateError> {
    if let Some(path) = word.strip_prefix('.') {
        if path.is_empty() || path.split('.').any(str::is_empty) {
            return Err(TemplateError::Syntax(expr.to_string()));
        }
        return Ok(Token::Path(path.split('.').map(str::to_string).collect()));
    }
    if word.chars().all(|c| c.is_ascii_digit()) {
        return word
            .parse()
            .map(Token::Int)
            .map_err(|_| TemplateError::Syntax(expr.to_string()));
    }
    Ok(Token::Ident(word))
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
