//! Path-query evaluation — slash-separated tree addressing over a parsed
//! page snapshot.
//!
//! Supports absolute (`/html/body/div[2]`) and descendant (`//span`) steps,
//! `*` wildcards, 1-based `[n]` indices, and `[@attr='value']` attribute
//! predicates. Results are an ordered snapshot of the tree at call time,
//! never live-updating.

use std::collections::HashSet;

use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::{ElementRef, Html};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    /// 1-based position within the step's matches under one context node.
    Index(usize),
    Attr(String, String),
}

#[derive(Debug)]
struct Step {
    axis: Axis,
    name: String,
    predicate: Option<Predicate>,
}

impl Step {
    fn matches_name(&self, el: &ElementRef<'_>) -> bool {
        self.name == "*" || el.value().name() == self.name
    }
}

/// Evaluate a path query against a parsed document, returning matching
/// elements in document order.
pub fn evaluate<'a>(doc: &'a Html, expr: &str) -> Result<Vec<ElementRef<'a>>, String> {
    let steps = parse(expr)?;

    let mut context: Vec<NodeRef<'a, Node>> = vec![doc.tree.root()];
    for step in &steps {
        let mut next: Vec<ElementRef<'a>> = Vec::new();
        for node in &context {
            let mut matches: Vec<ElementRef<'a>> = match step.axis {
                Axis::Child => node
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|el| step.matches_name(el))
                    .collect(),
                Axis::Descendant => node
                    .descendants()
                    .skip(1)
                    .filter_map(ElementRef::wrap)
                    .filter(|el| step.matches_name(el))
                    .collect(),
            };

            match &step.predicate {
                Some(Predicate::Index(n)) => {
                    matches = matches.into_iter().nth(n - 1).into_iter().collect();
                }
                Some(Predicate::Attr(name, value)) => {
                    matches.retain(|el| el.value().attr(name) == Some(value.as_str()));
                }
                None => {}
            }

            next.extend(matches);
        }

        let mut seen = HashSet::new();
        next.retain(|el| seen.insert(el.id()));
        context = next.iter().map(|el| **el).collect();
    }

    Ok(context
        .into_iter()
        .filter_map(ElementRef::wrap)
        .collect())
}

fn parse(expr: &str) -> Result<Vec<Step>, String> {
    let mut rest = expr.trim();
    if rest.is_empty() {
        return Err("empty path query".into());
    }
    if !rest.starts_with('/') {
        return Err(format!("path query must start with '/': {}", expr));
    }

    let mut steps = Vec::new();
    while !rest.is_empty() {
        let axis = if let Some(r) = rest.strip_prefix("//") {
            rest = r;
            Axis::Descendant
        } else if let Some(r) = rest.strip_prefix('/') {
            rest = r;
            Axis::Child
        } else {
            return Err(format!("malformed path query near '{}'", rest));
        };

        let end = rest.find('/').unwrap_or(rest.len());
        let token = &rest[..end];
        rest = &rest[end..];

        if token.is_empty() {
            return Err("empty step in path query".into());
        }
        steps.push(parse_step(axis, token)?);
    }

    Ok(steps)
}

fn parse_step(axis: Axis, token: &str) -> Result<Step, String> {
    let (name, predicate) = match token.find('[') {
        Some(open) => {
            if !token.ends_with(']') {
                return Err(format!("unterminated predicate in step '{}'", token));
            }
            let inner = &token[open + 1..token.len() - 1];
            (&token[..open], Some(parse_predicate(inner)?))
        }
        None => (token, None),
    };

    if name.is_empty() {
        return Err(format!("missing element name in step '{}'", token));
    }
    let valid = name == "*"
        || name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(format!("invalid element name '{}'", name));
    }

    Ok(Step {
        axis,
        name: name.to_ascii_lowercase(),
        predicate,
    })
}

fn parse_predicate(inner: &str) -> Result<Predicate, String> {
    if let Some(attr) = inner.strip_prefix('@') {
        let (name, value) = attr
            .split_once('=')
            .ok_or_else(|| format!("attribute predicate needs '=': [{}]", inner))?;
        let value = value
            .strip_prefix('\'')
            .and_then(|v| v.strip_suffix('\''))
            .or_else(|| value.strip_prefix('"').and_then(|v| v.strip_suffix('"')))
            .ok_or_else(|| format!("attribute value must be quoted: [{}]", inner))?;
        return Ok(Predicate::Attr(name.trim().to_string(), value.to_string()));
    }

    let index: usize = inner
        .trim()
        .parse()
        .map_err(|_| format!("invalid index predicate: [{}]", inner))?;
    if index == 0 {
        return Err("index predicates are 1-based".into());
    }
    Ok(Predicate::Index(index))
}
