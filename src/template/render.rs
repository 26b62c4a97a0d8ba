use std::collections::HashMap;

use crate::template::{Document, Node, VarName};

/// Values available to a template while rendering.
///
/// A named variable can be absent or present with an empty value; only the
/// latter is a binding, but both count as false in a conditional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variables {
    named: HashMap<String, String>,
    positional: Vec<String>,
}

impl Variables {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_positional(positional: Vec<String>) -> Self {
        Variables {
            named: HashMap::new(),
            positional,
        }
    }

    /// Bind `name`, replacing any earlier value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.named.insert(name.into(), value.into());
    }

    /// Bind `name` only if nothing is bound to it yet.
    pub fn set_default(&mut self, name: &str, value: &str) {
        if !self.named.contains_key(name) {
            self.named.insert(name.to_string(), value.to_string());
        }
    }

    #[must_use]
    pub fn get(&self, name: &VarName) -> Option<&str> {
        match name {
            VarName::Positional(index) => self.positional.get(*index),
            VarName::Named(name) => self.named.get(name),
        }
        .map(String::as_str)
    }

    #[must_use]
    pub fn is_truthy(&self, name: &VarName) -> bool {
        self.get(name).is_some_and(|value| !value.is_empty())
    }

    #[must_use]
    pub fn positional(&self) -> &[String] {
        &self.positional
    }

    /// Named bindings sorted by name.
    #[must_use]
    pub fn named(&self) -> Vec<(&str, &str)> {
        let mut named: Vec<_> = self
            .named
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        named.sort_unstable();
        named
    }
}

/// Render a parsed template. Unbound variables render as empty text.
#[must_use]
pub fn render(doc: &Document, vars: &Variables) -> String {
    let mut out = String::new();
    render_nodes(&doc.nodes, vars, &mut out);
    out
}

fn render_nodes(nodes: &[Node], vars: &Variables, out: &mut String) {
    for node in nodes {
        match node {
            Node::Literal(text) => out.push_str(text),
            Node::Var(name) => out.push_str(vars.get(name).unwrap_or_default()),
            Node::Conditional {
                name,
                then,
                otherwise,
            } => {
                if vars.is_truthy(name) {
                    render_nodes(then, vars, out);
                } else if let Some(otherwise) = otherwise {
                    render_nodes(otherwise, vars, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::parse;

    fn render_str(template: &str, vars: &Variables) -> String {
        render(&parse(template).unwrap(), vars)
    }

    fn vars(pairs: &[(&str, &str)]) -> Variables {
        let mut vars = Variables::new();
        for (name, value) in pairs {
            vars.set(*name, *value);
        }
        vars
    }

    #[test]
    fn test_literal_round_trip() {
        for template in ["", "echo hello", "make -j8 && ./run {x} ?"] {
            assert_eq!(render_str(template, &vars(&[("x", "1")])), template);
        }
    }

    #[test]
    fn test_basic_render() {
        let vars = vars(&[("name", "Christoffer"), ("lastname", "Klang")]);
        assert_eq!(
            render_str("hello ${name} ${   lastname    }!", &vars),
            "hello Christoffer Klang!"
        );
    }

    #[test]
    fn test_absent_variable_renders_empty() {
        assert_eq!(render_str("[${missing}]", &Variables::new()), "[]");
    }

    #[test]
    fn test_escape_is_not_expanded() {
        let vars = vars(&[("NAME", "nope")]);
        assert_eq!(render_str("$$NAME", &vars), "$NAME");
    }

    #[test]
    fn test_conditional_truthiness() {
        let template = "${a?}set${else}unset${end}";
        assert_eq!(render_str(template, &Variables::new()), "unset");
        assert_eq!(render_str(template, &vars(&[("a", "")])), "unset");
        assert_eq!(render_str(template, &vars(&[("a", "yes")])), "set");
    }

    #[test]
    fn test_conditional_without_else() {
        let template = "open ${url?}${url}${end}";
        assert_eq!(render_str(template, &Variables::new()), "open ");
        assert_eq!(render_str(template, &vars(&[("url", "x")])), "open x");
    }

    #[test]
    fn test_nested_conditionals() {
        let template = "${a?}${b?}a&b${else}a&!b${end}${else}${b?}!a&b${else}!a&!b${end}${end}";
        assert_eq!(render_str(template, &Variables::new()), "!a&!b");
        assert_eq!(render_str(template, &vars(&[("a", "a")])), "a&!b");
        assert_eq!(render_str(template, &vars(&[("a", "a"), ("b", "b")])), "a&b");
        assert_eq!(render_str(template, &vars(&[("a", ""), ("b", "b")])), "!a&b");
    }

    #[test]
    fn test_positional_arguments() {
        let vars = Variables::with_positional(vec!["foo".into(), "bar".into()]);
        assert_eq!(render_str("${0} and ${1}", &vars), "foo and bar");
        assert_eq!(render_str("[${5}]", &vars), "[]");
        assert_eq!(render_str("${1?}two${end}${2?}three${end}", &vars), "two");
    }

    #[test]
    fn test_set_default_keeps_existing_value() {
        let mut vars = vars(&[("flags", "/overwrite")]);
        vars.set_default("flags", "--foo bar");
        vars.set_default("other", "x");
        assert_eq!(vars.named(), vec![("flags", "/overwrite"), ("other", "x")]);
    }

    #[test]
    fn test_set_overwrites() {
        let mut vars = vars(&[("first", "one")]);
        vars.set("first", "overwritten");
        assert_eq!(
            vars.get(&VarName::Named("first".into())),
            Some("overwritten")
        );
    }
}
