//! `{{path}}` interpolation and repeat expansion over component trees.
//!
//! Only dot-path lookups are supported (`offers.0.title`); there is no expression language.
use std::borrow::Cow;

use regex::{Captures, Regex};
use serde_json::Value;

use crate::model::{Component, DataMap, Repeat};

/// Walk `path` through `data`, treating each segment as an object key or a numeric array index.
///
/// Returns `None` when any step is missing or `null`, which is distinct from a present but falsy
/// value such as `false`, `0` or `""`.
pub fn resolve_path<'d>(path: &str, data: &'d DataMap) -> Option<&'d Value> {
    let mut segments = path.split('.');
    let root = segments.next().filter(|s| !s.is_empty())?;

    let mut current = data.get(root)?;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    match current {
        Value::Null => None,
        value => Some(value),
    }
}

fn stringify(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s),
        Value::Null => Cow::Borrowed(""),
        other => Cow::Owned(other.to_string()),
    }
}

pub struct TemplateResolver {
    exact: Regex,
    embedded: Regex,
}

impl Default for TemplateResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateResolver {
    pub fn new() -> Self {
        TemplateResolver {
            exact: Regex::new(r"^\{\{([^{}]*)\}\}$").expect("exact template pattern is valid"),
            embedded: Regex::new(r"\{\{([^{}]*)\}\}").expect("embedded template pattern is valid"),
        }
    }

    /// Interpolate a single string.
    ///
    /// A string that is exactly one `{{path}}` keeps the native type of the resolved value. Any
    /// other string has each expression stringified in place. Unresolved expressions become `""`
    /// in both modes.
    pub fn interpolate(&self, template: &str, data: &DataMap) -> Value {
        if let Some(captures) = self.exact.captures(template) {
            return resolve_path(captures[1].trim(), data)
                .cloned()
                .unwrap_or_else(|| Value::String(String::new()));
        }

        let rendered = self.embedded.replace_all(template, |captures: &Captures| {
            resolve_path(captures[1].trim(), data)
                .map(|value| stringify(value).into_owned())
                .unwrap_or_default()
        });
        Value::String(rendered.into_owned())
    }

    /// Interpolate a prop value. Only strings are templated.
    pub fn interpolate_value(&self, value: &Value, data: &DataMap) -> Value {
        match value {
            Value::String(s) => self.interpolate(s, data),
            other => other.clone(),
        }
    }

    /// Resolve a component tree against `data`, expanding repeat directives in place.
    ///
    /// The input tree is left untouched; the result is a fresh tree.
    pub fn resolve_tree(&self, components: &[Component], data: &DataMap) -> Vec<Component> {
        let mut resolved = Vec::with_capacity(components.len());
        for component in components {
            match &component.repeat {
                Some(repeat) => resolved.extend(self.expand_repeat(component, repeat, data)),
                None => resolved.push(self.resolve_component(component, data)),
            }
        }
        resolved
    }

    fn expand_repeat(
        &self,
        template: &Component,
        repeat: &Repeat,
        data: &DataMap,
    ) -> Vec<Component> {
        let Some(Value::Array(items)) = resolve_path(&repeat.source, data) else {
            return Vec::new();
        };

        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let scoped_data = {
                    let mut scoped = data.clone();
                    scoped.insert(repeat.alias.clone(), item.clone());
                    scoped
                };

                let mut instance = self.resolve_component(template, &scoped_data);
                instance.id = format!("{}-{}", template.id, index);
                instance.repeat = None;
                instance
            })
            .collect()
    }

    /// Resolve props and children. `action`, `analytics` and `conditions` are copied as-is.
    fn resolve_component(&self, component: &Component, data: &DataMap) -> Component {
        let props = component.props.as_ref().map(|props| {
            props
                .iter()
                .map(|(key, value)| (key.clone(), self.interpolate_value(value, data)))
                .collect()
        });

        Component {
            id: component.id.clone(),
            component_type: component.component_type,
            props,
            children: self.resolve_tree(&component.children, data),
            action: component.action.clone(),
            analytics: component.analytics.clone(),
            conditions: component.conditions.clone(),
            repeat: component.repeat.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use crate::model::{Component, DataMap};

    use super::{resolve_path, TemplateResolver};

    fn data(value: Value) -> DataMap {
        serde_json::from_value(value).unwrap()
    }

    fn tree(value: Value) -> Vec<Component> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn resolves_object_and_array_paths() {
        let data = data(json!({"offers": [{"title": "A"}, {"title": "B"}], "flag": false}));
        assert_eq!(resolve_path("offers.1.title", &data), Some(&json!("B")));
        assert_eq!(resolve_path("flag", &data), Some(&json!(false)));
        assert_eq!(resolve_path("offers.2.title", &data), None);
        assert_eq!(resolve_path("offers.x", &data), None);
        assert_eq!(resolve_path("flag.deeper", &data), None);
        assert_eq!(resolve_path("", &data), None);
    }

    #[test]
    fn null_is_unresolved() {
        let data = data(json!({"a": null, "b": {"c": null}}));
        assert_eq!(resolve_path("a", &data), None);
        assert_eq!(resolve_path("a.x", &data), None);
        assert_eq!(resolve_path("b.c", &data), None);
    }

    #[test]
    fn exact_match_preserves_type() {
        let resolver = TemplateResolver::new();
        assert_eq!(resolver.interpolate("{{a.b}}", &data(json!({"a": {"b": 42}}))), json!(42));
        assert_eq!(resolver.interpolate("{{a.b}}", &data(json!({"a": {"b": true}}))), json!(true));
        assert_eq!(
            resolver.interpolate("{{ a }}", &data(json!({"a": {"b": [1, 2]}}))),
            json!({"b": [1, 2]})
        );
        assert_eq!(resolver.interpolate("{{a}}", &data(json!({"a": 0}))), json!(0));
    }

    #[test]
    fn mixed_text_is_stringified() {
        let resolver = TemplateResolver::new();
        assert_eq!(
            resolver.interpolate("x={{a.b}} y", &data(json!({"a": {"b": 42}}))),
            json!("x=42 y")
        );
        assert_eq!(
            resolver.interpolate(
                "{{ user.name }} has {{user.points}} points",
                &data(json!({"user": {"name": "Ada", "points": 7.5}}))
            ),
            json!("Ada has 7.5 points")
        );
        assert_eq!(
            resolver.interpolate("{{a}}{{b}}", &data(json!({"a": 1, "b": true}))),
            json!("1true")
        );
        assert_eq!(
            resolver.interpolate("xs={{xs}} o={{o}}", &data(json!({"xs": [1, 2], "o": {"a": 1}}))),
            json!(r#"xs=[1,2] o={"a":1}"#)
        );
    }

    #[test]
    fn missing_paths_become_empty_strings() {
        let resolver = TemplateResolver::new();
        let empty = DataMap::new();
        assert_eq!(resolver.interpolate("{{missing}}", &empty), json!(""));
        assert_eq!(resolver.interpolate("hi {{missing}}", &empty), json!("hi "));
        assert_eq!(resolver.interpolate("no templates", &empty), json!("no templates"));
    }

    #[test]
    fn non_string_props_pass_through() {
        let resolver = TemplateResolver::new();
        let data = data(json!({"a": 1}));
        assert_eq!(resolver.interpolate_value(&json!(3), &data), json!(3));
        assert_eq!(
            resolver.interpolate_value(&json!({"nested": "{{a}}"}), &data),
            json!({"nested": "{{a}}"})
        );
    }

    #[test]
    fn action_analytics_and_conditions_are_not_interpolated() {
        let resolver = TemplateResolver::new();
        let input = tree(json!([{
            "id": "cta",
            "type": "button",
            "props": {"label": "{{label}}"},
            "action": {"type": "navigate", "route": "/offers/{{offerId}}"},
            "analytics": {"eventName": "tap_{{label}}"},
            "conditions": [{"field": "{{label}}", "operator": "equals", "value": "{{label}}"}]
        }]));

        let resolved = resolver.resolve_tree(&input, &data(json!({"label": "Buy", "offerId": 9})));
        let resolved = serde_json::to_value(&resolved).unwrap();
        assert_eq!(
            resolved,
            json!([{
                "id": "cta",
                "type": "button",
                "props": {"label": "Buy"},
                "action": {"type": "navigate", "route": "/offers/{{offerId}}"},
                "analytics": {"eventName": "tap_{{label}}"},
                "conditions": [{"field": "{{label}}", "operator": "equals", "value": "{{label}}"}]
            }])
        );
    }

    #[test]
    fn repeat_expands_in_place() {
        let resolver = TemplateResolver::new();
        let input = tree(json!([
            {"id": "header", "type": "text", "props": {"text": "Offers"}},
            {"id": "tmpl", "type": "card", "repeat": {"source": "offers", "as": "o"},
             "props": {"title": "{{o.title}}"}},
            {"id": "footer", "type": "text"}
        ]));

        let resolved = resolver.resolve_tree(
            &input,
            &data(json!({"offers": [{"title": "A"}, {"title": "B"}, {"title": "C"}]})),
        );

        let ids = resolved.iter().map(|c| c.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["header", "tmpl-0", "tmpl-1", "tmpl-2", "footer"]);
        assert!(resolved.iter().all(|c| c.repeat.is_none()));
        assert_eq!(resolved[2].props.as_ref().unwrap()["title"], json!("B"));
    }

    #[test]
    fn repeat_over_non_array_yields_nothing() {
        let resolver = TemplateResolver::new();
        let input = tree(json!([
            {"id": "a", "type": "card", "repeat": {"source": "offers", "as": "o"}},
            {"id": "b", "type": "card", "repeat": {"source": "missing", "as": "o"}},
            {"id": "c", "type": "card", "repeat": {"source": "empty", "as": "o"}}
        ]));

        let resolved =
            resolver.resolve_tree(&input, &data(json!({"offers": {"title": "A"}, "empty": []})));
        assert!(resolved.is_empty());
    }

    #[test]
    fn nested_repeat_sees_outer_alias() {
        let resolver = TemplateResolver::new();
        let input = tree(json!([{
            "id": "section",
            "type": "column",
            "repeat": {"source": "categories", "as": "cat"},
            "props": {"title": "{{cat.name}}"},
            "children": [{
                "id": "item",
                "type": "text",
                "repeat": {"source": "cat.items", "as": "it"},
                "props": {"text": "{{cat.name}}: {{it}} for {{user}}"}
            }]
        }]));

        let resolved = resolver.resolve_tree(
            &input,
            &data(json!({
                "user": "ada",
                "categories": [
                    {"name": "Fruit", "items": ["apple", "pear"]},
                    {"name": "Veg", "items": ["kale"]}
                ]
            })),
        );

        assert_eq!(
            serde_json::to_value(&resolved).unwrap(),
            json!([
                {"id": "section-0", "type": "column", "props": {"title": "Fruit"}, "children": [
                    {"id": "item-0", "type": "text", "props": {"text": "Fruit: apple for ada"}},
                    {"id": "item-1", "type": "text", "props": {"text": "Fruit: pear for ada"}}
                ]},
                {"id": "section-1", "type": "column", "props": {"title": "Veg"}, "children": [
                    {"id": "item-0", "type": "text", "props": {"text": "Veg: kale for ada"}}
                ]}
            ])
        );
    }

    #[test]
    fn input_tree_is_not_mutated() {
        let resolver = TemplateResolver::new();
        let input = tree(json!([
            {"id": "tmpl", "type": "text", "repeat": {"source": "xs", "as": "x"},
             "props": {"text": "{{x}}"}}
        ]));
        let before = input.clone();

        let _ = resolver.resolve_tree(&input, &data(json!({"xs": [1, 2]})));
        assert_eq!(input, before);
    }
}
