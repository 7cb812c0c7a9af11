use std::{collections::HashMap, num::NonZeroU64, str::FromStr};

use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Values resolved for a request, keyed by data source id (or repeat alias).
pub type DataMap = HashMap<String, serde_json::Value>;

/// Parameters forwarded verbatim to a data provider.
pub type Params = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Display, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum Brand {
    #[display(fmt = "brand_a")]
    BrandA,
    #[display(fmt = "brand_b")]
    BrandB,
    #[display(fmt = "brand_c")]
    BrandC,
}

impl FromStr for Brand {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "brand_a" => Ok(Brand::BrandA),
            "brand_b" => Ok(Brand::BrandB),
            "brand_c" => Ok(Brand::BrandC),
            _ => Err(()),
        }
    }
}

/// A screen definition as handed over by the screen store.
///
/// Component and overlay trees are kept as the raw serialized blobs the store returns. The
/// resolver parses them on every request and degrades to an empty tree if they are malformed.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ScreenDefinition {
    pub screen_id: String,
    pub brand: Brand,
    #[serde(default)]
    pub segment: Option<String>,
    pub component_tree: String,
    #[serde(default)]
    pub data_sources: Vec<DataSourceDeclaration>,
    #[serde(default)]
    pub overlays: Option<String>,
    pub published: bool,
    pub version: u32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceDeclaration {
    /// Alias under which the resolved value is exposed to templates.
    pub id: String,
    /// Name of the provider in [`DataProviderRegistry`](crate::DataProviderRegistry).
    pub provider: String,
    #[serde(default)]
    pub params: Option<Params>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub id: String,
    #[serde(rename = "type")]
    pub component_type: ComponentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Component>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analytics: Option<Analytics>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat: Option<Repeat>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum ComponentType {
    Container,
    Row,
    Column,
    Text,
    Image,
    Button,
    Card,
    Carousel,
    List,
    Banner,
    Spacer,
    Divider,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    #[serde(rename_all = "camelCase")]
    Navigate {
        route: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        params: Option<serde_json::Map<String, serde_json::Value>>,
    },
    #[serde(rename_all = "camelCase")]
    Webview {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Custom {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<serde_json::Value>,
    },
    #[serde(rename_all = "camelCase")]
    ShowOverlay { overlay_id: String },
    DismissOverlay,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub event_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub properties: serde_json::Map<String, serde_json::Value>,
}

/// Visibility rule evaluated by the client renderer. Passed through untouched.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub field: String,
    pub operator: ConditionOperator,
    pub value: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    Contains,
    In,
    NotIn,
    Exists,
}

/// Expands the carrying component once per element of the array at `source`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Repeat {
    pub source: String,
    #[serde(rename = "as")]
    pub alias: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Overlay {
    pub id: String,
    pub style: OverlayStyle,
    pub dismissible: bool,
    pub trigger: OverlayTrigger,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dismiss_after_ms: Option<NonZeroU64>,
    #[serde(alias = "componentTree")]
    pub components: Vec<Component>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum OverlayStyle {
    Modal,
    BottomSheet,
    Fullscreen,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum OverlayTrigger {
    Manual,
    OnLoad,
}

/// The final payload sent to the client.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedScreen {
    pub schema_version: String,
    pub screen_id: String,
    pub brand: Brand,
    pub updated_at: DateTime<Utc>,
    pub components: Vec<Component>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlays: Option<Vec<Overlay>>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Action, Brand, Component, ComponentType, Overlay, OverlayStyle};

    #[test]
    fn brand_round_trips_through_display() {
        for brand in [Brand::BrandA, Brand::BrandB, Brand::BrandC] {
            assert_eq!(brand.to_string().parse::<Brand>(), Ok(brand));
        }
        assert!("brand_z".parse::<Brand>().is_err());
    }

    #[test]
    fn absent_optionals_are_omitted_from_the_wire() {
        let component = Component {
            id: "title".into(),
            component_type: ComponentType::Text,
            props: None,
            children: vec![],
            action: None,
            analytics: None,
            conditions: vec![],
            repeat: None,
        };
        assert_eq!(
            serde_json::to_value(&component).unwrap(),
            json!({"id": "title", "type": "text"})
        );
    }

    #[test]
    fn parses_tagged_actions() {
        let component: Component = serde_json::from_value(json!({
            "id": "cta",
            "type": "button",
            "action": {"type": "show_overlay", "overlayId": "promo"}
        }))
        .unwrap();
        assert_eq!(
            component.action,
            Some(Action::ShowOverlay {
                overlay_id: "promo".into()
            })
        );

        let dismiss: Action = serde_json::from_value(json!({"type": "dismiss_overlay"})).unwrap();
        assert_eq!(dismiss, Action::DismissOverlay);
    }

    #[test]
    fn overlay_accepts_stored_component_tree_key() {
        let overlay: Overlay = serde_json::from_value(json!({
            "id": "promo",
            "style": "bottom_sheet",
            "dismissible": true,
            "trigger": "on_load",
            "dismissAfterMs": 3000,
            "componentTree": [{"id": "t", "type": "text"}]
        }))
        .unwrap();
        assert_eq!(overlay.style, OverlayStyle::BottomSheet);
        assert_eq!(overlay.components.len(), 1);

        let wire = serde_json::to_value(&overlay).unwrap();
        assert!(wire.get("components").is_some());
        assert!(wire.get("componentTree").is_none());
    }

    #[test]
    fn rejects_zero_dismiss_delay() {
        let overlay = serde_json::from_value::<Overlay>(json!({
            "id": "promo",
            "style": "modal",
            "dismissible": false,
            "trigger": "manual",
            "dismissAfterMs": 0,
            "components": []
        }));
        assert!(overlay.is_err());
    }
}
