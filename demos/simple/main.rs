use std::sync::Arc;

use chrono::Utc;
use screen_resolver::{
    Brand, DataProviderContext, DataProviderRegistry, DataSourceDeclaration, Experiment,
    ExposureEvent, FeatureFlag, FlagEvaluator, InMemoryExperimentStore, InMemoryFlagStore,
    InMemoryScreenStore, Params, ProviderError, ResolverConfig, ScreenDefinition, ScreenQuery,
    Variant,
};
use serde_json::{json, Value};

pub fn main() -> screen_resolver::Result<()> {
    // Configure env_logger to see resolver logs.
    env_logger::Builder::from_env(env_logger::Env::new().default_filter_or("screen_resolver"))
        .init();

    let screens = InMemoryScreenStore::new();
    screens.insert(ScreenDefinition {
        screen_id: "home".into(),
        brand: Brand::BrandA,
        segment: None,
        component_tree: json!([
            {"id": "greeting", "type": "text", "props": {"text": "Welcome back, {{profile.name}}"}},
            {"id": "offer", "type": "card", "repeat": {"source": "offers", "as": "o"},
             "props": {"title": "{{o.title}}", "discount": "{{o.discount}}"},
             "action": {"type": "navigate", "route": "/offers"}}
        ])
        .to_string(),
        data_sources: vec![
            DataSourceDeclaration {
                id: "offers".into(),
                provider: "marketing".into(),
                params: json!({"placement": "home"}).as_object().cloned(),
            },
            DataSourceDeclaration {
                id: "profile".into(),
                provider: "profile".into(),
                params: None,
            },
        ],
        overlays: None,
        published: true,
        version: 1,
        updated_at: Utc::now(),
    });

    let experiments = InMemoryExperimentStore::new();
    experiments.insert(Experiment {
        id: "home-hero".into(),
        screen_id: "home".into(),
        brand: Brand::BrandA,
        active: true,
        variants: vec![
            Variant {
                name: "control".into(),
                percentage: 50,
                component_tree: json!([
                    {"id": "offer", "type": "card", "repeat": {"source": "offers", "as": "o"},
                     "props": {"title": "{{o.title}}"}}
                ])
                .to_string(),
            },
            Variant {
                name: "banner".into(),
                percentage: 50,
                component_tree: json!([
                    {"id": "hero", "type": "banner",
                     "props": {"text": "{{offers.0.title}} today only"}}
                ])
                .to_string(),
            },
        ],
    });

    let mut registry = DataProviderRegistry::new();
    registry
        .register(
            "marketing",
            |_: &Params, _: &DataProviderContext| -> Result<Value, ProviderError> {
                Ok(json!([
                    {"title": "Free shipping", "discount": 0},
                    {"title": "Spring sale", "discount": 20}
                ]))
            },
        )
        .register(
            "profile",
            |_: &Params, context: &DataProviderContext| -> Result<Value, ProviderError> {
                Ok(json!({"name": context.user_id}))
            },
        );

    let mut config = ResolverConfig::new();
    config
        .providers(Arc::new(registry))
        .exposure_logger(|event: ExposureEvent| {
            println!("Logging exposure event: {:?}", event);
        });
    let resolver = config.to_resolver(Arc::new(screens), Arc::new(experiments));

    let query = ScreenQuery {
        screen_id: "home".into(),
        brand: "brand_a".into(),
        segment: None,
        user_id: Some("alice".into()),
    };
    let request = query.validate()?;

    let screen = resolver.resolve(&request)?;
    println!(
        "Resolved screen: {}",
        serde_json::to_string_pretty(&screen).unwrap_or_default()
    );

    let flags = InMemoryFlagStore::new();
    flags.upsert(FeatureFlag {
        key: "dark-mode".into(),
        brand_a: true,
        brand_b: false,
        brand_c: true,
        rollout_percentage: 30,
    });
    let evaluator = FlagEvaluator::new(Arc::new(flags));
    println!("Flags: {:?}", evaluator.evaluate_flags("brand_a", request.user_id())?);

    Ok(())
}
