//! Profile model demo
//!
//! Builds a small user-profile model, registers watchers and a computed
//! display name, and drives a few updates through the governed accessors.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example profile_demo

use anyhow::Result;
use remodel::{ComputedSpec, ModelSchema, ReactiveModel, Value, WatchSpec};
use std::collections::BTreeMap;

fn main() -> Result<()> {
    env_logger::init();

    let schema = ModelSchema::new()
        .field("count", Value::int(0))
        .field(
            "profile",
            Value::map([
                ("first", Value::string("Ada")),
                ("last", Value::string("Lovelace")),
                ("age", Value::int(36)),
            ]),
        )
        .immutable("kind", Value::string("user"));

    let mut data = BTreeMap::new();
    data.insert(
        "profile".to_string(),
        Value::map([("age", Value::int(28))]),
    );
    let mut model = ReactiveModel::new(schema, data);
    println!("model {} created at {}", model.id(), model.created_at());

    model.watch("count", |previous, new| {
        println!("count changed: {:?} -> {:?}", previous, new);
    });
    model.watch_with(
        "profile",
        WatchSpec::handler(|_, new| println!("profile now: {:?}", new))
            .deep(true)
            .immediate(true),
    );

    model.computed_with(
        "display_name",
        ComputedSpec::getter(|m| {
            let first = m
                .get_path("profile.first")
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default();
            let last = m
                .get_path("profile.last")
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default();
            Value::string(format!("{} {}", first, last))
        }),
    );

    model
        .set_value("count", Value::int(1))
        .set_value("count", Value::int(1)) // unchanged, watcher stays quiet
        .set_value("count", Value::int(2));

    // Nested write through the path accessor
    model.set_path("profile.age", Value::int(29));
    println!("age: {:?}", model.get_path("profile.age"));
    println!("display name: {:?}", model.get("display_name"));

    // Rejected writes degrade to warnings and leave state unchanged
    model
        .set_value("kind", Value::string("admin"))
        .set_value("unknown_field", Value::int(9));
    println!("kind is still: {:?}", model.get("kind"));

    println!("snapshot: {}", model.to_json()?);
    Ok(())
}
