#![no_main]

use fieldcheck::json::{FieldTags, JsonValue};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let annotation = String::from_utf8_lossy(data);
    let tags = FieldTags::default()
        .with("name", "validation", &annotation)
        .with("nested.count", "validation", &annotation);
    let doc = serde_json::json!({ "name": "value", "nested": { "count": 12 } });
    if let Ok(view) = JsonValue::new(&doc, &tags) {
        let _ = fieldcheck::validate(&view);
    }
});
