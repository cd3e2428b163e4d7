use serde_json::{json, Value};

use school_site::content::{Access, ContentKind, ContentStore, Document};
use school_site::store::Store;

fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("fixture must be an object, got {other}"),
    }
}

pub async fn seed(store: &Store, kind: ContentKind, fields: Value) -> String {
    let inserted = store
        .insert(kind, doc(fields), Access::Privileged)
        .await
        .expect("insert seed record");
    inserted["id"].as_str().expect("seed id").to_string()
}

pub async fn seed_news(store: &Store, bg: &str, en: &str, category: &str, published: bool) -> String {
    seed(
        store,
        ContentKind::News,
        json!({
            "title": { "bg": bg, "en": en },
            "summary": { "bg": format!("{bg} резюме"), "en": "" },
            "category": category,
            "published": published,
        }),
    )
    .await
}

pub async fn seed_teacher(store: &Store, name: &str, sort_order: i64, published: bool) -> String {
    seed(
        store,
        ContentKind::Teacher,
        json!({
            "name": { "bg": name, "en": name },
            "position": { "bg": "Учител", "en": "Teacher" },
            "sortOrder": sort_order,
            "published": published,
        }),
    )
    .await
}

pub async fn seed_contact(store: &Store, subject: &str) -> String {
    seed(
        store,
        ContentKind::ContactMessage,
        json!({
            "name": "Мария",
            "email": "maria@example.com",
            "subject": subject,
            "message": "Здравейте!",
        }),
    )
    .await
}
