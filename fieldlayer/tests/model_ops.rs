//! End-to-end model engine tests against the in-memory store client.

use bson::{Bson, doc, oid::ObjectId};
use fieldlayer::{memory::InMemoryClient, prelude::*};

fn users_model() -> Model {
    Model::new(
        Namespace::new("appdb", "users"),
        Schema::builder()
            .field("name", Field::string().required())
            .field("age", Field::number().min(0))
            .field(
                "status",
                Field::enumeration(["active", "banned"])
                    .unwrap()
                    .default_value("active"),
            )
            .field("bio", Field::string())
            .build()
            .unwrap(),
    )
}

#[tokio::test]
async fn save_inserts_and_assigns_an_id() {
    let client = InMemoryClient::new();
    let users = users_model();

    let mut alice = users.create(doc! { "name": "Alice", "age": 30 });
    assert_eq!(alice.id(), None);

    alice.save(&client).await.unwrap();

    let id = alice.id().expect("save should assign an id");
    let found = users.find_by_id(&client, id).await.unwrap().unwrap();
    assert_eq!(found.get("name"), Some(&Bson::String("Alice".into())));
}

#[tokio::test]
async fn save_validates_values_before_storing() {
    let client = InMemoryClient::new();
    let users = users_model();

    // age arrives as a numeric string and is stored as an integer
    let mut alice = users.create(doc! { "name": "Alice", "age": "42" });
    alice.save(&client).await.unwrap();

    let found = users
        .find_by_id(&client, alice.id().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.get("age"), Some(&Bson::Int64(42)));
    assert_eq!(found.get("status"), Some(&Bson::String("active".into())));
}

#[tokio::test]
async fn save_on_a_persisted_instance_updates_in_place() {
    let client = InMemoryClient::new();
    let users = users_model();

    let mut alice = users.create(doc! { "name": "Alice" });
    alice.save(&client).await.unwrap();
    let id = alice.id().unwrap();

    alice.set("name", "Alicia").unwrap();
    alice.save(&client).await.unwrap();

    assert_eq!(alice.id(), Some(id));
    assert_eq!(users.count(&client, doc! {}).await.unwrap(), 1);

    let found = users.find_by_id(&client, id).await.unwrap().unwrap();
    assert_eq!(found.get("name"), Some(&Bson::String("Alicia".into())));
}

#[tokio::test]
async fn save_rejects_invalid_values_without_a_store_call() {
    let client = InMemoryClient::new();
    let users = users_model();

    let mut nameless = users.create(doc! { "age": 5 });
    let result = nameless.save(&client).await;

    assert!(matches!(result, Err(ModelError::Validation { .. })));
    assert_eq!(users.count(&client, doc! {}).await.unwrap(), 0);
}

#[tokio::test]
async fn save_on_an_uninitialized_instance_fails() {
    let client = InMemoryClient::new();
    let users = users_model();

    let mut empty = users.instance();
    let result = empty.save(&client).await;

    assert!(matches!(result, Err(ModelError::NotInitialized)));
}

#[tokio::test]
async fn find_one_and_find_page_through_matches() {
    let client = InMemoryClient::new();
    let users = users_model();

    for n in 0..5 {
        let mut user = users.create(doc! { "name": format!("user{n}"), "age": n });
        user.save(&client).await.unwrap();
    }

    let first = users
        .find_one(&client, doc! { "name": "user2" })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.get("age"), Some(&Bson::Int64(2)));

    let page = users
        .find(&client, doc! {}, FindOptions::new().skip(2).limit(2))
        .await
        .unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].get("name"), Some(&Bson::String("user2".into())));

    let missing = users
        .find_one(&client, doc! { "name": "nobody" })
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn update_patches_store_and_mirrors_locally() {
    let client = InMemoryClient::new();
    let users = users_model();

    let mut alice = users.create(doc! { "name": "Alice", "bio": "hi" });
    alice.save(&client).await.unwrap();

    let result = alice
        .update(&client, doc! { "name": "Alicia", "bio": Bson::Null })
        .await
        .unwrap();

    assert_eq!(result.matched_count, 1);
    assert_eq!(alice.get("name"), Some(&Bson::String("Alicia".into())));
    assert_eq!(alice.get("bio"), None);

    let found = users
        .find_by_id(&client, alice.id().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.get("name"), Some(&Bson::String("Alicia".into())));
    assert!(!found.contains_key("bio"));
}

#[tokio::test]
async fn update_rejects_undeclared_fields_without_touching_the_store() {
    let client = InMemoryClient::new();
    let users = users_model();

    let mut alice = users.create(doc! { "name": "Alice" });
    alice.save(&client).await.unwrap();

    let result = alice
        .update(&client, doc! { "name": "Alicia", "nickname": "Al" })
        .await;

    assert!(matches!(result, Err(ModelError::UnknownField(_))));

    // The whole patch is rejected; the valid half never reached the store.
    let found = users
        .find_by_id(&client, alice.id().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.get("name"), Some(&Bson::String("Alice".into())));
}

#[tokio::test]
async fn update_rejects_values_outside_the_field_rules() {
    let client = InMemoryClient::new();
    let users = users_model();

    let mut alice = users.create(doc! { "name": "Alice" });
    alice.save(&client).await.unwrap();

    let below_min = alice.update(&client, doc! { "age": -1 }).await;
    assert!(matches!(below_min, Err(ModelError::Validation { .. })));

    let outside_enum = alice.update(&client, doc! { "status": "sleeping" }).await;
    assert!(matches!(outside_enum, Err(ModelError::Validation { .. })));
}

#[tokio::test]
async fn update_before_save_fails() {
    let client = InMemoryClient::new();
    let users = users_model();

    let mut alice = users.create(doc! { "name": "Alice" });
    let result = alice.update(&client, doc! { "name": "Alicia" }).await;

    assert!(matches!(result, Err(ModelError::NotPersisted)));
}

#[tokio::test]
async fn delete_removes_the_document() {
    let client = InMemoryClient::new();
    let users = users_model();

    let mut alice = users.create(doc! { "name": "Alice" });
    alice.save(&client).await.unwrap();

    let result = alice.delete(&client).await.unwrap();
    assert_eq!(result.deleted_count, 1);
    assert_eq!(users.count(&client, doc! {}).await.unwrap(), 0);
}

#[tokio::test]
async fn delete_before_save_fails() {
    let client = InMemoryClient::new();
    let users = users_model();

    let alice = users.create(doc! { "name": "Alice" });
    let result = alice.delete(&client).await;

    assert!(matches!(result, Err(ModelError::NotPersisted)));
}

#[tokio::test]
async fn insert_many_assigns_ids_positionally() {
    let client = InMemoryClient::new();
    let users = users_model();

    let mut batch = vec![
        users.create(doc! { "name": "a" }),
        users.create(doc! { "name": "b" }),
        users.create(doc! { "name": "c" }),
    ];

    let result = users.insert_many(&client, &mut batch).await.unwrap();

    assert_eq!(result.inserted_ids.len(), 3);
    for (instance, id) in batch.iter().zip(&result.inserted_ids) {
        assert_eq!(instance.id(), Some(*id));
    }
    assert_eq!(users.count(&client, doc! {}).await.unwrap(), 3);
}

#[tokio::test]
async fn insert_many_rejects_already_persisted_instances() {
    let client = InMemoryClient::new();
    let users = users_model();

    let mut persisted = users.create(doc! { "name": "a" });
    persisted.save(&client).await.unwrap();

    let mut batch = vec![users.create(doc! { "name": "b" }), persisted];
    let result = users.insert_many(&client, &mut batch).await;

    assert!(matches!(result, Err(ModelError::AlreadyPersisted(_))));
    // Nothing from the batch was written.
    assert_eq!(users.count(&client, doc! {}).await.unwrap(), 1);
}

#[tokio::test]
async fn insert_many_is_all_or_nothing_on_validation() {
    let client = InMemoryClient::new();
    let users = users_model();

    let mut batch = vec![
        users.create(doc! { "name": "a" }),
        users.create(doc! { "age": 3 }), // missing required name
    ];
    let result = users.insert_many(&client, &mut batch).await;

    assert!(matches!(result, Err(ModelError::Validation { .. })));
    assert_eq!(users.count(&client, doc! {}).await.unwrap(), 0);
    assert_eq!(batch[0].id(), None);
}

#[tokio::test]
async fn round_trip_preserves_validated_values() {
    let client = InMemoryClient::new();
    let users = users_model();

    let mut alice = users.create(doc! { "name": "Alice", "age": "42" });
    alice.save(&client).await.unwrap();

    let reloaded = users
        .find_by_id(&client, alice.id().unwrap())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(reloaded.get("age"), Some(&Bson::Int64(42)));
    assert_eq!(reloaded.to_obj().get("age"), Some(&Bson::Int64(42)));
}

#[tokio::test]
async fn to_obj_and_to_json_render_coerced_state() {
    let client = InMemoryClient::new();
    let users = users_model();

    let mut alice = users.create(doc! { "name": "Alice", "age": 30 });
    alice.save(&client).await.unwrap();

    let obj = alice.to_obj();
    assert!(matches!(obj.get(ID_FIELD), Some(Bson::ObjectId(_))));
    assert_eq!(obj.get("name"), Some(&Bson::String("Alice".into())));
    assert!(!obj.contains_key("bio"));

    let json = alice.to_json().unwrap();
    assert_eq!(json["name"], serde_json::json!("Alice"));
    assert_eq!(json["status"], serde_json::json!("active"));
}

#[tokio::test]
async fn find_by_id_misses_cleanly() {
    let client = InMemoryClient::new();
    let users = users_model();

    let found = users.find_by_id(&client, ObjectId::new()).await.unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn count_respects_filters() {
    let client = InMemoryClient::new();
    let users = users_model();

    for name in ["a", "b"] {
        let mut user = users.create(doc! { "name": name });
        user.save(&client).await.unwrap();
    }
    let mut banned = users.create(doc! { "name": "c", "status": "banned" });
    banned.save(&client).await.unwrap();

    assert_eq!(users.count(&client, doc! {}).await.unwrap(), 3);
    assert_eq!(
        users
            .count(&client, doc! { "status": "banned" })
            .await
            .unwrap(),
        1,
    );
}
