use async_trait::async_trait;
use gamine::{
    AccessService, ArrayModel, DataArray, Example, FieldKind, FieldSchema, Gamine, GamineError,
    InMemoryAccessService, Manager, ManagerDefinition, ManagerHooks, MetadataRegistry, Model,
    ModelSchema, Params, Result, StorableObject,
};
use serde_json::{json, Value};
use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default, Clone, PartialEq)]
struct Contact {
    id: Option<i64>,
    name: Option<String>,
}

impl StorableObject for Contact {
    fn model_name(&self) -> &str {
        "Contact"
    }

    fn from_data_array(&mut self, data: &DataArray) -> Result<()> {
        if let Some(id) = data.get("_id") {
            self.id = id.as_i64();
        }
        if let Some(name) = data.get("name") {
            self.name = name.as_str().map(str::to_string);
        }
        Ok(())
    }

    fn to_data_array(&self) -> DataArray {
        let mut data = DataArray::new();
        if let Some(id) = self.id {
            data.insert("_id".to_string(), json!(id));
        }
        if let Some(name) = &self.name {
            data.insert("name".to_string(), json!(name));
        }
        data
    }

    fn property(&self, name: &str) -> Option<Value> {
        match name {
            "id" => self.id.map(Value::from),
            "name" => self.name.clone().map(Value::from),
            _ => None,
        }
    }

    fn set_property(&mut self, name: &str, value: Value) -> Result<()> {
        match name {
            "id" => self.id = value.as_i64(),
            "name" => self.name = value.as_str().map(str::to_string),
            other => {
                return Err(GamineError::InvalidData {
                    model: "Contact".to_string(),
                    field: other.to_string(),
                    message: "unknown property".to_string(),
                })
            }
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Model for Contact {
    fn instantiate(_schema: &Arc<ModelSchema>) -> Self {
        Self::default()
    }
}

fn contact_schema() -> ModelSchema {
    ModelSchema::new("Contact")
        .field(
            FieldSchema::new("id", FieldKind::Integer)
                .identifier()
                .column(Some("_id")),
        )
        .field(FieldSchema::new("name", FieldKind::Text))
}

fn contact_definition() -> ManagerDefinition {
    ManagerDefinition::new("contacts", "Contact")
        .collection("contacts")
        .entity("contact")
        .route("by_email", "contacts/by-email")
}

fn row(value: Value) -> DataArray {
    value.as_object().cloned().unwrap()
}

/// Access service that records every call and answers with canned data.
#[derive(Default)]
struct RecordingService {
    calls: AtomicUsize,
    saves: Mutex<Vec<(DataArray, Option<Value>, String)>>,
    removes: Mutex<Vec<(Value, String)>>,
    save_response: DataArray,
    remove_status: bool,
}

impl RecordingService {
    fn answering(save_response: Value) -> Self {
        Self {
            save_response: row(save_response),
            remove_status: true,
            ..Self::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccessService for RecordingService {
    async fn find_all(&self, _resource: &str, _params: &Params) -> Result<Vec<DataArray>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }

    async fn find_one_by_id(
        &self,
        _resource: &str,
        _id: &Value,
        _params: &Params,
    ) -> Result<Option<DataArray>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(None)
    }

    async fn find_by_key_val(
        &self,
        _resource: &str,
        _key: &str,
        _val: &Value,
        _params: &Params,
    ) -> Result<Vec<DataArray>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }

    async fn save(
        &self,
        data: &DataArray,
        id: Option<&Value>,
        resource: &str,
    ) -> Result<DataArray> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.saves
            .lock()
            .unwrap()
            .push((data.clone(), id.cloned(), resource.to_string()));
        Ok(self.save_response.clone())
    }

    async fn remove(&self, id: &Value, resource: &str) -> Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.removes
            .lock()
            .unwrap()
            .push((id.clone(), resource.to_string()));
        Ok(self.remove_status)
    }
}

fn contact_manager(service: Arc<RecordingService>) -> Manager<Contact> {
    Manager::new(service, contact_definition(), Arc::new(contact_schema())).unwrap()
}

#[tokio::test]
async fn test_find_all_hydrates_models_in_order() {
    let service = InMemoryAccessService::new()
        .with_id_column("_id")
        .with_alias("contact", "contacts")
        .with_rows(
            "contacts",
            vec![
                row(json!({"_id": 1, "name": "Ada"})),
                row(json!({"_id": 2, "name": "Brian"})),
            ],
        );
    let manager: Manager<Contact> =
        Manager::new(Arc::new(service), contact_definition(), Arc::new(contact_schema())).unwrap();

    let contacts = manager.find_all(&Params::new()).await.unwrap();

    assert_eq!(contacts.len(), 2);
    assert_eq!(contacts[0].name.as_deref(), Some("Ada"));
    assert_eq!(contacts[1].id, Some(2));
}

#[tokio::test]
async fn test_find_all_on_empty_collection() {
    let manager = contact_manager(Arc::new(RecordingService::default()));
    let contacts = manager.find_all(&Params::new()).await.unwrap();
    assert!(contacts.is_empty());
}

#[tokio::test]
async fn test_find_one_by_id_returns_none_without_error() {
    let service = Arc::new(RecordingService::default());
    let manager = contact_manager(service.clone());

    let found = manager.find_one_by_id(404, &Params::new()).await.unwrap();

    assert!(found.is_none());
    assert_eq!(service.calls(), 1);
}

#[tokio::test]
async fn test_find_one_and_find_by_key_val() {
    let service = InMemoryAccessService::new()
        .with_id_column("_id")
        .with_alias("contact", "contacts")
        .with_rows(
            "contacts",
            vec![
                row(json!({"_id": 1, "name": "Ada"})),
                row(json!({"_id": 2, "name": "Brian"})),
                row(json!({"_id": 3, "name": "Ada"})),
            ],
        );
    let manager: Manager<Contact> =
        Manager::new(Arc::new(service), contact_definition(), Arc::new(contact_schema())).unwrap();

    let brian = manager.find_one_by_id(2, &Params::new()).await.unwrap().unwrap();
    assert_eq!(brian.name.as_deref(), Some("Brian"));

    let adas = manager
        .find_by_key_val("name", "Ada", &Params::new())
        .await
        .unwrap();
    assert_eq!(
        adas.iter().map(|c| c.id).collect::<Vec<_>>(),
        vec![Some(1), Some(3)]
    );
}

#[tokio::test]
async fn test_save_new_object_receives_server_identifier() {
    let service = Arc::new(RecordingService::answering(json!({"_id": 99, "name": "Ada"})));
    let manager = contact_manager(service.clone());

    let mut contact = Contact {
        id: None,
        name: Some("Ada".to_string()),
    };
    let saved = manager.save(&mut contact).await.unwrap();

    assert!(saved);
    assert_eq!(contact.id, Some(99));

    let saves = service.saves.lock().unwrap();
    assert_eq!(saves.len(), 1);
    assert_eq!(saves[0].0, row(json!({"name": "Ada"})));
    assert_eq!(saves[0].1, None);
    assert_eq!(saves[0].2, "contact");
}

#[tokio::test]
async fn test_save_existing_object_passes_identifier() {
    let service = Arc::new(RecordingService::answering(json!({})));
    let manager = contact_manager(service.clone());

    let mut contact = Contact {
        id: Some(7),
        name: Some("Ada".to_string()),
    };
    assert!(manager.save(&mut contact).await.unwrap());

    // empty response leaves the identifier alone
    assert_eq!(contact.id, Some(7));
    assert_eq!(service.saves.lock().unwrap()[0].1, Some(json!(7)));
}

#[tokio::test]
async fn test_save_with_memory_service_round_trip() {
    let service = Arc::new(
        InMemoryAccessService::new()
            .with_id_column("_id")
            .with_alias("contact", "contacts"),
    );
    let manager: Manager<Contact> =
        Manager::new(service.clone(), contact_definition(), Arc::new(contact_schema())).unwrap();

    let mut contact = Contact {
        id: None,
        name: Some("Ada".to_string()),
    };
    manager.save(&mut contact).await.unwrap();
    let id = contact.id.unwrap();

    contact.name = Some("Ada L.".to_string());
    manager.save(&mut contact).await.unwrap();

    let rows = service.rows("contacts").await;
    assert_eq!(rows.len(), 1);

    let loaded = manager.find_one_by_id(id, &Params::new()).await.unwrap().unwrap();
    assert_eq!(loaded, contact);
}

fn thing_manager(service: Arc<InMemoryAccessService>) -> Manager<ArrayModel> {
    let schema = ModelSchema::new("Thing")
        .field(
            FieldSchema::new("id", FieldKind::Text)
                .identifier()
                .column(None),
        )
        .field(FieldSchema::new("name", FieldKind::Text));
    let definition = ManagerDefinition::new("things", "Thing")
        .collection("things")
        .entity("thing");
    Manager::new(service, definition, Arc::new(schema)).unwrap()
}

#[tokio::test]
async fn test_save_converts_assigned_identifier_to_field_kind() {
    let service = Arc::new(InMemoryAccessService::new().with_alias("thing", "things"));
    let manager = thing_manager(service.clone());

    let mut thing = manager.instantiate();
    thing.set("name", "a").unwrap();

    assert!(manager.save(&mut thing).await.unwrap());
    assert_eq!(thing.get("id"), Some(&json!("1")));

    thing.set("name", "b").unwrap();
    assert!(manager.save(&mut thing).await.unwrap());

    let rows = service.rows("things").await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("name"), Some(&json!("b")));
}

#[tokio::test]
async fn test_set_identifier_value() {
    let manager = thing_manager(Arc::new(InMemoryAccessService::new()));
    let mut thing = manager.instantiate();

    manager.set_identifier_value(&mut thing, json!(42)).unwrap();
    assert_eq!(manager.identifier_value(&thing).unwrap(), Some(json!("42")));

    let contacts = contact_manager(Arc::new(RecordingService::default()));
    let mut contact = Contact::default();
    contacts.set_identifier_value(&mut contact, json!(9)).unwrap();
    assert_eq!(contact.id, Some(9));

    let examples: Manager<Example> = Manager::new(
        Arc::new(RecordingService::default()),
        ManagerDefinition::new("examples", "Example"),
        Arc::new(Example::schema()),
    )
    .unwrap();
    let mut example = Example::default();
    assert!(matches!(
        examples.set_identifier_value(&mut example, json!(1)),
        Err(GamineError::MissingIdentifier { .. })
    ));
}

#[tokio::test]
async fn test_save_wrong_type_fails_before_access_service() {
    let service = Arc::new(RecordingService::answering(json!({})));
    let manager = contact_manager(service.clone());

    let mut example = Example::default();
    let err = manager.save(&mut example).await.unwrap_err();

    match err {
        GamineError::TypeMismatch { expected, found } => {
            assert_eq!(expected, "Contact");
            assert_eq!(found, "Example");
        }
        other => panic!("expected TypeMismatch, got {:?}", other),
    }
    assert_eq!(service.calls(), 0);
}

#[tokio::test]
async fn test_array_model_of_other_schema_is_type_mismatch() {
    let service = Arc::new(RecordingService::answering(json!({})));
    let mut registry = MetadataRegistry::new();
    let contact = registry.register_model(contact_schema());
    let example = registry.register_model(Example::schema());

    let manager: Manager<ArrayModel> =
        Manager::new(service.clone(), contact_definition(), contact).unwrap();

    let mut other = ArrayModel::new(example);
    let err = manager.save(&mut other).await.unwrap_err();
    assert!(matches!(err, GamineError::TypeMismatch { .. }));

    let err = manager.remove(&mut other).await.unwrap_err();
    assert!(matches!(err, GamineError::TypeMismatch { .. }));
    assert_eq!(service.calls(), 0);
}

#[tokio::test]
async fn test_remove_without_identifier_fails() {
    let service = Arc::new(RecordingService::answering(json!({})));
    let manager = contact_manager(service.clone());

    let mut contact = Contact {
        id: None,
        name: Some("Ada".to_string()),
    };
    let err = manager.remove(&mut contact).await.unwrap_err();

    assert!(matches!(err, GamineError::MissingIdentifier { .. }));
    assert_eq!(service.calls(), 0);
}

#[tokio::test]
async fn test_remove_wrong_type_fails() {
    let service = Arc::new(RecordingService::answering(json!({})));
    let manager = contact_manager(service.clone());

    let mut example = Example::default();
    let err = manager.remove(&mut example).await.unwrap_err();

    assert!(matches!(err, GamineError::TypeMismatch { .. }));
    assert_eq!(service.calls(), 0);
}

#[tokio::test]
async fn test_remove_delegates_with_identifier() {
    let service = Arc::new(RecordingService::answering(json!({})));
    let manager = contact_manager(service.clone());

    let mut contact = Contact {
        id: Some(12),
        name: None,
    };
    assert!(manager.remove(&mut contact).await.unwrap());

    let removes = service.removes.lock().unwrap();
    assert_eq!(removes[0], (json!(12), "contact".to_string()));
}

#[derive(Default)]
struct AuditHooks {
    veto_save: bool,
    force_remove_status: Option<bool>,
    events: Mutex<Vec<String>>,
}

impl ManagerHooks<Contact> for AuditHooks {
    fn before_save(&self, object: &mut Contact) -> bool {
        self.events.lock().unwrap().push("before_save".to_string());
        if let Some(name) = &object.name {
            object.name = Some(name.trim().to_string());
        }
        !self.veto_save
    }

    fn after_save(&self, object: &mut Contact, is_new: bool) {
        self.events
            .lock()
            .unwrap()
            .push(format!("after_save new={} id={:?}", is_new, object.id));
    }

    fn before_remove(&self, _object: &mut Contact) {
        self.events.lock().unwrap().push("before_remove".to_string());
    }

    fn after_remove(&self, _object: &mut Contact, status: bool) -> bool {
        self.events
            .lock()
            .unwrap()
            .push(format!("after_remove status={}", status));
        self.force_remove_status.unwrap_or(status)
    }
}

#[tokio::test]
async fn test_hooks_run_around_save() {
    let service = Arc::new(RecordingService::answering(json!({"_id": 5})));
    let manager = contact_manager(service.clone()).with_hooks(AuditHooks::default());

    let mut contact = Contact {
        id: None,
        name: Some("  Ada ".to_string()),
    };
    assert!(manager.save(&mut contact).await.unwrap());

    // before_save mutations reach the access service
    assert_eq!(service.saves.lock().unwrap()[0].0, row(json!({"name": "Ada"})));
    assert_eq!(
        *manager.hooks().events.lock().unwrap(),
        vec![
            "before_save".to_string(),
            "after_save new=true id=Some(5)".to_string()
        ]
    );
}

#[tokio::test]
async fn test_before_save_can_abort() {
    let service = Arc::new(RecordingService::answering(json!({"_id": 5})));
    let manager = contact_manager(service.clone()).with_hooks(AuditHooks {
        veto_save: true,
        ..AuditHooks::default()
    });

    let mut contact = Contact::default();
    assert!(!manager.save(&mut contact).await.unwrap());
    assert_eq!(contact.id, None);
    assert_eq!(service.calls(), 0);
}

#[tokio::test]
async fn test_after_remove_overrides_status() {
    let service = Arc::new(RecordingService::answering(json!({})));
    let manager = contact_manager(service.clone()).with_hooks(AuditHooks {
        force_remove_status: Some(false),
        ..AuditHooks::default()
    });

    let mut contact = Contact {
        id: Some(1),
        name: None,
    };
    assert!(!manager.remove(&mut contact).await.unwrap());
    assert_eq!(
        *manager.hooks().events.lock().unwrap(),
        vec![
            "before_remove".to_string(),
            "after_remove status=true".to_string()
        ]
    );
}

#[tokio::test]
async fn test_example_manager_without_identifier() {
    let service = Arc::new(RecordingService::answering(json!({"Name": "x"})));
    let definition = ManagerDefinition::new("examples", "Example")
        .collection("examples")
        .entity("examples");
    let manager: Manager<Example> =
        Manager::new(service.clone(), definition, Arc::new(Example::schema())).unwrap();

    assert!(!manager.has_data_array_identifier_property().unwrap());
    assert_eq!(manager.data_array_identifier_column().unwrap(), None);
    assert_eq!(manager.data_array_identifier_property().unwrap(), None);

    let mut example = Example::default();
    example.set_name("x").unwrap();
    assert!(manager.save(&mut example).await.unwrap());
    assert!(manager.save(&mut example).await.unwrap());
    let saves = service.saves.lock().unwrap().clone();
    assert!(saves.iter().all(|(_, id, _)| id.is_none()));

    let err = manager.remove(&mut example).await.unwrap_err();
    assert!(matches!(err, GamineError::MissingIdentifier { .. }));
}

#[tokio::test]
async fn test_identifier_metadata_and_routes() {
    let manager = contact_manager(Arc::new(RecordingService::default()));

    assert!(manager.has_data_array_identifier_property().unwrap());
    assert_eq!(manager.data_array_identifier_column().unwrap(), Some("_id"));
    assert_eq!(manager.data_array_identifier_property().unwrap(), Some("id"));
    assert_eq!(manager.collection_resource(), Some("contacts"));
    assert_eq!(manager.entity_resource(), Some("contact"));
    assert_eq!(manager.model_name(), "Contact");

    assert_eq!(
        manager.resource_route("by_email").unwrap(),
        "contacts/by-email"
    );
    match manager.resource_route("by_phone") {
        Err(GamineError::UnknownRoute { manager, route }) => {
            assert_eq!(manager, "contacts");
            assert_eq!(route, "by_phone");
        }
        other => panic!("expected UnknownRoute, got {:?}", other),
    }
}

#[tokio::test]
async fn test_identifier_without_column_fails_at_resolution() {
    let schema = ModelSchema::new("Contact")
        .field(FieldSchema::new("id", FieldKind::Integer).identifier());
    let service = Arc::new(RecordingService::answering(json!({})));
    let manager: Manager<Contact> =
        Manager::new(service.clone(), contact_definition(), Arc::new(schema)).unwrap();

    assert!(matches!(
        manager.has_data_array_identifier_property(),
        Err(GamineError::MissingAnnotationConfig { .. })
    ));

    let mut contact = Contact::default();
    assert!(matches!(
        manager.save(&mut contact).await,
        Err(GamineError::MissingAnnotationConfig { .. })
    ));
    assert_eq!(service.calls(), 0);
}

#[test]
fn test_manager_rejects_schema_for_other_model() {
    let result: Result<Manager<Contact>> = Manager::new(
        Arc::new(RecordingService::default()),
        contact_definition(),
        Arc::new(Example::schema()),
    );
    assert!(matches!(
        result,
        Err(GamineError::ConfigValidationError { .. })
    ));
}

#[tokio::test]
async fn test_missing_resource_is_reported() {
    let definition = ManagerDefinition::new("contacts", "Contact").entity("contact");
    let manager: Manager<Contact> = Manager::new(
        Arc::new(RecordingService::default()),
        definition,
        Arc::new(contact_schema()),
    )
    .unwrap();

    assert!(matches!(
        manager.find_all(&Params::new()).await,
        Err(GamineError::MissingResource { .. })
    ));
}

#[tokio::test]
async fn test_gamine_container_hands_out_managers() {
    let mut registry = MetadataRegistry::new();
    registry.register_model(contact_schema());
    registry.register_manager(contact_definition());

    let service = InMemoryAccessService::new()
        .with_id_column("_id")
        .with_alias("contact", "contacts");
    let gamine = Gamine::new(registry, Arc::new(service));

    let typed: Manager<Contact> = gamine.manager("contacts").unwrap();
    let mut contact = Contact {
        id: None,
        name: Some("Ada".to_string()),
    };
    typed.save(&mut contact).await.unwrap();

    let dynamic = gamine.array_manager("contacts").unwrap();
    let rows = dynamic.find_all(&Params::new()).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("name"), Some(&json!("Ada")));
    assert_eq!(rows[0].get("id"), Some(&json!(contact.id.unwrap())));

    assert!(matches!(
        gamine.array_manager("nope"),
        Err(GamineError::UnknownManager { .. })
    ));
}
