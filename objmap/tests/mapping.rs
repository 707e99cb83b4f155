use objmap::{Mappable, MapperError, MapperPhase, Repository};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Debug, Clone, Default, PartialEq, Mappable)]
struct Person {
    id: i32,
    first_name: String,
    last_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Mappable)]
struct PersonEditModel {
    id: i32,
    name: String,
}

fn john() -> Person {
    Person {
        id: 1234,
        first_name: "John".into(),
        last_name: "Doe".into(),
    }
}

#[test]
fn test_person_to_edit_model() {
    init_logging();
    let repository = Repository::default();
    let mapper = repository.resolve::<Person, PersonEditModel>(&[]).unwrap();
    assert_eq!(mapper.map(&john()).unwrap().id, 1234);

    // a fresh repository, since the first mapper is now frozen
    let repository = Repository::default();
    let mapper = repository.resolve::<Person, PersonEditModel>(&[]).unwrap();
    mapper
        .add_mapping()
        .from("first_name + last_name", |p: &Person| format!("{}{}", p.first_name, p.last_name))
        .to("name", |m: &mut PersonEditModel, name| m.name = name)
        .unwrap();

    let model = mapper.map(&john()).unwrap();
    assert_eq!(model, PersonEditModel { id: 1234, name: "JohnDoe".into() });
}

#[derive(Debug, Clone, Default, PartialEq, Mappable)]
struct Shipment {
    reference: String,
    weight: f32,
    pieces: u8,
    fragile: bool,
    sent: Option<chrono::DateTime<chrono::Utc>>,
    tracking: uuid::Uuid,
    labels: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Mappable)]
struct ShipmentDto {
    reference: String,
    weight: f64,
    pieces: i64,
    fragile: bool,
    sent: Option<chrono::DateTime<chrono::Utc>>,
    tracking: uuid::Uuid,
    labels: Vec<String>,
}

#[test]
fn test_convention_copies_every_like_named_member() {
    let repository = Repository::default();
    let mapper = repository.resolve::<Shipment, ShipmentDto>(&[]).unwrap();
    let shipment = Shipment {
        reference: "SH-1".into(),
        weight: 2.5,
        pieces: 3,
        fragile: true,
        sent: Some(chrono::Utc::now()),
        tracking: uuid::Uuid::new_v4(),
        labels: vec!["a".into(), "b".into()],
    };

    let dto = mapper.map(&shipment).unwrap();
    assert_eq!(
        dto,
        ShipmentDto {
            reference: shipment.reference.clone(),
            weight: 2.5,
            pieces: 3,
            fragile: true,
            sent: shipment.sent,
            tracking: shipment.tracking,
            labels: shipment.labels.clone(),
        }
    );
}

#[derive(Debug, Clone, Default, PartialEq, Mappable)]
struct Inner {
    name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Mappable)]
struct Outer {
    inner: Option<Inner>,
}

#[derive(Debug, Clone, PartialEq, Mappable)]
struct FlatOuter {
    inner_name: String,
}

impl Default for FlatOuter {
    fn default() -> Self {
        FlatOuter {
            inner_name: "unset".into(),
        }
    }
}

#[test]
fn test_flattening() {
    let repository = Repository::default();
    let mapper = repository.resolve::<Outer, FlatOuter>(&[]).unwrap();

    let outer = Outer {
        inner: Some(Inner { name: "nested".into() }),
    };
    assert_eq!(mapper.map(&outer).unwrap().inner_name, "nested");

    // absent inner leaves the target default without failing
    assert_eq!(mapper.map(&Outer::default()).unwrap(), FlatOuter::default());
}

#[test]
fn test_manual_rule_beats_convention() {
    let repository = Repository::default();
    let mapper = repository.resolve::<Person, PersonEditModel>(&[]).unwrap();
    mapper
        .add_mapping_action("id", "id", |p: &Person, m: &mut PersonEditModel| {
            m.id = p.id + 1;
            Ok(())
        })
        .unwrap();
    assert_eq!(mapper.map(&john()).unwrap().id, 1235);
}

#[test]
fn test_mapping_is_idempotent() {
    let repository = Repository::default();
    let mapper = repository.resolve::<Person, PersonEditModel>(&[]).unwrap();
    let first = mapper.map(&john()).unwrap();
    let second = mapper.map(&john()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_rules_freeze_after_first_map() {
    let repository = Repository::default();
    let mapper = repository.resolve::<Person, PersonEditModel>(&[]).unwrap();
    assert_eq!(mapper.phase(), MapperPhase::New);

    mapper
        .add_mapping_action("first_name", "name", |p: &Person, m: &mut PersonEditModel| {
            m.name = p.first_name.clone();
            Ok(())
        })
        .unwrap();
    assert_eq!(mapper.phase(), MapperPhase::Initialized);

    mapper.map(&john()).unwrap();
    assert_eq!(mapper.phase(), MapperPhase::Active);

    let err = mapper
        .add_mapping_action("last_name", "name", |_, _| Ok(()))
        .unwrap_err();
    assert!(matches!(err, MapperError::InvalidOperation(_)));
    assert!(mapper.add_mapping().from("id", |p: &Person| p.id).to_member("id").is_err());
}

#[test]
fn test_failing_action_is_wrapped_with_member_names() {
    let repository = Repository::default();
    let mapper = repository.resolve::<Person, PersonEditModel>(&[]).unwrap();
    mapper
        .add_mapping_action("last_name", "name", |_, _| anyhow::bail!("lookup service unavailable"))
        .unwrap();

    let err = mapper.map(&john()).unwrap_err();
    let failure = err.as_failure().expect("mapping failure");
    assert_eq!(failure.source_type, "Person");
    assert_eq!(failure.target_type, "PersonEditModel");
    assert_eq!(failure.source_member, "last_name");
    assert_eq!(failure.target_member, "name");
    assert_eq!(failure.cause.to_string(), "lookup service unavailable");
    assert!(err.to_string().contains("Person.last_name"));
}

#[derive(Debug, Clone, Default, PartialEq, Mappable)]
struct Reading {
    station: String,
    value: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Mappable)]
struct ReadingRow {
    station: String,
    value: f64,
    checked: bool,
}

#[test]
fn test_failure_leaves_earlier_members_written() {
    let repository = Repository::default();
    let mapper = repository.resolve::<Reading, ReadingRow>(&[]).unwrap();
    mapper
        .add_mapping_action("*", "checked", |_, row: &mut ReadingRow| {
            row.checked = true;
            Ok(())
        })
        .unwrap();

    let mut row = ReadingRow::default();
    let err = mapper
        .map_into(&Reading { station: "north".into(), value: None }, &mut row)
        .unwrap_err();

    // null into a non-nullable member is an invalid operation
    assert!(err.is_invalid_operation());
    assert_eq!(err.as_failure().unwrap().target_member, "value");

    // no rollback: rules applied before the failure stay applied
    assert!(row.checked);
    assert_eq!(row.station, "north");
    assert_eq!(row.value, 0.0);
}

#[test]
fn test_map_multiple_is_lazy_and_ordered() {
    let repository = Repository::default();
    let mapper = repository.resolve::<Person, PersonEditModel>(&[]).unwrap();
    let people: Vec<_> = (1..=3)
        .map(|id| Person { id, ..Person::default() })
        .collect();

    let ids: Vec<_> = mapper
        .map_multiple(&people)
        .map(|r| r.unwrap().id)
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);

    let mut calls = 0;
    let built: Vec<_> = mapper
        .map_multiple_with(people.iter(), || {
            calls += 1;
            PersonEditModel { id: 0, name: "preset".into() }
        })
        .take(2)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(calls, 2);
    assert_eq!(built[1], PersonEditModel { id: 2, name: "preset".into() });
}

#[test]
fn test_map_with_factory_and_existing_target() {
    let repository = Repository::default();
    let mapper = repository.resolve::<Person, PersonEditModel>(&[]).unwrap();

    let model = mapper
        .map_with(&john(), || PersonEditModel { id: 0, name: "kept".into() })
        .unwrap();
    assert_eq!(model, PersonEditModel { id: 1234, name: "kept".into() });

    let existing = PersonEditModel { id: 9, name: "also kept".into() };
    let model = mapper.map_to(&john(), existing).unwrap();
    assert_eq!(model.name, "also kept");
    assert_eq!(model.id, 1234);
}

#[test]
fn test_fluent_to_member_converts() {
    let repository = Repository::default();
    let mapper = repository.resolve::<Person, PersonEditModel>(&[]).unwrap();
    mapper
        .add_mapping()
        .from("first_name.len()", |p: &Person| p.first_name.len() as i64)
        .to_member("name")
        .unwrap();
    assert_eq!(mapper.map(&john()).unwrap().name, "4");

    let err = mapper
        .add_mapping()
        .from("id", |p: &Person| p.id)
        .to_member("missing")
        .unwrap_err();
    assert!(matches!(err, MapperError::Argument(_)));
}

#[test]
fn test_fluent_try_to_failure_names_expression() {
    let repository = Repository::default();
    let mapper = repository.resolve::<Person, PersonEditModel>(&[]).unwrap();
    mapper
        .add_mapping()
        .from("first_name", |p: &Person| p.first_name.clone())
        .try_to("name", |_m: &mut PersonEditModel, first: String| {
            anyhow::ensure!(first.len() > 10, "name too short: {}", first);
            Ok(())
        })
        .unwrap();

    let failure = mapper.map(&john()).unwrap_err();
    let failure = failure.as_failure().unwrap();
    assert_eq!(failure.source_member, "first_name");
    assert_eq!(failure.cause.to_string(), "name too short: John");
}

#[test]
fn test_empty_names_are_argument_errors() {
    let repository = Repository::default();
    let mapper = repository.resolve::<Person, PersonEditModel>(&[]).unwrap();
    let err = mapper.add_mapping_action("", "name", |_, _| Ok(())).unwrap_err();
    assert!(matches!(err, MapperError::Argument(_)));
    let err = mapper.add_mapping_action("first_name", " ", |_, _| Ok(())).unwrap_err();
    assert!(matches!(err, MapperError::Argument(_)));
    assert_eq!(mapper.phase(), MapperPhase::New);
}
