use objmap::{
    Inclusion, Mappable, MapperError, MappingConfiguration, MappingOptions, Repository, StrategyKind,
};

#[derive(Debug, Clone, Default, PartialEq, Mappable)]
struct Contact {
    #[mapping(counterpart = Lead, member = "display_name", direction = "to")]
    full_name: String,
    email: String,
    phone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Mappable)]
struct Lead {
    display_name: String,
    #[mapping(counterpart = Contact, member = "phone", direction = "from")]
    telephone: String,
    mail: String,
}

fn contact() -> Contact {
    Contact {
        full_name: "Ada Lovelace".into(),
        email: "ada@example.com".into(),
        phone: "+44 1234".into(),
    }
}

#[test]
fn test_attribute_tags_drive_rules() {
    let repository = Repository::default();
    let lead = repository
        .resolve::<Contact, Lead>(&[])
        .unwrap()
        .map(&contact())
        .unwrap();
    assert_eq!(lead.display_name, "Ada Lovelace");
    assert_eq!(lead.telephone, "+44 1234");
    assert_eq!(lead.mail, "");
}

#[test]
fn test_configuration_pairs_drive_rules() {
    let configuration = MappingConfiguration::new().with_mapping("Contact", "Lead", [("email", "mail")]);
    let options = MappingOptions::default().with_configuration(configuration);
    let repository = Repository::new(options);

    let lead = repository
        .resolve::<Contact, Lead>(&[])
        .unwrap()
        .map(&contact())
        .unwrap();
    assert_eq!(lead.mail, "ada@example.com");
    assert_eq!(lead.display_name, "Ada Lovelace");
}

#[test]
fn test_options_file_with_strategies_and_mappings() {
    let options = MappingOptions::from_toml_str(
        r#"
strategies = ["configuration"]

[[mappings]]
source = "Contact"
target = "Lead"
members = [{ source = "phone", target = "mail" }]
"#,
    )
    .unwrap();
    let repository = Repository::new(options);
    let lead = repository
        .resolve::<Contact, Lead>(&[])
        .unwrap()
        .map(&contact())
        .unwrap();

    // only the configured pair; attribute rules are not enabled
    assert_eq!(
        lead,
        Lead {
            mail: "+44 1234".into(),
            ..Lead::default()
        }
    );
}

#[test]
fn test_bad_configuration_member_surfaces_on_first_map() {
    let configuration = MappingConfiguration::new().with_mapping("Contact", "Lead", [("fax", "mail")]);
    let repository = Repository::new(MappingOptions::default().with_configuration(configuration));
    let mapper = repository.resolve::<Contact, Lead>(&[]).unwrap();
    let err = mapper.map(&contact()).unwrap_err();
    assert!(matches!(err, MapperError::Configuration(_)));
}

#[test]
fn test_precedence_follows_option_order() {
    let configuration =
        MappingConfiguration::new().with_mapping("Contact", "Lead", [("email", "display_name")]);

    let config_first = Repository::new(
        MappingOptions::new([StrategyKind::Configuration, StrategyKind::Attribute])
            .unwrap()
            .with_configuration(configuration.clone()),
    );
    let lead = config_first.resolve::<Contact, Lead>(&[]).unwrap().map(&contact()).unwrap();
    assert_eq!(lead.display_name, "ada@example.com");

    let attribute_first = Repository::new(
        MappingOptions::new([StrategyKind::Attribute, StrategyKind::Configuration])
            .unwrap()
            .with_configuration(configuration),
    );
    let lead = attribute_first.resolve::<Contact, Lead>(&[]).unwrap().map(&contact()).unwrap();
    assert_eq!(lead.display_name, "Ada Lovelace");
}

#[derive(Debug, Clone, Default, PartialEq, Mappable)]
struct OrderLine {
    sku: String,
    quantity: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Mappable)]
struct OrderLineDto {
    sku: String,
    quantity: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Mappable)]
struct Order {
    number: String,
    lines: Vec<OrderLine>,
    gift: Option<OrderLine>,
}

#[derive(Debug, Clone, Default, PartialEq, Mappable)]
struct OrderDto {
    number: String,
    lines: Vec<OrderLineDto>,
    gift: Option<OrderLineDto>,
}

fn order() -> Order {
    Order {
        number: "SO-7".into(),
        lines: vec![
            OrderLine { sku: "A".into(), quantity: 1 },
            OrderLine { sku: "B".into(), quantity: 5 },
        ],
        gift: Some(OrderLine { sku: "G".into(), quantity: 1 }),
    }
}

#[test]
fn test_association_maps_lists_and_optionals() {
    let repository = Repository::default();
    let inclusions = [Inclusion::of::<OrderLine, OrderLineDto>()];
    let mapper = repository.resolve::<Order, OrderDto>(&inclusions).unwrap();

    let dto = mapper.map(&order()).unwrap();
    assert_eq!(dto.number, "SO-7");
    assert_eq!(
        dto.lines,
        vec![
            OrderLineDto { sku: "A".into(), quantity: 1 },
            OrderLineDto { sku: "B".into(), quantity: 5 },
        ]
    );
    assert_eq!(dto.gift, Some(OrderLineDto { sku: "G".into(), quantity: 1 }));

    let without_gift = Order { gift: None, ..order() };
    assert_eq!(mapper.map(&without_gift).unwrap().gift, None);
}

#[test]
fn test_association_uses_injected_inner_mapper() {
    let repository = Repository::default();
    let inclusions = [Inclusion::of::<OrderLine, OrderLineDto>()];
    let inner = repository
        .resolve::<OrderLine, OrderLineDto>(&inclusions)
        .unwrap();
    inner
        .add_mapping_action("sku", "sku", |line: &OrderLine, dto: &mut OrderLineDto| {
            dto.sku = line.sku.to_lowercase();
            Ok(())
        })
        .unwrap();

    let dto = repository
        .resolve::<Order, OrderDto>(&inclusions)
        .unwrap()
        .map(&order())
        .unwrap();
    let skus: Vec<_> = dto.lines.iter().map(|l| l.sku.as_str()).collect();
    assert_eq!(skus, vec!["a", "b"]);
}

#[test]
fn test_add_inner_mapper_without_inclusions() {
    let repository = Repository::default();
    let mapper = repository.resolve::<Order, OrderDto>(&[]).unwrap();
    mapper.add_inner_mapper::<OrderLine, OrderLineDto>("lines", "lines").unwrap();

    let dto = mapper.map(&order()).unwrap();
    assert_eq!(dto.lines.len(), 2);
    assert_eq!(dto.lines[1].quantity, 5);
    // gift was not associated, so it stays empty
    assert_eq!(dto.gift, None);

    let err = repository
        .resolve::<Order, OrderDto>(&[Inclusion::of::<OrderLine, OrderLineDto>()])
        .unwrap()
        .add_inner_mapper::<OrderLine, OrderLineDto>("number", "number")
        .unwrap_err();
    assert!(matches!(err, MapperError::Argument(_)));
}

#[test]
fn test_inner_failures_propagate_from_nested_mapper() {
    let repository = Repository::default();
    let inclusions = [Inclusion::of::<OrderLine, OrderLineDto>()];
    repository
        .resolve::<OrderLine, OrderLineDto>(&inclusions)
        .unwrap()
        .add_mapping_action("quantity", "quantity", |line: &OrderLine, _: &mut OrderLineDto| {
            anyhow::ensure!(line.quantity < 5, "quantity {} over limit", line.quantity);
            Ok(())
        })
        .unwrap();

    let err = repository
        .resolve::<Order, OrderDto>(&inclusions)
        .unwrap()
        .map(&order())
        .unwrap_err();
    let failure = err.as_failure().unwrap();
    assert_eq!(failure.source_type, "Order");
    assert_eq!(failure.target_member, "lines");
    assert!(format!("{:#}", failure.cause).contains("quantity 5 over limit"));
}

#[derive(Debug, Clone, Default, PartialEq, Mappable)]
struct GlobalProbe {
    value: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Mappable)]
struct GlobalProbeDto {
    value: i32,
}

#[test]
fn test_global_repository_is_shared_until_cleared() {
    let global = Repository::global();
    let a = global.resolve::<GlobalProbe, GlobalProbeDto>(&[]).unwrap();
    let b = Repository::global()
        .resolve::<GlobalProbe, GlobalProbeDto>(&[])
        .unwrap();
    assert!(a.ptr_eq(&b));

    global.clear();
    let c = global.resolve::<GlobalProbe, GlobalProbeDto>(&[]).unwrap();
    assert!(!a.ptr_eq(&c));
    assert_eq!(c.map(&GlobalProbe { value: 3 }).unwrap(), GlobalProbeDto { value: 3 });
}

#[test]
fn test_frozen_mapper_refuses_inner_mapper_without_caching_it() {
    let repository = Repository::default();
    let mapper = repository.resolve::<Order, OrderDto>(&[]).unwrap();
    mapper.map(&order()).unwrap();

    let err = mapper
        .add_inner_mapper::<OrderLine, OrderLineDto>("lines", "lines")
        .unwrap_err();
    assert!(matches!(err, MapperError::InvalidOperation(_)));
    assert!(repository
        .try_get_mapper(OrderLine::describe(), OrderLineDto::describe(), &[])
        .is_none());
    assert_eq!(repository.len(), 1);
}
