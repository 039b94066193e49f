//! End-to-end insertion tests against a temporary sled store.

use appgraph_graph::{
    EdgeKind, GraphError, GraphInserter, GraphStore, InsertError, InsertOptions, IntegrityError,
    NodeLabel, PropertyGraph, PropertyValue, Reference, UnresolvedPolicy, DATE_ANALYSIS,
    DATE_ANALYSIS_FORMAT,
};
use appgraph_model::{
    Application, Argument, Class, IdAllocator, Method, MethodId, Metric, Modifier, Variable,
};
use std::path::Path;
use std::thread;
use std::time::Duration;

fn inserter() -> GraphInserter {
    GraphInserter::new(GraphStore::temporary().unwrap())
}

fn strict_inserter() -> GraphInserter {
    inserter().with_options(InsertOptions {
        unresolved: UnresolvedPolicy::Fail,
    })
}

/// Opens `path` again, waiting for sled to release the lock of an earlier
/// handle.
fn reopen(path: &Path) -> GraphStore {
    for _ in 0..100 {
        if let Ok(store) = GraphStore::open(path) {
            return store;
        }
        thread::sleep(Duration::from_millis(20));
    }
    GraphStore::open(path).unwrap()
}

fn load(inserter: &GraphInserter, app_key: &str) -> PropertyGraph {
    inserter.store().load_graph(Some(app_key)).unwrap()
}

fn method(ids: &mut IdAllocator, name: &str, class: &str) -> Method {
    Method::new(
        ids.method(),
        name,
        Modifier::Public,
        format!("{}#{}", name, class),
        "void",
    )
}

/// Three classes, fields, arguments, a hierarchy and a call chain.
fn shop_app(ids: &mut IdAllocator) -> Application {
    let (base, cart, listener) = (ids.class(), ids.class(), ids.class());
    let items = ids.variable();
    let total = ids.variable();

    let log = method(ids, "log", "BaseActivity");
    let on_change = method(ids, "onChange", "Listener");
    let add = method(ids, "add", "Cart")
        .with_argument(Argument::new("item", 0))
        .with_argument(Argument::new("qty", 1))
        .with_used_variable(items)
        .with_used_variable(total)
        .with_call(log.id)
        .with_call(on_change.id);
    let clear = method(ids, "clear", "Cart")
        .with_used_variable(items)
        .with_call(add.id);

    Application::new("com.shop-1", "Shop")
        .with_metric(Metric::new("NOC", 3))
        .with_class(
            Class::new(cart, "Cart", Modifier::Public)
                .extending(base, "BaseActivity")
                .implementing(listener)
                .with_variable(Variable::new(items, "items", Modifier::Private, "List"))
                .with_variable(Variable::new(total, "total", Modifier::Private, "int"))
                .with_method(add)
                .with_method(clear),
        )
        .with_class(
            Class::new(base, "BaseActivity", Modifier::Public)
                .extending_external("android.app.Activity")
                .with_method(log),
        )
        .with_class(Class::new(listener, "Listener", Modifier::Public).with_method(on_change))
}

#[test]
fn test_single_class_scenario() {
    let mut ids = IdAllocator::new();
    let app = Application::new("single-1", "Single").with_class(
        Class::new(ids.class(), "A", Modifier::Public)
            .with_metric(Metric::new("LOC", 10))
            .with_method(method(&mut ids, "m", "A")),
    );

    let mut inserter = inserter();
    let report = inserter.insert_app(&app).unwrap();
    let graph = load(&inserter, "single-1");

    assert_eq!(graph.node_count(), 3);
    assert_eq!(graph.nodes_with_label(NodeLabel::App).len(), 1);
    assert_eq!(graph.edge_count(), 2);
    assert_eq!(graph.edges_of_kind(EdgeKind::AppOwnsClass).len(), 1);
    assert_eq!(graph.edges_of_kind(EdgeKind::ClassOwnsMethod).len(), 1);

    let class = graph.find(NodeLabel::Class, "A").unwrap();
    assert_eq!(class.property("LOC"), Some(&PropertyValue::Integer(10)));
    assert!(graph.find(NodeLabel::Method, "m").is_some());
    assert_eq!(report.edges_created(), 2);
}

#[test]
fn test_node_count_matches_model() {
    let mut ids = IdAllocator::new();
    let app = shop_app(&mut ids);

    let mut inserter = inserter();
    let report = inserter.insert_app(&app).unwrap();

    // 1 app + 3 classes + 2 fields + 4 methods + 2 arguments
    assert_eq!(app.entity_count(), 12);
    assert_eq!(report.nodes_created, 12);
    assert_eq!(inserter.store().node_count().unwrap(), 12);
}

#[test]
fn test_every_node_carries_app_key() {
    let mut ids = IdAllocator::new();
    let app = shop_app(&mut ids);
    let mut inserter = inserter();
    inserter.insert_app(&app).unwrap();

    let nodes = inserter.store().nodes().unwrap();
    assert!(!nodes.is_empty());
    assert!(nodes.iter().all(|n| n.app_key() == Some("com.shop-1")));
}

#[test]
fn test_containment_edges() {
    let mut ids = IdAllocator::new();
    let app = shop_app(&mut ids);
    let mut inserter = inserter();
    inserter.insert_app(&app).unwrap();
    let graph = load(&inserter, &app.key);

    assert_eq!(graph.edges_of_kind(EdgeKind::AppOwnsClass).len(), 3);
    assert_eq!(graph.edges_of_kind(EdgeKind::ClassOwnsVariable).len(), 2);
    assert_eq!(graph.edges_of_kind(EdgeKind::ClassOwnsMethod).len(), 4);
    assert_eq!(graph.edges_of_kind(EdgeKind::MethodOwnsArgument).len(), 2);

    let add = graph.find(NodeLabel::Method, "add").unwrap();
    let mut used: Vec<&str> = graph
        .outgoing(add.id, EdgeKind::Uses)
        .iter()
        .filter_map(|n| n.name())
        .collect();
    used.sort_unstable();
    assert_eq!(used, ["items", "total"]);

    let positions: Vec<i64> = graph
        .outgoing(add.id, EdgeKind::MethodOwnsArgument)
        .iter()
        .filter_map(|n| n.property("position").and_then(PropertyValue::as_i64))
        .collect();
    assert_eq!(positions.len(), 2);
    assert!(positions.contains(&0) && positions.contains(&1));
}

#[test]
fn test_extends_edge_for_each_parent_reference() {
    let mut ids = IdAllocator::new();
    let app = shop_app(&mut ids);
    let mut inserter = inserter();
    inserter.insert_app(&app).unwrap();
    let graph = load(&inserter, &app.key);

    let cart = graph.find(NodeLabel::Class, "Cart").unwrap();
    let base = graph.find(NodeLabel::Class, "BaseActivity").unwrap();
    let listener = graph.find(NodeLabel::Class, "Listener").unwrap();

    assert_eq!(graph.count_edges(cart.id, base.id, EdgeKind::Extends), 1);
    assert_eq!(graph.count_edges(cart.id, listener.id, EdgeKind::Implements), 1);
    // BaseActivity's parent is a platform class: name only, no edge.
    assert_eq!(graph.edges_of_kind(EdgeKind::Extends).len(), 1);
    assert_eq!(
        base.property("parent_name"),
        Some(&PropertyValue::from("android.app.Activity"))
    );
}

#[test]
fn test_parent_outside_model_produces_no_edge() {
    let mut ids = IdAllocator::new();
    let (a, b) = (ids.class(), ids.class());

    let with_parent = Application::new("h-1", "H")
        .with_class(Class::new(a, "A", Modifier::Public))
        .with_class(Class::new(b, "B", Modifier::Public).extending(a, "A"));

    let mut inserter = inserter();
    let report = inserter.insert_app(&with_parent).unwrap();
    assert_eq!(report.derived.extends, 1);
    let graph = load(&inserter, "h-1");
    let (from, to) = graph.edges_of_kind(EdgeKind::Extends)[0];
    assert_eq!((from.name(), to.name()), (Some("B"), Some("A")));

    // A removed from the model: B only knows its parent by name.
    let without_parent = Application::new("h-2", "H")
        .with_class(Class::new(b, "B", Modifier::Public).extending_external("A"));
    let report = inserter.insert_app(&without_parent).unwrap();
    assert_eq!(report.derived.extends, 0);
    assert_eq!(report.skipped_references(), 0);
    assert!(load(&inserter, "h-2")
        .edges_of_kind(EdgeKind::Extends)
        .is_empty());
}

#[test]
fn test_calls_match_called_sets_exactly() {
    let mut ids = IdAllocator::new();
    let app = shop_app(&mut ids);
    let mut inserter = inserter();
    inserter.insert_app(&app).unwrap();
    let graph = load(&inserter, &app.key);

    let node_of = |name: &str| graph.find(NodeLabel::Method, name).unwrap().id;

    for caller in app.methods() {
        for callee in app.methods() {
            let expected = usize::from(caller.called_methods.contains(&callee.id));
            assert_eq!(
                graph.count_edges(node_of(&caller.name), node_of(&callee.name), EdgeKind::Calls),
                expected,
                "{} -> {}",
                caller.name,
                callee.name
            );
        }
    }
    assert_eq!(app.methods().count(), 4);
    assert_eq!(graph.edges_of_kind(EdgeKind::Calls).len(), 3);
}

#[test]
fn test_call_into_later_class_resolves() {
    let mut ids = IdAllocator::new();
    let m2 = method(&mut ids, "m2", "B");
    let m1 = method(&mut ids, "m1", "A").with_call(m2.id);
    let app = Application::new("c-1", "C")
        .with_class(Class::new(ids.class(), "A", Modifier::Public).with_method(m1))
        .with_class(Class::new(ids.class(), "B", Modifier::Public).with_method(m2));

    let mut inserter = inserter();
    inserter.insert_app(&app).unwrap();
    let graph = load(&inserter, "c-1");

    let calls = graph.edges_of_kind(EdgeKind::Calls);
    assert_eq!(calls.len(), 1);
    assert_eq!((calls[0].0.name(), calls[0].1.name()), (Some("m1"), Some("m2")));
}

#[test]
fn test_external_call_is_skipped() {
    let mut ids = IdAllocator::new();
    let m1 = method(&mut ids, "m1", "A").with_call(MethodId::new(10_000));
    let app = Application::new("ext-1", "Ext")
        .with_class(Class::new(ids.class(), "A", Modifier::Public).with_method(m1));

    let mut inserter = inserter();
    let report = inserter.insert_app(&app).unwrap();

    assert_eq!(report.derived.calls, 0);
    assert_eq!(report.skipped_references(), 1);
    assert!(load(&inserter, "ext-1")
        .edges_of_kind(EdgeKind::Calls)
        .is_empty());
}

#[test]
fn test_external_call_under_fail_policy_leaves_containment() {
    let mut ids = IdAllocator::new();
    let m2 = method(&mut ids, "m2", "A");
    let m1 = method(&mut ids, "m1", "A")
        .with_call(m2.id)
        .with_call(MethodId::new(10_000));
    let app = Application::new("ext-2", "Ext").with_class(
        Class::new(ids.class(), "A", Modifier::Public)
            .with_method(m1)
            .with_method(m2),
    );

    let mut inserter = strict_inserter();
    let err = inserter.insert_app(&app).unwrap_err();

    assert!(err.is_partial());
    assert_eq!(err.app_key(), "ext-2");
    assert!(matches!(
        err.phase_error(),
        GraphError::Integrity(IntegrityError::UnresolvedReference {
            reference: Reference::Call,
            to: 10_000,
            ..
        })
    ));

    // Phase one committed, phase two rolled back entirely.
    let graph = load(&inserter, "ext-2");
    assert_eq!(graph.node_count(), app.entity_count());
    assert!(graph.edges_of_kind(EdgeKind::Calls).is_empty());
    assert_eq!(graph.edges_of_kind(EdgeKind::ClassOwnsMethod).len(), 2);
}

#[test]
fn test_fail_policy_accepts_closed_model() {
    let mut ids = IdAllocator::new();
    let app = shop_app(&mut ids);
    let mut inserter = strict_inserter();

    let report = inserter.insert_app(&app).unwrap();
    assert_eq!(report.derived.calls, 3);
    assert_eq!(report.skipped_references(), 0);
}

#[test]
fn test_field_of_later_class_aborts_containment() {
    let mut ids = IdAllocator::new();
    let foreign = ids.variable();
    let app = Application::new("bad-1", "Bad")
        .with_class(
            Class::new(ids.class(), "A", Modifier::Public)
                .with_method(method(&mut ids, "peek", "A").with_used_variable(foreign)),
        )
        .with_class(
            Class::new(ids.class(), "B", Modifier::Public)
                .with_variable(Variable::new(foreign, "x", Modifier::Public, "int")),
        );

    let mut inserter = inserter();
    let err = inserter.insert_app(&app).unwrap_err();

    assert!(matches!(err, InsertError::Containment { .. }));
    assert!(!err.is_partial());
    assert_eq!(inserter.store().node_count().unwrap(), 0);
    assert_eq!(inserter.store().edge_count().unwrap(), 0);
}

#[test]
fn test_field_of_earlier_class_resolves() {
    let mut ids = IdAllocator::new();
    let shared = ids.variable();
    let app = Application::new("ok-1", "Ok")
        .with_class(
            Class::new(ids.class(), "Config", Modifier::Public)
                .with_variable(Variable::new(shared, "DEBUG", Modifier::Public, "boolean")),
        )
        .with_class(
            Class::new(ids.class(), "Main", Modifier::Public)
                .with_method(method(&mut ids, "run", "Main").with_used_variable(shared)),
        );

    let mut inserter = inserter();
    inserter.insert_app(&app).unwrap();
    assert_eq!(load(&inserter, "ok-1").edges_of_kind(EdgeKind::Uses).len(), 1);
}

#[test]
fn test_duplicate_entity_id_aborts_containment() {
    let mut ids = IdAllocator::new();
    let id = ids.class();
    let app = Application::new("dup-1", "Dup")
        .with_class(Class::new(id, "A", Modifier::Public))
        .with_class(Class::new(id, "A2", Modifier::Public));

    let mut inserter = inserter();
    let err = inserter.insert_app(&app).unwrap_err();

    assert!(matches!(
        err.phase_error(),
        GraphError::Integrity(IntegrityError::AlreadyRegistered { .. })
    ));
    assert_eq!(inserter.store().node_count().unwrap(), 0);
}

#[test]
fn test_inserting_twice_doubles_nodes() {
    let mut ids = IdAllocator::new();
    let app = shop_app(&mut ids);
    let mut inserter = inserter();

    let first = inserter.insert_app(&app).unwrap();
    let second = inserter.insert_app(&app).unwrap();

    assert_ne!(first.app_node, second.app_node);
    assert_eq!(
        inserter.store().node_count().unwrap(),
        2 * app.entity_count()
    );
    // Each pass only links its own nodes.
    let graph = inserter.store().load_graph(None).unwrap();
    assert_eq!(graph.edges_of_kind(EdgeKind::Calls).len(), 6);
    assert_eq!(graph.edges_of_kind(EdgeKind::Extends).len(), 2);
    for (from, to) in graph.edges_of_kind(EdgeKind::Calls) {
        assert_eq!(
            from.id < second.app_node,
            to.id < second.app_node,
            "CALLS edge crosses insertions"
        );
    }
}

#[test]
fn test_sequential_applications_stay_separate() {
    let mut ids = IdAllocator::new();
    let shop = shop_app(&mut ids);
    let other = Application::new("other-1", "Other")
        .with_class(Class::new(ids.class(), "Solo", Modifier::Public));

    let mut inserter = inserter();
    inserter.insert_app(&shop).unwrap();
    inserter.insert_app(&other).unwrap();

    assert_eq!(load(&inserter, "com.shop-1").node_count(), 12);
    let other_graph = load(&inserter, "other-1");
    assert_eq!(other_graph.node_count(), 2);
    assert_eq!(other_graph.edge_count(), 1);
}

#[test]
fn test_app_node_properties() {
    let mut ids = IdAllocator::new();
    let mut app = shop_app(&mut ids);
    app.category = "SHOPPING".to_string();
    app.rating = 4.2;
    app.nb_download = 50_000;
    app.size = 1_024;
    app.price = "Free".to_string();

    let mut inserter = inserter();
    let report = inserter.insert_app(&app).unwrap();
    let node = inserter.store().node(report.app_node).unwrap().unwrap();

    assert_eq!(node.label, NodeLabel::App);
    assert_eq!(node.name(), Some("Shop"));
    assert_eq!(node.property("category"), Some(&PropertyValue::from("SHOPPING")));
    assert_eq!(node.property("rating"), Some(&PropertyValue::Real(4.2)));
    assert_eq!(node.property("nb_download"), Some(&PropertyValue::Integer(50_000)));
    assert_eq!(node.property("size"), Some(&PropertyValue::Integer(1_024)));
    assert_eq!(node.property("price"), Some(&PropertyValue::from("Free")));
    assert_eq!(node.property("NOC"), Some(&PropertyValue::Integer(3)));

    let stamp = node
        .property(DATE_ANALYSIS)
        .and_then(PropertyValue::as_str)
        .unwrap();
    assert_eq!(stamp, report.analyzed_at);
    assert!(chrono::NaiveDateTime::parse_from_str(stamp, DATE_ANALYSIS_FORMAT).is_ok());
}

#[test]
fn test_reopened_store_keeps_graph() {
    let dir = tempfile::tempdir().unwrap();
    let mut ids = IdAllocator::new();
    let app = shop_app(&mut ids);

    let mut inserter = GraphInserter::open(dir.path()).unwrap();
    inserter.insert_app(&app).unwrap();
    drop(inserter.into_store());

    let store = reopen(dir.path());
    let stats = store.stats().unwrap();
    assert_eq!(stats.node_count, 12);
    assert_eq!(stats.nodes_by_label.get(&NodeLabel::Method), Some(&4));
    assert_eq!(stats.edges_by_kind.get(&EdgeKind::Calls), Some(&3));
}

#[test]
fn test_metric_named_app_key_keeps_node_in_app() {
    let mut ids = IdAllocator::new();
    let app = Application::new("k1", "Shadow")
        .with_metric(Metric::new("app_key", 1))
        .with_class(
            Class::new(ids.class(), "A", Modifier::Public).with_metric(Metric::new("app_key", 7)),
        );

    let mut inserter = inserter();
    inserter.insert_app(&app).unwrap();

    let graph = load(&inserter, "k1");
    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.edges_of_kind(EdgeKind::AppOwnsClass).len(), 1);
    let class = graph.find(NodeLabel::Class, "A").unwrap();
    assert_eq!(class.app_key(), Some("k1"));
}

#[test]
fn test_empty_app_key_is_rejected() {
    let mut ids = IdAllocator::new();
    let app =
        Application::new("", "X").with_class(Class::new(ids.class(), "A", Modifier::Public));

    let mut inserter = inserter();
    let err = inserter.insert_app(&app).unwrap_err();

    assert!(matches!(
        err.phase_error(),
        GraphError::Integrity(IntegrityError::EmptyAppKey)
    ));
    assert_eq!(inserter.store().node_count().unwrap(), 0);
}
