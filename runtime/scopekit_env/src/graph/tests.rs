use super::*;
use pretty_assertions::assert_eq;
use scopekit_ir::StringInterner;

fn table(entries: &[(Name, Value)]) -> BindingTable {
    entries.iter().cloned().collect()
}

#[test]
fn test_empty_env_has_no_parent_and_no_bindings() {
    let graph = EnvGraph::new();
    assert_eq!(graph.parent_of(EnvId::EMPTY), Ok(None));
    assert_eq!(graph.names(EnvId::EMPTY), Ok(vec![]));
    assert_eq!(graph.len(), 1);
}

#[test]
fn test_new_env_links_parent() {
    let graph = EnvGraph::new();
    let outer = graph.new_env(EnvId::EMPTY, BindingTable::new()).unwrap();
    let inner = graph.new_env(outer, BindingTable::new()).unwrap();

    assert_eq!(graph.parent_of(inner), Ok(Some(outer)));
    assert_eq!(graph.ancestors(inner), Ok(vec![inner, outer, EnvId::EMPTY]));
    assert_eq!(graph.depth(inner), Ok(2));
}

#[test]
fn test_identical_environments_are_not_equal() {
    let interner = StringInterner::new();
    let x = interner.intern("x");
    let graph = EnvGraph::new();
    let a = graph
        .new_env(EnvId::EMPTY, table(&[(x, Value::int(1))]))
        .unwrap();
    let b = graph
        .new_env(EnvId::EMPTY, table(&[(x, Value::int(1))]))
        .unwrap();

    assert!(!EnvGraph::identity_equal(a, b));
    assert!(EnvGraph::identity_equal(a, a));
}

#[test]
fn test_mutation_is_visible_through_every_holder() {
    let interner = StringInterner::new();
    let (x, e) = (interner.intern("x"), interner.intern("e"));
    let graph = EnvGraph::new();
    let target = graph.new_env(EnvId::EMPTY, BindingTable::new()).unwrap();
    let holder = graph.new_env(EnvId::EMPTY, BindingTable::new()).unwrap();

    graph.set(holder, e, Value::env(target)).unwrap();
    let alias = graph.get(holder, e).unwrap().and_then(|v| v.as_env()).unwrap();
    graph.set(alias, x, Value::int(7)).unwrap();

    assert_eq!(graph.get(target, x), Ok(Some(Value::int(7))));
}

#[test]
fn test_environment_can_contain_itself() {
    let interner = StringInterner::new();
    let me = interner.intern("self");
    let graph = EnvGraph::new();
    let env = graph.new_env(EnvId::EMPTY, BindingTable::new()).unwrap();

    graph.set(env, me, Value::env(env)).unwrap();

    let inner = graph.get_strict(env, me).unwrap();
    assert_eq!(inner.as_env(), Some(env));
    let inner_again = graph.get_strict(inner.as_env().unwrap(), me).unwrap();
    assert_eq!(inner_again.as_env(), Some(env));
}

#[test]
fn test_set_on_empty_env_is_rejected() {
    let interner = StringInterner::new();
    let graph = EnvGraph::new();
    assert_eq!(
        graph.set(EnvId::EMPTY, interner.intern("x"), Value::int(1)),
        Err(EnvError::EmptyEnvironment)
    );
    assert_eq!(graph.names(EnvId::EMPTY), Ok(vec![]));
}

#[test]
fn test_set_parent_of_empty_is_invalid() {
    let graph = EnvGraph::new();
    let env = graph.new_env(EnvId::EMPTY, BindingTable::new()).unwrap();
    assert_eq!(
        graph.set_parent(EnvId::EMPTY, env),
        Err(EnvError::InvalidParent {
            env: EnvId::EMPTY,
            reason: ParentViolation::EmptyHasNoParent,
        })
    );
    assert_eq!(graph.parent_of(EnvId::EMPTY), Ok(None));
}

#[test]
fn test_set_parent_rejects_cycles() {
    let graph = EnvGraph::new();
    let a = graph.new_env(EnvId::EMPTY, BindingTable::new()).unwrap();
    let b = graph.new_env(a, BindingTable::new()).unwrap();

    assert_eq!(
        graph.set_parent(a, b),
        Err(EnvError::InvalidParent {
            env: a,
            reason: ParentViolation::Cycle,
        })
    );
    assert_eq!(
        graph.set_parent(a, a),
        Err(EnvError::InvalidParent {
            env: a,
            reason: ParentViolation::Cycle,
        })
    );
    // Unchanged after the failed attempts.
    assert_eq!(graph.parent_of(a), Ok(Some(EnvId::EMPTY)));
}

#[test]
fn test_set_parent_moves_env() {
    let graph = EnvGraph::new();
    let a = graph.new_env(EnvId::EMPTY, BindingTable::new()).unwrap();
    let b = graph.new_env(EnvId::EMPTY, BindingTable::new()).unwrap();
    graph.set_parent(b, a).unwrap();
    assert_eq!(graph.parent_of(b), Ok(Some(a)));
}

#[test]
fn test_reclaim_invalidates_handles() {
    let interner = StringInterner::new();
    let x = interner.intern("x");
    let graph = EnvGraph::new();
    let kept = graph.new_env(EnvId::EMPTY, BindingTable::new()).unwrap();
    let dropped = graph.new_env(EnvId::EMPTY, BindingTable::new()).unwrap();

    let live: FxHashSet<EnvId> = [EnvId::EMPTY, kept].into_iter().collect();
    assert_eq!(graph.reclaim(&live), 1);

    assert!(graph.contains(kept));
    assert!(!graph.contains(dropped));
    assert_eq!(
        graph.set(dropped, x, Value::int(1)),
        Err(EnvError::StaleEnvironment { env: dropped })
    );

    // The slot is reused under a new generation; the old handle stays stale.
    let reused = graph.new_env(EnvId::EMPTY, BindingTable::new()).unwrap();
    assert_eq!(reused.index(), dropped.index());
    assert_ne!(reused, dropped);
    assert!(!graph.contains(dropped));
    assert_eq!(graph.len(), 3);
}

#[test]
fn test_reclaim_never_drops_empty_env() {
    let graph = EnvGraph::new();
    assert_eq!(graph.reclaim(&FxHashSet::default()), 0);
    assert!(graph.contains(EnvId::EMPTY));
}

#[test]
fn test_new_env_with_stale_parent_fails() {
    let graph = EnvGraph::new();
    let gone = graph.new_env(EnvId::EMPTY, BindingTable::new()).unwrap();
    graph.reclaim(&FxHashSet::default());
    assert_eq!(
        graph.new_env(gone, BindingTable::new()),
        Err(EnvError::StaleEnvironment { env: gone })
    );
}

#[test]
fn test_snapshot_and_names_are_sorted() {
    let interner = StringInterner::new();
    let graph = EnvGraph::new();
    let names: Vec<Name> = ["c", "a", "b"].iter().map(|s| interner.intern(s)).collect();
    let env = graph
        .new_env(
            EnvId::EMPTY,
            names.iter().map(|n| (*n, Value::null())).collect(),
        )
        .unwrap();

    let mut expected = names.clone();
    expected.sort();
    assert_eq!(graph.names(env), Ok(expected.clone()));
    let snapshot: Vec<Name> = graph.snapshot(env).unwrap().into_iter().map(|(n, _)| n).collect();
    assert_eq!(snapshot, expected);
}

#[test]
fn test_writes_to_distinct_envs_run_concurrently() {
    let interner = StringInterner::new();
    let graph = EnvGraph::new();
    let envs: Vec<EnvId> = (0..4)
        .map(|_| graph.new_env(EnvId::EMPTY, BindingTable::new()).unwrap())
        .collect();
    let names: Vec<Name> = (0..100).map(|i| interner.intern(&format!("v{i}"))).collect();

    std::thread::scope(|scope| {
        for env in &envs {
            let (graph, names) = (&graph, &names);
            scope.spawn(move || {
                for (i, name) in names.iter().enumerate() {
                    graph.set(*env, *name, Value::int(i as i64)).unwrap();
                }
            });
        }
    });

    for env in envs {
        assert_eq!(graph.names(env).unwrap().len(), 100);
        assert_eq!(graph.get(env, names[42]), Ok(Some(Value::int(42))));
    }
}

#[test]
fn test_display_includes_generation_after_reuse() {
    let graph = EnvGraph::new();
    let first = graph.new_env(EnvId::EMPTY, BindingTable::new()).unwrap();
    assert_eq!(first.to_string(), "<env 1>");
    graph.reclaim(&FxHashSet::default());
    let second = graph.new_env(EnvId::EMPTY, BindingTable::new()).unwrap();
    assert_eq!(second.to_string(), "<env 1#1>");
}

#[test]
fn test_reclaim_since_spares_envs_created_after_the_watermark() {
    let interner = StringInterner::new();
    let graph = EnvGraph::new();
    let old = graph.new_env(EnvId::EMPTY, BindingTable::new()).unwrap();
    let since = graph.watermark();
    let live: FxHashSet<EnvId> = [EnvId::EMPTY].into_iter().collect();

    // Created after the live set was computed, under an otherwise dead parent.
    let young = graph.new_env(old, BindingTable::new()).unwrap();
    let held = graph.new_env(EnvId::EMPTY, BindingTable::new()).unwrap();
    graph.set(young, interner.intern("h"), Value::env(held)).unwrap();
    let stray = graph.new_env(EnvId::EMPTY, BindingTable::new()).unwrap();

    assert_eq!(graph.reclaim_since(&live, since), 0);
    for env in [old, young, held, stray] {
        assert!(graph.contains(env), "{env} should survive");
    }

    // A later pass with a fresh watermark frees them all.
    assert_eq!(graph.reclaim(&live), 4);
}

#[test]
fn test_handles_from_another_graph_are_rejected() {
    let ours = EnvGraph::new();
    let theirs = EnvGraph::new();
    let local = ours.new_env(EnvId::EMPTY, BindingTable::new()).unwrap();
    let foreign = theirs.new_env(EnvId::EMPTY, BindingTable::new()).unwrap();

    assert_eq!(local.index(), foreign.index());
    assert_ne!(local, foreign);
    assert!(!ours.contains(foreign));
    assert_eq!(
        ours.new_env(foreign, BindingTable::new()),
        Err(EnvError::StaleEnvironment { env: foreign })
    );
}
