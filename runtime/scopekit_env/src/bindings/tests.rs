use super::*;
use pretty_assertions::assert_eq;
use scopekit_ir::StringInterner;

#[test]
fn test_get_missing_is_none_not_error() {
    let interner = StringInterner::new();
    let table = BindingTable::new();
    assert!(table.get(interner.intern("x")).is_none());
}

#[test]
fn test_get_strict_missing_is_name_not_found() {
    let interner = StringInterner::new();
    let x = interner.intern("x");
    let table = BindingTable::new();
    assert_eq!(table.get_strict(x), Err(EnvError::NameNotFound { name: x }));
}

#[test]
fn test_rebinding_replaces_instead_of_duplicating() {
    let interner = StringInterner::new();
    let x = interner.intern("x");
    let mut table = BindingTable::new();

    assert!(table.set(x, Value::int(1)).is_none());
    assert_eq!(table.set(x, Value::int(2)), Some(Value::int(1)));

    assert_eq!(table.names(), vec![x]);
    assert_eq!(table.get(x), Some(&Value::int(2)));
    assert_eq!(table.len(), 1);
}

#[test]
fn test_setting_null_keeps_binding() {
    let interner = StringInterner::new();
    let x = interner.intern("x");
    let mut table = BindingTable::new();

    table.set(x, Value::int(1));
    table.set(x, Value::null());
    assert!(table.has(x));
    assert!(table.get_strict(x).is_ok_and(Value::is_null));

    assert_eq!(table.remove(x), Some(Value::null()));
    assert!(!table.has(x));
    assert!(table.is_empty());
}

#[test]
fn test_arbitrary_names_round_trip() {
    let interner = StringInterner::new();
    let odd = interner.intern("an odd name`");
    let reserved = interner.intern("if");
    let mut table: BindingTable = [(odd, Value::int(1)), (reserved, Value::int(2))]
        .into_iter()
        .collect();

    assert!(table.has(odd));
    assert_eq!(table.get_strict(reserved), Ok(&Value::int(2)));
    table.remove(odd);
    assert_eq!(table.names(), vec![reserved]);
}

#[test]
fn test_set_shares_value_identity() {
    let interner = StringInterner::new();
    let (a, b) = (interner.intern("a"), interner.intern("b"));
    let v = Value::vector(vec![Value::int(1)]);
    let mut table = BindingTable::new();
    table.set(a, v.clone());
    table.set(b, v.clone());

    let (Some(va), Some(vb)) = (table.get(a), table.get(b)) else {
        panic!("both bound");
    };
    assert!(Value::same(va, vb));
}
