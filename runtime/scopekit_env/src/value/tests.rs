use super::*;
use pretty_assertions::assert_eq;

fn push(value: &mut Value, item: Value) {
    value.modify(|object| {
        if let Object::Vector(items) = object {
            items.push(item);
        }
    });
}

#[test]
fn test_modify_unshared_keeps_identity() {
    let mut v = Value::vector(vec![Value::int(1)]);
    let before = v.id();
    push(&mut v, Value::int(2));
    assert_eq!(v.id(), before);
    assert_eq!(v.as_vector().map(<[Value]>::len), Some(2));
}

#[test]
fn test_modify_shared_copies_and_leaves_other_holder() {
    let original = Value::vector(vec![Value::int(1)]);
    let mut copy = original.clone();
    assert!(Value::same(&original, &copy));

    push(&mut copy, Value::int(2));

    assert!(!Value::same(&original, &copy));
    assert_eq!(original, Value::vector(vec![Value::int(1)]));
    assert_eq!(copy, Value::vector(vec![Value::int(1), Value::int(2)]));
    assert!(!original.is_shared());
}

#[test]
fn test_copied_vector_shares_elements() {
    let element = Value::string("shared");
    let original = Value::vector(vec![element.clone()]);
    let mut copy = original.clone();
    push(&mut copy, Value::null());

    let (Some(a), Some(b)) = (original.as_vector(), copy.as_vector()) else {
        panic!("vectors");
    };
    assert!(Value::same(&a[0], &b[0]));
    assert!(Value::same(&a[0], &element));
}

#[test]
fn test_env_object_copy_keeps_same_environment() {
    let env = crate::EnvGraph::new()
        .new_env(EnvId::EMPTY, crate::BindingTable::new())
        .unwrap();
    let a = Value::env(env);
    let mut b = a.clone();
    b.modify(|_| ());
    assert_eq!(a.as_env(), b.as_env());
    assert_eq!(a, b);
}

#[test]
fn test_equality_is_by_content_except_for_envs() {
    assert_eq!(Value::int(3), Value::int(3));
    assert_ne!(Value::int(3), Value::float(3.0));
    assert_eq!(Value::string("a"), Value::string("a"));
    assert_ne!(Value::env(EnvId::EMPTY), Value::null());
}

#[test]
fn test_accessors_and_kinds() {
    assert_eq!(Value::from(5).as_int(), Some(5));
    assert_eq!(Value::from(true).as_bool(), Some(true));
    assert_eq!(Value::from("t").as_str(), Some("t"));
    assert_eq!(Value::float(0.5).as_float(), Some(0.5));
    assert_eq!(Value::from(EnvId::EMPTY).kind(), "environment");
    assert!(Value::null().is_null());
    assert_eq!(Value::int(1).as_closure().map(Closure::arity), None);
}

#[test]
fn test_debug_rendering() {
    let v = Value::vector(vec![Value::int(1), Value::bool(false), Value::null()]);
    assert_eq!(format!("{v:?}"), "[1L, FALSE, NULL]");
    assert_eq!(format!("{:?}", Value::env(EnvId::EMPTY)), "<env 0>");
}
