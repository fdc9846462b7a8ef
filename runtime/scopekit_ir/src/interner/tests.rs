use super::*;

#[test]
fn test_intern_is_idempotent() {
    let interner = StringInterner::new();

    let x = interner.intern("x");
    let y = interner.intern("y");

    assert_eq!(x, interner.intern("x"));
    assert_ne!(x, y);
    assert_eq!(interner.lookup(x), "x");
    assert_eq!(interner.lookup(y), "y");
}

#[test]
fn test_empty_text_is_empty_name() {
    let interner = StringInterner::new();
    assert_eq!(interner.intern(""), Name::EMPTY);
    assert_eq!(interner.lookup(Name::EMPTY), "");
}

#[test]
fn test_arbitrary_text_names_round_trip() {
    let interner = StringInterner::new();
    for text in ["a b", "1st", "`tick`", "if", "ünïcödé", "\n", "x\\y"] {
        let name = interner.intern(text);
        assert_eq!(interner.lookup(name), text);
    }
}

#[test]
fn test_reserved_words_are_pre_interned() {
    let interner = StringInterner::new();
    for word in RESERVED_WORDS {
        assert!(interner.get(word).is_some(), "{word} should be pre-interned");
    }
    assert!(interner.is_empty());
}

#[test]
fn test_get_does_not_insert() {
    let interner = StringInterner::new();
    let before = interner.len();
    assert_eq!(interner.get("never_seen"), None);
    assert_eq!(interner.len(), before);
}

#[test]
fn test_intern_owned_matches_borrowed() {
    let interner = StringInterner::new();
    let owned = interner.intern_owned(String::from("counter"));
    assert_eq!(owned, interner.intern("counter"));
}

#[test]
fn test_shared_interner_clones_share_names() {
    let a = SharedInterner::new();
    let b = a.clone();
    assert_eq!(a.intern("shared"), b.intern("shared"));
    assert_eq!(StringLookup::lookup(&b, a.intern("shared")), "shared");
}

#[test]
fn test_concurrent_interning_agrees() {
    let interner = SharedInterner::new();
    let names: Vec<Vec<Name>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let interner = interner.clone();
                scope.spawn(move || {
                    (0..64)
                        .map(|i| interner.intern(&format!("v{i}")))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    for other in &names[1..] {
        assert_eq!(&names[0], other);
    }
}
