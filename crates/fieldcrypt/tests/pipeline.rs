use std::sync::Arc;

use fieldcrypt::{
    blob, CipherMode, Document, EncryptedValue, ErrorKind, FieldCipher, FieldCipherError,
    FieldKey, PathGroup, Slot,
};
use serde_json::json;

#[derive(Default, Document)]
struct Company {
    name: String,
    position: EncryptedValue<String>,
    salary: Option<EncryptedValue<f64>>,
}

#[derive(Default, Document)]
struct Person {
    #[document(rename = "displayName")]
    display_name: String,
    email: EncryptedValue<String>,
    birth_year: EncryptedValue<i64>,
    companies: Vec<Company>,
    #[document(skip)]
    notes: Arc<String>,
}

#[derive(Document)]
struct Pair(EncryptedValue<String>, String);

#[derive(Document)]
struct Envelope<T> {
    inner: T,
}

fn group(paths: &[&str]) -> PathGroup {
    PathGroup::new("test", paths.iter().copied()).unwrap()
}

fn company(name: &str, position: &str) -> Company {
    Company {
        name: name.into(),
        position: position.to_string().into(),
        salary: None,
    }
}

fn person() -> Person {
    Person {
        display_name: "Alice".into(),
        email: "alice@example.com".to_string().into(),
        birth_year: 1987.into(),
        companies: vec![company("Acme", "Engineer"), company("Initech", "Manager")],
        notes: Arc::new("shared".into()),
    }
}

#[test]
fn struct_seal_then_map_open() {
    let cipher = FieldCipher::new(FieldKey::generate());
    let mut c = company("Acme", "Engineer");
    cipher.encrypt_struct(&mut c, &[group(&["position"])]).unwrap();

    let mut row = json!({ "name": c.name, "position": blob::to_value(c.position.raw()) });
    cipher.decrypt_maps(&mut row, &[group(&["position"])]).unwrap();
    assert_eq!(row, json!({"name": "Acme", "position": "Engineer"}));
}

#[test]
fn map_seal_then_struct_open() {
    let cipher = FieldCipher::new(FieldKey::generate());
    let mut row = json!({"email": "bob@example.com", "birth_year": 1990});
    let pii = [group(&["email", "birth_year"])];
    cipher.encrypt_maps(&mut row, &pii).unwrap();

    let mut p = Person {
        email: EncryptedValue::with_raw(blob::from_value(&row["email"]).unwrap()),
        birth_year: EncryptedValue::with_raw(blob::from_value(&row["birth_year"]).unwrap()),
        ..Person::default()
    };
    cipher.decrypt_struct(&mut p, &pii).unwrap();
    assert_eq!(p.email.value(), "bob@example.com");
    assert_eq!(*p.birth_year.value(), 1990);
}

#[test]
fn nested_rows_round_trip_through_struct_and_map() {
    let cipher = FieldCipher::new(FieldKey::generate());
    let groups = [
        group(&["email", "birth_year"]),
        group(&["companies.position", "companies.salary"]).optional(),
    ];

    let mut p = person();
    p.companies[1].salary = Some(125_000.5.into());
    cipher.encrypt_struct(&mut p, &groups).unwrap();

    let companies: Vec<_> = p
        .companies
        .iter()
        .map(|c| {
            let mut row = json!({ "name": c.name, "position": blob::to_value(c.position.raw()) });
            if let Some(salary) = &c.salary {
                row["salary"] = blob::to_value(salary.raw());
            }
            row
        })
        .collect();
    let mut doc = json!({
        "email": blob::to_value(p.email.raw()),
        "birth_year": blob::to_value(p.birth_year.raw()),
        "companies": companies,
    });

    cipher.decrypt_maps(&mut doc, &groups).unwrap();
    assert_eq!(
        doc,
        json!({
            "email": "alice@example.com",
            "birth_year": 1987,
            "companies": [
                {"name": "Acme", "position": "Engineer"},
                {"name": "Initech", "position": "Manager", "salary": 125000.5}
            ]
        })
    );
}

#[test]
fn absent_paths_differ_between_drivers() {
    let cipher = FieldCipher::new(FieldKey::generate());
    let pii = [group(&["phone"])];

    let mut p = person();
    cipher.encrypt_struct(&mut p, &pii).unwrap();

    let mut doc = json!({"email": "x"});
    let err = cipher.encrypt_maps(&mut doc, &pii).unwrap_err();
    assert_eq!(err, FieldCipherError::FieldNotFound { path: "phone".into() });
    assert_eq!(err.kind(), ErrorKind::FieldNotFound);
}

#[test]
fn derive_honours_rename_and_skip() {
    let mut p = person();
    assert!(matches!(p.field_mut("displayName"), Some(Slot::Plain)));
    assert!(p.field_mut("display_name").is_none());
    assert!(p.field_mut("notes").is_none());
    assert!(matches!(p.field_mut("companies"), Some(Slot::Repeated(items)) if items.len() == 2));

    let _alias = Arc::clone(&p.notes);
    let cipher = FieldCipher::new(FieldKey::generate());
    cipher.encrypt_struct(&mut p, &[group(&["email"])]).unwrap();
}

#[test]
fn derive_covers_tuple_and_generic_structs() {
    let cipher = FieldCipher::new(FieldKey::generate());

    let mut pair = Pair("secret".to_string().into(), "plain".into());
    cipher.encrypt_struct(&mut pair, &[group(&["0"])]).unwrap();
    assert!(pair.0.is_sealed());
    let err = cipher.encrypt_struct(&mut pair, &[group(&["1"])]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FieldNotEncryptable);

    let mut wrapped = Envelope {
        inner: company("Acme", "Engineer"),
    };
    cipher
        .encrypt_struct(&mut wrapped, &[group(&["inner.position"])])
        .unwrap();
    assert!(wrapped.inner.position.is_sealed());
}

#[test]
fn block_mode_interoperates_across_drivers() {
    let cipher = FieldCipher::new(FieldKey::generate());
    let legacy = [group(&["position"]).with_mode(CipherMode::Block)];

    let mut c = company("Acme", "Engineer");
    cipher.encrypt_struct(&mut c, &legacy).unwrap();

    let mut row = json!({ "position": blob::to_value(c.position.raw()) });
    cipher.decrypt_maps(&mut row, &legacy).unwrap();
    assert_eq!(row["position"], "Engineer");
}

#[test]
fn foreign_key_cannot_open() {
    let mut c = company("Acme", "Engineer");
    FieldCipher::new(FieldKey::generate())
        .encrypt_struct(&mut c, &[group(&["position"])])
        .unwrap();

    let err = FieldCipher::new(FieldKey::generate())
        .decrypt_struct(&mut c, &[group(&["position"])])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);
    assert_eq!(c.position.value(), "Engineer");
}
