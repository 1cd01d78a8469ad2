//! Tests for strongly-typed identifiers

use core_kernel::{CustomerId, DocumentId, InvoiceId, LedgerLineId, ProductId, SupplierId, TenantId, UserId};
use uuid::Uuid;

#[test]
fn test_each_identifier_has_its_own_prefix() {
    assert!(TenantId::new().to_string().starts_with("TEN-"));
    assert!(UserId::new().to_string().starts_with("USR-"));
    assert!(DocumentId::new().to_string().starts_with("DOC-"));
    assert!(LedgerLineId::new().to_string().starts_with("LNE-"));
    assert!(CustomerId::new().to_string().starts_with("CUS-"));
    assert!(SupplierId::new().to_string().starts_with("SUP-"));
    assert!(InvoiceId::new().to_string().starts_with("INV-"));
    assert!(ProductId::new().to_string().starts_with("PRD-"));
}

#[test]
fn test_new_ids_are_unique() {
    let a = DocumentId::new();
    let b = DocumentId::new();
    assert_ne!(a, b);
}

#[test]
fn test_v7_ids_are_time_ordered() {
    let first = LedgerLineId::new_v7();
    std::thread::sleep(std::time::Duration::from_millis(2));
    let second = LedgerLineId::new_v7();
    assert!(first < second);
}

#[test]
fn test_uuid_round_trip() {
    let uuid = Uuid::new_v4();
    let id = CustomerId::from_uuid(uuid);
    assert_eq!(*id.as_uuid(), uuid);

    let back: Uuid = id.into();
    assert_eq!(back, uuid);
}

#[test]
fn test_parse_rejects_garbage() {
    assert!("TEN-not-a-uuid".parse::<TenantId>().is_err());
    assert!("".parse::<TenantId>().is_err());
}

#[test]
fn test_parse_accepts_prefixed_and_bare() {
    let id = SupplierId::new();
    assert_eq!(id.to_string().parse::<SupplierId>().unwrap(), id);
    assert_eq!(id.as_uuid().to_string().parse::<SupplierId>().unwrap(), id);
}

#[test]
fn test_serde_uses_bare_uuid() {
    let id = ProductId::new();
    let json = serde_json::to_string(&id).unwrap();
    let back: ProductId = serde_json::from_str(&json).unwrap();
    assert_eq!(id, back);
    assert!(!json.contains("PRD"));
}
