//! Event builders shared by unit tests.

use chrono::Utc;

use toolcrib_core::Username;
use toolcrib_inventory::{InsertNumber, InwardEvent, OpCode, OutwardEvent, Quantity, ToolNumber};

pub(crate) fn inward(insert_number: &str, quantity: i64) -> InwardEvent {
    InwardEvent::new(
        Username::new("alice").unwrap(),
        Utc::now(),
        InsertNumber::new(insert_number).unwrap(),
        Quantity::new(quantity).unwrap(),
    )
}

pub(crate) fn outward(insert_number: &str) -> OutwardEvent {
    OutwardEvent::new(
        Username::new("alice").unwrap(),
        Utc::now(),
        InsertNumber::new(insert_number).unwrap(),
        OpCode::Op10,
        ToolNumber::new("T1").unwrap(),
    )
}

pub(crate) fn insert(n: &str) -> InsertNumber {
    InsertNumber::new(n).unwrap()
}
