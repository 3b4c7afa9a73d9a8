//! Inward/outward stock movements: commands, validation and ledger events.
//!
//! A movement request goes through two phases. `validate` is pure and turns raw
//! caller input into a typed event (or a `DomainError::Validation`); only a typed
//! event can be appended to the ledger, so a malformed movement never reaches storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use toolcrib_core::{DomainResult, Username};
use toolcrib_events::Event;

use crate::{InsertNumber, OpCode, Quantity, ToolNumber};

/// Every outward movement consumes exactly one insert.
pub const OUTWARD_QUANTITY: Quantity = Quantity::ONE;

/// Command: record received stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordInward {
    pub user: String,
    pub insert_number: String,
    pub quantity: i64,
}

impl RecordInward {
    pub fn validate(&self, occurred_at: DateTime<Utc>) -> DomainResult<InwardEvent> {
        Ok(InwardEvent {
            user: Username::new(self.user.clone())?,
            occurred_at,
            insert_number: InsertNumber::new(&self.insert_number)?,
            quantity: Quantity::new(self.quantity)?,
        })
    }
}

/// Command: record one consumed insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordOutward {
    pub user: String,
    pub insert_number: String,
    pub op_code: String,
    pub tool_number: String,
}

impl RecordOutward {
    pub fn validate(&self, occurred_at: DateTime<Utc>) -> DomainResult<OutwardEvent> {
        Ok(OutwardEvent {
            user: Username::new(self.user.clone())?,
            occurred_at,
            insert_number: InsertNumber::new(&self.insert_number)?,
            op_code: self.op_code.parse()?,
            tool_number: ToolNumber::new(&self.tool_number)?,
        })
    }
}

/// Event: stock received for an insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InwardEvent {
    user: Username,
    occurred_at: DateTime<Utc>,
    insert_number: InsertNumber,
    quantity: Quantity,
}

impl InwardEvent {
    pub fn new(
        user: Username,
        occurred_at: DateTime<Utc>,
        insert_number: InsertNumber,
        quantity: Quantity,
    ) -> Self {
        Self {
            user,
            occurred_at,
            insert_number,
            quantity,
        }
    }

    pub fn user(&self) -> &Username {
        &self.user
    }

    pub fn insert_number(&self) -> &InsertNumber {
        &self.insert_number
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Signed change this event applies to the running total.
    pub fn delta(&self) -> i64 {
        self.quantity.as_i64()
    }
}

impl Event for InwardEvent {
    fn stream(&self) -> &'static str {
        "inward"
    }

    fn event_type(&self) -> &'static str {
        "inventory.inward.recorded"
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}

/// Event: one insert consumed by a machining operation.
///
/// The quantity is not stored; it is always [`OUTWARD_QUANTITY`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutwardEvent {
    user: Username,
    occurred_at: DateTime<Utc>,
    insert_number: InsertNumber,
    op_code: OpCode,
    tool_number: ToolNumber,
}

impl OutwardEvent {
    pub fn new(
        user: Username,
        occurred_at: DateTime<Utc>,
        insert_number: InsertNumber,
        op_code: OpCode,
        tool_number: ToolNumber,
    ) -> Self {
        Self {
            user,
            occurred_at,
            insert_number,
            op_code,
            tool_number,
        }
    }

    pub fn user(&self) -> &Username {
        &self.user
    }

    pub fn insert_number(&self) -> &InsertNumber {
        &self.insert_number
    }

    pub fn op_code(&self) -> OpCode {
        self.op_code
    }

    pub fn tool_number(&self) -> &ToolNumber {
        &self.tool_number
    }

    pub fn quantity(&self) -> Quantity {
        OUTWARD_QUANTITY
    }

    pub fn delta(&self) -> i64 {
        -OUTWARD_QUANTITY.as_i64()
    }
}

impl Event for OutwardEvent {
    fn stream(&self) -> &'static str {
        "outward"
    }

    fn event_type(&self) -> &'static str {
        "inventory.outward.recorded"
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}

/// Either kind of ledger event, for consumers that replay both streams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    Inward(InwardEvent),
    Outward(OutwardEvent),
}

impl LedgerEvent {
    pub fn insert_number(&self) -> &InsertNumber {
        match self {
            LedgerEvent::Inward(e) => e.insert_number(),
            LedgerEvent::Outward(e) => e.insert_number(),
        }
    }

    pub fn delta(&self) -> i64 {
        match self {
            LedgerEvent::Inward(e) => e.delta(),
            LedgerEvent::Outward(e) => e.delta(),
        }
    }
}

impl From<InwardEvent> for LedgerEvent {
    fn from(value: InwardEvent) -> Self {
        LedgerEvent::Inward(value)
    }
}

impl From<OutwardEvent> for LedgerEvent {
    fn from(value: OutwardEvent) -> Self {
        LedgerEvent::Outward(value)
    }
}

impl Event for LedgerEvent {
    fn stream(&self) -> &'static str {
        match self {
            LedgerEvent::Inward(e) => e.stream(),
            LedgerEvent::Outward(e) => e.stream(),
        }
    }

    fn event_type(&self) -> &'static str {
        match self {
            LedgerEvent::Inward(e) => e.event_type(),
            LedgerEvent::Outward(e) => e.event_type(),
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            LedgerEvent::Inward(e) => e.occurred_at(),
            LedgerEvent::Outward(e) => e.occurred_at(),
        }
    }
}
