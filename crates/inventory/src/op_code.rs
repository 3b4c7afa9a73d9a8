//! Machining operation codes attached to outward movements.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use toolcrib_core::{DomainError, ValueObject};

/// One of the ten fixed machining operations an insert can be consumed by.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OpCode {
    Op10,
    Op20,
    Op30,
    Op40,
    Op50,
    Op60,
    Op70,
    Op80,
    Op90,
    Op100,
}

impl OpCode {
    /// Every recognized code, in display order.
    pub const ALL: [OpCode; 10] = [
        OpCode::Op10,
        OpCode::Op20,
        OpCode::Op30,
        OpCode::Op40,
        OpCode::Op50,
        OpCode::Op60,
        OpCode::Op70,
        OpCode::Op80,
        OpCode::Op90,
        OpCode::Op100,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OpCode::Op10 => "OP10",
            OpCode::Op20 => "OP20",
            OpCode::Op30 => "OP30",
            OpCode::Op40 => "OP40",
            OpCode::Op50 => "OP50",
            OpCode::Op60 => "OP60",
            OpCode::Op70 => "OP70",
            OpCode::Op80 => "OP80",
            OpCode::Op90 => "OP90",
            OpCode::Op100 => "OP100",
        }
    }
}

impl ValueObject for OpCode {}

impl core::fmt::Display for OpCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OpCode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        OpCode::ALL
            .into_iter()
            .find(|code| code.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DomainError::validation(format!("unrecognized op code '{wanted}'")))
    }
}

impl TryFrom<String> for OpCode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OpCode> for String {
    fn from(value: OpCode) -> Self {
        value.as_str().to_string()
    }
}
