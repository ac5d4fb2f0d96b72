//! Turns raw `(code, payload)` pairs from the engine into typed records.
//!
//! Payloads are the JSON bodies the instrumented engine emits, e.g.
//! `{"page":1,"cell":0,"keyLen":16}` for an insert. Anything unparsable is
//! discarded with a warning; unknown codes are ignored silently so new
//! engine event types never crash the core.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::events::record::{MutationRecord, Stamped};
use crate::tree::model::{PageId, PageKind};

/// Stateful normalizer: holds the sequence counter stamped onto every
/// accepted record.
#[derive(Debug, Default)]
pub struct Normalizer {
    next_seq: u64,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize one raw event. `None` means discard: either the payload
    /// was malformed or the code is not one we know.
    pub fn normalize(&mut self, code: i32, payload: &str) -> Option<Stamped> {
        let record = decode(code, payload)?;
        self.next_seq += 1;
        Some(Stamped {
            seq: self.next_seq,
            record,
        })
    }
}

#[derive(Deserialize)]
struct OpenPayload {
    #[serde(rename = "pageSize")]
    page_size: u32,
    #[serde(rename = "numPages")]
    num_pages: u32,
}

#[derive(Deserialize)]
struct InsertPayload {
    page: u32,
    cell: usize,
    #[serde(rename = "keyLen")]
    key_len: u32,
}

#[derive(Deserialize)]
struct DeletePayload {
    page: u32,
    cell: usize,
}

#[derive(Deserialize)]
struct SplitPayload {
    #[serde(rename = "originalPage")]
    original_page: u32,
    #[serde(rename = "newPage")]
    new_page: u32,
    #[serde(rename = "splitCell")]
    split_cell: usize,
}

#[derive(Deserialize)]
struct BalancePayload {
    page: u32,
    #[serde(rename = "numCells")]
    num_cells: u32,
}

#[derive(Deserialize)]
struct AllocatePayload {
    page: u32,
    #[serde(rename = "type")]
    flags: u8,
}

#[derive(Deserialize)]
struct FreePayload {
    page: u32,
}

#[derive(Deserialize)]
struct ParseStartPayload {
    sql: String,
}

#[derive(Deserialize)]
struct ParseTokenPayload {
    token: String,
    #[serde(rename = "type")]
    token_type: i32,
}

#[derive(Deserialize)]
struct ParseCompletePayload {
    success: i32,
}

#[derive(Deserialize)]
struct VdbeStartPayload {
    #[serde(rename = "numOpcodes")]
    num_opcodes: u32,
}

#[derive(Deserialize)]
struct VdbeOpcodePayload {
    pc: u32,
    opcode: String,
    p1: i32,
    p2: i32,
    p3: i32,
}

#[derive(Deserialize)]
struct VdbeCompletePayload {
    #[serde(rename = "resultCode")]
    result_code: i32,
}

fn decode(code: i32, payload: &str) -> Option<MutationRecord> {
    match code {
        0 => {
            let p: OpenPayload = parse(code, payload)?;
            Some(MutationRecord::Open {
                page_size: p.page_size,
                page_count: p.num_pages,
            })
        }
        1 => Some(MutationRecord::Close),
        2 => {
            let p: InsertPayload = parse(code, payload)?;
            Some(MutationRecord::Insert {
                page: PageId(p.page),
                cell: p.cell,
                key_len: p.key_len,
            })
        }
        3 => {
            let p: DeletePayload = parse(code, payload)?;
            Some(MutationRecord::Delete {
                page: PageId(p.page),
                cell: p.cell,
            })
        }
        4 => {
            let p: SplitPayload = parse(code, payload)?;
            Some(MutationRecord::Split {
                from: PageId(p.original_page),
                to: PageId(p.new_page),
                at: p.split_cell,
            })
        }
        5 => {
            let p: BalancePayload = parse(code, payload)?;
            Some(MutationRecord::Balance {
                page: PageId(p.page),
                cell_count: p.num_cells,
            })
        }
        6 => {
            let p: AllocatePayload = parse(code, payload)?;
            Some(MutationRecord::Allocate {
                page: PageId(p.page),
                kind: PageKind::from_flags(p.flags),
            })
        }
        7 => {
            let p: FreePayload = parse(code, payload)?;
            Some(MutationRecord::Free {
                page: PageId(p.page),
            })
        }
        8 => {
            let p: ParseStartPayload = parse(code, payload)?;
            Some(MutationRecord::ParseStart { sql: p.sql })
        }
        9 => {
            let p: ParseTokenPayload = parse(code, payload)?;
            Some(MutationRecord::ParseToken {
                token: p.token,
                token_type: p.token_type,
            })
        }
        10 => {
            let p: ParseCompletePayload = parse(code, payload)?;
            Some(MutationRecord::ParseComplete {
                success: p.success != 0,
            })
        }
        11 => {
            let p: VdbeStartPayload = parse(code, payload)?;
            Some(MutationRecord::VdbeStart {
                num_opcodes: p.num_opcodes,
            })
        }
        12 => {
            let p: VdbeOpcodePayload = parse(code, payload)?;
            Some(MutationRecord::VdbeOpcode {
                pc: p.pc,
                opcode: p.opcode,
                p1: p.p1,
                p2: p.p2,
                p3: p.p3,
            })
        }
        13 => {
            let p: VdbeCompletePayload = parse(code, payload)?;
            Some(MutationRecord::VdbeComplete {
                result_code: p.result_code,
            })
        }
        other => {
            debug!(code = other, "ignoring unknown event code");
            None
        }
    }
}

fn parse<T: DeserializeOwned>(code: i32, payload: &str) -> Option<T> {
    match serde_json::from_str(payload) {
        Ok(v) => Some(v),
        Err(err) => {
            warn!(code, %err, payload, "discarding malformed event payload");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_payload_decodes() {
        let mut n = Normalizer::new();
        let stamped = n
            .normalize(2, r#"{"page":1,"cell":0,"keyLen":16}"#)
            .unwrap();
        assert_eq!(
            stamped.record,
            MutationRecord::Insert {
                page: PageId(1),
                cell: 0,
                key_len: 16
            }
        );
    }

    #[test]
    fn split_payload_decodes() {
        let mut n = Normalizer::new();
        let stamped = n
            .normalize(4, r#"{"originalPage":1,"newPage":2,"splitCell":3}"#)
            .unwrap();
        assert_eq!(
            stamped.record,
            MutationRecord::Split {
                from: PageId(1),
                to: PageId(2),
                at: 3
            }
        );
    }

    #[test]
    fn allocate_decodes_kind_from_flags() {
        let mut n = Normalizer::new();
        let stamped = n.normalize(6, r#"{"page":5,"type":5}"#).unwrap();
        assert_eq!(
            stamped.record,
            MutationRecord::Allocate {
                page: PageId(5),
                kind: PageKind::Interior
            }
        );
    }

    #[test]
    fn malformed_payload_is_discarded() {
        let mut n = Normalizer::new();
        assert!(n.normalize(2, "not json").is_none());
        assert!(n.normalize(2, r#"{"page":1}"#).is_none());
    }

    #[test]
    fn unknown_code_is_discarded() {
        let mut n = Normalizer::new();
        assert!(n.normalize(99, "{}").is_none());
        assert!(n.normalize(-1, "{}").is_none());
    }

    #[test]
    fn extra_payload_fields_are_tolerated() {
        let mut n = Normalizer::new();
        assert!(
            n.normalize(7, r#"{"page":3,"futureField":true}"#)
                .is_some()
        );
    }

    #[test]
    fn seq_ids_increase_strictly_across_accepted_records() {
        let mut n = Normalizer::new();
        let a = n.normalize(7, r#"{"page":1}"#).unwrap();
        assert!(n.normalize(99, "{}").is_none());
        assert!(n.normalize(2, "garbage").is_none());
        let b = n.normalize(7, r#"{"page":2}"#).unwrap();
        assert_eq!(a.seq, 1);
        assert_eq!(b.seq, 2);
    }
}
