use crate::tree::model::{PageId, PageKind};

/// A normalized, typed description of one engine notification.
///
/// Structural variants mutate the mirrored tree; the parser/VM variants are
/// informational and only feed the event log view.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationRecord {
    Open { page_size: u32, page_count: u32 },
    Close,
    Insert { page: PageId, cell: usize, key_len: u32 },
    Delete { page: PageId, cell: usize },
    Split { from: PageId, to: PageId, at: usize },
    Balance { page: PageId, cell_count: u32 },
    Allocate { page: PageId, kind: PageKind },
    Free { page: PageId },
    ParseStart { sql: String },
    ParseToken { token: String, token_type: i32 },
    ParseComplete { success: bool },
    VdbeStart { num_opcodes: u32 },
    VdbeOpcode { pc: u32, opcode: String, p1: i32, p2: i32, p3: i32 },
    VdbeComplete { result_code: i32 },
}

impl MutationRecord {
    /// True when applying this record can change the mirrored tree.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::Open { .. }
                | Self::Insert { .. }
                | Self::Delete { .. }
                | Self::Split { .. }
                | Self::Allocate { .. }
                | Self::Free { .. }
        )
    }

    /// One-line summary for the event log view.
    pub fn summary(&self) -> String {
        match self {
            Self::Open { page_size, page_count } => {
                format!("open  page_size={page_size} pages={page_count}")
            }
            Self::Close => "close".to_string(),
            Self::Insert { page, cell, key_len } => {
                format!("insert  pg {page} cell {cell} ({key_len}B key)")
            }
            Self::Delete { page, cell } => format!("delete  pg {page} cell {cell}"),
            Self::Split { from, to, at } => format!("split  pg {from} -> pg {to} at {at}"),
            Self::Balance { page, cell_count } => {
                format!("balance  pg {page} ({cell_count} cells)")
            }
            Self::Allocate { page, kind } => format!("alloc  pg {page} {}", kind.label()),
            Self::Free { page } => format!("free  pg {page}"),
            Self::ParseStart { sql } => format!("parse  {sql}"),
            Self::ParseToken { token, token_type } => {
                format!("token  {token:?} type {token_type}")
            }
            Self::ParseComplete { success } => {
                format!("parse {}", if *success { "ok" } else { "failed" })
            }
            Self::VdbeStart { num_opcodes } => format!("vdbe  {num_opcodes} opcodes"),
            Self::VdbeOpcode { pc, opcode, p1, p2, p3 } => {
                format!("vdbe  {pc:>3} {opcode} {p1} {p2} {p3}")
            }
            Self::VdbeComplete { result_code } => format!("vdbe done rc={result_code}"),
        }
    }
}

/// A record stamped with its arrival sequence id. Ids increase strictly in
/// acceptance order and carry no payload content.
#[derive(Debug, Clone, PartialEq)]
pub struct Stamped {
    pub seq: u64,
    pub record: MutationRecord,
}
