use strum_macros::{Display, EnumString};

/// Supervisory actions kept in the audit log. The numeric codes are persisted.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum ActionKind {
    Login = 1,
    ListBranches = 2,
    ViewBranch = 3,
    ExportAttendance = 4,
}

impl ActionKind {
    pub fn code(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone)]
pub struct NewAction {
    pub user_id: u64,
    pub kind: ActionKind,
    pub description: String,
}
