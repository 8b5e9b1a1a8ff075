use std::str::FromStr;
use std::sync::Arc;

use tracing::{info, warn};

use crate::auth::auth::AuthUser;
use crate::error::ReportError;
use crate::model::{
    action::{ActionKind, NewAction},
    attendance::BranchAttendanceRow,
    branch::Branch,
    employee::Employee,
};
use crate::service::export::{ExportFile, ExportFormat, build_export};
use crate::store::{ActionLog, AttendanceLedger, IdentityStore};

#[derive(Debug)]
pub struct BranchOverview {
    pub branch: Branch,
    pub employees: Vec<Employee>,
    pub attendance: Vec<BranchAttendanceRow>,
}

/// Supervisory read side: dashboard, branch detail and exports, scoped by role.
pub struct BranchReports {
    identity: Arc<dyn IdentityStore>,
    ledger: Arc<dyn AttendanceLedger>,
    actions: Arc<dyn ActionLog>,
}

impl BranchReports {
    pub fn new(
        identity: Arc<dyn IdentityStore>,
        ledger: Arc<dyn AttendanceLedger>,
        actions: Arc<dyn ActionLog>,
    ) -> Self {
        Self {
            identity,
            ledger,
            actions,
        }
    }

    pub async fn visible_branches(&self, auth: &AuthUser) -> Result<Vec<Branch>, ReportError> {
        let branches = if auth.is_owner() {
            self.identity.list_branches().await?
        } else {
            match auth.branch_id {
                Some(id) => self.identity.get_branch(id).await?.into_iter().collect(),
                None => Vec::new(),
            }
        };

        self.log_action(auth, ActionKind::ListBranches, "Viewed dashboard".to_string())
            .await;

        Ok(branches)
    }

    pub async fn branch_overview(
        &self,
        auth: &AuthUser,
        branch_id: u64,
    ) -> Result<BranchOverview, ReportError> {
        let branch = self.authorize(auth, branch_id).await?;
        let employees = self.identity.list_employees_for_branch(branch_id).await?;
        let attendance = self.ledger.list_records_for_branch(branch_id).await?;

        self.log_action(
            auth,
            ActionKind::ViewBranch,
            format!("Viewed branch {} ({})", branch.id, branch.name),
        )
        .await;

        Ok(BranchOverview {
            branch,
            employees,
            attendance,
        })
    }

    /// `Ok(None)` when the branch has no attendance yet. The branch is resolved and
    /// authorized before the format is looked at.
    pub async fn export(
        &self,
        auth: &AuthUser,
        branch_id: u64,
        format: &str,
    ) -> Result<Option<ExportFile>, ReportError> {
        let branch = self.authorize(auth, branch_id).await?;
        let format = ExportFormat::from_str(&format.to_lowercase())
            .map_err(|_| ReportError::UnsupportedFormat(format.to_string()))?;
        let rows = self.ledger.list_records_for_branch(branch_id).await?;
        let file = build_export(&rows, format)?;

        match &file {
            Some(_) => {
                info!(branch_id, rows = rows.len(), %format, "Attendance exported");
                self.log_action(
                    auth,
                    ActionKind::ExportAttendance,
                    format!("Exported {} rows of branch {} as {}", rows.len(), branch.name, format),
                )
                .await;
            }
            None => info!(branch_id, %format, "Nothing to export"),
        }

        Ok(file)
    }

    async fn authorize(&self, auth: &AuthUser, branch_id: u64) -> Result<Branch, ReportError> {
        let branch = self
            .identity
            .get_branch(branch_id)
            .await?
            .ok_or(ReportError::BranchNotFound(branch_id))?;

        if !auth.can_access_branch(branch.id) {
            warn!(user_id = auth.user_id, branch_id, "Branch access denied");
            return Err(ReportError::Forbidden(branch_id));
        }

        Ok(branch)
    }

    /// Audit failures never fail the request.
    async fn log_action(&self, auth: &AuthUser, kind: ActionKind, description: String) {
        let action = NewAction {
            user_id: auth.user_id,
            kind,
            description,
        };

        if let Err(e) = self.actions.record_action(action).await {
            warn!(error = %e, user_id = auth.user_id, %kind, "Failed to record action");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;
    use crate::store::memory::MemoryStore;
    use chrono::{NaiveDate, NaiveTime};

    fn owner() -> AuthUser {
        AuthUser {
            user_id: 1,
            email: "owner@company.com".into(),
            role: Role::Owner,
            branch_id: None,
        }
    }

    fn admin_of(branch_id: u64) -> AuthUser {
        AuthUser {
            user_id: 2,
            email: "admin@company.com".into(),
            role: Role::Admin,
            branch_id: Some(branch_id),
        }
    }

    async fn seeded() -> (Arc<MemoryStore>, BranchReports) {
        let store = Arc::new(MemoryStore::new());
        store.add_branch(1, "Central");
        store.add_branch(2, "Norte");
        store.add_employee(1, "Juan Pérez", 1, 1);
        store.add_employee(2, "Carlos Sánchez", 2, 2);

        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        store
            .create_record(1, date, NaiveTime::from_hms_opt(8, 0, 0).unwrap())
            .await
            .unwrap();

        let reports = BranchReports::new(store.clone(), store.clone(), store.clone());
        (store, reports)
    }

    #[tokio::test]
    async fn owner_sees_every_branch() {
        let (_, reports) = seeded().await;
        let branches = reports.visible_branches(&owner()).await.unwrap();
        assert_eq!(branches.iter().map(|b| b.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[tokio::test]
    async fn admin_sees_only_own_branch() {
        let (store, reports) = seeded().await;
        let branches = reports.visible_branches(&admin_of(2)).await.unwrap();
        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0].name, "Norte");
        assert_eq!(store.actions()[0].kind, ActionKind::ListBranches);
    }

    #[tokio::test]
    async fn admin_is_denied_other_branches() {
        let (_, reports) = seeded().await;
        let err = reports.branch_overview(&admin_of(2), 1).await.unwrap_err();
        assert!(matches!(err, ReportError::Forbidden(1)));

        let err = reports
            .export(&admin_of(2), 1, "xml")
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::Forbidden(1)));
    }

    #[tokio::test]
    async fn unknown_branch_is_not_found() {
        let (_, reports) = seeded().await;
        let err = reports.branch_overview(&owner(), 9).await.unwrap_err();
        assert!(matches!(err, ReportError::BranchNotFound(9)));

        let err = reports.export(&owner(), 9, "xml").await.unwrap_err();
        assert!(matches!(err, ReportError::BranchNotFound(9)));
    }

    #[tokio::test]
    async fn unknown_format_on_visible_branch_is_rejected() {
        let (_, reports) = seeded().await;
        let err = reports.export(&owner(), 1, "xml").await.unwrap_err();
        assert!(matches!(err, ReportError::UnsupportedFormat(f) if f == "xml"));
    }

    #[tokio::test]
    async fn overview_lists_employees_and_attendance() {
        let (store, reports) = seeded().await;
        let overview = reports.branch_overview(&admin_of(1), 1).await.unwrap();

        assert_eq!(overview.branch.name, "Central");
        assert_eq!(overview.employees.len(), 1);
        assert_eq!(overview.attendance.len(), 1);
        assert_eq!(overview.attendance[0].employee_name, "Juan Pérez");
        assert_eq!(store.actions().last().map(|a| a.kind), Some(ActionKind::ViewBranch));
    }

    #[tokio::test]
    async fn export_of_empty_branch_is_explicitly_empty() {
        let (store, reports) = seeded().await;
        let file = reports.export(&owner(), 2, "csv").await.unwrap();

        assert!(file.is_none());
        assert!(store.actions().iter().all(|a| a.kind != ActionKind::ExportAttendance));
    }

    #[tokio::test]
    async fn export_is_logged() {
        let (store, reports) = seeded().await;
        let file = reports
            .export(&owner(), 1, "Excel")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(file.file_name, "attendance.xlsx");
        assert_eq!(
            store.actions().last().map(|a| a.kind),
            Some(ActionKind::ExportAttendance)
        );
    }
}
