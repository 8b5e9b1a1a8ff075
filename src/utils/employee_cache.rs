use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use crate::model::employee::Employee;
use crate::store::IdentityStore;

/// (sensor_id, branch_id)
type SensorKey = (u32, u64);

/// Read-through cache in front of employee resolution.
///
/// Only hits are cached: an unknown sensor may be provisioned at any time and must be
/// found on the next scan.
#[derive(Clone)]
pub struct EmployeeCache {
    identity: Arc<dyn IdentityStore>,
    cache: Cache<SensorKey, Employee>,
}

impl EmployeeCache {
    pub fn new(identity: Arc<dyn IdentityStore>, ttl: Duration) -> Self {
        Self {
            identity,
            cache: Cache::builder()
                .max_capacity(50_000) // tune based on headcount
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn resolve(
        &self,
        sensor_id: u32,
        branch_id: u64,
    ) -> Result<Option<Employee>, sqlx::Error> {
        let key = (sensor_id, branch_id);

        if let Some(employee) = self.cache.get(&key).await {
            return Ok(Some(employee));
        }

        let employee = self.identity.resolve_employee(sensor_id, branch_id).await?;

        if let Some(employee) = &employee {
            debug!(sensor_id, branch_id, employee_id = employee.id, "Caching resolved employee");
            self.cache.insert(key, employee.clone()).await;
        }

        Ok(employee)
    }
}
