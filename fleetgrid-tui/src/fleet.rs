//! In-process GPU instance fleet served as a paged, sortable data source.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use log::{debug, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

use fleetgrid::SourceError;
use fleetgrid::table::{ColumnDef, GridRow, SortSpec, SortValue, sort_rows};
use fleetgrid::window::{Meta, RangeRequest, RangeResponse, RangeSource};

const PROVIDERS: &[&str] = &["lambda", "coreweave", "runpod", "vast", "crusoe"];
const REGIONS: &[&str] = &["us-east-1", "us-west-2", "eu-central-1", "ap-south-1"];
const GPU_TYPES: &[&str] = &["H100", "A100-80G", "L40S", "A10", "RTX-4090"];
const STATUSES: &[&str] = &["running", "running", "running", "provisioning", "stopped", "failed"];

/// Simulated backend latency per request.
const LATENCY: Duration = Duration::from_millis(60);

/// Fixed seed so every run shows the same fleet.
const FLEET_SEED: u64 = 0x9E37_79B9_7F4A_7C15;

#[derive(Debug, Clone)]
pub struct Instance {
    pub id: u64,
    pub name: String,
    pub provider: &'static str,
    pub region: &'static str,
    pub gpu_type: &'static str,
    pub gpu_count: u32,
    pub status: &'static str,
    pub cost_per_hour: f64,
    pub created_at: DateTime<Utc>,
}

impl GridRow for Instance {
    fn cell(&self, column_id: &str) -> String {
        match column_id {
            "id" => self.id.to_string(),
            "name" => self.name.clone(),
            "provider" => self.provider.to_string(),
            "region" => self.region.to_string(),
            "gpu_type" => self.gpu_type.to_string(),
            "gpu_count" => self.gpu_count.to_string(),
            "status" => self.status.to_string(),
            "cost" => format!("${:.2}/h", self.cost_per_hour),
            "created_at" => self.created_at.format("%Y-%m-%d %H:%M").to_string(),
            _ => String::new(),
        }
    }

    fn sort_value(&self, column_id: &str) -> SortValue {
        match column_id {
            "id" => self.id.into(),
            "gpu_count" => self.gpu_count.into(),
            "cost" => self.cost_per_hour.into(),
            "created_at" => self.created_at.into(),
            _ => self.cell(column_id).into(),
        }
    }
}

/// Column definitions for the instance table.
pub fn columns() -> Vec<ColumnDef<Instance>> {
    vec![
        ColumnDef::new("name", "Name").sortable().width(16),
        ColumnDef::new("status", "Status")
            .sortable()
            .width(14)
            .compare_with(|a: &Instance, b: &Instance| status_rank(a.status).cmp(&status_rank(b.status))),
        ColumnDef::new("provider", "Provider").sortable().width(12),
        ColumnDef::new("region", "Region").sortable().width(14),
        ColumnDef::new("gpu_type", "GPU").sortable().width(10),
        ColumnDef::new("gpu_count", "#GPU").sortable().width(6).min_width(5),
        ColumnDef::new("cost", "Cost").sortable().width(12).min_width(8),
        ColumnDef::new("created_at", "Created").sortable().width(18),
        ColumnDef::new("id", "ID").width(8).fixed().hidden_by_default(),
    ]
}

fn status_rank(status: &str) -> u8 {
    match status {
        "running" => 0,
        "provisioning" => 1,
        "stopped" => 2,
        _ => 3,
    }
}

fn pick<T: Copy>(rng: &mut StdRng, items: &[T]) -> T {
    items[rng.random_range(0..items.len())]
}

#[derive(Debug)]
struct FleetState {
    instances: Vec<Instance>,
    rng: StdRng,
}

impl FleetState {
    fn spawn(&mut self) {
        let id = self.instances.len() as u64 + 1;
        let gpu_type = pick(&mut self.rng, GPU_TYPES);
        let gpu_count = 1u32 << self.rng.random_range(0..4u32);
        let base = match gpu_type {
            "H100" => 2.49,
            "A100-80G" => 1.79,
            "L40S" => 0.99,
            "A10" => 0.60,
            _ => 0.44,
        };
        let created_at = Utc
            .timestamp_opt(1_704_067_200 + (id as i64) * 1_800, 0)
            .single()
            .unwrap_or_default();

        self.instances.push(Instance {
            id,
            name: format!("gpu-{}", id),
            provider: pick(&mut self.rng, PROVIDERS),
            region: pick(&mut self.rng, REGIONS),
            gpu_type,
            gpu_count,
            status: pick(&mut self.rng, STATUSES),
            cost_per_hour: base * gpu_count as f64,
            created_at,
        });
    }
}

/// The shared fleet. Cloning is cheap; every clone sees the same instances.
#[derive(Debug, Clone)]
pub struct Fleet {
    state: Arc<RwLock<FleetState>>,
}

impl Fleet {
    pub fn new(size: usize) -> Self {
        let mut state = FleetState {
            instances: Vec::with_capacity(size),
            rng: StdRng::seed_from_u64(FLEET_SEED),
        };
        for _ in 0..size {
            state.spawn();
        }
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Simulates live activity: a few instances change status and `added`
    /// new ones appear.
    pub fn churn(&self, added: usize) {
        let Ok(mut state) = self.state.write() else {
            return;
        };
        let len = state.instances.len();
        for _ in 0..3 {
            if len == 0 {
                break;
            }
            let index = state.rng.random_range(0..len);
            let status = pick(&mut state.rng, STATUSES);
            state.instances[index].status = status;
        }
        for _ in 0..added {
            state.spawn();
        }
        debug!("fleet churned: {} instances", state.instances.len());
    }

    pub fn size(&self) -> usize {
        self.state.read().map(|s| s.instances.len()).unwrap_or(0)
    }

    /// A data source over this fleet for one filter and sort.
    pub fn query(&self, status: Option<&str>, sort: Option<&SortSpec>) -> FleetQuery {
        FleetQuery {
            fleet: self.clone(),
            status: status.map(str::to_string),
            sort: sort.cloned(),
        }
    }
}

/// One query against the fleet, like a call to the instance search route.
#[derive(Debug, Clone)]
pub struct FleetQuery {
    fleet: Fleet,
    status: Option<String>,
    sort: Option<SortSpec>,
}

impl FleetQuery {
    /// Identity of this query for the table's cache.
    pub fn key(&self) -> String {
        format!(
            "instances?status={}&sort={}",
            self.status.as_deref().unwrap_or("*"),
            self.sort.as_ref().map(SortSpec::key).unwrap_or_default()
        )
    }

    fn snapshot(&self) -> Result<(Vec<Instance>, usize, Meta), SourceError> {
        let state = self.fleet.state.read().map_err(|_| SourceError::Unavailable)?;
        let total = state.instances.len();

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for instance in &state.instances {
            *counts.entry(instance.status).or_default() += 1;
        }
        let mut meta = Meta::new();
        meta.insert("status_counts".to_string(), json!(counts));

        let mut rows: Vec<Instance> = state
            .instances
            .iter()
            .filter(|i| self.status.as_deref().is_none_or(|s| i.status == s))
            .cloned()
            .collect();
        if let Some(spec) = &self.sort {
            sort_rows(&mut rows, spec, &columns());
        }
        Ok((rows, total, meta))
    }
}

#[async_trait]
impl RangeSource for FleetQuery {
    type Row = Instance;

    async fn load_range(
        &self,
        request: RangeRequest,
    ) -> Result<RangeResponse<Instance>, SourceError> {
        trace!("fleet query {} offset={} limit={}", self.key(), request.offset, request.limit);
        tokio::time::sleep(LATENCY).await;

        let (rows, total, meta) = self.snapshot()?;
        let filtered = rows.len();
        let items = rows
            .into_iter()
            .skip(request.offset)
            .take(request.limit)
            .collect();
        Ok(RangeResponse::new(request.offset, items)
            .with_counts(total, filtered)
            .with_meta(meta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_query_filters_and_sorts() {
        let fleet = Fleet::new(50);
        let query = fleet.query(Some("running"), Some(&SortSpec::desc("cost")));
        let response = query.load_range(RangeRequest::new(0, 500)).await.unwrap();

        assert_eq!(response.total_count, 50);
        assert_eq!(response.filtered_count, response.items.len());
        assert!(response.items.iter().all(|i| i.status == "running"));
        assert!(
            response
                .items
                .windows(2)
                .all(|w| w[0].cost_per_hour >= w[1].cost_per_hour)
        );
        let meta = response.meta.clone().unwrap();
        assert_eq!(meta["status_counts"]["running"], json!(response.filtered_count));
    }

    #[tokio::test(start_paused = true)]
    async fn test_churn_grows_fleet() {
        let fleet = Fleet::new(10);
        fleet.churn(4);
        assert_eq!(fleet.size(), 14);

        let response = fleet
            .query(None, None)
            .load_range(RangeRequest::new(10, 10))
            .await
            .unwrap();
        assert_eq!(response.offset, 10);
        assert_eq!(response.items.len(), 4);
        assert_eq!(response.items[0].name, "gpu-11");
    }

    #[test]
    fn test_fleet_is_deterministic() {
        let (first, _, _) = Fleet::new(20).query(None, None).snapshot().unwrap();
        let (second, _, _) = Fleet::new(20).query(None, None).snapshot().unwrap();

        let placement = |rows: &[Instance]| {
            rows.iter()
                .map(|i| (i.status, i.region, i.gpu_count))
                .collect::<Vec<_>>()
        };
        assert_eq!(placement(&first), placement(&second));
        assert!(first.iter().all(|i| [1, 2, 4, 8].contains(&i.gpu_count)));
    }

    #[test]
    fn test_query_key_tracks_filter_and_sort() {
        let fleet = Fleet::new(0);
        assert_ne!(
            fleet.query(None, None).key(),
            fleet.query(Some("failed"), None).key()
        );
        assert_ne!(
            fleet.query(None, Some(&SortSpec::asc("name"))).key(),
            fleet.query(None, Some(&SortSpec::desc("name"))).key()
        );
    }
}
