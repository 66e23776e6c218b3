//! CLI commands implementation

mod report;

use anyhow::{Context, Result};
use clap::Args;
use geonap_core::{EngineConfig, JobFile, JobRequest, PlanOutcome};
use geonap_scheduler::{simulate_cost, Planner, ProviderCatalog};
use geonap_store::{JsonFileSource, ProviderSource};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// API client for communicating with the daemon
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Engine configuration and provider cache for local commands
pub struct Local {
    planner: Planner,
    providers_path: PathBuf,
}

impl Local {
    pub fn open(config: Option<&Path>, providers: Option<&Path>) -> Result<Self> {
        let config = match config {
            Some(path) => EngineConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => EngineConfig::default(),
        };
        let providers_path = providers
            .map(Path::to_path_buf)
            .unwrap_or_else(|| config.cache.providers_path.clone());

        Ok(Self {
            planner: Planner::new(&config),
            providers_path,
        })
    }

    async fn catalog(&self) -> Result<ProviderCatalog> {
        let records = JsonFileSource::new(&self.providers_path).fetch().await?;
        Ok(self.planner.catalog(&records)?)
    }
}

/// Job settings from a job file and/or flags; flags win
#[derive(Args, Debug, Default)]
pub struct JobArgs {
    /// Job file (TOML with a [job] table)
    #[arg(long = "job", value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// GPUs to place
    #[arg(long)]
    pub gpus: Option<u32>,

    /// Latency bound in milliseconds
    #[arg(long)]
    pub r_max: Option<f64>,

    /// Model size in GB
    #[arg(long)]
    pub model_size: Option<f64>,

    /// Explicit training steps (0 derives from dataset and batch)
    #[arg(long)]
    pub steps: Option<u64>,

    /// Dataset size in GB
    #[arg(long)]
    pub dataset_size: Option<f64>,

    #[arg(long)]
    pub epochs: Option<u32>,

    #[arg(long)]
    pub batch_size: Option<u32>,

    /// Size of one sample in GB
    #[arg(long)]
    pub sample_size: Option<f64>,

    /// Provider holding the dataset (e.g., aws)
    #[arg(long)]
    pub data_source: Option<String>,

    /// All-reduce topology (ring or mesh)
    #[arg(long)]
    pub topology: Option<String>,

    /// Restrict placement to one GPU model
    #[arg(long)]
    pub gpu_model: Option<String>,

    /// Training hours override
    #[arg(long)]
    pub hours: Option<f64>,

    /// Egress rate override in USD/GB (repeatable)
    #[arg(long = "egress", value_name = "PROVIDER=RATE", value_parser = parse_override)]
    pub egress: Vec<(String, f64)>,
}

impl JobArgs {
    /// Merge the job file with the flags into one request
    pub fn to_request(&self) -> Result<JobRequest> {
        let mut req = match &self.file {
            Some(path) => JobFile::from_file(path)
                .with_context(|| format!("Failed to load job file {}", path.display()))?
                .job,
            None => JobRequest::default(),
        };

        fn set<T: Into<Value> + Copy>(slot: &mut Option<Value>, flag: Option<T>) {
            if let Some(v) = flag {
                *slot = Some(v.into());
            }
        }

        set(&mut req.required_gpus, self.gpus);
        set(&mut req.max_rtt_ms, self.r_max);
        set(&mut req.model_size_gb, self.model_size);
        set(&mut req.steps, self.steps);
        set(&mut req.dataset_size_gb, self.dataset_size);
        set(&mut req.epochs, self.epochs);
        set(&mut req.batch_size, self.batch_size);
        set(&mut req.sample_size_gb, self.sample_size);
        set(&mut req.training_hours, self.hours);

        if self.data_source.is_some() {
            req.data_source = self.data_source.clone();
        }
        if self.topology.is_some() {
            req.topology = self.topology.clone();
        }
        if self.gpu_model.is_some() {
            req.gpu_model = self.gpu_model.clone();
        }
        for (provider, rate) in &self.egress {
            req.egress_overrides.insert(provider.clone(), Value::from(*rate));
        }

        Ok(req)
    }
}

fn parse_override(s: &str) -> Result<(String, f64), String> {
    let (provider, rate) = s
        .split_once('=')
        .ok_or_else(|| format!("expected PROVIDER=RATE, got '{}'", s))?;
    let rate: f64 = rate
        .trim()
        .parse()
        .map_err(|_| format!("invalid rate '{}'", rate))?;
    Ok((provider.trim().to_string(), rate))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Plan a job locally
pub async fn plan(local: &Local, args: &JobArgs, json: bool) -> Result<()> {
    let job = args.to_request()?.into_spec();
    let catalog = local.catalog().await?;
    let outcome = local.planner.plan_ranked(&job, catalog.providers());

    if json {
        return print_json(&outcome);
    }
    report::print_outcome(&outcome);
    Ok(())
}

/// Compare a job with its model-filtered variant
pub async fn compare(local: &Local, args: &JobArgs, model: &str, json: bool) -> Result<()> {
    let job = args.to_request()?.into_spec();
    let catalog = local.catalog().await?;
    let comparison = local.planner.compare_ranked(&job, catalog.providers(), model);
    let availability = catalog.availability(&comparison.base.placement, model);

    if json {
        return print_json(&serde_json::json!({
            "comparison": comparison,
            "availability": availability,
        }));
    }

    println!("Base run");
    report::print_outcome(&comparison.base);
    println!();
    println!("Restricted to {}", model);
    report::print_outcome(&comparison.filtered);
    println!();
    report::print_delta(&comparison.delta);
    println!();
    report::print_availability(&availability);
    Ok(())
}

/// List ranked providers
pub async fn providers(
    local: &Local,
    max_rtt: Option<f64>,
    model: Option<&str>,
    json: bool,
) -> Result<()> {
    let catalog = local.catalog().await?;
    let model = model.and_then(geonap_core::normalize_model_filter);
    let providers: Vec<_> = catalog
        .providers()
        .iter()
        .filter(|p| max_rtt.map_or(true, |r| p.offer.rtt_ms <= r))
        .filter(|p| model.map_or(true, |m| p.offers_model(m)))
        .collect();

    if json {
        return print_json(&providers);
    }
    report::print_providers(&providers);
    Ok(())
}

/// List known GPU models
pub async fn models(local: &Local, json: bool) -> Result<()> {
    let models = local.catalog().await?.gpu_models();
    if json {
        return print_json(&models);
    }
    if models.is_empty() {
        println!("No GPU models in the provider cache");
    }
    for model in models {
        println!("{}", model);
    }
    Ok(())
}

/// Simulate cost spread around a mean or a freshly planned job
pub async fn simulate(
    local: &Local,
    args: &JobArgs,
    mean: Option<f64>,
    runs: usize,
    seed: u64,
    json: bool,
) -> Result<()> {
    let mean = match mean {
        Some(mean) => mean,
        None => {
            let job = args.to_request()?.into_spec();
            let catalog = local.catalog().await?;
            local.planner.plan_ranked(&job, catalog.providers()).total_cost
        }
    };

    let summary = simulate_cost(mean, runs, seed)?;
    if json {
        return print_json(&summary);
    }
    report::print_simulation(&summary);
    Ok(())
}

/// Plan response from the daemon
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    pub run_id: Uuid,
    #[serde(flatten)]
    pub outcome: PlanOutcome,
}

/// Submit a job to the daemon
pub async fn submit(client: &ApiClient, args: &JobArgs, json: bool) -> Result<()> {
    let req = args.to_request()?;

    let response = client
        .client
        .post(client.url("/api/v1/plan"))
        .json(&req)
        .send()
        .await?;

    if response.status().is_success() {
        let body: Value = response.json().await?;
        if json {
            return print_json(&body);
        }
        let submitted: SubmitResponse = serde_json::from_value(body)?;
        println!("Run {}", submitted.run_id);
        report::print_outcome(&submitted.outcome);
    } else {
        let error = response.text().await?;
        eprintln!("Failed to plan job: {}", error);
    }

    Ok(())
}

/// Status response from the daemon
#[derive(Debug, Deserialize)]
pub struct StatusResponse {
    pub version: String,
    pub source: String,
    pub catalog: Option<CatalogInfo>,
}

/// Catalog snapshot summary
#[derive(Debug, Deserialize)]
pub struct CatalogInfo {
    pub loaded_at: String,
    pub providers: usize,
    pub total_capacity: u64,
}

fn print_catalog(info: &CatalogInfo) {
    println!("Providers: {}", info.providers);
    println!("GPU capacity: {}", info.total_capacity);
    println!("Loaded at: {}", info.loaded_at);
}

/// Ask the daemon to reload its provider cache
pub async fn reload(client: &ApiClient) -> Result<()> {
    let response = client
        .client
        .post(client.url("/api/v1/catalog/reload"))
        .send()
        .await?;

    if response.status().is_success() {
        let info: CatalogInfo = response.json().await?;
        println!("Catalog reloaded");
        print_catalog(&info);
    } else {
        let error = response.text().await?;
        eprintln!("Failed to reload catalog: {}", error);
    }

    Ok(())
}

/// Show daemon status
pub async fn status(client: &ApiClient) -> Result<()> {
    let response = client
        .client
        .get(client.url("/api/v1/status"))
        .send()
        .await?;

    if response.status().is_success() {
        let status: StatusResponse = response.json().await?;

        println!("geonapd v{}", status.version);
        println!();
        println!("Source: {}", status.source);
        match &status.catalog {
            Some(info) => print_catalog(info),
            None => println!("No provider catalog loaded"),
        }
    } else {
        let error = response.text().await?;
        eprintln!("Failed to get status: {}", error);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_override() {
        assert_eq!(parse_override("aws=0.07").unwrap(), ("aws".to_string(), 0.07));
        assert_eq!(
            parse_override(" gcp_asia = 0.1").unwrap(),
            ("gcp_asia".to_string(), 0.1)
        );
        assert!(parse_override("aws").is_err());
        assert!(parse_override("aws=cheap").is_err());
    }

    #[test]
    fn test_flags_override_job_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[job]\ngpus = 16\nr_max = 40\ntopology = \"mesh\"\n\n[job.egress_overrides]\naws = 0.07"
        )
        .unwrap();

        let args = JobArgs {
            file: Some(file.path().to_path_buf()),
            gpus: Some(24),
            egress: vec![("vast".to_string(), 0.01)],
            ..JobArgs::default()
        };
        let job = args.to_request().unwrap().into_spec();

        assert_eq!(job.required_gpus, 24);
        assert_eq!(job.max_rtt_ms, 40.0);
        assert_eq!(job.topology, geonap_core::Topology::Mesh);
        assert_eq!(job.egress_overrides.get("aws"), Some(&0.07));
        assert_eq!(job.egress_overrides.get("vast"), Some(&0.01));
    }

    #[test]
    fn test_flags_without_job_file() {
        let args = JobArgs {
            r_max: Some(5.0),
            gpu_model: Some("H100".to_string()),
            ..JobArgs::default()
        };
        let job = args.to_request().unwrap().into_spec();
        assert_eq!(job.max_rtt_ms, 5.0);
        assert_eq!(job.model_filter(), Some("H100"));
        assert_eq!(job.required_gpus, 8);
    }

    #[tokio::test]
    async fn test_local_plan_from_cache_file() {
        let mut cache = tempfile::NamedTempFile::new().unwrap();
        write!(
            cache,
            r#"[{{"provider": "aws", "region": "mumbai", "price": 3.0, "rtt": 5}},
                {{"provider": "vast", "region": "global", "price": 0.5, "rtt": 150}}]"#
        )
        .unwrap();

        let local = Local::open(None, Some(cache.path())).unwrap();
        let catalog = local.catalog().await.unwrap();
        assert_eq!(catalog.len(), 2);

        let outcome = local
            .planner
            .plan_ranked(&JobArgs::default().to_request().unwrap().into_spec(), catalog.providers());
        assert_eq!(outcome.placement.get("aws_mumbai"), 8);
        assert_eq!(outcome.forbidden, vec!["vast_global"]);
    }
}
