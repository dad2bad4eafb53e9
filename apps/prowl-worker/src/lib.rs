use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use prowl_domain::Platform;
use prowl_service::SearchService;
use prowl_storage::db::Db;

#[derive(Debug, Parser)]
#[command(
	version = prowl_cli::VERSION,
	rename_all = "kebab",
	styles = prowl_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
#[command(rename_all = "kebab")]
pub enum Command {
	/// Run one search on the platform routed from the content domain.
	Single {
		#[arg(long, value_name = "UUID")]
		content_id: Uuid,
		/// Overrides the domain taken from the content URL.
		#[arg(long)]
		domain: Option<String>,
		#[arg(long)]
		credential_id: String,
	},
	/// Run the progressive search on the routed platform.
	Progressive {
		#[arg(long, value_name = "UUID")]
		content_id: Uuid,
		#[arg(long)]
		domain: Option<String>,
		#[arg(long)]
		credential_id: String,
	},
	/// Run one search per configured platform and keep the best.
	Race {
		#[arg(long, value_name = "UUID")]
		content_id: Uuid,
		#[arg(long)]
		credential_id: String,
	},
	/// Re-execute a stored attempt.
	Retry {
		#[arg(long, value_name = "UUID")]
		attempt_id: Uuid,
	},
	/// Point a content target at a chosen attempt.
	Select {
		#[arg(long, value_name = "UUID")]
		content_id: Uuid,
		#[arg(long, value_name = "UUID")]
		attempt_id: Uuid,
	},
	/// Store reader feedback and rerun the progressive search with it.
	Feedback {
		#[arg(long, value_name = "UUID")]
		content_id: Uuid,
		#[arg(long)]
		feedback: String,
	},
	/// List the attempts made for a content target, best quality first.
	ContentAttempts {
		#[arg(long, value_name = "UUID")]
		content_id: Uuid,
	},
	/// List the most recent attempts on a platform.
	Attempts {
		#[arg(long)]
		platform: Platform,
		#[arg(long, default_value_t = 20)]
		limit: u32,
	},
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = prowl_config::load(&args.config)?;
	let filter = EnvFilter::try_new(&config.service.log_level)
		.unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
	tracing::info!(version = prowl_cli::VERSION, "Prowl worker starting.");

	let db = Db::connect(&config.storage.postgres).await?;

	db.ensure_schema().await?;

	let service = SearchService::from_config(&config, db)?;
	let output = match args.command {
		Command::Single { content_id, domain, credential_id } => serde_json::to_string_pretty(
			&service.run_single_search(content_id, domain.as_deref(), &credential_id).await?,
		)?,
		Command::Progressive { content_id, domain, credential_id } =>
			serde_json::to_string_pretty(
				&service
					.run_progressive_search(content_id, domain.as_deref(), &credential_id)
					.await?,
			)?,
		Command::Race { content_id, credential_id } => serde_json::to_string_pretty(
			&service.run_multi_platform_search(content_id, &credential_id).await?,
		)?,
		Command::Retry { attempt_id } =>
			serde_json::to_string_pretty(&service.process_existing_attempt(attempt_id).await?)?,
		Command::Select { content_id, attempt_id } => serde_json::to_string_pretty(
			&service.select_best_attempt(content_id, attempt_id).await?,
		)?,
		Command::Feedback { content_id, feedback } => serde_json::to_string_pretty(
			&service.resubmit_with_feedback(content_id, &feedback).await?,
		)?,
		Command::ContentAttempts { content_id } =>
			serde_json::to_string_pretty(&service.list_content_attempts(content_id).await?)?,
		Command::Attempts { platform, limit } =>
			serde_json::to_string_pretty(&service.list_attempts(platform, limit).await?)?,
	};

	println!("{output}");

	Ok(())
}
