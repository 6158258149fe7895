use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use color_eyre::eyre;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing_subscriber::EnvFilter;

use nearby_domain::Coordinates;
use nearby_service::{
	ClientFeature, DiscoverRequest, NearbyService, RankingStrategy, Requester,
	postgres::PostgresCollaborators,
};
use nearby_storage::db::Db;

#[derive(Debug, Parser)]
#[command(
	version = nearby_cli::VERSION,
	rename_all = "kebab",
	styles = nearby_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[arg(long, value_name = "DEGREES", allow_hyphen_values = true)]
	pub lat: f64,
	#[arg(long, value_name = "DEGREES", allow_hyphen_values = true)]
	pub lng: f64,
	#[arg(long, default_value_t = 20)]
	pub limit: u32,
	#[arg(long, default_value = "feed_weighted", value_parser = parse_strategy)]
	pub strategy: RankingStrategy,
	/// May be repeated. Defaults to `search.default_spaces`.
	#[arg(long = "space", value_name = "SPACE")]
	pub spaces: Vec<String>,
	#[arg(long)]
	pub user_id: Option<i64>,
	#[arg(long)]
	pub admin: bool,
	/// Declare that the client can render groups requiring approval.
	#[arg(long)]
	pub private_groups: bool,
	#[arg(long = "blocked", value_name = "USER_ID")]
	pub blocked_user_ids: Vec<i64>,
	/// Reference time for ranking, as RFC 3339. Defaults to now.
	#[arg(long, value_parser = parse_now)]
	pub now: Option<OffsetDateTime>,
}
impl Args {
	pub fn to_request(&self) -> DiscoverRequest {
		let mut requester = match self.user_id {
			Some(user_id) => Requester::signed_in(user_id),
			None => Requester::anonymous(),
		}
		.with_admin(self.admin)
		.with_blocked(self.blocked_user_ids.iter().copied());

		if self.private_groups {
			requester = requester.with_feature(ClientFeature::PrivateGroups);
		}

		DiscoverRequest {
			origin: Coordinates::new(self.lat, self.lng),
			spaces: self.spaces.clone(),
			strategy: self.strategy,
			limit: self.limit,
			requester,
			now: self.now,
		}
	}
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = nearby_config::load(&args.config)?;
	init_tracing(&config)?;
	let db = Db::connect(&config.storage.postgres).await?;
	db.ensure_schema().await?;
	let collaborators = PostgresCollaborators::new(Arc::new(db)).into_collaborators();
	let service = NearbyService::new(config, collaborators);

	let request = args.to_request();
	tracing::info!(
		latitude = request.origin.latitude,
		longitude = request.origin.longitude,
		strategy = request.strategy.as_str(),
		limit = request.limit,
		"Discovering nearby groups."
	);
	let response = service.discover(request).await?;

	println!("{}", serde_json::to_string_pretty(&response)?);
	Ok(())
}

fn init_tracing(config: &nearby_config::Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.try_init()
		.map_err(|err| eyre::eyre!(err))?;
	Ok(())
}

fn parse_strategy(raw: &str) -> Result<RankingStrategy, String> {
	RankingStrategy::parse(raw).ok_or_else(|| {
		let known: Vec<&str> =
			RankingStrategy::ALL.iter().map(|strategy| strategy.as_str()).collect();

		format!("unknown strategy `{raw}`; expected one of {}", known.join(", "))
	})
}

fn parse_now(raw: &str) -> Result<OffsetDateTime, String> {
	OffsetDateTime::parse(raw, &Rfc3339).map_err(|err| err.to_string())
}
